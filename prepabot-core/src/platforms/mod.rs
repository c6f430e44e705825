pub mod discord;

pub use discord::runtime::DiscordPlatform;
