pub mod runtime;

pub use runtime::{DiscordEvent, DiscordPlatform, InboundMessage};
