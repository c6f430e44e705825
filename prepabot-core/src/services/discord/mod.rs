pub mod components;
pub mod slashcommands;

pub use slashcommands::InteractionContext;
