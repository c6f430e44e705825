pub mod message;
pub mod person;

pub use message::{CachedMessage, ReplyReference};
pub use person::PersonalInformation;
