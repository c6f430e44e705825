// File: src/services/mod.rs

pub mod discord;
pub mod history;
pub mod message_service;

pub use history::{HistoryResolver, MessageFetcher};
pub use message_service::MessageService;
