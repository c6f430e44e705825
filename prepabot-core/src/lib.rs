// src/lib.rs

pub mod cache;
pub mod persons;
pub mod platforms;
pub mod scrape;
pub mod services;
pub mod tasks;

pub use prepabot_common::error::Error;
