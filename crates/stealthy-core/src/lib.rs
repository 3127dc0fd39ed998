pub mod app_state;
pub mod chat_store;
pub mod config;
pub mod conversation;
pub mod error;
pub mod pairing;
pub mod project;
pub mod project_store;
pub mod repository;
pub mod secret;

// Re-export common error type
pub use error::{Result, StealthyError};
