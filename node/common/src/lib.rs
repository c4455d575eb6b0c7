pub mod config;
pub mod contracts;
pub mod crypto;
pub mod error;
pub mod retry;
pub mod types;
