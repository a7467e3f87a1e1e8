// src/config/mod.rs
pub mod defaults;
pub mod relay;

pub use relay::{AppConfig, Credentials, RelaySettings};
