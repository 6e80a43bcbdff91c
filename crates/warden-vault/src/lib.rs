//! Warden Secret Retrieval
//!
//! This crate reads the signing secret and related settings from a
//! HashiCorp Vault KV v2 engine at startup, retrying a bounded number of
//! times before giving up.

pub mod client;
pub mod error;

pub use client::{VaultClient, VaultClientConfig, retry_with_delay};
pub use error::VaultError;
