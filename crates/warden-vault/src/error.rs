//! Vault error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid Vault address: {0}")]
    InvalidAddress(String),

    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Vault denied access to {0}")]
    PermissionDenied(String),

    #[error("Vault returned error: {status} - {message}")]
    VaultStatus { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Giving up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<VaultError>,
    },
}
