pub mod models;
pub mod repository;
pub mod rest;

pub use repository::{CourseRepository, IdentityProvider, ProfileRepository};
pub use rest::RestBackend;

use thiserror::Error;

/// Errors from calls against the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The identity service refused the access token.
    #[error("Access token rejected by identity service")]
    TokenRejected,

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed backend payload: {0}")]
    Decode(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
