//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error for order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order does not exist.
    #[error("order not found: {0}")]
    NotFound(Uuid),

    /// A validation error in domain logic or request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller is not allowed to act on this order.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
