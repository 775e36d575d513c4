//! Convenience result type alias for vmhooks.

use crate::error::AppError;

/// A specialized `Result` type for vmhooks operations.
pub type AppResult<T> = Result<T, AppError>;
