//! # vmhooks-core
//!
//! Core crate for vmhooks. Contains the layered configuration schema,
//! logging initialisation, and the unified error system shared by the
//! hook manager, the sidecar SDK, and the `vmhooks` binary.
//!
//! This crate has **no** internal dependencies on other vmhooks crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
