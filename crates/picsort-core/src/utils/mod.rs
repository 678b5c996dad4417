//! PicSort utilities
//!
//! Shared error types and path normalization

pub mod error;
pub mod path;

pub use error::*;
pub use path::{absolute_path, normalize_path};
