//! Foundation module - shared building blocks for the domain layer.

mod errors;

pub use errors::{DomainError, ErrorCode};
