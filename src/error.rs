//! Cache error types

use thiserror::Error;

/// Cache operation result type
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised while validating cache input.
///
/// These never reach callers of the public API: `update` logs and drops
/// them, `resolve` maps them to an empty result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("empty name")]
    EmptyName,

    #[error("invalid character {ch:?} in name {name:?}")]
    InvalidCharacter { name: String, ch: char },
}
