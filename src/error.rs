//! Error types.
//!
//! Queries and mutations on a set never fail: missing keys come back as
//! `None` and inverted ranges as empty results. Only building a set from a
//! [`Config`](crate::config::Config) can be rejected.

use thiserror::Error;

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}
