//! Crate-wide error type.
//!
//! Only the kinds in this enum ever escape the public API. The local
//! control signals `NoMatch`, `NoCloseMatch` and `BuildTimeout` described
//! in the design notes are resolved internally by `diff::build` and
//! `Patch::apply` and never constructed here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed patch: {0}")]
    MalformedPatch(String),

    #[error("buffer too short for fragment at offset {offset}")]
    InputTooShort { offset: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
