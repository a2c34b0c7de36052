//! Shared error type for the splinter workspace.

use std::path::PathBuf;

/// Result alias used throughout splinter-core and its dependents.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for fragmentation and reassembly operations.
///
/// Mirrors the fail-closed/skip-with-report split: integrity failures
/// (`Corrupt`) and structural failures (`Malformed`, `InvalidInput`) are
/// fatal to the operation that raised them, while `Incomplete` is meant to
/// be caught and reported by callers that scan many groups at once.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying filesystem failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-supplied parameters are invalid (e.g. `size_range >= max_size`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A fragment file does not conform to the on-disk format.
    #[error("malformed fragment: {0}")]
    Malformed(String),

    /// A fragment or restored file failed an integrity check.
    #[error("corrupt: {0}")]
    Corrupt(String),

    /// The planner could not extend coverage past a given offset.
    #[error("incomplete: file {original_hash} is missing a fragment starting at byte {missing_at}")]
    Incomplete {
        /// `file_hash` of the group that could not be fully planned.
        original_hash: String,
        /// Byte offset at which coverage could not be extended.
        missing_at: u64,
    },

    /// The reassembly target already exists and does not match.
    #[error("output already exists and does not match: {0}")]
    AlreadyExists(PathBuf),
}
