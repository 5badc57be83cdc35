//! Custom error types for readsim operations.

use thiserror::Error;

/// Result type alias for readsim operations
pub type Result<T> = std::result::Result<T, ReadsimError>;

/// Error type for readsim operations
#[derive(Error, Debug)]
pub enum ReadsimError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "FAI", "GTF")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Interval requested for a sequence name missing from the index
    #[error("Sequence '{name}' not found in FASTA index")]
    SequenceNotFound {
        /// The sequence name
        name: String,
    },

    /// Sampling parameters under which rejection sampling cannot terminate
    #[error("Cannot sample fragments for '{transcript_id}': {reason}")]
    SamplingInvariant {
        /// The transcript being sampled
        transcript_id: String,
        /// Explanation of the violated precondition
        reason: String,
    },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
