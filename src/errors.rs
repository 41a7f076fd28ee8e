//! Error types for the Machetli minimization engine.
//!
//! This module defines a unified error enumeration used across the grounded-task
//! codec, the evaluation driver, the search engine, and the state-blob envelope.
//! It integrates with `thiserror` to provide rich `Display` implementations and
//! error source chaining where applicable.
//!
//! Notes:
//! - Parser and validation errors carry enough context to point a user at the
//!   offending line or field.
//! - `SubmissionError`/`PollingError` are the only variants that escape the
//!   driver as exceptional control flow; everything else is folded into
//!   [`crate::driver::CandidateStatus`] by policy.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the Machetli minimization engine.
pub enum MachetliError {
    /// Malformed input to the grounded-task codec.
    #[error("parse error at line {line}: expected {expected}, found {found}")]
    ParseError {
        line: usize,
        expected: String,
        found: String,
    },

    /// A task violates one of the structural invariants in the data model.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Rename would need to exceed the 26-letter alphabet for a field.
    #[error("rename index {index} is too large for field `{field}` (alphabet has 26 letters)")]
    TooLarge { field: String, index: usize },

    /// The execution environment refused to accept a batch.
    #[error("submission error: {0}")]
    SubmissionError(String),

    /// The execution environment failed to report a status for a submitted task.
    #[error("polling error: {0}")]
    PollingError(String),

    /// The initial state does not have the property under evaluation.
    #[error("initial state does not have the evaluated property")]
    InitialLacksProperty,

    /// A condition the shim or driver maps to the `Critical` exit code: blob
    /// version/checksum mismatch, subprocess spawn failure, or an evaluator
    /// exiting with an unrecognized code.
    #[error("critical error: {0}")]
    CriticalError(String),

    /// Filesystem or process I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MachetliError>;
