//! Error types and SNAFU context selectors for the conversion pipeline.
//!
//! Stage-local failures (storage, codec, combine) carry their own error
//! enums; this module wraps them in [`ConvertError`], the single error type
//! a caller of [`crate::pipeline::Converter`] ever sees. [`ErrorKind`]
//! collapses the variants into the coarse taxonomy callers branch on.

use std::fmt;

use snafu::prelude::*;

use crate::{codec::CodecError, combine::CombineError, pipeline::Stage, storage::StorageError};

/// Which side of a conversion a file name was resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Resolved as a source file.
    Input,
    /// Resolved as a destination file.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
        })
    }
}

/// Coarse classification of a [`ConvertError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown input or output suffix, or no codec for the resolved kind.
    UnsupportedFormat,
    /// Missing columns, wrong element count or name, zero rows.
    SchemaViolation,
    /// The processed result has zero rows.
    EmptyResult,
    /// Open/read/write/fsync/rename failure.
    Io,
    /// Opaque failure from an external reader, writer or processor.
    Codec,
}

/// Errors from a conversion.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConvertError {
    /// The file name matches no known suffix.
    #[snafu(display("Unsupported {direction} file type: {path}"))]
    UnsupportedFormat {
        /// Offending path.
        path: String,
        /// Whether the path was an input or the output.
        direction: Direction,
    },

    /// The format is known, but no codec was registered for it.
    #[snafu(display("No codec registered for {kind} files"))]
    CodecUnavailable {
        /// Canonical name of the kind that lacks a codec.
        kind: String,
    },

    /// The conversion was started without any input files.
    #[snafu(display("No input files given"))]
    NoInputs,

    /// A source file does not hold usable splat data.
    #[snafu(display("Invalid splat data in {path}: {reason}"))]
    SchemaViolation {
        /// File that failed validation.
        path: String,
        /// Human readable description of the violation.
        reason: String,
    },

    /// Nothing is left to write after processing.
    #[snafu(display("No splats to write"))]
    EmptyResult,

    /// Filesystem failure while reading the input or committing the output.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(source, backtrace)]
        source: StorageError,
    },

    /// An external collaborator failed.
    #[snafu(display("{stage} failed for {path}: {source}"))]
    Codec {
        /// Pipeline stage that invoked the collaborator.
        stage: Stage,
        /// File the collaborator was working on.
        path: String,
        /// Opaque error returned by the collaborator.
        source: CodecError,
    },

    /// Source tables could not be merged under the configured fill policy.
    #[snafu(display("Combine error: {source}"))]
    Combine {
        /// Underlying combine error.
        source: CombineError,
    },
}

impl ConvertError {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::UnsupportedFormat { .. } | ConvertError::CodecUnavailable { .. } => {
                ErrorKind::UnsupportedFormat
            }
            ConvertError::NoInputs
            | ConvertError::SchemaViolation { .. }
            | ConvertError::Combine { .. } => ErrorKind::SchemaViolation,
            ConvertError::EmptyResult => ErrorKind::EmptyResult,
            ConvertError::Storage { .. } => ErrorKind::Io,
            ConvertError::Codec { .. } => ErrorKind::Codec,
        }
    }
}

/// Convenience alias for pipeline results.
pub type ConvertResult<T> = Result<T, ConvertError>;
