//! Error types for shapecheck operations

use crate::validation::ValidationReport;
use thiserror::Error;

/// Main error type for shapecheck operations
#[derive(Error, Debug)]
pub enum ShapeCheckError {
    /// `validate` was handed a descriptor that is not a record type.
    /// Programmer error, surfaced immediately.
    #[error("only record types can be validated, got {kind} instead")]
    UnsupportedType {
        /// Description of the descriptor that was passed
        kind: String,
    },

    /// A forward type reference could not be resolved in the declaring
    /// namespace. Surfaced at first-use compile time; retried on the next
    /// call, never cached as failed.
    #[error("unresolved type reference '{symbol}' while compiling record '{record}' (namespace '{namespace}')")]
    Resolution {
        /// The name that was looked up
        symbol: String,
        /// The record type being compiled
        record: String,
        /// The namespace that was searched
        namespace: String,
    },

    /// Input data does not conform to the compiled shape
    #[error("{}", .report.summary())]
    Validation {
        /// Per-field issues with paths
        report: ValidationReport,
    },

    /// Invalid type declaration (duplicate field name, duplicate symbol)
    #[error("invalid type declaration: {message}")]
    Schema {
        /// What went wrong
        message: String,
        /// Declaration element involved, if known
        element: Option<String>,
    },
}

/// Result type alias for shapecheck operations
pub type Result<T> = std::result::Result<T, ShapeCheckError>;

impl ShapeCheckError {
    /// Create an unsupported-type error
    #[must_use]
    pub fn unsupported_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedType { kind: kind.into() }
    }

    /// Create a resolution error
    #[must_use]
    pub fn resolution(
        symbol: impl Into<String>,
        record: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            symbol: symbol.into(),
            record: record.into(),
            namespace: namespace.into(),
        }
    }

    /// Create a validation error from a report
    #[must_use]
    pub fn validation(report: ValidationReport) -> Self {
        Self::Validation { report }
    }

    /// Create a schema error
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            element: None,
        }
    }

    /// Create a schema error naming the declaration element involved
    #[must_use]
    pub fn schema_element(message: impl Into<String>, element: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            element: Some(element.into()),
        }
    }

    /// The validation report, if this is a validation error
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation { report } => Some(report),
            _ => None,
        }
    }
}
