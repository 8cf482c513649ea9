//! # shapecheck-core
//!
//! Core types for runtime structural-record validation.
//!
//! This crate provides the descriptor language for structural record types
//! (named, typed fields with optionality), the namespace in which forward
//! type references are resolved, the error taxonomy, and the artifacts a
//! validation run produces. The engine that compiles and caches validators
//! lives in `shapecheck-engine`.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types for shapecheck operations
pub mod error;

/// Type descriptors: scalar kinds, type expressions, records, namespaces
pub mod types;

/// Validation artifacts: issues, reports, validated instances
pub mod validation;

// Re-export commonly used types
pub use error::{Result, ShapeCheckError};
pub use types::{FieldDefinition, Namespace, RecordType, RecordTypeBuilder, ScalarKind, TypeExpr, TypeId};
pub use validation::{IssueCode, ValidatedInstance, ValidationIssue, ValidationReport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Result, ShapeCheckError};
    pub use crate::types::*;
    pub use crate::validation::*;
}
