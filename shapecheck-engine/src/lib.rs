//! # shapecheck-engine
//!
//! Validation engine for structural record types.
//!
//! Given a [`RecordType`](shapecheck_core::RecordType) descriptor and a blob
//! of untrusted data, [`validate`] checks the data against the declared
//! shape and returns a [`ValidatedInstance`](shapecheck_core::ValidatedInstance)
//! containing exactly the fields that were present in the input.
//!
//! The engine compiles each record type into a reusable validator on first
//! use, resolving forward type references against the type's declaring
//! namespace, and caches the result process-wide so the compile step runs at
//! most once per type for the life of the process.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Structured error payloads returned by the query engine process
pub mod payloads;

/// The validation engine: resolver, compiler, cache, entry points
pub mod validator;

pub use validator::{
    ValidationOptions, ValidatorCache, check, check_with, validate, validate_with,
};

// Re-export the descriptor language so most consumers need only this crate
pub use shapecheck_core::{
    FieldDefinition, IssueCode, Namespace, RecordType, Result, ScalarKind, ShapeCheckError,
    TypeExpr, TypeId, ValidatedInstance, ValidationIssue, ValidationReport,
};
