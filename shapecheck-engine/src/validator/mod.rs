//! Validation engine for structural record types
//!
//! This module implements the compile-and-cache validation pipeline:
//!
//! - forward-reference resolution against the declaring namespace
//! - one-time compilation of a record type into a reusable validator
//! - a process-wide, build-once-per-type validator cache
//! - strict instance checking (forbid-extra, required-presence, per-kind
//!   coercion) producing present-fields-only results

pub mod cache;
pub mod compiled;
pub mod context;
pub mod resolve;

pub use cache::{CacheStats, ValidatorCache};
pub use compiled::CompiledValidator;
pub use context::ValidationContext;
pub use resolve::{ResolvedField, ValueShape};

use serde_json::Value;
use shapecheck_core::{
    RecordType, Result, ShapeCheckError, TypeExpr, ValidatedInstance, ValidationReport,
};
use std::sync::Arc;

/// Options controlling a single validation run
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Stop at the first issue instead of collecting all of them
    pub fail_fast: bool,
    /// Upper bound on nested-record descent
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_depth: 64,
        }
    }
}

/// Validate untrusted data against a record type.
///
/// Uses the process-wide validator cache: the first call for a given type
/// compiles its validator (resolving forward references in the type's
/// declaring namespace); every later call reuses it.
///
/// On success the returned instance contains exactly the fields present in
/// `data`, coerced to their declared types. Unset optional fields are
/// omitted, not defaulted.
///
/// # Errors
///
/// - [`ShapeCheckError::UnsupportedType`] if `ty` is not a record type
/// - [`ShapeCheckError::Resolution`] if a forward reference cannot be
///   resolved in the declaring namespace
/// - [`ShapeCheckError::Validation`] if `data` does not conform, with
///   per-field issues and paths
pub fn validate(ty: &TypeExpr, data: &Value) -> Result<ValidatedInstance> {
    validate_with(cache::global(), ty, data, &ValidationOptions::default())
}

/// [`validate`] against an explicit cache with explicit options
pub fn validate_with(
    cache: &ValidatorCache,
    ty: &TypeExpr,
    data: &Value,
    options: &ValidationOptions,
) -> Result<ValidatedInstance> {
    let record = expect_record(ty)?;
    let validator = cache.get_or_build(record)?;

    let mut context = ValidationContext::new();
    let mut report = ValidationReport::new(record.name());
    let parsed = validator.execute(cache, data, &mut context, &mut report, options)?;

    match parsed {
        Some(fields) if report.valid => Ok(ValidatedInstance::new(fields)),
        _ => Err(ShapeCheckError::validation(report)),
    }
}

/// Check data against a record type, returning the full report.
///
/// Unlike [`validate`], a non-conforming instance is an `Ok` report with
/// `valid == false`; only unsupported descriptors and resolution failures
/// are errors.
///
/// # Errors
///
/// - [`ShapeCheckError::UnsupportedType`] if `ty` is not a record type
/// - [`ShapeCheckError::Resolution`] on a dangling forward reference
pub fn check(ty: &TypeExpr, data: &Value) -> Result<ValidationReport> {
    check_with(cache::global(), ty, data, &ValidationOptions::default())
}

/// [`check`] against an explicit cache with explicit options
pub fn check_with(
    cache: &ValidatorCache,
    ty: &TypeExpr,
    data: &Value,
    options: &ValidationOptions,
) -> Result<ValidationReport> {
    let record = expect_record(ty)?;
    let validator = cache.get_or_build(record)?;

    let mut context = ValidationContext::new();
    let mut report = ValidationReport::new(record.name());
    validator.execute(cache, data, &mut context, &mut report, options)?;
    Ok(report)
}

/// The record-kind gate: only record descriptors reach the compiler.
fn expect_record(ty: &TypeExpr) -> Result<&Arc<RecordType>> {
    match ty {
        TypeExpr::Record(record) => Ok(record),
        other => Err(ShapeCheckError::unsupported_type(other.describe())),
    }
}
