//! Forward-reference resolution
//!
//! A record type may declare fields whose type is a [`TypeExpr::Named`]
//! reference to a type that did not exist yet when the record was built.
//! Resolution replaces every such reference with the concrete record type,
//! looking names up in the namespace the record was *declared* in — not the
//! caller's scope — so types can reference siblings defined later in the
//! same scope regardless of where validation is invoked from.

use shapecheck_core::{FieldDefinition, RecordType, Result, ScalarKind, ShapeCheckError, TypeExpr};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A fully resolved field type: no dangling references remain.
#[derive(Debug, Clone)]
pub enum ValueShape {
    /// A scalar kind
    Scalar(ScalarKind),
    /// A homogeneous list of the inner shape
    List(Box<ValueShape>),
    /// A concrete record type, validated through the cache at execution time
    Record(Arc<RecordType>),
}

impl ValueShape {
    /// Human-readable description for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(kind) => kind.name().to_string(),
            Self::List(inner) => format!("List<{}>", inner.describe()),
            Self::Record(record) => format!("record '{}'", record.name()),
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A field whose declared type has been fully resolved
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Field name
    pub name: String,
    /// Whether the field must be present in the input
    pub required: bool,
    /// Concrete shape of the field's value
    pub shape: ValueShape,
}

/// Resolve every field of `record`, in declaration order.
///
/// # Errors
///
/// Returns [`ShapeCheckError::Resolution`] naming the missing symbol, the
/// record being compiled, and the namespace searched, if any `Named`
/// reference has no definition.
pub fn resolve_record(record: &RecordType) -> Result<Vec<ResolvedField>> {
    record
        .fields()
        .values()
        .map(|field| resolve_field(field, record))
        .collect()
}

fn resolve_field(field: &FieldDefinition, record: &RecordType) -> Result<ResolvedField> {
    Ok(ResolvedField {
        name: field.name.clone(),
        required: field.required,
        shape: resolve_expr(&field.ty, record)?,
    })
}

fn resolve_expr(expr: &TypeExpr, record: &RecordType) -> Result<ValueShape> {
    match expr {
        TypeExpr::Scalar(kind) => Ok(ValueShape::Scalar(*kind)),
        TypeExpr::List(inner) => Ok(ValueShape::List(Box::new(resolve_expr(inner, record)?))),
        TypeExpr::Record(target) => Ok(ValueShape::Record(Arc::clone(target))),
        TypeExpr::Named(symbol) => {
            let namespace = record.namespace();
            let target = namespace.lookup(symbol).ok_or_else(|| {
                ShapeCheckError::resolution(symbol.clone(), record.name(), namespace.name())
            })?;
            trace!(
                symbol = %symbol,
                record = %record.name(),
                namespace = %namespace.name(),
                "resolved forward reference"
            );
            Ok(ValueShape::Record(target))
        }
    }
}
