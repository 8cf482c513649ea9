//! Type descriptors for structural record types
//!
//! A [`RecordType`] describes one record: an ordered set of named, typed
//! fields with per-field optionality, plus a reference to the [`Namespace`]
//! it was declared in. Field types are [`TypeExpr`]s; a field may reference
//! another record by name before that record is defined ([`TypeExpr::Named`]),
//! to be resolved against the declaring namespace at first validation.

use crate::error::{Result, ShapeCheckError};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a record type.
///
/// Identity is assigned from an atomic counter at construction and never
/// reused. Two record types with identical field sets are still distinct
/// types; the validator cache is keyed by this identity, not by name or
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u64);

impl TypeId {
    fn next() -> Self {
        Self(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of this identity
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scalar value kinds supported in field declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// UTF-8 string
    String,
    /// 64-bit integer
    Int,
    /// Arbitrary-precision integer; decimal strings are accepted on the wire
    BigInt,
    /// Double-precision float
    Float,
    /// Boolean
    Boolean,
    /// RFC 3339 timestamp carried as a string
    DateTime,
    /// Any JSON value, including null
    Json,
}

impl ScalarKind {
    /// Canonical name used in error messages
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared field type.
///
/// This is a closed set: the engine never probes values for capabilities,
/// it matches on the variant.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// A scalar kind
    Scalar(ScalarKind),
    /// A homogeneous list of the inner type
    List(Box<TypeExpr>),
    /// A direct reference to an already-constructed record type
    Record(Arc<RecordType>),
    /// A forward reference by name, resolved against the declaring
    /// namespace at first validation
    Named(String),
}

impl TypeExpr {
    /// Human-readable description of the declared type, for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(kind) => kind.name().to_string(),
            Self::List(inner) => format!("List<{}>", inner.describe()),
            Self::Record(record) => format!("record '{}'", record.name()),
            Self::Named(name) => format!("unresolved reference '{name}'"),
        }
    }
}

/// A single named field on a record type
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name, unique within the record
    pub name: String,
    /// Declared type of the field's value
    pub ty: TypeExpr,
    /// Whether the field must be present in validated input
    pub required: bool,
    /// Optional documentation
    pub description: Option<String>,
}

impl FieldDefinition {
    /// Create a required field
    pub fn required(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            description: None,
        }
    }

    /// Create an optional field
    pub fn optional(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            description: None,
        }
    }

    /// Attach a documentation string
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Structural record type descriptor.
///
/// Immutable once built; field order is declaration order. Holds a
/// reference to its declaring [`Namespace`] so forward references inside it
/// resolve against the right scope regardless of where validation is
/// invoked from.
#[derive(Debug)]
pub struct RecordType {
    id: TypeId,
    name: String,
    fields: IndexMap<String, FieldDefinition>,
    namespace: Arc<Namespace>,
}

impl RecordType {
    /// Start building a record type declared in `namespace`
    #[must_use]
    pub fn builder(name: impl Into<String>, namespace: &Arc<Namespace>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            namespace: Arc::clone(namespace),
            fields: Vec::new(),
        }
    }

    /// Process-unique identity of this type
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared name of this type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldDefinition> {
        &self.fields
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// The namespace this type was declared in
    #[must_use]
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}

/// Builder for [`RecordType`]
pub struct RecordTypeBuilder {
    name: String,
    namespace: Arc<Namespace>,
    fields: Vec<FieldDefinition>,
}

impl RecordTypeBuilder {
    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a required field
    #[must_use]
    pub fn required(self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.field(FieldDefinition::required(name, ty))
    }

    /// Add an optional field
    #[must_use]
    pub fn optional(self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.field(FieldDefinition::optional(name, ty))
    }

    /// Build the record type.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeCheckError::Schema`] if two fields share a name.
    pub fn build(self) -> Result<Arc<RecordType>> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            let name = field.name.clone();
            if fields.insert(name.clone(), field).is_some() {
                return Err(ShapeCheckError::schema_element(
                    format!("duplicate field '{name}'"),
                    self.name,
                ));
            }
        }

        Ok(Arc::new(RecordType {
            id: TypeId::next(),
            name: self.name,
            fields,
            namespace: self.namespace,
        }))
    }

    /// Build the record type and register it in its declaring namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeCheckError::Schema`] on a duplicate field name or a
    /// duplicate symbol in the namespace.
    pub fn define(self) -> Result<Arc<RecordType>> {
        let namespace = Arc::clone(&self.namespace);
        let record = self.build()?;
        namespace.define(Arc::clone(&record))?;
        Ok(record)
    }
}

/// Symbol table for a declaration scope.
///
/// Forward references inside record types declared here resolve against
/// this table. Types may be registered after records referencing them were
/// declared; resolution does not happen until a referencing type is first
/// validated.
#[derive(Debug)]
pub struct Namespace {
    name: String,
    symbols: DashMap<String, Arc<RecordType>>,
}

impl Namespace {
    /// Create a new, empty namespace
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            symbols: DashMap::new(),
        })
    }

    /// Name of this namespace, used in resolution errors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a record type under its declared name.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeCheckError::Schema`] if the name is already taken.
    pub fn define(&self, record: Arc<RecordType>) -> Result<()> {
        let name = record.name().to_string();
        match self.symbols.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ShapeCheckError::schema_element(
                format!("symbol '{name}' is already defined in namespace '{}'", self.name),
                name,
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Look up a record type by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<RecordType>> {
        self.symbols.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of symbols defined
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the namespace has no symbols
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
