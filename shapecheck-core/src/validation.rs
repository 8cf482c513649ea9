//! Validation artifacts
//!
//! The engine reports failures as [`ValidationIssue`]s collected into a
//! [`ValidationReport`]; a successful run produces a [`ValidatedInstance`]
//! holding exactly the fields that were present in the input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Machine-readable reason for a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Value does not match or coerce to the declared type
    TypeMismatch,
    /// A required field is absent from the input
    MissingRequiredField,
    /// The input carries a field not declared on the record
    UnexpectedField,
    /// Nested-record descent exceeded the configured depth limit
    MaxDepthExceeded,
}

impl IssueCode {
    /// Stable string form of this code
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type_mismatch",
            Self::MissingRequiredField => "missing_required_field",
            Self::UnexpectedField => "unexpected_field",
            Self::MaxDepthExceeded => "max_depth_exceeded",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Why the value was rejected
    pub code: IssueCode,
    /// JSON path to the offending value, e.g. `$.author.id`
    pub path: String,
    /// Human-readable explanation
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    /// A value of the wrong type
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::new(
            IssueCode::TypeMismatch,
            path,
            format!("expected {expected}, got {actual}"),
        )
    }

    /// A required field missing from the input
    pub fn missing_required(path: impl Into<String>, field: &str) -> Self {
        Self::new(
            IssueCode::MissingRequiredField,
            path,
            format!("required field '{field}' is missing"),
        )
    }

    /// A field present in the input but not declared on the record
    pub fn unexpected_field(path: impl Into<String>, field: &str, record: &str) -> Self {
        Self::new(
            IssueCode::UnexpectedField,
            path,
            format!("unexpected field '{field}' on record '{record}'"),
        )
    }

    /// Nested-record descent went past the depth limit
    pub fn max_depth_exceeded(path: impl Into<String>, limit: usize) -> Self {
        Self::new(
            IssueCode::MaxDepthExceeded,
            path,
            format!("nested records exceed the depth limit of {limit}"),
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Complete outcome of checking one instance against a record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether validation passed (no issues)
    pub valid: bool,
    /// Name of the record type that was validated against
    pub type_name: String,
    /// Field-level issues, in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty (passing) report for a record type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            valid: true,
            type_name: type_name.into(),
            issues: Vec::new(),
        }
    }

    /// Record an issue; any issue marks the report invalid
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.issues.push(issue);
    }

    /// Issues with a particular code
    pub fn issues_with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.code == code)
    }

    /// One-line summary of the outcome
    #[must_use]
    pub fn summary(&self) -> String {
        if self.valid {
            format!("validation of '{}' passed", self.type_name)
        } else {
            format!(
                "validation of '{}' failed with {} issue(s)",
                self.type_name,
                self.issues.len()
            )
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// A validated instance.
///
/// Contains only the fields that were present in the input, with values
/// coerced to their declared types. Absent optional fields are omitted, not
/// defaulted; absent required fields never reach an instance at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedInstance {
    fields: Map<String, Value>,
}

impl ValidatedInstance {
    /// Wrap an already-checked field map
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Value of a field, if it was present in the input
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether a field was present in the input
    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of the fields that were present, in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields present
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields were present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying field map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the instance, yielding the field map
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<ValidatedInstance> for Value {
    fn from(instance: ValidatedInstance) -> Self {
        Value::Object(instance.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_tracks_validity() {
        let mut report = ValidationReport::new("User");
        assert!(report.valid);

        report.add_issue(ValidationIssue::missing_required("$", "id"));
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(
            report.issues_with_code(IssueCode::MissingRequiredField).count(),
            1
        );
    }

    #[test]
    fn issue_display_carries_path_and_code() {
        let issue = ValidationIssue::type_mismatch("$.age", "Int", "string");
        let rendered = issue.to_string();
        assert!(rendered.contains("type_mismatch"));
        assert!(rendered.contains("$.age"));
        assert!(rendered.contains("expected Int, got string"));
    }

    #[test]
    fn instance_exposes_only_present_fields() {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!("u1"));
        let instance = ValidatedInstance::new(fields);

        assert!(instance.contains_field("id"));
        assert!(!instance.contains_field("nickname"));
        assert_eq!(instance.len(), 1);
        assert_eq!(Value::from(instance), json!({"id": "u1"}));
    }

    #[test]
    fn instance_serializes_transparently() -> anyhow::Result<()> {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!("u1"));
        let instance = ValidatedInstance::new(fields);

        assert_eq!(serde_json::to_string(&instance)?, r#"{"id":"u1"}"#);
        Ok(())
    }
}
