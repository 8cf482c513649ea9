//! Compiled validators
//!
//! A [`CompiledValidator`] is the reusable artifact produced once per record
//! type: a per-field check table built from the resolved descriptor. It
//! enforces strict shape semantics — every present field must match or
//! coerce to its declared type, undeclared fields are rejected outright, and
//! the parsed result carries only the fields that were actually supplied.
//!
//! Nested record shapes are not compiled inline; they are validated through
//! the cache at execution time, so self-referential types never re-enter a
//! build that is still in progress.

use super::ValidationOptions;
use super::cache::ValidatorCache;
use super::context::ValidationContext;
use super::resolve::{ResolvedField, ValueShape, resolve_record};
use chrono::DateTime;
use serde_json::{Map, Number, Value};
use shapecheck_core::{RecordType, Result, ScalarKind, TypeId, ValidationIssue, ValidationReport};
use std::collections::HashMap;
use tracing::debug;

/// Largest magnitude a float can hold without losing integer precision
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Compiled validator for one record type.
///
/// Built at most once per type, then shared read-only.
#[derive(Debug)]
pub struct CompiledValidator {
    type_id: TypeId,
    type_name: String,
    fields: Vec<ResolvedField>,
    index: HashMap<String, usize>,
}

impl CompiledValidator {
    /// Compile a validator from a record type descriptor.
    ///
    /// Applies forward-reference resolution against the type's declaring
    /// namespace before building the check table.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeCheckError::Resolution`](shapecheck_core::ShapeCheckError::Resolution)
    /// if a referenced type name is not defined in the declaring namespace.
    pub fn compile(record: &RecordType) -> Result<Self> {
        let fields = resolve_record(record)?;
        let index = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.clone(), position))
            .collect();

        debug!(
            type_name = %record.name(),
            type_id = %record.id(),
            field_count = fields.len(),
            "compiled validator"
        );

        Ok(Self {
            type_id: record.id(),
            type_name: record.name().to_string(),
            fields,
            index,
        })
    }

    /// Identity of the record type this validator was compiled for
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the record type this validator was compiled for
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of declared fields
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Check `value` against the compiled shape.
    ///
    /// Issues are appended to `report`. Returns the pruned, coerced field
    /// map when this value parsed cleanly, `None` when issues were recorded
    /// for it.
    ///
    /// # Errors
    ///
    /// Propagates compile failures of nested record types reached through
    /// the cache.
    pub fn execute(
        &self,
        cache: &ValidatorCache,
        value: &Value,
        context: &mut ValidationContext,
        report: &mut ValidationReport,
        options: &ValidationOptions,
    ) -> Result<Option<Map<String, Value>>> {
        let issues_before = report.issues.len();

        let Some(object) = value.as_object() else {
            report.add_issue(ValidationIssue::type_mismatch(
                context.path(),
                format!("record '{}'", self.type_name),
                json_type_name(value),
            ));
            return Ok(None);
        };

        let mut parsed = Map::new();

        for field in &self.fields {
            match object.get(&field.name) {
                Some(field_value) => {
                    context.push_field(&field.name);
                    let checked =
                        self.check_value(cache, &field.shape, field_value, context, report, options);
                    context.pop();
                    if let Some(coerced) = checked? {
                        parsed.insert(field.name.clone(), coerced);
                    }
                }
                None if field.required => {
                    report.add_issue(ValidationIssue::missing_required(
                        context.child_path(&field.name),
                        &field.name,
                    ));
                }
                // absent optional fields are omitted, never defaulted
                None => {}
            }
            if options.fail_fast && !report.valid {
                return Ok(None);
            }
        }

        for key in object.keys() {
            if !self.index.contains_key(key) {
                report.add_issue(ValidationIssue::unexpected_field(
                    context.child_path(key),
                    key,
                    &self.type_name,
                ));
                if options.fail_fast {
                    return Ok(None);
                }
            }
        }

        Ok((report.issues.len() == issues_before).then_some(parsed))
    }

    fn check_value(
        &self,
        cache: &ValidatorCache,
        shape: &ValueShape,
        value: &Value,
        context: &mut ValidationContext,
        report: &mut ValidationReport,
        options: &ValidationOptions,
    ) -> Result<Option<Value>> {
        match shape {
            ValueShape::Scalar(kind) => {
                if let Some(coerced) = coerce_scalar(*kind, value) {
                    Ok(Some(coerced))
                } else {
                    report.add_issue(ValidationIssue::type_mismatch(
                        context.path(),
                        kind.name(),
                        json_type_name(value),
                    ));
                    Ok(None)
                }
            }
            ValueShape::List(inner) => {
                let Some(elements) = value.as_array() else {
                    report.add_issue(ValidationIssue::type_mismatch(
                        context.path(),
                        shape.describe(),
                        json_type_name(value),
                    ));
                    return Ok(None);
                };

                let mut parsed = Vec::with_capacity(elements.len());
                let mut clean = true;
                for (position, element) in elements.iter().enumerate() {
                    context.push_index(position);
                    let checked = self.check_value(cache, inner, element, context, report, options);
                    context.pop();
                    match checked? {
                        Some(coerced) => parsed.push(coerced),
                        None => clean = false,
                    }
                    if options.fail_fast && !report.valid {
                        return Ok(None);
                    }
                }
                Ok(clean.then_some(Value::Array(parsed)))
            }
            ValueShape::Record(record) => {
                if context.depth() >= options.max_depth {
                    report.add_issue(ValidationIssue::max_depth_exceeded(
                        context.path(),
                        options.max_depth,
                    ));
                    return Ok(None);
                }

                let validator = cache.get_or_build(record)?;
                context.enter_record();
                let nested = validator.execute(cache, value, context, report, options);
                context.leave_record();
                Ok(nested?.map(Value::Object))
            }
        }
    }
}

/// Coerce a value to a scalar kind, or reject it.
///
/// The rules are deliberately narrow: numeric widening only where it is
/// lossless, decimal strings only for `BigInt` (the engine wire format),
/// no cross-kind coercions for strings and booleans.
fn coerce_scalar(kind: ScalarKind, value: &Value) -> Option<Value> {
    match kind {
        ScalarKind::String => value.is_string().then(|| value.clone()),
        ScalarKind::Boolean => value.is_boolean().then(|| value.clone()),
        ScalarKind::Float => value.is_number().then(|| value.clone()),
        ScalarKind::Json => Some(value.clone()),
        ScalarKind::Int => coerce_int(value),
        ScalarKind::BigInt => coerce_big_int(value),
        ScalarKind::DateTime => match value {
            Value::String(text) if DateTime::parse_from_rfc3339(text).is_ok() => {
                Some(value.clone())
            }
            _ => None,
        },
    }
}

fn coerce_int(value: &Value) -> Option<Value> {
    let Value::Number(number) = value else {
        return None;
    };
    if number.is_i64() || number.is_u64() {
        return Some(value.clone());
    }
    // integral floats within the safe range are normalized to integers
    let float = number.as_f64()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        Some(Value::Number(Number::from(float as i64)))
    } else {
        None
    }
}

fn coerce_big_int(value: &Value) -> Option<Value> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(value.clone()),
        // 64-bit-plus integers arrive as decimal strings; kept as given
        Value::String(text) if is_decimal_string(text) => Some(value.clone()),
        _ => None,
    }
}

fn is_decimal_string(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Human-readable name for a JSON value type
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shapecheck_core::{IssueCode, Namespace, TypeExpr};

    fn run(
        validator: &CompiledValidator,
        cache: &ValidatorCache,
        value: &Value,
    ) -> (Option<Map<String, Value>>, ValidationReport) {
        let mut context = ValidationContext::new();
        let mut report = ValidationReport::new(validator.type_name());
        let parsed = validator
            .execute(
                cache,
                value,
                &mut context,
                &mut report,
                &ValidationOptions::default(),
            )
            .expect("no resolution errors in this test");
        (parsed, report)
    }

    #[test]
    fn compiles_and_checks_a_simple_record() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let user = RecordType::builder("User", &ns)
            .required("id", TypeExpr::Scalar(ScalarKind::String))
            .optional("age", TypeExpr::Scalar(ScalarKind::Int))
            .build()?;

        let cache = ValidatorCache::new();
        let validator = CompiledValidator::compile(&user)?;
        assert_eq!(validator.field_count(), 2);

        let (parsed, report) = run(&validator, &cache, &json!({"id": "u1", "age": 30}));
        assert!(report.valid);
        let parsed = parsed.expect("clean parse");
        assert_eq!(parsed.get("id"), Some(&json!("u1")));
        assert_eq!(parsed.get("age"), Some(&json!(30)));
        Ok(())
    }

    #[test]
    fn rejects_non_object_input() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let user = RecordType::builder("User", &ns)
            .required("id", TypeExpr::Scalar(ScalarKind::String))
            .build()?;

        let cache = ValidatorCache::new();
        let validator = CompiledValidator::compile(&user)?;
        let (parsed, report) = run(&validator, &cache, &json!(["not", "an", "object"]));

        assert!(parsed.is_none());
        assert_eq!(report.issues[0].code, IssueCode::TypeMismatch);
        assert!(report.issues[0].message.contains("record 'User'"));
        Ok(())
    }

    #[test]
    fn list_issues_carry_element_paths() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let post = RecordType::builder("Post", &ns)
            .required(
                "tags",
                TypeExpr::List(Box::new(TypeExpr::Scalar(ScalarKind::String))),
            )
            .build()?;

        let cache = ValidatorCache::new();
        let validator = CompiledValidator::compile(&post)?;
        let (parsed, report) = run(&validator, &cache, &json!({"tags": ["ok", 7]}));

        assert!(parsed.is_none());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].path, "$.tags[1]");
        Ok(())
    }

    #[test]
    fn scalar_coercions() {
        // Int: integral floats normalize, fractions do not
        assert_eq!(coerce_scalar(ScalarKind::Int, &json!(2.0)), Some(json!(2)));
        assert_eq!(coerce_scalar(ScalarKind::Int, &json!(2.5)), None);
        assert_eq!(coerce_scalar(ScalarKind::Int, &json!("2")), None);

        // BigInt: decimal strings pass through unchanged
        assert_eq!(
            coerce_scalar(ScalarKind::BigInt, &json!("9223372036854775808")),
            Some(json!("9223372036854775808"))
        );
        assert_eq!(coerce_scalar(ScalarKind::BigInt, &json!("12a")), None);
        assert_eq!(coerce_scalar(ScalarKind::BigInt, &json!(12)), Some(json!(12)));

        // Float accepts any number
        assert_eq!(coerce_scalar(ScalarKind::Float, &json!(1)), Some(json!(1)));

        // String and Boolean are strict
        assert_eq!(coerce_scalar(ScalarKind::String, &json!(1)), None);
        assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!("true")), None);

        // DateTime wants RFC 3339
        assert_eq!(
            coerce_scalar(ScalarKind::DateTime, &json!("2024-01-15T10:30:00Z")),
            Some(json!("2024-01-15T10:30:00Z"))
        );
        assert_eq!(coerce_scalar(ScalarKind::DateTime, &json!("yesterday")), None);

        // Json accepts anything, including null
        assert_eq!(coerce_scalar(ScalarKind::Json, &json!(null)), Some(json!(null)));
    }

    #[test]
    fn null_is_not_a_valid_scalar_outside_json() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let user = RecordType::builder("User", &ns)
            .optional("nickname", TypeExpr::Scalar(ScalarKind::String))
            .build()?;

        let cache = ValidatorCache::new();
        let validator = CompiledValidator::compile(&user)?;
        let (parsed, report) = run(&validator, &cache, &json!({"nickname": null}));

        assert!(parsed.is_none());
        assert_eq!(report.issues[0].path, "$.nickname");
        Ok(())
    }
}
