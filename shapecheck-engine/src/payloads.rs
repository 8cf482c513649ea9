//! Structured error payloads returned by the query engine process
//!
//! The engine reports failures as JSON payloads; these are ordinary record
//! types validated with the same machinery as user-declared types. All
//! fields are optional — the engine does not exhaustively document which it
//! sends. `ErrorResponse` references `UserFacingError` by name before that
//! type is defined, so the reference is resolved against the shared
//! namespace when an `ErrorResponse` is first validated.

use crate::validator::validate;
use once_cell::sync::Lazy;
use serde_json::Value;
use shapecheck_core::{Namespace, RecordType, Result, ScalarKind, TypeExpr, ValidatedInstance};
use std::sync::Arc;

struct ProtocolTypes {
    error_response: Arc<RecordType>,
    user_facing_error: Arc<RecordType>,
}

static PROTOCOL: Lazy<ProtocolTypes> = Lazy::new(|| {
    let namespace = Namespace::new("engine.protocol");

    // declared first, with a forward reference to a type defined below
    let error_response = RecordType::builder("ErrorResponse", &namespace)
        .optional(
            "user_facing_error",
            TypeExpr::Named("UserFacingError".to_string()),
        )
        .define()
        .expect("static protocol types are well formed");

    let user_facing_error = RecordType::builder("UserFacingError", &namespace)
        .optional("error_code", TypeExpr::Scalar(ScalarKind::String))
        .optional("message", TypeExpr::Scalar(ScalarKind::String))
        .optional("meta", TypeExpr::Scalar(ScalarKind::Json))
        .define()
        .expect("static protocol types are well formed");

    ProtocolTypes {
        error_response,
        user_facing_error,
    }
});

/// The `ErrorResponse` record type
#[must_use]
pub fn error_response_type() -> &'static Arc<RecordType> {
    &PROTOCOL.error_response
}

/// The `UserFacingError` record type
#[must_use]
pub fn user_facing_error_type() -> &'static Arc<RecordType> {
    &PROTOCOL.user_facing_error
}

/// Validate an engine error payload.
///
/// # Errors
///
/// Returns [`ShapeCheckError::Validation`](shapecheck_core::ShapeCheckError::Validation)
/// if the payload does not match the `ErrorResponse` shape.
pub fn parse_error_response(data: &Value) -> Result<ValidatedInstance> {
    validate(&TypeExpr::Record(Arc::clone(error_response_type())), data)
}
