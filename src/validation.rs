//! Bridge between `validator` constraint checks and field violations.

use crate::params::{FieldViolation, join_path};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Check every declared constraint on `value`, including nested objects and lists.
///
/// Paths are relative to `value` and sorted, e.g. `values[1].name`.
pub fn violations<T: Validate + ?Sized>(value: &T) -> Vec<FieldViolation> {
    match value.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => {
            let mut collected = Vec::new();
            flatten("", &errors, &mut collected);
            collected
        }
    }
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldViolation>) {
    let mut entries: Vec<(String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();
    entries.sort_by(|left, right| left.0.cmp(&right.0));

    for (field, kind) in entries {
        let path = join_path(prefix, &field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(FieldViolation::new(path.clone(), describe(error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(ToString::to_string);
    match error.code.as_ref() {
        "not_blank" => "must not be blank".to_string(),
        "required" => "must not be null".to_string(),
        "email" => "must be a well-formed email address".to_string(),
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("size must be between {} and {}", min, max),
            (Some(min), None) => format!("size must be at least {}", min),
            (None, Some(max)) => format!("size must be at most {}", max),
            (None, None) => "has invalid size".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must be greater than or equal to {}", min),
            (None, Some(max)) => format!("must be less than or equal to {}", max),
            (None, None) => "is out of range".to_string(),
        },
        code => format!("is invalid ({})", code),
    }
}

/// Custom constraint: the string must contain a non-whitespace character
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("not_blank").with_message(Cow::Borrowed("must not be blank")))
    } else {
        Ok(())
    }
}
