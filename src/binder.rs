//! Parameter binding: converts the untyped `params` value into a method's input type.
//!
//! Conversion goes through `serde_path_to_error` so that a failure deep inside a
//! nested object graph is reported with its full path, e.g. `params.values[1].name`.

use crate::params::Params;
use serde_json::Value;
use serde_path_to_error::Segment;

/// Root segment used for every reported field path
pub const PARAMS_ROOT: &str = "params";

/// Why a params value could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingFailure {
    /// The method requires input and the request carried none
    MissingParams,
    /// The value does not fit the target type
    TypeMismatch {
        path: String,
        kind: MismatchKind,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// A required field is absent or null
    MissingField,
    /// A value has the wrong JSON shape or cannot be converted
    InvalidValue,
}

impl BindingFailure {
    pub fn is_missing_params(&self) -> bool {
        matches!(self, BindingFailure::MissingParams)
    }

    /// Offending field path, if the failure concerns a specific field
    pub fn path(&self) -> Option<&str> {
        match self {
            BindingFailure::MissingParams => None,
            BindingFailure::TypeMismatch { path, .. } => Some(path),
        }
    }
}

impl std::fmt::Display for BindingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingFailure::MissingParams => {
                write!(f, "{}", crate::error_messages::MISSING_PARAMS)
            }
            BindingFailure::TypeMismatch {
                path,
                kind: MismatchKind::MissingField,
                ..
            } => write!(f, "{} must not be null", path),
            BindingFailure::TypeMismatch {
                path,
                kind: MismatchKind::InvalidValue,
                detail,
            } => write!(f, "{} has invalid value: {}", path, detail),
        }
    }
}

impl std::error::Error for BindingFailure {}

/// Bind a raw params value to `T`.
///
/// Absent params bind to `T` only when `T` does not require input (the `()` marker),
/// in which case the value is built from `null`.
pub fn bind<T: Params>(raw: Option<Value>) -> Result<T, BindingFailure> {
    let value = match raw {
        Some(value) => value,
        None if T::REQUIRED => return Err(BindingFailure::MissingParams),
        None => Value::Null,
    };

    let bound: Result<T, _> = serde_path_to_error::deserialize(value);
    bound.map_err(|error| {
        let path = render_path(error.path().iter());
        let detail = error.into_inner().to_string();
        classify(path, detail)
    })
}

fn classify(path: String, detail: String) -> BindingFailure {
    if let Some(field) = missing_field_name(&detail) {
        return BindingFailure::TypeMismatch {
            path: crate::params::join_path(&path, field),
            kind: MismatchKind::MissingField,
            detail,
        };
    }

    // `null` for a non-optional field
    if detail.starts_with("invalid type: null") {
        return BindingFailure::TypeMismatch {
            path,
            kind: MismatchKind::MissingField,
            detail,
        };
    }

    BindingFailure::TypeMismatch {
        path,
        kind: MismatchKind::InvalidValue,
        detail,
    }
}

fn missing_field_name(detail: &str) -> Option<&str> {
    detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

fn render_path<'a>(segments: impl Iterator<Item = &'a Segment>) -> String {
    let mut path = String::from(PARAMS_ROOT);
    for segment in segments {
        match segment {
            Segment::Seq { index } => path.push_str(&format!("[{}]", index)),
            Segment::Map { key } => {
                path.push('.');
                path.push_str(key);
            }
            Segment::Enum { variant } => {
                path.push('.');
                path.push_str(variant);
            }
            _ => path.push_str(".?"),
        }
    }
    path
}
