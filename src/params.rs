//! Input contract for JSON-RPC methods.
//!
//! A method takes at most one input value. Every input type implements [`Params`],
//! which tells the dispatcher whether the method needs `params` at all and how to check
//! declared constraints after binding. Documentation schemas come from the type's
//! `schemars::JsonSchema` derive.
//!
//! Types deriving `validator::Validate` get an implementation through
//! [`validated_params!`](crate::validated_params); types without constraints use
//! [`plain_params!`](crate::plain_params).

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A single failed constraint, addressed by its field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Re-root the field path under `prefix`
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.field = join_path(prefix, &self.field);
        self
    }

    /// Render violations as the JSON array used for error data
    pub fn render_all(violations: &[FieldViolation]) -> Value {
        Value::Array(
            violations
                .iter()
                .map(|violation| Value::String(violation.to_string()))
                .collect(),
        )
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Join a parent path and a relative path, keeping `[index]` segments attached
pub fn join_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        prefix.to_string()
    } else if path.starts_with('[') {
        format!("{}{}", prefix, path)
    } else {
        format!("{}.{}", prefix, path)
    }
}

/// Last path segment of a Rust type name, without generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Input type of a JSON-RPC method
pub trait Params: DeserializeOwned + JsonSchema + Send + 'static {
    /// Whether a request must carry `params` for this input.
    ///
    /// Only the no-input marker `()` answers `false`; its value is bound from `null`.
    const REQUIRED: bool = true;

    /// Declared constraints that the bound value violates, with paths relative to the value
    fn violations(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}

impl Params for () {
    const REQUIRED: bool = false;
}

macro_rules! primitive_params {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Params for $ty {}
        )*
    };
}

primitive_params!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, uuid::Uuid, Value,
);

impl<T: Params> Params for Vec<T> {
    fn violations(&self) -> Vec<FieldViolation> {
        self.iter()
            .enumerate()
            .flat_map(|(index, element)| {
                let prefix = format!("[{}]", index);
                element
                    .violations()
                    .into_iter()
                    .map(move |violation| violation.prefixed(&prefix))
            })
            .collect()
    }
}
