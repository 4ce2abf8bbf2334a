//! Core JSON-RPC 2.0 types and data structures.

use crate::params::FieldViolation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request identifier - can be string, number, or any other JSON value
pub type RequestId = serde_json::Value;

/// Protocol marker carried by every request and response
pub const JSONRPC_VERSION: &str = "2.0";

/// Identifier used for responses to requests whose own id could not be read
pub fn placeholder_id() -> RequestId {
    RequestId::from(1)
}

/// JSON-RPC 2.0 request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    pub jsonrpc: String,
}

impl Request {
    /// Create a new JSON-RPC request
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            id: None,
            method: method.into(),
            params: None,
            jsonrpc: JSONRPC_VERSION.to_string(),
        }
    }

    /// Add parameters to the request
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Add an ID to the request
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = Some(id);
        self
    }

    /// Check if this request expects a response
    pub fn expects_response(&self) -> bool {
        self.id.is_some()
    }

    /// Check if this is a notification (no response expected)
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&serde_json::Value> {
        self.params.as_ref()
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Envelope rule violations of an already decoded request
    pub fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if let Some(violation) = version_violation(&self.jsonrpc) {
            violations.push(violation);
        }
        if let Some(violation) = method_violation(&self.method) {
            violations.push(violation);
        }
        violations
    }

    /// Decode a request envelope from an arbitrary JSON value.
    ///
    /// All field errors are collected rather than stopping at the first one, and the
    /// request id is kept whenever it could be read so that the error response can
    /// still be correlated by the caller.
    pub fn from_value(value: Value) -> Result<Self, InvalidRequest> {
        let mut object = match value {
            Value::Object(object) => object,
            Value::Array(_) => {
                return Err(InvalidRequest::new(
                    None,
                    vec![FieldViolation::new("request", "batch requests are not supported")],
                ));
            }
            _ => {
                return Err(InvalidRequest::new(
                    None,
                    vec![FieldViolation::new("request", "must be a JSON object")],
                ));
            }
        };

        let id = object.remove("id").filter(|id| !id.is_null());
        let params = object.remove("params").filter(|params| !params.is_null());

        let mut violations = Vec::new();
        let jsonrpc = take_string(&mut object, "jsonrpc", &mut violations);
        let method = take_string(&mut object, "method", &mut violations);

        if let Some(jsonrpc) = &jsonrpc
            && let Some(violation) = version_violation(jsonrpc)
        {
            violations.push(violation);
        }
        if let Some(method) = &method
            && let Some(violation) = method_violation(method)
        {
            violations.push(violation);
        }

        match (jsonrpc, method) {
            (Some(jsonrpc), Some(method)) if violations.is_empty() => Ok(Self {
                id,
                method,
                params,
                jsonrpc,
            }),
            _ => Err(InvalidRequest::new(id, violations)),
        }
    }
}

fn take_string(
    object: &mut Map<String, Value>,
    field: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match object.remove(field) {
        None | Some(Value::Null) => {
            violations.push(FieldViolation::new(field, "must not be null"));
            None
        }
        Some(Value::String(value)) => Some(value),
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a string"));
            None
        }
    }
}

fn version_violation(jsonrpc: &str) -> Option<FieldViolation> {
    (jsonrpc != JSONRPC_VERSION).then(|| {
        FieldViolation::new("jsonrpc", format!("must match \"{}\"", JSONRPC_VERSION))
    })
}

fn method_violation(method: &str) -> Option<FieldViolation> {
    method
        .trim()
        .is_empty()
        .then(|| FieldViolation::new("method", "must not be blank"))
}

/// A structurally readable body that breaks the JSON-RPC envelope rules
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRequest {
    pub id: Option<RequestId>,
    pub violations: Vec<FieldViolation>,
}

impl InvalidRequest {
    pub fn new(id: Option<RequestId>, violations: Vec<FieldViolation>) -> Self {
        Self { id, violations }
    }

    /// Convert into the JSON-RPC error object reported to the caller
    pub fn to_error(&self) -> Error {
        Error::new(
            error_codes::INVALID_REQUEST,
            error_messages::INVALID_REQUEST,
        )
        .with_data(FieldViolation::render_all(&self.violations))
    }
}

impl std::fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "invalid request: {}", rendered.join(", "))
    }
}

impl std::error::Error for InvalidRequest {}

/// JSON-RPC 2.0 response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
    pub jsonrpc: String,
}

impl Response {
    /// Create a successful response
    pub fn success(result: serde_json::Value, id: RequestId) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            jsonrpc: JSONRPC_VERSION.to_string(),
        }
    }

    /// Create an error response
    pub fn error(error: Error, id: RequestId) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
            jsonrpc: JSONRPC_VERSION.to_string(),
        }
    }

    /// Check if this is a successful response
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    pub fn error_info(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn take_error(self) -> Option<Error> {
        self.error
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Error {
    /// Create a new error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Add additional data to the error
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Check if this is a parse error (-32700)
    pub fn is_parse_error(&self) -> bool {
        self.code == error_codes::PARSE_ERROR
    }

    /// Check if this is an invalid request error (-32600)
    pub fn is_invalid_request(&self) -> bool {
        self.code == error_codes::INVALID_REQUEST
    }

    /// Check if this is a method not found error (-32601)
    pub fn is_method_not_found(&self) -> bool {
        self.code == error_codes::METHOD_NOT_FOUND
    }

    pub fn is_invalid_params(&self) -> bool {
        self.code == error_codes::INVALID_PARAMS
    }

    pub fn is_internal_error(&self) -> bool {
        self.code == error_codes::INTERNAL_ERROR
    }

    /// Codes between -32768 and -32000 are reserved by the protocol
    pub fn is_reserved(&self) -> bool {
        (-32768..=-32000).contains(&self.code)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}

/// Reserved JSON-RPC 2.0 error codes.
///
/// # Example
/// ```rust
/// use ash_rpc_dispatch::{Error, error_codes};
///
/// let error = Error::new(error_codes::METHOD_NOT_FOUND, "Method not found");
/// assert!(error.is_method_not_found());
/// ```
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server.
    pub const PARSE_ERROR: i32 = -32700;

    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;

    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Messages paired with the reserved error codes
pub mod error_messages {
    pub const PARSE_ERROR: &str = "Parse error";
    pub const INVALID_REQUEST: &str = "Invalid request";
    pub const METHOD_NOT_FOUND: &str = "Method not found";
    pub const INVALID_PARAMS: &str = "Invalid method parameter(s)";
    pub const VALIDATION_FAILED: &str = "Request didn't pass validation";
    pub const UNHANDLED_EXCEPTION: &str = "Unhandled exception";
    /// Error data for a method that requires input but received none
    pub const MISSING_PARAMS: &str = "Params can't be null";
}
