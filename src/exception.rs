//! Errors raised by method implementations.
//!
//! A method fails with a [`MethodError`]: either a protocol error carrying its own
//! code, message and data ([`JsonRpcException`]), or anything else ([`OpaqueError`]),
//! which the error translator maps to a JSON-RPC error or escalates.

use crate::types::Error;
use serde_json::Value;
use std::any::Any;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Protocol error raised by a method; reported to the caller as-is
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcException {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl JsonRpcException {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn into_error(self) -> Error {
        Error {
            code: self.code,
            message: self.message,
            data: self.data,
        }
    }
}

impl std::fmt::Display for JsonRpcException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "JsonRpcError with code={}, message={}",
            self.code, self.message
        )?;
        if let Some(data) = &self.data {
            write!(f, " and data={}", data)?;
        }
        Ok(())
    }
}

impl std::error::Error for JsonRpcException {}

impl From<JsonRpcException> for Error {
    fn from(exception: JsonRpcException) -> Self {
        exception.into_error()
    }
}

/// Any failure that is not a protocol error
#[derive(Debug)]
pub struct OpaqueError {
    type_name: &'static str,
    source: BoxError,
}

impl OpaqueError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            type_name: crate::params::short_type_name::<E>(),
            source: Box::new(error),
        }
    }

    fn from_boxed(type_name: &'static str, source: BoxError) -> Self {
        Self { type_name, source }
    }

    /// Wrap a panic payload caught while invoking a method
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "method panicked".to_string()
        };
        Self::from_boxed("panic", message.into())
    }

    /// Short name of the underlying error type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `<type>: <message>`, used as error data for unhandled failures
    pub fn summary(&self) -> String {
        format!("{}: {}", self.type_name, self.source)
    }

    pub fn source_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref().downcast_ref::<E>()
    }

    pub fn is<E: std::error::Error + 'static>(&self) -> bool {
        self.source.as_ref().is::<E>()
    }
}

impl std::fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for OpaqueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Failure of a method invocation
#[derive(Debug)]
pub enum MethodError {
    Protocol(JsonRpcException),
    Opaque(OpaqueError),
}

impl MethodError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, MethodError::Protocol(_))
    }
}

impl std::fmt::Display for MethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodError::Protocol(exception) => write!(f, "{}", exception),
            MethodError::Opaque(error) => write!(f, "{}", error.summary()),
        }
    }
}

// No std::error::Error impl for MethodError: it would overlap with `From<T> for T`.
impl<E> From<E> for MethodError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let type_name = crate::params::short_type_name::<E>();
        let boxed: BoxError = Box::new(error);
        match boxed.downcast::<JsonRpcException>() {
            Ok(exception) => MethodError::Protocol(*exception),
            Err(boxed) => match boxed.downcast::<OpaqueError>() {
                Ok(opaque) => MethodError::Opaque(*opaque),
                Err(boxed) => MethodError::Opaque(OpaqueError::from_boxed(type_name, boxed)),
            },
        }
    }
}

/// Failure that must not be rendered as a JSON-RPC response.
///
/// Produced by a non-protocol error handler that re-raises; the transport reports it
/// with the carried HTTP status instead.
#[derive(Debug)]
pub struct Escalation {
    status: u16,
    error: OpaqueError,
}

impl Escalation {
    pub fn new(error: OpaqueError) -> Self {
        Self { status: 500, error }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn error(&self) -> &OpaqueError {
        &self.error
    }

    pub fn into_error(self) -> OpaqueError {
        self.error
    }
}

impl std::fmt::Display for Escalation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "escalated ({}): {}", self.status, self.error.summary())
    }
}

impl std::error::Error for Escalation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
