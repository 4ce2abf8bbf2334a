//! Mapping of method failures to JSON-RPC error objects.

use crate::exception::{Escalation, MethodError, OpaqueError};
use crate::types::{Error, error_codes, error_messages};
use std::sync::Arc;

/// Handles failures that are not protocol errors.
///
/// Returning `Err` escalates the failure past the JSON-RPC layer; the transport then
/// answers with the escalation's HTTP status instead of a JSON-RPC response.
pub trait NonProtocolErrorHandler: Send + Sync {
    fn handle(&self, error: OpaqueError) -> Result<Error, Escalation>;
}

impl<F> NonProtocolErrorHandler for F
where
    F: Fn(OpaqueError) -> Result<Error, Escalation> + Send + Sync,
{
    fn handle(&self, error: OpaqueError) -> Result<Error, Escalation> {
        self(error)
    }
}

/// Default handler: logs the failure and reports it as an internal error
#[derive(Debug, Default, Clone, Copy)]
pub struct UnhandledErrorHandler;

impl NonProtocolErrorHandler for UnhandledErrorHandler {
    fn handle(&self, error: OpaqueError) -> Result<Error, Escalation> {
        let summary = error.summary();
        tracing::error!(
            error = %summary,
            error_debug = ?error.source_ref(),
            "unhandled exception in json-rpc method"
        );
        Ok(
            Error::new(error_codes::INTERNAL_ERROR, error_messages::UNHANDLED_EXCEPTION)
                .with_data(serde_json::Value::String(summary)),
        )
    }
}

/// Translates [`MethodError`]s into JSON-RPC errors
#[derive(Clone)]
pub struct ErrorTranslator {
    handler: Arc<dyn NonProtocolErrorHandler>,
}

impl ErrorTranslator {
    pub fn new() -> Self {
        Self {
            handler: Arc::new(UnhandledErrorHandler),
        }
    }

    /// Replace the handler used for non-protocol failures
    pub fn with_handler<H: NonProtocolErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    pub fn translate(&self, error: MethodError) -> Result<Error, Escalation> {
        match error {
            MethodError::Protocol(exception) => {
                tracing::debug!(code = exception.code, message = %exception.message, "method raised protocol error");
                Ok(exception.into_error())
            }
            MethodError::Opaque(error) => self.handler.handle(error),
        }
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorTranslator").finish_non_exhaustive()
    }
}
