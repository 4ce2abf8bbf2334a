//! Request dispatch: resolve, bind, validate, invoke, respond.
//!
//! Every stage short-circuits on the first failure, in this order:
//!
//! 1. unknown method: `Method not found`
//! 2. input required but `params` absent: `Invalid method parameter(s)` / `Params can't be null`
//! 3. params do not fit the input type: `Invalid method parameter(s)` with the offending path
//! 4. declared constraints violated: `Request didn't pass validation` with one entry per field
//! 5. method failure: mapped by the [`ErrorTranslator`]
//!
//! Requests without an id are notifications and never produce a response, whatever the
//! outcome. Envelope failures detected before the method runs are the only exception:
//! they are answered with the request id if it could be read, or the placeholder id.

use crate::exception::Escalation;
use crate::invoker;
use crate::params::FieldViolation;
use crate::registry::MethodRegistry;
use crate::translator::ErrorTranslator;
use crate::types::*;
use serde_json::Value;
use std::sync::Arc;

/// JSON-RPC dispatcher over a shared, read-only method registry
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    translator: ErrorTranslator,
}

impl Dispatcher {
    pub fn new(registry: impl Into<Arc<MethodRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            translator: ErrorTranslator::default(),
        }
    }

    /// Use a custom translator for method failures
    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }

    /// Handle a raw HTTP body.
    ///
    /// Returns `Ok(None)` when no response body must be sent. `Err` only carries an
    /// escalation raised by the non-protocol error handler.
    pub fn handle_body(&self, body: &[u8]) -> Result<Option<Response>, Escalation> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle_value(value),
            Err(error) => {
                tracing::debug!(error = %error, "failed to parse request body");
                Ok(Some(parse_error_response()))
            }
        }
    }

    /// Handle an already parsed JSON body
    pub fn handle_value(&self, value: Value) -> Result<Option<Response>, Escalation> {
        match Request::from_value(value) {
            Ok(request) => self.dispatch(request),
            Err(invalid) => {
                tracing::debug!(error = %invalid, "invalid request envelope");
                Ok(Some(invalid_request_response(&invalid)))
            }
        }
    }

    /// Dispatch a decoded request
    pub fn dispatch(&self, request: Request) -> Result<Option<Response>, Escalation> {
        let violations = request.violations();
        if !violations.is_empty() {
            let invalid = InvalidRequest::new(request.id, violations);
            tracing::debug!(error = %invalid, "invalid request envelope");
            return Ok(Some(invalid_request_response(&invalid)));
        }

        let span = tracing::debug_span!(
            "jsonrpc.dispatch",
            method = %request.method,
            correlation_id = %uuid::Uuid::new_v4()
        );
        let _enter = span.enter();

        let Request {
            id, method, params, ..
        } = request;
        let outcome = self.execute(&method, params)?;

        match id {
            Some(id) => Ok(Some(match outcome {
                Ok(result) => Response::success(result, id),
                Err(error) => Response::error(error, id),
            })),
            None => {
                tracing::trace!(success = outcome.is_ok(), "notification handled");
                Ok(None)
            }
        }
    }

    fn execute(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Result<Value, Error>, Escalation> {
        let Some(descriptor) = self.registry.resolve(method) else {
            tracing::warn!(method = %method, "method not found");
            return Ok(Err(Error::new(
                error_codes::METHOD_NOT_FOUND,
                error_messages::METHOD_NOT_FOUND,
            )));
        };

        if descriptor.requires_input() && params.is_none() {
            tracing::debug!("params missing");
            return Ok(Err(invalid_params(Value::String(
                error_messages::MISSING_PARAMS.to_string(),
            ))));
        }

        let target = descriptor.target();
        let bound = match target.bind(params) {
            Ok(bound) => bound,
            Err(failure) => {
                tracing::debug!(error = %failure, "failed to bind params");
                return Ok(Err(invalid_params(Value::String(failure.to_string()))));
            }
        };

        let violations: Vec<FieldViolation> = target
            .validate(&bound)
            .into_iter()
            .map(|violation| violation.prefixed(crate::binder::PARAMS_ROOT))
            .collect();
        if !violations.is_empty() {
            tracing::debug!(violation_count = violations.len(), "params failed validation");
            return Ok(Err(Error::new(
                error_codes::INVALID_PARAMS,
                error_messages::VALIDATION_FAILED,
            )
            .with_data(FieldViolation::render_all(&violations))));
        }

        tracing::debug!("calling method");
        match invoker::invoke(target, bound) {
            Ok(outcome) => Ok(Ok(outcome.into_value())),
            Err(error) => self.translator.translate(error).map(Err),
        }
    }
}

fn invalid_params(data: Value) -> Error {
    Error::new(error_codes::INVALID_PARAMS, error_messages::INVALID_PARAMS).with_data(data)
}

/// Response for a body that is not valid JSON
pub fn parse_error_response() -> Response {
    Response::error(
        Error::new(error_codes::PARSE_ERROR, error_messages::PARSE_ERROR),
        placeholder_id(),
    )
}

/// Response for a body that breaks the envelope rules
pub fn invalid_request_response(invalid: &InvalidRequest) -> Response {
    Response::error(
        invalid.to_error(),
        invalid.id.clone().unwrap_or_else(placeholder_id),
    )
}
