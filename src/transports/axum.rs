//! Axum HTTP transport for JSON-RPC servers.
//!
//! Mounts a single POST dispatch endpoint at the configured base path and, when
//! enabled, a GET endpoint serving the generated OpenAPI document.
//!
//! JSON-RPC level failures are answered with HTTP 200 and an `error` member; the HTTP
//! status only changes when the error handler escalates a failure.

use crate::config::JsonRpcConfig;
use crate::dispatcher::Dispatcher;
use crate::docs::ApiDocumentation;
use crate::exception::Escalation;
use crate::registry::MethodRegistry;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response as HttpResponse},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;

pub struct JsonRpcRouterBuilder {
    dispatcher: Option<Dispatcher>,
    config: JsonRpcConfig,
}

impl JsonRpcRouterBuilder {
    pub fn new() -> Self {
        Self {
            dispatcher: None,
            config: JsonRpcConfig::default(),
        }
    }

    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Use a dispatcher with the default error translator
    pub fn registry(self, registry: impl Into<Arc<MethodRegistry>>) -> Self {
        self.dispatcher(Dispatcher::new(registry))
    }

    pub fn config(mut self, config: JsonRpcConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<JsonRpcRouter, std::io::Error> {
        let dispatcher = self.dispatcher.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Dispatcher not set")
        })?;

        Ok(JsonRpcRouter {
            dispatcher: Arc::new(dispatcher),
            config: self.config,
        })
    }
}

impl Default for JsonRpcRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct JsonRpcRouter {
    dispatcher: Arc<Dispatcher>,
    config: JsonRpcConfig,
}

impl JsonRpcRouter {
    pub fn builder() -> JsonRpcRouterBuilder {
        JsonRpcRouterBuilder::new()
    }

    pub fn into_router(self) -> Router {
        let endpoint = self.config.endpoint_path();
        tracing::debug!(path = %endpoint, "mounting json-rpc endpoint");

        let mut router = Router::new()
            .route(&endpoint, post(handle_rpc))
            .with_state(Arc::clone(&self.dispatcher));

        if self.config.docs.enabled {
            let document = ApiDocumentation::generate(self.dispatcher.registry(), &self.config);
            let docs_route = self.config.docs.route();
            tracing::debug!(path = %docs_route, "mounting api documentation");
            router = router.merge(
                Router::new()
                    .route(&docs_route, get(serve_docs))
                    .with_state(Arc::new(document)),
            );
        }

        let body_limit = match self.config.max_request_size {
            0 => DefaultBodyLimit::disable(),
            limit => DefaultBodyLimit::max(limit),
        };
        router.layer(body_limit)
    }
}

/// Router with the default configuration for `registry`
pub fn create_rpc_router(registry: MethodRegistry) -> Router {
    JsonRpcRouter {
        dispatcher: Arc::new(Dispatcher::new(registry)),
        config: JsonRpcConfig::default(),
    }
    .into_router()
}

async fn handle_rpc(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> HttpResponse {
    // Methods are synchronous and may block.
    let outcome = tokio::task::spawn_blocking(move || dispatcher.handle_body(&body)).await;

    match outcome {
        Ok(Ok(Some(response))) => Json(response).into_response(),
        Ok(Ok(None)) => StatusCode::OK.into_response(),
        Ok(Err(escalation)) => escalation_response(escalation),
        Err(error) => {
            tracing::error!(error = %error, "json-rpc dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn escalation_response(escalation: Escalation) -> HttpResponse {
    let status =
        StatusCode::from_u16(escalation.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::warn!(
        status = status.as_u16(),
        error = %escalation.error().summary(),
        "json-rpc error escalated to transport"
    );

    let body = json!({
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or_default(),
        "message": escalation.error().to_string(),
    });
    (status, Json(body)).into_response()
}

async fn serve_docs(State(document): State<Arc<ApiDocumentation>>) -> Json<ApiDocumentation> {
    Json(document.as_ref().clone())
}
