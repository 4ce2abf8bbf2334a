//! # ash-rpc-dispatch
//!
//! JSON-RPC 2.0 method dispatch with typed parameters, served over HTTP.
//!
//! ## Features
//!
//! - **Method registry** - Services and single-method objects registered once at startup
//! - **Typed parameters** - Params bound with full field paths in error reports (`params.values[1].name`)
//! - **Validation** - Declared `validator` constraints checked before the method runs
//! - **Error translation** - Protocol errors pass through, anything else becomes `Unhandled exception`
//!   unless a custom handler rewrites or escalates it
//! - **Axum transport** - Single POST endpoint plus OpenAPI documentation with `schemars` schemas
//!
//! ## Quick Start
//!
//! ```rust
//! use ash_rpc_dispatch::*;
//! use schemars::JsonSchema;
//! use serde::{Deserialize, Serialize};
//! use validator::Validate;
//!
//! #[derive(Deserialize, Validate, JsonSchema)]
//! struct Greeting {
//!     #[validate(length(min = 1))]
//!     name: String,
//! }
//!
//! validated_params!(Greeting);
//!
//! #[derive(Serialize, JsonSchema)]
//! struct Reply {
//!     message: String,
//! }
//!
//! struct GreeterService;
//!
//! impl GreeterService {
//!     fn greet(&self, greeting: Greeting) -> Result<Reply, MethodError> {
//!         Ok(Reply { message: format!("hello {}", greeting.name) })
//!     }
//! }
//!
//! impl JsonRpcService for GreeterService {
//!     fn register(methods: &mut ServiceMethods<Self>) {
//!         methods.method("greet", GreeterService::greet);
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new(MethodRegistry::builder().service(GreeterService).build());
//! let response = dispatcher
//!     .handle_body(br#"{"id":1,"method":"greeterService.greet","params":{"name":"krupt"},"jsonrpc":"2.0"}"#)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(response.result().unwrap()["message"], "hello krupt");
//! ```

// Core module declarations
pub mod binder;
pub mod config;
pub mod dispatcher;
pub mod docs;
pub mod exception;
pub mod invoker;
pub mod macros;
pub mod pageable;
pub mod params;
pub mod registry;
pub mod translator;
pub mod types;
pub mod validation;

pub mod transports;

#[cfg(test)]
mod test_support;

// Re-export all core types
pub use types::*;

pub use config::{DocsConfig, JsonRpcConfig};
pub use dispatcher::Dispatcher;
pub use docs::ApiDocumentation;
pub use exception::{Escalation, JsonRpcException, MethodError, OpaqueError};
pub use pageable::{Direction, Pageable, SortOrder};
pub use params::{FieldViolation, Params};
pub use registry::{
    JsonRpcMethod, JsonRpcService, MethodDescriptor, MethodRegistry, RegistryBuilder,
    ServiceMethods,
};
pub use translator::{ErrorTranslator, NonProtocolErrorHandler, UnhandledErrorHandler};

#[cfg(feature = "axum")]
pub use transports::axum;

#[cfg(feature = "axum")]
pub use transports::{JsonRpcRouter, JsonRpcRouterBuilder};

// Re-export validator and schemars for input and output derives
pub use schemars;
pub use validator;
