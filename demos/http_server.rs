//! User directory served over HTTP.
//!
//! ```text
//! curl -s localhost:3001/rpc -H 'content-type: application/json' \
//!   -d '{"id":1,"method":"userService.create","params":{"name":"krupt"},"jsonrpc":"2.0"}'
//! curl -s localhost:3001/v2/api-docs
//! ```

#[cfg(feature = "axum")]
mod example {
    use ash_rpc_dispatch::{
        Dispatcher, ErrorTranslator, Escalation, JsonRpcConfig, JsonRpcException, JsonRpcMethod,
        JsonRpcRouter, JsonRpcService, MethodError, MethodRegistry, OpaqueError, Pageable,
        ServiceMethods, error_codes, error_messages, plain_params, validated_params,
    };
    use axum::Router;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::{Arc, RwLock};
    use uuid::Uuid;
    use validator::Validate;

    #[derive(Deserialize, Validate, JsonSchema)]
    struct CreateUser {
        #[validate(length(min = 1, max = 64))]
        name: String,
        #[validate(email)]
        email: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Rename {
        id: Uuid,
        name: String,
    }

    validated_params!(CreateUser);
    plain_params!(Rename);

    #[derive(Clone, Serialize, JsonSchema)]
    struct User {
        id: Uuid,
        name: String,
        email: Option<String>,
    }

    #[derive(Debug)]
    struct StorePoisoned;

    impl std::fmt::Display for StorePoisoned {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "user store lock poisoned")
        }
    }

    impl std::error::Error for StorePoisoned {}

    #[derive(Debug)]
    struct ReadOnly;

    impl std::fmt::Display for ReadOnly {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "directory is read-only")
        }
    }

    impl std::error::Error for ReadOnly {}

    #[derive(Default)]
    struct UserService {
        users: RwLock<BTreeMap<Uuid, User>>,
    }

    fn not_found(id: Uuid) -> JsonRpcException {
        JsonRpcException::new(-32001, "User not found").with_data(json!({"userId": id}))
    }

    impl UserService {
        fn create(&self, request: CreateUser) -> Result<User, MethodError> {
            let user = User {
                id: Uuid::new_v4(),
                name: request.name,
                email: request.email,
            };
            self.users
                .write()
                .map_err(|_| StorePoisoned)?
                .insert(user.id, user.clone());
            Ok(user)
        }

        fn get(&self, id: Uuid) -> Result<User, MethodError> {
            let users = self.users.read().map_err(|_| StorePoisoned)?;
            users.get(&id).cloned().ok_or_else(|| not_found(id).into())
        }

        fn rename(&self, request: Rename) -> Result<(), MethodError> {
            let mut users = self.users.write().map_err(|_| StorePoisoned)?;
            let user = users.get_mut(&request.id).ok_or_else(|| not_found(request.id))?;
            user.name = request.name;
            Ok(())
        }

        fn list(&self, pageable: Pageable) -> Result<Vec<User>, MethodError> {
            let users = self.users.read().map_err(|_| StorePoisoned)?;
            Ok(users
                .values()
                .skip(pageable.offset() as usize)
                .take(pageable.size as usize)
                .cloned()
                .collect())
        }

        fn count(&self) -> Result<usize, MethodError> {
            Ok(self.users.read().map_err(|_| StorePoisoned)?.len())
        }
    }

    impl JsonRpcService for UserService {
        fn register(methods: &mut ServiceMethods<Self>) {
            methods
                .method("create", UserService::create)
                .method("get", UserService::get)
                .method("rename", UserService::rename)
                .method("list", UserService::list)
                .method_without_params("count", UserService::count);
        }
    }

    mod admin {
        use super::*;

        pub struct PurgeMethod;

        impl JsonRpcMethod for PurgeMethod {
            type Input = ();
            type Output = ();

            fn invoke(&self, _input: ()) -> Result<(), MethodError> {
                Err(ReadOnly.into())
            }
        }
    }

    pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
        let registry = MethodRegistry::builder()
            .service(UserService::default())
            .method(admin::PurgeMethod)
            .build();

        let translator = ErrorTranslator::new().with_handler(
            |error: OpaqueError| -> Result<ash_rpc_dispatch::Error, Escalation> {
                if error.is::<ReadOnly>() {
                    return Err(Escalation::new(error).with_status(403));
                }
                tracing::error!(error = %error.summary(), "request failed");
                Ok(ash_rpc_dispatch::Error::new(
                    error_codes::INTERNAL_ERROR,
                    error_messages::UNHANDLED_EXCEPTION,
                ))
            },
        );

        let rpc = JsonRpcRouter::builder()
            .dispatcher(Dispatcher::new(Arc::new(registry)).with_translator(translator))
            .config(JsonRpcConfig::new().with_path("/rpc"))
            .build()?;

        let app = Router::new().merge(rpc.into_router());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
        tracing::info!("json-rpc server listening on http://127.0.0.1:3001/rpc");

        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[cfg(feature = "axum")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,ash_rpc_dispatch=debug")),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(example::run_server())
        .unwrap();
}

#[cfg(not(feature = "axum"))]
fn main() {
    println!("This example requires the 'axum' feature to be enabled.");
    println!("Run with: cargo run --example http_server --features axum");
}
