//! Services, DTOs and method objects shared by the unit tests.

use crate::exception::{JsonRpcException, MethodError};
use crate::pageable::Pageable;
use crate::registry::{JsonRpcMethod, JsonRpcService, MethodRegistry, ServiceMethods};
use crate::{plain_params, validated_params};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct TestRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct ArrayTestRequest {
    #[validate(nested)]
    pub values: Vec<TestRequest>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PageableWrapper {
    pub pageable: Pageable,
}

validated_params!(TestRequest, ArrayTestRequest);
plain_params!(PageableWrapper);

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TestResponse {
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug)]
pub struct InvalidServiceState;

impl std::fmt::Display for InvalidServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid service state")
    }
}

impl std::error::Error for InvalidServiceState {}

#[derive(Debug, Default)]
pub struct TestService {
    pub calls: AtomicUsize,
}

impl TestService {
    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn process(&self, _request: TestRequest) -> Result<TestResponse, MethodError> {
        self.record();
        Ok(TestResponse { value: 1567 })
    }

    fn process_async(&self, _request: TestRequest) -> Result<(), MethodError> {
        self.record();
        Ok(())
    }

    fn call(&self) -> Result<String, MethodError> {
        self.record();
        Ok("called".to_string())
    }

    fn get(&self, id: Uuid) -> Result<TestUser, MethodError> {
        Ok(TestUser {
            id,
            name: "krupt".to_string(),
        })
    }

    fn json_rpc_exception(&self) -> Result<(), JsonRpcException> {
        Err(JsonRpcException::new(-29345, "Test state is incorrect")
            .with_data(json!({"userId": "krupt"})))
    }

    fn exception(&self) -> Result<(), InvalidServiceState> {
        Err(InvalidServiceState)
    }

    fn list(&self, count: i32) -> Result<Vec<String>, MethodError> {
        Ok((0..count).map(|index| format!("item-{}", index)).collect())
    }

    fn pageable(&self, pageable: Pageable) -> Result<Pageable, MethodError> {
        Ok(pageable)
    }

    fn pageable_wrapper(&self, wrapper: PageableWrapper) -> Result<Pageable, MethodError> {
        Ok(wrapper.pageable)
    }

    fn array_process(&self, request: ArrayTestRequest) -> Result<TestResponse, MethodError> {
        Ok(TestResponse {
            value: request.values.len() as i32,
        })
    }

    fn re_throwing_exception(&self) -> Result<(), InvalidServiceState> {
        Err(InvalidServiceState)
    }

    fn panicking(&self) -> Result<(), MethodError> {
        panic!("service panicked")
    }
}

impl JsonRpcService for TestService {
    fn register(methods: &mut ServiceMethods<Self>) {
        methods
            .method("process", TestService::process)
            .method("processAsync", TestService::process_async)
            .method_without_params("call", TestService::call)
            .method("get", TestService::get)
            .method_without_params("jsonRpcException", TestService::json_rpc_exception)
            .method_without_params("exception", TestService::exception)
            .method("list", TestService::list)
            .method("pageable", TestService::pageable)
            .method("pageableWrapper", TestService::pageable_wrapper)
            .method("arrayProcess", TestService::array_process)
            .method_without_params("reThrowingException", TestService::re_throwing_exception)
            .method_without_params("panicking", TestService::panicking);
    }
}

pub mod method {
    use super::*;

    pub struct TestMethod;

    impl JsonRpcMethod for TestMethod {
        type Input = TestRequest;
        type Output = TestResponse;

        fn invoke(&self, input: TestRequest) -> Result<TestResponse, MethodError> {
            Ok(TestResponse {
                value: input.name.len() as i32,
            })
        }
    }

    pub struct TestMethodWithoutResult;

    impl JsonRpcMethod for TestMethodWithoutResult {
        type Input = TestRequest;
        type Output = ();

        fn invoke(&self, _input: TestRequest) -> Result<(), MethodError> {
            Ok(())
        }
    }

    pub struct TestMethodWithoutInput;

    impl JsonRpcMethod for TestMethodWithoutInput {
        type Input = ();
        type Output = String;

        fn invoke(&self, _input: ()) -> Result<String, MethodError> {
            Ok("no input".to_string())
        }
    }

    pub struct TestMethodWithException;

    impl JsonRpcMethod for TestMethodWithException {
        type Input = String;
        type Output = ();

        fn invoke(&self, _input: String) -> Result<(), MethodError> {
            Err(InvalidServiceState.into())
        }
    }
}

pub fn test_registry() -> MethodRegistry {
    MethodRegistry::builder()
        .service(TestService::default())
        .method(method::TestMethod)
        .method(method::TestMethodWithoutResult)
        .method(method::TestMethodWithoutInput)
        .method(method::TestMethodWithException)
        .build()
}

/// Run `f` with a subscriber that records every event, returning the rendered log
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || LogWriter(Arc::clone(&writer)))
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (result, logs)
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
