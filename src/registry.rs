//! Method registry for organizing and dispatching JSON-RPC methods.
//!
//! Methods come from two kinds of sources:
//!
//! - **Services** implement [`JsonRpcService`] and list their methods explicitly. Each
//!   method is registered as `<serviceName>.<methodName>`, where the service name defaults
//!   to the lower-camel-case type name (`TestService` becomes `testService`).
//! - **Method objects** implement [`JsonRpcMethod`] and contribute exactly one method.
//!   The default name joins the last module segment and the type name without its
//!   `Method` suffix, so `crate::user::CreateMethod` becomes `user.create`.
//!
//! ```rust
//! use ash_rpc_dispatch::*;
//!
//! struct Calculator;
//!
//! impl JsonRpcService for Calculator {
//!     fn register(methods: &mut ServiceMethods<Self>) {
//!         methods
//!             .method("square", |_: &Calculator, value: i64| Ok::<_, MethodError>(value * value))
//!             .method_without_params("zero", |_: &Calculator| Ok::<_, MethodError>(0));
//!     }
//! }
//!
//! let registry = MethodRegistry::builder().service(Calculator).build();
//! assert!(registry.has_method("calculator.square"));
//! ```
//!
//! The registry is immutable once built and is shared read-only between requests.

use crate::exception::MethodError;
use crate::invoker::{Invocable, TypedHandle};
use crate::params::{Params, short_type_name};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name and documentation schema of a method's input or output type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    /// JSON Schema generated by `schemars`; nested types live under `$defs`
    pub schema: Value,
}

impl TypeDescriptor {
    pub fn of<T: JsonSchema>() -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
        Self {
            name: short_type_name::<T>().to_string(),
            schema,
        }
    }
}

/// Registered method: its names, types and invocation target
#[derive(Clone)]
pub struct MethodDescriptor {
    pub qualified_name: String,
    /// Owning service, or the namespace segment of a method object
    pub service_name: String,
    pub method_name: String,
    /// `None` when the method takes no input
    pub input: Option<TypeDescriptor>,
    /// `None` when the method has no result
    pub output: Option<TypeDescriptor>,
    target: Arc<dyn Invocable>,
}

impl MethodDescriptor {
    fn new<I, O>(
        service_name: impl Into<String>,
        method_name: impl Into<String>,
        qualified_name: String,
        target: Arc<dyn Invocable>,
    ) -> Self
    where
        I: Params,
        O: JsonSchema + 'static,
    {
        let input = I::REQUIRED.then(TypeDescriptor::of::<I>);
        let output = (TypeId::of::<O>() != TypeId::of::<()>()).then(TypeDescriptor::of::<O>);

        Self {
            qualified_name,
            service_name: service_name.into(),
            method_name: method_name.into(),
            input,
            output,
            target,
        }
    }

    pub fn requires_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn target(&self) -> &dyn Invocable {
        self.target.as_ref()
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("qualified_name", &self.qualified_name)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// A service exposing several JSON-RPC methods
pub trait JsonRpcService: Send + Sync + Sized + 'static {
    /// Explicit service name; defaults to the lower-camel-case type name
    fn service_name(&self) -> Option<String> {
        None
    }

    /// List the methods this service exposes
    fn register(methods: &mut ServiceMethods<Self>);
}

/// Collects the methods of one service during registration
pub struct ServiceMethods<S> {
    service: Arc<S>,
    service_name: String,
    entries: Vec<MethodDescriptor>,
}

impl<S: Send + Sync + 'static> ServiceMethods<S> {
    fn new(service: Arc<S>, service_name: String) -> Self {
        Self {
            service,
            service_name,
            entries: Vec::new(),
        }
    }

    /// Name the methods will be registered under
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Register a method taking one input value
    pub fn method<I, O, E, F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        I: Params,
        O: Serialize + JsonSchema + 'static,
        E: Into<MethodError>,
        F: Fn(&S, I) -> Result<O, E> + Send + Sync + 'static,
    {
        let service = Arc::clone(&self.service);
        let target = TypedHandle::new(move |input: I| handler(&*service, input).map_err(Into::into));
        let qualified_name = format!("{}.{}", self.service_name, name);

        self.entries.push(MethodDescriptor::new::<I, O>(
            self.service_name.clone(),
            name,
            qualified_name,
            Arc::new(target),
        ));
        self
    }

    /// Register a method taking no input
    pub fn method_without_params<O, E, F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        O: Serialize + JsonSchema + 'static,
        E: Into<MethodError>,
        F: Fn(&S) -> Result<O, E> + Send + Sync + 'static,
    {
        self.method(name, move |service: &S, _: ()| handler(service))
    }
}

/// A single-method object
pub trait JsonRpcMethod: Send + Sync + 'static {
    /// Use `()` for methods without input
    type Input: Params;
    /// Use `()` for methods without a result
    type Output: Serialize + JsonSchema + 'static;

    fn method_name(&self) -> String {
        method_object_name::<Self>()
    }

    fn invoke(&self, input: Self::Input) -> Result<Self::Output, MethodError>;
}

/// Builds a [`MethodRegistry`] at startup
#[derive(Default)]
pub struct RegistryBuilder {
    methods: BTreeMap<String, MethodDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every method listed by a service
    pub fn service<S: JsonRpcService>(self, service: S) -> Self {
        self.service_arc(Arc::new(service))
    }

    /// Register a service that is shared with other parts of the application
    pub fn service_arc<S: JsonRpcService>(mut self, service: Arc<S>) -> Self {
        let service_name = service
            .service_name()
            .unwrap_or_else(service_component_name::<S>);
        let mut methods = ServiceMethods::new(service, service_name);
        S::register(&mut methods);

        tracing::trace!(
            service = %methods.service_name,
            method_count = methods.entries.len(),
            "registering service"
        );
        for descriptor in methods.entries {
            self.insert(descriptor);
        }
        self
    }

    /// Register a method object
    pub fn method<M: JsonRpcMethod>(mut self, method: M) -> Self {
        let qualified_name = method.method_name();
        let (service_name, method_name) = match qualified_name.split_once('.') {
            Some((service, name)) => (service.to_string(), name.to_string()),
            None => (String::new(), qualified_name.clone()),
        };

        let method = Arc::new(method);
        let target = TypedHandle::new(move |input: M::Input| method.invoke(input));
        self.insert(MethodDescriptor::new::<M::Input, M::Output>(
            service_name,
            method_name,
            qualified_name,
            Arc::new(target),
        ));
        self
    }

    fn insert(&mut self, descriptor: MethodDescriptor) {
        if self.methods.contains_key(&descriptor.qualified_name) {
            tracing::warn!(
                method = %descriptor.qualified_name,
                "duplicate method name, keeping first registration"
            );
            return;
        }
        tracing::trace!(method = %descriptor.qualified_name, "adding method to registry");
        self.methods
            .insert(descriptor.qualified_name.clone(), descriptor);
    }

    pub fn build(self) -> MethodRegistry {
        tracing::debug!(method_count = self.methods.len(), "registry created");
        MethodRegistry {
            methods: self.methods,
        }
    }
}

/// Immutable mapping from qualified method name to method descriptor
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, MethodDescriptor>,
}

impl MethodRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn resolve(&self, qualified_name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(qualified_name)
    }

    /// Check if a method is registered
    pub fn has_method(&self, qualified_name: &str) -> bool {
        self.methods.contains_key(qualified_name)
    }

    /// Get list of all registered methods, sorted by name
    pub fn get_methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Get the number of registered methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values()
    }
}

/// Default service name: the type name in lower camel case
pub fn service_component_name<S: ?Sized>() -> String {
    decapitalize(short_type_name::<S>())
}

/// Default method-object name: `<namespace>.<name>` where `name` is the type name
/// without a `Method` suffix, in lower camel case
pub fn method_object_name<M: ?Sized>() -> String {
    let full = std::any::type_name::<M>();
    let path = full.split('<').next().unwrap_or(full);
    let mut segments = path.rsplit("::");
    let type_name = segments.next().unwrap_or(path);
    let stem = match type_name.strip_suffix("Method") {
        Some(stem) if !stem.is_empty() => stem,
        _ => type_name,
    };

    match segments.next() {
        Some(namespace) => format!("{}.{}", namespace, decapitalize(stem)),
        None => decapitalize(stem),
    }
}

/// Lower-case the first character, unless the name starts with two capitals (`URLs`)
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestService, method, test_registry};

    struct Renamed;

    impl JsonRpcService for Renamed {
        fn service_name(&self) -> Option<String> {
            Some("custom".to_string())
        }

        fn register(methods: &mut ServiceMethods<Self>) {
            methods.method_without_params("ping", |_: &Renamed| Ok::<_, MethodError>("pong"));
        }
    }

    struct Empty;

    impl JsonRpcService for Empty {
        fn register(_methods: &mut ServiceMethods<Self>) {}
    }

    struct Shadow;

    impl JsonRpcService for Shadow {
        fn service_name(&self) -> Option<String> {
            Some("testService".to_string())
        }

        fn register(methods: &mut ServiceMethods<Self>) {
            methods.method_without_params("call", |_: &Shadow| Ok::<_, MethodError>(0));
        }
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("TestService"), "testService");
        assert_eq!(decapitalize("URLService"), "URLService");
        assert_eq!(decapitalize("A"), "a");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_service_component_name() {
        assert_eq!(service_component_name::<TestService>(), "testService");
    }

    #[test]
    fn test_method_object_name() {
        assert_eq!(method_object_name::<method::TestMethod>(), "method.test");
        assert_eq!(
            method_object_name::<method::TestMethodWithoutResult>(),
            "method.testMethodWithoutResult"
        );
    }

    #[test]
    fn test_registry_counts_services_and_method_objects() {
        let registry = test_registry();
        let service_methods = registry
            .descriptors()
            .filter(|descriptor| descriptor.service_name == "testService")
            .count();
        let method_objects = registry
            .descriptors()
            .filter(|descriptor| descriptor.service_name == "method")
            .count();

        assert_eq!(service_methods, 12);
        assert_eq!(method_objects, 4);
        assert_eq!(registry.method_count(), 16);

        for name in [
            "process",
            "processAsync",
            "call",
            "get",
            "jsonRpcException",
            "exception",
            "list",
            "pageable",
            "pageableWrapper",
            "arrayProcess",
            "reThrowingException",
            "panicking",
        ] {
            let qualified_name = format!("testService.{}", name);
            assert!(registry.has_method(&qualified_name), "{}", qualified_name);
        }
        for name in [
            "method.test",
            "method.testMethodWithoutResult",
            "method.testMethodWithoutInput",
            "method.testMethodWithException",
        ] {
            assert!(registry.has_method(name), "{}", name);
        }
    }

    #[test]
    fn test_descriptor_schemas_follow_the_types() {
        let registry = test_registry();

        let call = registry.resolve("testService.call").unwrap();
        assert_eq!(call.output.as_ref().unwrap().schema["type"], "string");

        let list = registry.resolve("testService.list").unwrap();
        assert_eq!(list.input.as_ref().unwrap().schema["type"], "integer");
        assert_eq!(list.output.as_ref().unwrap().schema["type"], "array");
        assert_eq!(
            list.output.as_ref().unwrap().schema["items"]["type"],
            "string"
        );

        let process = registry.resolve("testService.process").unwrap();
        let input = &process.input.as_ref().unwrap().schema;
        assert_eq!(input["type"], "object");
        assert_eq!(input["properties"]["name"]["type"], "string");
        assert_eq!(input["required"], serde_json::json!(["name"]));
        let output = &process.output.as_ref().unwrap().schema;
        assert_eq!(output["properties"]["value"]["type"], "integer");
    }

    #[test]
    fn test_descriptor_types() {
        let registry = test_registry();

        let process = registry.resolve("testService.process").unwrap();
        assert!(process.requires_input());
        assert_eq!(process.input.as_ref().unwrap().name, "TestRequest");
        assert_eq!(process.output.as_ref().unwrap().name, "TestResponse");

        let call = registry.resolve("testService.call").unwrap();
        assert!(!call.requires_input());

        let without_result = registry.resolve("method.testMethodWithoutResult").unwrap();
        assert!(without_result.output.is_none());
    }

    #[test]
    fn test_explicit_service_name() {
        let registry = MethodRegistry::builder().service(Renamed).build();
        assert_eq!(registry.get_methods(), vec!["custom.ping".to_string()]);
    }

    #[test]
    fn test_service_without_methods_contributes_nothing() {
        let registry = MethodRegistry::builder().service(Empty).build();
        assert_eq!(registry.method_count(), 0);
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = MethodRegistry::builder()
            .service(TestService::default())
            .service(Shadow)
            .build();

        let call = registry.resolve("testService.call").unwrap();
        let outcome = crate::invoker::invoke(call.target(), call.target().bind(None).unwrap());
        assert_eq!(
            outcome.unwrap(),
            crate::invoker::Outcome::Value(serde_json::json!("called"))
        );
    }

    #[test]
    fn test_unknown_method() {
        let registry = test_registry();
        assert!(registry.resolve("testService.missing").is_none());
        assert!(!MethodRegistry::empty().has_method("testService.process"));
    }
}
