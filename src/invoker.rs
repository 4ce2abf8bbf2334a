//! Type-erased method targets and the invocation step.
//!
//! Registration captures a typed handler together with its input and output types.
//! The dispatcher only sees [`Invocable`], which binds, validates and calls through a
//! boxed input value.

use crate::binder::{self, BindingFailure};
use crate::exception::{MethodError, OpaqueError};
use crate::params::{FieldViolation, Params};
use serde::Serialize;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Bound method input, owned by the dispatcher between binding and invocation
pub struct BoundParams(Box<dyn Any + Send>);

impl BoundParams {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    fn downcast<T: Any>(self) -> Option<T> {
        self.0.downcast::<T>().ok().map(|value| *value)
    }

    fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for BoundParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoundParams(..)")
    }
}

/// Result of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The method produced a value
    Value(Value),
    /// The method declares no result
    NoValue,
}

impl Outcome {
    /// JSON rendering of the result; methods without a result render as `null`
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Value(value) => value,
            Outcome::NoValue => Value::Null,
        }
    }
}

/// Type-erased method target
pub trait Invocable: Send + Sync {
    fn bind(&self, raw: Option<Value>) -> Result<BoundParams, BindingFailure>;

    fn validate(&self, params: &BoundParams) -> Vec<FieldViolation>;

    fn call(&self, params: BoundParams) -> Result<Outcome, MethodError>;
}

/// Typed handler behind an [`Invocable`]
pub struct TypedHandle<I, O, F> {
    handler: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, F> TypedHandle<I, O, F>
where
    I: Params,
    O: Serialize + 'static,
    F: Fn(I) -> Result<O, MethodError> + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _types: PhantomData,
        }
    }
}

fn wrong_input_type<I>() -> MethodError {
    MethodError::Opaque(OpaqueError::new(WrongInputType(
        crate::params::short_type_name::<I>(),
    )))
}

impl<I, O, F> Invocable for TypedHandle<I, O, F>
where
    I: Params,
    O: Serialize + 'static,
    F: Fn(I) -> Result<O, MethodError> + Send + Sync + 'static,
{
    fn bind(&self, raw: Option<Value>) -> Result<BoundParams, BindingFailure> {
        binder::bind::<I>(raw).map(BoundParams::new)
    }

    fn validate(&self, params: &BoundParams) -> Vec<FieldViolation> {
        params
            .downcast_ref::<I>()
            .map(<I as Params>::violations)
            .unwrap_or_default()
    }

    fn call(&self, params: BoundParams) -> Result<Outcome, MethodError> {
        let input = params.downcast::<I>().ok_or_else(wrong_input_type::<I>)?;
        let output = (self.handler)(input)?;

        if TypeId::of::<O>() == TypeId::of::<()>() {
            return Ok(Outcome::NoValue);
        }
        Ok(Outcome::Value(serde_json::to_value(output)?))
    }
}

/// Bound params of another method were passed to a target
#[derive(Debug)]
struct WrongInputType(&'static str);

impl std::fmt::Display for WrongInputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bound params are not of type {}", self.0)
    }
}

impl std::error::Error for WrongInputType {}

/// Call a target with already bound and validated params.
///
/// A panic inside the method is caught and reported as a non-protocol failure.
pub fn invoke(target: &dyn Invocable, params: BoundParams) -> Result<Outcome, MethodError> {
    match catch_unwind(AssertUnwindSafe(|| target.call(params))) {
        Ok(result) => result,
        Err(payload) => {
            let error = OpaqueError::from_panic(payload);
            tracing::debug!(error = %error, "method panicked");
            Err(MethodError::Opaque(error))
        }
    }
}
