//! Convenience macros for declaring method input types.

/// Implement [`Params`](crate::Params) for types deriving `validator::Validate`.
///
/// Declared constraints are checked after binding and reported as
/// `Invalid method parameter(s)` with one entry per failed constraint.
///
/// ```rust
/// use ash_rpc_dispatch::validated_params;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate, JsonSchema)]
/// struct CreateUser {
///     #[validate(length(min = 1))]
///     name: String,
/// }
///
/// validated_params!(CreateUser);
/// ```
#[macro_export]
macro_rules! validated_params {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Params for $ty {
                fn violations(&self) -> ::std::vec::Vec<$crate::FieldViolation> {
                    $crate::validation::violations(self)
                }
            }
        )+
    };
}

/// Implement [`Params`](crate::Params) for input types without declared constraints.
///
/// ```rust
/// use ash_rpc_dispatch::plain_params;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Lookup {
///     key: String,
/// }
///
/// plain_params!(Lookup);
/// ```
#[macro_export]
macro_rules! plain_params {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Params for $ty {}
        )+
    };
}
