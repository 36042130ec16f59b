//! Per-request handler context.
//!
//! A [`Context`] is created for exactly one request, handed mutably to each handler of
//! the method's pipeline in turn, and consumed afterwards to recover the [`Response`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bind::{self, BindError, Validate};
use crate::error::{ContextError, RpcError};
use crate::request::Envelope;
use crate::response::Response;
use crate::result::{ResultError, ResultValue};
use crate::types::RequestId;

/// String-keyed store of typed values.
///
/// Values are shared behind `Arc`, so cloning a store to seed several requests is cheap
/// and never aliases mutable state.
#[derive(Clone, Default)]
pub struct Extensions {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Typed read. `None` when the key is missing or holds a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Mutable carrier handed to every handler of one request.
#[derive(Debug)]
pub struct Context {
    method: String,
    params: Option<Value>,
    values: Extensions,
    response: Response,
}

impl Context {
    pub(crate) fn new(envelope: Envelope, values: Extensions) -> Self {
        let Envelope { method, id, params } = envelope;
        Self {
            method,
            params,
            values,
            response: Response::new(id),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.response.id()
    }

    pub fn is_notification(&self) -> bool {
        self.response.id().is_none()
    }

    /// The raw `params` member. An explicit `"params": null` is returned as
    /// `Value::Null`; only a missing member is reported as absent.
    pub fn params(&self) -> Result<&Value, ContextError> {
        self.params.as_ref().ok_or(ContextError::ParamsAbsent)
    }

    /// Decode params into `T` without further checks.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        bind::bind_json(self.params.as_ref())
    }

    /// Decode params into `T` and run its [`Validate`] rules.
    pub fn bind<T: DeserializeOwned + Validate>(&self) -> Result<T, BindError> {
        bind::bind(self.params.as_ref())
    }

    /// Request-scoped scratch write; last write per key wins.
    pub fn set<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.values.insert(key, value);
    }

    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Extensions {
        &self.values
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        self.set_result(ResultValue::String(value.into()));
    }

    pub fn set_int(&mut self, value: i64) {
        self.set_result(ResultValue::Int(value));
    }

    pub fn set_float(&mut self, value: f64) {
        self.set_result(ResultValue::Float(value));
    }

    pub fn set_bool(&mut self, value: bool) {
        self.set_result(ResultValue::Bool(value));
    }

    /// Encode `value` as an array result. On failure the response is left untouched.
    pub fn set_array<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ResultError> {
        let result = ResultValue::array(value)?;
        self.set_result(result);
        Ok(())
    }

    /// Encode `value` as an object result. On failure the response is left untouched.
    pub fn set_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ResultError> {
        let result = ResultValue::object(value)?;
        self.set_result(result);
        Ok(())
    }

    pub fn set_result(&mut self, result: ResultValue) {
        self.response.set_result(result);
    }

    pub fn set_error(&mut self, error: impl Into<RpcError>) {
        self.response.set_error(error.into());
    }

    pub fn result(&self) -> Option<&ResultValue> {
        self.response.result()
    }

    pub fn error(&self) -> Option<&RpcError> {
        self.response.error_value()
    }

    pub fn has_error(&self) -> bool {
        self.response.is_error()
    }

    /// Same method and id with nothing else; stands in when the original context is
    /// lost to a timeout or a cancelled task.
    pub(crate) fn detached(&self) -> Self {
        Self {
            method: self.method.clone(),
            params: None,
            values: Extensions::new(),
            response: Response::new(self.response.id().cloned()),
        }
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ResultKind;
    use serde_json::json;

    fn context(params: Option<Value>) -> Context {
        let envelope = Envelope {
            method: "test".to_string(),
            id: Some(RequestId::Number(1)),
            params,
        };
        Context::new(envelope, Extensions::new())
    }

    #[test]
    fn test_params_absent() {
        let ctx = context(None);
        assert_eq!(ctx.params(), Err(ContextError::ParamsAbsent));
    }

    #[test]
    fn test_explicit_null_params_are_present() {
        let ctx = context(Some(Value::Null));
        assert_eq!(ctx.params(), Ok(&Value::Null));
    }

    #[test]
    fn test_scratch_store_is_typed() {
        let mut ctx = context(None);
        ctx.set("user", "alice".to_string());
        ctx.set("attempts", 3u32);
        ctx.set("attempts", 4u32);

        assert_eq!(ctx.value::<String>("user").map(String::as_str), Some("alice"));
        assert_eq!(ctx.value::<u32>("attempts"), Some(&4));
        assert_eq!(ctx.value::<i64>("attempts"), None);
        assert_eq!(ctx.value::<u32>("missing"), None);
    }

    #[test]
    fn test_last_setter_wins() {
        let mut ctx = context(None);
        ctx.set_int(7);
        ctx.set_string("seven");
        assert_eq!(ctx.result(), Some(&ResultValue::String("seven".into())));

        ctx.set_error(RpcError::invalid_params());
        assert!(ctx.has_error());
        assert!(ctx.result().is_none());

        ctx.set_bool(true);
        assert!(!ctx.has_error());
        assert_eq!(ctx.result(), Some(&ResultValue::Bool(true)));
    }

    #[test]
    fn test_failed_array_setter_keeps_previous_result() {
        let mut ctx = context(None);
        ctx.set_float(2.5);
        assert!(ctx.set_array(&json!({"a": 1})).is_err());
        assert_eq!(ctx.result().map(ResultValue::kind), Some(ResultKind::Float));
    }

    #[test]
    fn test_seeded_values_are_visible() {
        let mut seed = Extensions::new();
        seed.insert("tenant", "acme".to_string());
        let envelope = Envelope {
            method: "test".to_string(),
            id: None,
            params: None,
        };
        let ctx = Context::new(envelope, seed);

        assert!(ctx.is_notification());
        assert_eq!(ctx.value::<String>("tenant").map(String::as_str), Some("acme"));
    }
}
