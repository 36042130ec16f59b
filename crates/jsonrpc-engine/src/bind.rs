//! Params binding: decode the raw `params` value into a caller type and check it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::RpcError;

/// Declarative field checks run after decoding.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("request carried no params")]
    ParamsAbsent,

    #[error("params decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("params validation failed: {0}")]
    Validation(String),
}

impl From<BindError> for RpcError {
    fn from(err: BindError) -> Self {
        RpcError::invalid_params().with_data(Value::String(err.to_string()))
    }
}

pub fn bind_json<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, BindError> {
    let params = params.ok_or(BindError::ParamsAbsent)?;
    Ok(T::deserialize(params)?)
}

pub fn bind<T: DeserializeOwned + Validate>(params: Option<&Value>) -> Result<T, BindError> {
    let value: T = bind_json(params)?;
    value.validate().map_err(BindError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Transfer {
        from: String,
        amount: i64,
    }

    impl Validate for Transfer {
        fn validate(&self) -> Result<(), String> {
            if self.from.is_empty() {
                return Err("from must not be empty".to_string());
            }
            if self.amount <= 0 {
                return Err(format!("amount must be positive, got {}", self.amount));
            }
            Ok(())
        }
    }

    #[test]
    fn test_bind_valid() {
        let params = json!({"from": "alice", "amount": 10});
        let transfer: Transfer = bind(Some(&params)).unwrap();
        assert_eq!(transfer.from, "alice");
        assert_eq!(transfer.amount, 10);
    }

    #[test]
    fn test_bind_validation_failure() {
        let params = json!({"from": "alice", "amount": 0});
        let err = bind::<Transfer>(Some(&params)).unwrap_err();
        assert!(matches!(err, BindError::Validation(ref msg) if msg.contains("positive")));
    }

    #[test]
    fn test_bind_json_skips_validation() {
        let params = json!({"from": "", "amount": -1});
        let transfer: Transfer = bind_json(Some(&params)).unwrap();
        assert_eq!(transfer.amount, -1);
    }

    #[test]
    fn test_bind_decode_failure_maps_to_invalid_params() {
        let params = json!([1, 2]);
        let err = bind::<Transfer>(Some(&params)).unwrap_err();
        assert!(matches!(err, BindError::Decode(_)));

        let rpc: RpcError = err.into();
        assert_eq!(rpc.code(), -32602);
        assert!(rpc.data().is_some());
    }

    #[test]
    fn test_bind_absent_params() {
        assert!(matches!(
            bind_json::<Transfer>(None),
            Err(BindError::ParamsAbsent)
        ));
    }
}
