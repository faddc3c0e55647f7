//! Response envelope and contract checking.
//!
//! Every backend endpoint answers with:
//!
//! ```text
//! { "success": bool, "data"?: T, "error"?: { "code": string, "message": string } }
//! ```
//!
//! `success = true` forbids `error`; `success = false` requires an `error` with non-empty
//! `code` and `message`. Anything else is a [`ContractViolation`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Business error carried by a `success: false` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Uniform `{success, data, error}` wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// A response that parsed (or failed to parse) but does not match the envelope shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response with status {status} violates the envelope contract: {reason}")]
pub struct ContractViolation {
    pub status: u16,
    pub reason: String,
}

impl ContractViolation {
    fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

impl<T> ResponseEnvelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Business failure envelope.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError::new(code, message)),
        }
    }

    /// True for a well-formed `success: false` envelope.
    pub fn is_business_failure(&self) -> bool {
        !self.success
    }

    /// Error code of a business failure, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

impl<T: DeserializeOwned> ResponseEnvelope<T> {
    /// Decode a raw response body and enforce the envelope contract.
    ///
    /// `status` is only used to annotate violations.
    pub fn decode(status: u16, body: &[u8]) -> Result<Self, ContractViolation> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ContractViolation::new(status, format!("body is not JSON: {}", e)))?;

        let Value::Object(mut object) = value else {
            return Err(ContractViolation::new(status, "body is not a JSON object"));
        };

        let success = match object.get("success") {
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(ContractViolation::new(status, "`success` is not a boolean")),
            None => return Err(ContractViolation::new(status, "missing `success` field")),
        };

        let error = take_present(&mut object, "error");
        let error = match (success, error) {
            (true, None) => None,
            (true, Some(_)) => {
                return Err(ContractViolation::new(status, "`error` present on a successful response"))
            }
            (false, None) => {
                return Err(ContractViolation::new(status, "`error` missing on a failed response"))
            }
            (false, Some(raw)) => Some(decode_error(status, raw)?),
        };

        let data = match take_present(&mut object, "data") {
            Some(raw) => Some(serde_json::from_value::<T>(raw).map_err(|e| {
                ContractViolation::new(status, format!("`data` has unexpected shape: {}", e))
            })?),
            None => None,
        };

        Ok(Self { success, data, error })
    }
}

/// Remove `key` from the object, treating an explicit `null` as absent.
fn take_present(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match object.remove(key) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

fn decode_error(status: u16, raw: Value) -> Result<ApiError, ContractViolation> {
    let Value::Object(fields) = raw else {
        return Err(ContractViolation::new(status, "`error` is not an object"));
    };

    let field = |name: &str| -> Result<String, ContractViolation> {
        match fields.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::String(_)) => Err(ContractViolation::new(status, format!("`error.{}` is empty", name))),
            _ => Err(ContractViolation::new(status, format!("`error.{}` missing or not a string", name))),
        }
    };

    Ok(ApiError {
        code: field("code")?,
        message: field("message")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(body: Value) -> Result<ResponseEnvelope<Value>, ContractViolation> {
        ResponseEnvelope::decode(200, body.to_string().as_bytes())
    }

    #[test]
    fn test_success_with_data() {
        let env = decode(json!({"success": true, "data": {"id": 7}})).unwrap();
        assert!(env.success);
        assert_eq!(env.data, Some(json!({"id": 7})));
        assert!(env.error.is_none());
    }

    #[test]
    fn test_business_failure_is_not_a_violation() {
        let env = ResponseEnvelope::<Value>::decode(
            400,
            br#"{"success":false,"error":{"code":"VALIDATION","message":"bad input"}}"#,
        )
        .unwrap();
        assert!(env.is_business_failure());
        assert_eq!(env.error_code(), Some("VALIDATION"));
    }

    #[test]
    fn test_missing_success_is_violation() {
        let err = decode(json!({"ok": true})).unwrap_err();
        assert!(err.reason.contains("success"));
    }

    #[test]
    fn test_non_boolean_success_is_violation() {
        assert!(decode(json!({"success": "true"})).is_err());
        assert!(decode(json!({"success": 1})).is_err());
    }

    #[test]
    fn test_failure_requires_complete_error() {
        assert!(decode(json!({"success": false})).is_err());
        assert!(decode(json!({"success": false, "error": {"code": "X"}})).is_err());
        assert!(decode(json!({"success": false, "error": {"code": "", "message": "m"}})).is_err());
        assert!(decode(json!({"success": false, "error": "boom"})).is_err());
    }

    #[test]
    fn test_success_must_not_carry_error() {
        let err = decode(json!({"success": true, "error": {"code": "X", "message": "y"}})).unwrap_err();
        assert!(err.reason.contains("successful"));
        // explicit null counts as absent
        assert!(decode(json!({"success": true, "error": null})).is_ok());
    }

    #[test]
    fn test_non_json_and_non_object_bodies() {
        let err = ResponseEnvelope::<Value>::decode(502, b"<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.status, 502);
        assert!(decode(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_typed_data_mismatch_is_violation() {
        #[derive(Debug, Deserialize)]
        struct Booking {
            #[allow(dead_code)]
            id: u64,
        }
        let err = ResponseEnvelope::<Booking>::decode(200, br#"{"success":true,"data":{"id":"seven"}}"#)
            .unwrap_err();
        assert!(err.reason.contains("data"));
    }

    #[test]
    fn test_serializes_without_absent_fields() {
        let env = ResponseEnvelope::ok(json!({"a": 1}));
        let text = serde_json::to_string(&env).unwrap();
        assert_eq!(text, r#"{"success":true,"data":{"a":1}}"#);
    }
}
