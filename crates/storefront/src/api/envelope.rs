//! Response envelope decoding.
//!
//! The PHP controllers answer either with a wrapper object
//! `{ "success": bool?, "message": string?, "data": T }` or with a bare `T`.
//! Both shapes are decoded explicitly here; anything else is a typed
//! [`ApiError::Decode`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// The two response shapes the backend produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{ "data": ..., "success"?: bool, "message"?: string }`
    Wrapped {
        data: Value,
        success: Option<bool>,
        message: Option<String>,
    },
    /// Anything that is not a wrapper object.
    Bare(Value),
}

impl Envelope {
    /// Parse response text into one of the envelope shapes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the text is not JSON, and
    /// `ApiError::Rejected` if the wrapper reports `success: false`.
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_str(text).map_err(ApiError::Decode)?;

        let Value::Object(mut map) = value else {
            return Ok(Self::Bare(value));
        };

        let success = map.get("success").and_then(Value::as_bool);
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        if success == Some(false) {
            return Err(ApiError::Rejected(
                message.unwrap_or_else(|| "request rejected by server".to_string()),
            ));
        }

        match map.remove("data") {
            Some(data) => Ok(Self::Wrapped {
                data,
                success,
                message,
            }),
            // `{ "success": true }` acknowledges without a payload.
            None if success.is_some() => Ok(Self::Wrapped {
                data: Value::Null,
                success,
                message,
            }),
            None => Ok(Self::Bare(Value::Object(map))),
        }
    }

    /// The payload, whichever shape carried it.
    #[must_use]
    pub fn into_payload(self) -> Value {
        match self {
            Self::Wrapped { data, .. } | Self::Bare(data) => data,
        }
    }

    /// Decode the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.into_payload()).map_err(ApiError::Decode)
    }
}

/// Parse and decode in one step.
///
/// # Errors
///
/// See [`Envelope::parse`] and [`Envelope::decode`].
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    Envelope::parse(text)?.decode()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_payload() {
        let items: Vec<i32> = decode(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_bare_array() {
        let items: Vec<i32> = decode("[3,4]").unwrap();
        assert_eq!(items, vec![3, 4]);
    }

    #[test]
    fn test_bare_object_without_data_key() {
        let value: serde_json::Map<String, Value> = decode(r#"{"id":1,"name":"x"}"#).unwrap();
        assert_eq!(value.get("id"), Some(&Value::from(1)));
    }

    #[test]
    fn test_acknowledgement_has_null_payload() {
        let envelope = Envelope::parse(r#"{"success":true,"message":"Updated"}"#).unwrap();
        assert_eq!(envelope.into_payload(), Value::Null);
    }

    #[test]
    fn test_success_false_is_rejected() {
        let err = decode::<Vec<i32>>(r#"{"success":false,"message":"Invalid token"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_wrong_shape_is_decode_error() {
        let err = decode::<Vec<i32>>(r#"{"data":{"not":"a list"}}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_non_json_is_decode_error() {
        let err = decode::<Vec<i32>>("<html>Fatal error</html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
