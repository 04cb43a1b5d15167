//! Response envelopes.
//!
//! The backend answers in several shapes: `{success, data, pagination}`,
//! `{success, forecasts}`, `{status, message, data}`, a bare array, or just
//! `{error}`. All of them are validated here and turned into one sum type so
//! that nothing past this module inspects raw JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PrmsError, Result};
use crate::pipeline::pagination::Pagination;

/// Fallback when a failure carries no message of its own.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Where the payload lives inside a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Under one key, e.g. `data` or `forecasts`.
    Field(&'static str),
    /// The whole object is the payload.
    Root,
}

pub const DATA: Payload = Payload::Field("data");

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success { payload: T, pagination: Option<Pagination> },
    Failure { message: String },
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<(T, Option<Pagination>)> {
        match self {
            ApiResponse::Success { payload, pagination } => Ok((payload, pagination)),
            ApiResponse::Failure { message } => Err(PrmsError::Backend(message)),
        }
    }

    pub fn into_payload(self) -> Result<T> {
        self.into_result().map(|(payload, _)| payload)
    }
}

/// Acknowledgement of a mutation: `{success: true, message?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn failure_message(map: &Map<String, Value>) -> Option<String> {
    let message = || {
        text(map, "error")
            .or_else(|| text(map, "message"))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    };
    match (map.get("success"), map.get("status")) {
        (Some(Value::Bool(false)), _) => Some(message()),
        (Some(Value::Bool(true)), _) => None,
        (_, Some(Value::String(status))) if status == "error" => Some(message()),
        (_, Some(Value::String(status))) if status == "success" => None,
        _ if map.contains_key("error") => Some(message()),
        _ => None,
    }
}

/// Validates a decoded body against the expected payload location.
pub fn decode<T: DeserializeOwned>(body: Value, payload: Payload) -> Result<ApiResponse<T>> {
    match body {
        Value::Array(_) => Ok(ApiResponse::Success {
            payload: serde_json::from_value(body)?,
            pagination: None,
        }),
        Value::Object(mut map) => {
            if let Some(message) = failure_message(&map) {
                return Ok(ApiResponse::Failure { message });
            }
            let pagination = match map.remove("pagination") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(serde_json::from_value(raw)?),
            };
            let payload = match payload {
                Payload::Root => serde_json::from_value(Value::Object(map))?,
                Payload::Field(key) => {
                    let raw = map
                        .remove(key)
                        .ok_or_else(|| PrmsError::Decode(format!("response has no `{key}` field")))?;
                    serde_json::from_value(raw)?
                }
            };
            Ok(ApiResponse::Success { payload, pagination })
        }
        other => Err(PrmsError::Decode(format!("expected a JSON object or array, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_with_pagination() {
        let body = json!({
            "success": true,
            "data": [1, 2, 3],
            "pagination": {"currentPage": 2, "totalPages": 3, "totalRecords": 53, "itemsPerPage": 25}
        });
        let (rows, page) = decode::<Vec<u32>>(body, DATA).unwrap().into_result().unwrap();
        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(page.unwrap().total_pages, 3);
    }

    #[test]
    fn backend_failure_is_not_an_exception() {
        let body = json!({"success": false, "error": "DB unreachable"});
        let response = decode::<Vec<u32>>(body, DATA).unwrap();
        assert_eq!(response, ApiResponse::Failure { message: "DB unreachable".into() });
        match response.into_result() {
            Err(PrmsError::Backend(message)) => assert_eq!(message, "DB unreachable"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_style_and_bare_error_bodies() {
        let body = json!({"status": "error", "message": "Invalid action"});
        assert_eq!(
            decode::<Vec<u32>>(body, DATA).unwrap(),
            ApiResponse::Failure { message: "Invalid action".into() }
        );

        let body = json!({"error": "Missing patient ID"});
        assert_eq!(
            decode::<Ack>(body, Payload::Root).unwrap(),
            ApiResponse::Failure { message: "Missing patient ID".into() }
        );

        let body = json!({"success": false});
        assert_eq!(
            decode::<Ack>(body, Payload::Root).unwrap(),
            ApiResponse::Failure { message: GENERIC_FAILURE.into() }
        );
    }

    #[test]
    fn bare_arrays_are_unpaginated_successes() {
        let body = json!([{"id": 1}]);
        let response = decode::<Vec<Value>>(body, DATA).unwrap();
        assert!(matches!(response, ApiResponse::Success { pagination: None, .. }));
    }

    #[test]
    fn missing_payload_is_a_decode_error() {
        let body = json!({"success": true, "patients": []});
        assert!(matches!(decode::<Vec<u32>>(body, DATA), Err(PrmsError::Decode(_))));
    }
}
