// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON-RPC 2.0 framing for the stdio session.

use rmcp::model::ErrorCode;
use rmcp::ErrorData;
use serde::Serialize;
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Tool calls arriving before `initialize`.
pub const NOT_INITIALIZED: ErrorCode = ErrorCode(-32002);

/// One inbound line, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Request { id: Value, method: String, params: Value },
    Notification { method: String, params: Value },
    /// A reply to something we never send; ignored.
    Response,
    Invalid { id: Option<Value>, reason: String },
}

pub fn classify(value: Value) -> Envelope {
    let Value::Object(mut object) = value else {
        return Envelope::Invalid { id: None, reason: "expected a JSON object".to_owned() };
    };

    let id = match object.remove("id") {
        None | Some(Value::Null) => None,
        Some(id @ (Value::String(_) | Value::Number(_))) => Some(id),
        Some(other) => {
            return Envelope::Invalid {
                id: None,
                reason: format!("id must be a string or number, got {other}"),
            }
        }
    };

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Envelope::Invalid { id, reason: "jsonrpc must be \"2.0\"".to_owned() };
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => return Envelope::Invalid { id, reason: "method must be a string".to_owned() },
        None if object.contains_key("result") || object.contains_key("error") => {
            return Envelope::Response
        }
        None => return Envelope::Invalid { id, reason: "missing method".to_owned() },
    };

    let params = object.remove("params").unwrap_or(Value::Null);
    match id {
        Some(id) => Envelope::Request { id, method, params },
        None => Envelope::Notification { method, params },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: ErrorData) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }
}

pub fn parse_error(detail: impl std::fmt::Display) -> ErrorData {
    ErrorData::new(ErrorCode::PARSE_ERROR, format!("parse error: {detail}"), None)
}

pub fn invalid_request(reason: impl Into<String>) -> ErrorData {
    ErrorData::new(ErrorCode::INVALID_REQUEST, format!("invalid request: {}", reason.into()), None)
}

pub fn method_not_found(method: &str) -> ErrorData {
    ErrorData::new(ErrorCode::METHOD_NOT_FOUND, format!("method not found: {method}"), None)
}

pub fn not_initialized(method: &str) -> ErrorData {
    ErrorData::new(
        NOT_INITIALIZED,
        format!("server not initialized; send initialize before {method}"),
        None,
    )
}

/// `params` as an object; `null` and absent params read as empty.
pub fn params_object(params: Value) -> Option<Map<String, Value>> {
    match params {
        Value::Object(object) => Some(object),
        Value::Null => Some(Map::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requests_need_a_method_and_an_id() {
        let envelope = classify(json!({"jsonrpc":"2.0","id":7,"method":"ping"}));
        assert_eq!(
            envelope,
            Envelope::Request { id: json!(7), method: "ping".to_owned(), params: Value::Null }
        );
    }

    #[test]
    fn missing_or_null_id_is_a_notification() {
        for value in [
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
            json!({"jsonrpc":"2.0","id":null,"method":"notifications/initialized"}),
        ] {
            assert!(matches!(classify(value), Envelope::Notification { .. }));
        }
    }

    #[test]
    fn replies_are_recognised() {
        assert_eq!(classify(json!({"jsonrpc":"2.0","id":1,"result":{}})), Envelope::Response);
        assert_eq!(
            classify(json!({"jsonrpc":"2.0","id":1,"error":{"code":1,"message":"x"}})),
            Envelope::Response
        );
    }

    #[test]
    fn invalid_envelopes_keep_the_id_when_usable() {
        assert_eq!(
            classify(json!({"jsonrpc":"2.0","id":"a"})),
            Envelope::Invalid { id: Some(json!("a")), reason: "missing method".to_owned() }
        );
        assert!(matches!(
            classify(json!({"jsonrpc":"1.0","id":3,"method":"ping"})),
            Envelope::Invalid { id: Some(_), .. }
        ));
        assert!(matches!(classify(json!([1, 2])), Envelope::Invalid { id: None, .. }));
        assert!(matches!(
            classify(json!({"jsonrpc":"2.0","id":{"x":1},"method":"ping"})),
            Envelope::Invalid { id: None, .. }
        ));
    }

    #[test]
    fn failures_serialize_without_result() {
        let response = Response::failure(Value::Null, parse_error("eof"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
        assert_eq!(value["id"], Value::Null);
    }
}
