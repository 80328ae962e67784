// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Browser wire format: every WebSocket text frame is `{type, data}` with an optional
//! correlation `id` echoed on replies.

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::collab::{ChatTurn, GenerationResult, ProjectSchema};
use crate::model::ViewState;

pub const VIEW_UPDATE: &str = "view_update";
pub const GENERATE_REQUEST: &str = "generate_request";
pub const GENERATE_RESPONSE: &str = "generate_response";
pub const CHAT_MESSAGE: &str = "chat_message";
pub const CHAT_RESPONSE: &str = "chat_response";
pub const ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateRequestData {
    #[serde(alias = "projectName")]
    pub project_name: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub schema: Option<ProjectSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessageData {
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateResponseData {
    pub success: bool,
    pub project_id: String,
    pub files: Vec<String>,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GenerationResult> for GenerateResponseData {
    fn from(result: GenerationResult) -> Self {
        Self {
            success: result.success,
            project_id: result.project_id,
            files: result.files_generated,
            logs: result.logs,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponseData {
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_update: Option<Value>,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_state: Option<ViewState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
struct OutboundFrame<'a, T> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a Value>,
    data: T,
}

pub fn encode<T: Serialize>(kind: &str, id: Option<&Value>, data: T) -> Utf8Bytes {
    match serde_json::to_string(&OutboundFrame { kind, id, data }) {
        Ok(text) => Utf8Bytes::from(text),
        Err(err) => {
            error!(kind, error = %err, "failed to encode outbound frame");
            error_frame(kind, &format!("failed to encode {kind} frame"))
        }
    }
}

pub fn view_update(state: &ViewState) -> Utf8Bytes {
    encode(VIEW_UPDATE, None, state)
}

/// Error frame sent only to the client whose `source` frame failed.
pub fn error_frame(source: &str, message: &str) -> Utf8Bytes {
    let text = json!({ "type": ERROR, "data": { "source": source, "message": message } });
    Utf8Bytes::from(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_frame_defaults_missing_data_and_id() {
        let frame: InboundFrame = serde_json::from_str(r#"{"type":"chat_message"}"#).unwrap();
        assert_eq!(frame.kind, CHAT_MESSAGE);
        assert!(frame.data.is_null());
        assert!(frame.id.is_none());
    }

    #[test]
    fn outbound_frames_echo_correlation_id() {
        let id = json!("req-7");
        let frame = encode(
            GENERATE_RESPONSE,
            Some(&id),
            GenerateResponseData {
                success: true,
                project_id: "blog-1".to_owned(),
                files: vec!["go.mod".to_owned()],
                logs: Vec::new(),
                error: None,
            },
        );
        let value: Value = serde_json::from_str(frame.as_str()).unwrap();
        assert_eq!(value["type"], "generate_response");
        assert_eq!(value["id"], "req-7");
        assert_eq!(value["data"]["files"], json!(["go.mod"]));
        assert!(value["data"].get("error").is_none());
    }

    #[test]
    fn view_update_wraps_state() {
        let value: Value = serde_json::from_str(view_update(&ViewState::new()).as_str()).unwrap();
        assert_eq!(value["type"], "view_update");
        assert_eq!(value["data"]["components"], json!([]));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn generate_request_accepts_camel_case_name() {
        let data: GenerateRequestData =
            serde_json::from_value(json!({"projectName": "shop", "features": ["auth"]})).unwrap();
        assert_eq!(data.project_name, "shop");
        assert_eq!(data.features, Some(vec!["auth".to_owned()]));
        assert!(data.database.is_none());
    }
}
