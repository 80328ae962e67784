// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line-delimited JSON-RPC 2.0 session over stdio.
//!
//! One request is handled at a time: the next line is read only after the previous
//! response has been written and flushed. Protocol errors are answered and the loop keeps
//! going; only a failing reader or writer ends the session.

use rmcp::model::{CallToolResult, Content, ErrorCode, ProtocolVersion, ServerCapabilities};
use rmcp::ErrorData;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::envelope::{self, classify, Envelope, Response};
use super::registry::ToolRegistry;

pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("stdio failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
}

/// What the client said about itself in `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub client_info: Option<ClientImplementation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientImplementation {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

pub struct RpcSession {
    registry: ToolRegistry,
    state: SessionState,
    client: Option<ClientInfo>,
}

impl RpcSession {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry, state: SessionState::Uninitialized, client: None }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn client(&self) -> Option<&ClientInfo> {
        self.client.as_ref()
    }

    /// Serves until `reader` reaches EOF. Blank lines are skipped; a line that is not UTF-8
    /// is answered with a parse error.
    pub async fn run<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), SessionError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                info!("stdin closed; ending session");
                return Ok(());
            }
            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.handle_line(line).await
                }
                Err(err) => {
                    warn!(error = %err, "line is not valid UTF-8");
                    Some(Response::failure(Value::Null, envelope::parse_error(err)))
                }
            };

            if let Some(response) = response {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }
    }

    /// Handles one inbound line; `None` means nothing is written back.
    pub async fn handle_line(&mut self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "unparseable line");
                return Some(Response::failure(Value::Null, envelope::parse_error(err)));
            }
        };

        match classify(value) {
            Envelope::Request { id, method, params } => {
                debug!(method = %method, "request");
                Some(match self.handle_request(&method, params).await {
                    Ok(result) => Response::success(id, result),
                    Err(error) => Response::failure(id, error),
                })
            }
            Envelope::Notification { method, .. } => {
                self.handle_notification(&method);
                None
            }
            Envelope::Response => {
                debug!("ignoring inbound response");
                None
            }
            Envelope::Invalid { id, reason } => {
                warn!(reason = %reason, "invalid request envelope");
                Some(Response::failure(id.unwrap_or(Value::Null), envelope::invalid_request(reason)))
            }
        }
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => debug!("client confirmed initialization"),
            other => debug!(method = %other, "ignoring notification"),
        }
    }

    async fn handle_request(&mut self, method: &str, params: Value) -> Result<Value, ErrorData> {
        match method {
            "initialize" => Ok(self.initialize(params)),
            "ping" => Ok(json!({})),
            "tools/list" | "tools/call" if self.state == SessionState::Uninitialized => {
                Err(envelope::not_initialized(method))
            }
            "tools/list" => {
                let tools: Vec<_> = self.registry.tools().collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(params).await,
            other => Err(envelope::method_not_found(other)),
        }
    }

    /// Idempotent: a repeated `initialize` is answered with the same result.
    fn initialize(&mut self, params: Value) -> Value {
        let client: ClientInfo = serde_json::from_value(params).unwrap_or_default();
        info!(
            protocol_version = client.protocol_version.as_deref().unwrap_or("unknown"),
            client = client.client_info.as_ref().map_or("unknown", |info| info.name.as_str()),
            "initialize"
        );
        self.client = Some(client);
        self.state = SessionState::Initialized;

        json!({
            "protocolVersion": ProtocolVersion::V_2024_11_05,
            "capabilities": ServerCapabilities::builder().enable_tools().build(),
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, ErrorData> {
        let Some(mut params) = envelope::params_object(params) else {
            return Err(invalid_params("tools/call params must be an object"));
        };
        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(invalid_params("tools/call requires a string 'name'")),
        };
        let arguments = params.remove("arguments").unwrap_or(Value::Null);

        let Some(running) = self.registry.call(&name, arguments) else {
            return Err(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("unknown tool: {name}"),
                None,
            ));
        };

        match running.await {
            Ok(result) => {
                let text = match result {
                    Value::String(text) => text,
                    other => serde_json::to_string_pretty(&other).map_err(|err| {
                        ErrorData::internal_error(format!("failed to encode result: {err}"), None)
                    })?,
                };
                debug!(tool = %name, "tool call succeeded");
                serde_json::to_value(CallToolResult::success(vec![Content::text(text)])).map_err(
                    |err| ErrorData::internal_error(format!("failed to encode result: {err}"), None),
                )
            }
            Err(err) => {
                let detail = err.to_string();
                warn!(tool = %name, error = %detail, "tool call failed");
                Err(ErrorData::new(
                    ErrorCode::INTERNAL_ERROR,
                    format!("tool '{name}' failed: {detail}"),
                    Some(json!({ "tool": name, "detail": detail })),
                ))
            }
        }
    }
}

fn invalid_params(message: &'static str) -> ErrorData {
    ErrorData::new(ErrorCode::INVALID_PARAMS, message, None)
}

/// Runs a session on the process's stdin/stdout.
pub async fn serve_stdio(registry: ToolRegistry) -> Result<(), SessionError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    RpcSession::new(registry).run(stdin, stdout).await
}
