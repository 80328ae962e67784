// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::ops::ApplyError;
use crate::validate::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("hub is not running; call vibe_start first")]
    HubNotRunning,
    #[error("hub is unavailable ({0})")]
    HubUnavailable(String),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error("ui update rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ToolFuture = BoxFuture<'static, Result<Value, ToolError>>;
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

struct RegisteredTool {
    tool: Tool,
    handler: ToolHandler,
}

/// Tools in registration order, looked up by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Tool, handler: ToolHandler) -> Result<(), RegistryError> {
        let name = tool.name.to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool { tool, handler });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter().map(|registered| &registered.tool)
    }

    /// Starts the named tool, or returns `None` for an unknown name.
    pub fn call(&self, name: &str, arguments: Value) -> Option<ToolFuture> {
        let registered = &self.tools[*self.index.get(name)?];
        Some((registered.handler)(arguments))
    }
}

/// Object schema for `P`, shaped the way MCP clients expect an `inputSchema`.
pub fn input_schema<P: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(P);
    let mut object = match serde_json::to_value(schema) {
        Ok(Value::Object(object)) => object,
        _ => JsonObject::new(),
    };
    object.remove("$schema");
    object.insert("type".to_owned(), Value::String("object".to_owned()));
    object.entry("properties").or_insert_with(|| Value::Object(JsonObject::new()));
    object.entry("required").or_insert_with(|| Value::Array(Vec::new()));
    object
}

pub fn tool<P: JsonSchema>(name: &'static str, description: &'static str) -> Tool {
    Tool::new(name, description, Arc::new(input_schema::<P>()))
}

/// Decodes tool arguments; absent or `null` arguments read as `{}`.
pub fn decode<P: DeserializeOwned>(arguments: Value) -> Result<P, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(JsonObject::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

/// Wraps a typed async handler: arguments are decoded into `P` and the result encoded back.
pub fn typed<S, P, R, F, Fut>(state: S, handler: F) -> ToolHandler
where
    S: Clone + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize,
    F: Fn(S, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
{
    Arc::new(move |arguments| match decode::<P>(arguments) {
        Ok(params) => {
            let running = handler(state.clone(), params);
            async move { Ok(serde_json::to_value(running.await?)?) }.boxed()
        }
        Err(err) => futures::future::ready(Err(err)).boxed(),
    })
}
