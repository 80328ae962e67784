// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Contracts for the collaborators this crate calls but does not own: the backend code
//! generator and the conversational engine behind `chat_message`.
//!
//! Both are consumed through object-safe async traits so the hub and the tool dispatcher can
//! share one `Arc<dyn …>` and tests can swap in scripted doubles.

mod conversation;
mod generator;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ViewState;

pub use conversation::EchoConversation;
pub use generator::{project_id, project_slug, ManifestGenerator, SUPPORTED_DATABASES};

pub const DEFAULT_DATABASE: &str = "postgres";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator failed: {0}")]
    Failed(String),
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self { name: name.into(), field_type: field_type.into(), primary_key: false, required: false }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntitySchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectSchema {
    pub entities: Vec<EntitySchema>,
}

impl Default for ProjectSchema {
    /// One `Item` entity with a uuid key, a required name and a creation timestamp.
    fn default() -> Self {
        Self {
            entities: vec![EntitySchema {
                name: "Item".to_owned(),
                fields: vec![
                    FieldSpec::new("id", "uuid").primary_key(),
                    FieldSpec::new("name", "string").required(),
                    FieldSpec::new("created_at", "timestamp"),
                ],
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub project_name: String,
    pub database: String,
    pub features: Vec<String>,
    pub schema: ProjectSchema,
    /// Unix millis at which the request was issued; feeds the project id.
    pub requested_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub project_id: String,
    pub files_generated: Vec<String>,
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    /// Folds a collaborator failure into a `success: false` result.
    pub fn failed(request: &GenerationRequest, err: &CollaboratorError) -> Self {
        Self {
            success: false,
            project_id: project_id(&request.project_name, request.requested_at_ms),
            files_generated: Vec::new(),
            logs: vec![format!("generation failed: {err}")],
            error: Some(err.to_string()),
        }
    }
}

impl GenerationRequest {
    /// Fills the documented defaults: `postgres`, no features, and the one-entity schema.
    pub fn with_defaults(
        project_name: impl Into<String>,
        database: Option<String>,
        features: Option<Vec<String>>,
        schema: Option<ProjectSchema>,
        requested_at_ms: u64,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            database: database
                .filter(|database| !database.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
            features: features.unwrap_or_default(),
            schema: schema.unwrap_or_default(),
            requested_at_ms,
        }
    }
}

#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, CollaboratorError>;
}

/// Runs `generator`, folding any failure into a `success: false` result so callers on
/// either transport always get a reportable outcome.
pub async fn generate_or_fail(
    generator: &dyn CodeGenerator,
    request: &GenerationRequest,
) -> GenerationResult {
    match generator.generate(request).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(project = %request.project_name, error = %err, "code generation failed");
            GenerationResult::failed(request, &err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Reply from the conversational engine. `ui_update` is raw JSON on purpose: it has to pass
/// the validator before it may touch the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_update: Option<Value>,
}

#[async_trait]
pub trait ConversationalEngine: Send + Sync {
    async fn respond(
        &self,
        message: &str,
        snapshot: &ViewState,
        history: &[ChatTurn],
    ) -> Result<ChatReply, CollaboratorError>;
}

pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
