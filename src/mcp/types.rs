// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collab::ProjectSchema;
use crate::model::{Category, PropertyBag, Position, Size, ViewState};
use crate::ops::Delta;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VibeMode {
    #[default]
    General,
    Component,
}

impl fmt::Display for VibeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::General => "general",
            Self::Component => "component",
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct VibeStartParams {
    /// Session mode; defaults to `general`.
    #[serde(default)]
    pub mode: Option<VibeMode>,
    /// WebSocket hub port; defaults to 3001.
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeStartResponse {
    pub status: String,
    pub mode: VibeMode,
    pub port: u16,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentAction {
    Add,
    #[default]
    Update,
    Remove,
}

impl fmt::Display for ComponentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        })
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdateParams {
    pub component_id: String,
    #[serde(default)]
    pub action: Option<ComponentAction>,
    #[serde(default)]
    pub properties: Option<PropertyBag>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub size: Option<Size>,
    /// Component kind; used by `add` (defaults to `container`) and optionally by `update`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdateResponse {
    pub component_id: String,
    pub action: ComponentAction,
    pub components: usize,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateCodeParams {
    pub project_name: String,
    /// One of postgres, mysql, sqlite, mongodb; defaults to postgres.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    /// Entity schema; a single `Item` entity is used when omitted.
    #[serde(default)]
    pub schema: Option<ProjectSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateCodeResponse {
    pub success: bool,
    pub project_id: String,
    pub project_name: String,
    pub database: String,
    pub features: Vec<String>,
    pub schema: ProjectSchema,
    pub files_generated: Vec<String>,
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct EmptyParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub project_name: String,
    pub database: String,
    pub features: Vec<String>,
    pub success: bool,
    pub files: usize,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSummary {
    pub status: String,
    pub port: u16,
    pub mode: VibeMode,
    pub clients: usize,
    pub url: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatusResponse {
    pub projects: Vec<ProjectSummary>,
    pub hub: Option<HubSummary>,
    pub uptime_secs: u64,
}

/// Schema-only mirror of a UI update; the tool itself validates the raw arguments.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UiUpdateParams {
    /// Always `ui_update`.
    #[serde(rename = "type")]
    pub kind: String,
    /// One of update_component, add_component, remove_component, update_theme, update_layout.
    pub action: String,
    pub data: serde_json::Map<String, Value>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiUpdateResponse {
    pub action: String,
    pub explanation: String,
    pub delta: Delta,
    pub components: usize,
    pub rev: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewStateResponse {
    pub rev: u64,
    pub clients: usize,
    pub view_state: ViewState,
}
