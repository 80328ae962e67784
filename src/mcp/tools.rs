// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::registry::{tool, typed, RegistryError, ToolError, ToolRegistry};
use super::types::*;
use crate::collab::{
    generate_or_fail, unix_millis, CodeGenerator, ConversationalEngine, EchoConversation,
    GenerationRequest, ManifestGenerator,
};
use crate::config::HubConfig;
use crate::hub::{Hub, HubStatus};
use crate::validate::{validate_ui_update, UiAction, UI_UPDATE_TYPE};

const PREVIOUS_HUB_GRACE: Duration = Duration::from_secs(5);

const DEFAULT_COMPONENT_KIND: &str = "container";
const DEFAULT_COMPONENT_CATEGORY: &str = "molecule";

struct ActiveHub {
    hub: Hub,
    mode: VibeMode,
    task: JoinHandle<()>,
}

struct DispatcherInner {
    hub_config: HubConfig,
    generator: Arc<dyn CodeGenerator>,
    conversation: Arc<dyn ConversationalEngine>,
    active: tokio::sync::Mutex<Option<ActiveHub>>,
    projects: Mutex<Vec<ProjectSummary>>,
    started_at: Instant,
}

/// Backs the agent-facing tools. Cheap to clone; every clone drives the same hub slot and
/// project list.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(hub_config: HubConfig) -> Self {
        Self::with_collaborators(hub_config, Arc::new(ManifestGenerator), Arc::new(EchoConversation))
    }

    pub fn with_collaborators(
        hub_config: HubConfig,
        generator: Arc<dyn CodeGenerator>,
        conversation: Arc<dyn ConversationalEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                hub_config,
                generator,
                conversation,
                active: tokio::sync::Mutex::new(None),
                projects: Mutex::new(Vec::new()),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn registry(&self) -> Result<ToolRegistry, RegistryError> {
        let mut registry = ToolRegistry::new();
        registry.register(
            tool::<VibeStartParams>(
                "vibe_start",
                "Start (or restart) the live design session and its WebSocket hub. Returns immediately; poll project_status for the bind outcome.",
            ),
            typed(self.clone(), |this: Self, params: VibeStartParams| async move {
                this.vibe_start(params).await
            }),
        )?;
        registry.register(
            tool::<ComponentUpdateParams>(
                "component_update",
                "Add, update or remove one canvas component and broadcast the new canvas to every browser.",
            ),
            typed(self.clone(), |this: Self, params: ComponentUpdateParams| async move {
                this.component_update(params).await
            }),
        )?;
        registry.register(
            tool::<GenerateCodeParams>(
                "generate_code",
                "Generate a Go backend project from a project name, database and entity schema.",
            ),
            typed(self.clone(), |this: Self, params: GenerateCodeParams| async move {
                this.generate_code(params).await
            }),
        )?;
        registry.register(
            tool::<EmptyParams>(
                "project_status",
                "Report generated projects, hub status and server uptime.",
            ),
            typed(self.clone(), |this: Self, _: EmptyParams| async move {
                Ok::<_, ToolError>(this.project_status().await)
            }),
        )?;
        registry.register(
            tool::<UiUpdateParams>(
                "ui_update",
                "Apply a validated ui_update message (component, theme or layout change) to the live canvas.",
            ),
            typed(self.clone(), |this: Self, message: Value| async move {
                this.ui_update(message).await
            }),
        )?;
        registry.register(
            tool::<EmptyParams>("view_state", "Return the live canvas as the browsers see it."),
            typed(self.clone(), |this: Self, _: EmptyParams| async move { this.view_state().await }),
        )?;
        Ok(registry)
    }

    /// Replaces the active hub with a fresh one on `port` and starts serving in the
    /// background.
    pub async fn vibe_start(&self, params: VibeStartParams) -> Result<VibeStartResponse, ToolError> {
        let mode = params.mode.unwrap_or_default();
        let port = params.port.unwrap_or(self.inner.hub_config.port);
        let config = self.inner.hub_config.clone().with_port(port);

        let mut active = self.inner.active.lock().await;
        if let Some(previous) = active.take() {
            stop_hub(previous).await;
        }

        let hub = Hub::with_collaborators(
            config,
            self.inner.generator.clone(),
            self.inner.conversation.clone(),
        );
        let task = hub.spawn();
        let url = ws_url(&hub);
        info!(%mode, port, "design session starting");
        *active = Some(ActiveHub { hub, mode, task });

        Ok(VibeStartResponse { status: "starting".to_owned(), mode, port, url })
    }

    pub async fn active_hub(&self) -> Option<Hub> {
        self.inner.active.lock().await.as_ref().map(|active| active.hub.clone())
    }

    async fn running_hub(&self) -> Result<Hub, ToolError> {
        let hub = self.active_hub().await.ok_or(ToolError::HubNotRunning)?;
        match hub.status() {
            status @ (HubStatus::Failed { .. } | HubStatus::Stopped) => {
                Err(ToolError::HubUnavailable(status.to_string()))
            }
            HubStatus::Starting | HubStatus::Listening { .. } => Ok(hub),
        }
    }

    pub async fn component_update(
        &self,
        params: ComponentUpdateParams,
    ) -> Result<ComponentUpdateResponse, ToolError> {
        let hub = self.running_hub().await?;
        let action = params.action.unwrap_or_default();
        let message = component_message(&params, action);
        let validated = validate_ui_update(&message)?;
        let committed = hub.apply_ops(&[validated.op], None)?;
        info!(
            component_id = %params.component_id,
            %action,
            delivered = committed.delivered,
            "component updated"
        );
        Ok(ComponentUpdateResponse {
            component_id: params.component_id,
            action,
            components: committed.view.len(),
        })
    }

    pub async fn generate_code(
        &self,
        params: GenerateCodeParams,
    ) -> Result<GenerateCodeResponse, ToolError> {
        let request = GenerationRequest::with_defaults(
            params.project_name,
            params.database,
            params.features,
            params.schema,
            unix_millis(),
        );
        let result = generate_or_fail(self.inner.generator.as_ref(), &request).await;

        self.inner.projects.lock().push(ProjectSummary {
            project_id: result.project_id.clone(),
            project_name: request.project_name.clone(),
            database: request.database.clone(),
            features: request.features.clone(),
            success: result.success,
            files: result.files_generated.len(),
            created_at_ms: request.requested_at_ms,
        });

        Ok(GenerateCodeResponse {
            success: result.success,
            project_id: result.project_id,
            project_name: request.project_name,
            database: request.database,
            features: request.features,
            schema: request.schema,
            files_generated: result.files_generated,
            logs: result.logs,
            error: result.error,
        })
    }

    pub async fn project_status(&self) -> ProjectStatusResponse {
        let hub = self.inner.active.lock().await.as_ref().map(|active| HubSummary {
            status: active.hub.status().to_string(),
            port: active.hub.local_addr().port(),
            mode: active.mode,
            clients: active.hub.client_count(),
            url: ws_url(&active.hub),
            uptime_secs: active.hub.uptime().as_secs(),
        });
        ProjectStatusResponse {
            projects: self.inner.projects.lock().clone(),
            hub,
            uptime_secs: self.inner.started_at.elapsed().as_secs(),
        }
    }

    pub async fn ui_update(&self, message: Value) -> Result<UiUpdateResponse, ToolError> {
        let validated = validate_ui_update(&message)?;
        let hub = self.running_hub().await?;
        let committed = hub.apply_ops(&[validated.op], None)?;
        Ok(UiUpdateResponse {
            action: validated.action.to_string(),
            explanation: validated.explanation,
            delta: committed.result.delta,
            components: committed.view.len(),
            rev: committed.rev,
        })
    }

    pub async fn view_state(&self) -> Result<ViewStateResponse, ToolError> {
        let hub = self.active_hub().await.ok_or(ToolError::HubNotRunning)?;
        Ok(ViewStateResponse {
            rev: hub.rev(),
            clients: hub.client_count(),
            view_state: hub.snapshot(),
        })
    }

    /// Stops the active hub, if any.
    pub async fn shutdown(&self) {
        if let Some(previous) = self.inner.active.lock().await.take() {
            stop_hub(previous).await;
        }
    }
}

async fn stop_hub(previous: ActiveHub) {
    previous.hub.shutdown();
    let mut task = previous.task;
    if tokio::time::timeout(PREVIOUS_HUB_GRACE, &mut task).await.is_err() {
        warn!("previous hub did not stop in time; aborting");
        task.abort();
    }
}

fn ws_url(hub: &Hub) -> String {
    format!("ws://{}/ws", hub.local_addr())
}

/// Lowers tool arguments into the `ui_update` message the validator understands.
fn component_message(params: &ComponentUpdateParams, action: ComponentAction) -> Value {
    let mut data = Map::new();
    data.insert("id".to_owned(), Value::String(params.component_id.clone()));

    let ui_action = match action {
        ComponentAction::Add => {
            let kind = params.kind.as_deref().unwrap_or(DEFAULT_COMPONENT_KIND);
            let category = params.category.map(|category| category.as_str());
            data.insert("type".to_owned(), json!(kind));
            data.insert("category".to_owned(), json!(category.unwrap_or(DEFAULT_COMPONENT_CATEGORY)));
            UiAction::AddComponent
        }
        ComponentAction::Update => {
            if let Some(kind) = &params.kind {
                data.insert("type".to_owned(), json!(kind));
            }
            if let Some(category) = params.category {
                data.insert("category".to_owned(), json!(category));
            }
            UiAction::UpdateComponent
        }
        ComponentAction::Remove => UiAction::RemoveComponent,
    };

    if action != ComponentAction::Remove {
        if let Some(properties) = &params.properties {
            data.insert("properties".to_owned(), json!(properties));
        }
        if let Some(position) = params.position {
            data.insert("position".to_owned(), json!(position));
        }
        if let Some(size) = params.size {
            data.insert("size".to_owned(), json!(size));
        }
    }

    json!({
        "type": UI_UPDATE_TYPE,
        "action": ui_action.as_str(),
        "data": data,
        "explanation": format!("component_update ({action}) from agent"),
    })
}
