// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use super::{CodeGenerator, CollaboratorError, GenerationRequest, GenerationResult};

pub const SUPPORTED_DATABASES: [&str; 4] = ["mongodb", "mysql", "postgres", "sqlite"];

/// Lowercase ascii slug: alphanumeric runs joined by single `-`.
pub fn project_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Project ids are `<slug>-<unix millis>`; the same name and timestamp always yield the same id.
pub fn project_id(name: &str, requested_at_ms: u64) -> String {
    let slug = project_slug(name);
    if slug.is_empty() {
        format!("project-{requested_at_ms}")
    } else {
        format!("{slug}-{requested_at_ms}")
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_lower = true;
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_owned()
}

/// Default generator: plans the Go service layout a request would produce without writing
/// anything to disk. Stands in until a real template engine is attached.
#[derive(Debug, Clone, Default)]
pub struct ManifestGenerator;

impl ManifestGenerator {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, request: &GenerationRequest) -> Result<(), CollaboratorError> {
        if project_slug(&request.project_name).is_empty() {
            return Err(CollaboratorError::Rejected(
                "project name must contain at least one letter or digit".to_owned(),
            ));
        }
        if !SUPPORTED_DATABASES.contains(&request.database.as_str()) {
            return Err(CollaboratorError::Rejected(format!(
                "unsupported database '{}' (expected one of: {})",
                request.database,
                SUPPORTED_DATABASES.join(", ")
            )));
        }
        if request.schema.entities.is_empty() {
            return Err(CollaboratorError::Rejected("schema has no entities".to_owned()));
        }
        for entity in &request.schema.entities {
            if snake_case(&entity.name).is_empty() {
                return Err(CollaboratorError::Rejected("entity name must not be empty".to_owned()));
            }
            if entity.fields.is_empty() {
                return Err(CollaboratorError::Rejected(format!(
                    "entity '{}' has no fields",
                    entity.name
                )));
            }
        }
        Ok(())
    }

    fn plan(&self, request: &GenerationRequest) -> (Vec<String>, Vec<String>) {
        let mut files = BTreeSet::new();
        let mut logs = Vec::new();
        logs.push(format!(
            "planning project '{}' on {}",
            request.project_name, request.database
        ));

        for base in [
            "go.mod",
            "README.md",
            "cmd/server/main.go",
            "internal/config/config.go",
            "internal/server/router.go",
        ] {
            files.insert(base.to_owned());
        }
        files.insert(format!("internal/database/{}.go", request.database));
        if request.database != "mongodb" {
            files.insert("migrations/0001_init.sql".to_owned());
        }

        let entities =
            request.schema.entities.iter().map(|entity| snake_case(&entity.name)).collect::<Vec<_>>();
        for (entity, schema) in entities.iter().zip(&request.schema.entities) {
            files.insert(format!("internal/models/{entity}.go"));
            files.insert(format!("internal/repository/{entity}_repository.go"));
            files.insert(format!("internal/handlers/{entity}_handler.go"));
            logs.push(format!("entity {}: {} fields", schema.name, schema.fields.len()));
        }

        for feature in &request.features {
            let before = files.len();
            match feature.as_str() {
                "auth" => {
                    files.insert("internal/middleware/auth.go".to_owned());
                    files.insert("internal/handlers/auth_handler.go".to_owned());
                }
                "docker" => {
                    files.insert("Dockerfile".to_owned());
                    files.insert("docker-compose.yml".to_owned());
                }
                "tests" => {
                    for entity in &entities {
                        files.insert(format!("internal/handlers/{entity}_handler_test.go"));
                    }
                }
                "openapi" | "swagger" => {
                    files.insert("api/openapi.yaml".to_owned());
                }
                "cors" | "logging" => {
                    files.insert(format!("internal/middleware/{feature}.go"));
                }
                other => {
                    let slug = snake_case(other);
                    if slug.is_empty() {
                        logs.push(format!("feature '{other}' ignored: empty name"));
                        continue;
                    }
                    files.insert(format!("internal/features/{slug}.go"));
                }
            }
            logs.push(format!("feature {feature}: {} files", files.len() - before));
        }

        logs.push(format!("planned {} files", files.len()));
        (files.into_iter().collect(), logs)
    }
}

#[async_trait]
impl CodeGenerator for ManifestGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, CollaboratorError> {
        self.check(request)?;
        let (files_generated, logs) = self.plan(request);
        debug!(project = %request.project_name, files = files_generated.len(), "planned project");
        Ok(GenerationResult {
            success: true,
            project_id: project_id(&request.project_name, request.requested_at_ms),
            files_generated,
            logs,
            error: None,
        })
    }
}
