// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for the canvas.
//!
//! Operations are applied to a scratch copy of the [`ViewState`] and committed only when
//! every op in the batch succeeds, so a failing batch never leaves a half-applied canvas.
//! The returned delta tells callers which component ids changed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{
    merge_bag, Category, Component, ComponentId, Layout, Position, PropertyBag, PropertyValue,
    Size, ViewState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    AddComponent(Component),
    UpdateComponent { id: ComponentId, patch: ComponentPatch },
    RemoveComponent { id: ComponentId },
    UpdateTheme(BTreeMap<String, PropertyValue>),
    UpdateLayout(Layout),
}

/// Field-wise patch for an existing component. `properties` and `style` are merged key by
/// key; the other fields replace the stored value when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPatch {
    pub kind: Option<String>,
    pub category: Option<Category>,
    pub properties: Option<PropertyBag>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub style: Option<PropertyBag>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyResult {
    pub applied: usize,
    pub delta: Delta,
}

/// Minimal delta describing what changed as the result of applying ops.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Delta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub theme_changed: bool,
    pub layout_changed: bool,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: BTreeSet<String>,
    removed: BTreeSet<String>,
    updated: BTreeSet<String>,
    theme_changed: bool,
    layout_changed: bool,
}

impl DeltaBuilder {
    fn record_added(&mut self, id: &ComponentId) {
        let id = id.as_str().to_owned();
        self.updated.remove(&id);
        // remove + add within one batch is a replacement
        if self.removed.remove(&id) {
            self.updated.insert(id);
        } else {
            self.added.insert(id);
        }
    }

    fn record_removed(&mut self, id: &ComponentId) {
        let id = id.as_str().to_owned();
        self.updated.remove(&id);
        if !self.added.remove(&id) {
            self.removed.insert(id);
        }
    }

    fn record_updated(&mut self, id: &ComponentId) {
        let id = id.as_str();
        if self.added.contains(id) || self.removed.contains(id) {
            return;
        }
        self.updated.insert(id.to_owned());
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
            theme_changed: self.theme_changed,
            layout_changed: self.layout_changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("component '{0}' already exists")]
    AlreadyExists(ComponentId),
    #[error("component '{0}' not found")]
    NotFound(ComponentId),
    #[error("component '{id}' of type '{kind}' would lose required property '{property}'")]
    MissingProperty { id: ComponentId, kind: String, property: &'static str },
}

pub fn apply_ops(state: &mut ViewState, ops: &[Op]) -> Result<ApplyResult, ApplyError> {
    if ops.is_empty() {
        return Ok(ApplyResult::default());
    }

    let mut next = state.clone();
    let mut delta = DeltaBuilder::default();

    for op in ops {
        apply_op(&mut next, op, &mut delta)?;
    }

    *state = next;
    Ok(ApplyResult { applied: ops.len(), delta: delta.finish() })
}

fn apply_op(state: &mut ViewState, op: &Op, delta: &mut DeltaBuilder) -> Result<(), ApplyError> {
    match op {
        Op::AddComponent(component) => {
            let id = component.id.clone();
            state.insert(component.clone()).map_err(|_| ApplyError::AlreadyExists(id.clone()))?;
            delta.record_added(&id);
        }
        Op::UpdateComponent { id, patch } => {
            let component =
                state.component_mut(id.as_str()).ok_or_else(|| ApplyError::NotFound(id.clone()))?;
            let reshapes = patch.kind.is_some() || patch.properties.is_some();
            if apply_patch(component, patch.clone()) {
                // a retype or property merge must leave the kind's required set intact
                if reshapes {
                    if let Some(property) = component.missing_required_property() {
                        return Err(ApplyError::MissingProperty {
                            id: id.clone(),
                            kind: component.kind.clone(),
                            property,
                        });
                    }
                }
                delta.record_updated(id);
            }
        }
        Op::RemoveComponent { id } => {
            state.remove(id.as_str()).ok_or_else(|| ApplyError::NotFound(id.clone()))?;
            delta.record_removed(id);
        }
        Op::UpdateTheme(tokens) => {
            let theme = &mut state.theme_mut().0;
            for (token, value) in tokens {
                if theme.get(token) != Some(value) {
                    theme.insert(token.clone(), value.clone());
                    delta.theme_changed = true;
                }
            }
        }
        Op::UpdateLayout(patch) => {
            if state.layout_mut().apply(patch.clone()) {
                delta.layout_changed = true;
            }
        }
    }
    Ok(())
}

fn apply_patch(component: &mut Component, patch: ComponentPatch) -> bool {
    let before = component.clone();
    let ComponentPatch { kind, category, properties, position, size, style } = patch;

    if let Some(kind) = kind {
        component.kind = kind;
    }
    if let Some(category) = category {
        component.category = category;
    }
    if let Some(properties) = properties {
        merge_bag(&mut component.properties, properties);
    }
    if let Some(position) = position {
        component.position = position;
    }
    if let Some(size) = size {
        component.size = size;
    }
    if let Some(style) = style {
        merge_bag(component.style.get_or_insert_with(PropertyBag::new), style);
    }

    *component != before
}

#[cfg(test)]
mod tests;
