// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural gate for externally supplied canvas mutations.
//!
//! Every UI update that reaches the canvas from outside the process (agent tool calls,
//! conversational replies, browser view pushes) passes through here first. Checks run in a
//! fixed order and stop at the first violation so the caller gets one precise reason.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{
    Category, Component, ComponentId, IdError, Layout, Position, PropertyBag, PropertyValue, Size,
    ViewState,
};
use crate::ops::{ComponentPatch, Op};

pub use crate::model::{is_known_kind, required_properties, COMPONENT_KINDS};

pub const UI_UPDATE_TYPE: &str = "ui_update";

const REQUIRED_KEYS: [&str; 4] = ["type", "action", "data", "explanation"];

const LAYOUT_KEYS: [&str; 4] = ["grid", "rowHeight", "margin", "containerPadding"];

fn hex_color() -> &'static Regex {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR.get_or_init(|| {
        Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b")
            .expect("hex color pattern compiles")
    })
}

pub fn contains_hex_color(value: &str) -> bool {
    hex_color().is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiAction {
    UpdateComponent,
    AddComponent,
    RemoveComponent,
    UpdateTheme,
    UpdateLayout,
}

impl UiAction {
    pub const ALL: [UiAction; 5] = [
        UiAction::UpdateComponent,
        UiAction::AddComponent,
        UiAction::RemoveComponent,
        UiAction::UpdateTheme,
        UiAction::UpdateLayout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateComponent => "update_component",
            Self::AddComponent => "add_component",
            Self::RemoveComponent => "remove_component",
            Self::UpdateTheme => "update_theme",
            Self::UpdateLayout => "update_layout",
        }
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAction(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("ui update is not valid JSON: {0}")]
    Malformed(String),
    #[error("ui update must be a JSON object")]
    NotAnObject,
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("'type' must be \"{UI_UPDATE_TYPE}\", got {0}")]
    WrongMessageType(String),
    #[error("'explanation' must be a string")]
    ExplanationNotString,
    #[error(
        "unknown action '{0}' (expected update_component, add_component, remove_component, update_theme or update_layout)"
    )]
    UnknownAction(String),
    #[error("'data' must be a JSON object")]
    DataNotObject,
    #[error("add_component requires data.type")]
    MissingComponentType,
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),
    #[error("add_component requires data.category")]
    MissingCategory,
    #[error("invalid category {0} (expected atom, molecule or organism)")]
    InvalidCategory(String),
    #[error("component type '{kind}' requires property '{property}'")]
    MissingProperty { kind: String, property: &'static str },
    #[error("{action} requires data.id")]
    MissingComponentId { action: UiAction },
    #[error("invalid component id: {0}")]
    InvalidComponentId(IdError),
    #[error("update_theme requires at least one hex color value (e.g. #3366ff)")]
    NoHexColor,
    #[error("theme token '{0}' must be a string, number or boolean")]
    InvalidThemeToken(String),
    #[error("update_layout requires at least one of grid, rowHeight, margin, containerPadding")]
    NoLayoutField,
    #[error("invalid data.{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("invalid view state: {0}")]
    InvalidViewState(String),
}

/// A UI update that passed every structural check, lowered to a canvas op.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpdate {
    pub action: UiAction,
    pub op: Op,
    pub explanation: String,
}

pub fn validate_ui_update_str(text: &str) -> Result<ValidatedUpdate, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ValidationError::Malformed(err.to_string()))?;
    validate_ui_update(&value)
}

pub fn validate_ui_update(value: &Value) -> Result<ValidatedUpdate, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(ValidationError::MissingKey(key));
        }
    }

    match &object["type"] {
        Value::String(kind) if kind == UI_UPDATE_TYPE => {}
        other => return Err(ValidationError::WrongMessageType(other.to_string())),
    }

    let action = match &object["action"] {
        Value::String(action) => action.parse::<UiAction>()?,
        other => return Err(ValidationError::UnknownAction(other.to_string())),
    };

    let Some(explanation) = object["explanation"].as_str() else {
        return Err(ValidationError::ExplanationNotString);
    };

    let data = object["data"].as_object().ok_or(ValidationError::DataNotObject)?;

    let op = match action {
        UiAction::AddComponent => Op::AddComponent(validate_new_component(data)?),
        UiAction::UpdateComponent => {
            let id = component_id(data, action)?;
            Op::UpdateComponent { id, patch: validate_patch(data)? }
        }
        UiAction::RemoveComponent => Op::RemoveComponent { id: component_id(data, action)? },
        UiAction::UpdateTheme => Op::UpdateTheme(validate_theme(data)?),
        UiAction::UpdateLayout => Op::UpdateLayout(validate_layout(data)?),
    };

    Ok(ValidatedUpdate { action, op, explanation: explanation.to_owned() })
}

/// Decodes a full canvas snapshot pushed by a browser. Unknown component kinds are kept:
/// the browser is authoritative for what it renders.
pub fn validate_view_state(value: Value) -> Result<ViewState, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::InvalidViewState("expected a JSON object".to_owned()));
    }
    serde_json::from_value(value).map_err(|err| ValidationError::InvalidViewState(err.to_string()))
}

fn validate_new_component(data: &Map<String, Value>) -> Result<Component, ValidationError> {
    let kind = match data.get("type") {
        None | Some(Value::Null) => return Err(ValidationError::MissingComponentType),
        Some(Value::String(kind)) => kind.as_str(),
        Some(other) => return Err(ValidationError::UnknownComponentType(other.to_string())),
    };
    if !is_known_kind(kind) {
        return Err(ValidationError::UnknownComponentType(kind.to_owned()));
    }

    let category = match data.get("category") {
        None | Some(Value::Null) => return Err(ValidationError::MissingCategory),
        Some(value) => parse_category(value)?,
    };

    let properties: PropertyBag = decode_field(data, "properties")?.unwrap_or_default();
    for &property in required_properties(kind) {
        if properties.get(property).map_or(true, |value| value.is_null()) {
            return Err(ValidationError::MissingProperty { kind: kind.to_owned(), property });
        }
    }

    let id = match data.get("id") {
        None | Some(Value::Null) => generated_component_id(kind)?,
        Some(Value::String(raw)) => {
            ComponentId::new(raw.as_str()).map_err(ValidationError::InvalidComponentId)?
        }
        Some(other) => {
            return Err(ValidationError::InvalidField {
                field: "id",
                reason: format!("expected a string, got {other}"),
            })
        }
    };

    let mut component = Component::new(id, kind, category);
    component.properties = properties;
    if let Some(position) = decode_field::<Position>(data, "position")? {
        component.position = position;
    }
    if let Some(size) = decode_field::<Size>(data, "size")? {
        component.size = size;
    }
    component.style = decode_field(data, "style")?;
    Ok(component)
}

fn validate_patch(data: &Map<String, Value>) -> Result<ComponentPatch, ValidationError> {
    let kind = match data.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(kind)) if is_known_kind(kind) => Some(kind.clone()),
        Some(Value::String(kind)) => {
            return Err(ValidationError::UnknownComponentType(kind.clone()))
        }
        Some(other) => return Err(ValidationError::UnknownComponentType(other.to_string())),
    };
    let category = match data.get("category") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_category(value)?),
    };

    Ok(ComponentPatch {
        kind,
        category,
        properties: decode_field(data, "properties")?,
        position: decode_field(data, "position")?,
        size: decode_field(data, "size")?,
        style: decode_field(data, "style")?,
    })
}

fn validate_theme(
    data: &Map<String, Value>,
) -> Result<BTreeMap<String, PropertyValue>, ValidationError> {
    let mut tokens = BTreeMap::new();
    for (token, value) in data {
        if !(value.is_string() || value.is_number() || value.is_boolean()) {
            return Err(ValidationError::InvalidThemeToken(token.clone()));
        }
        let value = PropertyValue::deserialize(value).map_err(|err| {
            ValidationError::InvalidField { field: "theme", reason: err.to_string() }
        })?;
        tokens.insert(token.clone(), value);
    }
    if !tokens.values().filter_map(PropertyValue::as_str).any(contains_hex_color) {
        return Err(ValidationError::NoHexColor);
    }
    Ok(tokens)
}

fn validate_layout(data: &Map<String, Value>) -> Result<Layout, ValidationError> {
    if !LAYOUT_KEYS.iter().any(|key| data.get(*key).is_some_and(|value| !value.is_null())) {
        return Err(ValidationError::NoLayoutField);
    }
    Ok(Layout {
        grid: decode_field(data, "grid")?,
        row_height: decode_field(data, "rowHeight")?,
        margin: decode_field(data, "margin")?,
        container_padding: decode_field(data, "containerPadding")?,
        ..Layout::default()
    })
}

fn component_id(
    data: &Map<String, Value>,
    action: UiAction,
) -> Result<ComponentId, ValidationError> {
    match data.get("id") {
        Some(Value::String(raw)) => {
            ComponentId::new(raw.as_str()).map_err(ValidationError::InvalidComponentId)
        }
        _ => Err(ValidationError::MissingComponentId { action }),
    }
}

fn parse_category(value: &Value) -> Result<Category, ValidationError> {
    value
        .as_str()
        .and_then(|raw| raw.parse::<Category>().ok())
        .ok_or_else(|| ValidationError::InvalidCategory(value.to_string()))
}

fn decode_field<T>(
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, ValidationError>
where
    T: for<'de> Deserialize<'de>,
{
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|err| ValidationError::InvalidField { field, reason: err.to_string() }),
    }
}

fn generated_component_id(kind: &str) -> Result<ComponentId, ValidationError> {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    ComponentId::new(format!("{kind}-{}", &suffix[..8])).map_err(ValidationError::InvalidComponentId)
}
