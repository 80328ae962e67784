// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::ComponentId;
use super::property::{PropertyBag, PropertyValue};

/// Atomic-design tier of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Atom,
    Molecule,
    Organism,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Atom, Category::Molecule, Category::Organism];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atom => "atom",
            Self::Molecule => "molecule",
            Self::Organism => "organism",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected atom, molecule or organism)")]
pub struct ParseCategoryError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self { w: 200.0, h: 80.0 }
    }
}

/// One placed element on the canvas.
///
/// Keys the model does not know (`locked`, `zIndex`, ...) are carried in `extra` so a
/// browser's snapshot survives a decode and re-encode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: Category,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<PropertyBag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    pub fn new(id: ComponentId, kind: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            kind: kind.into(),
            category,
            properties: PropertyBag::new(),
            position: Position::default(),
            size: Size::default(),
            style: None,
            extra: Map::new(),
        }
    }
}

/// Named design tokens, typically colors (`primaryColor -> #3366ff`) but also scalar
/// sizes such as `borderRadius -> 8`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub BTreeMap<String, PropertyValue>);

impl Theme {
    pub fn token(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Number of grid columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_padding: Option<[f64; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    /// Overlays every field set in `patch`; returns whether anything changed.
    pub fn apply(&mut self, patch: Layout) -> bool {
        let before = self.clone();
        if patch.grid.is_some() {
            self.grid = patch.grid;
        }
        if patch.row_height.is_some() {
            self.row_height = patch.row_height;
        }
        if patch.margin.is_some() {
            self.margin = patch.margin;
        }
        if patch.container_padding.is_some() {
            self.container_padding = patch.container_padding;
        }
        self.extra.extend(patch.extra);
        *self != before
    }
}

/// Visible viewport of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self { width: 1200.0, height: 800.0, zoom: 1.0 }
    }
}

/// The canonical canvas snapshot shared by the agent and every browser.
///
/// Component ids are unique; decoding a payload with duplicate ids fails, so a value of this
/// type always upholds that invariant. Top-level keys outside the known sections (a
/// browser's `selection`, say) are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawViewState")]
pub struct ViewState {
    components: Vec<Component>,
    theme: Theme,
    layout: Layout,
    canvas: Canvas,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawViewState {
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    layout: Layout,
    #[serde(default)]
    canvas: Canvas,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate component id '{0}'")]
pub struct DuplicateComponentId(pub String);

impl TryFrom<RawViewState> for ViewState {
    type Error = DuplicateComponentId;

    fn try_from(raw: RawViewState) -> Result<Self, Self::Error> {
        let mut seen = BTreeSet::new();
        for component in &raw.components {
            if !seen.insert(component.id.as_str()) {
                return Err(DuplicateComponentId(component.id.as_str().to_owned()));
            }
        }
        Ok(Self {
            components: raw.components,
            theme: raw.theme,
            layout: raw.layout,
            canvas: raw.canvas,
            extra: raw.extra,
        })
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.id.as_str() == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|component| component.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.component(id).is_some()
    }

    /// Appends `component` unless its id is taken; hands the component back on conflict.
    pub fn insert(&mut self, component: Component) -> Result<(), Component> {
        if self.contains(component.id.as_str()) {
            return Err(component);
        }
        self.components.push(component);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Component> {
        let index = self.components.iter().position(|component| component.id.as_str() == id)?;
        Some(self.components.remove(index))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Top-level keys carried through from the last browser snapshot.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(value: &str) -> ComponentId {
        ComponentId::new(value).expect("component id")
    }

    #[test]
    fn empty_state_serializes_with_all_sections() {
        let json = serde_json::to_value(ViewState::new()).unwrap();
        assert_eq!(json["components"], serde_json::json!([]));
        assert_eq!(json["theme"], serde_json::json!({}));
        assert_eq!(json["layout"], serde_json::json!({}));
        assert_eq!(json["canvas"]["zoom"], serde_json::json!(1.0));
    }

    #[test]
    fn decoding_rejects_duplicate_component_ids() {
        let err = serde_json::from_value::<ViewState>(serde_json::json!({
            "components": [
                {"id": "a", "type": "button", "category": "atom"},
                {"id": "a", "type": "card", "category": "molecule"}
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("duplicate component id 'a'"));
    }

    #[test]
    fn decoding_fills_defaults_for_missing_sections() {
        let state: ViewState = serde_json::from_value(serde_json::json!({
            "components": [{"id": "hero-1", "type": "hero", "category": "organism"}]
        }))
        .unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.canvas(), &Canvas::default());
        let hero = state.component("hero-1").unwrap();
        assert_eq!(hero.size, Size::default());
        assert_eq!(hero.category, Category::Organism);
    }

    #[test]
    fn insert_refuses_taken_ids() {
        let mut state = ViewState::new();
        state.insert(Component::new(cid("b1"), "button", Category::Atom)).unwrap();
        let rejected = state.insert(Component::new(cid("b1"), "card", Category::Molecule));
        assert!(rejected.is_err());
        assert_eq!(state.len(), 1);
        assert_eq!(state.remove("b1").map(|c| c.kind), Some("button".to_owned()));
        assert!(state.is_empty());
    }

    #[test]
    fn layout_apply_reports_changes_only() {
        let mut layout = Layout { grid: Some(12.0), ..Layout::default() };
        assert!(!layout.apply(Layout { grid: Some(12.0), ..Layout::default() }));
        assert!(layout.apply(Layout { row_height: Some(40.5), ..Layout::default() }));
        assert_eq!(layout.grid, Some(12.0));
        assert_eq!(layout.row_height, Some(40.5));
    }

    #[test]
    fn unknown_keys_survive_a_decode_and_encode() {
        let pushed = serde_json::json!({
            "components": [{
                "id": "a",
                "type": "button",
                "category": "atom",
                "properties": {"text": "Go"},
                "position": {"x": 10.0, "y": 20.0},
                "size": {"w": 120.0, "h": 40.0},
                "locked": true,
                "zIndex": 3
            }],
            "theme": {"primaryColor": "#3366ff", "borderRadius": 8},
            "layout": {"grid": 12.0, "rowHeight": 30.5, "compact": true},
            "canvas": {"width": 1440.0, "height": 900.0, "zoom": 1.25},
            "selection": ["a"]
        });

        let state: ViewState = serde_json::from_value(pushed.clone()).unwrap();
        assert_eq!(state.extra()["selection"], serde_json::json!(["a"]));
        assert_eq!(state.component("a").unwrap().extra["zIndex"], serde_json::json!(3));
        assert_eq!(state.theme().token("borderRadius"), Some(&PropertyValue::Int(8)));
        assert_eq!(state.layout().row_height, Some(30.5));
        assert_eq!(serde_json::to_value(&state).unwrap(), pushed);
    }

    #[test]
    fn partial_canvas_and_position_fill_defaults() {
        let state: ViewState = serde_json::from_value(serde_json::json!({
            "components": [{"id": "a", "type": "button", "category": "atom", "position": {"x": 5}}],
            "canvas": {"zoom": 2.0}
        }))
        .unwrap();
        assert_eq!(state.canvas(), &Canvas { zoom: 2.0, ..Canvas::default() });
        assert_eq!(state.component("a").unwrap().position, Position { x: 5.0, y: 0.0 });
    }

    #[test]
    fn category_parses_known_tiers_only() {
        assert_eq!("molecule".parse::<Category>(), Ok(Category::Molecule));
        assert!("template".parse::<Category>().is_err());
    }
}
