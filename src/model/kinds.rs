// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Component kinds the agent may place and the properties each kind must carry.

use super::view_state::Component;

/// Component kinds an `add_component` may introduce.
pub const COMPONENT_KINDS: [&str; 18] = [
    "badge",
    "button",
    "card",
    "container",
    "footer",
    "form",
    "gallery",
    "header",
    "heading",
    "hero",
    "icon",
    "image",
    "input",
    "list",
    "modal",
    "navigation",
    "table",
    "text",
];

/// Kinds without a row have no required properties.
const REQUIRED_PROPERTIES: [(&str, &[&str]); 10] = [
    ("button", &["text"]),
    ("card", &["title", "content"]),
    ("form", &["title", "fields", "submitText"]),
    ("gallery", &["title", "images", "columns"]),
    ("heading", &["text"]),
    ("hero", &["title", "subtitle", "ctaText"]),
    ("image", &["src", "alt"]),
    ("input", &["placeholder", "type"]),
    ("navigation", &["items"]),
    ("text", &["content"]),
];

pub fn required_properties(kind: &str) -> &'static [&'static str] {
    REQUIRED_PROPERTIES
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, properties)| *properties)
        .unwrap_or(&[])
}

pub fn is_known_kind(kind: &str) -> bool {
    COMPONENT_KINDS.contains(&kind)
}

impl Component {
    /// First property the component's kind requires that is absent or null.
    pub fn missing_required_property(&self) -> Option<&'static str> {
        required_properties(&self.kind)
            .iter()
            .copied()
            .find(|property| self.properties.get(*property).map_or(true, |value| value.is_null()))
    }
}
