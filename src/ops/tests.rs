// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::{
    Category, Component, ComponentId, Layout, Position, PropertyBag, PropertyValue, Size,
    ViewState,
};

use super::{apply_ops, ApplyError, ComponentPatch, Op};

fn cid(value: &str) -> ComponentId {
    ComponentId::new(value).expect("component id")
}

fn button(id: &str, text: &str) -> Component {
    let mut component = Component::new(cid(id), "button", Category::Atom);
    component.properties.insert("text".to_owned(), text.into());
    component
}

fn seeded_state() -> ViewState {
    let mut state = ViewState::new();
    apply_ops(&mut state, &[Op::AddComponent(button("b1", "Go"))]).expect("seed");
    state
}

#[test]
fn add_component_grows_state_and_reports_delta() {
    let mut state = ViewState::new();

    let result = apply_ops(&mut state, &[Op::AddComponent(button("b1", "Go"))]).expect("apply");

    assert_eq!(result.applied, 1);
    assert_eq!(result.delta.added, vec!["b1".to_owned()]);
    assert!(result.delta.updated.is_empty());
    assert_eq!(state.len(), 1);
}

#[test]
fn add_existing_id_fails_without_touching_state() {
    let mut state = seeded_state();
    let before = serde_json::to_string(&state).unwrap();

    let err = apply_ops(&mut state, &[Op::AddComponent(button("b1", "Other"))]).unwrap_err();

    assert_eq!(err, ApplyError::AlreadyExists(cid("b1")));
    assert_eq!(serde_json::to_string(&state).unwrap(), before);
}

#[test]
fn remove_missing_id_is_an_error_and_count_is_unchanged() {
    let mut state = seeded_state();

    let err = apply_ops(&mut state, &[Op::RemoveComponent { id: cid("nope") }]).unwrap_err();

    assert_eq!(err.to_string(), "component 'nope' not found");
    assert_eq!(state.len(), 1);
}

#[test]
fn update_merges_properties_and_replaces_geometry() {
    let mut state = seeded_state();
    let mut properties = PropertyBag::new();
    properties.insert("variant".to_owned(), "primary".into());

    let patch = ComponentPatch {
        properties: Some(properties),
        position: Some(Position { x: 10.0, y: 20.0 }),
        size: Some(Size { w: 120.0, h: 40.0 }),
        ..ComponentPatch::default()
    };
    let result =
        apply_ops(&mut state, &[Op::UpdateComponent { id: cid("b1"), patch }]).expect("apply");

    assert_eq!(result.delta.updated, vec!["b1".to_owned()]);
    let component = state.component("b1").unwrap();
    assert_eq!(component.properties.get("text"), Some(&PropertyValue::from("Go")));
    assert_eq!(component.properties.get("variant"), Some(&PropertyValue::from("primary")));
    assert_eq!(component.position, Position { x: 10.0, y: 20.0 });
    assert_eq!(component.size, Size { w: 120.0, h: 40.0 });
}

#[test]
fn noop_update_is_not_reported() {
    let mut state = seeded_state();
    let patch = ComponentPatch { kind: Some("button".to_owned()), ..ComponentPatch::default() };

    let result =
        apply_ops(&mut state, &[Op::UpdateComponent { id: cid("b1"), patch }]).expect("apply");

    assert!(result.delta.is_empty());
}

#[test]
fn failing_op_rolls_back_the_whole_batch() {
    let mut state = seeded_state();

    let err = apply_ops(
        &mut state,
        &[Op::AddComponent(button("b2", "Second")), Op::RemoveComponent { id: cid("ghost") }],
    )
    .unwrap_err();

    assert_eq!(err, ApplyError::NotFound(cid("ghost")));
    assert!(!state.contains("b2"));
    assert_eq!(state.len(), 1);
}

#[test]
fn add_then_remove_in_one_batch_cancels_out() {
    let mut state = ViewState::new();

    let result = apply_ops(
        &mut state,
        &[Op::AddComponent(button("tmp", "x")), Op::RemoveComponent { id: cid("tmp") }],
    )
    .expect("apply");

    assert!(result.delta.added.is_empty());
    assert!(result.delta.removed.is_empty());
    assert!(state.is_empty());
}

#[test]
fn theme_and_layout_updates_set_flags() {
    let mut state = ViewState::new();
    let mut tokens = BTreeMap::new();
    tokens.insert("primaryColor".to_owned(), PropertyValue::from("#3366ff"));
    tokens.insert("borderRadius".to_owned(), PropertyValue::Int(8));

    let result = apply_ops(
        &mut state,
        &[
            Op::UpdateTheme(tokens.clone()),
            Op::UpdateLayout(Layout { grid: Some(12.0), ..Layout::default() }),
        ],
    )
    .expect("apply");

    assert!(result.delta.theme_changed);
    assert!(result.delta.layout_changed);
    assert_eq!(state.theme().token("primaryColor").and_then(PropertyValue::as_str), Some("#3366ff"));
    assert_eq!(state.theme().token("borderRadius"), Some(&PropertyValue::Int(8)));

    let again = apply_ops(&mut state, &[Op::UpdateTheme(tokens)]).expect("apply");
    assert!(!again.delta.theme_changed);
}

#[test]
fn update_cannot_strip_a_required_property() {
    let mut state = seeded_state();
    let before = serde_json::to_string(&state).unwrap();
    let mut properties = PropertyBag::new();
    properties.insert("text".to_owned(), PropertyValue::Null);
    let patch = ComponentPatch { properties: Some(properties), ..ComponentPatch::default() };

    let err =
        apply_ops(&mut state, &[Op::UpdateComponent { id: cid("b1"), patch }]).unwrap_err();

    assert_eq!(
        err,
        ApplyError::MissingProperty { id: cid("b1"), kind: "button".to_owned(), property: "text" }
    );
    assert_eq!(serde_json::to_string(&state).unwrap(), before);
}

#[test]
fn retype_must_bring_the_new_kind_required_properties() {
    let mut state = ViewState::new();
    let container = Component::new(cid("c1"), "container", Category::Molecule);
    apply_ops(&mut state, &[Op::AddComponent(container)]).expect("seed");

    let retype = ComponentPatch { kind: Some("image".to_owned()), ..ComponentPatch::default() };
    let err = apply_ops(&mut state, &[Op::UpdateComponent { id: cid("c1"), patch: retype }])
        .unwrap_err();
    assert_eq!(
        err,
        ApplyError::MissingProperty { id: cid("c1"), kind: "image".to_owned(), property: "src" }
    );
    assert_eq!(state.component("c1").map(|c| c.kind.as_str()), Some("container"));

    let mut properties = PropertyBag::new();
    properties.insert("src".to_owned(), "/hero.png".into());
    properties.insert("alt".to_owned(), "Hero".into());
    let complete = ComponentPatch {
        kind: Some("image".to_owned()),
        properties: Some(properties),
        ..ComponentPatch::default()
    };
    apply_ops(&mut state, &[Op::UpdateComponent { id: cid("c1"), patch: complete }])
        .expect("retype with required properties");
    assert_eq!(state.component("c1").map(|c| c.kind.as_str()), Some("image"));
}

#[test]
fn geometry_only_update_is_not_held_to_the_property_table() {
    let mut state: ViewState = serde_json::from_value(serde_json::json!({
        "components": [{"id": "b9", "type": "button", "category": "atom"}]
    }))
    .unwrap();
    let patch =
        ComponentPatch { position: Some(Position { x: 4.0, y: 2.0 }), ..ComponentPatch::default() };

    apply_ops(&mut state, &[Op::UpdateComponent { id: cid("b9"), patch }]).expect("move");

    assert_eq!(state.component("b9").unwrap().position, Position { x: 4.0, y: 2.0 });
}
