// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canvas data model.
//!
//! A [`ViewState`] holds the placed components plus theme, layout and viewport. Both the
//! agent-facing tools and the browser hub mutate the same instance.

pub mod ids;
pub mod kinds;
pub mod property;
pub mod view_state;

pub use ids::{ClientId, ComponentId, Id, IdError};
pub use kinds::{is_known_kind, required_properties, COMPONENT_KINDS};
pub use property::{merge_bag, PropertyBag, PropertyValue};
pub use view_state::{
    Canvas, Category, Component, DuplicateComponentId, Layout, ParseCategoryError, Position,
    Size, Theme, ViewState,
};
