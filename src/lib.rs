// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! vibecanvas: a live design canvas shared between an AI agent and browsers.
//!
//! The agent speaks MCP over stdio ([`mcp`]); browsers connect to the WebSocket
//! [`hub`]. Both mutate one [`model::ViewState`], and every agent-originated change
//! passes the [`validate`] gate before [`ops`] applies it.

pub mod collab;
pub mod config;
pub mod hub;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod validate;
