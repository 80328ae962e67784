// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) surface: a stdio JSON-RPC session dispatching to the
//! canvas, hub and code-generation tools.

pub mod envelope;
pub mod registry;
pub mod session;
pub mod tools;
pub mod types;

pub use registry::{RegistryError, ToolError, ToolRegistry};
pub use session::{serve_stdio, RpcSession, SessionError, SessionState};
pub use tools::Dispatcher;
