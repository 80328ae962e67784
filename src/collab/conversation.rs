// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use async_trait::async_trait;

use super::{ChatReply, ChatTurn, CollaboratorError, ConversationalEngine};
use crate::model::ViewState;

/// Fallback engine used when no conversational backend is attached: acknowledges the
/// message and never proposes a canvas change.
#[derive(Debug, Clone, Default)]
pub struct EchoConversation;

#[async_trait]
impl ConversationalEngine for EchoConversation {
    async fn respond(
        &self,
        message: &str,
        snapshot: &ViewState,
        history: &[ChatTurn],
    ) -> Result<ChatReply, CollaboratorError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CollaboratorError::Rejected("empty chat message".to_owned()));
        }
        Ok(ChatReply {
            content: format!(
                "Received \"{message}\" ({} components on canvas, {} earlier turns). No conversational engine is attached, so the canvas was left as is.",
                snapshot.len(),
                history.len()
            ),
            ui_update: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_without_ui_update() {
        let reply = EchoConversation.respond("make it blue", &ViewState::new(), &[]).await.unwrap();
        assert!(reply.content.contains("make it blue"));
        assert!(reply.ui_update.is_none());
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let err = EchoConversation.respond("   ", &ViewState::new(), &[]).await.unwrap_err();
        assert_eq!(err, CollaboratorError::Rejected("empty chat message".to_owned()));
    }
}
