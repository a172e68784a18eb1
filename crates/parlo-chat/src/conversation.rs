// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store: the ordered message list shown to the user.
//!
//! Messages are immutable once appended, except for the delivery status of
//! user messages, which only moves forward (`sending -> delivered | error`).

use parlo_core::{DeliveryStatus, Message, MessageId, ParloError};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

/// Change notifications for observers (UIs, tests).
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    Appended(Message),
    StatusChanged {
        id: MessageId,
        status: DeliveryStatus,
    },
}

pub struct ConversationStore {
    messages: RwLock<Vec<Message>>,
    events: broadcast::Sender<ConversationEvent>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            messages: RwLock::new(Vec::new()),
            events,
        }
    }

    /// Appends a message at the end of the conversation.
    pub async fn append(&self, message: Message) {
        debug!(message_id = %message.id, sender = %message.sender, "appending message");
        self.messages.write().await.push(message.clone());
        let _ = self.events.send(ConversationEvent::Appended(message));
    }

    /// Updates the delivery status of a user message.
    ///
    /// Re-applying the current status is a no-op. Backward transitions are
    /// rejected and leave the message untouched.
    pub async fn set_status(&self, id: &MessageId, status: DeliveryStatus) -> Result<(), ParloError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| ParloError::Internal(format!("unknown message id {id}")))?;
        let current = message
            .status
            .ok_or_else(|| ParloError::Internal(format!("message {id} has no delivery status")))?;

        if current == status {
            return Ok(());
        }
        if !current.can_transition_to(status) {
            return Err(ParloError::InvalidTransition {
                from: current,
                to: status,
            });
        }
        message.status = Some(status);
        drop(messages);

        debug!(message_id = %id, %status, "status changed");
        let _ = self.events.send(ConversationEvent::StatusChanged {
            id: id.clone(),
            status,
        });
        Ok(())
    }

    pub async fn get(&self, id: &MessageId) -> Option<Message> {
        self.messages.read().await.iter().find(|m| &m.id == id).cloned()
    }

    /// Snapshot of the conversation in display order.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlo_core::Emotion;

    #[tokio::test]
    async fn append_preserves_order_and_notifies() {
        let store = ConversationStore::new();
        let mut events = store.subscribe();

        let user = Message::user("hola", vec![]);
        let bot = Message::bot("¡Hola!", Emotion::Happy);
        store.append(user.clone()).await;
        store.append(bot.clone()).await;

        let ids: Vec<_> = store.messages().await.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![user.id.clone(), bot.id.clone()]);
        assert_eq!(store.len().await, 2);
        assert_eq!(events.recv().await.unwrap(), ConversationEvent::Appended(user));
    }

    #[tokio::test]
    async fn status_moves_forward_only() {
        let store = ConversationStore::new();
        let user = Message::user("hola", vec![]);
        let id = user.id.clone();
        store.append(user).await;

        store.set_status(&id, DeliveryStatus::Delivered).await.unwrap();
        // Same status again is a no-op.
        store.set_status(&id, DeliveryStatus::Delivered).await.unwrap();

        let err = store
            .set_status(&id, DeliveryStatus::Sending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParloError::InvalidTransition {
                from: DeliveryStatus::Delivered,
                to: DeliveryStatus::Sending
            }
        ));
        let err = store.set_status(&id, DeliveryStatus::Error).await.unwrap_err();
        assert!(matches!(err, ParloError::InvalidTransition { .. }));
        assert_eq!(
            store.get(&id).await.unwrap().status,
            Some(DeliveryStatus::Delivered)
        );
    }

    #[tokio::test]
    async fn status_change_is_published() {
        let store = ConversationStore::new();
        let user = Message::user("hola", vec![]);
        let id = user.id.clone();
        store.append(user).await;
        let mut events = store.subscribe();

        store.set_status(&id, DeliveryStatus::Error).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            ConversationEvent::StatusChanged {
                id,
                status: DeliveryStatus::Error
            }
        );
    }

    #[tokio::test]
    async fn bot_messages_and_unknown_ids_have_no_status() {
        let store = ConversationStore::new();
        let bot = Message::bot("hola", Emotion::Neutral);
        let id = bot.id.clone();
        store.append(bot).await;

        assert!(store.set_status(&id, DeliveryStatus::Delivered).await.is_err());
        assert!(
            store
                .set_status(&MessageId("nope".into()), DeliveryStatus::Delivered)
                .await
                .is_err()
        );
    }
}
