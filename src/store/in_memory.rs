//! In-memory conversation store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ConversationStore, StoreError, StoreResult};
use crate::domain::{Conversation, Message, Role};

struct ConversationRecord {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// In-memory conversation store. Contents are lost on restart.
#[derive(Clone)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<String, ConversationRecord>>>,
    /// 0 means unlimited
    max_messages_per_conversation: usize,
}

impl InMemoryConversationStore {
    pub fn new(max_messages_per_conversation: usize) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            max_messages_per_conversation,
        }
    }

    /// Drop everything (test isolation)
    pub async fn clear(&self) {
        self.conversations.write().await.clear();
    }
}

/// Conversations owned by `user_id`, most recently updated first
fn owned_by(conversations: &HashMap<String, ConversationRecord>, user_id: &str) -> Vec<Conversation> {
    let mut owned: Vec<Conversation> = conversations
        .values()
        .filter(|r| r.conversation.user_id == user_id)
        .map(|r| r.conversation.clone())
        .collect();

    owned.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    owned
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, user_id: &str, title: Option<String>) -> StoreResult<Conversation> {
        let conversation = Conversation::new(user_id, title);
        let mut conversations = self.conversations.write().await;
        conversations.insert(
            conversation.id.clone(),
            ConversationRecord {
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> StoreResult<Option<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(id).map(|r| r.conversation.clone()))
    }

    async fn list_conversations_for_user(&self, user_id: &str) -> StoreResult<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(owned_by(&conversations, user_id))
    }

    async fn latest_or_create(&self, user_id: &str) -> StoreResult<Conversation> {
        // Lookup and insert under one guard so racing first turns share a conversation
        let mut conversations = self.conversations.write().await;
        if let Some(latest) = owned_by(&conversations, user_id).into_iter().next() {
            return Ok(latest);
        }

        let conversation = Conversation::new(user_id, None);
        conversations.insert(
            conversation.id.clone(),
            ConversationRecord {
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        Ok(conversation)
    }

    async fn rename_conversation(&self, id: &str, title: String) -> StoreResult<Conversation> {
        let mut conversations = self.conversations.write().await;
        let record = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::conversation_not_found(id))?;

        record.conversation.title = title;
        record.conversation.updated_at = Utc::now();
        Ok(record.conversation.clone())
    }

    async fn delete_conversation(&self, id: &str) -> StoreResult<()> {
        let mut conversations = self.conversations.write().await;
        conversations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::conversation_not_found(id))
    }

    async fn add_message(&self, conversation_id: &str, content: &str, role: Role) -> StoreResult<Message> {
        let mut conversations = self.conversations.write().await;
        let record = conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::conversation_not_found(conversation_id))?;

        let message = Message::new(conversation_id, content, role);
        record.messages.push(message.clone());

        // Trim if exceeds max messages
        if self.max_messages_per_conversation > 0
            && record.messages.len() > self.max_messages_per_conversation
        {
            let remove_count = record.messages.len() - self.max_messages_per_conversation;
            record.messages.drain(0..remove_count);
        }

        record.conversation.message_count = record.messages.len();
        record.conversation.updated_at = message.created_at;
        Ok(message)
    }

    async fn list_messages(&self, conversation_id: &str) -> StoreResult<Vec<Message>> {
        let conversations = self.conversations.read().await;
        conversations
            .get(conversation_id)
            .map(|r| r.messages.clone())
            .ok_or_else(|| StoreError::conversation_not_found(conversation_id))
    }

    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> StoreResult<()> {
        let mut conversations = self.conversations.write().await;
        let record = conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::conversation_not_found(conversation_id))?;

        let before = record.messages.len();
        record.messages.retain(|m| m.id != message_id);
        if record.messages.len() == before {
            return Err(StoreError::message_not_found(message_id));
        }

        record.conversation.message_count = record.messages.len();
        Ok(())
    }
}
