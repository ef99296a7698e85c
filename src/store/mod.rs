//! Conversation storage
//!
//! The orchestrator only appends turns and looks up a user's conversations;
//! the HTTP layer uses the rest for conversation CRUD.

mod error;
mod in_memory;

pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryConversationStore;

use async_trait::async_trait;

use crate::domain::{Conversation, Message, Role};

/// Trait for conversation storage backends
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, user_id: &str, title: Option<String>) -> StoreResult<Conversation>;

    async fn get_conversation(&self, id: &str) -> StoreResult<Option<Conversation>>;

    /// Conversations owned by `user_id`, most recently updated first
    async fn list_conversations_for_user(&self, user_id: &str) -> StoreResult<Vec<Conversation>>;

    async fn rename_conversation(&self, id: &str, title: String) -> StoreResult<Conversation>;

    async fn delete_conversation(&self, id: &str) -> StoreResult<()>;

    /// Append a turn. Appends to one conversation are serialized by the store.
    async fn add_message(&self, conversation_id: &str, content: &str, role: Role) -> StoreResult<Message>;

    /// Messages in append order
    async fn list_messages(&self, conversation_id: &str) -> StoreResult<Vec<Message>>;

    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> StoreResult<()>;

    /// The user's most recently updated conversation, or a new one
    async fn latest_or_create(&self, user_id: &str) -> StoreResult<Conversation> {
        match self.list_conversations_for_user(user_id).await?.into_iter().next() {
            Some(conversation) => Ok(conversation),
            None => self.create_conversation(user_id, None).await,
        }
    }
}
