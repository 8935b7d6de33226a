//! Persistence seams consumed by the chat core.
//!
//! Each trait covers one collaborator. [`MemoryStore`] implements all of them
//! and backs the console driver and the tests.

mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ConversationId, Message, MessageId, NewNotification, Notification, NotificationId,
    PrivateConversation, PrivateMessage, Room, RoomDraft, RoomId, Topic, User, UserId,
};

pub use memory::MemoryStore;

/// Every persistence seam at once, as needed by the chat service.
pub trait ChatStore:
    IdentityStore + RoomStore + MessageStore + NotificationStore + ConversationStore
{
}

impl<T> ChatStore for T where
    T: IdentityStore + RoomStore + MessageStore + NotificationStore + ConversationStore
{
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<User>;

    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Exact, case-sensitive username lookup.
    async fn resolve_username(&self, username: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Returns the existing topic when one with the same name exists.
    async fn get_or_create_topic(&self, name: &str) -> Result<Topic>;

    async fn list_topics(&self) -> Result<Vec<Topic>>;

    async fn create_room(&self, host: UserId, draft: RoomDraft) -> Result<Room>;

    async fn room(&self, id: RoomId) -> Result<Option<Room>>;

    async fn update_room(&self, id: RoomId, draft: RoomDraft) -> Result<Room>;

    async fn delete_room(&self, id: RoomId) -> Result<()>;

    async fn add_participant(&self, room: RoomId, user: UserId) -> Result<()>;

    /// Rooms hosted by `host`, most recently updated first.
    async fn rooms_hosted_by(&self, host: UserId) -> Result<Vec<Room>>;

    /// Rooms whose topic name, name, or description contains `query`,
    /// ignoring case. Most recently updated first.
    async fn search_rooms(&self, query: &str) -> Result<Vec<Room>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, room: RoomId, author: UserId, body: &str) -> Result<Message>;

    async fn update_body(&self, id: MessageId, body: &str) -> Result<Message>;

    /// Replaces the mention association of a message.
    async fn set_mentions(&self, id: MessageId, users: &[UserId]) -> Result<()>;

    async fn message(&self, id: MessageId) -> Result<Option<Message>>;

    /// Messages of a room, oldest first.
    async fn room_messages(&self, room: RoomId) -> Result<Vec<Message>>;

    async fn delete_message(&self, id: MessageId) -> Result<()>;

    /// Messages written by `author` across all rooms, newest first.
    async fn messages_by(&self, author: UserId) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Fails with `DuplicateNotification` when the source message already
    /// notified the same recipient.
    async fn create(&self, notification: NewNotification) -> Result<Notification>;

    async fn exists_for_message(&self, message: MessageId, recipient: UserId) -> Result<bool>;

    /// Notifications for `recipient`, newest first.
    async fn list_for(&self, recipient: UserId) -> Result<Vec<Notification>>;

    async fn notification(&self, id: NotificationId) -> Result<Option<Notification>>;

    async fn mark_read(&self, id: NotificationId) -> Result<()>;

    /// Returns how many notifications flipped from unread to read.
    async fn mark_all_read(&self, recipient: UserId) -> Result<usize>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_conversation(&self, a: UserId, b: UserId)
    -> Result<Option<PrivateConversation>>;

    /// Returns the pair's existing conversation instead of creating a second one.
    async fn create_conversation(&self, a: UserId, b: UserId) -> Result<PrivateConversation>;

    async fn conversation(&self, id: ConversationId) -> Result<Option<PrivateConversation>>;

    /// Conversations involving `user`, most recently updated first.
    async fn conversations_for(&self, user: UserId) -> Result<Vec<PrivateConversation>>;

    /// Appends a message and bumps the conversation's `updated_at`.
    async fn append_private_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<PrivateMessage>;

    /// Messages of a conversation, oldest first.
    async fn private_messages(&self, conversation: ConversationId) -> Result<Vec<PrivateMessage>>;

    /// Marks every unread message addressed to `receiver` as read.
    async fn mark_private_read(&self, conversation: ConversationId, receiver: UserId)
    -> Result<usize>;

    async fn delete_conversation(&self, id: ConversationId) -> Result<()>;
}
