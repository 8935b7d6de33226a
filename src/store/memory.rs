//! In-memory store backing every persistence trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::RwLock;

use crate::error::{ChatError, Result};
use crate::types::{
    ConversationId, Message, MessageId, NewNotification, Notification, NotificationId,
    PrivateConversation, PrivateMessage, PrivateMessageId, Room, RoomDraft, RoomId, Topic,
    TopicId, User, UserId,
};

use super::{ConversationStore, IdentityStore, MessageStore, NotificationStore, RoomStore};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    topics: Vec<Topic>,
    rooms: HashMap<RoomId, Room>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    conversations: HashMap<ConversationId, PrivateConversation>,
    private_messages: Vec<PrivateMessage>,
}

/// Thread-safe in-memory implementation of all store traits.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(ChatError::UsernameTaken(username.to_string()));
        }
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
        };
        state.users.insert(user.id, user.clone());
        debug!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn resolve_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.state.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get_or_create_topic(&self, name: &str) -> Result<Topic> {
        let mut state = self.state.write().await;
        if let Some(topic) = state.topics.iter().find(|t| t.name == name) {
            return Ok(topic.clone());
        }
        let topic = Topic {
            id: TopicId::new(),
            name: name.to_string(),
        };
        state.topics.push(topic.clone());
        Ok(topic)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.state.read().await.topics.clone())
    }

    async fn create_room(&self, host: UserId, draft: RoomDraft) -> Result<Room> {
        let now = Utc::now();
        let room = Room {
            id: RoomId::new(),
            name: draft.name,
            description: draft.description,
            host: Some(host),
            topic: draft.topic,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state
            .write()
            .await
            .rooms
            .insert(room.id, room.clone());
        Ok(room)
    }

    async fn room(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.state.read().await.rooms.get(&id).cloned())
    }

    async fn update_room(&self, id: RoomId, draft: RoomDraft) -> Result<Room> {
        let mut state = self.state.write().await;
        let room = state
            .rooms
            .get_mut(&id)
            .ok_or_else(|| ChatError::not_found("room", id))?;
        room.name = draft.name;
        room.description = draft.description;
        room.topic = draft.topic;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&self, id: RoomId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.rooms.remove(&id).is_none() {
            return Err(ChatError::not_found("room", id));
        }
        state.messages.retain(|m| m.room != id);
        for notification in &mut state.notifications {
            if notification.room == Some(id) {
                notification.room = None;
            }
        }
        Ok(())
    }

    async fn add_participant(&self, room: RoomId, user: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        let room = state
            .rooms
            .get_mut(&room)
            .ok_or_else(|| ChatError::not_found("room", room))?;
        if !room.participants.contains(&user) {
            room.participants.push(user);
        }
        Ok(())
    }

    async fn rooms_hosted_by(&self, host: UserId) -> Result<Vec<Room>> {
        let state = self.state.read().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|room| room.host == Some(host))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn search_rooms(&self, query: &str) -> Result<Vec<Room>> {
        let state = self.state.read().await;
        let needle = query.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|room| {
                let topic_hit = room
                    .topic
                    .and_then(|id| state.topics.iter().find(|t| t.id == id))
                    .is_some_and(|t| contains(&t.name));
                topic_hit
                    || contains(&room.name)
                    || room.description.as_deref().is_some_and(contains)
            })
            .cloned()
            .collect();
        rooms.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rooms)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, room: RoomId, author: UserId, body: &str) -> Result<Message> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let target = state
            .rooms
            .get_mut(&room)
            .ok_or_else(|| ChatError::not_found("room", room))?;
        target.updated_at = now;

        let message = Message {
            id: MessageId::new(),
            room,
            author,
            body: body.to_string(),
            mentions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn update_body(&self, id: MessageId, body: &str) -> Result<Message> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ChatError::not_found("message", id))?;
        message.body = body.to_string();
        message.updated_at = Utc::now();
        Ok(message.clone())
    }

    async fn set_mentions(&self, id: MessageId, users: &[UserId]) -> Result<()> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ChatError::not_found("message", id))?;
        message.mentions = users.to_vec();
        Ok(())
    }

    async fn message(&self, id: MessageId) -> Result<Option<Message>> {
        let state = self.state.read().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn room_messages(&self, room: RoomId) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.room == room)
            .cloned()
            .collect())
    }

    async fn delete_message(&self, id: MessageId) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() == before {
            return Err(ChatError::not_found("message", id));
        }
        Ok(())
    }

    async fn messages_by(&self, author: UserId) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| m.author == author)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let mut state = self.state.write().await;
        if let Some(message) = new.source_message {
            let duplicate = state
                .notifications
                .iter()
                .any(|n| n.source_message == Some(message) && n.recipient == new.recipient);
            if duplicate {
                return Err(ChatError::DuplicateNotification {
                    message: message.to_string(),
                    recipient: new.recipient.to_string(),
                });
            }
        }

        let notification = Notification {
            id: NotificationId::new(),
            recipient: new.recipient,
            sender: new.sender,
            kind: new.kind,
            body: new.body,
            room: new.room,
            source_message: new.source_message,
            is_read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn exists_for_message(&self, message: MessageId, recipient: UserId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .any(|n| n.source_message == Some(message) && n.recipient == recipient))
    }

    async fn list_for(&self, recipient: UserId) -> Result<Vec<Notification>> {
        let state = self.state.read().await;
        // Stored in insertion order, so reversing yields newest first.
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect())
    }

    async fn notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        let state = self.state.read().await;
        Ok(state.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        let mut state = self.state.write().await;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ChatError::not_found("notification", id))?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut flipped = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient == recipient && !n.is_read)
        {
            notification.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<PrivateConversation>> {
        let state = self.state.read().await;
        Ok(state
            .conversations
            .values()
            .find(|c| c.other_participant(a) == Some(b))
            .cloned())
    }

    async fn create_conversation(&self, a: UserId, b: UserId) -> Result<PrivateConversation> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .conversations
            .values()
            .find(|c| c.other_participant(a) == Some(b))
        {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let conversation = PrivateConversation {
            id: ConversationId::new(),
            participants: [a, b],
            created_at: now,
            updated_at: now,
        };
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn conversation(&self, id: ConversationId) -> Result<Option<PrivateConversation>> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn conversations_for(&self, user: UserId) -> Result<Vec<PrivateConversation>> {
        let state = self.state.read().await;
        let mut conversations: Vec<PrivateConversation> = state
            .conversations
            .values()
            .filter(|c| c.involves(user))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn append_private_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<PrivateMessage> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let target = state
            .conversations
            .get_mut(&conversation)
            .ok_or_else(|| ChatError::not_found("conversation", conversation))?;
        target.updated_at = now;

        let message = PrivateMessage {
            id: PrivateMessageId::new(),
            conversation,
            sender,
            receiver,
            content: content.to_string(),
            is_read: false,
            created_at: now,
        };
        state.private_messages.push(message.clone());
        Ok(message)
    }

    async fn private_messages(&self, conversation: ConversationId) -> Result<Vec<PrivateMessage>> {
        let state = self.state.read().await;
        Ok(state
            .private_messages
            .iter()
            .filter(|m| m.conversation == conversation)
            .cloned()
            .collect())
    }

    async fn mark_private_read(
        &self,
        conversation: ConversationId,
        receiver: UserId,
    ) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut flipped = 0;
        for message in state
            .private_messages
            .iter_mut()
            .filter(|m| m.conversation == conversation && m.receiver == receiver && !m.is_read)
        {
            message.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.conversations.remove(&id).is_none() {
            return Err(ChatError::not_found("conversation", id));
        }
        state.private_messages.retain(|m| m.conversation != id);
        Ok(())
    }
}
