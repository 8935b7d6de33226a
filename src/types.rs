//! Common types used throughout roomchat.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(
    /// Identifier of a registered user.
    UserId
);
id_type!(
    /// Identifier of a topic.
    TopicId
);
id_type!(
    /// Identifier of a chat room.
    RoomId
);
id_type!(
    /// Identifier of a room message.
    MessageId
);
id_type!(
    /// Identifier of a notification.
    NotificationId
);
id_type!(
    /// Identifier of a private conversation.
    ConversationId
);
id_type!(
    /// Identifier of a private message.
    PrivateMessageId
);

/// Role of a message in a text-generation request.
///
/// Maps to OpenRouter API message roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the human user
    User,
    /// Message from the AI assistant
    Assistant,
    /// System prompt or instructions
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
}

/// A named container of messages.
///
/// Participants grow as users post; only the host may edit or delete the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: Option<String>,
    pub host: Option<UserId>,
    pub topic: Option<TopicId>,
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable room fields, shared by create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomDraft {
    pub name: String,
    pub description: Option<String>,
    pub topic: Option<TopicId>,
}

/// A message posted in a room.
///
/// `mentions` always holds exactly the resolvable usernames found in `body`,
/// minus the author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room: RoomId,
    pub author: UserId,
    pub body: String,
    pub mentions: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Mention,
    Message,
    Follow,
    Like,
}

/// A durable record informing a user of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub sender: UserId,
    pub kind: NotificationKind,
    pub body: String,
    pub room: Option<RoomId>,
    pub source_message: Option<MessageId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a notification; the store assigns the rest.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: UserId,
    pub sender: UserId,
    pub kind: NotificationKind,
    pub body: String,
    pub room: Option<RoomId>,
    pub source_message: Option<MessageId>,
}

/// A two-party private conversation. Participant order carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateConversation {
    pub id: ConversationId,
    pub participants: [UserId; 2],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrivateConversation {
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    /// The participant that is not `user`, if `user` takes part at all.
    #[must_use]
    pub fn other_participant(&self, user: UserId) -> Option<UserId> {
        match self.participants {
            [a, b] if a == user => Some(b),
            [a, b] if b == user => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: PrivateMessageId,
    pub conversation: ConversationId,
    pub sender: UserId,
    pub receiver: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_uses_lowercase_names() {
        assert_eq!(NotificationKind::Mention.to_string(), "mention");
        assert_eq!(
            "like".parse::<NotificationKind>(),
            Ok(NotificationKind::Like)
        );
    }

    #[test]
    fn other_participant_is_symmetric() {
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = PrivateConversation {
            id: ConversationId::new(),
            participants: [a, b],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(conversation.other_participant(a), Some(b));
        assert_eq!(conversation.other_participant(b), Some(a));
        assert_eq!(conversation.other_participant(UserId::new()), None);
    }
}
