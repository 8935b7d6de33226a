//! Two-party private conversations.

use log::{debug, info};
use serde::Serialize;

use crate::error::{ChatError, Result};
use crate::store::{ConversationStore, IdentityStore};
use crate::types::{ConversationId, PrivateConversation, PrivateMessage, User, UserId};

/// One inbox row.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub conversation: PrivateConversation,
    pub other_user: Option<User>,
    pub last_message: Option<PrivateMessage>,
    pub unread_count: usize,
}

/// A conversation as seen by one participant after opening it.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation: PrivateConversation,
    pub other_user: User,
    pub messages: Vec<PrivateMessage>,
}

/// Existing conversation between `me` and `other`, or a new one.
pub async fn open_conversation<S>(
    store: &S,
    me: UserId,
    other: UserId,
) -> Result<PrivateConversation>
where
    S: ConversationStore + IdentityStore + ?Sized,
{
    if me == other {
        return Err(ChatError::Invalid(
            "you can't start a conversation with yourself".to_string(),
        ));
    }
    if store.user(other).await?.is_none() {
        return Err(ChatError::not_found("user", other));
    }

    if let Some(conversation) = store.find_conversation(me, other).await? {
        return Ok(conversation);
    }
    let conversation = store.create_conversation(me, other).await?;
    debug!("Started conversation {} between {me} and {other}", conversation.id);
    Ok(conversation)
}

pub async fn send_private_message<S>(
    store: &S,
    sender: UserId,
    receiver: UserId,
    content: &str,
) -> Result<PrivateMessage>
where
    S: ConversationStore + IdentityStore + ?Sized,
{
    let content = content.trim();
    if content.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    let conversation = open_conversation(store, sender, receiver).await?;
    let message = store
        .append_private_message(conversation.id, sender, receiver, content)
        .await?;
    info!("Private message from {sender} to {receiver}");
    Ok(message)
}

/// Loads the conversation with `other` and marks everything sent to `viewer` as read.
pub async fn view_conversation<S>(
    store: &S,
    viewer: UserId,
    other: UserId,
) -> Result<ConversationView>
where
    S: ConversationStore + IdentityStore + ?Sized,
{
    let conversation = open_conversation(store, viewer, other).await?;
    let other_user = store
        .user(other)
        .await?
        .ok_or_else(|| ChatError::not_found("user", other))?;

    let flipped = store.mark_private_read(conversation.id, viewer).await?;
    if flipped > 0 {
        debug!("Marked {flipped} private message(s) read for {viewer}");
    }
    let messages = store.private_messages(conversation.id).await?;

    Ok(ConversationView {
        conversation,
        other_user,
        messages,
    })
}

/// All conversations of `user`, most recently active first.
pub async fn inbox<S>(store: &S, user: UserId) -> Result<Vec<ConversationSummary>>
where
    S: ConversationStore + IdentityStore + ?Sized,
{
    let mut summaries = Vec::new();
    for conversation in store.conversations_for(user).await? {
        let messages = store.private_messages(conversation.id).await?;
        let unread_count = messages
            .iter()
            .filter(|m| m.receiver == user && !m.is_read)
            .count();
        let other_user = match conversation.other_participant(user) {
            Some(other) => store.user(other).await?,
            None => None,
        };

        summaries.push(ConversationSummary {
            last_message: messages.into_iter().next_back(),
            conversation,
            other_user,
            unread_count,
        });
    }
    Ok(summaries)
}

/// Deletes a conversation. Non-participants see it as missing.
pub async fn delete_conversation<S>(store: &S, actor: UserId, id: ConversationId) -> Result<()>
where
    S: ConversationStore + ?Sized,
{
    match store.conversation(id).await? {
        Some(conversation) if conversation.involves(actor) => store.delete_conversation(id).await,
        _ => Err(ChatError::not_found("conversation", id)),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    /// Lookups always miss, as when two senders race past the check.
    struct StaleLookup(MemoryStore);

    #[async_trait]
    impl IdentityStore for StaleLookup {
        async fn create_user(&self, username: &str) -> Result<User> {
            self.0.create_user(username).await
        }

        async fn user(&self, id: UserId) -> Result<Option<User>> {
            self.0.user(id).await
        }

        async fn resolve_username(&self, username: &str) -> Result<Option<User>> {
            self.0.resolve_username(username).await
        }

        async fn list_users(&self) -> Result<Vec<User>> {
            self.0.list_users().await
        }
    }

    #[async_trait]
    impl ConversationStore for StaleLookup {
        async fn find_conversation(
            &self,
            _: UserId,
            _: UserId,
        ) -> Result<Option<PrivateConversation>> {
            tokio::task::yield_now().await;
            Ok(None)
        }

        async fn create_conversation(&self, a: UserId, b: UserId) -> Result<PrivateConversation> {
            self.0.create_conversation(a, b).await
        }

        async fn conversation(&self, id: ConversationId) -> Result<Option<PrivateConversation>> {
            self.0.conversation(id).await
        }

        async fn conversations_for(&self, user: UserId) -> Result<Vec<PrivateConversation>> {
            self.0.conversations_for(user).await
        }

        async fn append_private_message(
            &self,
            conversation: ConversationId,
            sender: UserId,
            receiver: UserId,
            content: &str,
        ) -> Result<PrivateMessage> {
            self.0
                .append_private_message(conversation, sender, receiver, content)
                .await
        }

        async fn private_messages(
            &self,
            conversation: ConversationId,
        ) -> Result<Vec<PrivateMessage>> {
            self.0.private_messages(conversation).await
        }

        async fn mark_private_read(
            &self,
            conversation: ConversationId,
            receiver: UserId,
        ) -> Result<usize> {
            self.0.mark_private_read(conversation, receiver).await
        }

        async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
            self.0.delete_conversation(id).await
        }
    }

    async fn pair(store: &MemoryStore) -> (User, User) {
        (
            store.create_user("alice").await.unwrap(),
            store.create_user("bob").await.unwrap(),
        )
    }

    #[tokio::test]
    async fn conversation_is_shared_by_both_directions() {
        let store = MemoryStore::new();
        let (alice, bob) = pair(&store).await;

        let first = open_conversation(&store, alice.id, bob.id).await.unwrap();
        let second = open_conversation(&store, bob.id, alice.id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn concurrent_first_messages_share_one_conversation() {
        let store = StaleLookup(MemoryStore::new());
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();

        let (to_bob, to_alice) = tokio::join!(
            send_private_message(&store, alice.id, bob.id, "hi bob"),
            send_private_message(&store, bob.id, alice.id, "hi alice"),
        );
        let (to_bob, to_alice) = (to_bob.unwrap(), to_alice.unwrap());

        assert_eq!(to_bob.conversation, to_alice.conversation);
        let rows = inbox(&store, alice.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].unread_count, 1);
    }

    #[tokio::test]
    async fn viewing_marks_only_incoming_messages_read() {
        let store = MemoryStore::new();
        let (alice, bob) = pair(&store).await;
        send_private_message(&store, alice.id, bob.id, "hi bob").await.unwrap();
        send_private_message(&store, bob.id, alice.id, "hi alice").await.unwrap();
        send_private_message(&store, alice.id, bob.id, "still there?").await.unwrap();

        let rows = inbox(&store, bob.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].unread_count, 2);
        assert_eq!(rows[0].other_user.as_ref().unwrap().username, "alice");
        assert_eq!(rows[0].last_message.as_ref().unwrap().content, "still there?");

        let view = view_conversation(&store, bob.id, alice.id).await.unwrap();
        assert_eq!(view.messages.len(), 3);
        assert!(view.messages.iter().filter(|m| m.receiver == bob.id).all(|m| m.is_read));
        assert!(!view.messages.iter().find(|m| m.receiver == alice.id).unwrap().is_read);

        assert_eq!(inbox(&store, bob.id).await.unwrap()[0].unread_count, 0);
        assert_eq!(inbox(&store, alice.id).await.unwrap()[0].unread_count, 1);
    }

    #[tokio::test]
    async fn empty_and_self_messages_are_rejected() {
        let store = MemoryStore::new();
        let (alice, bob) = pair(&store).await;
        assert!(matches!(
            send_private_message(&store, alice.id, bob.id, "   ").await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(matches!(
            send_private_message(&store, alice.id, alice.id, "note to self").await,
            Err(ChatError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_delete() {
        let store = MemoryStore::new();
        let (alice, bob) = pair(&store).await;
        let carol = store.create_user("carol").await.unwrap();
        let conversation = open_conversation(&store, alice.id, bob.id).await.unwrap();

        assert!(matches!(
            delete_conversation(&store, carol.id, conversation.id).await,
            Err(ChatError::NotFound { .. })
        ));
        delete_conversation(&store, bob.id, conversation.id).await.unwrap();
        assert!(inbox(&store, alice.id).await.unwrap().is_empty());
    }
}
