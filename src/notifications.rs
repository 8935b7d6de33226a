//! Mention notification fan-out and the per-user notification inbox.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{ChatError, Result};
use crate::store::NotificationStore;
use crate::types::{
    Message, NewNotification, Notification, NotificationId, NotificationKind, User, UserId,
};

/// Outcome of one fan-out pass.
#[derive(Debug, Default)]
pub struct EmitReport {
    pub created: Vec<Notification>,
    /// Recipients already notified about this message.
    pub skipped: usize,
    /// Recipients whose notification could not be stored.
    pub failed: usize,
}

/// Create one unread `mention` notification per user in `mentioned`.
///
/// Recipients already notified about `message` are skipped, so re-running
/// this after an edit only reaches newly mentioned users. A failure for one
/// recipient is logged and does not stop the rest.
pub async fn emit_mention_notifications<N>(
    store: &N,
    message: &Message,
    sender: &User,
    mentioned: &[User],
) -> EmitReport
where
    N: NotificationStore + ?Sized,
{
    let mut report = EmitReport::default();

    for recipient in mentioned {
        if recipient.id == sender.id {
            continue;
        }

        match store.exists_for_message(message.id, recipient.id).await {
            Ok(true) => {
                debug!(
                    "{} already notified about message {}",
                    recipient.username, message.id
                );
                report.skipped += 1;
                continue;
            }
            Ok(false) => {}
            // The store's uniqueness check still guards the create below.
            Err(e) => warn!("Failed to check existing notifications: {e}"),
        }

        let new = NewNotification {
            recipient: recipient.id,
            sender: sender.id,
            kind: NotificationKind::Mention,
            body: format!("{} mentioned you in a message", sender.username),
            room: Some(message.room),
            source_message: Some(message.id),
        };

        match store.create(new).await {
            Ok(notification) => report.created.push(notification),
            Err(ChatError::DuplicateNotification { .. }) => report.skipped += 1,
            Err(e) => {
                warn!(
                    "Failed to notify {} about message {}: {e}",
                    recipient.username, message.id
                );
                report.failed += 1;
            }
        }
    }

    if !report.created.is_empty() {
        info!(
            "Sent {} mention notification(s) for message {}",
            report.created.len(),
            message.id
        );
    }
    report
}

/// A user's notifications, newest first, with the unread total.
#[derive(Debug, Serialize)]
pub struct NotificationInbox {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

pub async fn inbox<N>(store: &N, recipient: UserId) -> Result<NotificationInbox>
where
    N: NotificationStore + ?Sized,
{
    let notifications = store.list_for(recipient).await?;
    let unread_count = notifications.iter().filter(|n| !n.is_read).count();
    Ok(NotificationInbox {
        notifications,
        unread_count,
    })
}

pub async fn unread_count<N>(store: &N, recipient: UserId) -> Result<usize>
where
    N: NotificationStore + ?Sized,
{
    Ok(store
        .list_for(recipient)
        .await?
        .iter()
        .filter(|n| !n.is_read)
        .count())
}

/// Mark one notification read. Someone else's notification is reported as missing.
pub async fn mark_read<N>(store: &N, recipient: UserId, id: NotificationId) -> Result<()>
where
    N: NotificationStore + ?Sized,
{
    match store.notification(id).await? {
        Some(notification) if notification.recipient == recipient => store.mark_read(id).await,
        _ => Err(ChatError::not_found("notification", id)),
    }
}

pub async fn mark_all_read<N>(store: &N, recipient: UserId) -> Result<usize>
where
    N: NotificationStore + ?Sized,
{
    let flipped = store.mark_all_read(recipient).await?;
    debug!("Marked {flipped} notification(s) read for {recipient}");
    Ok(flipped)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{MessageId, RoomId};

    fn user(name: &str) -> User {
        User {
            id: UserId::new(),
            username: name.to_string(),
        }
    }

    fn message_from(author: &User) -> Message {
        Message {
            id: MessageId::new(),
            room: RoomId::new(),
            author: author.id,
            body: String::new(),
            mentions: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Store that refuses to notify one particular user.
    struct RefusingStore {
        inner: MemoryStore,
        refused: UserId,
    }

    #[async_trait]
    impl NotificationStore for RefusingStore {
        async fn create(&self, notification: NewNotification) -> Result<Notification> {
            if notification.recipient == self.refused {
                return Err(ChatError::Storage("disk full".to_string()));
            }
            self.inner.create(notification).await
        }

        async fn exists_for_message(&self, message: MessageId, recipient: UserId) -> Result<bool> {
            self.inner.exists_for_message(message, recipient).await
        }

        async fn list_for(&self, recipient: UserId) -> Result<Vec<Notification>> {
            self.inner.list_for(recipient).await
        }

        async fn notification(&self, id: NotificationId) -> Result<Option<Notification>> {
            self.inner.notification(id).await
        }

        async fn mark_read(&self, id: NotificationId) -> Result<()> {
            self.inner.mark_read(id).await
        }

        async fn mark_all_read(&self, recipient: UserId) -> Result<usize> {
            self.inner.mark_all_read(recipient).await
        }
    }

    #[tokio::test]
    async fn one_unread_mention_per_recipient() {
        let store = MemoryStore::new();
        let (bob, alice) = (user("bob"), user("alice"));
        let message = message_from(&bob);

        let report =
            emit_mention_notifications(&store, &message, &bob, std::slice::from_ref(&alice)).await;

        assert_eq!(report.created.len(), 1);
        let notification = &report.created[0];
        assert_eq!(notification.recipient, alice.id);
        assert_eq!(notification.kind, NotificationKind::Mention);
        assert_eq!(notification.body, "bob mentioned you in a message");
        assert_eq!(notification.room, Some(message.room));
        assert!(!notification.is_read);
    }

    #[tokio::test]
    async fn replaying_the_same_message_creates_no_duplicates() {
        let store = MemoryStore::new();
        let (bob, alice, carol) = (user("bob"), user("alice"), user("carol"));
        let message = message_from(&bob);

        emit_mention_notifications(&store, &message, &bob, std::slice::from_ref(&alice)).await;
        let report =
            emit_mention_notifications(&store, &message, &bob, &[alice.clone(), carol.clone()])
                .await;

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].recipient, carol.id);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.list_for(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_mention_is_never_notified() {
        let store = MemoryStore::new();
        let bob = user("bob");
        let message = message_from(&bob);

        let report =
            emit_mention_notifications(&store, &message, &bob, std::slice::from_ref(&bob)).await;
        assert!(report.created.is_empty());
    }

    #[tokio::test]
    async fn failure_for_one_recipient_does_not_block_others() {
        let (bob, alice, carol) = (user("bob"), user("alice"), user("carol"));
        let store = RefusingStore {
            inner: MemoryStore::new(),
            refused: alice.id,
        };
        let message = message_from(&bob);

        let report =
            emit_mention_notifications(&store, &message, &bob, &[alice.clone(), carol.clone()])
                .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].recipient, carol.id);
    }

    #[tokio::test]
    async fn inbox_counts_and_marks_read() {
        let store = MemoryStore::new();
        let (bob, alice) = (user("bob"), user("alice"));
        for _ in 0..2 {
            let message = message_from(&bob);
            emit_mention_notifications(&store, &message, &bob, std::slice::from_ref(&alice)).await;
        }

        let before = inbox(&store, alice.id).await.unwrap();
        assert_eq!(before.unread_count, 2);

        mark_read(&store, alice.id, before.notifications[0].id)
            .await
            .unwrap();
        assert_eq!(unread_count(&store, alice.id).await.unwrap(), 1);

        assert_eq!(mark_all_read(&store, alice.id).await.unwrap(), 1);
        assert_eq!(unread_count(&store, alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cannot_mark_someone_elses_notification() {
        let store = MemoryStore::new();
        let (bob, alice) = (user("bob"), user("alice"));
        let message = message_from(&bob);
        let report =
            emit_mention_notifications(&store, &message, &bob, std::slice::from_ref(&alice)).await;

        let result = mark_read(&store, bob.id, report.created[0].id).await;
        assert!(matches!(result, Err(ChatError::NotFound { .. })));
    }
}
