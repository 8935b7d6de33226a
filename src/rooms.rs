//! Room and topic management with host-only edits.

use log::info;

use crate::error::{ChatError, Result};
use crate::store::{MessageStore, RoomStore};
use crate::types::{MessageId, Room, RoomDraft, RoomId, UserId};

const MAX_NAME_CHARS: usize = 200;

fn validate(draft: &RoomDraft) -> Result<()> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ChatError::Invalid("a room needs a name".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ChatError::Invalid(format!(
            "room names are limited to {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

async fn hosted_room<S>(store: &S, actor: UserId, id: RoomId) -> Result<Room>
where
    S: RoomStore + ?Sized,
{
    let room = store
        .room(id)
        .await?
        .ok_or_else(|| ChatError::not_found("room", id))?;
    if room.host != Some(actor) {
        return Err(ChatError::PermissionDenied(format!(
            "{actor} is not the host of room {id}"
        )));
    }
    Ok(room)
}

pub async fn create_room<S>(store: &S, host: UserId, mut draft: RoomDraft) -> Result<Room>
where
    S: RoomStore + ?Sized,
{
    validate(&draft)?;
    draft.name = draft.name.trim().to_string();
    let room = store.create_room(host, draft).await?;
    info!("Room '{}' created by {}", room.name, host);
    Ok(room)
}

pub async fn update_room<S>(
    store: &S,
    actor: UserId,
    id: RoomId,
    mut draft: RoomDraft,
) -> Result<Room>
where
    S: RoomStore + ?Sized,
{
    validate(&draft)?;
    hosted_room(store, actor, id).await?;
    draft.name = draft.name.trim().to_string();
    store.update_room(id, draft).await
}

/// Deletes the room and all of its messages. Host only.
pub async fn delete_room<S>(store: &S, actor: UserId, id: RoomId) -> Result<()>
where
    S: RoomStore + ?Sized,
{
    let room = hosted_room(store, actor, id).await?;
    store.delete_room(id).await?;
    info!("Room '{}' deleted by {}", room.name, actor);
    Ok(())
}

/// Deletes a message. Only its author may do so.
pub async fn delete_message<S>(store: &S, actor: UserId, id: MessageId) -> Result<()>
where
    S: MessageStore + ?Sized,
{
    let message = store
        .message(id)
        .await?
        .ok_or_else(|| ChatError::not_found("message", id))?;
    if message.author != actor {
        return Err(ChatError::PermissionDenied(format!(
            "{actor} did not write message {id}"
        )));
    }
    store.delete_message(id).await
}

/// Rooms matching `query` on topic, name, or description. An empty query lists all.
pub async fn search_rooms<S>(store: &S, query: &str) -> Result<Vec<Room>>
where
    S: RoomStore + ?Sized,
{
    store.search_rooms(query.trim()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{IdentityStore, MemoryStore};

    fn draft(name: &str) -> RoomDraft {
        RoomDraft {
            name: name.to_string(),
            ..RoomDraft::default()
        }
    }

    #[tokio::test]
    async fn only_host_can_edit_or_delete() {
        let store = MemoryStore::new();
        let host = store.create_user("host").await.unwrap();
        let guest = store.create_user("guest").await.unwrap();
        let room = create_room(&store, host.id, draft("  Lounge  ")).await.unwrap();
        assert_eq!(room.name, "Lounge");

        let denied = update_room(&store, guest.id, room.id, draft("Mine now")).await;
        assert!(matches!(denied, Err(ChatError::PermissionDenied(_))));
        let denied = delete_room(&store, guest.id, room.id).await;
        assert!(matches!(denied, Err(ChatError::PermissionDenied(_))));

        let renamed = update_room(&store, host.id, room.id, draft("Parlour")).await.unwrap();
        assert_eq!(renamed.name, "Parlour");
        delete_room(&store, host.id, room.id).await.unwrap();
        assert!(store.room(room.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let store = MemoryStore::new();
        let result = create_room(&store, UserId::new(), draft("   ")).await;
        assert!(matches!(result, Err(ChatError::Invalid(_))));
    }

    #[tokio::test]
    async fn only_author_can_delete_message() {
        let store = MemoryStore::new();
        let author = store.create_user("author").await.unwrap();
        let other = store.create_user("other").await.unwrap();
        let room = create_room(&store, author.id, draft("Room")).await.unwrap();
        let message = store
            .create_message(room.id, author.id, "mine")
            .await
            .unwrap();

        let denied = delete_message(&store, other.id, message.id).await;
        assert!(matches!(denied, Err(ChatError::PermissionDenied(_))));
        delete_message(&store, author.id, message.id).await.unwrap();
        assert!(store.room_messages(room.id).await.unwrap().is_empty());
    }
}
