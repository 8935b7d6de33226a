//! User registration, the user directory and profiles.

use log::{debug, info};
use serde::Serialize;

use crate::error::{ChatError, Result};
use crate::mentions::is_mentionable;
use crate::store::{IdentityStore, MessageStore, RoomStore};
use crate::types::{Message, Room, Topic, User, UserId};

const MAX_USERNAME_CHARS: usize = 150;

/// A user's public page: the rooms they host and what they wrote.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub hosted_rooms: Vec<Room>,
    /// Newest first.
    pub messages: Vec<Message>,
    pub topics: Vec<Topic>,
}

/// Registers `username`, which must be a name other users can `@mention`.
pub async fn register_user<S>(store: &S, username: &str) -> Result<User>
where
    S: IdentityStore + ?Sized,
{
    let username = username.trim();
    if !is_mentionable(username) {
        return Err(ChatError::Invalid(format!(
            "'{username}' is not a valid username: use letters, digits and underscores"
        )));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ChatError::Invalid(format!(
            "usernames are limited to {MAX_USERNAME_CHARS} characters"
        )));
    }

    let user = store.create_user(username).await?;
    info!("Registered user {}", user.username);
    Ok(user)
}

/// Everyone except `viewer`, sorted by username, optionally narrowed by a
/// case-insensitive substring of the username.
pub async fn users_directory<S>(store: &S, viewer: UserId, search: &str) -> Result<Vec<User>>
where
    S: IdentityStore + ?Sized,
{
    let needle = search.trim().to_lowercase();
    let mut users: Vec<User> = store
        .list_users()
        .await?
        .into_iter()
        .filter(|u| u.id != viewer)
        .filter(|u| needle.is_empty() || u.username.to_lowercase().contains(&needle))
        .collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    debug!("Directory search '{needle}' matched {} user(s)", users.len());
    Ok(users)
}

/// Candidates for completing a partially typed `@name`.
pub async fn mention_suggestions<S>(store: &S, partial: &str) -> Result<Vec<User>>
where
    S: IdentityStore + ?Sized,
{
    let prefix = partial.trim().trim_start_matches('@').to_lowercase();
    let mut users: Vec<User> = store
        .list_users()
        .await?
        .into_iter()
        .filter(|u| u.username.to_lowercase().starts_with(&prefix))
        .collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(users)
}

pub async fn user_profile<S>(store: &S, id: UserId) -> Result<UserProfile>
where
    S: IdentityStore + RoomStore + MessageStore + ?Sized,
{
    let user = store
        .user(id)
        .await?
        .ok_or_else(|| ChatError::not_found("user", id))?;

    Ok(UserProfile {
        hosted_rooms: store.rooms_hosted_by(id).await?,
        messages: store.messages_by(id).await?,
        topics: store.list_topics().await?,
        user,
    })
}
