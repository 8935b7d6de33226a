//! Request-level orchestration of room messages.
//!
//! Posting stores the message first, then runs mention processing and the
//! bot. Nothing after the write can make the post fail.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::chatbot::{ChanceSource, ReplyContext, Responder};
use crate::error::{ChatError, Result};
use crate::mentions::resolve_mentions;
use crate::notifications::{EmitReport, emit_mention_notifications};
use crate::store::ChatStore;
use crate::types::{Message, MessageId, Room, RoomId, User, UserId};

/// Result of posting one room message.
#[derive(Debug)]
pub struct PostOutcome {
    pub message: Message,
    pub notifications: EmitReport,
    /// The bot's answer, already posted to the room.
    pub bot_reply: Option<Message>,
}

pub struct ChatService<S: ChatStore + ?Sized> {
    store: Arc<S>,
    responder: Responder,
}

impl<S: ChatStore + ?Sized> ChatService<S> {
    pub fn new(store: Arc<S>, responder: Responder) -> Self {
        Self { store, responder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bot_user(&self) -> &User {
        self.responder.bot().user()
    }

    /// Post `body` to `room` as `author`, then let mentions and the bot react.
    pub async fn post_message(
        &self,
        room: RoomId,
        author: UserId,
        body: &str,
        chance: &mut (dyn ChanceSource + Send),
    ) -> Result<PostOutcome> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let room = self
            .store
            .room(room)
            .await?
            .ok_or_else(|| ChatError::not_found("room", room))?;
        let author = self
            .store
            .user(author)
            .await?
            .ok_or_else(|| ChatError::not_found("user", author))?;

        let (message, notifications) = self.save_message(&room, &author, body).await?;
        info!("{} posted in '{}'", author.username, room.name);

        if let Err(e) = self.store.add_participant(room.id, author.id).await {
            warn!("Failed to add {} to room participants: {e}", author.username);
        }

        let bot_reply = if author.id == self.bot_user().id {
            None
        } else {
            self.bot_reply(&room, &author, body, chance).await
        };

        Ok(PostOutcome {
            message,
            notifications,
            bot_reply,
        })
    }

    /// Replace the body of a message. Only the author may edit; mentions are recomputed.
    pub async fn edit_message(
        &self,
        actor: UserId,
        id: MessageId,
        body: &str,
    ) -> Result<(Message, EmitReport)> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let existing = self
            .store
            .message(id)
            .await?
            .ok_or_else(|| ChatError::not_found("message", id))?;
        if existing.author != actor {
            return Err(ChatError::PermissionDenied(format!(
                "{actor} did not write message {id}"
            )));
        }
        let author = self
            .store
            .user(actor)
            .await?
            .ok_or_else(|| ChatError::not_found("user", actor))?;

        let message = self.store.update_body(id, body).await?;
        Ok(self.process_mentions(message, &author).await)
    }

    async fn save_message(
        &self,
        room: &Room,
        author: &User,
        body: &str,
    ) -> Result<(Message, EmitReport)> {
        let message = self.store.create_message(room.id, author.id, body).await?;
        Ok(self.process_mentions(message, author).await)
    }

    /// Recompute the mention set of a stored message and notify new recipients.
    async fn process_mentions(&self, mut message: Message, author: &User) -> (Message, EmitReport) {
        let mentioned = resolve_mentions(&*self.store, &message.body, author.id).await;
        let ids: Vec<UserId> = mentioned.iter().map(|u| u.id).collect();

        match self.store.set_mentions(message.id, &ids).await {
            Ok(()) => message.mentions = ids,
            Err(e) => warn!("Failed to store mentions for message {}: {e}", message.id),
        }

        let report = emit_mention_notifications(&*self.store, &message, author, &mentioned).await;
        if report.failed > 0 {
            warn!(
                "{} mention notification(s) failed for message {}",
                report.failed, message.id
            );
        }
        (message, report)
    }

    async fn bot_reply(
        &self,
        room: &Room,
        author: &User,
        body: &str,
        chance: &mut (dyn ChanceSource + Send),
    ) -> Option<Message> {
        let topic = match room.topic {
            Some(id) => match self.store.list_topics().await {
                Ok(topics) => topics.into_iter().find(|t| t.id == id).map(|t| t.name),
                Err(e) => {
                    debug!("Failed to load topics for reply context: {e}");
                    None
                }
            },
            None => None,
        };
        let context = ReplyContext {
            username: Some(author.username.clone()),
            room_name: Some(room.name.clone()),
            topic,
        };

        let text = self.responder.respond(body, &context, chance).await?;
        match self.save_message(room, self.bot_user(), &text).await {
            Ok((message, _)) => {
                info!("{} replied in '{}'", self.bot_user().username, room.name);
                Some(message)
            }
            Err(e) => {
                warn!("Failed to post bot reply in '{}': {e}", room.name);
                None
            }
        }
    }
}
