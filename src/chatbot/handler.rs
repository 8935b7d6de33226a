//! Reply generation with fallback for the room bot.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::ResponderConfig;
use crate::error::{ChatError, Result};
use crate::fallback::fallback_reply;
use crate::generator::TextGenerator;

use super::context::{ReplyContext, build_prompt};
use super::decision::{BotIdentity, ChanceSource, ReplyDecision, decide};

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.8;

/// Decides on and produces bot replies to room messages.
///
/// Generation errors never escape: every failure turns into a fallback reply.
pub struct Responder {
    generator: Option<Arc<dyn TextGenerator>>,
    bot: BotIdentity,
    config: ResponderConfig,
}

impl Responder {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        bot: BotIdentity,
        config: ResponderConfig,
    ) -> Self {
        Self {
            generator,
            bot,
            config,
        }
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    /// Reply text for `body`, or `None` when the bot stays quiet.
    pub async fn respond(
        &self,
        body: &str,
        context: &ReplyContext,
        chance: &mut (dyn ChanceSource + Send),
    ) -> Option<String> {
        let decision = decide(body, &self.bot, &self.config, &mut *chance);
        let is_mention = decision.is_mention();
        let question = match decision {
            ReplyDecision::Mention { question } => {
                info!(
                    "Mention from @{} in {}",
                    context.username.as_deref().unwrap_or("unknown"),
                    context.room_name.as_deref().unwrap_or("unknown room")
                );
                question
            }
            ReplyDecision::Ambient { text } => {
                info!(
                    "Joining conversation with @{}",
                    context.username.as_deref().unwrap_or("unknown")
                );
                text
            }
            ReplyDecision::Silent => return None,
        };

        Some(self.reply(&question, context, is_mention, chance).await)
    }

    /// Generated reply for `question`, or a fallback reply on any failure.
    pub async fn reply(
        &self,
        question: &str,
        context: &ReplyContext,
        is_mention: bool,
        chance: &mut (dyn ChanceSource + Send),
    ) -> String {
        let question = question.trim();
        if question.is_empty() {
            return fallback_reply(question, self.bot.username(), context, &mut *chance);
        }

        let prompt = build_prompt(self.bot.username(), question, context, is_mention);
        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(ChatError::GeneratorUnavailable) => {
                debug!("No text generator configured, using fallback reply");
                fallback_reply(question, self.bot.username(), context, &mut *chance)
            }
            Err(e) => {
                warn!("Text generation failed, using fallback reply: {e}");
                fallback_reply(question, self.bot.username(), context, &mut *chance)
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(ChatError::GeneratorUnavailable)?;

        let timeout = self.config.generation_timeout;
        let request = generator.generate(prompt, MAX_TOKENS, TEMPERATURE);
        let text = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| ChatError::GenerationTimeout(timeout.as_secs()))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::OpenRouterResponse(
                "Generator returned an empty reply".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
