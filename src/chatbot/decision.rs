//! Whether the bot should answer a room message at all.

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::config::ResponderConfig;
use crate::error::{ChatError, Result};
use crate::types::User;

/// Source of uniform draws in `[0, 1)`.
pub trait ChanceSource {
    fn draw(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let index = (self.draw() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}

/// Thread-local RNG backed chance source.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadChance;

impl ChanceSource for ThreadChance {
    fn draw(&mut self) -> f64 {
        rand::random::<f64>()
    }
}

/// The automated participant: its user record and mention token.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    user: User,
    token: Regex,
}

impl BotIdentity {
    pub fn new(user: User) -> Result<Self> {
        let pattern = format!("@{}", regex::escape(&user.username));
        let token = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ChatError::Config(format!("invalid bot username: {e}")))?;
        Ok(Self { user, token })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Case-insensitive check for `@<bot username>` anywhere in `body`.
    pub fn is_mentioned_in(&self, body: &str) -> bool {
        self.token.is_match(body)
    }

    /// `body` with every case variant of the mention token removed, trimmed.
    pub fn strip_mention(&self, body: &str) -> String {
        self.token.replace_all(body, "").trim().to_string()
    }
}

/// What the bot will do with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDecision {
    /// Addressed directly; always answered.
    Mention { question: String },
    /// Joining in uninvited.
    Ambient { text: String },
    Silent,
}

impl ReplyDecision {
    #[must_use]
    pub fn is_mention(&self) -> bool {
        matches!(self, ReplyDecision::Mention { .. })
    }
}

/// Decide whether and how the bot answers `body`.
///
/// A mention always wins. Otherwise one draw is taken and the bot answers only
/// when the draw is below the ambient probability and the body is long enough.
pub fn decide(
    body: &str,
    bot: &BotIdentity,
    config: &ResponderConfig,
    chance: &mut dyn ChanceSource,
) -> ReplyDecision {
    if bot.is_mentioned_in(body) {
        return ReplyDecision::Mention {
            question: bot.strip_mention(body),
        };
    }

    let draw = chance.draw();
    let text = body.trim();
    if draw < config.ambient_probability && text.chars().count() > config.ambient_min_length {
        debug!("Ambient reply triggered (draw={draw:.3})");
        return ReplyDecision::Ambient {
            text: text.to_string(),
        };
    }

    ReplyDecision::Silent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    struct Fixed(f64);

    impl ChanceSource for Fixed {
        fn draw(&mut self) -> f64 {
            self.0
        }
    }

    fn bot() -> BotIdentity {
        BotIdentity::new(User {
            id: UserId::new(),
            username: "FishoAI".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn mention_wins_regardless_of_draw() {
        let config = ResponderConfig::default();
        let decision = decide("@fishoai what's up?", &bot(), &config, &mut Fixed(0.99));
        assert_eq!(
            decision,
            ReplyDecision::Mention {
                question: "what's up?".to_string()
            }
        );
    }

    #[test]
    fn every_case_variant_is_stripped() {
        assert_eq!(
            bot().strip_mention("@FishoAI hi @FISHOAI and @fIsHoAi"),
            "hi  and"
        );
    }

    #[test]
    fn ambient_needs_low_draw_and_long_body() {
        let config = ResponderConfig {
            ambient_probability: 0.3,
            ..ResponderConfig::default()
        };
        let bot = bot();

        assert_eq!(
            decide("good morning all", &bot, &config, &mut Fixed(0.1)),
            ReplyDecision::Ambient {
                text: "good morning all".to_string()
            }
        );
        assert_eq!(
            decide("good morning all", &bot, &config, &mut Fixed(0.3)),
            ReplyDecision::Silent
        );
        assert_eq!(
            decide("hey!", &bot, &config, &mut Fixed(0.0)),
            ReplyDecision::Silent
        );
    }

    #[test]
    fn zero_probability_never_joins() {
        let config = ResponderConfig {
            ambient_probability: 0.0,
            ..ResponderConfig::default()
        };
        assert_eq!(
            decide("a perfectly long message", &bot(), &config, &mut Fixed(0.0)),
            ReplyDecision::Silent
        );
    }

    #[test]
    fn pick_stays_in_bounds() {
        assert_eq!(Fixed(0.0).pick(4), 0);
        assert_eq!(Fixed(0.999_999).pick(4), 3);
        assert_eq!(Fixed(1.0).pick(4), 3);
    }
}
