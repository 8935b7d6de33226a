use std::{env, str::FromStr, time::Duration};

use log::{debug, error, info, warn};

use crate::error::{ChatError, Result};

const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_BOT_USERNAME: &str = "FishoAI";
const DEFAULT_SYSTEM_PROMPT: &str = "You are FishoAI, a helpful assistant for the FishoFisho community. Be friendly, concise, and helpful.";
const DEFAULT_AMBIENT_PROBABILITY: f64 = 0.2;
const DEFAULT_AMBIENT_MIN_LENGTH: usize = 5;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 15;

/// Shortest API key accepted as real; anything shorter runs the bot on fallback replies.
const MIN_API_KEY_LEN: usize = 20;

/// Tunables for the conversation responder.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Chance in `[0, 1]` that the bot joins a conversation it was not mentioned in.
    pub ambient_probability: f64,
    /// Bodies must be strictly longer than this (in characters) for an ambient reply.
    pub ambient_min_length: usize,
    pub generation_timeout: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            ambient_probability: DEFAULT_AMBIENT_PROBABILITY,
            ambient_min_length: DEFAULT_AMBIENT_MIN_LENGTH,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub system_prompt: String,
    pub bot_username: String,
    pub responder: ResponderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let openrouter_api_key = match env::var("OPENROUTER_API_KEY") {
            Ok(key) if key.trim().len() > MIN_API_KEY_LEN => Some(key.trim().to_string()),
            Ok(_) => {
                warn!("OPENROUTER_API_KEY looks invalid, using fallback replies only");
                None
            }
            Err(env::VarError::NotPresent) => {
                warn!("OPENROUTER_API_KEY not set, using fallback replies only");
                None
            }
            Err(e) => {
                error!("Failed to load OPENROUTER_API_KEY from environment: {}", e);
                return Err(e.into());
            }
        };

        let openrouter_model = env_or("OPENROUTER_MODEL", DEFAULT_MODEL.to_string())?;
        let system_prompt = env_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT.to_string())?;
        let bot_username = env_or("BOT_USERNAME", DEFAULT_BOT_USERNAME.to_string())?;

        let ambient_probability =
            env_or("AMBIENT_REPLY_PROBABILITY", DEFAULT_AMBIENT_PROBABILITY)?;
        if !(0.0..=1.0).contains(&ambient_probability) {
            error!("AMBIENT_REPLY_PROBABILITY out of range: {}", ambient_probability);
            return Err(ChatError::Config(format!(
                "AMBIENT_REPLY_PROBABILITY must be between 0 and 1, got {ambient_probability}"
            )));
        }

        let ambient_min_length = env_or("AMBIENT_MIN_LENGTH", DEFAULT_AMBIENT_MIN_LENGTH)?;
        let timeout_secs = env_or("GENERATION_TIMEOUT_SECS", DEFAULT_GENERATION_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ChatError::Config(
                "GENERATION_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        if !crate::mentions::is_mentionable(&bot_username) {
            return Err(ChatError::Config(format!(
                "BOT_USERNAME must be a non-empty word, got '{bot_username}'"
            )));
        }

        info!("Configuration loaded successfully");
        debug!("AI service enabled: {}", openrouter_api_key.is_some());
        debug!("OpenRouter model: {}", openrouter_model);
        debug!("Bot username: {}", bot_username);
        debug!("Ambient reply probability: {}", ambient_probability);

        Ok(Self {
            openrouter_api_key,
            openrouter_model,
            system_prompt,
            bot_username,
            responder: ResponderConfig {
                ambient_probability,
                ambient_min_length,
                generation_timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

/// Read and parse an optional variable, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            error!("Failed to parse {} from environment: {}", key, e);
            ChatError::Config(format!("{key}: {e}"))
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => {
            error!("Failed to load {} from environment: {}", key, e);
            Err(e.into())
        }
    }
}
