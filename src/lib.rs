pub mod chatbot;
pub mod config;
pub mod console;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod mentions;
pub mod notifications;
pub mod openrouter;
pub mod private;
pub mod rooms;
pub mod service;
pub mod store;
pub mod types;
pub mod users;

use std::sync::Arc;

use log::{debug, info};

use config::Config;
use error::Result;

use chatbot::{BotIdentity, Responder};
use generator::TextGenerator;
use openrouter::OpenRouterClient;
use service::ChatService;
use store::MemoryStore;

/// Run an interactive chat session backed by the in-memory store.
pub async fn run() -> Result<()> {
    info!("Initializing chat");
    let config = Config::from_env()?;

    let store = Arc::new(MemoryStore::new());
    let bot_user = users::register_user(&*store, &config.bot_username).await?;
    let bot = BotIdentity::new(bot_user)?;

    let generator: Option<Arc<dyn TextGenerator>> = config.openrouter_api_key.map(|api_key| {
        debug!("Initializing OpenRouter client");
        Arc::new(OpenRouterClient::new(
            api_key,
            config.openrouter_model,
            config.system_prompt,
        )) as Arc<dyn TextGenerator>
    });
    if generator.is_none() {
        info!("No AI service configured, the bot will use fallback replies");
    }

    let responder = Responder::new(generator, bot, config.responder);
    let service = ChatService::new(store, responder);

    tokio::select! {
        result = console::run_session(service) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}
