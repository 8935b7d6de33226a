//! AI chatbot module - decides when the room bot speaks and what it says.

mod context;
mod decision;
mod handler;

pub use context::{ReplyContext, build_prompt};
pub use decision::{BotIdentity, ChanceSource, ReplyDecision, ThreadChance, decide};
pub use handler::Responder;
