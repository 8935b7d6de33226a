//! Templated replies used when text generation is unavailable.

mod matching;
mod reply;
mod rules;

pub use matching::Cue;
pub use reply::fallback_reply;
pub use rules::{FALLBACK_RULES, FallbackRule};
