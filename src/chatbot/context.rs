//! Prompt building for generated replies.

use std::fmt::Write;

use chrono::Utc;

/// Who asked and where, when known.
#[derive(Debug, Clone, Default)]
pub struct ReplyContext {
    pub username: Option<String>,
    pub room_name: Option<String>,
    pub topic: Option<String>,
}

/// Builds the generation prompt for a mention or an ambient reply.
pub fn build_prompt(
    bot_name: &str,
    question: &str,
    context: &ReplyContext,
    is_mention: bool,
) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let username = context.username.as_deref().unwrap_or("someone");
    let room_name = context.room_name.as_deref().unwrap_or("General Chat");

    let mut prompt = if is_mention {
        format!("You are {bot_name}, a friendly and enthusiastic AI assistant in a chat application.")
    } else {
        format!("You are {bot_name} participating in a chat conversation.")
    };

    let _ = write!(prompt, "\nCurrent datetime: {timestamp}");
    let _ = write!(prompt, "\nChat room: \"{room_name}\"");
    if let Some(ref topic) = context.topic {
        let _ = write!(prompt, " (topic: {topic})");
    }

    if is_mention {
        let _ = write!(
            prompt,
            "\nUser @{username} mentioned you and said: \"{question}\"\n\nRespond in 1-2 friendly, conversational sentences. Be helpful and engaging."
        );
    } else {
        let _ = write!(
            prompt,
            "\nUser @{username} said: \"{question}\"\n\nRespond naturally as if you're chatting with friends. Keep it to 1 sentence."
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_prompt_names_user_room_and_topic() {
        let context = ReplyContext {
            username: Some("alice".to_string()),
            room_name: Some("Lounge".to_string()),
            topic: Some("Rust".to_string()),
        };
        let prompt = build_prompt("FishoAI", "any tips?", &context, true);
        assert!(prompt.starts_with("You are FishoAI, a friendly"));
        assert!(prompt.contains("Chat room: \"Lounge\" (topic: Rust)"));
        assert!(prompt.contains("User @alice mentioned you and said: \"any tips?\""));
        assert!(prompt.contains("1-2 friendly"));
    }

    #[test]
    fn ambient_prompt_falls_back_to_defaults() {
        let prompt = build_prompt("FishoAI", "nice day", &ReplyContext::default(), false);
        assert!(prompt.contains("Chat room: \"General Chat\""));
        assert!(prompt.contains("User @someone said: \"nice day\""));
        assert!(prompt.contains("Keep it to 1 sentence."));
    }
}
