//! Fallback reply selection and template rendering.

use log::debug;

use crate::chatbot::{ChanceSource, ReplyContext};

use super::rules::{FALLBACK_RULES, FallbackRule};

const QUESTION_PREVIEW_CHARS: usize = 30;
const LAST_RESORT: &str = "Thanks for your message! I'm here to help.";

/// Pick a reply from the fallback table for `question`.
///
/// Never fails and never returns an empty string.
pub fn fallback_reply(
    question: &str,
    bot_name: &str,
    context: &ReplyContext,
    chance: &mut dyn ChanceSource,
) -> String {
    let Some(rule) = FALLBACK_RULES.iter().find(|rule| rule.cue.matches(question)) else {
        return LAST_RESORT.to_string();
    };
    debug!("Fallback reply rule '{}' selected", rule.name);

    render(rule, question, bot_name, context, chance)
}

fn render(
    rule: &FallbackRule,
    question: &str,
    bot_name: &str,
    context: &ReplyContext,
    chance: &mut dyn ChanceSource,
) -> String {
    let Some(template) = rule.templates.get(chance.pick(rule.templates.len())) else {
        return LAST_RESORT.to_string();
    };

    let preview: String = question.trim().chars().take(QUESTION_PREVIEW_CHARS).collect();
    let rendered = template
        .replace("{bot}", bot_name)
        .replace("{user}", context.username.as_deref().unwrap_or("friend"))
        .replace("{room}", context.room_name.as_deref().unwrap_or("this chat"))
        .replace("{subject}", context.room_name.as_deref().unwrap_or("anything"))
        .replace("{question}", &preview);

    if rendered.trim().is_empty() {
        LAST_RESORT.to_string()
    } else {
        rendered
    }
}
