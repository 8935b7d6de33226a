use super::matching::Cue;

/// One row of the fallback response table.
///
/// Templates may use `{bot}`, `{user}`, `{room}`, `{subject}` and `{question}`.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    pub name: &'static str,
    pub cue: Cue,
    pub templates: &'static [&'static str],
}

/// The built-in fallback table, evaluated top to bottom. The last rule always matches.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "empty",
        cue: Cue::Empty,
        templates: &[
            "Hello {user}! 👋 I'm {bot}!",
            "Hi {user}! Ready to chat in {room}!",
            "Hey {user}! 😊 How can I help?",
            "Greetings {user}! I'm your AI assistant.",
        ],
    },
    FallbackRule {
        name: "greeting",
        cue: Cue::Word(&["hello", "hi", "hey", "greetings"]),
        templates: &["Hello {user}! Nice to meet you! 😊"],
    },
    FallbackRule {
        name: "wellbeing",
        cue: Cue::Phrase(&["how are you"]),
        templates: &["I'm doing great, thanks for asking {user}! How about you?"],
    },
    FallbackRule {
        name: "identity",
        cue: Cue::Phrase(&["your name", "who are you"]),
        templates: &["I'm {bot}, your friendly AI assistant! Pleased to meet you, {user}!"],
    },
    FallbackRule {
        name: "help",
        cue: Cue::Keyword(&["help"]),
        templates: &["I can answer questions, chat with you, or help with {subject}!"],
    },
    FallbackRule {
        name: "weather",
        cue: Cue::Keyword(&["weather"]),
        templates: &["I can't check weather, but I hope it's beautiful where you are, {user}! 🌤️"],
    },
    FallbackRule {
        name: "question",
        cue: Cue::Char('?'),
        templates: &[
            "Interesting question about '{question}'!",
            "Great question, {user}! Let me think...",
            "I love curious minds like yours, {user}!",
            "That's a thoughtful question!",
        ],
    },
    FallbackRule {
        name: "generic",
        cue: Cue::Any,
        templates: &[
            "Thanks for sharing that, {user}!",
            "I appreciate your message, {user}!",
            "Got it, {user}! Thanks for keeping me in the loop.",
            "Noted! What else would you like to discuss, {user}?",
            "Interesting point, {user}! Tell me more.",
        ],
    },
];
