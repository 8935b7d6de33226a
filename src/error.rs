use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("OpenRouter API error ({status}): {message}")]
    OpenRouterApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("OpenRouter response error: {0}")]
    OpenRouterResponse(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Text generation timed out after {0} seconds")]
    GenerationTimeout(u64),

    #[error("Text generation is not configured")]
    GeneratorUnavailable,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Duplicate notification for message {message} and recipient {recipient}")]
    DuplicateNotification { message: String, recipient: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Message body is empty")]
    EmptyMessage,

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ChatError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns a user-friendly error message suitable for showing to the poster
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Config(_) | ChatError::EnvVar(_) => {
                "Sorry, there's a configuration issue on our end. Please contact the administrator.".to_string()
            }
            ChatError::OpenRouterApi { status, .. } => {
                match *status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        "Sorry, the assistant is having authentication issues with its AI service.".to_string()
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        "Sorry, the assistant hit its rate limit. Please try again in a few moments.".to_string()
                    }
                    status if status.is_server_error() => {
                        "Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                    }
                    _ => {
                        "Sorry, the assistant couldn't reach its AI service. Please try again later.".to_string()
                    }
                }
            }
            ChatError::OpenRouterResponse(_) => {
                "Sorry, the assistant received an unexpected response from its AI service.".to_string()
            }
            ChatError::Reqwest(_) | ChatError::GenerationTimeout(_) => {
                "Sorry, the assistant is having network issues. Please try again in a moment.".to_string()
            }
            ChatError::GeneratorUnavailable => {
                "The assistant is running without an AI service.".to_string()
            }
            ChatError::NotFound { entity, .. } => format!("Sorry, that {entity} doesn't exist."),
            ChatError::UsernameTaken(name) => format!("The username '{name}' is already taken."),
            ChatError::DuplicateNotification { .. } => {
                "You have already been notified about this message.".to_string()
            }
            ChatError::PermissionDenied(_) => "You are not allowed here.".to_string(),
            ChatError::EmptyMessage => "Message cannot be empty.".to_string(),
            ChatError::Invalid(reason) => format!("Sorry, {reason}."),
            ChatError::Storage(_) | ChatError::Io(_) => {
                "Sorry, something went wrong while saving. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_gets_dedicated_message() {
        let err = ChatError::OpenRouterApi {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_string(),
        };
        assert!(err.user_message().contains("rate limit"));
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = ChatError::not_found("room", "42");
        assert_eq!(err.to_string(), "room not found: 42");
        assert_eq!(err.user_message(), "Sorry, that room doesn't exist.");
    }
}
