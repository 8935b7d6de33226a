//! `@username` extraction and resolution.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::store::IdentityStore;
use crate::types::{User, UserId};

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("username pattern is valid"));

/// True when `@username` would be picked up whole as a mention token.
#[must_use]
pub fn is_mentionable(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Distinct `@token` names in `body`, ordered by first occurrence.
#[must_use]
pub fn extract_tokens(body: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for capture in MENTION_RE.captures_iter(body) {
        if let Some(name) = capture.get(1).map(|m| m.as_str())
            && !tokens.contains(&name)
        {
            tokens.push(name);
        }
    }
    tokens
}

/// Resolve the mentions in `body` to users, excluding `author`.
///
/// Unknown names are dropped. A lookup error only drops that one token.
pub async fn resolve_mentions<S>(identity: &S, body: &str, author: UserId) -> Vec<User>
where
    S: IdentityStore + ?Sized,
{
    let mut resolved: Vec<User> = Vec::new();
    for token in extract_tokens(body) {
        match identity.resolve_username(token).await {
            Ok(Some(user)) if user.id == author => {
                debug!("Ignoring self-mention @{token}");
            }
            Ok(Some(user)) => {
                if !resolved.iter().any(|u| u.id == user.id) {
                    resolved.push(user);
                }
            }
            Ok(None) => debug!("Mention @{token} matches no user"),
            Err(e) => warn!("Failed to resolve mention @{token}: {e}"),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn tokens_are_deduplicated_in_first_occurrence_order() {
        assert_eq!(
            extract_tokens("hi @alice and @bob, @alice again"),
            vec!["alice", "bob"]
        );
    }

    #[test]
    fn empty_body_has_no_tokens() {
        assert!(extract_tokens("").is_empty());
        assert!(extract_tokens("no mentions @ all").is_empty());
    }

    #[test]
    fn token_stops_at_non_word_character() {
        assert_eq!(extract_tokens("ping @carol_1! and @dave."), vec!["carol_1", "dave"]);
        assert_eq!(extract_tokens("mail me at x@example.com"), vec!["example"]);
    }

    #[test]
    fn mentionable_names_are_single_words() {
        assert!(is_mentionable("carol_1"));
        assert!(is_mentionable("Zoë"));
        assert!(!is_mentionable("bob smith"));
        assert!(!is_mentionable("dave."));
        assert!(!is_mentionable(""));
    }

    #[tokio::test]
    async fn repeated_mention_resolves_once() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();

        let users = resolve_mentions(&store, "hi @alice and @alice again", bob.id).await;
        assert_eq!(users, vec![alice]);
    }

    #[tokio::test]
    async fn unknown_and_self_mentions_are_dropped() {
        let store = MemoryStore::new();
        let bob = store.create_user("bob").await.unwrap();

        assert!(resolve_mentions(&store, "hello @nobody", bob.id).await.is_empty());
        assert!(resolve_mentions(&store, "@bob thinks this", bob.id).await.is_empty());
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        let bob = store.create_user("bob").await.unwrap();
        store.create_user("alice").await.unwrap();

        assert!(resolve_mentions(&store, "hey @Alice", bob.id).await.is_empty());
    }

    #[tokio::test]
    async fn extraction_is_repeatable() {
        let store = MemoryStore::new();
        let bob = store.create_user("bob").await.unwrap();
        store.create_user("alice").await.unwrap();
        store.create_user("carol").await.unwrap();

        let body = "@carol meet @alice, cc @bob";
        let first = resolve_mentions(&store, body, bob.id).await;
        let second = resolve_mentions(&store, body, bob.id).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
