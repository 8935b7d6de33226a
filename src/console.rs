//! Interactive terminal session over the in-memory store.

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::chatbot::ThreadChance;
use crate::error::{ChatError, Result};
use crate::notifications;
use crate::private;
use crate::rooms;
use crate::service::ChatService;
use crate::store::{ChatStore, IdentityStore, MemoryStore, MessageStore, RoomStore};
use crate::types::{Room, RoomDraft, User};
use crate::users;

const HELP: &str = "\
Commands:
  /user <name>          switch to (or register) a user
  /room <name>          switch to (or create) a room
  /rooms [query]        search rooms by topic, name or description
  /topic <name>         set the topic of a room you host
  /users [query]        list other users
  /profile [user]       show rooms hosted and messages written
  /history              show messages in the current room
  /notifications        show and clear your notifications
  /dm <user> <text>     send a private message
  /inbox                list private conversations
  /read <user>          open a private conversation
  /quit                 leave
Anything else is posted to the current room.";

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    User(&'a str),
    Room(&'a str),
    Rooms(&'a str),
    Topic(&'a str),
    Users(&'a str),
    Profile(&'a str),
    History,
    Notifications,
    Dm { to: &'a str, text: &'a str },
    Inbox,
    Read(&'a str),
    Help,
    Quit,
    Post(&'a str),
}

fn parse(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Post(line));
    };

    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let args = args.trim();
    let command = match name {
        "user" if !args.is_empty() => Command::User(args),
        "room" if !args.is_empty() => Command::Room(args),
        "rooms" => Command::Rooms(args),
        "topic" if !args.is_empty() => Command::Topic(args),
        "users" => Command::Users(args),
        "profile" => Command::Profile(args),
        "history" => Command::History,
        "notifications" => Command::Notifications,
        "dm" => match args.split_once(' ') {
            Some((to, text)) => Command::Dm {
                to,
                text: text.trim(),
            },
            None => Command::Help,
        },
        "inbox" => Command::Inbox,
        "read" if !args.is_empty() => Command::Read(args),
        "quit" | "exit" => Command::Quit,
        _ => Command::Help,
    };
    Some(command)
}

struct Session {
    user: User,
    room: Room,
}

/// Drive a chat session from stdin until `/quit` or end of input.
pub async fn run_session(service: ChatService<MemoryStore>) -> Result<()> {
    let bot = service.bot_user().clone();
    let room = rooms::create_room(
        service.store(),
        bot.id,
        RoomDraft {
            name: "general".to_string(),
            description: Some("Say hi to everyone".to_string()),
            topic: None,
        },
    )
    .await?;
    let user = users::register_user(service.store(), "guest").await?;

    println!(
        "Connected as @{} in #{}. Mention @{} to talk to the bot.",
        user.username, room.name, bot.username
    );
    println!("{HELP}");

    let mut session = Session { user, room };
    let mut lines: Lines<BufReader<Stdin>> = BufReader::new(tokio::io::stdin()).lines();
    let mut chance = ThreadChance;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&service, &mut session, command, &mut chance).await {
            warn!("Command failed: {e}");
            println!("! {}", e.user_message());
        }
    }

    debug!("Console session ended");
    Ok(())
}

async fn user_by_name<S: ChatStore + ?Sized>(store: &S, name: &str) -> Result<User> {
    let name = name.trim_start_matches('@');
    store
        .resolve_username(name)
        .await?
        .ok_or_else(|| ChatError::not_found("user", name))
}

async fn execute(
    service: &ChatService<MemoryStore>,
    session: &mut Session,
    command: Command<'_>,
    chance: &mut ThreadChance,
) -> Result<()> {
    let store = service.store();
    match command {
        Command::User(name) => {
            session.user = match store.resolve_username(name).await? {
                Some(user) => user,
                None => users::register_user(store, name).await?,
            };
            println!("Now posting as @{}", session.user.username);
        }
        Command::Room(name) => {
            let existing = rooms::search_rooms(store, name)
                .await?
                .into_iter()
                .find(|room| room.name == name);
            session.room = match existing {
                Some(room) => room,
                None => rooms::create_room(
                    store,
                    session.user.id,
                    RoomDraft {
                        name: name.to_string(),
                        ..RoomDraft::default()
                    },
                )
                .await?,
            };
            println!("Now in #{}", session.room.name);
        }
        Command::Rooms(query) => {
            for room in rooms::search_rooms(store, query).await? {
                println!(
                    "#{} ({} participant(s)){}",
                    room.name,
                    room.participants.len(),
                    room.description.map(|d| format!(" - {d}")).unwrap_or_default()
                );
            }
        }
        Command::Topic(name) => {
            let topic = store.get_or_create_topic(name).await?;
            let draft = RoomDraft {
                name: session.room.name.clone(),
                description: session.room.description.clone(),
                topic: Some(topic.id),
            };
            session.room =
                rooms::update_room(store, session.user.id, session.room.id, draft).await?;
            println!("#{} is now about {}", session.room.name, topic.name);
        }
        Command::Users(query) => {
            for user in users::users_directory(store, session.user.id, query).await? {
                println!("@{}", user.username);
            }
        }
        Command::Profile(name) => {
            let user = if name.is_empty() {
                session.user.clone()
            } else {
                user_by_name(store, name).await?
            };
            let profile = users::user_profile(store, user.id).await?;
            println!("@{}", profile.user.username);
            for room in &profile.hosted_rooms {
                println!("  hosts #{}", room.name);
            }
            for message in profile.messages.iter().take(10) {
                println!("  [{}] {}", message.created_at.format("%H:%M"), message.body);
            }
        }
        Command::History => {
            for message in store.room_messages(session.room.id).await? {
                let author = store.user(message.author).await?;
                let name = author.map_or_else(|| "unknown".to_string(), |u| u.username);
                println!(
                    "[{}] @{}: {}",
                    message.created_at.format("%H:%M"),
                    name,
                    message.body
                );
            }
        }
        Command::Notifications => {
            let inbox = notifications::inbox(store, session.user.id).await?;
            println!("{} unread notification(s)", inbox.unread_count);
            for notification in &inbox.notifications {
                let marker = if notification.is_read { ' ' } else { '*' };
                println!("{marker} [{}] {}", notification.kind, notification.body);
            }
            notifications::mark_all_read(store, session.user.id).await?;
        }
        Command::Dm { to, text } => {
            let receiver = user_by_name(store, to).await?;
            private::send_private_message(store, session.user.id, receiver.id, text).await?;
            println!("Sent to @{}", receiver.username);
        }
        Command::Inbox => {
            for row in private::inbox(store, session.user.id).await? {
                let other = row
                    .other_user
                    .map_or_else(|| "unknown".to_string(), |u| u.username);
                let last = row.last_message.map(|m| m.content).unwrap_or_default();
                println!("@{other} ({} unread): {last}", row.unread_count);
            }
        }
        Command::Read(name) => {
            let other = user_by_name(store, name).await?;
            let view = private::view_conversation(store, session.user.id, other.id).await?;
            for message in view.messages {
                let from = if message.sender == session.user.id {
                    "you"
                } else {
                    view.other_user.username.as_str()
                };
                println!("{from}: {}", message.content);
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
        Command::Post(body) => {
            let outcome = service
                .post_message(session.room.id, session.user.id, body, chance)
                .await?;
            if !outcome.notifications.created.is_empty() {
                println!(
                    "(notified {} user(s))",
                    outcome.notifications.created.len()
                );
            }
            if let Some(reply) = outcome.bot_reply {
                println!("@{}: {}", service.bot_user().username, reply.body);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_posted() {
        assert_eq!(parse("  hi @alice "), Some(Command::Post("hi @alice")));
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn commands_take_trimmed_arguments() {
        assert_eq!(parse("/user  bob "), Some(Command::User("bob")));
        assert_eq!(parse("/rooms"), Some(Command::Rooms("")));
        assert_eq!(parse("/users ali"), Some(Command::Users("ali")));
        assert_eq!(parse("/profile"), Some(Command::Profile("")));
        assert_eq!(parse("/topic Rust"), Some(Command::Topic("Rust")));
        assert_eq!(
            parse("/dm alice see you  "),
            Some(Command::Dm {
                to: "alice",
                text: "see you"
            })
        );
    }

    #[test]
    fn incomplete_or_unknown_commands_show_help() {
        assert_eq!(parse("/user"), Some(Command::Help));
        assert_eq!(parse("/dance"), Some(Command::Help));
        assert_eq!(parse("/dm alice"), Some(Command::Help));
        assert_eq!(parse("/topic"), Some(Command::Help));
    }
}
