//! The admin console: a local stdin loop with room-operator powers.
//!
//! Console commands never touch the network protocol — they go straight
//! to the room actor over its command channel. The loop must survive any
//! session failure, so errors talking to the room are printed and
//! swallowed, never propagated.

use parley_room::RoomHandle;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ShutdownHandle;

/// Mute length when the admin omits the minutes argument.
const DEFAULT_MUTE_MINUTES: u64 = 5;

const DEFAULT_WARN_REASON: &str = "Please follow the room rules.";
const DEFAULT_KICK_REASON: &str = "removed by an administrator";

const USAGE: &str = "Commands: users, warn <user> [reason], mute <user> [minutes], \
                     unmute <user>, kick <user> [reason], broadcast <message>, exit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AdminCommand {
    Users,
    Warn { username: String, reason: String },
    /// `minutes` 0 means permanent.
    Mute { username: String, minutes: u64 },
    Unmute { username: String },
    Kick { username: String, reason: String },
    Broadcast { message: String },
    Exit,
    Unknown,
}

impl AdminCommand {
    /// Parses one console line. `None` for a blank line.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let word = parts.next().unwrap_or(line).to_lowercase();
        let rest = parts.next().unwrap_or("").trim();

        Some(match (word.as_str(), rest) {
            ("users", _) => Self::Users,
            ("exit", _) => Self::Exit,
            ("broadcast", message) if !message.is_empty() => Self::Broadcast {
                message: message.to_owned(),
            },
            ("warn", rest) if !rest.is_empty() => {
                let (username, reason) = split_user_arg(rest, DEFAULT_WARN_REASON);
                Self::Warn { username, reason }
            }
            ("kick", rest) if !rest.is_empty() => {
                let (username, reason) = split_user_arg(rest, DEFAULT_KICK_REASON);
                Self::Kick { username, reason }
            }
            ("mute", rest) if !rest.is_empty() => {
                let mut args = rest.split_whitespace();
                let username = args.next().unwrap_or(rest).to_owned();
                match args.next() {
                    None => Self::Mute {
                        username,
                        minutes: DEFAULT_MUTE_MINUTES,
                    },
                    Some(raw) => match raw.parse() {
                        Ok(minutes) => Self::Mute { username, minutes },
                        Err(_) => Self::Unknown,
                    },
                }
            }
            ("unmute", username) if !username.is_empty() => Self::Unmute {
                username: username.to_owned(),
            },
            _ => Self::Unknown,
        })
    }
}

/// Splits `<user> [trailing text]`, falling back to a default.
fn split_user_arg(rest: &str, default: &str) -> (String, String) {
    let mut args = rest.splitn(2, char::is_whitespace);
    let username = args.next().unwrap_or(rest).to_owned();
    let trailing = args
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_owned();
    (username, trailing)
}

/// Runs the console loop until `exit` or stdin closes.
pub async fn run(room: RoomHandle, shutdown: ShutdownHandle) {
    println!("Admin console ready. {USAGE}.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(%error, "console read failed");
                break;
            }
        };
        let Some(cmd) = AdminCommand::parse(&line) else {
            continue;
        };
        if execute(&room, &shutdown, cmd).await {
            break;
        }
    }
}

/// Executes one command. Returns `true` when the console should stop.
async fn execute(room: &RoomHandle, shutdown: &ShutdownHandle, cmd: AdminCommand) -> bool {
    match cmd {
        AdminCommand::Users => match room.users().await {
            Ok(names) if names.is_empty() => println!("No users connected."),
            Ok(names) => println!("Connected ({}): {}", names.len(), names.join(", ")),
            Err(error) => println!("Room unavailable: {error}"),
        },
        AdminCommand::Warn { username, reason } => {
            match room.warn(username.clone(), reason).await {
                Ok(true) => println!("Warned {username}."),
                Ok(false) => println!("No user named {username} is connected."),
                Err(error) => println!("Room unavailable: {error}"),
            }
        }
        AdminCommand::Mute { username, minutes } => {
            match room.mute(username.clone(), minutes).await {
                Ok(notified) => {
                    let span = if minutes == 0 {
                        "permanently".to_owned()
                    } else {
                        format!("for {minutes} minute(s)")
                    };
                    if notified {
                        println!("Muted {username} {span}.");
                    } else {
                        println!("Muted {username} {span} (not currently connected).");
                    }
                }
                Err(error) => println!("Room unavailable: {error}"),
            }
        }
        AdminCommand::Unmute { username } => match room.unmute(username.clone()).await {
            Ok(true) => println!("Unmuted {username}."),
            Ok(false) => println!("{username} was not muted."),
            Err(error) => println!("Room unavailable: {error}"),
        },
        AdminCommand::Kick { username, reason } => {
            match room.kick(username.clone(), reason).await {
                Ok(true) => println!("Kicked {username}."),
                Ok(false) => println!("No user named {username} is connected."),
                Err(error) => println!("Room unavailable: {error}"),
            }
        }
        AdminCommand::Broadcast { message } => match room.broadcast(message).await {
            Ok(()) => println!("Announcement sent."),
            Err(error) => println!("Room unavailable: {error}"),
        },
        AdminCommand::Exit => {
            println!("Shutting down.");
            if let Err(error) = room.shutdown().await {
                tracing::warn!(%error, "room already stopped");
            }
            shutdown.trigger();
            return true;
        }
        AdminCommand::Unknown => println!("Unknown command. {USAGE}."),
    }
    false
}

// =========================================================================
// Tests
// =========================================================================
