//! Slash-command parsing for in-room messages.
//!
//! Anything starting with `/` is a command and never reaches chat; the
//! actor routes parsed commands to the matching handler. Parsing is
//! deliberately forgiving about case and spacing but strict about arity —
//! a malformed command becomes [`UserCommand::Unknown`] and earns a local
//! usage notice, never a broadcast.

use parley_moderation::Ballot;

/// A parsed in-room command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `/help`
    Help,
    /// `/leave`
    Leave,
    /// `/users`
    Users,
    /// `/info`
    Info,
    /// `/pm <user> <message>`
    Pm { target: String, message: String },
    /// `/togglepm`
    TogglePm,
    /// `/votekick <user>`
    VoteKick { target: String },
    /// `/votemute <user>`
    VoteMute { target: String },
    /// `/vote yes|no`
    Vote(Ballot),
    /// Anything unrecognized or malformed; carries the command word.
    Unknown(String),
}

impl UserCommand {
    /// Parses a message as a command. `None` means plain chat.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.splitn(2, char::is_whitespace);
        let word = parts.next().unwrap_or(text).to_lowercase();
        let rest = parts.next().unwrap_or("").trim();

        Some(match (word.as_str(), rest) {
            ("/help", _) => Self::Help,
            ("/leave", _) => Self::Leave,
            ("/users", _) => Self::Users,
            ("/info", _) => Self::Info,
            ("/togglepm", _) => Self::TogglePm,
            ("/pm", rest) => {
                let mut args = rest.splitn(2, char::is_whitespace);
                match (args.next(), args.next()) {
                    (Some(target), Some(message))
                        if !target.is_empty() && !message.trim().is_empty() =>
                    {
                        Self::Pm {
                            target: target.to_owned(),
                            message: message.trim().to_owned(),
                        }
                    }
                    _ => Self::Unknown(word),
                }
            }
            ("/votekick", target) if !target.is_empty() => Self::VoteKick {
                target: target.to_owned(),
            },
            ("/votemute", target) if !target.is_empty() => Self::VoteMute {
                target: target.to_owned(),
            },
            ("/vote", arg) => match arg.to_lowercase().as_str() {
                "yes" => Self::Vote(Ballot::For),
                "no" => Self::Vote(Ballot::Against),
                _ => Self::Unknown(word),
            },
            _ => Self::Unknown(word),
        })
    }
}

/// The `/help` text sent back to the requesting session.
pub(crate) const HELP_TEXT: &str = "Available commands:\n\
    /help - show this list\n\
    /leave - leave the room\n\
    /users - list connected users\n\
    /info - show room details\n\
    /pm <user> <message> - private message\n\
    /togglepm - block or unblock private messages\n\
    /votekick <user> - start a vote to kick\n\
    /votemute <user> - start a vote to mute\n\
    /vote yes|no - vote in the current ballot";

// =========================================================================
// Tests
// =========================================================================
