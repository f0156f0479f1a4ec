//! Error types for the room actor.

/// Errors surfaced to the gateway and admin console by room operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    /// The room is at capacity.
    #[error("room is full")]
    RoomFull,

    /// The username is already registered (case-insensitively).
    #[error("username {0:?} is already taken")]
    NameTaken(String),

    /// The username failed validation.
    #[error("username {0:?} is not valid")]
    InvalidName(String),

    /// The room actor is gone; its channel is closed.
    #[error("room is unavailable")]
    Unavailable,
}
