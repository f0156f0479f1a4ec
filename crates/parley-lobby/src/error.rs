//! Error types for the lobby directory.

/// Errors writing the directory file.
///
/// Reads never produce these: an unreadable or corrupt file is treated as
/// an empty directory so a broken lobby can never take a room down.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The directory file could not be written.
    #[error("failed to write lobby file: {0}")]
    Io(#[from] std::io::Error),

    /// The listings could not be serialized.
    #[error("failed to encode lobby file: {0}")]
    Encode(#[from] serde_json::Error),
}
