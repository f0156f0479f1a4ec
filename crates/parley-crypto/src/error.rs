//! Error types for the cipher service.

/// Errors from key handling and the message envelope.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The bytes are not a valid key encoding.
    #[error("invalid room key encoding")]
    InvalidKey,

    /// The envelope failed authentication or was produced under a
    /// different key. Deliberately carries no detail: the cipher does not
    /// distinguish corruption from a wrong key.
    #[error("failed to decrypt message envelope")]
    Decrypt,
}
