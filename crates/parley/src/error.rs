//! Unified error type for the server binary.

use parley_crypto::CryptoError;
use parley_protocol::ProtocolError;
use parley_protocol::handshake::Rejection;
use parley_room::RoomError;

/// Top-level error wrapping the crate-specific errors, plus the two
/// gateway outcomes that end a connection without being another crate's
/// fault: a rejection token was sent, or the handshake stalled.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// A wire-level error (malformed frames, socket failure mid-frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A cipher error (bad key material).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A room-level error (full, bad name, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A socket-level error outside the framed protocol (bind, accept).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The gateway turned the connection away with a status token.
    #[error("handshake rejected: {0}")]
    Rejected(Rejection),

    /// The client did not complete the handshake in time.
    #[error("handshake timed out")]
    HandshakeTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownKind(0x7F);
        let parley_err: ParleyError = err.into();
        assert!(matches!(parley_err, ParleyError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::RoomFull;
        let parley_err: ParleyError = err.into();
        assert!(matches!(parley_err, ParleyError::Room(_)));
        assert_eq!(parley_err.to_string(), "room is full");
    }

    #[test]
    fn test_rejection_display() {
        let err = ParleyError::Rejected(Rejection::WrongPassword);
        assert_eq!(err.to_string(), "handshake rejected: wrong password");
    }
}
