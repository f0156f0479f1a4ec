//! Error types for the protocol layer.

use crate::FrameKind;

/// Errors that can occur while reading or writing frames.
///
/// An `Io` error mid-frame is fatal to that connection; the other variants
/// mean the peer is speaking something that isn't this protocol, which is
/// grounds for rejecting the connection without a retry.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The underlying socket failed or closed mid-frame.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame header carried a tag byte we don't know.
    #[error("unknown frame kind 0x{0:02x}")]
    UnknownKind(u8),

    /// The declared payload length exceeds [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).
    #[error("frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),

    /// A well-formed frame arrived where a different kind was required,
    /// e.g. a chat payload during the password step of the handshake.
    #[error("unexpected {got} frame, expected {want}")]
    UnexpectedFrame { want: FrameKind, got: FrameKind },
}
