//! The frame codec: explicit type-tagged, length-prefixed transport units.
//!
//! Layout on the wire:
//!
//! ```text
//! ┌──────────┬──────────────┬───────────────────┐
//! │ kind: u8 │ len: u32 BE  │ payload: len bytes│
//! └──────────┴──────────────┴───────────────────┘
//! ```
//!
//! Earlier revisions of this protocol sent bare byte blocks and relied on
//! the receiver counting bytes to tell a 9-byte status token from a 44-byte
//! key. The tag byte removes that guesswork: a receiver always knows what
//! it is assembling before the payload arrives.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ProtocolError;
use crate::handshake::{KEY_LEN, STATUS_LEN};

/// Upper bound on a frame payload. Chat messages are small; anything past
/// this is a confused or hostile peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// What a frame carries. The discriminants are the on-wire tag bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// A plaintext password attempt (client → server, handshake only).
    Password = 0x01,
    /// A fixed 9-byte handshake status token (server → client).
    Status = 0x02,
    /// The room's 44-byte symmetric key block (server → client).
    Key = 0x03,
    /// An encrypted message envelope (either direction, steady state).
    Ciphertext = 0x04,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x01 => Ok(Self::Password),
            0x02 => Ok(Self::Status),
            0x03 => Ok(Self::Key),
            0x04 => Ok(Self::Ciphertext),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => write!(f, "password"),
            Self::Status => write!(f, "status"),
            Self::Key => write!(f, "key"),
            Self::Ciphertext => write!(f, "ciphertext"),
        }
    }
}

/// One transport unit: a kind tag and its payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Vec<u8>,
}

impl Frame {
    /// A password attempt frame.
    pub fn password(attempt: &str) -> Self {
        Self {
            kind: FrameKind::Password,
            payload: attempt.as_bytes().to_vec(),
        }
    }

    /// A status frame. The token type enforces the exact 9-byte width.
    pub fn status(token: &[u8; STATUS_LEN]) -> Self {
        Self {
            kind: FrameKind::Status,
            payload: token.to_vec(),
        }
    }

    /// A key frame carrying the room's 44-byte key block verbatim.
    pub fn key(block: &[u8; KEY_LEN]) -> Self {
        Self {
            kind: FrameKind::Key,
            payload: block.to_vec(),
        }
    }

    /// A ciphertext frame wrapping an encrypted envelope.
    pub fn ciphertext(envelope: Vec<u8>) -> Self {
        Self {
            kind: FrameKind::Ciphertext,
            payload: envelope,
        }
    }

    /// Consumes the frame, returning the payload if the kind matches.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnexpectedFrame`] on a kind mismatch —
    /// the caller was in a protocol state where only `want` is legal.
    pub fn into_payload(self, want: FrameKind) -> Result<Vec<u8>, ProtocolError> {
        if self.kind == want {
            Ok(self.payload)
        } else {
            Err(ProtocolError::UnexpectedFrame {
                want,
                got: self.kind,
            })
        }
    }
}

/// Reads the next frame from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly at a
/// frame boundary. EOF in the middle of a frame is an error: the peer
/// went away mid-sentence.
///
/// # Errors
/// - [`ProtocolError::Io`] — socket failure or mid-frame EOF
/// - [`ProtocolError::UnknownKind`] — unrecognized tag byte
/// - [`ProtocolError::FrameTooLarge`] — declared length over [`MAX_FRAME_LEN`]
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let tag = match reader.read_u8().await {
        Ok(byte) => byte,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(ProtocolError::Io(e)),
    };
    let kind = FrameKind::from_byte(tag)?;

    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Frame { kind, payload }))
}

/// Writes one frame to the stream and flushes it.
///
/// # Errors
/// Returns [`ProtocolError::Io`] if the socket write fails.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_u8(frame.kind as u8).await?;
    writer.write_u32(frame.payload.len() as u32).await?;
    writer.write_all(&frame.payload).await?;
    writer.flush().await?;
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
