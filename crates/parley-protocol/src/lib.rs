//! Wire protocol for Parley.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Frames** ([`Frame`], [`FrameKind`]) — every transport unit is an
//!   explicit type-tagged, length-prefixed frame. Receivers match on the
//!   tag; they never infer what is coming from how many bytes have arrived.
//! - **Handshake tokens** ([`handshake`]) — the fixed 9-byte status words
//!   and the 44-byte key block, bit-exact.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while reading or
//!   writing frames.
//!
//! The protocol layer sits between the socket (raw bytes) and the room
//! (who said what). It knows nothing about usernames, keys, or votes —
//! only how bytes are delimited on the wire.

mod error;
mod frame;
pub mod handshake;

pub use error::ProtocolError;
pub use frame::{Frame, FrameKind, MAX_FRAME_LEN, read_frame, write_frame};
