//! Handshake status tokens and rejection reasons.
//!
//! The status words are fixed 9-byte ASCII, space-padded, and the key block
//! is exactly 44 bytes — both bit-exact for compatibility with existing
//! clients. Inside the framed protocol the widths are no longer needed for
//! disambiguation, but the payloads themselves must not change.

/// Width of every status token, in bytes.
pub const STATUS_LEN: usize = 9;

/// Width of the room key block: the cipher's standard textual key encoding.
pub const KEY_LEN: usize = 44;

/// Wrong password.
pub const STATUS_FAIL: &[u8; STATUS_LEN] = b"FAIL     ";

/// The room is at capacity.
pub const STATUS_FAIL_FULL: &[u8; STATUS_LEN] = b"FAIL_FULL";

/// The username was invalid, duplicate, or failed to decrypt.
pub const STATUS_FAIL_NAME: &[u8; STATUS_LEN] = b"FAIL_NAME";

/// Registration accepted; the session is live.
pub const STATUS_OK_NAME: &[u8; STATUS_LEN] = b"OK_NAME  ";

/// Why the gateway turned a connection away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The password attempt did not match the room password.
    WrongPassword,
    /// The registry is at capacity.
    RoomFull,
    /// The username failed validation, duplicated a live session, or
    /// could not be decrypted.
    BadName,
}

impl Rejection {
    /// The status token sent to the client for this rejection.
    pub fn token(self) -> &'static [u8; STATUS_LEN] {
        match self {
            Self::WrongPassword => STATUS_FAIL,
            Self::RoomFull => STATUS_FAIL_FULL,
            Self::BadName => STATUS_FAIL_NAME,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongPassword => write!(f, "wrong password"),
            Self::RoomFull => write!(f, "room full"),
            Self::BadName => write!(f, "bad username"),
        }
    }
}
