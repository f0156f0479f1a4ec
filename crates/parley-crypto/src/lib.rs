//! The cipher service: room keys and the symmetric message envelope.
//!
//! Every room has one immutable symmetric key, generated at room creation
//! and shared with every client during the handshake. Messages travel as
//! Fernet tokens — a self-describing authenticated envelope, so a decrypt
//! failure means corruption or the wrong key, never silent garbage.
//!
//! The key's textual encoding is exactly
//! [`KEY_LEN`](parley_protocol::handshake::KEY_LEN) bytes (44 chars of
//! url-safe base64), which is what the gateway transmits verbatim.

mod error;

pub use error::CryptoError;

use fernet::Fernet;
use parley_protocol::handshake::KEY_LEN;

/// A room's symmetric key in its standard textual encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomKey(String);

impl RoomKey {
    /// Generates a fresh random key. Called once per room lifetime.
    pub fn generate() -> Self {
        Self(Fernet::generate_key())
    }

    /// Parses a key from its wire bytes, validating the encoding.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKey`] if the bytes are not a valid
    /// 44-byte key encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let text = std::str::from_utf8(bytes).map_err(|_| CryptoError::InvalidKey)?;
        if text.len() != KEY_LEN || Fernet::new(text).is_none() {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self(text.to_owned()))
    }

    /// The key's wire representation: exactly [`KEY_LEN`] bytes.
    pub fn as_block(&self) -> &[u8; KEY_LEN] {
        // The encoding is validated at construction in both paths.
        self.0
            .as_bytes()
            .try_into()
            .unwrap_or_else(|_| unreachable!("room keys are always {KEY_LEN} bytes"))
    }
}

/// Encrypts and decrypts message envelopes with a room's key.
///
/// Cheap to construct from a [`RoomKey`]; the server builds one for the
/// room actor and one for the gateway, both from the same key.
pub struct RoomCipher {
    fernet: Fernet,
}

impl RoomCipher {
    /// Builds a cipher for the given room key.
    pub fn new(key: &RoomKey) -> Self {
        // RoomKey is validated at construction, so this cannot fail.
        let fernet = Fernet::new(&key.0)
            .unwrap_or_else(|| unreachable!("RoomKey is always a valid fernet key"));
        Self { fernet }
    }

    /// Encrypts a plaintext message into a wire envelope.
    pub fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        self.fernet.encrypt(plaintext.as_bytes()).into_bytes()
    }

    /// Decrypts a wire envelope back to the plaintext message.
    ///
    /// # Errors
    /// Returns [`CryptoError::Decrypt`] if the envelope is malformed, was
    /// tampered with, or was produced under a different key.
    pub fn decrypt(&self, envelope: &[u8]) -> Result<String, CryptoError> {
        let token = std::str::from_utf8(envelope).map_err(|_| CryptoError::Decrypt)?;
        let plaintext = self.fernet.decrypt(token).map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decrypt)
    }
}

// =========================================================================
// Tests
// =========================================================================
