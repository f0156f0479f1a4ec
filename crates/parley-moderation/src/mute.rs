//! The mute table: who may not speak, and until when.
//!
//! Mutes are keyed by lowercased username, not by session — a mute
//! outlives a disconnect and applies to the next connection that registers
//! under the same name. Expiry is checked lazily at the point of use;
//! there is no timer sweeping the table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// When a mute ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuteExpiry {
    /// Never, short of an explicit unmute.
    Permanent,
    /// At the given instant.
    Until(Instant),
}

/// The result of checking a name against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteStatus {
    /// No active mute; any expired entry has been removed.
    NotMuted,
    /// Muted. `remaining` is `None` for a permanent mute.
    Active { remaining: Option<Duration> },
}

/// Name-keyed mute entries for one room.
#[derive(Debug, Default)]
pub struct MuteTable {
    entries: HashMap<String, MuteExpiry>,
}

impl MuteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutes a username. `duration: None` is a permanent mute.
    /// Re-muting replaces any existing entry.
    pub fn mute(&mut self, username: &str, duration: Option<Duration>, now: Instant) {
        let expiry = match duration {
            Some(d) => MuteExpiry::Until(now + d),
            None => MuteExpiry::Permanent,
        };
        self.entries.insert(username.to_lowercase(), expiry);
    }

    /// Removes a mute. Returns `true` if an entry existed.
    pub fn unmute(&mut self, username: &str) -> bool {
        self.entries.remove(&username.to_lowercase()).is_some()
    }

    /// Checks whether a username is muted at `now`.
    ///
    /// An entry whose expiry has passed is removed here — this is the lazy
    /// expiry path, so a caller that sees [`MuteStatus::NotMuted`] can
    /// proceed without a second lookup.
    pub fn check(&mut self, username: &str, now: Instant) -> MuteStatus {
        let key = username.to_lowercase();
        match self.entries.get(&key) {
            None => MuteStatus::NotMuted,
            Some(MuteExpiry::Permanent) => MuteStatus::Active { remaining: None },
            Some(MuteExpiry::Until(until)) => {
                if now < *until {
                    MuteStatus::Active {
                        remaining: Some(*until - now),
                    }
                } else {
                    self.entries.remove(&key);
                    MuteStatus::NotMuted
                }
            }
        }
    }

    /// Number of entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_unknown_name_not_muted() {
        let mut table = MuteTable::new();
        assert_eq!(table.check("alice", Instant::now()), MuteStatus::NotMuted);
    }

    #[test]
    fn test_timed_mute_active_within_duration() {
        let mut table = MuteTable::new();
        let now = Instant::now();
        table.mute("alice", Some(Duration::from_secs(300)), now);

        let later = now + Duration::from_secs(60);
        match table.check("alice", later) {
            MuteStatus::Active {
                remaining: Some(rem),
            } => assert_eq!(rem, Duration::from_secs(240)),
            other => panic!("expected active timed mute, got {other:?}"),
        }
    }

    #[test]
    fn test_timed_mute_expires_and_entry_is_removed() {
        let mut table = MuteTable::new();
        let now = Instant::now();
        table.mute("alice", Some(Duration::from_secs(300)), now);

        let after = now + Duration::from_secs(301);
        assert_eq!(table.check("alice", after), MuteStatus::NotMuted);
        // Lazy removal: the expired entry must be gone.
        assert!(table.is_empty());
    }

    #[test]
    fn test_permanent_mute_never_expires() {
        let mut table = MuteTable::new();
        let now = Instant::now();
        table.mute("alice", None, now);

        let much_later = now + Duration::from_secs(60 * 60 * 24);
        assert_eq!(
            table.check("alice", much_later),
            MuteStatus::Active { remaining: None }
        );
    }

    #[test]
    fn test_mute_is_case_insensitive() {
        // "Bob" is muted; "bob" and "BOB" are the same person.
        let mut table = MuteTable::new();
        let now = Instant::now();
        table.mute("Bob", None, now);

        assert_ne!(table.check("bob", now), MuteStatus::NotMuted);
        assert_ne!(table.check("BOB", now), MuteStatus::NotMuted);
        assert!(table.unmute("bOb"));
        assert_eq!(table.check("Bob", now), MuteStatus::NotMuted);
    }

    #[test]
    fn test_unmute_missing_entry_returns_false() {
        let mut table = MuteTable::new();
        assert!(!table.unmute("ghost"));
    }

    #[test]
    fn test_remute_replaces_existing_entry() {
        // A permanent mute shortened to a timed one takes the new expiry.
        let mut table = MuteTable::new();
        let now = Instant::now();
        table.mute("alice", None, now);
        table.mute("alice", Some(Duration::from_secs(10)), now);

        let after = now + Duration::from_secs(11);
        assert_eq!(table.check("alice", after), MuteStatus::NotMuted);
    }
}
