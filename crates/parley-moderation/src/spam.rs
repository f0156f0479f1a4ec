//! Anti-spam escalation: a per-session message window with tiered penalties.
//!
//! Only plain chat messages count — commands never feed the tracker. A
//! message landing within [`SPAM_WINDOW`] of the window start increments
//! the counter; one landing later restarts the window at 1. Crossing
//! [`SPAM_LIMIT`] inside a window is an infraction, and infractions
//! escalate: warn, then a timed mute, then a kick.

use std::time::{Duration, Instant};

/// Width of the counting window.
pub const SPAM_WINDOW: Duration = Duration::from_secs(5);

/// Messages allowed inside one window; exceeding this is an infraction.
pub const SPAM_LIMIT: u32 = 10;

/// Mute length applied at the second infraction.
pub const SPAM_MUTE: Duration = Duration::from_secs(5 * 60);

/// The penalty tier reached by an infraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamPenalty {
    /// First infraction: a warning.
    Warn,
    /// Second infraction: a timed mute.
    TimedMute(Duration),
    /// Third and later: removal from the room.
    Kick,
}

/// Per-session spam state. Created when the session registers.
#[derive(Debug)]
pub struct SpamTracker {
    window_start: Instant,
    count: u32,
    infractions: u32,
}

impl SpamTracker {
    /// Creates a tracker with an empty window starting at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            infractions: 0,
        }
    }

    /// Records one chat message at `now`.
    ///
    /// Returns the penalty tier if this message pushed the session over
    /// the limit; the counter resets so the next infraction needs a fresh
    /// burst. Infractions themselves never reset for the life of the
    /// session.
    pub fn record(&mut self, now: Instant) -> Option<SpamPenalty> {
        if now.duration_since(self.window_start) < SPAM_WINDOW {
            self.count += 1;
        } else {
            self.window_start = now;
            self.count = 1;
        }

        if self.count <= SPAM_LIMIT {
            return None;
        }

        self.infractions += 1;
        self.count = 0;
        Some(match self.infractions {
            1 => SpamPenalty::Warn,
            2 => SpamPenalty::TimedMute(SPAM_MUTE),
            _ => SpamPenalty::Kick,
        })
    }

    /// Infractions accumulated so far.
    pub fn infractions(&self) -> u32 {
        self.infractions
    }
}

// =========================================================================
// Tests
// =========================================================================
