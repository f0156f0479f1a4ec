//! Moderation state machines for Parley.
//!
//! Everything in this crate is pure state with injected clocks — no I/O,
//! no channels, no sockets. The room actor owns one of each and drives
//! them; delivering notices and executing sanctions is its job, deciding
//! them is ours.
//!
//! # Key types
//!
//! - [`MuteTable`] — name-keyed mutes with lazy expiry
//! - [`SpamTracker`] — per-session message window and penalty tiers
//! - [`VoteCoordinator`] — the one-at-a-time sanction vote state machine

mod error;
mod mute;
mod spam;
mod vote;

pub use error::VoteError;
pub use mute::{MuteStatus, MuteTable};
pub use spam::{SPAM_LIMIT, SPAM_MUTE, SPAM_WINDOW, SpamPenalty, SpamTracker};
pub use vote::{Ballot, Sanction, SanctionVote, VoteCoordinator, VoteOutcome};
