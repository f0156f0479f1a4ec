//! Error types for the moderation layer.

/// Errors from the sanction-vote state machine.
///
/// These are all "state errors": reported to the user who issued the
/// command, with no side effects on the vote or the room.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoteError {
    /// A vote is already running; only one may be active at a time.
    #[error("a vote is already in progress")]
    AlreadyRunning,

    /// A ballot or query arrived with no vote running.
    #[error("no vote is in progress")]
    NoVoteRunning,

    /// Fewer than two users were connected at vote start.
    #[error("at least 2 connected users are required to vote")]
    NotEnoughVoters,

    /// The voter was not in the room when the vote started.
    #[error("you were not in the room when the vote started")]
    NotEligible,

    /// The voter already cast a ballot in this vote.
    #[error("you have already voted")]
    AlreadyVoted,
}
