//! The sanction-vote state machine: community kick/mute ballots.
//!
//! At most one vote runs per room. The eligible-voter set is an immutable
//! snapshot taken at vote start — users joining later cannot vote, and
//! membership churn never edits the record. Resolution is re-evaluated
//! after every ballot (and after departures, by the owner of the room
//! state) against the live membership.

use std::collections::BTreeSet;

use crate::VoteError;

/// What the community is voting to do to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanction {
    /// Remove the target from the room.
    Kick,
    /// Mute the target for a fixed duration.
    Mute,
}

impl std::fmt::Display for Sanction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kick => write!(f, "kick"),
            Self::Mute => write!(f, "mute"),
        }
    }
}

/// One voter's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ballot {
    For,
    Against,
}

/// How a vote resolved. Producing one of these clears the coordinator
/// back to idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The live eligible set fell below two voters.
    Cancelled,
    /// The motion carried; the sanction must now be executed.
    Passed {
        sanction: Sanction,
        target: String,
        votes_for: usize,
    },
    /// The motion failed; nothing happens to the target.
    Failed {
        target: String,
        votes_for: usize,
        votes_against: usize,
    },
}

/// An in-progress vote: the ballot record.
///
/// `eligible` is written once in [`SanctionVote::new`] and never mutated
/// afterwards; all later membership changes are reflected only through the
/// `connected` set passed to [`tally`](Self::tally).
#[derive(Debug)]
pub struct SanctionVote {
    sanction: Sanction,
    target: String,
    eligible: BTreeSet<String>,
    votes_for: BTreeSet<String>,
    votes_against: BTreeSet<String>,
}

impl SanctionVote {
    fn new(
        sanction: Sanction,
        target: String,
        initiator: &str,
        eligible: BTreeSet<String>,
    ) -> Self {
        let mut votes_for = BTreeSet::new();
        votes_for.insert(initiator.to_owned());
        Self {
            sanction,
            target,
            eligible,
            votes_for,
            votes_against: BTreeSet::new(),
        }
    }

    /// The sanction being voted on.
    pub fn sanction(&self) -> Sanction {
        self.sanction
    }

    /// The username the vote targets.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Ballots needed for either side to carry: a strict majority of the
    /// snapshot.
    pub fn required(&self) -> usize {
        self.eligible.len() / 2 + 1
    }

    /// Records one ballot.
    ///
    /// # Errors
    /// - [`VoteError::NotEligible`] — voter absent from the snapshot
    /// - [`VoteError::AlreadyVoted`] — voter already has a ballot down
    pub fn cast(&mut self, voter: &str, ballot: Ballot) -> Result<(), VoteError> {
        if !self.eligible.contains(voter) {
            return Err(VoteError::NotEligible);
        }
        if self.votes_for.contains(voter) || self.votes_against.contains(voter) {
            return Err(VoteError::AlreadyVoted);
        }
        match ballot {
            Ballot::For => self.votes_for.insert(voter.to_owned()),
            Ballot::Against => self.votes_against.insert(voter.to_owned()),
        };
        Ok(())
    }

    /// Evaluates the vote against the currently connected usernames.
    /// Returns `None` while the vote stays open.
    fn tally(&self, connected: &BTreeSet<String>) -> Option<VoteOutcome> {
        let live_eligible = self.eligible.intersection(connected).count();
        if live_eligible < 2 {
            return Some(VoteOutcome::Cancelled);
        }

        let required = self.required();
        let votes_for = self.votes_for.len();
        let votes_against = self.votes_against.len();

        if votes_for >= required {
            return Some(VoteOutcome::Passed {
                sanction: self.sanction,
                target: self.target.clone(),
                votes_for,
            });
        }
        if votes_against >= required || votes_for + votes_against == self.eligible.len() {
            return Some(VoteOutcome::Failed {
                target: self.target.clone(),
                votes_for,
                votes_against,
            });
        }
        None
    }
}

/// The room-wide vote slot: idle, or holding one [`SanctionVote`].
#[derive(Debug, Default)]
pub struct VoteCoordinator {
    current: Option<SanctionVote>,
}

impl VoteCoordinator {
    /// Creates an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a vote is open.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// The open vote, if any.
    pub fn current(&self) -> Option<&SanctionVote> {
        self.current.as_ref()
    }

    /// Opens a vote, snapshotting `eligible` and counting the initiator
    /// as the first "for" ballot.
    ///
    /// The caller is responsible for target checks that need room state
    /// (target connected, target ≠ initiator).
    ///
    /// # Errors
    /// - [`VoteError::AlreadyRunning`] — a vote is already open
    /// - [`VoteError::NotEnoughVoters`] — fewer than two eligible users
    pub fn start(
        &mut self,
        sanction: Sanction,
        target: String,
        initiator: &str,
        eligible: BTreeSet<String>,
    ) -> Result<&SanctionVote, VoteError> {
        if self.current.is_some() {
            return Err(VoteError::AlreadyRunning);
        }
        if eligible.len() < 2 {
            return Err(VoteError::NotEnoughVoters);
        }
        tracing::info!(%sanction, %target, voters = eligible.len(), "vote started");
        self.current = Some(SanctionVote::new(sanction, target, initiator, eligible));
        Ok(self.current.as_ref().unwrap_or_else(|| unreachable!()))
    }

    /// Casts a ballot in the open vote.
    ///
    /// # Errors
    /// [`VoteError::NoVoteRunning`] when idle, plus the errors of
    /// [`SanctionVote::cast`].
    pub fn cast(&mut self, voter: &str, ballot: Ballot) -> Result<(), VoteError> {
        match &mut self.current {
            Some(vote) => vote.cast(voter, ballot),
            None => Err(VoteError::NoVoteRunning),
        }
    }

    /// Re-evaluates the open vote against current membership. On any
    /// outcome the slot clears back to idle; `None` leaves it open.
    pub fn resolve(&mut self, connected: &BTreeSet<String>) -> Option<VoteOutcome> {
        let outcome = self.current.as_ref()?.tally(connected)?;
        tracing::info!(outcome = ?outcome, "vote resolved");
        self.current = None;
        Some(outcome)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    /// Starts a kick vote by alice against carol with the given room.
    fn start_kick(coord: &mut VoteCoordinator, room: &[&str]) {
        coord
            .start(Sanction::Kick, "carol".into(), "alice", names(room))
            .expect("vote should start");
    }

    #[test]
    fn test_start_with_one_user_rejected() {
        let mut coord = VoteCoordinator::new();
        let result = coord.start(Sanction::Kick, "carol".into(), "alice", names(&["alice"]));
        assert_eq!(result.err(), Some(VoteError::NotEnoughVoters));
        assert!(!coord.in_progress());
    }

    #[test]
    fn test_second_vote_while_open_rejected() {
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);
        let result = coord.start(Sanction::Mute, "bob".into(), "carol", names(&["alice", "bob"]));
        assert_eq!(result.err(), Some(VoteError::AlreadyRunning));
    }

    #[test]
    fn test_initiator_counts_as_first_for_ballot() {
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);
        assert_eq!(
            coord.cast("alice", Ballot::For),
            Err(VoteError::AlreadyVoted)
        );
    }

    #[test]
    fn test_three_voters_pass_at_two_for() {
        // required = 3/2 + 1 = 2; alice (initiator) + bob carries it.
        let room = names(&["alice", "bob", "carol"]);
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);
        assert_eq!(coord.resolve(&room), None, "one ballot keeps it open");

        coord.cast("bob", Ballot::For).unwrap();
        match coord.resolve(&room) {
            Some(VoteOutcome::Passed {
                sanction: Sanction::Kick,
                target,
                votes_for,
            }) => {
                assert_eq!(target, "carol");
                assert_eq!(votes_for, 2);
            }
            other => panic!("expected pass, got {other:?}"),
        }
        assert!(!coord.in_progress(), "resolution clears the slot");
    }

    #[test]
    fn test_three_voters_fail_at_two_against() {
        let room = names(&["alice", "bob", "carol"]);
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);

        coord.cast("bob", Ballot::Against).unwrap();
        assert_eq!(coord.resolve(&room), None);
        coord.cast("carol", Ballot::Against).unwrap();

        match coord.resolve(&room) {
            Some(VoteOutcome::Failed {
                votes_for,
                votes_against,
                ..
            }) => {
                assert_eq!(votes_for, 1);
                assert_eq!(votes_against, 2);
            }
            other => panic!("expected fail, got {other:?}"),
        }
    }

    #[test]
    fn test_all_ballots_in_without_majority_fails() {
        // Four voters, required = 3. Ends 2-2: everyone voted, nobody won.
        let room = names(&["alice", "bob", "carol", "dave"]);
        let mut coord = VoteCoordinator::new();
        coord
            .start(Sanction::Mute, "dave".into(), "alice", room.clone())
            .unwrap();

        coord.cast("bob", Ballot::For).unwrap();
        assert_eq!(coord.resolve(&room), None);
        coord.cast("carol", Ballot::Against).unwrap();
        assert_eq!(coord.resolve(&room), None);
        coord.cast("dave", Ballot::Against).unwrap();

        assert!(matches!(
            coord.resolve(&room),
            Some(VoteOutcome::Failed {
                votes_for: 2,
                votes_against: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_outsider_ballot_never_changes_tally() {
        let room = names(&["alice", "bob", "carol"]);
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);

        // "mallory" joined after the snapshot.
        assert_eq!(
            coord.cast("mallory", Ballot::For),
            Err(VoteError::NotEligible)
        );
        assert_eq!(coord.resolve(&room), None, "tally unchanged");
    }

    #[test]
    fn test_double_ballot_rejected() {
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);
        coord.cast("bob", Ballot::Against).unwrap();
        assert_eq!(coord.cast("bob", Ballot::For), Err(VoteError::AlreadyVoted));
    }

    #[test]
    fn test_live_eligible_below_two_cancels() {
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol"]);

        // bob and carol disconnect; only alice of the snapshot remains.
        let remaining = names(&["alice"]);
        assert_eq!(coord.resolve(&remaining), Some(VoteOutcome::Cancelled));
        assert!(!coord.in_progress());
    }

    #[test]
    fn test_required_majority_uses_snapshot_size() {
        let mut coord = VoteCoordinator::new();
        start_kick(&mut coord, &["alice", "bob", "carol", "dave", "erin"]);
        assert_eq!(coord.current().unwrap().required(), 3);
    }

    #[test]
    fn test_cast_when_idle_rejected() {
        let mut coord = VoteCoordinator::new();
        assert_eq!(
            coord.cast("alice", Ballot::For),
            Err(VoteError::NoVoteRunning)
        );
    }

    #[test]
    fn test_resolve_when_idle_is_none() {
        let mut coord = VoteCoordinator::new();
        assert_eq!(coord.resolve(&names(&["alice", "bob"])), None);
    }
}
