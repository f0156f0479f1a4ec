//! Room actor: one Tokio task that owns everything about a room.
//!
//! The registry, the mute table, the vote state, and the lobby handle all
//! live inside the actor; the rest of the server talks to it through
//! `RoomCommand`s on an mpsc channel. No shared mutable state and no
//! locks held across socket I/O — serialization comes from message
//! passing.

use std::time::{Duration, Instant};

use parley_crypto::RoomCipher;
use parley_lobby::LobbyDirectory;
use parley_moderation::{
    Ballot, MuteStatus, MuteTable, Sanction, SpamPenalty, VoteCoordinator, VoteError, VoteOutcome,
};
use tokio::sync::{mpsc, oneshot};

use crate::dispatch::{HELP_TEXT, UserCommand};
use crate::registry::ClientRegistry;
use crate::{RoomConfig, RoomError, SessionId};

/// Mute length applied when a vote-mute passes.
const VOTE_MUTE: Duration = Duration::from_secs(10 * 60);

/// An outbound item from the room actor to one connection task.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// An encrypted envelope to forward to the client.
    Message(Vec<u8>),
    /// A final encrypted notice. The connection task must deliver it,
    /// close the socket, and run its normal disconnect cleanup.
    Kick(Vec<u8>),
}

/// Sending half of a session's delivery channel.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Receiving half, held by the connection task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Commands sent to the room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/reply; the rest are
/// fire-and-forget.
pub(crate) enum RoomCommand {
    /// Register an authenticated connection under a username.
    Join {
        username: String,
        sender: OutboundSender,
        reply: oneshot::Sender<Result<SessionId, RoomError>>,
    },

    /// Remove a session (disconnect, kick follow-up, or explicit leave).
    Leave { session: SessionId },

    /// A decrypted message from a registered session.
    Inbound { session: SessionId, text: String },

    /// Current member count and capacity.
    Occupancy {
        reply: oneshot::Sender<(usize, usize)>,
    },

    /// Sorted usernames of everyone connected.
    Users { reply: oneshot::Sender<Vec<String>> },

    /// Admin warning. Replies whether the target was found.
    Warn {
        username: String,
        reason: String,
        reply: oneshot::Sender<bool>,
    },

    /// Admin mute; `minutes` 0 means permanent. Replies whether the
    /// target was connected to be notified.
    Mute {
        username: String,
        minutes: u64,
        reply: oneshot::Sender<bool>,
    },

    /// Admin unmute. Replies whether an entry existed.
    Unmute {
        username: String,
        reply: oneshot::Sender<bool>,
    },

    /// Admin kick. Replies whether the target was found.
    Kick {
        username: String,
        reason: String,
        reply: oneshot::Sender<bool>,
    },

    /// Admin announcement to everyone.
    Broadcast { text: String },

    /// Tear the room down: notify clients, drop the lobby entry, stop.
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone — a wrapper around the command channel sender. Held by
/// the gateway, every connection task, and the admin console.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Registers a connection under `username`, returning its session id.
    pub async fn join(
        &self,
        username: String,
        sender: OutboundSender,
    ) -> Result<SessionId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                username,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Unregisters a session. Safe to call more than once.
    pub async fn leave(&self, session: SessionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { session })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Delivers one decrypted message from a session.
    pub async fn inbound(&self, session: SessionId, text: String) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Inbound { session, text })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Current `(members, capacity)`; capacity 0 means unbounded.
    pub async fn occupancy(&self) -> Result<(usize, usize), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Occupancy { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Sorted usernames of everyone connected.
    pub async fn users(&self) -> Result<Vec<String>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Users { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Sends an admin warning. `Ok(false)` means no such user.
    pub async fn warn(&self, username: String, reason: String) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Warn {
                username,
                reason,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Mutes a username; 0 minutes is permanent. `Ok(false)` means the
    /// target was offline (the mute is recorded regardless).
    pub async fn mute(&self, username: String, minutes: u64) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Mute {
                username,
                minutes,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Lifts a mute. `Ok(false)` means there was no entry.
    pub async fn unmute(&self, username: String) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Unmute {
                username,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Kicks a username. `Ok(false)` means no such user.
    pub async fn kick(&self, username: String, reason: String) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Kick {
                username,
                reason,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Broadcasts an admin announcement.
    pub async fn broadcast(&self, text: String) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Broadcast { text })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Tells the room to tear down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    config: RoomConfig,
    registry: ClientRegistry,
    mutes: MuteTable,
    votes: VoteCoordinator,
    cipher: RoomCipher,
    lobby: Option<LobbyDirectory>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room = %self.config.name, port = self.config.port, "room actor started");
        self.lobby_register();

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    username,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(&username, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { session } => {
                    self.handle_leave(session);
                }
                RoomCommand::Inbound { session, text } => {
                    self.handle_inbound(session, &text);
                }
                RoomCommand::Occupancy { reply } => {
                    let _ = reply.send((self.registry.len(), self.registry.capacity()));
                }
                RoomCommand::Users { reply } => {
                    let _ = reply.send(self.registry.usernames());
                }
                RoomCommand::Warn {
                    username,
                    reason,
                    reply,
                } => {
                    let _ = reply.send(self.handle_warn(&username, &reason));
                }
                RoomCommand::Mute {
                    username,
                    minutes,
                    reply,
                } => {
                    let _ = reply.send(self.handle_mute(&username, minutes));
                }
                RoomCommand::Unmute { username, reply } => {
                    let _ = reply.send(self.handle_unmute(&username));
                }
                RoomCommand::Kick {
                    username,
                    reason,
                    reply,
                } => {
                    let target = self.registry.find_by_name(&username).map(|(id, _)| id);
                    if let Some(session) = target {
                        self.kick_session(session, &reason);
                    }
                    let _ = reply.send(target.is_some());
                }
                RoomCommand::Broadcast { text } => {
                    self.broadcast_all(&format!("[Announcement] {text}"));
                }
                RoomCommand::Shutdown => {
                    self.handle_shutdown();
                    break;
                }
            }
        }

        tracing::info!(room = %self.config.name, "room actor stopped");
    }

    // -- membership -------------------------------------------------------

    fn handle_join(
        &mut self,
        username: &str,
        sender: OutboundSender,
    ) -> Result<SessionId, RoomError> {
        let now = Instant::now();
        let session = self.registry.register(username, sender, now)?;
        let name = match self.registry.get(session) {
            Some(state) => state.username.clone(),
            None => return Err(RoomError::Unavailable),
        };

        tracing::info!(
            room = %self.config.name,
            %session,
            username = %name,
            members = self.registry.len(),
            "user joined"
        );
        self.lobby_delta(1);

        self.broadcast(&format!("* {name} joined the room."), Some(session));
        self.send_system(
            session,
            &format!(
                "Welcome to {}, {name}! {} user(s) connected. Type /help for commands.",
                self.config.name,
                self.registry.len()
            ),
        );

        // A name-keyed mute survives disconnects; tell the newcomer if one
        // is still ticking.
        if let MuteStatus::Active { remaining } = self.mutes.check(&name, now) {
            self.send_system(session, &mute_notice(remaining));
        }

        Ok(session)
    }

    fn handle_leave(&mut self, session: SessionId) {
        let Some(state) = self.registry.unregister(session) else {
            return;
        };
        tracing::info!(
            room = %self.config.name,
            %session,
            username = %state.username,
            members = self.registry.len(),
            "user left"
        );
        self.lobby_delta(-1);
        self.broadcast_all(&format!("* {} left the room.", state.username));

        // A departure can shrink an open vote below quorum, or hand one
        // side the last ballot it was waiting on.
        self.resolve_vote();
    }

    // -- inbound pipeline -------------------------------------------------

    fn handle_inbound(&mut self, session: SessionId, text: &str) {
        let Some(state) = self.registry.get(session) else {
            tracing::warn!(%session, "message from unregistered session, ignoring");
            return;
        };
        let username = state.username.clone();
        let now = Instant::now();

        if let MuteStatus::Active { remaining } = self.mutes.check(&username, now) {
            self.send_system(session, &mute_notice(remaining));
            return;
        }

        if let Some(cmd) = UserCommand::parse(text) {
            self.handle_command(session, &username, cmd);
            return;
        }

        // A blank message carries nothing worth broadcasting or counting.
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let penalty = match self.registry.get_mut(session) {
            Some(state) => state.spam.record(now),
            None => return,
        };
        if penalty == Some(SpamPenalty::Kick) {
            // Third strike: the triggering message is discarded.
            self.kick_session(session, "excessive spam");
            return;
        }

        self.broadcast(&format!("{username}: {text}"), Some(session));
        match penalty {
            Some(SpamPenalty::Warn) => {
                self.send_system(session, "Slow down, you are sending messages too quickly.");
            }
            Some(SpamPenalty::TimedMute(duration)) => {
                self.mutes.mute(&username, Some(duration), now);
                tracing::info!(username = %username, "muted for spamming");
                self.send_system(
                    session,
                    &format!(
                        "You have been muted for {} for spamming.",
                        fmt_duration(duration)
                    ),
                );
            }
            _ => {}
        }
    }

    fn handle_command(&mut self, session: SessionId, username: &str, cmd: UserCommand) {
        match cmd {
            UserCommand::Help => self.send_system(session, HELP_TEXT),
            UserCommand::Leave => self.send_final(session, "You left the room."),
            UserCommand::Users => {
                let names = self.registry.usernames();
                self.send_system(
                    session,
                    &format!("Connected ({}): {}", names.len(), names.join(", ")),
                );
            }
            UserCommand::Info => {
                let capacity = match self.registry.capacity() {
                    0 => "unlimited".to_owned(),
                    n => n.to_string(),
                };
                let pm = match self.registry.get(session) {
                    Some(state) if state.pm_blocked => "blocked",
                    _ => "accepting",
                };
                self.send_system(
                    session,
                    &format!(
                        "Room \"{}\": {} connected, capacity {capacity}. Private messages: {pm}.",
                        self.config.name,
                        self.registry.len()
                    ),
                );
            }
            UserCommand::Pm { target, message } => {
                self.handle_pm(session, username, &target, &message);
            }
            UserCommand::TogglePm => {
                let Some(state) = self.registry.get_mut(session) else {
                    return;
                };
                state.pm_blocked = !state.pm_blocked;
                let notice = if state.pm_blocked {
                    "You are now blocking private messages."
                } else {
                    "You are now accepting private messages."
                };
                self.send_system(session, notice);
            }
            UserCommand::VoteKick { target } => {
                self.start_vote(session, username, Sanction::Kick, &target);
            }
            UserCommand::VoteMute { target } => {
                self.start_vote(session, username, Sanction::Mute, &target);
            }
            UserCommand::Vote(ballot) => self.handle_ballot(session, username, ballot),
            UserCommand::Unknown(word) => {
                self.send_system(
                    session,
                    &format!("Unknown or malformed command {word}. Type /help for the list."),
                );
            }
        }
    }

    fn handle_pm(&mut self, session: SessionId, sender_name: &str, target: &str, message: &str) {
        if target.eq_ignore_ascii_case(sender_name) {
            self.send_system(session, "You cannot message yourself.");
            return;
        }
        let (target_session, target_name, blocked) = match self.registry.find_by_name(target) {
            Some((id, state)) => (id, state.username.clone(), state.pm_blocked),
            None => {
                self.send_system(session, &format!("No user named {target} is connected."));
                return;
            }
        };
        if blocked {
            self.send_system(
                session,
                &format!("{target_name} is not accepting private messages."),
            );
            return;
        }
        self.send_system(target_session, &format!("[PM from {sender_name}] {message}"));
        self.send_system(session, &format!("[PM to {target_name}] {message}"));
    }

    // -- sanction votes ---------------------------------------------------

    fn start_vote(&mut self, session: SessionId, initiator: &str, sanction: Sanction, target: &str) {
        // An open vote outranks every target check.
        if self.votes.in_progress() {
            self.send_system(session, &VoteError::AlreadyRunning.to_string());
            return;
        }
        let Some((_, state)) = self.registry.find_by_name(target) else {
            self.send_system(session, &format!("No user named {target} is connected."));
            return;
        };
        let target_name = state.username.clone();
        if target_name.eq_ignore_ascii_case(initiator) {
            self.send_system(session, "You cannot start a vote against yourself.");
            return;
        }

        let eligible = self.registry.name_set();
        let announcement =
            match self
                .votes
                .start(sanction, target_name.clone(), initiator, eligible)
            {
                Ok(vote) => format!(
                    "{initiator} started a vote to {sanction} {target_name}. \
                     {} votes in favour are needed. Use /vote yes or /vote no.",
                    vote.required()
                ),
                Err(error) => {
                    self.send_system(session, &error.to_string());
                    return;
                }
            };
        self.broadcast_all(&announcement);
        self.resolve_vote();
    }

    fn handle_ballot(&mut self, session: SessionId, username: &str, ballot: Ballot) {
        match self.votes.cast(username, ballot) {
            Ok(()) => {
                let choice = match ballot {
                    Ballot::For => "yes",
                    Ballot::Against => "no",
                };
                self.broadcast_all(&format!("{username} voted {choice}."));
                self.resolve_vote();
            }
            Err(error) => self.send_system(session, &error.to_string()),
        }
    }

    /// Re-evaluates the open vote and, on an outcome, announces it and
    /// executes the sanction.
    fn resolve_vote(&mut self) {
        let connected = self.registry.name_set();
        let Some(outcome) = self.votes.resolve(&connected) else {
            return;
        };
        match outcome {
            VoteOutcome::Cancelled => {
                self.broadcast_all("Vote cancelled: not enough voters remain.");
            }
            VoteOutcome::Failed {
                target,
                votes_for,
                votes_against,
            } => {
                self.broadcast_all(&format!(
                    "Vote against {target} failed: {votes_for} in favour, {votes_against} against."
                ));
            }
            VoteOutcome::Passed {
                sanction: Sanction::Kick,
                target,
                votes_for,
            } => {
                self.broadcast_all(&format!(
                    "Vote passed with {votes_for} in favour: {target} is kicked."
                ));
                let session = self.registry.find_by_name(&target).map(|(id, _)| id);
                if let Some(session) = session {
                    self.kick_session(session, "removed by vote");
                }
            }
            VoteOutcome::Passed {
                sanction: Sanction::Mute,
                target,
                votes_for,
            } => {
                let duration = fmt_duration(VOTE_MUTE);
                self.mutes.mute(&target, Some(VOTE_MUTE), Instant::now());
                self.broadcast_all(&format!(
                    "Vote passed with {votes_for} in favour: {target} is muted for {duration}."
                ));
                if let Some((session, _)) = self.registry.find_by_name(&target) {
                    self.send_system(
                        session,
                        &format!("You have been muted for {duration} by vote."),
                    );
                }
            }
        }
    }

    // -- admin actions ----------------------------------------------------

    fn handle_warn(&mut self, username: &str, reason: &str) -> bool {
        match self.registry.find_by_name(username) {
            Some((session, _)) => {
                self.send_system(session, &format!("[Warning] {reason}"));
                true
            }
            None => false,
        }
    }

    fn handle_mute(&mut self, username: &str, minutes: u64) -> bool {
        let now = Instant::now();
        let duration = (minutes > 0).then(|| Duration::from_secs(minutes * 60));
        self.mutes.mute(username, duration, now);
        tracing::info!(username, minutes, "user muted by admin");

        match self.registry.find_by_name(username) {
            Some((session, _)) => {
                let notice = match duration {
                    Some(d) => format!(
                        "You have been muted for {} by an administrator.",
                        fmt_duration(d)
                    ),
                    None => "You have been muted by an administrator.".to_owned(),
                };
                self.send_system(session, &notice);
                true
            }
            None => false,
        }
    }

    fn handle_unmute(&mut self, username: &str) -> bool {
        if !self.mutes.unmute(username) {
            return false;
        }
        tracing::info!(username, "user unmuted");
        if let Some((session, _)) = self.registry.find_by_name(username) {
            self.send_system(session, "You have been unmuted.");
        }
        true
    }

    /// Sends the termination notice through the session's channel. The
    /// registry entry stays until the connection task observes the kick
    /// and runs the normal leave path, keeping cleanup exactly-once.
    fn kick_session(&mut self, session: SessionId, reason: &str) {
        let Some(state) = self.registry.get(session) else {
            return;
        };
        tracing::info!(
            room = %self.config.name,
            %session,
            username = %state.username,
            reason,
            "session kicked"
        );
        let notice = self
            .cipher
            .encrypt(&format!("You have been kicked: {reason}."));
        if !state.send(Outbound::Kick(notice)) {
            // Channel already gone; fall back to direct cleanup.
            self.handle_leave(session);
        }
    }

    fn handle_shutdown(&mut self) {
        tracing::info!(room = %self.config.name, "room shutting down");
        let notice = self.cipher.encrypt("The room is shutting down. Goodbye.");
        for (_, sender) in self.registry.senders() {
            let _ = sender.send(Outbound::Kick(notice.clone()));
        }
        if self.config.public {
            if let Some(lobby) = &self.lobby {
                if let Err(error) = lobby.remove(self.config.port) {
                    tracing::warn!(%error, "failed to remove lobby listing");
                }
            }
        }
    }

    // -- delivery ---------------------------------------------------------

    /// Encrypts `text` once and fans it out to everyone except `exclude`.
    ///
    /// A failed channel send is an asynchronous disconnect: the session is
    /// unregistered with a departure broadcast, and delivery to the rest
    /// is never blocked.
    fn broadcast(&mut self, text: &str, exclude: Option<SessionId>) {
        let envelope = self.cipher.encrypt(text);
        let mut dead = Vec::new();
        for (session, sender) in self.registry.senders() {
            if Some(session) == exclude {
                continue;
            }
            if sender.send(Outbound::Message(envelope.clone())).is_err() {
                dead.push(session);
            }
        }
        for session in dead {
            tracing::warn!(%session, "delivery channel closed, unregistering");
            self.handle_leave(session);
        }
    }

    fn broadcast_all(&mut self, text: &str) {
        self.broadcast(text, None);
    }

    /// Best-effort delivery of a system message to one session. Failures
    /// are swallowed; the owning loop notices the closed socket itself.
    fn send_system(&self, session: SessionId, text: &str) {
        if let Some(state) = self.registry.get(session) {
            state.send(Outbound::Message(self.cipher.encrypt(text)));
        }
    }

    /// Sends a terminal notice: the connection task closes after it.
    fn send_final(&self, session: SessionId, text: &str) {
        if let Some(state) = self.registry.get(session) {
            state.send(Outbound::Kick(self.cipher.encrypt(text)));
        }
    }

    // -- lobby ------------------------------------------------------------

    fn lobby_register(&self) {
        if !self.config.public {
            return;
        }
        if let Some(lobby) = &self.lobby {
            let capacity = self.registry.capacity() as u32;
            if let Err(error) = lobby.add(&self.config.name, self.config.port, capacity) {
                tracing::warn!(%error, "failed to register lobby listing");
            }
        }
    }

    fn lobby_delta(&self, delta: i32) {
        if !self.config.public {
            return;
        }
        if let Some(lobby) = &self.lobby {
            if let Err(error) = lobby.update_count(self.config.port, delta) {
                tracing::warn!(%error, "failed to update lobby count");
            }
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
pub fn spawn_room(
    config: RoomConfig,
    cipher: RoomCipher,
    lobby: Option<LobbyDirectory>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(64);

    let actor = RoomActor {
        registry: ClientRegistry::new(config.max_members),
        mutes: MuteTable::new(),
        votes: VoteCoordinator::new(),
        cipher,
        lobby,
        config,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}

/// Renders a duration as `4m 30s`, `10m`, or `45s`.
fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (m, s) = (secs / 60, secs % 60);
    if m > 0 && s > 0 {
        format!("{m}m {s}s")
    } else if m > 0 {
        format!("{m}m")
    } else {
        format!("{s}s")
    }
}

/// The notice a muted user receives in place of their message.
fn mute_notice(remaining: Option<Duration>) -> String {
    match remaining {
        Some(d) => format!("You are muted for another {}.", fmt_duration(d)),
        None => "You are muted until an administrator unmutes you.".to_owned(),
    }
}
