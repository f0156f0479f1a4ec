//! The Parley room: registry, dispatch, moderation, and broadcast,
//! all owned by one actor task.
//!
//! # Key types
//!
//! - [`spawn_room`] — starts the actor, returns a [`RoomHandle`]
//! - [`RoomHandle`] — cloneable command channel into the actor
//! - [`Outbound`] — what the actor delivers to each connection task
//! - [`RoomConfig`] — name, port, password, capacity, visibility

mod config;
mod dispatch;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use dispatch::UserCommand;
pub use error::RoomError;
pub use registry::{SessionId, validate_username};
pub use room::{Outbound, OutboundReceiver, OutboundSender, RoomHandle, spawn_room};
