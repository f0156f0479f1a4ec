//! # Parley
//!
//! A real-time encrypted chat room server over TCP.
//!
//! Every room runs as one process: an accept loop performs the framed
//! handshake (password, key issuance, username negotiation), a room actor
//! owns all shared state, and a local admin console moderates. Messages
//! travel as authenticated cipher envelopes under a per-room key.
//!
//! ```rust,no_run
//! use parley::{ParleyError, ParleyServer, console};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParleyError> {
//!     let server = ParleyServer::builder()
//!         .name("General")
//!         .port(9100)
//!         .password("hunter2")
//!         .build()
//!         .await?;
//!     tokio::spawn(console::run(server.room(), server.shutdown_handle()));
//!     server.run().await
//! }
//! ```

pub mod console;
mod error;
mod handler;
mod server;

pub use error::ParleyError;
pub use server::{ParleyServer, ParleyServerBuilder, ShutdownHandle};
