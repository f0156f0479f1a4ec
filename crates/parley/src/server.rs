//! `ParleyServer` builder and accept loop.
//!
//! This is the entry point for running a room. It ties the layers
//! together: TCP accept → handshake → session loop → room actor.

use std::net::SocketAddr;
use std::path::PathBuf;

use parley_crypto::{RoomCipher, RoomKey};
use parley_lobby::LobbyDirectory;
use parley_room::{RoomConfig, RoomHandle, spawn_room};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::ParleyError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a room server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ParleyServer::builder()
///     .name("General")
///     .port(9100)
///     .password("hunter2")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ParleyServerBuilder {
    bind_addr: String,
    config: RoomConfig,
    lobby_path: Option<PathBuf>,
}

impl ParleyServerBuilder {
    /// Creates a builder with default settings: no password, unbounded,
    /// private.
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_owned(),
            config: RoomConfig::default(),
            lobby_path: None,
        }
    }

    /// Sets the room's display name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_owned();
        self
    }

    /// Sets the interface to bind. Defaults to `0.0.0.0`.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_owned();
        self
    }

    /// Sets the TCP port. 0 picks an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Requires a password during the handshake.
    pub fn password(mut self, password: &str) -> Self {
        self.config.password = Some(password.to_owned());
        self
    }

    /// Caps the member count. 0 means unbounded.
    pub fn max_members(mut self, max: usize) -> Self {
        self.config.max_members = max;
        self
    }

    /// Advertises the room in the lobby directory at `path`.
    pub fn public(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.public = true;
        self.lobby_path = Some(path.into());
        self
    }

    /// Binds the listener, generates the room key, and spawns the actor.
    pub async fn build(mut self) -> Result<ParleyServer, ParleyError> {
        let listener = TcpListener::bind((self.bind_addr.as_str(), self.config.port)).await?;
        // An ephemeral bind resolves the real port; the lobby needs it.
        self.config.port = listener.local_addr()?.port();

        let key = RoomKey::generate();
        let lobby = self.lobby_path.map(LobbyDirectory::new);
        let password = self.config.password.clone();
        let handle = spawn_room(self.config, RoomCipher::new(&key), lobby);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(ParleyServer {
            listener,
            handle,
            key,
            password,
            shutdown_tx,
            shutdown_rx,
        })
    }
}

impl Default for ParleyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Triggers the accept loop to stop. Cloneable; held by the admin console.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signals the accept loop to stop. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// A running room server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParleyServer {
    listener: TcpListener,
    handle: RoomHandle,
    key: RoomKey,
    password: Option<String>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ParleyServer {
    /// Creates a new builder.
    pub fn builder() -> ParleyServerBuilder {
        ParleyServerBuilder::new()
    }

    /// The local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the room actor, for the admin console.
    pub fn room(&self) -> RoomHandle {
        self.handle.clone()
    }

    /// A handle that stops the accept loop.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Runs the accept loop until the shutdown handle fires.
    ///
    /// Each accepted connection gets its own task; a connection's failure
    /// never reaches this loop.
    pub async fn run(self) -> Result<(), ParleyError> {
        let mut shutdown = self.shutdown_rx;
        tracing::info!(addr = %self.listener.local_addr()?, "server accepting connections");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("accept loop stopping");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        let room = self.handle.clone();
                        let key = self.key.clone();
                        let password = self.password.clone();
                        tokio::spawn(async move {
                            if let Err(error) =
                                handle_connection(socket, room, key, password).await
                            {
                                tracing::debug!(%peer, %error, "connection ended with error");
                            }
                        });
                    }
                    Err(error) => {
                        tracing::error!(%error, "accept failed");
                    }
                },
            }
        }
        Ok(())
    }
}
