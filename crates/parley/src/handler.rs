//! Per-connection handler: the gateway handshake and the session loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Capacity check (before any authentication work)
//!   2. Password frame, if the room has one → `FAIL     ` on mismatch
//!   3. Send the room key
//!   4. Receive the encrypted username → `FAIL_NAME` on decrypt failure
//!   5-6. Register with the room actor (validation, uniqueness, capacity)
//!   7. Send `OK_NAME  `, then run the read loop until disconnect

use std::io;
use std::time::Duration;

use parley_crypto::{RoomCipher, RoomKey};
use parley_protocol::handshake::{Rejection, STATUS_OK_NAME};
use parley_protocol::{Frame, FrameKind, ProtocolError, read_frame, write_frame};
use parley_room::{Outbound, OutboundReceiver, RoomError, RoomHandle, SessionId};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};

use crate::ParleyError;

/// How long each handshake read may take. Steady-state reads block
/// until data or disconnect.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    socket: TcpStream,
    room: RoomHandle,
    key: RoomKey,
    password: Option<String>,
) -> Result<(), ParleyError> {
    let peer = socket.peer_addr()?;
    let (mut reader, mut writer) = socket.into_split();
    tracing::debug!(%peer, "handling new connection");

    // --- Step 1: capacity, before any authentication work ---
    let (members, capacity) = room.occupancy().await?;
    if capacity > 0 && members >= capacity {
        return Err(reject(&mut writer, Rejection::RoomFull).await);
    }

    // --- Step 2: password ---
    if let Some(expected) = &password {
        let attempt = read_handshake_frame(&mut reader)
            .await?
            .into_payload(FrameKind::Password)?;
        if attempt != expected.as_bytes() {
            return Err(reject(&mut writer, Rejection::WrongPassword).await);
        }
    }

    // --- Step 3: issue the room key ---
    write_frame(&mut writer, &Frame::key(key.as_block())).await?;
    let cipher = RoomCipher::new(&key);

    // --- Step 4: encrypted username ---
    let envelope = read_handshake_frame(&mut reader)
        .await?
        .into_payload(FrameKind::Ciphertext)?;
    let username = match cipher.decrypt(&envelope) {
        Ok(name) => name,
        Err(_) => return Err(reject(&mut writer, Rejection::BadName).await),
    };

    // --- Steps 5-6: the actor validates and registers atomically ---
    let (tx, outbound) = mpsc::unbounded_channel();
    let session = match room.join(username.clone(), tx).await {
        Ok(session) => session,
        Err(RoomError::RoomFull) => return Err(reject(&mut writer, Rejection::RoomFull).await),
        Err(RoomError::InvalidName(_) | RoomError::NameTaken(_)) => {
            return Err(reject(&mut writer, Rejection::BadName).await);
        }
        Err(error) => return Err(error.into()),
    };

    // --- Step 7: confirm ---
    if let Err(error) = write_frame(&mut writer, &Frame::status(STATUS_OK_NAME)).await {
        let _ = room.leave(session).await;
        return Err(error.into());
    }
    tracing::info!(%peer, %session, username = %username, "session registered");

    // Delivery runs in its own task so a slow socket never blocks the
    // read side. `kicked` fires when a terminal notice has gone out.
    let (kicked_tx, kicked_rx) = oneshot::channel();
    let writer_task = tokio::spawn(deliver_outbound(writer, outbound, kicked_tx));

    let result = tokio::select! {
        result = read_loop(&mut reader, &room, &cipher, session) => result,
        // Fires on a kick/leave notice, or if the delivery task dies;
        // either way this session is over.
        _ = kicked_rx => Ok(()),
    };

    // The actor treats a second leave as a no-op, so cleanup stays
    // exactly-once no matter which path ended the session.
    let _ = room.leave(session).await;
    let _ = writer_task.await;
    tracing::info!(%session, "session closed");
    result
}

/// Reads decrypted messages into the room until the peer goes away.
///
/// A corrupt envelope drops that one message; the session survives.
async fn read_loop(
    reader: &mut OwnedReadHalf,
    room: &RoomHandle,
    cipher: &RoomCipher,
    session: SessionId,
) -> Result<(), ParleyError> {
    loop {
        match read_frame(reader).await {
            Ok(Some(frame)) => {
                let envelope = frame.into_payload(FrameKind::Ciphertext)?;
                match cipher.decrypt(&envelope) {
                    Ok(text) => room.inbound(session, text).await?,
                    Err(_) => {
                        tracing::debug!(%session, "dropped undecryptable message");
                    }
                }
            }
            Ok(None) => {
                tracing::debug!(%session, "peer closed");
                return Ok(());
            }
            Err(error) => {
                tracing::debug!(%session, %error, "transport error");
                return Err(error.into());
            }
        }
    }
}

/// Forwards the actor's outbound queue onto the socket. On a terminal
/// notice, delivers it, signals `kicked`, and shuts the write half down.
async fn deliver_outbound(
    mut writer: OwnedWriteHalf,
    mut outbound: OutboundReceiver,
    kicked: oneshot::Sender<()>,
) {
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Message(envelope) => {
                if write_frame(&mut writer, &Frame::ciphertext(envelope))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Outbound::Kick(envelope) => {
                let _ = write_frame(&mut writer, &Frame::ciphertext(envelope)).await;
                let _ = kicked.send(());
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
}

/// Sends a rejection token and produces the error to return.
async fn reject(writer: &mut OwnedWriteHalf, rejection: Rejection) -> ParleyError {
    tracing::debug!(%rejection, "handshake rejected");
    if let Err(error) = write_frame(writer, &Frame::status(rejection.token())).await {
        return error.into();
    }
    ParleyError::Rejected(rejection)
}

/// One handshake read under the bounded timeout.
async fn read_handshake_frame(reader: &mut OwnedReadHalf) -> Result<Frame, ParleyError> {
    match tokio::time::timeout(HANDSHAKE_TIMEOUT, read_frame(reader)).await {
        Ok(Ok(Some(frame))) => Ok(frame),
        Ok(Ok(None)) => Err(ProtocolError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed during handshake",
        ))
        .into()),
        Ok(Err(error)) => Err(error.into()),
        Err(_) => Err(ParleyError::HandshakeTimeout),
    }
}
