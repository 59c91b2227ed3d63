//! WebSocket-backed room transport.
//!
//! Each joined room owns one socket. A background task forwards text messages
//! to the room's listener; the write half stays here for `send`.

use super::{FrameListener, RoomKey, RoomTransport};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Dial attempts made by `reconnect` before the room is given up.
const REDIAL_ATTEMPTS: u32 = 3;
/// Delay before the second attempt; doubles after each failure.
const REDIAL_BACKOFF: Duration = Duration::from_millis(250);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;

struct RoomLink {
    address: String,
    listener: FrameListener,
    writer: WsWriter,
    reader: JoinHandle<()>,
}

impl RoomLink {
    async fn close(mut self) {
        self.reader.abort();
        let _ = self.writer.send(Message::Close(None)).await;
        let _ = self.writer.close().await;
    }
}

/// Room transport that dials one WebSocket per room.
pub struct WsRoomTransport {
    connect_timeout: Duration,
    rooms: Mutex<HashMap<RoomKey, RoomLink>>,
}

impl WsRoomTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    async fn dial(
        &self,
        address: &str,
        listener: &FrameListener,
    ) -> Result<(WsWriter, JoinHandle<()>), TransportError> {
        let (stream, _response) = timeout(self.connect_timeout, connect_async(address))
            .await
            .map_err(|_| {
                TransportError::Connect(format!(
                    "timed out after {:?} dialing {address}",
                    self.connect_timeout
                ))
            })?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (writer, mut reader) = stream.split();
        let listener = listener.clone();
        let reader = tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if !listener.deliver(text.as_str()) {
                            debug!("frame listener dropped; stopping reader");
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!(subscription = listener.subscription(), "room closed by peer");
                        break;
                    }
                    // Only text frames carry envelopes.
                    Ok(_) => {}
                    Err(e) => {
                        warn!(subscription = listener.subscription(), "room read failed: {e}");
                        break;
                    }
                }
            }
        });
        Ok((writer, reader))
    }
}

#[async_trait]
impl RoomTransport for WsRoomTransport {
    async fn enter_room(
        &self,
        room: &RoomKey,
        address: &str,
        listener: FrameListener,
    ) -> Result<(), TransportError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(room) {
            return Err(TransportError::AlreadyJoined(room.to_string()));
        }
        let (writer, reader) = self.dial(address, &listener).await?;
        info!(%room, address, subscription = listener.subscription(), "entered room");
        rooms.insert(
            room.clone(),
            RoomLink {
                address: address.to_string(),
                listener,
                writer,
                reader,
            },
        );
        Ok(())
    }

    async fn leave_room(&self, room: &RoomKey) -> Result<(), TransportError> {
        let link = self
            .rooms
            .lock()
            .await
            .remove(room)
            .ok_or_else(|| TransportError::NotJoined(room.to_string()))?;
        link.close().await;
        info!(%room, "left room");
        Ok(())
    }

    async fn send(&self, room: &RoomKey, frame: &str) -> Result<(), TransportError> {
        let mut rooms = self.rooms.lock().await;
        let link = rooms
            .get_mut(room)
            .ok_or_else(|| TransportError::NotJoined(room.to_string()))?;
        link.writer
            .send(Message::text(frame.to_owned()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn reconnect(&self, room: &RoomKey) -> Result<(), TransportError> {
        let mut rooms = self.rooms.lock().await;
        let link = rooms
            .remove(room)
            .ok_or_else(|| TransportError::NotJoined(room.to_string()))?;
        let address = link.address.clone();
        let listener = link.listener.clone();
        link.close().await;

        // On failure the room stays released; later sends report NotJoined.
        let mut delay = REDIAL_BACKOFF;
        let mut attempt = 1;
        let (writer, reader) = loop {
            match self.dial(&address, &listener).await {
                Ok(link) => break link,
                Err(e) if attempt < REDIAL_ATTEMPTS => {
                    warn!(%room, attempt, "redial failed, retrying in {delay:?}: {e}");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(%room, attempt, "giving up on redial: {e}");
                    return Err(e);
                }
            }
        };
        info!(%room, subscription = listener.subscription(), attempt, "room socket redialed");
        rooms.insert(
            room.clone(),
            RoomLink {
                address,
                listener,
                writer,
                reader,
            },
        );
        Ok(())
    }
}

impl Drop for WsRoomTransport {
    fn drop(&mut self) {
        for link in self.rooms.get_mut().values() {
            link.reader.abort();
        }
    }
}
