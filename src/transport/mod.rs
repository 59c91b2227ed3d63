//! Room transport contract.
//!
//! A transport multiplexes named rooms over socket connections. The session
//! never touches sockets directly: it enters a room with a [`FrameListener`],
//! sends encoded frames, and leaves. Inbound text is pushed to the listener
//! tagged with the subscription it belongs to, so frames from a room the
//! session already left can be told apart from the live one.

use crate::error::TransportError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

pub mod ws;

pub use ws::WsRoomTransport;

/// Namespace of the room used to talk to an agent.
pub const AGENT_ROOM_NAMESPACE: &str = "ai-agent";

/// Identifies one room on a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub namespace: String,
    pub id: String,
}

impl RoomKey {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    /// The agent chat room.
    pub fn agent() -> Self {
        Self::new(AGENT_ROOM_NAMESPACE, "")
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

/// Raw inbound transport message, tagged with its subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub subscription: u64,
    pub text: String,
}

/// Delivery handle handed to [`RoomTransport::enter_room`].
#[derive(Debug, Clone)]
pub struct FrameListener {
    subscription: u64,
    tx: mpsc::UnboundedSender<InboundFrame>,
}

impl FrameListener {
    pub fn new(subscription: u64, tx: mpsc::UnboundedSender<InboundFrame>) -> Self {
        Self { subscription, tx }
    }

    pub fn subscription(&self) -> u64 {
        self.subscription
    }

    /// Push one transport message. Returns false once the receiver is gone.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.tx
            .send(InboundFrame {
                subscription: self.subscription,
                text: text.into(),
            })
            .is_ok()
    }
}

/// Pub/sub channel keyed by room.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Join `room` at `address`; inbound text goes to `listener`.
    ///
    /// Joining a room that is already held fails with
    /// [`TransportError::AlreadyJoined`].
    async fn enter_room(
        &self,
        room: &RoomKey,
        address: &str,
        listener: FrameListener,
    ) -> Result<(), TransportError>;

    /// Release `room`. Local resources are always dropped; an error only
    /// reports that the farewell could not be delivered.
    async fn leave_room(&self, room: &RoomKey) -> Result<(), TransportError>;

    async fn send(&self, room: &RoomKey, frame: &str) -> Result<(), TransportError>;

    /// Drop and redial the socket behind `room`, keeping its listener.
    async fn reconnect(&self, room: &RoomKey) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: RoomTransport + ?Sized> RoomTransport for Arc<T> {
    async fn enter_room(
        &self,
        room: &RoomKey,
        address: &str,
        listener: FrameListener,
    ) -> Result<(), TransportError> {
        (**self).enter_room(room, address, listener).await
    }

    async fn leave_room(&self, room: &RoomKey) -> Result<(), TransportError> {
        (**self).leave_room(room).await
    }

    async fn send(&self, room: &RoomKey, frame: &str) -> Result<(), TransportError> {
        (**self).send(room, frame).await
    }

    async fn reconnect(&self, room: &RoomKey) -> Result<(), TransportError> {
        (**self).reconnect(room).await
    }
}
