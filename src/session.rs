//! Connection lifecycle for one agent chat room.
//!
//! `ConnectionSession` walks `Idle -> Connecting -> Running`, owns at most one
//! room subscription, and turns inbound frames into the conversation list the
//! renderer shows. Every command takes `&mut self`, so transitions never run
//! in parallel; they only interleave at await points.
//!
//! State is published through a `watch` channel as a [`SessionView`]
//! snapshot. Each inbound transport message produces at most one data
//! snapshot, so subscribers always see a fully-applied message list.

use crate::api::AddressResolver;
use crate::codec::{self, SignalContext};
use crate::error::{SessionError, TransportError};
use crate::reassembler;
use crate::transport::{FrameListener, InboundFrame, RoomKey, RoomTransport};
use crate::types::{ChatMessage, ChatSendRequestPayload, RunConfig, SignalCode, TextTarget};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// Address lookup or room join in flight.
    Connecting,
    Running,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Running => "running",
        }
    }
}

/// Health of the socket behind the room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStatus {
    #[default]
    Online,
    /// The server locked the connection; a redial is under way.
    Locking,
}

/// Snapshot handed to renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub link: LinkStatus,
    /// True from a RUN until the stream ends or is cancelled.
    pub receiving: bool,
    pub messages: Vec<ChatMessage>,
}

/// Per-message tally of what `on_frame` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub applied: usize,
    pub locked: usize,
    pub ended: usize,
    pub unknown: usize,
    pub malformed: usize,
    /// Envelopes addressed to a target other than ACTION.
    pub ignored: usize,
    /// The whole message belonged to a subscription already released.
    pub stale: bool,
}

/// Client side of an agent chat room.
pub struct ConnectionSession<R, T> {
    resolver: R,
    transport: T,
    room: RoomKey,
    ctx: SignalContext,
    frames: mpsc::UnboundedSender<InboundFrame>,
    last_subscription: u64,
    subscription: Option<u64>,
    state: SessionState,
    link: LinkStatus,
    receiving: bool,
    messages: Vec<ChatMessage>,
    run: Option<RunConfig>,
    view: watch::Sender<SessionView>,
}

impl<R: AddressResolver, T: RoomTransport> ConnectionSession<R, T> {
    /// Build an idle session for the agent room.
    ///
    /// The returned receiver yields every inbound frame; feed each one back
    /// through [`ConnectionSession::on_inbound`].
    pub fn new(
        resolver: R,
        transport: T,
        ctx: SignalContext,
    ) -> (Self, mpsc::UnboundedReceiver<InboundFrame>) {
        let (frames, rx) = mpsc::unbounded_channel();
        let (view, _) = watch::channel(SessionView::default());
        let session = Self {
            resolver,
            transport,
            room: RoomKey::agent(),
            ctx,
            frames,
            last_subscription: 0,
            subscription: None,
            state: SessionState::Idle,
            link: LinkStatus::Online,
            receiving: false,
            messages: Vec::new(),
            run: None,
            view,
        };
        (session, rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn link(&self) -> LinkStatus {
        self.link
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Subscription id currently held, if any.
    pub fn subscription(&self) -> Option<u64> {
        self.subscription
    }

    /// Watch snapshots of this session.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Open the room for `agent_id` and send the first RUN.
    ///
    /// An empty `agent_id` runs an unsaved draft on an ephemeral address. Any
    /// failure returns the session to Idle with no room held.
    pub async fn start(&mut self, agent_id: &str, run: RunConfig) -> Result<(), SessionError> {
        match self.state {
            SessionState::Connecting => return Err(SessionError::Busy),
            SessionState::Running => {
                return Err(SessionError::InvalidState {
                    operation: "start",
                    state: SessionState::Running.label(),
                })
            }
            SessionState::Idle => {}
        }

        self.state = SessionState::Connecting;
        self.publish();

        let address = match self.resolver.resolve(agent_id).await {
            Ok(address) => address,
            Err(e) => {
                warn!(agent_id, "room address lookup failed: {e}");
                self.state = SessionState::Idle;
                self.publish();
                return Err(SessionError::Resolve(e));
            }
        };

        self.last_subscription += 1;
        let subscription = self.last_subscription;
        let listener = FrameListener::new(subscription, self.frames.clone());
        if let Err(e) = self
            .transport
            .enter_room(&self.room, &address, listener)
            .await
        {
            warn!(room = %self.room, "entering room failed: {e}");
            self.state = SessionState::Idle;
            self.publish();
            return Err(e.into());
        }
        self.subscription = Some(subscription);
        self.state = SessionState::Running;
        self.link = LinkStatus::Online;
        self.publish();

        let payload = run.payload(new_thread_id());
        self.run = Some(run);
        if let Err(e) = self.send_run(&payload).await {
            self.release().await;
            return Err(e);
        }
        info!(agent_id, subscription, thread_id = %payload.thread_id, "run started");
        Ok(())
    }

    /// Tear down the running room, discard the conversation, and start over.
    pub async fn reconnect(&mut self, agent_id: &str, run: RunConfig) -> Result<(), SessionError> {
        match self.state {
            SessionState::Connecting => return Err(SessionError::Busy),
            SessionState::Idle => {
                return Err(SessionError::InvalidState {
                    operation: "reconnect",
                    state: SessionState::Idle.label(),
                })
            }
            SessionState::Running => {}
        }
        self.release().await;
        self.messages.clear();
        self.publish();
        self.start(agent_id, run).await
    }

    /// Restart when running, start otherwise.
    pub async fn start_or_restart(
        &mut self,
        agent_id: &str,
        run: RunConfig,
    ) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            self.reconnect(agent_id, run).await
        } else {
            self.start(agent_id, run).await
        }
    }

    /// Send a user turn. Returns the thread id minted for it.
    ///
    /// Rejected while a previous response is still streaming.
    pub async fn send_turn(&mut self, message: &str) -> Result<String, SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::InvalidState {
                operation: "send a turn",
                state: self.state.label(),
            });
        }
        if self.receiving {
            return Err(SessionError::AwaitingResponse);
        }
        let thread_id = new_thread_id();
        let payload = ChatSendRequestPayload {
            thread_id: thread_id.clone(),
            prompt: message.to_string(),
            variables: Vec::new(),
            model_config: self
                .run
                .as_ref()
                .map(|run| run.model_config.clone())
                .unwrap_or_default(),
        };
        self.send_run(&payload).await?;
        self.messages.push(ChatMessage::user(thread_id.clone(), message));
        self.publish();
        Ok(thread_id)
    }

    /// Ask the server to stop the in-flight response.
    ///
    /// The receiving flag clears at once; frames the server still delivers
    /// are applied as usual.
    pub async fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::InvalidState {
                operation: "cancel",
                state: self.state.label(),
            });
        }
        if !self.receiving {
            return Err(SessionError::NotReceiving);
        }
        let frame = codec::encode_stop(&self.ctx)?;
        self.receiving = false;
        self.publish();
        self.transport.send(&self.room, &frame).await?;
        debug!("stop requested");
        Ok(())
    }

    /// Release the room and return to Idle. The conversation is kept.
    pub async fn leave(&mut self) {
        self.release().await;
    }

    /// Dispatch a frame from the listener channel, dropping stale ones.
    pub async fn on_inbound(&mut self, frame: InboundFrame) -> DispatchSummary {
        if self.subscription != Some(frame.subscription) {
            debug!(
                subscription = frame.subscription,
                current = ?self.subscription,
                "dropping frame from released subscription"
            );
            return DispatchSummary {
                stale: true,
                ..DispatchSummary::default()
            };
        }
        self.on_frame(&frame.text).await
    }

    /// Decode one transport message and apply every envelope in order.
    ///
    /// Protocol anomalies are logged and counted, never returned.
    pub async fn on_frame(&mut self, raw: &str) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let mut changed = false;

        for decoded in codec::decode(raw) {
            let envelope = match decoded {
                Ok(envelope) => envelope,
                Err(bad) => {
                    warn!("discarding malformed room frame: {bad}");
                    summary.malformed += 1;
                    continue;
                }
            };
            if envelope.target != TextTarget::Action {
                debug!(envelope_target = ?envelope.target, "ignoring non-action envelope");
                summary.ignored += 1;
                continue;
            }

            match envelope.signal_code() {
                SignalCode::Delta => {
                    let Some(delta) = envelope.data.as_ref() else {
                        warn!("delta envelope without data");
                        summary.malformed += 1;
                        continue;
                    };
                    self.messages = reassembler::apply(&self.messages, delta);
                    // Data flowing again means the redial went through.
                    self.link = LinkStatus::Online;
                    summary.applied += 1;
                    changed = true;
                }
                SignalCode::Locked => {
                    summary.locked += 1;
                    self.link = LinkStatus::Locking;
                    self.publish();
                    info!(room = %self.room, "connection locked by server; redialing");
                    if let Err(e) = self.transport.reconnect(&self.room).await {
                        // The transport has dropped the room; nothing more will arrive on it.
                        warn!(room = %self.room, "redial after lock failed, releasing room: {e}");
                        self.release().await;
                        break;
                    }
                }
                SignalCode::StreamEnded => {
                    summary.ended += 1;
                    self.receiving = false;
                    changed = true;
                }
                SignalCode::Unknown(code) => {
                    summary.unknown += 1;
                    warn!(
                        code,
                        message = envelope.error_message.as_deref().unwrap_or(""),
                        "unhandled room signal code"
                    );
                }
            }
        }

        if changed {
            self.publish();
        }
        summary
    }

    async fn send_run(&mut self, payload: &ChatSendRequestPayload) -> Result<(), SessionError> {
        let frame = codec::encode_run(&self.ctx, payload)?;
        self.transport.send(&self.room, &frame).await?;
        self.receiving = true;
        self.publish();
        Ok(())
    }

    async fn release(&mut self) {
        if self.subscription.take().is_some() {
            match self.transport.leave_room(&self.room).await {
                Ok(()) => {}
                Err(TransportError::NotJoined(_)) => {
                    debug!(room = %self.room, "room already released by transport");
                }
                Err(e) => warn!(room = %self.room, "leaving room failed: {e}"),
            }
        }
        self.state = SessionState::Idle;
        self.link = LinkStatus::Online;
        self.receiving = false;
        self.publish();
    }

    fn publish(&self) {
        self.view.send_replace(SessionView {
            state: self.state,
            link: self.link,
            receiving: self.receiving,
            messages: self.messages.clone(),
        });
    }
}

fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
