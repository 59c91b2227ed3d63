//! agentroom: a client for streaming agent chat rooms.
//!
//! The crate manages one conversation with a remote language-model agent over
//! a multiplexed room transport: it resolves the room address, joins, sends
//! RUN/STOP_RUN control signals, reassembles streamed text deltas, and
//! recovers from server-side connection locks. An editing layer keeps the
//! agent draft, validates it, and persists it.
//!
//! # Quick start
//!
//! ```no_run
//! use agentroom::api::ApiClient;
//! use agentroom::codec::SignalContext;
//! use agentroom::config::load_config;
//! use agentroom::session::ConnectionSession;
//! use agentroom::transport::WsRoomTransport;
//! use agentroom::types::RunConfig;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let api = ApiClient::new(&config.api, &config.identity, config.network.api_timeout());
//! let transport = WsRoomTransport::new(config.network.connect_timeout());
//! let ctx = SignalContext {
//!     team_id: config.identity.team_id.clone(),
//!     user_id: config.identity.user_id.clone(),
//! };
//! let (mut session, mut frames) = ConnectionSession::new(api, transport, ctx);
//! session.start("", RunConfig::default()).await.unwrap();
//! while let Some(frame) = frames.recv().await {
//!     session.on_inbound(frame).await;
//!     if !session.is_receiving() {
//!         break;
//!     }
//! }
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod config;
pub mod editing;
pub mod error;
pub mod members;
pub mod reassembler;
pub mod render;
pub mod session;
#[cfg(test)]
pub mod testsupport;
pub mod transport;
pub mod types;
