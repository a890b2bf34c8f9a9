//! Connection lifecycle to the positioning service
//!
//! [`ServiceConnection`] owns the handshake state machine:
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──▶ Connected ──suspend──▶ Suspended
//!                               │  ▲                                  │
//!                               │  └────────── auto reconnect ────────┘
//!                               ▼
//!                             Failed
//! ```
//!
//! Any state moves to `Disconnected` on [`ServiceConnection::disconnect`].
//! Callbacks are matched against the ticket of the outstanding handshake;
//! anything else is a leftover from an abandoned attempt and is ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::ConnectionClient;
use crate::completion::{ConnectionEvent, SuspendCause};
use crate::ticket::{Ticket, TicketIssuer};

/// Why a handshake could not complete or a connection could not recover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
	#[error("positioning service unavailable")]
	ServiceUnavailable,
	#[error("client library is outdated")]
	ClientOutdated,
	#[error("user intervention required")]
	UserInterventionRequired,
	#[error("reconnect attempts exhausted")]
	RetriesExhausted,
	#[error("service error code {0}")]
	Other(i32),
}

/// Observable connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Connected,
	Suspended,
	Failed(FailureReason),
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionState::Disconnected => f.write_str("disconnected"),
			ConnectionState::Connecting => f.write_str("connecting"),
			ConnectionState::Connected => f.write_str("connected"),
			ConnectionState::Suspended => f.write_str("suspended"),
			ConnectionState::Failed(reason) => write!(f, "failed ({reason})"),
		}
	}
}

/// Bound on automatic reconnects after suspension.
///
/// `max_attempts` counts reconnects since the last explicit `connect()`.
/// `None` retries without limit and leaves backoff to the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
	#[serde(default)]
	pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
	pub fn unbounded() -> Self {
		Self { max_attempts: None }
	}

	pub fn limited(max_attempts: u32) -> Self {
		Self {
			max_attempts: Some(max_attempts),
		}
	}

	fn allows(&self, attempts_so_far: u32) -> bool {
		self.max_attempts.is_none_or(|max| attempts_so_far < max)
	}
}

/// State change produced by a connection callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
	/// Handshake completed. `recovered` is set when this ends an automatic
	/// reconnect after suspension.
	Connected { recovered: bool },
	/// Connection suspended and a new handshake was issued.
	Reconnecting { attempt: u32, cause: SuspendCause },
	/// Handshake failed, or suspension could not be recovered.
	Failed(FailureReason),
}

/// Connect/disconnect state machine over a [`ConnectionClient`].
pub struct ServiceConnection {
	client: Box<dyn ConnectionClient>,
	state: ConnectionState,
	pending: Option<Ticket>,
	policy: ReconnectPolicy,
	reconnects: u32,
	recovering: bool,
}

impl ServiceConnection {
	pub fn new(client: Box<dyn ConnectionClient>, policy: ReconnectPolicy) -> Self {
		Self {
			client,
			state: ConnectionState::Disconnected,
			pending: None,
			policy,
			reconnects: 0,
			recovering: false,
		}
	}

	pub fn state(&self) -> &ConnectionState {
		&self.state
	}

	pub fn is_connected(&self) -> bool {
		self.state == ConnectionState::Connected
	}

	/// Reconnects issued since the last explicit `connect()`.
	pub fn reconnect_attempts(&self) -> u32 {
		self.reconnects
	}

	/// Begins a handshake under `ticket`. No-op while connecting or connected.
	pub fn connect(&mut self, ticket: Ticket) {
		match self.state {
			ConnectionState::Connecting | ConnectionState::Connected => {
				debug!(target = "locus.connection", state = %self.state, "connect ignored");
				return;
			}
			ConnectionState::Disconnected | ConnectionState::Failed(_) | ConnectionState::Suspended => {}
		}

		self.reconnects = 0;
		self.recovering = false;
		self.begin_handshake(ticket);
	}

	/// Drops the connection and forgets any outstanding handshake.
	pub fn disconnect(&mut self) {
		if self.state == ConnectionState::Disconnected && self.pending.is_none() {
			return;
		}

		self.client.disconnect();
		self.pending = None;
		self.recovering = false;
		self.reconnects = 0;
		self.set_state(ConnectionState::Disconnected);
	}

	/// Applies a connection callback issued under `ticket`.
	///
	/// Returns `None` for callbacks that do not belong to the outstanding
	/// handshake or do not fit the current state.
	pub fn handle(&mut self, ticket: Ticket, event: ConnectionEvent, issuer: &mut TicketIssuer) -> Option<Transition> {
		if self.pending != Some(ticket) {
			debug!(target = "locus.connection", %ticket, ?event, "stale connection callback dropped");
			return None;
		}

		match event {
			ConnectionEvent::Connected => {
				if self.state != ConnectionState::Connecting {
					debug!(target = "locus.connection", state = %self.state, "unexpected connected callback");
					return None;
				}
				let recovered = std::mem::take(&mut self.recovering);
				self.set_state(ConnectionState::Connected);
				Some(Transition::Connected { recovered })
			}
			ConnectionEvent::Suspended { cause } => {
				if self.state != ConnectionState::Connected {
					debug!(target = "locus.connection", state = %self.state, "unexpected suspension callback");
					return None;
				}
				self.set_state(ConnectionState::Suspended);

				if !self.policy.allows(self.reconnects) {
					warn!(target = "locus.connection", attempts = self.reconnects, "reconnect budget exhausted");
					self.pending = None;
					self.recovering = false;
					self.set_state(ConnectionState::Failed(FailureReason::RetriesExhausted));
					return Some(Transition::Failed(FailureReason::RetriesExhausted));
				}

				self.reconnects += 1;
				self.recovering = true;
				info!(target = "locus.connection", attempt = self.reconnects, ?cause, "connection suspended; reconnecting");
				self.begin_handshake(issuer.issue());
				Some(Transition::Reconnecting {
					attempt: self.reconnects,
					cause,
				})
			}
			ConnectionEvent::Failed { reason } => {
				warn!(target = "locus.connection", %reason, "connection failed");
				self.pending = None;
				self.recovering = false;
				self.set_state(ConnectionState::Failed(reason.clone()));
				Some(Transition::Failed(reason))
			}
		}
	}

	fn begin_handshake(&mut self, ticket: Ticket) {
		self.pending = Some(ticket);
		self.set_state(ConnectionState::Connecting);
		self.client.connect(ticket);
	}

	fn set_state(&mut self, next: ConnectionState) {
		if self.state != next {
			debug!(target = "locus.connection", from = %self.state, to = %next, "connection state");
			self.state = next;
		}
	}
}
