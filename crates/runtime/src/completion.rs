//! Completion marshaling.
//!
//! Service implementations push results into a [`CompletionSender`]; the
//! session's control task drains the matching [`CompletionReceiver`], so
//! every result is applied on that one task regardless of which thread the
//! service answered on.

use locus_protocol::PositionSample;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::SettingsStatus;
use crate::connection::FailureReason;
use crate::ticket::Ticket;

/// Why the service dropped an established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendCause {
	ServiceDisconnected,
	NetworkLost,
}

/// Connection callback from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
	Connected,
	Suspended { cause: SuspendCause },
	Failed { reason: FailureReason },
}

/// Asynchronous result from the positioning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Completion {
	Connection(ConnectionEvent),
	Settings(SettingsStatus),
	Position(PositionSample),
	/// Undecoded classification payload.
	Activity(Value),
}

impl Completion {
	pub fn label(&self) -> &'static str {
		match self {
			Completion::Connection(_) => "connection",
			Completion::Settings(_) => "settings",
			Completion::Position(_) => "position",
			Completion::Activity(_) => "activity",
		}
	}
}

/// A completion with the ticket of the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
	pub ticket: Ticket,
	pub completion: Completion,
}

/// Receiving half, owned by the session's control task.
pub type CompletionReceiver = mpsc::UnboundedReceiver<Envelope>;

/// Cloneable sending half handed to service implementations.
#[derive(Debug, Clone)]
pub struct CompletionSender {
	tx: mpsc::UnboundedSender<Envelope>,
}

impl CompletionSender {
	/// Queues a completion. Returns `false` when the control task is gone.
	pub fn send(&self, ticket: Ticket, completion: Completion) -> bool {
		let label = completion.label();
		if self.tx.send(Envelope { ticket, completion }).is_err() {
			debug!(target = "locus.runtime", %ticket, kind = label, "completion dropped; receiver closed");
			return false;
		}
		true
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Creates the completion queue for one session.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
	let (tx, rx) = mpsc::unbounded_channel();
	(CompletionSender { tx }, rx)
}
