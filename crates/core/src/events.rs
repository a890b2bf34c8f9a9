//! Observer events and their fan-out.

use locus_protocol::{ActivityClassification, PositionSample};
use locus_runtime::{FailureReason, ResolutionHandle};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::capability::{CapabilityOutcome, UserResolution};

/// Everything the coordinator reports to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
	PositionSample(PositionSample),
	ActivityClassification(ActivityClassification),
	ConnectionFailed(FailureReason),
	Capability(CapabilityOutcome),
	ResolutionCompleted {
		handle: ResolutionHandle,
		outcome: UserResolution,
	},
}

impl SessionEvent {
	pub fn as_position(&self) -> Option<&PositionSample> {
		match self {
			SessionEvent::PositionSample(sample) => Some(sample),
			_ => None,
		}
	}

	pub fn as_activity(&self) -> Option<&ActivityClassification> {
		match self {
			SessionEvent::ActivityClassification(classification) => Some(classification),
			_ => None,
		}
	}
}

/// Queue an observer reads events from.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Fans events out to every live observer queue.
///
/// Observers never share state with the coordinator; each receives its own
/// copy through an unbounded queue. Closed queues are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
	subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&mut self) -> EventReceiver {
		let (tx, rx) = mpsc::unbounded_channel();
		self.subscribers.push(tx);
		rx
	}

	pub fn emit(&mut self, event: SessionEvent) {
		self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
	}

	pub fn subscriber_count(&self) -> usize {
		self.subscribers.len()
	}
}
