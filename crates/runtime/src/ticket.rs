//! Epochs and request tickets.
//!
//! Every asynchronous request to the positioning service is stamped with a
//! [`Ticket`]. The epoch part changes once per session start; the sequence
//! part is unique per request within the issuer's lifetime. A completion is
//! applied only if its ticket is still the one its consumer is waiting on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Session generation counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
	pub fn new(value: u64) -> Self {
		Self(value)
	}

	pub fn value(&self) -> u64 {
		self.0
	}

	pub fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}
}

impl fmt::Display for Epoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "epoch#{}", self.0)
	}
}

/// Correlation stamp for one asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
	epoch: Epoch,
	seq: u64,
}

impl Ticket {
	pub fn new(epoch: Epoch, seq: u64) -> Self {
		Self { epoch, seq }
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	pub fn seq(&self) -> u64 {
		self.seq
	}
}

impl fmt::Display for Ticket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.epoch, self.seq)
	}
}

/// Hands out tickets for the current epoch.
#[derive(Debug, Default)]
pub struct TicketIssuer {
	epoch: Epoch,
	next_seq: u64,
}

impl TicketIssuer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current epoch.
	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	/// Moves to the next epoch and returns it.
	pub fn advance(&mut self) -> Epoch {
		self.epoch = self.epoch.next();
		self.epoch
	}

	/// Issues a fresh ticket in the current epoch.
	pub fn issue(&mut self) -> Ticket {
		let ticket = Ticket::new(self.epoch, self.next_seq);
		self.next_seq = self.next_seq.wrapping_add(1);
		ticket
	}
}
