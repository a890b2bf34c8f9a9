//! Narrow seams to the external positioning service.
//!
//! Each trait covers one callback surface of the service. Calls are fire and
//! forget: results come back later as [`Completion`]s stamped with the
//! ticket passed in, never as return values, because the service answers on
//! its own schedule.
//!
//! [`Completion`]: crate::completion::Completion

use std::fmt;

use locus_protocol::{PositionSample, UpdateConfig};
use serde::{Deserialize, Serialize};

use crate::ticket::Ticket;

/// Opaque token correlating a "fixable" settings result with the user's
/// later answer to the correction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionHandle(u64);

impl ResolutionHandle {
	pub fn new(id: u64) -> Self {
		Self(id)
	}

	pub fn id(&self) -> u64 {
		self.0
	}
}

impl fmt::Display for ResolutionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "resolution#{}", self.0)
	}
}

/// Raw answer of a settings check, as the service reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "handle", rename_all = "snake_case")]
pub enum SettingsStatus {
	Success,
	ResolutionRequired(ResolutionHandle),
	ChangeUnavailable,
}

/// Handshake with the service.
pub trait ConnectionClient: Send {
	/// Starts the handshake; the outcome arrives as a connection completion.
	fn connect(&mut self, ticket: Ticket);
	/// Drops the connection. Must be safe to call in any state.
	fn disconnect(&mut self);
}

/// Device settings verification.
pub trait SettingsClient: Send {
	fn check_settings(&mut self, config: &UpdateConfig, ticket: Ticket);
}

/// Position stream.
pub trait LocationClient: Send {
	fn request_updates(&mut self, config: &UpdateConfig, ticket: Ticket);
	fn remove_updates(&mut self);
	/// Most recent fix the service holds, if any. Answered synchronously.
	fn last_location(&mut self) -> Option<PositionSample>;
}

/// Out-of-process motion classification channel.
pub trait ActivityClient: Send {
	fn register(&mut self, ticket: Ticket);
	fn unregister(&mut self);
}
