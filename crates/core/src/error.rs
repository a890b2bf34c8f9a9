//! Error types for the session coordinator.

use locus_protocol::InvalidConfig;
use locus_runtime::ResolutionHandle;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by session operations.
///
/// Connection failures never appear here: they are reported as
/// `SessionEvent::ConnectionFailed`. Malformed classification payloads are
/// logged and dropped by the coordinator.
#[derive(Debug, Error)]
pub enum Error {
	/// Operation requires an established connection.
	#[error("not connected to the positioning service")]
	NotConnected,

	#[error("invalid update config: {0}")]
	InvalidConfig(#[from] InvalidConfig),

	#[error("malformed classification payload: {0}")]
	MalformedClassification(String),

	/// Resolution answer for a handle that is not outstanding.
	#[error("no outstanding resolution for {0}")]
	UnknownResolution(ResolutionHandle),

	/// The session driver task has exited.
	#[error("session closed")]
	SessionClosed,

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub fn is_not_connected(&self) -> bool {
		matches!(self, Error::NotConnected)
	}
}
