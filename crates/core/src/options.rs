//! Session options.

use locus_protocol::UpdateConfig;
use locus_runtime::ReconnectPolicy;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Handling of classification confidence outside `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePolicy {
	/// Saturate into range and log a warning.
	#[default]
	Clamp,
	/// Drop the classification as malformed.
	Reject,
}

/// Everything a session is configured with.
///
/// ```json
/// {
///   "update": { "interval_ms": 5000, "fastest_interval_ms": 2500, "priority": "high_accuracy" },
///   "confidence_policy": "clamp",
///   "reconnect": { "max_attempts": 5 }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
	pub update: UpdateConfig,
	pub confidence_policy: ConfidencePolicy,
	pub reconnect: ReconnectPolicy,
}

impl SessionOptions {
	pub fn with_update(mut self, update: UpdateConfig) -> Self {
		self.update = update;
		self
	}

	pub fn with_confidence_policy(mut self, policy: ConfidencePolicy) -> Self {
		self.confidence_policy = policy;
		self
	}

	pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
		self.reconnect = reconnect;
		self
	}

	/// Parses options from JSON, validating the update config.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}
