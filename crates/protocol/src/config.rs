//! Update request configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Desired steady-state cadence when nothing else is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

/// Default floor between delivered samples (half the default cadence).
pub const DEFAULT_FASTEST_INTERVAL_MS: u64 = DEFAULT_INTERVAL_MS / 2;

/// Accuracy/power trade-off requested from the positioning service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
	#[default]
	HighAccuracy,
	BalancedPower,
	LowPower,
	NoPower,
}

/// Rejection reasons for an [`UpdateConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfig {
	#[error("interval_ms must be positive")]
	ZeroInterval,
	#[error("fastest_interval_ms must be positive")]
	ZeroFastestInterval,
	#[error("fastest_interval_ms ({fastest_ms}) exceeds interval_ms ({interval_ms})")]
	FastestExceedsInterval { fastest_ms: u64, interval_ms: u64 },
}

/// Immutable update request parameters.
///
/// `interval_ms` is the desired cadence, `fastest_interval_ms` is the floor
/// below which samples are never delivered. Built only through
/// [`UpdateConfig::new`] (or deserialization, which runs the same checks), so
/// `0 < fastest_interval_ms <= interval_ms` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUpdateConfig")]
pub struct UpdateConfig {
	interval_ms: u64,
	fastest_interval_ms: u64,
	priority: Priority,
}

impl UpdateConfig {
	/// Validates and builds a config.
	pub fn new(interval_ms: u64, fastest_interval_ms: u64, priority: Priority) -> Result<Self, InvalidConfig> {
		if interval_ms == 0 {
			return Err(InvalidConfig::ZeroInterval);
		}
		if fastest_interval_ms == 0 {
			return Err(InvalidConfig::ZeroFastestInterval);
		}
		if fastest_interval_ms > interval_ms {
			return Err(InvalidConfig::FastestExceedsInterval {
				fastest_ms: fastest_interval_ms,
				interval_ms,
			});
		}
		Ok(Self {
			interval_ms,
			fastest_interval_ms,
			priority,
		})
	}

	pub fn interval_ms(&self) -> u64 {
		self.interval_ms
	}

	pub fn fastest_interval_ms(&self) -> u64 {
		self.fastest_interval_ms
	}

	pub fn priority(&self) -> Priority {
		self.priority
	}
}

impl Default for UpdateConfig {
	fn default() -> Self {
		Self {
			interval_ms: DEFAULT_INTERVAL_MS,
			fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MS,
			priority: Priority::HighAccuracy,
		}
	}
}

#[derive(Deserialize)]
struct RawUpdateConfig {
	interval_ms: u64,
	fastest_interval_ms: Option<u64>,
	#[serde(default)]
	priority: Priority,
}

impl TryFrom<RawUpdateConfig> for UpdateConfig {
	type Error = InvalidConfig;

	fn try_from(raw: RawUpdateConfig) -> Result<Self, Self::Error> {
		let fastest = raw.fastest_interval_ms.unwrap_or(raw.interval_ms / 2);
		UpdateConfig::new(raw.interval_ms, fastest, raw.priority)
	}
}
