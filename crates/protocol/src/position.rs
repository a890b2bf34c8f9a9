//! Position samples reported by the positioning service.

use serde::{Deserialize, Serialize};

/// A geographic fix. Every field is present whenever a fix exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
	pub latitude: f64,
	pub longitude: f64,
	/// Radius in meters of the 68% confidence circle.
	pub accuracy_meters: f32,
	/// Name of the provider that produced the fix (e.g. "fused", "gps").
	pub provider: String,
}

/// One update from the position stream.
///
/// `fix` is `None` when the service reported an update without a location,
/// which keeps "no fix" distinct from a fix at (0, 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
	#[serde(default)]
	pub fix: Option<Fix>,
	/// Service timestamp in milliseconds.
	pub timestamp_ms: u64,
}

impl PositionSample {
	pub fn with_fix(fix: Fix, timestamp_ms: u64) -> Self {
		Self {
			fix: Some(fix),
			timestamp_ms,
		}
	}

	pub fn absent(timestamp_ms: u64) -> Self {
		Self { fix: None, timestamp_ms }
	}

	pub fn has_fix(&self) -> bool {
		self.fix.is_some()
	}

	pub fn latitude(&self) -> Option<f64> {
		self.fix.as_ref().map(|fix| fix.latitude)
	}

	pub fn longitude(&self) -> Option<f64> {
		self.fix.as_ref().map(|fix| fix.longitude)
	}

	pub fn accuracy_meters(&self) -> Option<f32> {
		self.fix.as_ref().map(|fix| fix.accuracy_meters)
	}

	pub fn provider(&self) -> Option<&str> {
		self.fix.as_ref().map(|fix| fix.provider.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absent_sample_reports_no_fields() {
		let sample = PositionSample::absent(42);
		assert!(!sample.has_fix());
		assert_eq!(sample.latitude(), None);
		assert_eq!(sample.longitude(), None);
		assert_eq!(sample.accuracy_meters(), None);
		assert_eq!(sample.provider(), None);
	}

	#[test]
	fn sample_without_fix_field_deserializes_as_absent() {
		let sample: PositionSample = serde_json::from_str(r#"{"timestamp_ms": 7}"#).unwrap();
		assert_eq!(sample, PositionSample::absent(7));
	}

	#[test]
	fn partial_fix_is_rejected() {
		let result = serde_json::from_str::<PositionSample>(r#"{"fix": {"latitude": 1.0, "longitude": 2.0}, "timestamp_ms": 7}"#);
		assert!(result.is_err());
	}
}
