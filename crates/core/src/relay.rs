//! Motion classification relay.
//!
//! Classifications arrive one payload at a time on an out-of-process
//! channel. The relay is registered once per session, stays registered
//! through pauses and connection suspensions, and turns each payload into
//! an [`ActivityClassification`] or drops it with a warning.

use locus_protocol::{ActivityClassification, ActivityTag, ClassificationEnvelope, MAX_CONFIDENCE};
use locus_runtime::{ActivityClient, Ticket};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::options::ConfidencePolicy;

/// Decodes a raw payload.
///
/// Unknown activity tags decode to `Unknown`. A payload listing several
/// candidate activities yields the one with the highest confidence.
/// Out-of-range confidence is clamped or rejected according to `policy`.
pub fn decode_classification(payload: &Value, policy: ConfidencePolicy) -> Result<ActivityClassification> {
	if payload.is_null() {
		return Err(Error::MalformedClassification("payload missing".into()));
	}

	let envelope = ClassificationEnvelope::deserialize(payload).map_err(|err| Error::MalformedClassification(err.to_string()))?;

	let (tag, confidence) = most_probable(envelope)?;
	let kind = tag.kind();

	if !(0..=i64::from(MAX_CONFIDENCE)).contains(&confidence) {
		match policy {
			ConfidencePolicy::Clamp => {
				warn!(target = "locus.relay", confidence, %kind, "confidence out of range; clamping");
			}
			ConfidencePolicy::Reject => {
				return Err(Error::MalformedClassification(format!("confidence {confidence} outside 0..={MAX_CONFIDENCE}")));
			}
		}
	}

	Ok(ActivityClassification::clamped(kind, confidence))
}

fn most_probable(envelope: ClassificationEnvelope) -> Result<(ActivityTag, i64)> {
	if let Some(tag) = envelope.activity {
		let confidence = envelope
			.confidence
			.ok_or_else(|| Error::MalformedClassification("confidence missing".into()))?;
		return Ok((tag, confidence));
	}

	envelope
		.activities
		.into_iter()
		.max_by_key(|candidate| candidate.confidence)
		.map(|candidate| (candidate.activity, candidate.confidence))
		.ok_or_else(|| Error::MalformedClassification("no activity in payload".into()))
}

/// Registration with the classification channel plus payload decoding.
pub struct ActivityRelay {
	client: Box<dyn ActivityClient>,
	armed: Option<Ticket>,
	policy: ConfidencePolicy,
	latest: Option<ActivityClassification>,
}

impl ActivityRelay {
	pub fn new(client: Box<dyn ActivityClient>, policy: ConfidencePolicy) -> Self {
		Self {
			client,
			armed: None,
			policy,
			latest: None,
		}
	}

	pub fn is_armed(&self) -> bool {
		self.armed.is_some()
	}

	/// Registers for classifications. No-op when already armed.
	pub fn arm(&mut self, ticket: Ticket) {
		if self.armed.is_some() {
			return;
		}
		debug!(target = "locus.relay", %ticket, "registering for activity updates");
		self.client.register(ticket);
		self.armed = Some(ticket);
	}

	/// Unregisters. Idempotent.
	pub fn disarm(&mut self) {
		if self.armed.take().is_some() {
			debug!(target = "locus.relay", "unregistering activity updates");
			self.client.unregister();
		}
		self.latest = None;
	}

	/// Decodes a payload delivered under `ticket`.
	///
	/// Returns `None` for payloads that are stale or malformed; both are
	/// logged, never raised.
	pub fn relay(&mut self, ticket: Ticket, payload: &Value) -> Option<ActivityClassification> {
		if self.armed != Some(ticket) {
			debug!(target = "locus.relay", %ticket, "classification for inactive registration dropped");
			return None;
		}

		match decode_classification(payload, self.policy) {
			Ok(classification) => {
				debug!(
					target = "locus.relay",
					kind = %classification.kind(),
					confidence = classification.confidence(),
					"activity classified"
				);
				self.latest = Some(classification);
				Some(classification)
			}
			Err(err) => {
				warn!(target = "locus.relay", error = %err, "classification dropped");
				None
			}
		}
	}

	/// Most recent classification relayed in this session.
	pub fn latest(&self) -> Option<ActivityClassification> {
		self.latest
	}
}

#[cfg(test)]
mod tests {
	use locus_protocol::ActivityKind;
	use locus_runtime::{Epoch, FakeServiceBuilder, FakeServiceController, ServiceCall, completion_channel};
	use serde_json::json;

	use super::*;

	fn relay(policy: ConfidencePolicy) -> (ActivityRelay, FakeServiceController) {
		let (tx, _rx) = completion_channel();
		let (service, controller) = FakeServiceBuilder::new().build(tx);
		(ActivityRelay::new(Box::new(service), policy), controller)
	}

	fn ticket() -> Ticket {
		Ticket::new(Epoch::new(1), 0)
	}

	#[test]
	fn decodes_single_activity_payload() {
		let classification = decode_classification(&json!({"activity": "ON_BICYCLE", "confidence": 87}), ConfidencePolicy::Clamp).unwrap();
		assert_eq!(classification.kind(), ActivityKind::OnBicycle);
		assert_eq!(classification.confidence(), 87);
	}

	#[test]
	fn unknown_tag_decodes_to_unknown() {
		let classification = decode_classification(&json!({"activity": "HOVERBOARD", "confidence": 12}), ConfidencePolicy::Clamp).unwrap();
		assert_eq!(classification.kind(), ActivityKind::Unknown);
	}

	#[test]
	fn picks_most_probable_candidate() {
		let payload = json!({
			"activities": [
				{"activity": "STILL", "confidence": 20},
				{"type": 8, "confidence": 71},
				{"activity": "WALKING", "confidence": 9}
			]
		});
		let classification = decode_classification(&payload, ConfidencePolicy::Clamp).unwrap();
		assert_eq!(classification.kind(), ActivityKind::Running);
		assert_eq!(classification.confidence(), 71);
	}

	#[test]
	fn malformed_payloads_are_errors() {
		for payload in [
			Value::Null,
			json!("ON_FOOT"),
			json!({"activity": "ON_FOOT"}),
			json!({"confidence": 50}),
			json!({"activities": []}),
			json!({"activity": true, "confidence": 50}),
		] {
			let err = decode_classification(&payload, ConfidencePolicy::Clamp).unwrap_err();
			assert!(matches!(err, Error::MalformedClassification(_)), "{payload}: {err}");
		}
	}

	#[test]
	fn clamp_policy_saturates_confidence() {
		let high = decode_classification(&json!({"activity": "STILL", "confidence": 150}), ConfidencePolicy::Clamp).unwrap();
		assert_eq!(high.confidence(), 100);
		let low = decode_classification(&json!({"activity": "STILL", "confidence": -5}), ConfidencePolicy::Clamp).unwrap();
		assert_eq!(low.confidence(), 0);
	}

	#[test]
	fn reject_policy_drops_out_of_range() {
		let err = decode_classification(&json!({"activity": "STILL", "confidence": 150}), ConfidencePolicy::Reject).unwrap_err();
		assert!(err.to_string().contains("outside 0..=100"), "{err}");
		assert!(decode_classification(&json!({"activity": "STILL", "confidence": 100}), ConfidencePolicy::Reject).is_ok());
	}

	#[test]
	fn relay_requires_current_registration() {
		let (mut relay, controller) = relay(ConfidencePolicy::Clamp);
		let payload = json!({"activity": "WALKING", "confidence": 60});
		assert_eq!(relay.relay(ticket(), &payload), None);

		relay.arm(ticket());
		relay.arm(ticket());
		assert_eq!(controller.call_count(|call| *call == ServiceCall::RegisterActivity), 1);
		assert_eq!(relay.relay(ticket(), &payload).map(|c| c.kind()), Some(ActivityKind::Walking));
		assert_eq!(relay.latest().map(|c| c.confidence()), Some(60));

		relay.disarm();
		relay.disarm();
		assert_eq!(controller.call_count(|call| *call == ServiceCall::UnregisterActivity), 1);
		assert_eq!(relay.relay(ticket(), &payload), None);
		assert_eq!(relay.latest(), None);
	}

	#[test]
	fn malformed_payload_does_not_disarm() {
		let (mut relay, _controller) = relay(ConfidencePolicy::Reject);
		relay.arm(ticket());
		assert_eq!(relay.relay(ticket(), &json!({"activity": "STILL", "confidence": 150})), None);
		assert!(relay.is_armed());
		assert!(relay.relay(ticket(), &json!({"activity": "STILL", "confidence": 99})).is_some());
	}
}
