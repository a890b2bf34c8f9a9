//! Motion classification types and the cross-process payload envelope.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: u8 = 100;

/// Motion classes reported by the activity recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
	InVehicle,
	OnBicycle,
	OnFoot,
	Walking,
	Still,
	Tilting,
	Running,
	Unknown,
}

impl ActivityKind {
	pub const ALL: [ActivityKind; 8] = [
		ActivityKind::InVehicle,
		ActivityKind::OnBicycle,
		ActivityKind::OnFoot,
		ActivityKind::Walking,
		ActivityKind::Still,
		ActivityKind::Tilting,
		ActivityKind::Running,
		ActivityKind::Unknown,
	];

	/// Maps a payload tag to a kind. Unrecognized tags map to `Unknown`.
	///
	/// Matching ignores case and treats spaces and hyphens like underscores,
	/// so `"ON_BICYCLE"`, `"on-bicycle"` and `"On Bicycle"` are the same tag.
	pub fn from_tag(tag: &str) -> Self {
		let normalized: String = tag
			.trim()
			.chars()
			.map(|c| match c {
				' ' | '-' => '_',
				other => other.to_ascii_uppercase(),
			})
			.collect();
		Self::ALL
			.into_iter()
			.find(|kind| kind.tag() == normalized)
			.unwrap_or(ActivityKind::Unknown)
	}

	/// Maps a platform detector code to a kind. Unrecognized codes map to `Unknown`.
	pub fn from_code(code: i64) -> Self {
		match code {
			0 => ActivityKind::InVehicle,
			1 => ActivityKind::OnBicycle,
			2 => ActivityKind::OnFoot,
			3 => ActivityKind::Still,
			5 => ActivityKind::Tilting,
			7 => ActivityKind::Walking,
			8 => ActivityKind::Running,
			_ => ActivityKind::Unknown,
		}
	}

	/// Platform detector code; inverse of [`ActivityKind::from_code`].
	pub fn code(&self) -> i64 {
		match self {
			ActivityKind::InVehicle => 0,
			ActivityKind::OnBicycle => 1,
			ActivityKind::OnFoot => 2,
			ActivityKind::Still => 3,
			ActivityKind::Unknown => 4,
			ActivityKind::Tilting => 5,
			ActivityKind::Walking => 7,
			ActivityKind::Running => 8,
		}
	}

	/// Canonical payload tag.
	pub fn tag(&self) -> &'static str {
		match self {
			ActivityKind::InVehicle => "IN_VEHICLE",
			ActivityKind::OnBicycle => "ON_BICYCLE",
			ActivityKind::OnFoot => "ON_FOOT",
			ActivityKind::Walking => "WALKING",
			ActivityKind::Still => "STILL",
			ActivityKind::Tilting => "TILTING",
			ActivityKind::Running => "RUNNING",
			ActivityKind::Unknown => "UNKNOWN",
		}
	}

	/// Human-readable name.
	pub fn display_name(&self) -> &'static str {
		match self {
			ActivityKind::InVehicle => "In Vehicle",
			ActivityKind::OnBicycle => "On Bicycle",
			ActivityKind::OnFoot => "On Foot",
			ActivityKind::Walking => "Walking",
			ActivityKind::Still => "Still",
			ActivityKind::Tilting => "Tilting",
			ActivityKind::Running => "Running",
			ActivityKind::Unknown => "Unknown",
		}
	}
}

impl fmt::Display for ActivityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.display_name())
	}
}

/// A decoded classification with confidence in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityClassification {
	kind: ActivityKind,
	confidence: u8,
}

impl ActivityClassification {
	/// Returns `None` when `confidence` is outside `0..=100`.
	pub fn new(kind: ActivityKind, confidence: u8) -> Option<Self> {
		(confidence <= MAX_CONFIDENCE).then_some(Self { kind, confidence })
	}

	/// Builds a classification, saturating `confidence` into `0..=100`.
	pub fn clamped(kind: ActivityKind, confidence: i64) -> Self {
		Self {
			kind,
			confidence: confidence.clamp(0, i64::from(MAX_CONFIDENCE)) as u8,
		}
	}

	pub fn kind(&self) -> ActivityKind {
		self.kind
	}

	pub fn confidence(&self) -> u8 {
		self.confidence
	}
}

/// Activity identifier as it appears in a payload: a string tag or a
/// numeric detector code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityTag {
	Code(i64),
	Name(String),
}

impl ActivityTag {
	pub fn kind(&self) -> ActivityKind {
		match self {
			ActivityTag::Code(code) => ActivityKind::from_code(*code),
			ActivityTag::Name(name) => ActivityKind::from_tag(name),
		}
	}
}

/// One candidate in a multi-activity payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbableActivity {
	#[serde(alias = "kind", alias = "type")]
	pub activity: ActivityTag,
	pub confidence: i64,
}

/// Raw classification payload delivered by the out-of-process channel.
///
/// Either the single-activity form (`activity` + `confidence`) or a list of
/// `activities` may be present. Nothing here is trusted: confidence is kept
/// as a wide signed integer so out-of-range values survive decoding and can
/// be judged by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEnvelope {
	#[serde(default, alias = "kind", alias = "type")]
	pub activity: Option<ActivityTag>,
	#[serde(default)]
	pub confidence: Option<i64>,
	#[serde(default)]
	pub activities: Vec<ProbableActivity>,
}
