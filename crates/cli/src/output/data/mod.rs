use locus::{ActivityClassification, ConfidencePolicy, PositionSample, SessionEvent, SessionOptions, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// Result data for the run command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
	pub steps: usize,
	pub events: Vec<SessionEvent>,
	#[serde(rename = "final")]
	pub final_state: SessionState,
}

/// Serializable view of a session snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
	pub epoch: u64,
	pub started: bool,
	pub foreground: bool,
	pub connection: String,
	pub subscribed: bool,
	pub relay_armed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_known_position: Option<PositionSample>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub latest_activity: Option<ActivityClassification>,
}

impl From<SessionSnapshot> for SessionState {
	fn from(snapshot: SessionSnapshot) -> Self {
		Self {
			epoch: snapshot.epoch.value(),
			started: snapshot.started,
			foreground: snapshot.foreground,
			connection: snapshot.connection.to_string(),
			subscribed: snapshot.subscribed,
			relay_armed: snapshot.relay_armed,
			last_known_position: snapshot.last_known_position,
			latest_activity: snapshot.latest_activity,
		}
	}
}

/// Result data for the check-options command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOptionsData {
	pub options: SessionOptions,
	pub reconnect_bounded: bool,
	pub confidence_policy: ConfidencePolicy,
}

/// One row of the activities listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInfo {
	pub tag: String,
	pub code: i64,
	pub display_name: String,
}

/// Result data for the activities command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesData {
	pub activities: Vec<ActivityInfo>,
}
