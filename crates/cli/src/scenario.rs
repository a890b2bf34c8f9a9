//! Scripted session runs against the in-memory positioning service.
//!
//! A scenario is a JSON document listing host commands and service results
//! in order:
//!
//! ```json
//! {
//!   "last_location": { "fix": { "latitude": 52.5, "longitude": 13.4, "accuracy_meters": 9.0, "provider": "fused" }, "timestamp_ms": 0 },
//!   "steps": [
//!     { "step": "start" },
//!     { "step": "connect" },
//!     { "step": "settings", "status": { "status": "success" } },
//!     { "step": "position", "sample": { "timestamp_ms": 3000 } },
//!     { "step": "activity", "payload": { "activity": "ON_BICYCLE", "confidence": 87 } },
//!     { "step": "stop" }
//!   ]
//! }
//! ```
//!
//! Service results are delivered under the ticket of the latest matching
//! request, like a real service answering its newest call. A result with no
//! request to answer is skipped with a diagnostic.

use locus::{ServiceClients, SessionCoordinator, SessionDriver, SessionEvent, SessionHandle, SessionOptions, SessionSnapshot, UserResolution};
use locus_protocol::{PositionSample, UpdateConfig};
use locus_runtime::{FailureReason, FakeServiceBuilder, FakeServiceController, ResolutionHandle, SettingsStatus, SuspendCause, completion_channel};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
	#[serde(default)]
	pub options: Option<SessionOptions>,
	#[serde(default)]
	pub last_location: Option<PositionSample>,
	pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
	Start,
	Stop,
	Pause,
	Resume,
	SetConfig { config: UpdateConfig },
	Resolve { handle: ResolutionHandle, outcome: UserResolution },
	Connect,
	FailConnect { reason: FailureReason },
	Suspend { cause: SuspendCause },
	Settings { status: SettingsStatus },
	Position { sample: PositionSample },
	Activity { payload: Value },
}

impl Step {
	pub fn label(&self) -> &'static str {
		match self {
			Step::Start => "start",
			Step::Stop => "stop",
			Step::Pause => "pause",
			Step::Resume => "resume",
			Step::SetConfig { .. } => "set_config",
			Step::Resolve { .. } => "resolve",
			Step::Connect => "connect",
			Step::FailConnect { .. } => "fail_connect",
			Step::Suspend { .. } => "suspend",
			Step::Settings { .. } => "settings",
			Step::Position { .. } => "position",
			Step::Activity { .. } => "activity",
		}
	}
}

/// A step that had no effect.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStep {
	pub index: usize,
	pub step: &'static str,
	pub reason: String,
}

#[derive(Debug)]
pub struct ScenarioReport {
	pub steps: usize,
	pub events: Vec<SessionEvent>,
	pub snapshot: SessionSnapshot,
	pub skipped: Vec<SkippedStep>,
}

/// Runs `scenario` on a session driver and collects every emitted event.
///
/// `on_event` sees each event as soon as the step producing it has settled,
/// together with that step's index.
pub async fn run_scenario(scenario: Scenario, options: SessionOptions, mut on_event: impl FnMut(usize, &SessionEvent)) -> Result<ScenarioReport> {
	let (tx, rx) = completion_channel();
	let mut builder = FakeServiceBuilder::new();
	if let Some(sample) = scenario.last_location {
		builder = builder.last_location(sample);
	}
	let (service, controller) = builder.build(tx);

	let coordinator = SessionCoordinator::new(ServiceClients::from_service(service), options);
	let (handle, task) = SessionDriver::spawn(coordinator, rx);
	let mut events = handle.subscribe().await?;

	let steps = scenario.steps.len();
	let mut collected = Vec::new();
	let mut skipped = Vec::new();

	for (index, step) in scenario.steps.into_iter().enumerate() {
		let label = step.label();
		debug!(target = "locus.cli", index, step = label, "applying step");

		if let Some(reason) = apply(&handle, &controller, step).await? {
			info!(target = "locus.cli", index, step = label, %reason, "step skipped");
			skipped.push(SkippedStep {
				index,
				step: label,
				reason,
			});
		}

		// The reply is applied after any completion the step queued.
		handle.snapshot().await?;
		while let Ok(event) = events.try_recv() {
			on_event(index, &event);
			collected.push(event);
		}
	}

	let snapshot = handle.snapshot().await?;
	drop(handle);
	task.await?;

	Ok(ScenarioReport {
		steps,
		events: collected,
		snapshot,
		skipped,
	})
}

/// Applies one step. Returns why the step was skipped, if it was.
async fn apply(handle: &SessionHandle, controller: &FakeServiceController, step: Step) -> Result<Option<String>> {
	let delivered = match step {
		Step::Start => return handle.start().await.map(|()| None).map_err(Into::into),
		Step::Stop => return handle.stop().await.map(|()| None).map_err(Into::into),
		Step::Pause => return handle.pause().await.map(|()| None).map_err(Into::into),
		Step::Resume => return handle.resume().await.map(|()| None).map_err(Into::into),
		Step::SetConfig { config } => return handle.set_config(config).await.map(|()| None).map_err(Into::into),
		Step::Resolve { handle: resolution, outcome } => {
			return match handle.complete_resolution(resolution, outcome).await {
				Ok(()) => Ok(None),
				Err(locus::Error::UnknownResolution(unknown)) => Ok(Some(format!("no outstanding prompt for {unknown}"))),
				Err(err) => Err(err.into()),
			};
		}
		Step::Connect => controller.complete_connect(),
		Step::FailConnect { reason } => controller.fail_connect(reason),
		Step::Suspend { cause } => controller.suspend(cause),
		Step::Settings { status } => controller.settings(status),
		Step::Position { sample } => controller.push_position(sample),
		Step::Activity { payload } => controller.push_activity(payload),
	};

	Ok((!delivered).then(|| "no request to answer".to_string()))
}
