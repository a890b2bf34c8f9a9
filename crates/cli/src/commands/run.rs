use std::path::Path;

use locus::{CapabilityOutcome, SessionEvent, SessionOptions};
use serde_json::json;

use crate::cli::RunArgs;
use crate::commands::{load_options, read_file};
use crate::error::{CliError, Result};
use crate::output::{CommandInputs, DiagnosticLevel, OutputFormat, ResultBuilder, RunData, SessionState, print_result};
use crate::scenario::{Scenario, run_scenario};

pub async fn execute(args: RunArgs, options_path: Option<&Path>, format: OutputFormat) -> Result<()> {
	let json = read_file(&args.scenario)?;
	let scenario: Scenario = serde_json::from_str(&json).map_err(|source| CliError::InvalidScenario {
		path: args.scenario.clone(),
		source,
	})?;

	let options = match options_path {
		Some(path) => load_options(path)?,
		None => scenario.options.unwrap_or_default(),
	};

	let report = run_scenario(scenario, options, |index, event| match format {
		OutputFormat::Ndjson => println!("{}", json!({ "step": index, "event": event })),
		OutputFormat::Text => println!("[{index}] {}", describe(event)),
		OutputFormat::Json | OutputFormat::Toon => {}
	})
	.await?;

	let events = match format {
		// Already streamed.
		OutputFormat::Ndjson | OutputFormat::Text => Vec::new(),
		OutputFormat::Json | OutputFormat::Toon => report.events,
	};

	let mut builder = ResultBuilder::new("run")
		.inputs(CommandInputs {
			path: Some(args.scenario),
			options_path: options_path.map(Path::to_path_buf),
		})
		.data(RunData {
			steps: report.steps,
			events,
			final_state: SessionState::from(report.snapshot),
		});
	for skipped in report.skipped {
		builder = builder.diagnostic_with_source(
			DiagnosticLevel::Warning,
			format!("step {} skipped: {}", skipped.index, skipped.reason),
			skipped.step,
		);
	}

	print_result(&builder.build(), format);
	Ok(())
}

fn describe(event: &SessionEvent) -> String {
	match event {
		SessionEvent::PositionSample(sample) => match &sample.fix {
			Some(fix) => format!(
				"position {:.6},{:.6} ±{:.1}m ({}) t={}",
				fix.latitude, fix.longitude, fix.accuracy_meters, fix.provider, sample.timestamp_ms
			),
			None => format!("position unavailable t={}", sample.timestamp_ms),
		},
		SessionEvent::ActivityClassification(classification) => {
			format!("activity {} {}%", classification.kind(), classification.confidence())
		}
		SessionEvent::ConnectionFailed(reason) => format!("connection failed: {reason}"),
		SessionEvent::Capability(CapabilityOutcome::Satisfied) => "settings satisfied".to_string(),
		SessionEvent::Capability(CapabilityOutcome::ResolvableViaUserAction(handle)) => {
			format!("settings need user action ({handle})")
		}
		SessionEvent::Capability(CapabilityOutcome::Unresolvable) => "settings unresolvable; continuing".to_string(),
		SessionEvent::ResolutionCompleted { handle, outcome } => format!("{handle} answered: {outcome:?}"),
	}
}

#[cfg(test)]
mod tests {
	use locus::{ActivityClassification, ActivityKind, FailureReason, Fix, PositionSample};

	use super::*;

	#[test]
	fn describes_events() {
		let sample = PositionSample::with_fix(
			Fix {
				latitude: 1.5,
				longitude: -2.25,
				accuracy_meters: 4.0,
				provider: "gps".into(),
			},
			30,
		);
		assert_eq!(describe(&SessionEvent::PositionSample(sample)), "position 1.500000,-2.250000 ±4.0m (gps) t=30");
		assert_eq!(describe(&SessionEvent::PositionSample(PositionSample::absent(5))), "position unavailable t=5");

		let classification = ActivityClassification::new(ActivityKind::OnBicycle, 87).unwrap();
		assert_eq!(describe(&SessionEvent::ActivityClassification(classification)), "activity On Bicycle 87%");
		assert_eq!(
			describe(&SessionEvent::ConnectionFailed(FailureReason::ServiceUnavailable)),
			"connection failed: positioning service unavailable"
		);
	}

	#[test]
	fn embedded_options_are_used_without_flag() {
		let scenario: Scenario = serde_json::from_value(json!({
			"options": {"confidence_policy": "reject"},
			"steps": []
		}))
		.unwrap();
		assert_eq!(scenario.options.unwrap_or_default().confidence_policy, locus::ConfidencePolicy::Reject);
		assert_eq!(SessionOptions::default().confidence_policy, locus::ConfidencePolicy::Clamp);
	}
}
