use super::*;

#[test]
fn builder_marks_success_only_with_data() {
	let result: CommandResult<ActivitiesData> = ResultBuilder::new("activities").build();
	assert!(!result.ok);

	let result = ResultBuilder::new("activities").data(ActivitiesData { activities: Vec::new() }).build();
	assert!(result.ok);
	assert_eq!(result.schema_version, Some(SCHEMA_VERSION));
}

#[test]
fn error_envelope_serializes_code() {
	let result: CommandResult<()> = ResultBuilder::new("run")
		.error(ErrorCode::InvalidScenario, "missing steps")
		.diagnostic(DiagnosticLevel::Warning, "nothing ran")
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], false);
	assert_eq!(value["error"]["code"], "INVALID_SCENARIO");
	assert_eq!(value["diagnostics"][0]["level"], "warning");
	assert!(value.get("data").is_none());
}

#[test]
fn format_values_match_flag_names() {
	use clap::ValueEnum;

	assert_eq!(OutputFormat::from_str("ndjson", false), Ok(OutputFormat::Ndjson));
	assert!(OutputFormat::from_str("yaml", false).is_err());
	let names: Vec<String> = OutputFormat::value_variants()
		.iter()
		.filter_map(|format| format.to_possible_value())
		.map(|value| value.get_name().to_string())
		.collect();
	assert_eq!(names, vec!["json", "ndjson", "toon", "text"]);
	assert_eq!(OutputFormat::default(), OutputFormat::Json);
}
