use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Value, json};
use tempfile::TempDir;

fn run_locus_json(workdir: &Path, args: &[&str]) -> (bool, Value, String) {
	let output = Command::new(env!("CARGO_BIN_EXE_locus"))
		.current_dir(workdir)
		.env_remove("RUST_LOG")
		.args(args)
		.output()
		.expect("failed to execute locus");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let parsed = serde_json::from_str::<Value>(&stdout).unwrap_or_else(|_| json!({ "raw": stdout }));
	(output.status.success(), parsed, stderr)
}

fn write_options(dir: &Path, body: &str) -> PathBuf {
	let path = dir.join("options.json");
	std::fs::write(&path, body).expect("options should be written");
	path
}

#[test]
fn check_options_echoes_normalized_options() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let path = write_options(tmp.path(), r#"{"update": {"interval_ms": 8000, "priority": "balanced_power"}, "reconnect": {"max_attempts": 4}}"#);

	let (success, json, stderr) = run_locus_json(tmp.path(), &["check-options", path.to_str().unwrap()]);
	assert!(success, "check-options failed: {stderr}");
	assert_eq!(json["ok"], true);

	let options = &json["data"]["options"];
	assert_eq!(options["update"]["interval_ms"], 8000);
	assert_eq!(options["update"]["fastest_interval_ms"], 4000);
	assert_eq!(options["update"]["priority"], "balanced_power");
	assert_eq!(options["confidence_policy"], "clamp");
	assert_eq!(json["data"]["reconnectBounded"], true);
}

#[test]
fn check_options_defaults_empty_document() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let path = write_options(tmp.path(), "{}");

	let (success, json, stderr) = run_locus_json(tmp.path(), &["check-options", path.to_str().unwrap()]);
	assert!(success, "check-options failed: {stderr}");
	assert_eq!(json["data"]["options"]["update"]["interval_ms"], 5000);
	assert_eq!(json["data"]["options"]["update"]["fastest_interval_ms"], 2500);
	assert_eq!(json["data"]["reconnectBounded"], false);
}

#[test]
fn check_options_rejects_inverted_intervals() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let path = write_options(tmp.path(), r#"{"update": {"interval_ms": 1000, "fastest_interval_ms": 2000}}"#);

	let (success, json, stderr) = run_locus_json(tmp.path(), &["check-options", path.to_str().unwrap()]);
	assert!(!success);
	assert_eq!(json["error"]["code"], "INVALID_OPTIONS");
	assert!(stderr.contains("fastest_interval_ms (2000) exceeds interval_ms (1000)"), "stderr: {stderr}");
}

#[test]
fn activities_lists_every_kind() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, json, stderr) = run_locus_json(tmp.path(), &["activities"]);
	assert!(success, "activities failed: {stderr}");

	let activities = json["data"]["activities"].as_array().expect("activities array");
	assert_eq!(activities.len(), 8);
	let bicycle = activities.iter().find(|row| row["tag"] == "ON_BICYCLE").expect("bicycle row");
	assert_eq!(bicycle["code"], 1);
	assert_eq!(bicycle["displayName"], "On Bicycle");
}
