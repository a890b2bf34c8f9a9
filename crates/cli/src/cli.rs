use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "locus", version, about = "Drive locus positioning sessions against an in-memory service")]
pub struct Cli {
	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json, global = true)]
	pub format: OutputFormat,

	/// Session options file (JSON); overrides options embedded in a scenario
	#[arg(long, value_name = "FILE", global = true)]
	pub options: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
	/// Replay a scenario file against the in-memory positioning service
	Run(RunArgs),
	/// Validate a session options file and print the normalized options
	CheckOptions(CheckOptionsArgs),
	/// List activity kinds with their tags and platform codes
	Activities,
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Run(_) => "run",
			Commands::CheckOptions(_) => "check-options",
			Commands::Activities => "activities",
		}
	}
}

#[derive(Debug, Args)]
pub struct RunArgs {
	/// Scenario file (JSON)
	pub scenario: PathBuf,
}

#[derive(Debug, Args)]
pub struct CheckOptionsArgs {
	/// Options file (JSON)
	pub file: PathBuf,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_run_with_global_flags() {
		let cli = Cli::try_parse_from(["locus", "-vv", "run", "walk.json", "--format", "ndjson", "--options", "opts.json"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Ndjson);
		assert_eq!(cli.options, Some(PathBuf::from("opts.json")));
		match cli.command {
			Commands::Run(args) => assert_eq!(args.scenario, PathBuf::from("walk.json")),
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn check_options_requires_file() {
		assert!(Cli::try_parse_from(["locus", "check-options"]).is_err());
		let cli = Cli::try_parse_from(["locus", "check-options", "opts.json"]).unwrap();
		assert_eq!(cli.command.name(), "check-options");
	}
}
