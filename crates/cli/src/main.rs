mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod scenario;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::output::{CommandResult, OutputFormat, ResultBuilder, print_error_stderr, print_result};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose)?;

	let format = cli.format;
	let command = cli.command.name();

	match commands::dispatch(cli).await {
		Ok(()) => Ok(ExitCode::SUCCESS),
		Err(err) => {
			tracing::debug!(target = "locus.cli", error = ?err, "command failed");
			let error = err.to_command_error();
			print_error_stderr(&error);
			if format != OutputFormat::Text {
				let result: CommandResult<()> = ResultBuilder::new(command).error(error.code, error.message).build();
				print_result(&result, format);
			}
			Ok(ExitCode::FAILURE)
		}
	}
}
