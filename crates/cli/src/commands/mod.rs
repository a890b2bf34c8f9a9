mod activities;
mod check_options;
mod run;

use std::path::Path;

use locus::SessionOptions;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Run(args) => run::execute(args, cli.options.as_deref(), cli.format).await?,
		Commands::CheckOptions(args) => check_options::execute(args, cli.format)?,
		Commands::Activities => activities::execute(cli.format),
	}

	Ok(())
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| CliError::Io {
		path: path.to_path_buf(),
		source,
	})
}

pub(crate) fn load_options(path: &Path) -> Result<SessionOptions> {
	let json = read_file(path)?;
	SessionOptions::from_json(&json).map_err(|source| CliError::InvalidOptions {
		path: path.to_path_buf(),
		source,
	})
}
