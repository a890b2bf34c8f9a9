//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid options in {path}: {source}")]
	InvalidOptions {
		path: PathBuf,
		#[source]
		source: locus::Error,
	},

	#[error("invalid scenario in {path}: {source}")]
	InvalidScenario {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Session(#[from] locus::Error),

	#[error("session task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Io { .. } => ErrorCode::IoError,
			CliError::InvalidOptions { .. } => ErrorCode::InvalidOptions,
			CliError::InvalidScenario { .. } => ErrorCode::InvalidScenario,
			CliError::Session(_) => ErrorCode::SessionError,
			CliError::Task(_) => ErrorCode::InternalError,
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		CommandError {
			code: self.code(),
			message: self.to_string(),
			details: None,
		}
	}
}
