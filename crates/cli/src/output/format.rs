use clap::ValueEnum;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON envelope (default)
	#[default]
	Json,
	/// One JSON object per line; `run` streams one line per session event
	Ndjson,
	/// TOON output (token-efficient for LLMs)
	Toon,
	/// Human-readable text
	Text,
}
