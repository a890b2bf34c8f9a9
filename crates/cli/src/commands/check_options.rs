use crate::cli::CheckOptionsArgs;
use crate::commands::load_options;
use crate::error::Result;
use crate::output::{CheckOptionsData, CommandInputs, DiagnosticLevel, OutputFormat, ResultBuilder, print_result};

pub fn execute(args: CheckOptionsArgs, format: OutputFormat) -> Result<()> {
	let options = load_options(&args.file)?;
	let update = options.update;

	let mut builder = ResultBuilder::new("check-options")
		.inputs(CommandInputs {
			path: Some(args.file),
			..CommandInputs::default()
		})
		.data(CheckOptionsData {
			options,
			reconnect_bounded: options.reconnect.max_attempts.is_some(),
			confidence_policy: options.confidence_policy,
		});

	if update.fastest_interval_ms() == update.interval_ms() {
		builder = builder.diagnostic(
			DiagnosticLevel::Info,
			"fastest_interval_ms equals interval_ms; samples arriving early are dropped",
		);
	}

	print_result(&builder.build(), format);
	Ok(())
}
