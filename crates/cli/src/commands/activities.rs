use locus::ActivityKind;

use crate::output::{ActivitiesData, ActivityInfo, OutputFormat, ResultBuilder, print_result};

pub fn execute(format: OutputFormat) {
	let activities = ActivityKind::ALL
		.into_iter()
		.map(|kind| ActivityInfo {
			tag: kind.tag().to_string(),
			code: kind.code(),
			display_name: kind.display_name().to_string(),
		})
		.collect();

	print_result(&ResultBuilder::new("activities").data(ActivitiesData { activities }).build(), format);
}
