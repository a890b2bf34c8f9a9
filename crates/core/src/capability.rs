//! Settings resolution.
//!
//! [`CapabilityResolver`] asks the service whether the device settings can
//! serve an [`UpdateConfig`] and classifies the answer. It never presents UI:
//! a fixable result carries a [`ResolutionHandle`] that the host uses to show
//! its own prompt and later answers through
//! [`CapabilityResolver::complete_resolution`].

use std::collections::HashSet;

use locus_protocol::UpdateConfig;
use locus_runtime::{ResolutionHandle, SettingsClient, SettingsStatus, Ticket};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Classified answer to one settings check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "handle", rename_all = "snake_case")]
pub enum CapabilityOutcome {
	Satisfied,
	ResolvableViaUserAction(ResolutionHandle),
	/// No correction exists; updates are requested anyway without a
	/// delivery guarantee.
	Unresolvable,
}

impl CapabilityOutcome {
	pub fn classify(status: SettingsStatus) -> Self {
		match status {
			SettingsStatus::Success => CapabilityOutcome::Satisfied,
			SettingsStatus::ResolutionRequired(handle) => CapabilityOutcome::ResolvableViaUserAction(handle),
			SettingsStatus::ChangeUnavailable => CapabilityOutcome::Unresolvable,
		}
	}

	pub fn resolution_handle(&self) -> Option<ResolutionHandle> {
		match self {
			CapabilityOutcome::ResolvableViaUserAction(handle) => Some(*handle),
			CapabilityOutcome::Satisfied | CapabilityOutcome::Unresolvable => None,
		}
	}
}

/// The user's answer to a settings-correction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserResolution {
	Confirmed,
	Cancelled,
}

/// Issues settings checks and tracks outstanding correction prompts.
pub struct CapabilityResolver {
	client: Box<dyn SettingsClient>,
	pending: Option<Ticket>,
	outstanding: HashSet<ResolutionHandle>,
}

impl CapabilityResolver {
	pub fn new(client: Box<dyn SettingsClient>) -> Self {
		Self {
			client,
			pending: None,
			outstanding: HashSet::new(),
		}
	}

	/// Starts a check. A newer check supersedes any unanswered one.
	pub fn check(&mut self, config: &UpdateConfig, ticket: Ticket) {
		if let Some(previous) = self.pending.replace(ticket) {
			debug!(target = "locus.capability", %previous, "superseding unanswered settings check");
		}
		debug!(
			target = "locus.capability",
			%ticket,
			interval_ms = config.interval_ms(),
			fastest_interval_ms = config.fastest_interval_ms(),
			priority = ?config.priority(),
			"checking settings"
		);
		self.client.check_settings(config, ticket);
	}

	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Classifies the answer to the outstanding check.
	///
	/// Returns `None` when `ticket` does not belong to the outstanding check.
	pub fn resolve(&mut self, ticket: Ticket, status: SettingsStatus) -> Option<CapabilityOutcome> {
		if self.pending != Some(ticket) {
			debug!(target = "locus.capability", %ticket, "stale settings result dropped");
			return None;
		}
		self.pending = None;

		let outcome = CapabilityOutcome::classify(status);
		match outcome {
			CapabilityOutcome::Satisfied => debug!(target = "locus.capability", "settings satisfied"),
			CapabilityOutcome::ResolvableViaUserAction(handle) => {
				info!(target = "locus.capability", %handle, "settings need user correction");
				self.outstanding.insert(handle);
			}
			CapabilityOutcome::Unresolvable => {
				info!(target = "locus.capability", "settings unsatisfied and not correctable; continuing without guarantee")
			}
		}
		Some(outcome)
	}

	/// Correlates the user's answer with an outstanding prompt.
	///
	/// Each handle is answered at most once. Does not re-run the check.
	pub fn complete_resolution(&mut self, handle: ResolutionHandle, resolution: UserResolution) -> Result<()> {
		if !self.outstanding.remove(&handle) {
			return Err(Error::UnknownResolution(handle));
		}
		info!(target = "locus.capability", %handle, ?resolution, "settings prompt answered");
		Ok(())
	}

	pub fn outstanding_resolutions(&self) -> usize {
		self.outstanding.len()
	}

	/// Forgets the outstanding check and all prompts.
	pub fn reset(&mut self) {
		self.pending = None;
		self.outstanding.clear();
	}
}

#[cfg(test)]
mod tests {
	use locus_runtime::{Epoch, FakeServiceBuilder, ServiceCall, completion_channel};

	use super::*;

	fn resolver() -> (CapabilityResolver, locus_runtime::FakeServiceController) {
		let (tx, _rx) = completion_channel();
		let (service, controller) = FakeServiceBuilder::new().build(tx);
		(CapabilityResolver::new(Box::new(service)), controller)
	}

	fn ticket(seq: u64) -> Ticket {
		Ticket::new(Epoch::new(1), seq)
	}

	#[test]
	fn classifies_each_status() {
		let handle = ResolutionHandle::new(4);
		assert_eq!(CapabilityOutcome::classify(SettingsStatus::Success), CapabilityOutcome::Satisfied);
		assert_eq!(
			CapabilityOutcome::classify(SettingsStatus::ResolutionRequired(handle)),
			CapabilityOutcome::ResolvableViaUserAction(handle)
		);
		assert_eq!(CapabilityOutcome::classify(SettingsStatus::ChangeUnavailable), CapabilityOutcome::Unresolvable);
		assert_eq!(CapabilityOutcome::Unresolvable.resolution_handle(), None);
	}

	#[test]
	fn check_forwards_config() {
		let (mut resolver, controller) = resolver();
		let config = UpdateConfig::default();
		resolver.check(&config, ticket(0));
		assert!(resolver.is_pending());
		assert_eq!(controller.calls(), vec![ServiceCall::CheckSettings(config)]);
	}

	#[test]
	fn result_for_superseded_check_is_dropped() {
		let (mut resolver, _controller) = resolver();
		let config = UpdateConfig::default();
		resolver.check(&config, ticket(0));
		resolver.check(&config, ticket(1));

		assert_eq!(resolver.resolve(ticket(0), SettingsStatus::Success), None);
		assert_eq!(resolver.resolve(ticket(1), SettingsStatus::Success), Some(CapabilityOutcome::Satisfied));
		assert!(!resolver.is_pending());
		assert_eq!(resolver.resolve(ticket(1), SettingsStatus::Success), None);
	}

	#[test]
	fn resolution_handles_are_answered_once() {
		let (mut resolver, _controller) = resolver();
		let handle = ResolutionHandle::new(11);
		resolver.check(&UpdateConfig::default(), ticket(0));
		resolver.resolve(ticket(0), SettingsStatus::ResolutionRequired(handle));
		assert_eq!(resolver.outstanding_resolutions(), 1);

		resolver.complete_resolution(handle, UserResolution::Cancelled).unwrap();
		let err = resolver.complete_resolution(handle, UserResolution::Confirmed).unwrap_err();
		assert!(matches!(err, Error::UnknownResolution(h) if h == handle));
	}

	#[test]
	fn reset_forgets_prompts() {
		let (mut resolver, _controller) = resolver();
		let handle = ResolutionHandle::new(2);
		resolver.check(&UpdateConfig::default(), ticket(0));
		resolver.resolve(ticket(0), SettingsStatus::ResolutionRequired(handle));
		resolver.reset();

		assert!(resolver.complete_resolution(handle, UserResolution::Confirmed).is_err());
	}
}
