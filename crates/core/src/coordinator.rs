//! Session coordinator.
//!
//! [`SessionCoordinator`] composes the connection, settings resolver,
//! position subscription and activity relay into the one object a host
//! drives. It is a plain state machine: control calls (`start`, `pause`, …)
//! and service completions ([`SessionCoordinator::dispatch`]) must all be
//! made from the same task. [`SessionDriver`] provides that task.
//!
//! # Lifecycle
//!
//! 1. `start()` opens a new epoch and issues the handshake.
//! 2. On the first `Connected` of the epoch the settings check is issued, the
//!    activity relay is armed and the last known position is delivered.
//! 3. Once the check is answered (whatever the outcome) and the host is in
//!    the foreground, updates are requested.
//! 4. `pause()`/`resume()` end and begin the stream only.
//! 5. `stop()` ends the stream, disarms the relay, disconnects. Completions
//!    from the closed epoch are dropped from then on.
//!
//! [`SessionDriver`]: crate::driver::SessionDriver

use locus_protocol::{ActivityClassification, PositionSample, UpdateConfig};
use locus_runtime::{
	ActivityClient, Completion, ConnectionClient, ConnectionState, Envelope, Epoch, LocationClient, ResolutionHandle, ServiceConnection,
	SettingsClient, TicketIssuer, Transition,
};
use tracing::{debug, info, warn};

use crate::capability::{CapabilityResolver, UserResolution};
use crate::error::Result;
use crate::events::{EventBus, EventReceiver, SessionEvent};
use crate::options::SessionOptions;
use crate::relay::ActivityRelay;
use crate::subscription::LocationSubscription;

/// One implementation per service seam.
pub struct ServiceClients {
	pub connection: Box<dyn ConnectionClient>,
	pub settings: Box<dyn SettingsClient>,
	pub location: Box<dyn LocationClient>,
	pub activity: Box<dyn ActivityClient>,
}

impl ServiceClients {
	/// Uses clones of one service for every seam.
	pub fn from_service<S>(service: S) -> Self
	where
		S: ConnectionClient + SettingsClient + LocationClient + ActivityClient + Clone + 'static,
	{
		Self {
			connection: Box::new(service.clone()),
			settings: Box::new(service.clone()),
			location: Box::new(service.clone()),
			activity: Box::new(service),
		}
	}
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
	pub epoch: Epoch,
	pub started: bool,
	pub foreground: bool,
	pub connection: ConnectionState,
	pub subscribed: bool,
	pub relay_armed: bool,
	pub config: UpdateConfig,
	pub last_known_position: Option<PositionSample>,
	pub latest_activity: Option<ActivityClassification>,
}

/// Session aggregate root.
pub struct SessionCoordinator {
	config: UpdateConfig,
	issuer: TicketIssuer,
	connection: ServiceConnection,
	resolver: CapabilityResolver,
	subscription: LocationSubscription,
	relay: ActivityRelay,
	events: EventBus,
	started: bool,
	foreground: bool,
	established: bool,
	resolved: bool,
}

impl SessionCoordinator {
	pub fn new(clients: ServiceClients, options: SessionOptions) -> Self {
		Self {
			config: options.update,
			issuer: TicketIssuer::new(),
			connection: ServiceConnection::new(clients.connection, options.reconnect),
			resolver: CapabilityResolver::new(clients.settings),
			subscription: LocationSubscription::new(clients.location),
			relay: ActivityRelay::new(clients.activity, options.confidence_policy),
			events: EventBus::new(),
			started: false,
			foreground: true,
			established: false,
			resolved: false,
		}
	}

	/// Registers an observer.
	pub fn subscribe(&mut self) -> EventReceiver {
		self.events.subscribe()
	}

	/// Opens a session. No-op when already started.
	pub fn start(&mut self) {
		if self.started {
			debug!(target = "locus.session", "start ignored; already started");
			return;
		}

		let epoch = self.issuer.advance();
		self.started = true;
		self.established = false;
		self.resolved = false;
		info!(target = "locus.session", %epoch, "session started");

		let ticket = self.issuer.issue();
		self.connection.connect(ticket);
	}

	/// Tears the session down. Safe to call repeatedly.
	pub fn stop(&mut self) {
		if !self.started {
			return;
		}

		self.subscription.reset();
		self.relay.disarm();
		self.connection.disconnect();
		self.resolver.reset();
		self.started = false;
		self.established = false;
		self.resolved = false;
		info!(target = "locus.session", epoch = %self.issuer.epoch(), "session stopped");
	}

	/// Leaves the foreground: ends the position stream.
	pub fn pause(&mut self) {
		self.foreground = false;
		self.subscription.end();
	}

	/// Returns to the foreground: begins the stream now if connected,
	/// otherwise as soon as the connection is up.
	pub fn resume(&mut self) {
		self.foreground = true;
		self.try_begin();
	}

	/// Replaces the update config and re-runs the settings check.
	///
	/// An active stream is ended and begun again with the new config once
	/// the check is answered.
	pub fn set_config(&mut self, config: UpdateConfig) {
		if config == self.config {
			return;
		}
		info!(
			target = "locus.session",
			interval_ms = config.interval_ms(),
			fastest_interval_ms = config.fastest_interval_ms(),
			"update config replaced"
		);
		self.config = config;
		self.resolved = false;

		if self.started && self.connection.is_connected() {
			self.subscription.end();
			let ticket = self.issuer.issue();
			self.resolver.check(&self.config, ticket);
		}
	}

	/// Relays the user's answer to a settings-correction prompt.
	pub fn complete_resolution(&mut self, handle: ResolutionHandle, resolution: UserResolution) -> Result<()> {
		self.resolver.complete_resolution(handle, resolution)?;
		self.events.emit(SessionEvent::ResolutionCompleted {
			handle,
			outcome: resolution,
		});
		Ok(())
	}

	/// Applies one service completion. Completions from a closed epoch, or
	/// arriving while stopped, are dropped.
	pub fn dispatch(&mut self, envelope: Envelope) {
		let Envelope { ticket, completion } = envelope;
		if !self.started || ticket.epoch() != self.issuer.epoch() {
			debug!(target = "locus.session", %ticket, kind = completion.label(), "stale completion dropped");
			return;
		}

		match completion {
			Completion::Connection(event) => {
				if let Some(transition) = self.connection.handle(ticket, event, &mut self.issuer) {
					self.on_transition(transition);
				}
			}
			Completion::Settings(status) => {
				if let Some(outcome) = self.resolver.resolve(ticket, status) {
					self.resolved = true;
					self.events.emit(SessionEvent::Capability(outcome));
					self.try_begin();
				}
			}
			Completion::Position(sample) => {
				if let Some(sample) = self.subscription.accept(ticket, sample) {
					self.events.emit(SessionEvent::PositionSample(sample));
				}
			}
			Completion::Activity(payload) => {
				if let Some(classification) = self.relay.relay(ticket, &payload) {
					self.events.emit(SessionEvent::ActivityClassification(classification));
				}
			}
		}
	}

	fn on_transition(&mut self, transition: Transition) {
		match transition {
			Transition::Connected { recovered } => {
				info!(target = "locus.session", recovered, "connected");
				// A check issued before a suspension is never answered.
				if !self.resolved {
					let ticket = self.issuer.issue();
					self.resolver.check(&self.config, ticket);
				}
				if !self.established {
					self.established = true;
					let ticket = self.issuer.issue();
					self.relay.arm(ticket);
					if let Some(sample) = self.subscription.fetch_last_known() {
						self.events.emit(SessionEvent::PositionSample(sample));
					}
				}
				self.try_begin();
			}
			Transition::Reconnecting { attempt, cause } => {
				if self.subscription.detach() {
					debug!(target = "locus.session", attempt, ?cause, "stream detached until reconnect");
				}
			}
			Transition::Failed(reason) => {
				warn!(target = "locus.session", %reason, "connection failure reported");
				self.subscription.detach();
				self.events.emit(SessionEvent::ConnectionFailed(reason));
			}
		}
	}

	fn try_begin(&mut self) {
		if !self.started || !self.foreground || !self.resolved || !self.connection.is_connected() {
			return;
		}
		let ticket = self.issuer.issue();
		if let Err(err) = self.subscription.begin(self.connection.state(), &self.config, ticket) {
			debug!(target = "locus.session", error = %err, "subscription not started");
		}
	}

	pub fn is_started(&self) -> bool {
		self.started
	}

	pub fn is_subscribed(&self) -> bool {
		self.subscription.is_active()
	}

	pub fn connection_state(&self) -> &ConnectionState {
		self.connection.state()
	}

	pub fn config(&self) -> &UpdateConfig {
		&self.config
	}

	pub fn epoch(&self) -> Epoch {
		self.issuer.epoch()
	}

	pub fn last_known_position(&self) -> Option<&PositionSample> {
		self.subscription.last_known_position()
	}

	pub fn latest_activity(&self) -> Option<ActivityClassification> {
		self.relay.latest()
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			epoch: self.issuer.epoch(),
			started: self.started,
			foreground: self.foreground,
			connection: self.connection.state().clone(),
			subscribed: self.subscription.is_active(),
			relay_armed: self.relay.is_armed(),
			config: self.config,
			last_known_position: self.subscription.last_known_position().cloned(),
			latest_activity: self.relay.latest(),
		}
	}
}

#[cfg(test)]
mod tests {
	use locus_protocol::Priority;
	use locus_runtime::{
		CompletionReceiver, FailureReason, FakeServiceBuilder, FakeServiceController, ServiceCall, SettingsStatus, SuspendCause, completion_channel,
	};

	use super::*;
	use crate::capability::CapabilityOutcome;

	struct Harness {
		coordinator: SessionCoordinator,
		controller: FakeServiceController,
		completions: CompletionReceiver,
		events: EventReceiver,
	}

	impl Harness {
		fn new(options: SessionOptions) -> Self {
			let (tx, completions) = completion_channel();
			let (service, controller) = FakeServiceBuilder::new().build(tx);
			let mut coordinator = SessionCoordinator::new(ServiceClients::from_service(service), options);
			let events = coordinator.subscribe();
			Self {
				coordinator,
				controller,
				completions,
				events,
			}
		}

		fn pump(&mut self) {
			while let Ok(envelope) = self.completions.try_recv() {
				self.coordinator.dispatch(envelope);
			}
		}

		fn drain_events(&mut self) -> Vec<SessionEvent> {
			let mut events = Vec::new();
			while let Ok(event) = self.events.try_recv() {
				events.push(event);
			}
			events
		}

		fn connect(&mut self, status: SettingsStatus) {
			self.coordinator.start();
			self.controller.complete_connect();
			self.pump();
			self.controller.settings(status);
			self.pump();
		}

		fn count(&self, call: ServiceCall) -> usize {
			self.controller.call_count(|recorded| *recorded == call)
		}
	}

	#[test]
	fn start_is_idempotent() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.start();
		harness.coordinator.start();
		assert_eq!(harness.count(ServiceCall::Connect), 1);
		assert_eq!(harness.coordinator.connection_state(), &ConnectionState::Connecting);
	}

	#[test]
	fn connected_runs_check_arms_relay_and_fetches_last_known() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.start();
		harness.controller.complete_connect();
		harness.pump();

		let config = *harness.coordinator.config();
		assert_eq!(
			harness.controller.calls(),
			vec![
				ServiceCall::Connect,
				ServiceCall::CheckSettings(config),
				ServiceCall::RegisterActivity,
				ServiceCall::LastLocation
			]
		);
		assert!(!harness.coordinator.is_subscribed());
	}

	#[test]
	fn satisfied_begins_subscription_once() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.connect(SettingsStatus::Success);

		assert!(harness.coordinator.is_subscribed());
		assert_eq!(harness.count(ServiceCall::RequestUpdates(*harness.coordinator.config())), 1);
		assert_eq!(harness.drain_events(), vec![SessionEvent::Capability(CapabilityOutcome::Satisfied)]);
	}

	#[test]
	fn resume_before_connection_is_applied_later() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.pause();
		harness.coordinator.resume();
		harness.coordinator.start();
		harness.coordinator.resume();
		assert!(!harness.coordinator.is_subscribed());

		harness.controller.complete_connect();
		harness.pump();
		harness.controller.settings(SettingsStatus::Success);
		harness.pump();
		assert!(harness.coordinator.is_subscribed());
		assert_eq!(harness.count(ServiceCall::RequestUpdates(*harness.coordinator.config())), 1);
	}

	#[test]
	fn paused_session_does_not_subscribe_on_connect() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.pause();
		harness.connect(SettingsStatus::Success);
		assert!(!harness.coordinator.is_subscribed());

		harness.coordinator.resume();
		assert!(harness.coordinator.is_subscribed());
	}

	#[test]
	fn stop_tears_down_in_order() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.connect(SettingsStatus::Success);
		harness.controller.take_calls();

		harness.coordinator.stop();
		harness.coordinator.stop();
		assert_eq!(
			harness.controller.calls(),
			vec![ServiceCall::RemoveUpdates, ServiceCall::UnregisterActivity, ServiceCall::Disconnect]
		);
		assert_eq!(harness.coordinator.connection_state(), &ConnectionState::Disconnected);
	}

	#[test]
	fn connection_failure_is_reported_and_restartable() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.start();
		harness.controller.fail_connect(FailureReason::ServiceUnavailable);
		harness.pump();

		assert_eq!(harness.drain_events(), vec![SessionEvent::ConnectionFailed(FailureReason::ServiceUnavailable)]);

		harness.coordinator.stop();
		harness.connect(SettingsStatus::Success);
		assert!(harness.coordinator.is_subscribed());
	}

	#[test]
	fn suspension_recovers_silently_and_rebinds_stream() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.connect(SettingsStatus::Success);
		harness.drain_events();
		let config = *harness.coordinator.config();

		harness.controller.suspend(SuspendCause::ServiceDisconnected);
		harness.pump();
		assert!(!harness.coordinator.is_subscribed());
		assert_eq!(harness.coordinator.connection_state(), &ConnectionState::Connecting);

		harness.controller.complete_connect();
		harness.pump();
		assert!(harness.coordinator.is_subscribed());
		assert!(harness.drain_events().is_empty());
		assert_eq!(harness.count(ServiceCall::RequestUpdates(config)), 2);
		assert_eq!(harness.count(ServiceCall::CheckSettings(config)), 1);
		assert_eq!(harness.count(ServiceCall::RegisterActivity), 1);
	}

	#[test]
	fn exhausted_reconnects_surface_failure() {
		let mut harness = Harness::new(SessionOptions::default().with_reconnect(locus_runtime::ReconnectPolicy::limited(0)));
		harness.connect(SettingsStatus::Success);
		harness.drain_events();

		harness.controller.suspend(SuspendCause::NetworkLost);
		harness.pump();
		assert_eq!(harness.drain_events(), vec![SessionEvent::ConnectionFailed(FailureReason::RetriesExhausted)]);
		assert!(!harness.coordinator.is_subscribed());
	}

	#[test]
	fn check_in_flight_during_suspension_is_reissued() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.coordinator.start();
		harness.controller.complete_connect();
		harness.pump();
		let config = *harness.coordinator.config();

		harness.controller.suspend(SuspendCause::NetworkLost);
		harness.pump();
		harness.controller.complete_connect();
		harness.pump();
		assert_eq!(harness.count(ServiceCall::CheckSettings(config)), 2);
		assert_eq!(harness.count(ServiceCall::RegisterActivity), 1);

		harness.controller.settings(SettingsStatus::Success);
		harness.pump();
		assert!(harness.coordinator.is_subscribed());
	}

	#[test]
	fn set_config_reruns_check_and_rebinds() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.connect(SettingsStatus::Success);
		let next = UpdateConfig::new(10_000, 5_000, Priority::BalancedPower).unwrap();

		harness.coordinator.set_config(next);
		assert!(!harness.coordinator.is_subscribed());
		assert_eq!(harness.count(ServiceCall::CheckSettings(next)), 1);

		harness.controller.settings(SettingsStatus::Success);
		harness.pump();
		assert!(harness.coordinator.is_subscribed());
		assert_eq!(harness.count(ServiceCall::RequestUpdates(next)), 1);
	}

	#[test]
	fn resolution_answer_is_correlated() {
		let mut harness = Harness::new(SessionOptions::default());
		let handle = ResolutionHandle::new(7);
		harness.connect(SettingsStatus::ResolutionRequired(handle));
		assert!(harness.coordinator.is_subscribed());

		harness.coordinator.complete_resolution(handle, UserResolution::Confirmed).unwrap();
		assert!(harness.coordinator.complete_resolution(handle, UserResolution::Confirmed).is_err());
		assert_eq!(
			harness.drain_events(),
			vec![
				SessionEvent::Capability(CapabilityOutcome::ResolvableViaUserAction(handle)),
				SessionEvent::ResolutionCompleted {
					handle,
					outcome: UserResolution::Confirmed
				}
			]
		);
		assert_eq!(harness.count(ServiceCall::CheckSettings(*harness.coordinator.config())), 1);
	}

	#[test]
	fn snapshot_reflects_state() {
		let mut harness = Harness::new(SessionOptions::default());
		harness.connect(SettingsStatus::Success);
		let snapshot = harness.coordinator.snapshot();
		assert!(snapshot.started);
		assert!(snapshot.subscribed);
		assert!(snapshot.relay_armed);
		assert_eq!(snapshot.connection, ConnectionState::Connected);
		assert_eq!(snapshot.epoch, Epoch::new(1));
	}
}
