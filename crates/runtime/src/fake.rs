//! In-memory positioning service for tests and scripted runs.
//!
//! [`FakeService`] implements every client seam and records the calls it
//! receives; [`FakeServiceController`] plays the service side, injecting
//! completions under the tickets those calls carried.
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = completion_channel();
//! let (service, controller) = FakeServiceBuilder::new().build(tx);
//!
//! // hand `service` to the session, then:
//! controller.complete_connect();
//! controller.settings(SettingsStatus::Success);
//! controller.push_position(PositionSample::absent(0));
//! ```

use std::sync::Arc;

use locus_protocol::{PositionSample, UpdateConfig};
use parking_lot::Mutex;
use serde_json::Value;

use crate::client::{ActivityClient, ConnectionClient, LocationClient, SettingsClient, SettingsStatus};
use crate::completion::{Completion, CompletionSender, ConnectionEvent, SuspendCause};
use crate::connection::FailureReason;
use crate::ticket::Ticket;

/// A call received by the fake service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
	Connect,
	Disconnect,
	CheckSettings(UpdateConfig),
	RequestUpdates(UpdateConfig),
	RemoveUpdates,
	LastLocation,
	RegisterActivity,
	UnregisterActivity,
}

#[derive(Debug, Default)]
struct FakeState {
	calls: Vec<ServiceCall>,
	connect_ticket: Option<Ticket>,
	settings_ticket: Option<Ticket>,
	updates_ticket: Option<Ticket>,
	activity_ticket: Option<Ticket>,
	last_location: Option<PositionSample>,
}

/// Builder for fake service instances.
#[derive(Debug, Default)]
pub struct FakeServiceBuilder {
	last_location: Option<PositionSample>,
}

impl FakeServiceBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sample returned by `last_location()`.
	pub fn last_location(mut self, sample: PositionSample) -> Self {
		self.last_location = Some(sample);
		self
	}

	/// Builds the service and its controller. Completions go to `completions`.
	pub fn build(self, completions: CompletionSender) -> (FakeService, FakeServiceController) {
		let state = Arc::new(Mutex::new(FakeState {
			last_location: self.last_location,
			..FakeState::default()
		}));

		let service = FakeService { state: Arc::clone(&state) };
		let controller = FakeServiceController { state, completions };
		(service, controller)
	}
}

/// Service side seen by the session. Clones share the same recorded state,
/// so one instance can be handed out for every seam.
#[derive(Debug, Clone)]
pub struct FakeService {
	state: Arc<Mutex<FakeState>>,
}

impl ConnectionClient for FakeService {
	fn connect(&mut self, ticket: Ticket) {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::Connect);
		state.connect_ticket = Some(ticket);
	}

	fn disconnect(&mut self) {
		self.state.lock().calls.push(ServiceCall::Disconnect);
	}
}

impl SettingsClient for FakeService {
	fn check_settings(&mut self, config: &UpdateConfig, ticket: Ticket) {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::CheckSettings(*config));
		state.settings_ticket = Some(ticket);
	}
}

impl LocationClient for FakeService {
	fn request_updates(&mut self, config: &UpdateConfig, ticket: Ticket) {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::RequestUpdates(*config));
		state.updates_ticket = Some(ticket);
	}

	fn remove_updates(&mut self) {
		self.state.lock().calls.push(ServiceCall::RemoveUpdates);
	}

	fn last_location(&mut self) -> Option<PositionSample> {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::LastLocation);
		state.last_location.clone()
	}
}

impl ActivityClient for FakeService {
	fn register(&mut self, ticket: Ticket) {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::RegisterActivity);
		state.activity_ticket = Some(ticket);
	}

	fn unregister(&mut self) {
		self.state.lock().calls.push(ServiceCall::UnregisterActivity);
	}
}

/// Controller for injecting completions and inspecting recorded calls.
///
/// Tickets are remembered after the matching teardown call (`disconnect`,
/// `remove_updates`, `unregister`), so a test can deliver a result that was
/// "in flight" when the session tore the request down.
#[derive(Debug, Clone)]
pub struct FakeServiceController {
	state: Arc<Mutex<FakeState>>,
	completions: CompletionSender,
}

impl FakeServiceController {
	/// Injects a completion under an explicit ticket.
	pub fn inject(&self, ticket: Ticket, completion: Completion) -> bool {
		self.completions.send(ticket, completion)
	}

	/// Completes the latest handshake successfully.
	pub fn complete_connect(&self) -> bool {
		self.connection_event(ConnectionEvent::Connected)
	}

	/// Fails the latest handshake.
	pub fn fail_connect(&self, reason: FailureReason) -> bool {
		self.connection_event(ConnectionEvent::Failed { reason })
	}

	/// Suspends the latest established connection.
	pub fn suspend(&self, cause: SuspendCause) -> bool {
		self.connection_event(ConnectionEvent::Suspended { cause })
	}

	/// Answers the latest settings check.
	pub fn settings(&self, status: SettingsStatus) -> bool {
		let ticket = self.state.lock().settings_ticket;
		ticket.is_some_and(|ticket| self.inject(ticket, Completion::Settings(status)))
	}

	/// Pushes a sample on the latest update request.
	pub fn push_position(&self, sample: PositionSample) -> bool {
		let ticket = self.state.lock().updates_ticket;
		ticket.is_some_and(|ticket| self.inject(ticket, Completion::Position(sample)))
	}

	/// Pushes a raw classification payload on the latest registration.
	pub fn push_activity(&self, payload: Value) -> bool {
		let ticket = self.state.lock().activity_ticket;
		ticket.is_some_and(|ticket| self.inject(ticket, Completion::Activity(payload)))
	}

	pub fn set_last_location(&self, sample: Option<PositionSample>) {
		self.state.lock().last_location = sample;
	}

	pub fn connect_ticket(&self) -> Option<Ticket> {
		self.state.lock().connect_ticket
	}

	pub fn updates_ticket(&self) -> Option<Ticket> {
		self.state.lock().updates_ticket
	}

	/// Snapshot of every call received so far.
	pub fn calls(&self) -> Vec<ServiceCall> {
		self.state.lock().calls.clone()
	}

	/// Takes all recorded calls, clearing the buffer.
	pub fn take_calls(&self) -> Vec<ServiceCall> {
		std::mem::take(&mut self.state.lock().calls)
	}

	pub fn call_count(&self, predicate: impl Fn(&ServiceCall) -> bool) -> usize {
		self.state.lock().calls.iter().filter(|call| predicate(call)).count()
	}

	fn connection_event(&self, event: ConnectionEvent) -> bool {
		let ticket = self.state.lock().connect_ticket;
		ticket.is_some_and(|ticket| self.inject(ticket, Completion::Connection(event)))
	}
}
