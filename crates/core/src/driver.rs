//! Control task for a session.
//!
//! The coordinator is not thread-safe; instead it is moved into one task that
//! owns it for its whole life. Host commands arrive on one queue, service
//! completions on another, and the task applies both in arrival order:
//!
//! ```text
//! SessionHandle ──Command──▶ ┐
//!                            ├─▶ SessionDriver::run ─▶ SessionCoordinator
//! CompletionSender ─Envelope▶┘
//! ```
//!
//! Each command carries a `oneshot` sender for its reply. Completions already
//! queued are applied before the next command, so a reply reflects every
//! service result that arrived before the command was sent.

use locus_protocol::UpdateConfig;
use locus_runtime::{CompletionReceiver, ResolutionHandle};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::capability::UserResolution;
use crate::coordinator::{SessionCoordinator, SessionSnapshot};
use crate::error::{Error, Result};
use crate::events::EventReceiver;

enum Command {
	Start(oneshot::Sender<()>),
	Stop(oneshot::Sender<()>),
	Pause(oneshot::Sender<()>),
	Resume(oneshot::Sender<()>),
	SetConfig(UpdateConfig, oneshot::Sender<()>),
	CompleteResolution(ResolutionHandle, UserResolution, oneshot::Sender<Result<()>>),
	Subscribe(oneshot::Sender<EventReceiver>),
	Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Runs a [`SessionCoordinator`] on its own task.
pub struct SessionDriver {
	coordinator: SessionCoordinator,
	commands: mpsc::UnboundedReceiver<Command>,
	completions: CompletionReceiver,
}

impl SessionDriver {
	/// Moves `coordinator` onto a new task.
	///
	/// The task ends once every [`SessionHandle`] is dropped; it stops the
	/// session on the way out and returns the coordinator.
	pub fn spawn(coordinator: SessionCoordinator, completions: CompletionReceiver) -> (SessionHandle, JoinHandle<SessionCoordinator>) {
		let (tx, commands) = mpsc::unbounded_channel();
		let driver = Self {
			coordinator,
			commands,
			completions,
		};
		let task = tokio::spawn(driver.run());
		(SessionHandle { tx }, task)
	}

	async fn run(mut self) -> SessionCoordinator {
		let mut completions_open = true;

		loop {
			tokio::select! {
				biased;

				envelope = self.completions.recv(), if completions_open => match envelope {
					Some(envelope) => self.coordinator.dispatch(envelope),
					None => {
						debug!(target = "locus.session", "completion queue closed");
						completions_open = false;
					}
				},
				command = self.commands.recv() => match command {
					Some(command) => self.apply(command),
					None => break,
				},
			}
		}

		self.coordinator.stop();
		info!(target = "locus.session", "session driver exited");
		self.coordinator
	}

	fn apply(&mut self, command: Command) {
		// Replies are best effort: a caller that stopped waiting is not an error.
		match command {
			Command::Start(reply) => {
				self.coordinator.start();
				let _ = reply.send(());
			}
			Command::Stop(reply) => {
				self.coordinator.stop();
				let _ = reply.send(());
			}
			Command::Pause(reply) => {
				self.coordinator.pause();
				let _ = reply.send(());
			}
			Command::Resume(reply) => {
				self.coordinator.resume();
				let _ = reply.send(());
			}
			Command::SetConfig(config, reply) => {
				self.coordinator.set_config(config);
				let _ = reply.send(());
			}
			Command::CompleteResolution(handle, resolution, reply) => {
				let _ = reply.send(self.coordinator.complete_resolution(handle, resolution));
			}
			Command::Subscribe(reply) => {
				let _ = reply.send(self.coordinator.subscribe());
			}
			Command::Snapshot(reply) => {
				let _ = reply.send(self.coordinator.snapshot());
			}
		}
	}
}

/// Cloneable host-side handle to a running session.
///
/// Every method resolves once the driver has applied the command. All of
/// them fail with [`Error::SessionClosed`] after the driver task has exited.
#[derive(Debug, Clone)]
pub struct SessionHandle {
	tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
	pub async fn start(&self) -> Result<()> {
		self.request(Command::Start).await
	}

	pub async fn stop(&self) -> Result<()> {
		self.request(Command::Stop).await
	}

	pub async fn pause(&self) -> Result<()> {
		self.request(Command::Pause).await
	}

	pub async fn resume(&self) -> Result<()> {
		self.request(Command::Resume).await
	}

	pub async fn set_config(&self, config: UpdateConfig) -> Result<()> {
		self.request(|reply| Command::SetConfig(config, reply)).await
	}

	pub async fn complete_resolution(&self, handle: ResolutionHandle, resolution: UserResolution) -> Result<()> {
		self.request(|reply| Command::CompleteResolution(handle, resolution, reply))
			.await?
	}

	pub async fn subscribe(&self) -> Result<EventReceiver> {
		self.request(Command::Subscribe).await
	}

	pub async fn snapshot(&self) -> Result<SessionSnapshot> {
		self.request(Command::Snapshot).await
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
		let (reply, rx) = oneshot::channel();
		self.tx.send(command(reply)).map_err(|_| Error::SessionClosed)?;
		rx.await.map_err(|_| Error::SessionClosed)
	}
}
