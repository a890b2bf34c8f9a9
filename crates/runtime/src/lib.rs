//! Positioning service seams, connection lifecycle, and completion marshaling.
//!
//! The positioning service is reached through four narrow traits in
//! [`client`]. Everything the service reports back arrives asynchronously as
//! an [`Envelope`] on a [`completion_channel`], stamped with the [`Ticket`]
//! the request was issued under, so the consumer can discard stale results.

pub mod client;
pub mod completion;
pub mod connection;
pub mod fake;
pub mod ticket;

pub use client::{ActivityClient, ConnectionClient, LocationClient, ResolutionHandle, SettingsClient, SettingsStatus};
pub use completion::{Completion, CompletionReceiver, CompletionSender, ConnectionEvent, Envelope, SuspendCause, completion_channel};
pub use connection::{ConnectionState, FailureReason, ReconnectPolicy, ServiceConnection, Transition};
pub use fake::{FakeService, FakeServiceBuilder, FakeServiceController, ServiceCall};
pub use ticket::{Epoch, Ticket, TicketIssuer};
