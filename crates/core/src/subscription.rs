//! Position stream subscription.
//!
//! One [`LocationSubscription`] lives as long as the session; each
//! `begin`/`end` pair is a separate stream identified by the ticket it was
//! requested under. Samples are accepted only from the current stream and
//! only if they are at least `fastest_interval_ms` after the previously
//! delivered sample. The floor spans streams: pausing, rebinding after a
//! suspension or a config change never reopens it, and the last known
//! position counts as a delivery. Only `reset` clears it.

use locus_protocol::{PositionSample, UpdateConfig};
use locus_runtime::{ConnectionState, LocationClient, Ticket};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct ActiveStream {
	ticket: Ticket,
	floor_ms: u64,
}

/// Starts and stops the position stream and filters what it delivers.
pub struct LocationSubscription {
	client: Box<dyn LocationClient>,
	active: Option<ActiveStream>,
	last_delivered_ms: Option<u64>,
	last_known: Option<PositionSample>,
}

impl LocationSubscription {
	pub fn new(client: Box<dyn LocationClient>) -> Self {
		Self {
			client,
			active: None,
			last_delivered_ms: None,
			last_known: None,
		}
	}

	pub fn is_active(&self) -> bool {
		self.active.is_some()
	}

	/// Requests updates under `ticket`.
	///
	/// Fails with [`Error::NotConnected`] unless `connection` is `Connected`.
	/// A second `begin` while a stream is active is a no-op.
	pub fn begin(&mut self, connection: &ConnectionState, config: &UpdateConfig, ticket: Ticket) -> Result<()> {
		if *connection != ConnectionState::Connected {
			return Err(Error::NotConnected);
		}
		if self.active.is_some() {
			debug!(target = "locus.subscription", "already subscribed");
			return Ok(());
		}

		debug!(target = "locus.subscription", %ticket, interval_ms = config.interval_ms(), "requesting updates");
		self.client.request_updates(config, ticket);
		self.active = Some(ActiveStream {
			ticket,
			floor_ms: config.fastest_interval_ms(),
		});
		Ok(())
	}

	/// Stops the stream. Idempotent.
	pub fn end(&mut self) {
		if let Some(stream) = self.active.take() {
			debug!(target = "locus.subscription", ticket = %stream.ticket, "removing updates");
			self.client.remove_updates();
		}
	}

	/// Forgets the stream without calling the service, for when the
	/// connection carrying it is gone. Returns whether a stream was active.
	pub fn detach(&mut self) -> bool {
		self.active.take().is_some()
	}

	/// Filters one pushed sample. Returns the sample if it should be delivered.
	pub fn accept(&mut self, ticket: Ticket, sample: PositionSample) -> Option<PositionSample> {
		let Some(stream) = self.active else {
			debug!(target = "locus.subscription", %ticket, "sample after end dropped");
			return None;
		};
		if stream.ticket != ticket {
			debug!(target = "locus.subscription", %ticket, current = %stream.ticket, "sample from previous stream dropped");
			return None;
		}

		if let Some(last) = self.last_delivered_ms {
			let gap = sample.timestamp_ms.saturating_sub(last);
			if gap < stream.floor_ms {
				debug!(
					target = "locus.subscription",
					gap_ms = gap,
					floor_ms = stream.floor_ms,
					"sample below floor interval dropped"
				);
				return None;
			}
		}

		self.last_delivered_ms = Some(sample.timestamp_ms);
		if sample.has_fix() {
			self.last_known = Some(sample.clone());
		}
		Some(sample)
	}

	/// Fetches the service's last fix when none is known yet.
	///
	/// Returns the fetched sample so it can be delivered immediately.
	pub fn fetch_last_known(&mut self) -> Option<PositionSample> {
		if self.last_known.is_some() {
			return None;
		}
		let sample = self.client.last_location().filter(PositionSample::has_fix)?;
		debug!(target = "locus.subscription", timestamp_ms = sample.timestamp_ms, "last known position fetched");
		self.last_delivered_ms = Some(sample.timestamp_ms);
		self.last_known = Some(sample.clone());
		Some(sample)
	}

	pub fn last_known_position(&self) -> Option<&PositionSample> {
		self.last_known.as_ref()
	}

	/// Ends the stream and forgets the last known position and the floor.
	pub fn reset(&mut self) {
		self.end();
		self.last_delivered_ms = None;
		self.last_known = None;
	}
}
