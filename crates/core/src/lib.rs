// locus: positioning session coordinator
//
// Composes the service connection, settings resolution, position stream and
// activity relay of `locus-runtime` into one session a host can start, pause,
// resume and stop.

pub mod capability;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod events;
pub mod options;
pub mod relay;
pub mod subscription;

pub use capability::{CapabilityOutcome, CapabilityResolver, UserResolution};
pub use coordinator::{ServiceClients, SessionCoordinator, SessionSnapshot};
pub use driver::{SessionDriver, SessionHandle};
pub use error::{Error, Result};
pub use events::{EventBus, EventReceiver, SessionEvent};
pub use options::{ConfidencePolicy, SessionOptions};
pub use relay::{ActivityRelay, decode_classification};
pub use subscription::LocationSubscription;

pub use locus_protocol::{ActivityClassification, ActivityKind, Fix, PositionSample, Priority, UpdateConfig};
pub use locus_runtime::{FailureReason, ReconnectPolicy, ResolutionHandle};
