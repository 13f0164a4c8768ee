mod coordinator;
mod signals;
mod types;


pub use coordinator::{ShutdownCoordinator, ShutdownHandle, DEFAULT_DRAIN_TIMEOUT};
pub use signals::{ManualSignals, OsSignals, SignalSource, SignalTrigger};
pub use types::{CoordinatorPhase, ShutdownOutcome, ShutdownSignal};
