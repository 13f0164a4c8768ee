pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod request_id;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod system;

pub use app::{AppContext, MingoApp};
pub use clock::{Clock, FixedClock, ManualClock, SharedClock, SystemClock};
pub use config::{ConfigOverrides, MingoConfig};
pub use error::{exit_code, MingoError, Result};
pub use health::{format_uptime, report, HealthReport};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use request_id::{ensure_trace_id, ClockIdGenerator, IdGenerator, RequestId};
pub use server::{HttpServer, Server, ServerHandle};
pub use shutdown::{
    ManualSignals, OsSignals, ShutdownCoordinator, ShutdownHandle, ShutdownOutcome,
    ShutdownSignal, SignalSource,
};
pub use store::{InMemoryStore, Person, RecordStore};
