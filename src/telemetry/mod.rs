//! Controller telemetry ingestion: message handling, disconnect grace
//! timers and periodic snapshots of the latest readings.

pub mod cache;
pub mod handler;
pub mod payload;
pub mod snapshot;
pub mod timers;

pub use cache::{LatestReading, LatestTempCache};
pub use handler::{DropReason, HandleOutcome, TelemetryHandler, DISCONNECT_GRACE_PERIOD};
pub use snapshot::{persist_latest_temps, snapshot_loop, SNAPSHOT_INTERVAL};
pub use timers::DisconnectTimerRegistry;
