// softap-core: Lifecycle manager for a single soft access point.
//
// Drives one AP from cold start through a running, client-serving state to
// a clean shutdown or fault-induced teardown. A single dispatcher task
// delivers events FIFO from a mailbox to a two-level state machine
// (`Idle` ⊃ `Started`); driver callbacks and timers are marshalled onto
// the same mailbox, so no handler ever races another.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod state;

mod admission;
mod event;
mod machine;
mod pending;
mod registry;
mod timer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use callbacks::{ModeObserver, ShutdownNotifier, StatusCallback};
pub use config::{ApModeConfig, TargetMode};
pub use error::StartError;
pub use lifecycle::{SoftApDeps, SoftApLifecycle, SoftApRole};
pub use machine::PENDING_DISCONNECT_RETRY_DELAY_MS;
pub use metrics::{MetricsSink, NoopMetrics};
pub use state::{ApState, BlockReason};

// Boundary types at the crate root for ergonomics.
pub use softap_hal::{
    ApClient, ApConfiguration, ApFeatures, BandSet, Capability, ChannelBandwidth,
    DisconnectReason, MacAddress, RadioInstanceInfo, SecurityMode, WifiStandard,
};
