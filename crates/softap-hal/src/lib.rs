// softap-hal: Boundary between the lifecycle manager and the radio stack.
//
// Everything the manager consumes from below lives here: the value types
// that cross the driver boundary and the collaborator traits the core is
// wired with. The core crate never talks to hardware directly.

pub mod capability;
pub mod config;
pub mod driver;
pub mod planner;
pub mod providers;
pub mod types;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::{ApFeatures, Capability};
pub use config::{ApConfiguration, SecurityMode};
pub use driver::{InterfaceCallback, NativeDriver, SoftApEventListener};
pub use planner::{ChannelPlanError, ChannelPlanner};
pub use providers::{CapabilityDefaults, CoexAdvisor, CoexListener, ConfigStore};
pub use types::{
    band_of_frequency, ApClient, BandSet, ChannelBandwidth, DisconnectReason, MacAddress,
    RadioInstanceInfo, WifiStandard,
};
