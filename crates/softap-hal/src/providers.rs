// ── Platform collaborators ──
//
// Small trait handles for the pieces of platform state the manager reads
// but does not own: persisted defaults, tuning constants, and the
// coexistence advisor.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ApConfiguration;

/// Platform tuning defaults, typically sourced from device resources or
/// carrier configuration.
pub trait CapabilityDefaults: Send + Sync {
    /// Whole-AP inactivity shutdown delay used when the configuration
    /// leaves `shutdown_timeout_ms` at 0.
    fn default_shutdown_timeout(&self) -> Duration;

    /// Idle-instance shutdown delay in bridged mode.
    fn default_bridged_idle_timeout(&self) -> Duration;
}

/// Persisted default-configuration store.
pub trait ConfigStore: Send + Sync {
    /// The user-configured tethering default, if one was ever saved.
    fn default_config(&self) -> Option<ApConfiguration>;

    /// Fill in a framework-randomized BSSID when the configuration leaves
    /// it unset.
    fn randomize_bssid_if_unset(&self, config: ApConfiguration) -> ApConfiguration;
}

/// Callback surface of the coexistence advisor.
///
/// The manager registers while the AP runs. The unsafe-channel callback is
/// a reserved subscription; no shutdown behavior hangs off it yet.
pub trait CoexListener: Send + Sync {
    fn on_unsafe_channels_changed(&self);
}

/// Channel coexistence advisor registration surface.
pub trait CoexAdvisor: Send + Sync {
    fn register(&self, listener: Arc<dyn CoexListener>);
    fn unregister(&self, listener: &Arc<dyn CoexListener>);
}
