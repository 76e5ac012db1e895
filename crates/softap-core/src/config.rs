// ── Mode configuration & config-change policy ──
//
// The wrapper handed in by the orchestrator, plus the pure predicates the
// state machine applies to configuration and capability values: the
// restart-required check, feature validation, bridged-band fallback, and
// the effective shutdown timeout.

use std::time::Duration;

use softap_hal::{ApConfiguration, ApFeatures, BandSet, Capability};

/// How the AP's IP plane is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Attached to the device's upstream connection.
    Tethered,
    /// Local-only network, no upstream.
    LocalOnly,
}

/// Startup bundle for one soft AP.
#[derive(Debug, Clone)]
pub struct ApModeConfig {
    pub target_mode: TargetMode,
    /// `None` means "use the persisted tethering default".
    pub config: Option<ApConfiguration>,
    pub capability: Capability,
}

/// Whether adopting `new` at runtime would require an AP restart.
///
/// Runtime-adjustable fields (client lists, client control, max clients,
/// timeouts and their enables) are deliberately excluded; anything the
/// channel planner would have to re-evaluate is included. Callers neutralize
/// the current BSSID first when it was framework-randomized, so a `None`
/// incoming BSSID compares equal.
pub(crate) fn requires_restart(
    current: &ApConfiguration,
    new: &ApConfiguration,
) -> bool {
    current.ssid != new.ssid
        || current.security != new.security
        || current.passphrase != new.passphrase
        || current.bands != new.bands
        || current.hidden != new.hidden
        || current.bssid != new.bssid
}

/// Whether every feature the configuration relies on is present in the
/// capability. Client limiting and client control both need the driver to
/// be able to force-disconnect stations.
pub(crate) fn all_features_supported(
    config: &ApConfiguration,
    capability: &Capability,
) -> bool {
    if (config.max_clients > 0 || config.client_control_enabled)
        && !capability.supports(ApFeatures::CLIENT_FORCE_DISCONNECT)
    {
        return false;
    }
    true
}

/// Collapse a bridged configuration to a single band entry when any
/// requested band is not currently available.
///
/// Returns `None` when every requested band is available and bridged mode
/// can proceed. The fallback band is the union of whatever remains
/// available, widened with 2.4 GHz when the hardware supports it.
pub(crate) fn bridged_fallback(
    config: &ApConfiguration,
    capability: &Capability,
) -> Option<ApConfiguration> {
    let mut fallback = false;
    let mut merged = BandSet::NONE;
    for target in &config.bands {
        let available = target.intersection(capability.available_bands);
        if available != *target {
            fallback = true;
        }
        merged = merged.union(available);
    }
    if !fallback {
        return None;
    }
    if capability.available_bands.contains(BandSet::BAND_2GHZ) {
        merged = merged.union(BandSet::BAND_2GHZ);
    }
    Some(config.with_single_band(merged))
}

/// Delay programmed into the whole-AP shutdown timer.
pub(crate) fn shutdown_delay(config: &ApConfiguration, default: Duration) -> Duration {
    if config.shutdown_timeout_ms > 0 {
        Duration::from_millis(config.shutdown_timeout_ms)
    } else {
        default
    }
}

/// Timeout value echoed to observers on every info broadcast: the
/// programmed delay, or 0 while auto-shutdown is disabled.
pub(crate) fn effective_shutdown_timeout_ms(
    config: &ApConfiguration,
    default: Duration,
) -> u64 {
    if config.auto_shutdown_enabled {
        shutdown_delay(config, default).as_millis() as u64
    } else {
        0
    }
}
