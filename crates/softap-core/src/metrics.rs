// ── Metrics sink ──

use std::time::Duration;

use softap_hal::{ApConfiguration, Capability, RadioInstanceInfo};

use crate::config::TargetMode;
use crate::error::StartError;

/// Counters and snapshots the manager reports as it runs. Implementations
/// are non-blocking; recording must never fail the caller.
pub trait MetricsSink: Send + Sync {
    fn record_start_result(&self, success: bool, failure: Option<StartError>);

    fn record_connected_clients(&self, count: usize, mode: TargetMode);

    /// A station was turned away because the cap was reached. Latched to at
    /// most one record per configuration epoch by the caller.
    fn record_client_blocked_at_capacity(&self, cap: usize);

    fn record_channel_switched(&self, info: &RadioInstanceInfo, mode: TargetMode);

    /// The selected channel landed outside the user's requested band.
    fn record_band_preference_violation(&self);

    fn record_iface_up_changed(
        &self,
        up: bool,
        mode: TargetMode,
        default_shutdown: Duration,
    );

    fn record_configuration(&self, config: &ApConfiguration, mode: TargetMode);

    fn record_capability(&self, capability: &Capability, mode: TargetMode);
}

/// Sink that records nothing, for callers without a metrics pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_start_result(&self, _success: bool, _failure: Option<StartError>) {}
    fn record_connected_clients(&self, _count: usize, _mode: TargetMode) {}
    fn record_client_blocked_at_capacity(&self, _cap: usize) {}
    fn record_channel_switched(&self, _info: &RadioInstanceInfo, _mode: TargetMode) {}
    fn record_band_preference_violation(&self) {}
    fn record_iface_up_changed(
        &self,
        _up: bool,
        _mode: TargetMode,
        _default_shutdown: Duration,
    ) {
    }
    fn record_configuration(&self, _config: &ApConfiguration, _mode: TargetMode) {}
    fn record_capability(&self, _capability: &Capability, _mode: TargetMode) {}
}
