// ── Lifecycle state machine ──
//
// Two states in a parent/child relationship: `Idle` is the parent,
// `Started` the child, and events `Started` leaves unhandled fall through
// to `Idle`. The machine runs on the dispatcher task and owns every piece
// of mutable lifecycle state; nothing here is shared.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use softap_hal::{
    band_of_frequency, ApClient, ApConfiguration, ApFeatures, BandSet, Capability,
    ChannelBandwidth, CoexListener, DisconnectReason, InterfaceCallback, MacAddress,
    RadioInstanceInfo, SoftApEventListener, WifiStandard,
};

use crate::admission::{Admission, AdmissionPolicy};
use crate::config::{
    all_features_supported, bridged_fallback, requires_restart, shutdown_delay,
    ApModeConfig, TargetMode,
};
use crate::error::StartError;
use crate::event::ApEvent;
use crate::lifecycle::{SoftApDeps, SoftApRole};
use crate::pending::PendingDisconnectQueue;
use crate::registry::ClientRegistry;
use crate::state::{ApState, BlockReason};
use crate::timer::{TimerSet, WakeTimer};

/// Delay before a failed forced disconnect is retried.
pub const PENDING_DISCONNECT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateId {
    Idle,
    Started,
}

impl StateId {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Started => "started",
        }
    }
}

// ── Driver event marshalling ────────────────────────────────────────
// Driver callbacks run on arbitrary threads; these adapters turn them
// into mailbox events and never touch machine state.

struct IfaceEvents {
    tx: mpsc::UnboundedSender<ApEvent>,
}

impl InterfaceCallback for IfaceEvents {
    fn on_destroyed(&self, iface: &str) {
        let _ = self.tx.send(ApEvent::IfaceDestroyed {
            iface: iface.to_owned(),
        });
    }

    fn on_up(&self, iface: &str) {
        let _ = self.tx.send(ApEvent::IfaceStatusChanged {
            iface: iface.to_owned(),
            up: true,
        });
    }

    fn on_down(&self, iface: &str) {
        let _ = self.tx.send(ApEvent::IfaceStatusChanged {
            iface: iface.to_owned(),
            up: false,
        });
    }
}

struct ApListenerEvents {
    tx: mpsc::UnboundedSender<ApEvent>,
    /// Fallback instance identifier for drivers that only report the
    /// whole interface.
    default_instance: String,
}

impl SoftApEventListener for ApListenerEvents {
    fn on_failure(&self) {
        let _ = self.tx.send(ApEvent::Failure);
    }

    fn on_info_changed(
        &self,
        instance: Option<&str>,
        frequency_mhz: i32,
        bandwidth: ChannelBandwidth,
        standard: WifiStandard,
        bssid: Option<MacAddress>,
    ) {
        let Ok(frequency_mhz) = u32::try_from(frequency_mhz) else {
            error!(frequency_mhz, "invalid ap channel frequency");
            return;
        };
        let info = RadioInstanceInfo {
            instance: instance.unwrap_or(&self.default_instance).to_owned(),
            frequency_mhz,
            bandwidth,
            standard,
            bssid,
            shutdown_timeout_ms: 0,
        };
        let _ = self.tx.send(ApEvent::ApInfoChanged { info });
    }

    fn on_connected_clients_changed(
        &self,
        instance: Option<&str>,
        mac: MacAddress,
        connected: bool,
    ) {
        let client =
            ApClient::new(mac, instance.unwrap_or(&self.default_instance));
        let _ = self.tx.send(ApEvent::ClientAssocChanged { client, connected });
    }
}

/// Reserved coexistence subscription: registered while the AP runs, but
/// intentionally reactionless until bridged-mode coex shutdown is defined.
struct ReservedCoexListener;

impl CoexListener for ReservedCoexListener {
    fn on_unsafe_channels_changed(&self) {}
}

// ── Machine ─────────────────────────────────────────────────────────

pub(crate) struct Machine {
    deps: SoftApDeps,
    id: u64,
    role: SoftApRole,
    target_mode: TargetMode,
    requestor: Option<String>,

    config: ApConfiguration,
    capability: Capability,
    /// The supplied configuration left the BSSID unset; the current one may
    /// carry a framework-randomized address.
    bssid_was_unset: bool,
    blocked: HashSet<MacAddress>,
    allowed: HashSet<MacAddress>,
    timeout_enabled: bool,
    bridged_idle_enabled: bool,

    iface: Option<String>,
    iface_up: bool,
    iface_destroyed: bool,

    info_map: HashMap<String, RadioInstanceInfo>,
    registry: ClientRegistry,
    pending: PendingDisconnectQueue,
    timers: TimerSet,
    retry_timer: WakeTimer,
    reported_capacity_metric: bool,
    start_timestamp: Option<String>,
    coex_listener: Option<Arc<dyn CoexListener>>,

    state: StateId,
    quitting: bool,

    tx: mpsc::UnboundedSender<ApEvent>,
    state_tx: tokio::sync::watch::Sender<&'static str>,
    iface_tx: tokio::sync::watch::Sender<Option<String>>,
}

impl Machine {
    pub(crate) fn new(
        deps: SoftApDeps,
        mode_config: ApModeConfig,
        id: u64,
        role: SoftApRole,
        tx: mpsc::UnboundedSender<ApEvent>,
        state_tx: tokio::sync::watch::Sender<&'static str>,
        iface_tx: tokio::sync::watch::Sender<Option<String>>,
    ) -> Self {
        let capability = mode_config.capability;

        // An absent configuration means "use the persisted default"; a
        // still-absent default leaves an unusable placeholder that fails
        // the SSID check on Start.
        let mut config = mode_config
            .config
            .or_else(|| deps.config_store.default_config());
        let mut bssid_was_unset = false;
        if let Some(cfg) = config.as_mut() {
            bssid_was_unset = cfg.bssid.is_none();
            if capability.supports(ApFeatures::MAC_ADDRESS_CUSTOMIZATION) {
                *cfg = deps.config_store.randomize_bssid_if_unset(cfg.clone());
            }
        }
        let config = config.unwrap_or_default();

        let blocked = config.blocked_set();
        let allowed = config.allowed_set();
        let timeout_enabled = config.auto_shutdown_enabled;
        let bridged_idle_enabled = config.bridged_opportunistic_shutdown_enabled;

        Self {
            deps,
            id,
            role,
            target_mode: mode_config.target_mode,
            requestor: None,
            config,
            capability,
            bssid_was_unset,
            blocked,
            allowed,
            timeout_enabled,
            bridged_idle_enabled,
            iface: None,
            iface_up: false,
            iface_destroyed: false,
            info_map: HashMap::new(),
            registry: ClientRegistry::new(),
            pending: PendingDisconnectQueue::new(),
            timers: TimerSet::new(),
            retry_timer: WakeTimer::new("pending-disconnect-retry"),
            reported_capacity_metric: false,
            start_timestamp: None,
            coex_listener: None,
            state: StateId::Idle,
            quitting: false,
            tx,
            state_tx,
            iface_tx,
        }
    }

    /// Dispatcher loop: one event at a time, FIFO, run to completion.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ApEvent>) {
        self.enter_idle();
        while let Some(event) = rx.recv().await {
            self.dispatch(event);
            if self.quitting {
                break;
            }
        }
        debug!(id = self.id, "dispatcher terminated");
    }

    // ── Dispatch & transitions ───────────────────────────────────────

    fn dispatch(&mut self, event: ApEvent) {
        let event = match event {
            ApEvent::Dump(reply) => {
                let _ = reply.send(self.dump_report());
                return;
            }
            other => other,
        };
        match self.state {
            StateId::Idle => self.idle_process(event),
            StateId::Started => {
                // Unhandled child events fall through to the parent state.
                if let Some(event) = self.started_process(event) {
                    self.idle_process(event);
                }
            }
        }
    }

    fn transition_to_started(&mut self) {
        self.state = StateId::Started;
        let _ = self.state_tx.send(StateId::Started.name());
        self.enter_started();
    }

    /// Terminal quit: exit the active state chain, then stop dispatching.
    fn quit(&mut self) {
        if self.state == StateId::Started {
            self.exit_started();
        }
        self.exit_idle();
        self.quitting = true;
        let _ = self.state_tx.send("quit");
    }

    // ── Idle state ───────────────────────────────────────────────────

    fn enter_idle(&mut self) {
        self.set_iface(None);
        self.iface_up = false;
        self.iface_destroyed = false;
        let _ = self.state_tx.send(StateId::Idle.name());
    }

    fn exit_idle(&mut self) {
        self.deps.mode_observer.on_stopped(self.id);
    }

    fn idle_process(&mut self, event: ApEvent) {
        match event {
            ApEvent::Stop => self.quit(),
            ApEvent::Start { requestor } => self.handle_start(requestor),
            ApEvent::UpdateCapability(capability) => {
                // Capability changes come from carrier requirements and
                // only apply to tethered mode.
                if self.target_mode == TargetMode::Tethered {
                    self.capability = capability;
                } else {
                    debug!("ignoring capability update in local-only mode");
                }
            }
            ApEvent::UpdateConfig(config) => {
                debug!(ssid = %config.ssid, "configuration changed");
                self.adopt_config(config);
            }
            other => {
                debug!(event = ?other, "ignored in idle state");
            }
        }
    }

    fn handle_start(&mut self, requestor: String) {
        self.requestor = Some(requestor);

        if self.config.ssid.is_empty() {
            error!("unable to start soft ap without valid configuration");
            self.start_failed(StartError::General, ApState::Disabled);
            return;
        }

        if self.config.is_bridged() {
            if let Some(single) = bridged_fallback(&self.config, &self.capability) {
                info!(band = %single.band(), "falling back to single ap mode");
                self.config = single;
            }
        }

        let callback: Arc<dyn InterfaceCallback> = Arc::new(IfaceEvents {
            tx: self.tx.clone(),
        });
        let iface = self
            .deps
            .driver
            .setup_interface(
                callback,
                self.requestor.as_deref().unwrap_or(""),
                self.config.band(),
                self.config.is_bridged(),
            )
            .filter(|name| !name.is_empty());
        let Some(iface) = iface else {
            error!("setup failure when creating ap interface");
            self.start_failed(StartError::General, ApState::Disabled);
            return;
        };
        self.set_iface(Some(iface));

        self.deps.notifier.dismiss_shutdown_timeout_expired();
        self.update_ap_state(ApState::Enabling, ApState::Disabled);

        match self.start_soft_ap() {
            Ok(()) => self.transition_to_started(),
            Err(reason) => {
                self.update_ap_state(ApState::Failed(reason), ApState::Enabling);
                self.stop_soft_ap();
                self.set_iface(None);
                self.deps.metrics.record_start_result(false, Some(reason));
                self.deps.mode_observer.on_start_failure(self.id);
            }
        }
    }

    fn start_failed(&mut self, reason: StartError, previous: ApState) {
        self.update_ap_state(ApState::Failed(reason), previous);
        self.deps.metrics.record_start_result(false, Some(reason));
        self.deps.mode_observer.on_start_failure(self.id);
    }

    // ── Started state ────────────────────────────────────────────────

    fn enter_started(&mut self) {
        self.iface_up = false;
        self.iface_destroyed = false;
        let up = self
            .iface
            .as_deref()
            .is_some_and(|iface| self.deps.driver.is_interface_up(iface));
        self.on_up_changed(up);

        let listener: Arc<dyn CoexListener> = Arc::new(ReservedCoexListener);
        self.deps.coex.register(Arc::clone(&listener));
        self.coex_listener = Some(listener);

        debug!(iface = self.log_iface(), "resetting connected clients on start");
        self.registry.clear();
        self.pending.clear();
        self.reported_capacity_metric = false;
        self.schedule_timeouts();
    }

    fn exit_started(&mut self) {
        if !self.iface_destroyed {
            self.stop_soft_ap();
        }

        if let Some(listener) = self.coex_listener.take() {
            self.deps.coex.unregister(&listener);
        }

        if self.registry.total_count() != 0 {
            debug!(iface = self.log_iface(), "resetting num stations on stop");
            self.registry.clear();
            self.broadcast_clients_or_info();
            self.deps
                .metrics
                .record_connected_clients(0, self.target_mode);
        }
        self.pending.clear();
        self.retry_timer.cancel();
        self.timers.cancel_shutdown();
        self.timers.cancel_bridged_idle();

        // No further interface status events are handled past this point,
        // so report the down transition from here.
        self.deps.metrics.record_iface_up_changed(
            false,
            self.target_mode,
            self.deps.defaults.default_shutdown_timeout(),
        );
        self.update_ap_state(ApState::Disabled, ApState::Disabling);

        self.set_iface(None);
        self.iface_up = false;
        self.iface_destroyed = false;
        self.clear_info_and_broadcast();
    }

    fn started_process(&mut self, event: ApEvent) -> Option<ApEvent> {
        match event {
            ApEvent::ClientAssocChanged { client, connected } => {
                debug!(client = %client, connected, "client association changed");
                self.handle_client_assoc(client, connected);
            }
            ApEvent::ApInfoChanged { info } => {
                let default = self.deps.defaults.default_shutdown_timeout();
                let mut info = info;
                info.shutdown_timeout_ms = self.effective_timeout_ms(default);
                self.update_info(info, false);
            }
            ApEvent::IfaceStatusChanged { iface, up } => {
                if self.iface.as_deref() == Some(iface.as_str()) {
                    self.on_up_changed(up);
                }
            }
            ApEvent::Stop => {
                let previous = if self.iface_up {
                    ApState::Enabled
                } else {
                    ApState::Enabling
                };
                self.update_ap_state(ApState::Disabling, previous);
                self.quit();
            }
            ApEvent::Start { .. } => {
                debug!("already started, ignoring start command");
            }
            ApEvent::NoClientsTimeout => self.handle_shutdown_timeout(),
            ApEvent::NoClientsTimeoutOneInstance => self.handle_bridged_idle_timeout(),
            ApEvent::IfaceDestroyed { iface } => {
                if self.iface.as_deref() == Some(iface.as_str()) {
                    debug!("interface was cleanly destroyed");
                    self.update_ap_state(ApState::Disabling, ApState::Enabled);
                    self.iface_destroyed = true;
                    self.quit();
                }
            }
            ApEvent::Failure => {
                warn!(iface = self.log_iface(), "driver failure, stop and report");
                self.fail_and_quit();
            }
            ApEvent::IfaceDown => {
                warn!(iface = self.log_iface(), "interface error, stop and report failure");
                self.fail_and_quit();
            }
            ApEvent::UpdateCapability(capability) => {
                if self.target_mode == TargetMode::Tethered {
                    self.capability = capability;
                    self.deps
                        .metrics
                        .record_capability(&self.capability, self.target_mode);
                    self.update_client_connection();
                } else {
                    debug!("ignoring capability update in local-only mode");
                }
            }
            ApEvent::UpdateConfig(config) => self.handle_config_update(config),
            ApEvent::ForceDisconnectPending => self.handle_pending_retry(),
            // Dump requests are answered before state dispatch; dropping
            // the reply sender here resolves the request as "not active".
            ApEvent::Dump(_) => {}
        }
        None
    }

    fn fail_and_quit(&mut self) {
        self.update_ap_state(ApState::Failed(StartError::General), ApState::Enabled);
        self.update_ap_state(
            ApState::Disabling,
            ApState::Failed(StartError::General),
        );
        self.quit();
    }

    fn handle_shutdown_timeout(&mut self) {
        if !self.timeout_enabled {
            error!("shutdown timeout fired while auto shutdown is disabled, dropping");
            return;
        }
        if self.registry.total_count() != 0 {
            error!("shutdown timeout fired with clients connected, dropping");
            return;
        }
        self.deps.notifier.show_shutdown_timeout_expired();
        info!(iface = self.log_iface(), "no clients timeout, stopping soft ap");
        self.update_ap_state(ApState::Disabling, ApState::Enabled);
        self.quit();
    }

    fn handle_bridged_idle_timeout(&mut self) {
        self.timers.bridged_idle_fired();
        if !self.bridged_idle_enabled {
            error!("bridged idle timeout fired while disabled, dropping");
            return;
        }
        let idle = self.registry.idle_instances();
        if idle.is_empty() {
            return;
        }
        debug!(count = idle.len(), "instance idle timeout");

        // Shut down the idle instance running highest in spectrum.
        let mut shutdown_instance: Option<String> = None;
        let mut max_frequency = 0u32;
        for instance in idle {
            let Some(info) = self.info_map.get(&instance) else {
                continue;
            };
            if info.frequency_mhz > max_frequency {
                max_frequency = info.frequency_mhz;
                shutdown_instance = Some(instance);
            }
        }
        let Some(instance) = shutdown_instance else {
            return;
        };
        if let Some(iface) = self.iface.clone() {
            info!(
                instance = %instance,
                iface = %iface,
                "removing idle instance from bridged interface"
            );
            self.deps.driver.remove_instance_from_bridge(&iface, &instance);
        }
        if let Some(stored) = self.info_map.get(&instance).cloned() {
            self.update_info(stored, true);
        }
    }

    fn handle_config_update(&mut self, new_config: ApConfiguration) {
        // A framework-randomized BSSID compares as unset, so handing back a
        // configuration without a BSSID does not force a restart.
        let current = if self.bssid_was_unset {
            self.config.with_unset_bssid()
        } else {
            self.config.clone()
        };
        if requires_restart(&current, &new_config) {
            info!("ignoring config update since it requires an ap restart");
            return;
        }

        debug!(ssid = %new_config.ssid, "configuration changed");
        if self.config.max_clients != new_config.max_clients {
            debug!("max clients changed, resetting capacity metric latch");
            self.reported_capacity_metric = false;
        }
        let reschedule = self.config.shutdown_timeout_ms
            != new_config.shutdown_timeout_ms
            || self.timeout_enabled != new_config.auto_shutdown_enabled
            || self.bridged_idle_enabled
                != new_config.bridged_opportunistic_shutdown_enabled;

        self.adopt_config(new_config);
        self.update_client_connection();

        if reschedule {
            self.timers.cancel_shutdown();
            self.timers.cancel_bridged_idle();
            self.schedule_timeouts();

            // Re-announce every instance with the new effective timeout.
            let default = self.deps.defaults.default_shutdown_timeout();
            let timeout_ms = self.effective_timeout_ms(default);
            let mut infos: Vec<RadioInstanceInfo> =
                self.info_map.values().cloned().collect();
            for info in &mut infos {
                info.shutdown_timeout_ms = timeout_ms;
            }
            for info in infos {
                self.update_info(info, false);
            }
        }
        self.deps
            .metrics
            .record_configuration(&self.config, self.target_mode);
    }

    fn handle_pending_retry(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        debug!(count = self.pending.len(), "retrying pending forced disconnects");
        let Some(iface) = self.iface.clone() else {
            return;
        };
        for (client, reason) in self.pending.entries() {
            if self
                .deps
                .driver
                .force_client_disconnect(&iface, &client.mac, reason)
            {
                self.pending.remove(&client);
            }
        }
        if !self.pending.is_empty() {
            self.retry_timer.schedule(
                &self.tx,
                Duration::from_millis(PENDING_DISCONNECT_RETRY_DELAY_MS),
                ApEvent::ForceDisconnectPending,
            );
        }
    }

    // ── Client bookkeeping ───────────────────────────────────────────

    fn handle_client_assoc(&mut self, client: ApClient, connected: bool) {
        if self.pending.remove(&client) {
            debug!(client = %client, "removed client from pending disconnect list");
        }

        self.registry.ensure_instance(&client.instance);
        let present = self.registry.contains(&client);
        if present == connected {
            error!(
                client = %client,
                connected,
                "dropping association event, duplicate or client is blocked"
            );
            return;
        }

        if connected {
            let (admission, cap) = {
                let policy = AdmissionPolicy {
                    config: &self.config,
                    capability: &self.capability,
                    blocked: &self.blocked,
                    allowed: &self.allowed,
                };
                (
                    policy.evaluate(&client, self.registry.total_count()),
                    policy.client_cap(),
                )
            };
            match admission {
                Admission::Accept => self.registry.insert(client),
                Admission::Reject { reason, notify } => {
                    debug!(client = %client, ?reason, "force disconnect for rejected client");
                    if notify {
                        self.deps.status.on_blocked_client_connecting(&client, reason);
                    }
                    if reason == BlockReason::NoMoreStas && !self.reported_capacity_metric {
                        self.deps.metrics.record_client_blocked_at_capacity(cap);
                        self.reported_capacity_metric = true;
                    }
                    self.force_disconnect(client, reason);
                    return;
                }
            }
        } else {
            self.registry.remove(&client);
        }

        self.broadcast_clients_or_info();
        self.deps
            .metrics
            .record_connected_clients(self.registry.total_count(), self.target_mode);
        self.schedule_timeouts();
    }

    /// Force-disconnect stations the updated capability or configuration no
    /// longer allows, oldest first once the disallowed ones are gone.
    fn update_client_connection(&mut self) {
        let plan = {
            let policy = AdmissionPolicy {
                config: &self.config,
                capability: &self.capability,
                blocked: &self.blocked,
                allowed: &self.allowed,
            };
            policy.eviction_plan(&self.registry.list_all())
        };
        for (client, reason) in plan {
            debug!(client = %client, ?reason, "force disconnect to match configuration");
            self.force_disconnect(client, reason);
        }
    }

    fn force_disconnect(&mut self, client: ApClient, reason: BlockReason) {
        let Some(iface) = self.iface.clone() else {
            return;
        };
        if !self
            .deps
            .driver
            .force_client_disconnect(&iface, &client.mac, reason.into())
        {
            self.queue_pending_disconnect(client, reason.into());
        }
    }

    fn queue_pending_disconnect(&mut self, client: ApClient, reason: DisconnectReason) {
        debug!(client = %client, "failed to disconnect client, adding to pending list");
        // A queued station never stays in the registry.
        if self.registry.contains(&client) {
            self.registry.remove(&client);
        }
        self.pending.insert(client, reason);
        self.retry_timer.schedule(
            &self.tx,
            Duration::from_millis(PENDING_DISCONNECT_RETRY_DELAY_MS),
            ApEvent::ForceDisconnectPending,
        );
    }

    // ── Info map ─────────────────────────────────────────────────────

    fn update_info(&mut self, info: RadioInstanceInfo, is_removed: bool) {
        if self.info_map.get(&info.instance) == Some(&info) {
            if is_removed {
                self.info_map.remove(&info.instance);
                self.registry.remove_instance(&info.instance);
                self.broadcast_clients_or_info();
            }
            return;
        }

        // Make sure an empty client list exists once an instance announces.
        self.registry.ensure_instance(&info.instance);
        if self.registry.instance_client_count(&info.instance) != 0 {
            error!(
                instance = %info.instance,
                "info changed while clients connected, it should NOT happen"
            );
        }

        // Hold back the first bridged info: callers read a single-entry map
        // as single-AP operation. Timing workaround, not a contract -- the
        // second instance may legitimately never announce.
        let suppress = self.config.is_bridged() && self.info_map.is_empty();
        self.info_map.insert(info.instance.clone(), info.clone());
        if !suppress {
            self.broadcast_clients_or_info();
        }

        if info.frequency_mhz > 0 && info.bandwidth != ChannelBandwidth::Invalid {
            self.deps
                .metrics
                .record_channel_switched(&info, self.target_mode);
            self.record_band_preference_violation(&info);
        }
    }

    fn clear_info_and_broadcast(&mut self) {
        self.info_map.clear();
        self.registry.clear();
        self.broadcast_clients_or_info();
    }

    fn record_band_preference_violation(&self, info: &RadioInstanceInfo) {
        // Only meaningful in single-AP mode.
        if self.config.is_bridged() {
            return;
        }
        let requested = self.config.band();
        let actual = band_of_frequency(info.frequency_mhz);
        if !actual.is_empty() && !requested.contains(actual) {
            error!(
                frequency_mhz = info.frequency_mhz,
                "channel does not satisfy user band preference"
            );
            self.deps.metrics.record_band_preference_violation();
        }
    }

    // ── Interface status ─────────────────────────────────────────────

    fn on_up_changed(&mut self, up: bool) {
        if up == self.iface_up {
            return;
        }
        self.iface_up = up;
        if up {
            debug!(iface = self.log_iface(), "soft ap is ready for use");
            self.update_ap_state(ApState::Enabled, ApState::Enabling);
            self.deps.mode_observer.on_started(self.id);
            self.deps.metrics.record_start_result(true, None);
            // Fresh view: instance infos and clients re-announce from here.
            self.info_map.clear();
            self.registry.clear();
            self.broadcast_clients_or_info();
        } else {
            // The interface was up but went down; handled as its own event.
            let _ = self.tx.send(ApEvent::IfaceDown);
        }
        self.deps.metrics.record_iface_up_changed(
            up,
            self.target_mode,
            self.deps.defaults.default_shutdown_timeout(),
        );
        if up {
            self.deps
                .metrics
                .record_configuration(&self.config, self.target_mode);
            self.deps
                .metrics
                .record_capability(&self.capability, self.target_mode);
        }
    }

    // ── Driver sequences ─────────────────────────────────────────────

    /// Program the radio and start the AP: BSSID, country code, channel
    /// plan, feature validation, then the driver start itself.
    fn start_soft_ap(&mut self) -> Result<(), StartError> {
        let Some(iface) = self.iface.clone() else {
            return Err(StartError::General);
        };
        debug!(
            iface = %iface,
            band = %self.config.band(),
            country = self.deps.country_code.as_deref().unwrap_or(""),
            "starting soft ap"
        );

        self.set_bssid(&iface)?;
        self.set_country_code(&iface)?;

        let acs_offload = self.capability.supports(ApFeatures::ACS_OFFLOAD);
        let effective = self
            .deps
            .planner
            .update_band_and_channel(
                &self.config,
                self.deps.country_code.as_deref(),
                acs_offload,
            )
            .map_err(|e| {
                error!(error = %e, "failed to update ap band and channel");
                StartError::from(e)
            })?;

        if self.config.hidden {
            debug!("soft ap is a hidden network");
        }

        if !all_features_supported(&self.config, &self.capability) {
            debug!("configuration requests features the capability lacks");
            return Err(StartError::UnsupportedConfiguration);
        }

        let listener: Arc<dyn SoftApEventListener> = Arc::new(ApListenerEvents {
            tx: self.tx.clone(),
            default_instance: iface.clone(),
        });
        if !self.deps.driver.start_soft_ap(
            &iface,
            &effective,
            self.target_mode == TargetMode::Tethered,
            listener,
        ) {
            error!("soft ap start failed");
            return Err(StartError::General);
        }

        self.deps.driver.start_logging(&iface);
        self.start_timestamp =
            Some(Local::now().format("%m-%d %H:%M:%S%.3f").to_string());
        debug!(iface = %iface, "soft ap started");
        Ok(())
    }

    fn set_bssid(&self, iface: &str) -> Result<(), StartError> {
        match &self.config.bssid {
            None => {
                // No explicit BSSID: re-apply the factory address. Some
                // drivers cannot set the MAC at all, so fail soft.
                if !self.deps.driver.reset_factory_mac(iface) {
                    warn!("failed to reset to factory MAC address, continuing with current MAC");
                }
                Ok(())
            }
            Some(mac) => {
                if self.deps.driver.is_set_mac_supported(iface) {
                    if !self.deps.driver.set_mac(iface, mac) {
                        error!("failed to set explicitly requested MAC address");
                        return Err(StartError::General);
                    }
                    Ok(())
                } else if !self.bssid_was_unset {
                    // No setter support is only an error when the user
                    // asked for this exact address.
                    Err(StartError::UnsupportedConfiguration)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn set_country_code(&self, iface: &str) -> Result<(), StartError> {
        let five_ghz_only = self.config.band() == BandSet::BAND_5GHZ;
        let country = self
            .deps
            .country_code
            .as_deref()
            .filter(|cc| !cc.is_empty());
        let Some(country) = country else {
            if five_ghz_only {
                error!("country code required for a 5GHz soft ap");
                return Err(StartError::General);
            }
            return Ok(());
        };
        if !self
            .deps
            .driver
            .set_country_code(iface, &country.to_uppercase())
            && five_ghz_only
        {
            error!("failed to set country code required for a 5GHz soft ap");
            return Err(StartError::General);
        }
        Ok(())
    }

    /// Disconnect every station, stop diagnostics, tear the interface down.
    fn stop_soft_ap(&mut self) {
        let Some(iface) = self.iface.clone() else {
            return;
        };
        for client in self.registry.list_all() {
            self.deps.driver.force_client_disconnect(
                &iface,
                &client.mac,
                DisconnectReason::Unspecified,
            );
        }
        self.deps.driver.stop_logging(&iface);
        self.deps.driver.teardown_interface(&iface);
        debug!(iface = %iface, "soft ap stopped");
    }

    // ── Timers ───────────────────────────────────────────────────────

    fn schedule_timeouts(&mut self) {
        let connected = self.registry.total_count();

        // The bridged idle timer only makes sense while more than one
        // instance is (or may still be) alive: a single-entry info map
        // means the AP already collapsed to one band.
        if self.config.is_bridged() && self.info_map.len() != 1 {
            if self.bridged_idle_enabled
                && (connected == 0 || !self.registry.idle_instances().is_empty())
            {
                let delay = self.deps.defaults.default_bridged_idle_timeout();
                self.timers.schedule_bridged_idle(&self.tx, delay);
            } else {
                self.timers.cancel_bridged_idle();
            }
        }

        if !self.timeout_enabled || connected != 0 {
            self.timers.cancel_shutdown();
            return;
        }
        let delay = shutdown_delay(
            &self.config,
            self.deps.defaults.default_shutdown_timeout(),
        );
        self.timers.schedule_shutdown(&self.tx, delay);
    }

    fn effective_timeout_ms(&self, default: Duration) -> u64 {
        if self.timeout_enabled {
            shutdown_delay(&self.config, default).as_millis() as u64
        } else {
            0
        }
    }

    // ── Shared helpers ───────────────────────────────────────────────

    fn adopt_config(&mut self, config: ApConfiguration) {
        self.blocked = config.blocked_set();
        self.allowed = config.allowed_set();
        self.timeout_enabled = config.auto_shutdown_enabled;
        self.bridged_idle_enabled = config.bridged_opportunistic_shutdown_enabled;
        self.config = config;
    }

    fn update_ap_state(&self, new_state: ApState, previous: ApState) {
        self.deps.status.on_state_changed(new_state, previous);
    }

    fn broadcast_clients_or_info(&self) {
        self.deps.status.on_connected_clients_or_info_changed(
            &self.info_map,
            &self.registry.snapshot(),
            self.config.is_bridged(),
        );
    }

    fn set_iface(&mut self, iface: Option<String>) {
        self.iface = iface.clone();
        let _ = self.iface_tx.send(iface);
    }

    fn log_iface(&self) -> &str {
        self.iface.as_deref().unwrap_or("unknown")
    }

    fn dump_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "softap lifecycle dump id={}", self.id);
        let _ = writeln!(out, "  state: {}", self.state.name());
        let _ = writeln!(out, "  role: {}", self.role);
        let _ = writeln!(out, "  iface: {}", self.log_iface());
        let _ = writeln!(out, "  iface up: {}", self.iface_up);
        let _ = writeln!(
            out,
            "  country: {}",
            self.deps.country_code.as_deref().unwrap_or("")
        );
        let _ = writeln!(out, "  target mode: {:?}", self.target_mode);
        let _ = writeln!(
            out,
            "  ssid: {:?}  band: {}  hidden: {}",
            self.config.ssid,
            self.config.band(),
            self.config.hidden
        );
        let _ = writeln!(out, "  connected clients: {}", self.registry.total_count());
        let _ = writeln!(out, "  auto shutdown enabled: {}", self.timeout_enabled);
        let _ = writeln!(
            out,
            "  bridged idle shutdown enabled: {}",
            self.bridged_idle_enabled
        );
        let _ = writeln!(
            out,
            "  shutdown timer armed: {}",
            self.timers.shutdown_armed()
        );
        let _ = writeln!(
            out,
            "  bridged idle timer armed: {}",
            self.timers.bridged_idle_armed()
        );
        let _ = writeln!(out, "  pending disconnects: {}", self.pending.len());
        let mut instances: Vec<&String> = self.info_map.keys().collect();
        instances.sort();
        for instance in instances {
            if let Some(info) = self.info_map.get(instance) {
                let _ = writeln!(
                    out,
                    "  instance {}: {} MHz, {} clients",
                    instance,
                    info.frequency_mhz,
                    self.registry.instance_client_count(instance)
                );
            }
        }
        let _ = writeln!(
            out,
            "  start timestamp: {}",
            self.start_timestamp.as_deref().unwrap_or("never")
        );
        out
    }
}
