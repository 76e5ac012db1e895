// ── Lifecycle facade ──
//
// The public face of one soft AP. Owns the mailbox sender and a pair of
// watch receivers for the accessor surface; everything stateful lives in
// the dispatcher task behind the mailbox. All operations are enqueue-only
// and safe from any thread.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use softap_hal::{
    ApConfiguration, Capability, CapabilityDefaults, ChannelPlanner, CoexAdvisor,
    ConfigStore, NativeDriver,
};

use crate::callbacks::{ModeObserver, ShutdownNotifier, StatusCallback};
use crate::config::ApModeConfig;
use crate::event::ApEvent;
use crate::machine::Machine;
use crate::metrics::MetricsSink;

/// Role this AP serves for the orchestrator. Assigned at construction and
/// immutable for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftApRole {
    Tethered,
    LocalOnly,
}

impl fmt::Display for SoftApRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tethered => write!(f, "tethered"),
            Self::LocalOnly => write!(f, "local-only"),
        }
    }
}

/// Collaborator wiring for one manager instance.
#[derive(Clone)]
pub struct SoftApDeps {
    pub driver: Arc<dyn NativeDriver>,
    pub planner: Arc<dyn ChannelPlanner>,
    pub defaults: Arc<dyn CapabilityDefaults>,
    pub config_store: Arc<dyn ConfigStore>,
    pub coex: Arc<dyn CoexAdvisor>,
    pub mode_observer: Arc<dyn ModeObserver>,
    pub status: Arc<dyn StatusCallback>,
    pub metrics: Arc<dyn MetricsSink>,
    pub notifier: Arc<dyn ShutdownNotifier>,
    /// Regulatory locale; `None` restricts the AP to bands that work
    /// without one.
    pub country_code: Option<String>,
}

/// One soft AP from cold start to terminal quit.
///
/// Construction enqueues the start command; the dispatcher task drives the
/// embedded state machine until a stop, an inactivity expiry, or a driver
/// fault quits it. Must be created inside a tokio runtime.
///
/// The AP is hardware state, not handle state: dropping this handle
/// without calling [`stop`](Self::stop) leaves the AP serving and the
/// dispatcher alive.
pub struct SoftApLifecycle {
    id: u64,
    role: SoftApRole,
    requestor: String,
    tx: mpsc::UnboundedSender<ApEvent>,
    state_rx: watch::Receiver<&'static str>,
    iface_rx: watch::Receiver<Option<String>>,
}

impl SoftApLifecycle {
    /// Create the manager and enqueue `Start` tagged with `requestor`.
    pub fn new(
        deps: SoftApDeps,
        mode_config: ApModeConfig,
        id: u64,
        role: SoftApRole,
        requestor: impl Into<String>,
    ) -> Self {
        let requestor = requestor.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel("idle");
        let (iface_tx, iface_rx) = watch::channel(None);

        let machine =
            Machine::new(deps, mode_config, id, role, tx.clone(), state_tx, iface_tx);

        // Enqueued ahead of the dispatcher so Start is the first event out.
        let _ = tx.send(ApEvent::Start {
            requestor: requestor.clone(),
        });
        tokio::spawn(machine.run(rx));

        Self {
            id,
            role,
            requestor,
            tx,
            state_rx,
            iface_rx,
        }
    }

    /// Ask the AP to tear down. Terminal: the dispatcher quits after the
    /// exit chain runs.
    pub fn stop(&self) {
        debug!(id = self.id, state = self.current_state_name(), "stop requested");
        let _ = self.tx.send(ApEvent::Stop);
    }

    /// Hand in a changed capability (carrier or resource driven).
    pub fn update_capability(&self, capability: Capability) {
        let _ = self.tx.send(ApEvent::UpdateCapability(capability));
    }

    /// Hand in a changed configuration. Updates requiring an AP restart
    /// are ignored while running.
    pub fn update_configuration(&self, config: ApConfiguration) {
        let _ = self.tx.send(ApEvent::UpdateConfig(config));
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> SoftApRole {
        self.role
    }

    pub fn requestor(&self) -> &str {
        &self.requestor
    }

    /// Name of the AP interface, present exactly while the AP is running.
    pub fn interface_name(&self) -> Option<String> {
        self.iface_rx.borrow().clone()
    }

    /// `"idle"`, `"started"`, or `"quit"` once terminal.
    pub fn current_state_name(&self) -> &'static str {
        *self.state_rx.borrow()
    }

    /// Write a debug report. The request round-trips through the mailbox
    /// so the snapshot is taken under dispatcher ownership.
    pub async fn dump(&self, writer: &mut (impl std::io::Write + Send)) -> std::io::Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(ApEvent::Dump(reply_tx)).is_err() {
            return writeln!(writer, "softap lifecycle id={} not active", self.id);
        }
        match reply_rx.await {
            Ok(report) => writer.write_all(report.as_bytes()),
            Err(_) => writeln!(writer, "softap lifecycle id={} not active", self.id),
        }
    }
}

impl fmt::Display for SoftApLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SoftApLifecycle{{id={} iface={} role={}}}",
            self.id,
            self.interface_name().as_deref().unwrap_or("none"),
            self.role
        )
    }
}
