//! Mailbox event alphabet.
//!
//! Every stimulus -- orchestrator command, driver callback, timer expiry,
//! self-scheduled retry -- becomes one of these and is delivered to the
//! state machine in FIFO order over an unbounded `tokio::sync::mpsc`.

use tokio::sync::oneshot;

use softap_hal::{ApClient, ApConfiguration, Capability, RadioInstanceInfo};

#[derive(Debug)]
pub(crate) enum ApEvent {
    /// Orchestrator asks to bring the AP up, tagged with the requestor.
    Start { requestor: String },
    /// Orchestrator asks to tear the AP down.
    Stop,
    /// Driver reports a fatal firmware failure.
    Failure,
    /// Link-layer interface went up or down.
    IfaceStatusChanged { iface: String, up: bool },
    /// Driver finished cleaning up the interface.
    IfaceDestroyed { iface: String },
    /// Interface transitioned down unexpectedly (self-enqueued).
    IfaceDown,
    /// Driver association notice.
    ClientAssocChanged { client: ApClient, connected: bool },
    /// Per-instance radio parameters announced or changed.
    ApInfoChanged { info: RadioInstanceInfo },
    /// Whole-AP inactivity timer fired.
    NoClientsTimeout,
    /// Bridged-mode idle-instance timer fired.
    NoClientsTimeoutOneInstance,
    /// External capability change.
    UpdateCapability(Capability),
    /// External configuration change.
    UpdateConfig(ApConfiguration),
    /// Self-scheduled forced-disconnect retry.
    ForceDisconnectPending,
    /// Debug report request from the facade.
    Dump(oneshot::Sender<String>),
}
