// ── Observer traits ──
//
// Invoked synchronously from the dispatcher; implementations must return
// quickly and must not call back into the lifecycle inline -- re-entry
// happens by posting another command.

use std::collections::HashMap;

use softap_hal::{ApClient, RadioInstanceInfo};

use crate::state::{ApState, BlockReason};

/// Lifecycle notifications for the orchestrator that owns this manager.
pub trait ModeObserver: Send + Sync {
    /// The AP reached a serving state.
    fn on_started(&self, id: u64);
    /// The manager quit cleanly (terminal).
    fn on_stopped(&self, id: u64);
    /// `Start` processing failed; the manager stays down.
    fn on_start_failure(&self, id: u64);
}

/// Status surface mirrored to the user-facing layer.
pub trait StatusCallback: Send + Sync {
    fn on_state_changed(&self, new_state: ApState, previous: ApState);

    /// Combined client/info broadcast. `infos` holding a single entry is
    /// interpreted by callers as single-AP operation.
    fn on_connected_clients_or_info_changed(
        &self,
        infos: &HashMap<String, RadioInstanceInfo>,
        clients: &HashMap<String, Vec<ApClient>>,
        bridged: bool,
    );

    /// A station was turned away.
    fn on_blocked_client_connecting(&self, client: &ApClient, reason: BlockReason);
}

/// End-user notification surface for the inactivity shutdown.
pub trait ShutdownNotifier: Send + Sync {
    fn show_shutdown_timeout_expired(&self);
    fn dismiss_shutdown_timeout_expired(&self);
}
