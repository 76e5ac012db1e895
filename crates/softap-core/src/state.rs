// ── Broadcast state vocabulary ──

use std::fmt;

use crate::error::StartError;

/// Externally visible AP state, surfaced through
/// [`StatusCallback::on_state_changed`](crate::StatusCallback::on_state_changed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
    Failed(StartError),
}

impl fmt::Display for ApState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabling => write!(f, "enabling"),
            Self::Enabled => write!(f, "enabled"),
            Self::Disabling => write!(f, "disabling"),
            Self::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

/// Reason surfaced with a client rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The station is on the blocked list or outside the allowed list.
    BlockedByUser,
    /// Admitting the station would exceed the client cap.
    NoMoreStas,
}

impl From<BlockReason> for softap_hal::DisconnectReason {
    fn from(reason: BlockReason) -> Self {
        match reason {
            BlockReason::BlockedByUser => Self::BlockedByUser,
            BlockReason::NoMoreStas => Self::NoMoreStas,
        }
    }
}
