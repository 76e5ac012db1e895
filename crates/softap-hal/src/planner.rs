// ── Channel planning ──

use thiserror::Error;

use crate::config::ApConfiguration;

/// Why the planner could not produce a usable band/channel assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelPlanError {
    /// No regulatory-legal channel exists for the requested bands.
    #[error("no usable channel for the requested band")]
    NoChannel,
    /// The configuration asks for something the hardware cannot do.
    #[error("configuration not supported by the hardware")]
    UnsupportedConfiguration,
    /// Any other planning failure.
    #[error("channel planning failed")]
    General,
}

/// Band/channel selection heuristic.
///
/// Produces the *effective* configuration handed to the driver; the
/// manager keeps its stored configuration untouched.
pub trait ChannelPlanner: Send + Sync {
    fn update_band_and_channel(
        &self,
        config: &ApConfiguration,
        country_code: Option<&str>,
        acs_offload: bool,
    ) -> Result<ApConfiguration, ChannelPlanError>;
}
