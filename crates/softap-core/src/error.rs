use thiserror::Error;

use softap_hal::ChannelPlanError;

/// Why a soft AP failed to start (or died at runtime).
///
/// Doubles as the reason payload of [`ApState::Failed`](crate::ApState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    /// Missing SSID, interface setup failure, driver start failure, or any
    /// runtime driver fault.
    #[error("general failure")]
    General,
    /// The channel planner found no usable channel.
    #[error("no usable channel")]
    NoChannel,
    /// The configuration requests features the capability lacks.
    #[error("unsupported configuration")]
    UnsupportedConfiguration,
}

impl From<ChannelPlanError> for StartError {
    fn from(e: ChannelPlanError) -> Self {
        match e {
            ChannelPlanError::NoChannel => StartError::NoChannel,
            ChannelPlanError::UnsupportedConfiguration => {
                StartError::UnsupportedConfiguration
            }
            ChannelPlanError::General => StartError::General,
        }
    }
}
