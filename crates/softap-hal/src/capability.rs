// ── AP capability ──
//
// What the hardware + carrier combination currently permits. Replaced
// atomically on capability updates; the manager never edits one field.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::BandSet;

/// Optional driver features, encoded as a bitmask.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ApFeatures(u32);

impl ApFeatures {
    pub const NONE: ApFeatures = ApFeatures(0);
    /// The driver can program an explicit or randomized BSSID.
    pub const MAC_ADDRESS_CUSTOMIZATION: ApFeatures = ApFeatures(1 << 0);
    /// The driver can forcibly deauthenticate a station.
    pub const CLIENT_FORCE_DISCONNECT: ApFeatures = ApFeatures(1 << 1);
    /// Automatic channel selection runs in firmware.
    pub const ACS_OFFLOAD: ApFeatures = ApFeatures(1 << 2);

    pub fn union(self, other: ApFeatures) -> ApFeatures {
        ApFeatures(self.0 | other.0)
    }

    pub fn contains(self, feature: ApFeatures) -> bool {
        self.0 & feature.0 == feature.0
    }
}

impl fmt::Display for ApFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Hardware + carrier envelope for one soft AP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Hard cap on admitted stations, regardless of user configuration.
    pub max_supported_clients: usize,
    pub features: ApFeatures,
    /// Bands currently usable for an AP instance.
    pub available_bands: BandSet,
}

impl Capability {
    pub fn supports(&self, feature: ApFeatures) -> bool {
        self.features.contains(feature)
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self {
            max_supported_clients: 16,
            features: ApFeatures::NONE,
            available_bands: BandSet::BAND_2GHZ,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn feature_union_and_contains() {
        let features =
            ApFeatures::MAC_ADDRESS_CUSTOMIZATION.union(ApFeatures::ACS_OFFLOAD);
        assert!(features.contains(ApFeatures::ACS_OFFLOAD));
        assert!(!features.contains(ApFeatures::CLIENT_FORCE_DISCONNECT));
    }

    #[test]
    fn capability_supports_delegates_to_features() {
        let capability = Capability {
            features: ApFeatures::CLIENT_FORCE_DISCONNECT,
            ..Capability::default()
        };
        assert!(capability.supports(ApFeatures::CLIENT_FORCE_DISCONNECT));
        assert!(!capability.supports(ApFeatures::ACS_OFFLOAD));
    }
}
