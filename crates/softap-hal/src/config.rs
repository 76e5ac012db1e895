// ── AP configuration ──
//
// The immutable value object describing one soft AP. Built by the
// orchestrator (or loaded from the ConfigStore), replaced atomically on
// config updates -- the manager never mutates one in place.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::{BandSet, MacAddress};

/// Link-layer security for the AP.
///
/// Carried to the driver as-is; the manager performs no authentication
/// logic, but a security change is a restart-requiring config change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SecurityMode {
    Open,
    #[default]
    Wpa2,
    Wpa3,
    Wpa2Wpa3,
}

/// Configuration for a single soft AP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApConfiguration {
    /// Network name. Empty means the configuration is unusable and `Start`
    /// will be rejected.
    pub ssid: String,
    /// Requested BSSID. `None` means "randomize if supported".
    pub bssid: Option<MacAddress>,
    pub security: SecurityMode,
    pub passphrase: Option<String>,
    /// One band set per radio instance. More than one entry means bridged
    /// mode (one logical AP backed by concurrent per-band instances).
    pub bands: Vec<BandSet>,
    pub hidden: bool,
    pub blocked_client_list: Vec<MacAddress>,
    pub allowed_client_list: Vec<MacAddress>,
    /// When set, only stations on the allowed list are admitted.
    pub client_control_enabled: bool,
    /// 0 = no user-imposed limit (the capability cap still applies).
    pub max_clients: usize,
    /// 0 = use the platform default.
    pub shutdown_timeout_ms: u64,
    pub auto_shutdown_enabled: bool,
    pub bridged_opportunistic_shutdown_enabled: bool,
}

impl Default for ApConfiguration {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            bssid: None,
            security: SecurityMode::default(),
            passphrase: None,
            bands: vec![BandSet::BAND_2GHZ],
            hidden: false,
            blocked_client_list: Vec::new(),
            allowed_client_list: Vec::new(),
            client_control_enabled: false,
            max_clients: 0,
            shutdown_timeout_ms: 0,
            auto_shutdown_enabled: true,
            bridged_opportunistic_shutdown_enabled: true,
        }
    }
}

impl ApConfiguration {
    /// Union of every configured band entry.
    pub fn band(&self) -> BandSet {
        self.bands
            .iter()
            .fold(BandSet::NONE, |acc, b| acc.union(*b))
    }

    /// Bridged mode: one logical AP over more than one radio instance.
    pub fn is_bridged(&self) -> bool {
        self.bands.len() > 1
    }

    /// Copy of this configuration collapsed to a single band entry.
    pub fn with_single_band(&self, band: BandSet) -> Self {
        let mut config = self.clone();
        config.bands = vec![band];
        config
    }

    /// Copy of this configuration with the BSSID cleared.
    pub fn with_unset_bssid(&self) -> Self {
        let mut config = self.clone();
        config.bssid = None;
        config
    }

    pub fn blocked_set(&self) -> HashSet<MacAddress> {
        self.blocked_client_list.iter().cloned().collect()
    }

    pub fn allowed_set(&self) -> HashSet<MacAddress> {
        self.allowed_client_list.iter().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_band_is_not_bridged() {
        let config = ApConfiguration::default();
        assert!(!config.is_bridged());
        assert_eq!(config.band(), BandSet::BAND_2GHZ);
    }

    #[test]
    fn two_band_entries_mean_bridged() {
        let config = ApConfiguration {
            bands: vec![BandSet::BAND_2GHZ, BandSet::BAND_5GHZ],
            ..ApConfiguration::default()
        };
        assert!(config.is_bridged());
        assert_eq!(
            config.band(),
            BandSet::BAND_2GHZ.union(BandSet::BAND_5GHZ)
        );
    }

    #[test]
    fn with_single_band_collapses_entries() {
        let config = ApConfiguration {
            bands: vec![BandSet::BAND_2GHZ, BandSet::BAND_5GHZ],
            ..ApConfiguration::default()
        };
        let single = config.with_single_band(BandSet::BAND_2GHZ);
        assert!(!single.is_bridged());
        assert_eq!(single.ssid, config.ssid);
    }
}
