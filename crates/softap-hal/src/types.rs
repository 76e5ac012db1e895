// ── Wire-level value types ──
//
// Everything in this module crosses the driver boundary verbatim. The
// lifecycle core builds its richer bookkeeping on top of these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── MacAddress ──────────────────────────────────────────────────────

/// Link-layer address, normalized to lowercase colon-separated form
/// (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated, dash-separated, or dot-separated hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .to_lowercase()
            .replace('-', ":")
            .replace('.', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── BandSet ─────────────────────────────────────────────────────────

/// Set of radio bands, encoded as a bitmask.
///
/// A configuration carrying more than one entry in its band list runs in
/// bridged mode; each entry is itself a `BandSet` and may name several
/// acceptable bands for that instance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BandSet(u8);

impl BandSet {
    pub const NONE: BandSet = BandSet(0);
    pub const BAND_2GHZ: BandSet = BandSet(1 << 0);
    pub const BAND_5GHZ: BandSet = BandSet(1 << 1);
    pub const BAND_6GHZ: BandSet = BandSet(1 << 2);

    pub fn union(self, other: BandSet) -> BandSet {
        BandSet(self.0 | other.0)
    }

    pub fn intersection(self, other: BandSet) -> BandSet {
        BandSet(self.0 & other.0)
    }

    pub fn contains(self, band: BandSet) -> bool {
        self.0 & band.0 == band.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (Self::BAND_2GHZ, "2.4GHz"),
            (Self::BAND_5GHZ, "5GHz"),
            (Self::BAND_6GHZ, "6GHz"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

// ── Frequency helpers ───────────────────────────────────────────────

/// Band a channel center frequency (MHz) belongs to, or `NONE`.
pub fn band_of_frequency(frequency_mhz: u32) -> BandSet {
    match frequency_mhz {
        2401..=2495 => BandSet::BAND_2GHZ,
        5160..=5885 => BandSet::BAND_5GHZ,
        5925..=7125 => BandSet::BAND_6GHZ,
        _ => BandSet::NONE,
    }
}

// ── Radio codes ─────────────────────────────────────────────────────

/// Channel bandwidth as announced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChannelBandwidth {
    Invalid,
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz160,
}

/// Wifi generation in use on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum WifiStandard {
    Unknown,
    Legacy,
    N,
    Ac,
    Ax,
}

// ── Client & instance values ────────────────────────────────────────

/// A station as the driver reports it: its MAC plus the radio instance it
/// associated to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApClient {
    pub mac: MacAddress,
    pub instance: String,
}

impl ApClient {
    pub fn new(mac: MacAddress, instance: impl Into<String>) -> Self {
        Self {
            mac,
            instance: instance.into(),
        }
    }
}

impl fmt::Display for ApClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.mac, self.instance)
    }
}

/// Per-instance radio parameters, announced by the driver and annotated by
/// the manager with the effective auto-shutdown timeout before broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioInstanceInfo {
    pub instance: String,
    pub frequency_mhz: u32,
    pub bandwidth: ChannelBandwidth,
    pub standard: WifiStandard,
    pub bssid: Option<MacAddress>,
    /// Effective whole-AP shutdown timeout echoed to observers; 0 when
    /// auto-shutdown is disabled.
    pub shutdown_timeout_ms: u64,
}

// ── Disconnect reasons ──────────────────────────────────────────────

/// Reason attached to a driver-level forced disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Teardown or unclassified.
    Unspecified,
    /// The station is on the blocked list or outside the allowed list.
    BlockedByUser,
    /// Admitting the station would exceed the client cap.
    NoMoreStas,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_normalizes_dashes_and_case() {
        let mac = MacAddress::new("AA-BB-CC-DD-EE-FF");
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_address_from_str() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:01".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:01");
    }

    #[test]
    fn band_set_union_and_contains() {
        let both = BandSet::BAND_2GHZ.union(BandSet::BAND_5GHZ);
        assert!(both.contains(BandSet::BAND_2GHZ));
        assert!(both.contains(BandSet::BAND_5GHZ));
        assert!(!both.contains(BandSet::BAND_6GHZ));
    }

    #[test]
    fn band_set_display() {
        let both = BandSet::BAND_2GHZ.union(BandSet::BAND_5GHZ);
        assert_eq!(both.to_string(), "2.4GHz|5GHz");
        assert_eq!(BandSet::NONE.to_string(), "none");
    }

    #[test]
    fn frequency_classification() {
        assert_eq!(band_of_frequency(2412), BandSet::BAND_2GHZ);
        assert_eq!(band_of_frequency(5180), BandSet::BAND_5GHZ);
        assert_eq!(band_of_frequency(5955), BandSet::BAND_6GHZ);
        assert_eq!(band_of_frequency(900), BandSet::NONE);
    }
}
