// ── Native driver boundary ──
//
// The only external resource the lifecycle core mutates. Calls are
// synchronous and happen exclusively on the dispatcher; asynchronous
// driver events come back through the callback traits, whose
// implementations marshal them onto the manager's mailbox.

use std::sync::Arc;

use crate::config::ApConfiguration;
use crate::types::{
    BandSet, ChannelBandwidth, DisconnectReason, MacAddress, WifiStandard,
};

/// Link-layer interface lifecycle events.
///
/// Invoked from arbitrary driver threads; implementations must not touch
/// manager state directly.
pub trait InterfaceCallback: Send + Sync {
    fn on_destroyed(&self, iface: &str);
    fn on_up(&self, iface: &str);
    fn on_down(&self, iface: &str);
}

/// Asynchronous soft AP events from the running driver session.
pub trait SoftApEventListener: Send + Sync {
    /// Fatal firmware/hostapd failure; the AP is unusable.
    fn on_failure(&self);

    /// Per-instance radio parameters announced or changed. `instance` is
    /// `None` on drivers that only know the whole interface. A negative
    /// frequency marks the report invalid.
    fn on_info_changed(
        &self,
        instance: Option<&str>,
        frequency_mhz: i32,
        bandwidth: ChannelBandwidth,
        standard: WifiStandard,
        bssid: Option<MacAddress>,
    );

    /// A station associated (`connected = true`) or disassociated.
    fn on_connected_clients_changed(
        &self,
        instance: Option<&str>,
        mac: MacAddress,
        connected: bool,
    );
}

/// Radio driver surface consumed by the lifecycle manager.
pub trait NativeDriver: Send + Sync {
    /// Create an AP-mode interface. Returns its name, or `None` on failure.
    fn setup_interface(
        &self,
        callback: Arc<dyn InterfaceCallback>,
        requestor: &str,
        band: BandSet,
        bridged: bool,
    ) -> Option<String>;

    /// Program and start the AP on `iface` with the effective (channel
    /// planned) configuration.
    fn start_soft_ap(
        &self,
        iface: &str,
        config: &ApConfiguration,
        tethered: bool,
        listener: Arc<dyn SoftApEventListener>,
    ) -> bool;

    fn teardown_interface(&self, iface: &str);

    fn is_interface_up(&self, iface: &str) -> bool;

    /// Forcibly deauthenticate one station. `false` means the driver did
    /// not accept the request (the manager queues a retry).
    fn force_client_disconnect(
        &self,
        iface: &str,
        mac: &MacAddress,
        reason: DisconnectReason,
    ) -> bool;

    fn reset_factory_mac(&self, iface: &str) -> bool;

    fn set_mac(&self, iface: &str, mac: &MacAddress) -> bool;

    fn is_set_mac_supported(&self, iface: &str) -> bool;

    fn set_country_code(&self, iface: &str, country_code: &str) -> bool;

    /// Shut down one radio instance of a bridged interface, leaving the
    /// other instance(s) serving.
    fn remove_instance_from_bridge(&self, iface: &str, instance: &str);

    /// Diagnostics capture, started after a successful AP start and stopped
    /// during teardown.
    fn start_logging(&self, iface: &str);

    fn stop_logging(&self, iface: &str);
}
