// ── Client admission policy ──
//
// Pure decisions only: the state machine owns the driver calls, observer
// notifications, and pending-queue bookkeeping that a rejection triggers.

use std::collections::HashSet;

use softap_hal::{ApClient, ApConfiguration, ApFeatures, Capability, MacAddress};

use crate::state::BlockReason;

/// Outcome of evaluating one incoming association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Accept,
    Reject {
        reason: BlockReason,
        /// Whether observers get an `on_blocked_client_connecting` notice.
        /// Stations on the explicit blocked list are dropped silently.
        notify: bool,
    },
}

pub(crate) struct AdmissionPolicy<'a> {
    pub config: &'a ApConfiguration,
    pub capability: &'a Capability,
    pub blocked: &'a HashSet<MacAddress>,
    pub allowed: &'a HashSet<MacAddress>,
}

impl AdmissionPolicy<'_> {
    /// Effective cap: the hardware/carrier limit, tightened by the user
    /// limit when one is set.
    pub(crate) fn client_cap(&self) -> usize {
        let hw = self.capability.max_supported_clients;
        if self.config.max_clients > 0 {
            hw.min(self.config.max_clients)
        } else {
            hw
        }
    }

    /// Evaluate one incoming client against the rules, first match wins.
    pub(crate) fn evaluate(
        &self,
        client: &ApClient,
        connected_count: usize,
    ) -> Admission {
        // Without force-disconnect support nothing can be enforced.
        if !self
            .capability
            .supports(ApFeatures::CLIENT_FORCE_DISCONNECT)
        {
            return Admission::Accept;
        }

        if self.blocked.contains(&client.mac) {
            return Admission::Reject {
                reason: BlockReason::BlockedByUser,
                notify: false,
            };
        }

        if self.config.client_control_enabled && !self.allowed.contains(&client.mac) {
            return Admission::Reject {
                reason: BlockReason::BlockedByUser,
                notify: true,
            };
        }

        if connected_count >= self.client_cap() {
            return Admission::Reject {
                reason: BlockReason::NoMoreStas,
                notify: true,
            };
        }

        Admission::Accept
    }

    /// Plan the forced disconnects a capability/config change requires.
    ///
    /// Blocked and disallowed stations go first; if the survivor count
    /// still exceeds the cap, additional stations are chosen in insertion
    /// order until the count fits. Returns `(client, reason)` pairs in the
    /// order the disconnects should be issued.
    pub(crate) fn eviction_plan(
        &self,
        connected: &[ApClient],
    ) -> Vec<(ApClient, BlockReason)> {
        if !self
            .capability
            .supports(ApFeatures::CLIENT_FORCE_DISCONNECT)
        {
            return Vec::new();
        }

        let cap = self.client_cap();
        let mut over_cap = connected.len() as isize - cap as isize;
        let mut plan = Vec::new();
        let mut survivors = Vec::new();

        for client in connected {
            let disallowed = self.blocked.contains(&client.mac)
                || (self.config.client_control_enabled
                    && !self.allowed.contains(&client.mac));
            if disallowed {
                plan.push((client.clone(), BlockReason::BlockedByUser));
                over_cap -= 1;
            } else {
                survivors.push(client.clone());
            }
        }

        for client in survivors {
            if over_cap <= 0 {
                break;
            }
            plan.push((client, BlockReason::NoMoreStas));
            over_cap -= 1;
        }

        plan
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(mac: &str) -> ApClient {
        ApClient::new(MacAddress::new(mac), "wlan1")
    }

    fn capability() -> Capability {
        Capability {
            max_supported_clients: 8,
            features: ApFeatures::CLIENT_FORCE_DISCONNECT,
            ..Capability::default()
        }
    }

    struct Fixture {
        config: ApConfiguration,
        capability: Capability,
        blocked: HashSet<MacAddress>,
        allowed: HashSet<MacAddress>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: ApConfiguration {
                    ssid: "net".into(),
                    ..ApConfiguration::default()
                },
                capability: capability(),
                blocked: HashSet::new(),
                allowed: HashSet::new(),
            }
        }

        fn policy(&self) -> AdmissionPolicy<'_> {
            AdmissionPolicy {
                config: &self.config,
                capability: &self.capability,
                blocked: &self.blocked,
                allowed: &self.allowed,
            }
        }
    }

    #[test]
    fn accepts_everything_without_force_disconnect() {
        let mut fixture = Fixture::new();
        fixture.capability.features = ApFeatures::NONE;
        fixture.blocked.insert(MacAddress::new("aa:bb:cc:dd:ee:01"));

        let admission = fixture.policy().evaluate(&client("aa:bb:cc:dd:ee:01"), 100);
        assert_eq!(admission, Admission::Accept);
    }

    #[test]
    fn blocked_client_rejected_without_notification() {
        let mut fixture = Fixture::new();
        fixture.blocked.insert(MacAddress::new("aa:bb:cc:dd:ee:01"));

        let admission = fixture.policy().evaluate(&client("aa:bb:cc:dd:ee:01"), 0);
        assert_eq!(
            admission,
            Admission::Reject {
                reason: BlockReason::BlockedByUser,
                notify: false,
            }
        );
    }

    #[test]
    fn client_control_rejects_off_list_with_notification() {
        let mut fixture = Fixture::new();
        fixture.config.client_control_enabled = true;
        fixture.allowed.insert(MacAddress::new("aa:bb:cc:dd:ee:02"));

        let admission = fixture.policy().evaluate(&client("aa:bb:cc:dd:ee:01"), 0);
        assert_eq!(
            admission,
            Admission::Reject {
                reason: BlockReason::BlockedByUser,
                notify: true,
            }
        );
        let allowed = fixture.policy().evaluate(&client("aa:bb:cc:dd:ee:02"), 0);
        assert_eq!(allowed, Admission::Accept);
    }

    #[test]
    fn cap_is_min_of_user_and_hardware() {
        let mut fixture = Fixture::new();
        fixture.config.max_clients = 3;
        assert_eq!(fixture.policy().client_cap(), 3);

        fixture.config.max_clients = 100;
        assert_eq!(fixture.policy().client_cap(), 8);

        fixture.config.max_clients = 0;
        assert_eq!(fixture.policy().client_cap(), 8);
    }

    #[test]
    fn capacity_rejection_at_cap() {
        let mut fixture = Fixture::new();
        fixture.config.max_clients = 2;

        let admission = fixture.policy().evaluate(&client("aa:bb:cc:dd:ee:03"), 2);
        assert_eq!(
            admission,
            Admission::Reject {
                reason: BlockReason::NoMoreStas,
                notify: true,
            }
        );
    }

    #[test]
    fn eviction_prefers_disallowed_then_oldest() {
        let mut fixture = Fixture::new();
        fixture.config.max_clients = 1;
        fixture.blocked.insert(MacAddress::new("aa:bb:cc:dd:ee:02"));

        let connected = vec![
            client("aa:bb:cc:dd:ee:01"),
            client("aa:bb:cc:dd:ee:02"),
            client("aa:bb:cc:dd:ee:03"),
        ];
        let plan = fixture.policy().eviction_plan(&connected);
        assert_eq!(
            plan,
            vec![
                (client("aa:bb:cc:dd:ee:02"), BlockReason::BlockedByUser),
                (client("aa:bb:cc:dd:ee:01"), BlockReason::NoMoreStas),
            ]
        );
    }

    #[test]
    fn eviction_plan_empty_when_within_cap() {
        let mut fixture = Fixture::new();
        fixture.config.max_clients = 4;
        let connected = vec![client("aa:bb:cc:dd:ee:01"), client("aa:bb:cc:dd:ee:02")];
        assert!(fixture.policy().eviction_plan(&connected).is_empty());
    }
}
