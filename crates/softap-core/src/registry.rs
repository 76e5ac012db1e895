// ── Connected-client registry ──
//
// Per-radio-instance table of admitted stations. Only ever touched from
// the dispatcher, so storage is plain. Instances and the clients inside
// them keep insertion order, which makes capacity-eviction order
// deterministic.

use std::collections::HashMap;

use tracing::error;

use softap_hal::ApClient;

#[derive(Debug, Default)]
pub(crate) struct ClientRegistry {
    /// Insertion-ordered `(instance, clients)` pairs. The pack of live
    /// instances is tiny (one, or two in bridged mode), so linear lookups
    /// are fine.
    instances: Vec<(String, Vec<ApClient>)>,
}

impl ClientRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make sure `instance` has a (possibly empty) client list.
    pub(crate) fn ensure_instance(&mut self, instance: &str) {
        if !self.instances.iter().any(|(id, _)| id == instance) {
            self.instances.push((instance.to_owned(), Vec::new()));
        }
    }

    pub(crate) fn contains(&self, client: &ApClient) -> bool {
        self.instances
            .iter()
            .any(|(_, clients)| clients.contains(client))
    }

    /// Admit a client under its instance.
    pub(crate) fn insert(&mut self, client: ApClient) {
        self.ensure_instance(&client.instance);
        if let Some((_, clients)) = self
            .instances
            .iter_mut()
            .find(|(id, _)| *id == client.instance)
        {
            clients.push(client);
        }
    }

    /// Remove a client. Returns `false` (and logs) when the entry was not
    /// present -- an internal-invariant violation, never fatal.
    pub(crate) fn remove(&mut self, client: &ApClient) -> bool {
        for (_, clients) in &mut self.instances {
            if let Some(index) = clients.iter().position(|c| c == client) {
                clients.remove(index);
                return true;
            }
        }
        error!(client = %client, "removal of unknown client, it should NOT happen");
        false
    }

    /// Drop one instance and whatever clients it still lists.
    pub(crate) fn remove_instance(&mut self, instance: &str) {
        self.instances.retain(|(id, _)| id != instance);
    }

    pub(crate) fn clear(&mut self) {
        self.instances.clear();
    }

    pub(crate) fn total_count(&self) -> usize {
        self.instances.iter().map(|(_, clients)| clients.len()).sum()
    }

    /// All admitted clients, instance insertion order then client
    /// insertion order. This is the eviction scan order.
    pub(crate) fn list_all(&self) -> Vec<ApClient> {
        self.instances
            .iter()
            .flat_map(|(_, clients)| clients.iter().cloned())
            .collect()
    }

    /// Instances currently serving zero clients.
    pub(crate) fn idle_instances(&self) -> Vec<String> {
        self.instances
            .iter()
            .filter(|(_, clients)| clients.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub(crate) fn instance_client_count(&self, instance: &str) -> usize {
        self.instances
            .iter()
            .find(|(id, _)| id == instance)
            .map_or(0, |(_, clients)| clients.len())
    }

    /// Copy of the table in the shape observers receive.
    pub(crate) fn snapshot(&self) -> HashMap<String, Vec<ApClient>> {
        self.instances.iter().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use softap_hal::MacAddress;

    fn client(mac: &str, instance: &str) -> ApClient {
        ApClient::new(MacAddress::new(mac), instance)
    }

    #[test]
    fn insert_and_count() {
        let mut registry = ClientRegistry::new();
        registry.insert(client("aa:bb:cc:dd:ee:01", "wlan1"));
        registry.insert(client("aa:bb:cc:dd:ee:02", "wlan2"));
        registry.insert(client("aa:bb:cc:dd:ee:03", "wlan1"));
        assert_eq!(registry.total_count(), 3);
        assert_eq!(registry.instance_client_count("wlan1"), 2);
    }

    #[test]
    fn list_all_preserves_insertion_order() {
        let mut registry = ClientRegistry::new();
        registry.insert(client("aa:bb:cc:dd:ee:01", "wlan1"));
        registry.insert(client("aa:bb:cc:dd:ee:02", "wlan2"));
        registry.insert(client("aa:bb:cc:dd:ee:03", "wlan1"));

        let macs: Vec<String> = registry
            .list_all()
            .iter()
            .map(|c| c.mac.to_string())
            .collect();
        // wlan1 was inserted first, so its clients come first.
        assert_eq!(
            macs,
            vec![
                "aa:bb:cc:dd:ee:01".to_owned(),
                "aa:bb:cc:dd:ee:03".to_owned(),
                "aa:bb:cc:dd:ee:02".to_owned(),
            ]
        );
    }

    #[test]
    fn remove_unknown_client_is_soft() {
        let mut registry = ClientRegistry::new();
        assert!(!registry.remove(&client("aa:bb:cc:dd:ee:01", "wlan1")));
    }

    #[test]
    fn idle_instances_reflect_empty_lists() {
        let mut registry = ClientRegistry::new();
        registry.ensure_instance("wlan1");
        registry.ensure_instance("wlan2");
        registry.insert(client("aa:bb:cc:dd:ee:01", "wlan2"));
        assert_eq!(registry.idle_instances(), vec!["wlan1".to_owned()]);

        let removed = registry.remove(&client("aa:bb:cc:dd:ee:01", "wlan2"));
        assert!(removed);
        let mut idle = registry.idle_instances();
        idle.sort();
        assert_eq!(idle, vec!["wlan1".to_owned(), "wlan2".to_owned()]);
    }

    #[test]
    fn remove_instance_drops_clients() {
        let mut registry = ClientRegistry::new();
        registry.insert(client("aa:bb:cc:dd:ee:01", "wlan1"));
        registry.remove_instance("wlan1");
        assert_eq!(registry.total_count(), 0);
        assert!(registry.idle_instances().is_empty());
    }
}
