// ── Pending forced-disconnect queue ──
//
// Stations the driver refused to disconnect, kept with the reason so the
// retry loop can re-issue the exact call. A station is never in here and
// in the client registry at the same time.

use softap_hal::{ApClient, DisconnectReason};

#[derive(Debug, Default)]
pub(crate) struct PendingDisconnectQueue {
    entries: Vec<(ApClient, DisconnectReason)>,
}

impl PendingDisconnectQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue (or re-queue with an updated reason) a failed disconnect.
    pub(crate) fn insert(&mut self, client: ApClient, reason: DisconnectReason) {
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| *c == client) {
            entry.1 = reason;
        } else {
            self.entries.push((client, reason));
        }
    }

    /// Drop a station, typically because it re-associated.
    pub(crate) fn remove(&mut self, client: &ApClient) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(c, _)| c != client);
        before != self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot for the retry loop (which mutates the queue as it goes).
    pub(crate) fn entries(&self) -> Vec<(ApClient, DisconnectReason)> {
        self.entries.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use softap_hal::MacAddress;

    fn client(mac: &str) -> ApClient {
        ApClient::new(MacAddress::new(mac), "wlan1")
    }

    #[test]
    fn insert_deduplicates_and_updates_reason() {
        let mut queue = PendingDisconnectQueue::new();
        queue.insert(client("aa:bb:cc:dd:ee:01"), DisconnectReason::BlockedByUser);
        queue.insert(client("aa:bb:cc:dd:ee:01"), DisconnectReason::NoMoreStas);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries()[0].1, DisconnectReason::NoMoreStas);
    }

    #[test]
    fn remove_on_reassociation() {
        let mut queue = PendingDisconnectQueue::new();
        queue.insert(client("aa:bb:cc:dd:ee:01"), DisconnectReason::BlockedByUser);
        assert!(queue.remove(&client("aa:bb:cc:dd:ee:01")));
        assert!(!queue.remove(&client("aa:bb:cc:dd:ee:01")));
        assert!(queue.is_empty());
    }
}
