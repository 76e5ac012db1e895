// ── Wake timers ──
//
// Cancellable one-shot timers that post an event onto the mailbox when
// they expire: a spawned sleep racing a `CancellationToken`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::ApEvent;

pub(crate) struct WakeTimer {
    name: &'static str,
    cancel: Option<CancellationToken>,
    armed: Arc<AtomicBool>,
}

impl WakeTimer {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            cancel: None,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arm the timer, replacing any pending expiry. The event is posted no
    /// earlier than after the scheduling handler returns.
    pub(crate) fn schedule(
        &mut self,
        tx: &mpsc::UnboundedSender<ApEvent>,
        delay: Duration,
        event: ApEvent,
    ) {
        self.cancel();
        let token = CancellationToken::new();
        let guard = token.clone();
        let armed = Arc::clone(&self.armed);
        let tx = tx.clone();
        let name = self.name;
        armed.store(true, Ordering::Release);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    armed.store(false, Ordering::Release);
                    let _ = tx.send(event);
                }
            }
        });
        self.cancel = Some(token);
        debug!(timer = name, delay_ms = delay.as_millis() as u64, "timer scheduled");
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
            self.armed.store(false, Ordering::Release);
            debug!(timer = self.name, "timer canceled");
        }
    }

    /// Whether an expiry is still pending (false once fired or canceled).
    pub(crate) fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Drop for WakeTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The two inactivity timers of one AP.
pub(crate) struct TimerSet {
    shutdown: WakeTimer,
    bridged_idle: WakeTimer,
    /// Guard against re-arming the bridged idle timer while one expiry is
    /// outstanding; scheduling is idempotent under this flag.
    bridged_idle_active: bool,
}

impl TimerSet {
    pub(crate) fn new() -> Self {
        Self {
            shutdown: WakeTimer::new("no-clients-shutdown"),
            bridged_idle: WakeTimer::new("bridged-idle-instance"),
            bridged_idle_active: false,
        }
    }

    /// (Re-)arm the whole-AP shutdown timer; a fresh delay each time.
    pub(crate) fn schedule_shutdown(
        &mut self,
        tx: &mpsc::UnboundedSender<ApEvent>,
        delay: Duration,
    ) {
        self.shutdown.schedule(tx, delay, ApEvent::NoClientsTimeout);
    }

    pub(crate) fn cancel_shutdown(&mut self) {
        self.shutdown.cancel();
    }

    /// Arm the bridged idle timer unless one expiry is already pending.
    pub(crate) fn schedule_bridged_idle(
        &mut self,
        tx: &mpsc::UnboundedSender<ApEvent>,
        delay: Duration,
    ) {
        if self.bridged_idle_active {
            return;
        }
        self.bridged_idle
            .schedule(tx, delay, ApEvent::NoClientsTimeoutOneInstance);
        self.bridged_idle_active = true;
    }

    pub(crate) fn cancel_bridged_idle(&mut self) {
        self.bridged_idle.cancel();
        self.bridged_idle_active = false;
    }

    /// The pending expiry was consumed; allow re-arming.
    pub(crate) fn bridged_idle_fired(&mut self) {
        self.bridged_idle_active = false;
    }

    pub(crate) fn shutdown_armed(&self) -> bool {
        self.shutdown.is_armed()
    }

    pub(crate) fn bridged_idle_armed(&self) -> bool {
        self.bridged_idle.is_armed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = WakeTimer::new("test");
        timer.schedule(&tx, Duration::from_secs(5), ApEvent::NoClientsTimeout);
        assert!(timer.is_armed());

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ApEvent::NoClientsTimeout));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = WakeTimer::new("test");
        timer.schedule(&tx, Duration::from_secs(5), ApEvent::NoClientsTimeout);
        timer.cancel();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_resets_the_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = WakeTimer::new("test");
        timer.schedule(&tx, Duration::from_secs(5), ApEvent::NoClientsTimeout);

        tokio::time::advance(Duration::from_secs(4)).await;
        timer.schedule(&tx, Duration::from_secs(5), ApEvent::NoClientsTimeout);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn bridged_idle_scheduling_is_idempotent_while_armed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::new();
        timers.schedule_bridged_idle(&tx, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(8)).await;
        // A second schedule while armed must not reset the delay.
        timers.schedule_bridged_idle(&tx, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(rx.recv().await.is_some());
    }
}
