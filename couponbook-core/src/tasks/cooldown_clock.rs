// couponbook-core/src/tasks/cooldown_clock.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use couponbook_common::models::{CouponId, Ledger};
use crate::catalog::CouponCatalog;
use crate::eligibility::remaining_cooldowns;
use crate::eventbus::{CouponEvent, EventBus};
use crate::utils::time::TimeSource;

/// Remaining cooldown (ms) per coupon that defines a cooldown. 0 = ready.
pub type CooldownMap = BTreeMap<CouponId, u64>;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that keeps remaining-cooldown values fresh for display.
///
/// It only reads: each tick evaluates the latest ledger it has seen against
/// the current time and publishes the resulting map. A new ledger (after a
/// redemption) triggers an immediate recompute and restarts the period.
///
/// Call `stop` when the consuming view goes away. Dropping the clock without
/// stopping it aborts the task.
pub struct CooldownClock {
    shutdown_tx: watch::Sender<bool>,
    cooldowns_rx: watch::Receiver<CooldownMap>,
    handle: Option<JoinHandle<()>>,
}

impl CooldownClock {
    /// Spawns the clock. The first tick fires immediately.
    pub fn start(
        catalog: Arc<CouponCatalog>,
        ledger_rx: watch::Receiver<Ledger>,
        time: Arc<dyn TimeSource>,
        period: Duration,
        event_bus: Option<EventBus>,
    ) -> Self {
        let initial = remaining_cooldowns(catalog.with_cooldown(), &ledger_rx.borrow(), time.now_millis());
        let (cooldowns_tx, cooldowns_rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_clock(
            catalog,
            ledger_rx,
            time,
            period,
            event_bus,
            cooldowns_tx,
            shutdown_rx,
        ));

        Self { shutdown_tx, cooldowns_rx, handle: Some(handle) }
    }

    pub fn subscribe(&self) -> watch::Receiver<CooldownMap> {
        self.cooldowns_rx.clone()
    }

    /// Most recently published map.
    pub fn current(&self) -> CooldownMap {
        self.cooldowns_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the task to exit and waits for it.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for CooldownClock {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_clock(
    catalog: Arc<CouponCatalog>,
    mut ledger_rx: watch::Receiver<Ledger>,
    time: Arc<dyn TimeSource>,
    period: Duration,
    event_bus: Option<EventBus>,
    cooldowns_tx: watch::Sender<CooldownMap>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ledger_open = true;

    info!("Cooldown clock started with period={:?}", period);

    loop {
        tokio::select! {
            biased;
            res = shutdown_rx.changed() => {
                if res.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            res = ledger_rx.changed(), if ledger_open => {
                if res.is_err() {
                    // Engine is gone; keep counting down on the last ledger.
                    debug!("Ledger channel closed; cooldown clock continues on last snapshot.");
                    ledger_open = false;
                    continue;
                }
                interval.reset();
            }
            _ = interval.tick() => {}
        }

        let map = {
            let ledger = ledger_rx.borrow_and_update();
            remaining_cooldowns(catalog.with_cooldown(), &ledger, time.now_millis())
        };
        cooldowns_tx.send_replace(map.clone());

        if let Some(bus) = &event_bus {
            bus.try_publish(CouponEvent::CooldownTick(map)).await;
        }
    }

    info!("Cooldown clock stopped.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use couponbook_common::models::CouponDefinition;
    use crate::utils::time::ManualTimeSource;

    fn catalog() -> Arc<CouponCatalog> {
        let defs = vec![
            CouponDefinition {
                id: 1,
                title: "Coffee".into(),
                description: "One coffee".into(),
                category: "Food".into(),
                unlimited: true,
                max_uses: None,
                cooldown_ms: Some(5000),
            },
            CouponDefinition {
                id: 2,
                title: "Hug".into(),
                description: "Any time".into(),
                category: "Love".into(),
                unlimited: true,
                max_uses: None,
                cooldown_ms: None,
            },
        ];
        Arc::new(CouponCatalog::new(defs).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_count_down() {
        let time = Arc::new(ManualTimeSource::new(1000));
        let (_ledger_tx, ledger_rx) = watch::channel(Ledger::new().record_use(1, 1000));

        let clock = CooldownClock::start(catalog(), ledger_rx, time.clone(), Duration::from_secs(1), None);
        let mut rx = clock.subscribe();
        assert_eq!(clock.current().get(&1), Some(&5000));
        assert!(clock.current().get(&2).is_none());

        // First tick fires immediately.
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&5000));

        time.advance(1000);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&4000));

        time.advance(10_000);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&0));

        clock.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_change_is_seen_immediately() {
        let time = Arc::new(ManualTimeSource::new(50_000));
        let (ledger_tx, ledger_rx) = watch::channel(Ledger::new());

        let clock = CooldownClock::start(catalog(), ledger_rx, time.clone(), Duration::from_secs(60), None);
        let mut rx = clock.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&0));

        ledger_tx.send_replace(Ledger::new().record_use(1, 50_000));
        let before = tokio::time::Instant::now();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&5000));
        // No waiting for the 60s period.
        assert!(before.elapsed() < Duration::from_secs(1));

        clock.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_task() {
        let time = Arc::new(ManualTimeSource::new(0));
        let (_ledger_tx, ledger_rx) = watch::channel(Ledger::new().record_use(1, 0));
        let clock = CooldownClock::start(catalog(), ledger_rx, time.clone(), Duration::from_secs(1), None);
        let mut rx = clock.subscribe();
        rx.changed().await.unwrap();
        assert!(clock.is_running());

        clock.stop().await;
        rx.borrow_and_update();

        // The publisher went away with the task, so no tick can follow.
        time.advance(3000);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.changed().await.is_err());
        assert_eq!(rx.borrow().get(&1), Some(&5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let time = Arc::new(ManualTimeSource::new(0));
        let (_ledger_tx, ledger_rx) = watch::channel(Ledger::new().record_use(1, 0));
        let clock = CooldownClock::start(catalog(), ledger_rx, time.clone(), Duration::from_secs(1), None);
        let mut rx = clock.subscribe();
        rx.changed().await.unwrap();
        rx.borrow_and_update();

        drop(clock);
        time.advance(3000);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_ticks_on_event_bus() {
        let bus = EventBus::new();
        let mut events = bus.subscribe(Some(8)).await;
        let time = Arc::new(ManualTimeSource::new(2000));
        let (_ledger_tx, ledger_rx) = watch::channel(Ledger::new().record_use(1, 1000));

        let clock = CooldownClock::start(catalog(), ledger_rx, time, Duration::from_secs(1), Some(bus));
        match events.recv().await {
            Some(CouponEvent::CooldownTick(map)) => assert_eq!(map.get(&1), Some(&4000)),
            other => panic!("unexpected event: {:?}", other),
        }
        clock.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_survives_closed_ledger_channel() {
        let time = Arc::new(ManualTimeSource::new(1000));
        let (ledger_tx, ledger_rx) = watch::channel(Ledger::new().record_use(1, 1000));
        let clock = CooldownClock::start(catalog(), ledger_rx, time.clone(), Duration::from_secs(1), None);
        let mut rx = clock.subscribe();
        rx.changed().await.unwrap();
        rx.borrow_and_update();

        drop(ledger_tx);
        time.advance(3000);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get(&1), Some(&2000));
        assert!(clock.is_running());
        clock.stop().await;
    }
}
