//! src/eventbus/mod.rs
//!
//! In-process event bus. Each subscriber owns a bounded MPSC queue; the
//! redemption engine and the cooldown clock publish onto it and the
//! presentation layer listens.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use couponbook_common::models::{CouponId, EligibilitySnapshot};
use crate::tasks::cooldown_clock::CooldownMap;

#[derive(Debug, Clone, PartialEq)]
pub enum CouponEvent {
    /// A redemption went through and was persisted. This is the cue for the
    /// celebratory effect; nothing is expected back.
    Redeemed {
        coupon_id: CouponId,
        snapshot: EligibilitySnapshot,
        at_ms: u64,
    },

    /// A redemption was refused. `reason` is the user-facing message.
    RedemptionRejected {
        coupon_id: CouponId,
        reason: String,
    },

    /// Fresh remaining-cooldown values from the cooldown clock.
    CooldownTick(CooldownMap),
}

impl CouponEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CouponEvent::Redeemed { .. } => "coupon.redeemed",
            CouponEvent::RedemptionRejected { .. } => "coupon.rejected",
            CouponEvent::CooldownTick(_) => "cooldown.tick",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<CouponEvent>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 256;

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    /// Flips the shutdown flag. Listeners select on `shutdown_rx`.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<CouponEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Fire-and-forget publish. Subscribers whose queue is full miss this
    /// event instead of stalling the publisher.
    pub async fn try_publish(&self, event: CouponEvent) {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|s| !s.is_closed());
        for s in subs.iter() {
            if let Err(TrySendError::Full(_)) = s.try_send(event.clone()) {
                warn!("Subscriber queue full; dropping '{}' event", event.event_type());
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|s| !s.is_closed());
        subs.len()
    }
}
