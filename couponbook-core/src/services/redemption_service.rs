use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use couponbook_common::models::{CouponId, EligibilitySnapshot, Ledger, LedgerEntry};
use couponbook_common::traits::LedgerRepository;
use crate::Error;
use crate::catalog::CouponCatalog;
use crate::eligibility::evaluate;
use crate::eventbus::{CouponEvent, EventBus};
use crate::tasks::cooldown_clock::CooldownClock;
use crate::utils::time::TimeSource;
use crate::view::{build_category_views, build_view, CategoryView, CouponView};

/// Owns the session's ledger and is the only thing that changes it.
///
/// `attempt_redeem` takes `&mut self`, so redemptions are serialized by the
/// borrow checker. A new ledger only becomes visible (to `ledger()` and to
/// watchers) once the repository has accepted it.
pub struct RedemptionEngine {
    catalog: Arc<CouponCatalog>,
    ledger: Ledger,
    repo: Arc<dyn LedgerRepository>,
    ledger_tx: watch::Sender<Ledger>,
    event_bus: Option<EventBus>,
}

impl RedemptionEngine {
    pub fn new(catalog: Arc<CouponCatalog>, repo: Arc<dyn LedgerRepository>, ledger: Ledger) -> Self {
        let (ledger_tx, _) = watch::channel(ledger.clone());
        Self { catalog, ledger, repo, ledger_tx, event_bus: None }
    }

    /// Loads the persisted ledger (empty if missing or unreadable) and builds
    /// an engine around it.
    pub async fn open(catalog: Arc<CouponCatalog>, repo: Arc<dyn LedgerRepository>) -> Self {
        let ledger = repo.load().await;
        info!(
            "Redemption engine ready: {} coupon(s), {} redemption(s) on record",
            catalog.len(),
            ledger.total_redemptions()
        );
        Self::new(catalog, repo, ledger)
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn catalog(&self) -> &Arc<CouponCatalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn entry(&self, coupon_id: CouponId) -> LedgerEntry {
        self.ledger.get(coupon_id)
    }

    /// Receives every ledger the engine commits.
    pub fn subscribe_ledger(&self) -> watch::Receiver<Ledger> {
        self.ledger_tx.subscribe()
    }

    pub fn snapshot(&self, coupon_id: CouponId, now_ms: u64) -> Result<EligibilitySnapshot, Error> {
        let def = self.catalog.get(coupon_id).ok_or(Error::UnknownCoupon(coupon_id))?;
        Ok(evaluate(def, &self.ledger.get(coupon_id), now_ms))
    }

    /// Snapshots for the whole catalog, in catalog order.
    pub fn snapshots(&self, now_ms: u64) -> Vec<EligibilitySnapshot> {
        self.catalog
            .iter()
            .map(|c| evaluate(c, &self.ledger.get(c.id), now_ms))
            .collect()
    }

    pub fn view(&self, coupon_id: CouponId, now_ms: u64) -> Result<CouponView, Error> {
        let def = self.catalog.get(coupon_id).ok_or(Error::UnknownCoupon(coupon_id))?;
        Ok(build_view(def, &self.ledger.get(coupon_id), now_ms))
    }

    pub fn views(&self, now_ms: u64, search: Option<&str>) -> Vec<CategoryView> {
        build_category_views(&self.catalog, &self.ledger, now_ms, search)
    }

    /// Redeems `coupon_id` at `now_ms`.
    ///
    /// Gate failures (`UseLimitExceeded`, `CooldownActive`) and unknown ids
    /// leave the ledger untouched and write nothing. On success the new
    /// ledger is persisted before anything else observes it; if persisting
    /// fails the redemption fails with `PersistenceUnavailable`.
    pub async fn attempt_redeem(
        &mut self,
        coupon_id: CouponId,
        now_ms: u64,
    ) -> Result<EligibilitySnapshot, Error> {
        let def = match self.catalog.get(coupon_id) {
            Some(d) => d,
            None => {
                debug!("Redeem of unknown coupon id={}", coupon_id);
                return Err(Error::UnknownCoupon(coupon_id));
            }
        };

        let current = evaluate(def, &self.ledger.get(coupon_id), now_ms);
        if current.is_depleted {
            let err = Error::UseLimitExceeded {
                coupon_id,
                max_uses: def.effective_max_uses().unwrap_or(0),
            };
            self.reject(coupon_id, &err).await;
            return Err(err);
        }
        if current.remaining_cooldown_ms > 0 {
            let err = Error::CooldownActive {
                coupon_id,
                remaining_ms: current.remaining_cooldown_ms,
            };
            self.reject(coupon_id, &err).await;
            return Err(err);
        }

        let updated = self.ledger.record_use(coupon_id, now_ms);
        if let Err(e) = self.repo.persist(&updated).await {
            error!("Failed to persist redemption of coupon id={}: {}", coupon_id, e);
            let err = match e {
                Error::PersistenceUnavailable(_) => e,
                other => Error::PersistenceUnavailable(other.to_string()),
            };
            self.reject(coupon_id, &err).await;
            return Err(err);
        }

        self.ledger = updated;
        self.ledger_tx.send_replace(self.ledger.clone());

        let snapshot = evaluate(def, &self.ledger.get(coupon_id), now_ms);
        info!(
            "Redeemed coupon id={} '{}' => use_count={}, uses_left={}, cooldown={}ms",
            coupon_id,
            def.title,
            self.ledger.get(coupon_id).use_count,
            snapshot.uses_left,
            snapshot.remaining_cooldown_ms
        );

        if let Some(bus) = &self.event_bus {
            bus.try_publish(CouponEvent::Redeemed { coupon_id, snapshot, at_ms: now_ms }).await;
        }

        Ok(snapshot)
    }

    /// Starts a cooldown clock wired to this engine's ledger updates.
    pub fn start_cooldown_clock(&self, time: Arc<dyn TimeSource>, period: Duration) -> CooldownClock {
        CooldownClock::start(
            self.catalog.clone(),
            self.subscribe_ledger(),
            time,
            period,
            self.event_bus.clone(),
        )
    }

    async fn reject(&self, coupon_id: CouponId, err: &Error) {
        debug!("Redeem of coupon id={} rejected: {}", coupon_id, err);
        if let Some(bus) = &self.event_bus {
            bus.try_publish(CouponEvent::RedemptionRejected {
                coupon_id,
                reason: err.to_string(),
            })
            .await;
        }
    }
}
