//! Interactive `watch` mode: live countdowns plus redeem-by-id from stdin.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use couponbook_core::eventbus::{CouponEvent, EventBus};
use couponbook_core::{CouponId, RedemptionEngine, SystemTimeSource, TimeSource};

use crate::render;

pub async fn run_watch(
    engine: &mut RedemptionEngine,
    bus: &EventBus,
    tick: Duration,
    search: Option<String>,
) -> anyhow::Result<()> {
    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let clock = engine.start_cooldown_clock(time.clone(), tick);
    let mut cooldowns = clock.subscribe();
    let mut events = bus.subscribe(None).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown_rx = bus.shutdown_rx.clone();

    render::print_category_views(&engine.views(time.now_millis(), search.as_deref()));
    println!("Type a coupon id to redeem it, 'list' to redraw, 'q' to quit.");

    while !bus.is_shutdown() {
        tokio::select! {
            res = shutdown_rx.changed() => {
                if res.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "" => continue,
                    "q" | "quit" | "exit" => break,
                    "list" | "ls" => {
                        render::print_category_views(&engine.views(time.now_millis(), search.as_deref()));
                    }
                    other => match other.parse::<CouponId>() {
                        Ok(id) => {
                            if let Err(e) = engine.attempt_redeem(id, time.now_millis()).await {
                                println!("{}", render::describe_error(&e));
                            }
                        }
                        Err(_) => println!("Not a coupon id: '{}'", other),
                    },
                }
            }
            Ok(()) = cooldowns.changed() => {
                let map = cooldowns.borrow_and_update().clone();
                render::print_cooldown_line(engine.catalog(), &map);
            }
            Some(event) = events.recv() => {
                debug!("watch got event '{}'", event.event_type());
                if let CouponEvent::Redeemed { coupon_id, snapshot, .. } = event {
                    render::celebrate(engine.catalog(), coupon_id, &snapshot);
                }
            }
        }
    }

    clock.stop().await;
    Ok(())
}
