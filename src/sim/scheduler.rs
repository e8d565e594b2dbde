use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::game::Game;

/// Run an AI tick every `period` until `shutdown` flips to `true` or its
/// sender is dropped.
///
/// The first tick fires one full period after start. A tick that overruns
/// its slot delays the next one instead of bunching them up.
pub fn spawn_ai_scheduler(
    game: Arc<Game>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        info!(period_secs = period.as_secs(), "ai scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = game.run_ai_tick().await;
                    for (country, error) in &report.failed_turns {
                        warn!(country = %country, error = %error, "ai turn skipped");
                    }
                    info!(
                        turns = report.turns.len(),
                        performed = report.performed(),
                        failed = report.failed_turns.len(),
                        "ai tick"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("ai scheduler stopped");
    })
}
