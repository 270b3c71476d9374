use super::sessions::SessionRegistry;
use super::types::{FinishReason, GameId};
use crate::domain::{Color, Outcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

// What one pass over the active games did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub advanced: usize,
    pub finished: Vec<(GameId, Color)>,
}

// Steps every running game once and publishes the results.
// Waiting games have no entry in the active set and are never touched.
pub fn run_tick(sessions: &mut SessionRegistry) -> TickReport {
    let mut report = TickReport::default();

    for active in sessions.games_mut() {
        report.advanced += 1;
        match active.advance() {
            Outcome::Continuing => active.publish_snapshot(),
            Outcome::Won(winner) => report.finished.push((active.game_id, winner)),
        }
    }

    for &(game_id, winner) in &report.finished {
        sessions.finish(game_id, winner, FinishReason::Collision);
    }

    report
}

pub async fn tick_task(
    sessions: Arc<Mutex<SessionRegistry>>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // Drive every game from one fixed-rate clock.
    let mut interval = tokio::time::interval(tick_interval);
    // A slow tick delays the next one instead of bursting to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_ms = tick_interval.as_millis() as u64, "tick loop started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("tick loop stopping");
                break;
            }
            _ = interval.tick() => {
                let report = {
                    let mut sessions = sessions.lock().await;
                    run_tick(&mut sessions)
                };
                if !report.finished.is_empty() {
                    debug!(
                        advanced = report.advanced,
                        finished = report.finished.len(),
                        "tick finished games"
                    );
                }
            }
        }
    }
}
