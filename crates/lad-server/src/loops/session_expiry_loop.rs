//! Session expiry loop.
//!
//! Closes form sessions nobody has touched for a while so abandoned forms
//! don't keep a pipeline task alive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

pub async fn run_session_expiry_loop(
    state: Arc<AppState>,
    max_idle: Duration,
    sweep_every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(sweep_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Session expiry loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let closed = state.expire_idle_sessions(max_idle);
                if closed > 0 {
                    tracing::info!(
                        "Closed {} idle session(s), {} still open",
                        closed,
                        state.session_count()
                    );
                }
            }
        }
    }
}
