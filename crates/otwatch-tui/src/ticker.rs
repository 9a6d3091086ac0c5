//! Telemetry ticker — background task feeding the shell header.
//!
//! Every five seconds it replaces the whole status snapshot and, one tick
//! in five on average, emits a canned notification.

use std::time::Duration;

use rand::thread_rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use otwatch_core::telemetry::{self, TICK_SECS};

use crate::action::Action;

/// Spawn the ticker. Cancelling the returned token stops it.
pub fn spawn(action_tx: UnboundedSender<Action>) -> CancellationToken {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(TICK_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup keeps the
        // default snapshot for a full period.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                () = task_cancel.cancelled() => {
                    debug!("telemetry ticker stopped");
                    break;
                }

                _ = interval.tick() => {
                    let (status, notice) = {
                        let mut rng = thread_rng();
                        (
                            telemetry::random_status(&mut rng),
                            telemetry::maybe_notification(&mut rng),
                        )
                    };

                    if action_tx.send(Action::StatusUpdated(Box::new(status))).is_err() {
                        break;
                    }
                    if let Some((kind, title, message)) = notice
                        && action_tx
                            .send(Action::TickerNotice { kind, title, message })
                            .is_err()
                    {
                        break;
                    }
                }
            }
        }
    });

    cancel
}
