use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::controller::ControllerEvent;

/// Periodically asks the controller to refresh one key. The first tick lands a
/// full period after spawning because appearing already triggers a fetch.
pub fn spawn(
    context: String,
    registration: u64,
    period: Duration,
    events: mpsc::UnboundedSender<ControllerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let due = ControllerEvent::RefreshDue {
                context: context.clone(),
                registration,
            };
            if events.send(due).is_err() {
                debug!(context = %context, "controller gone, stopping refresh timer");
                break;
            }
        }
    })
}
