use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::trigger::{Origin, Trigger};

/// Fires a run every `period`. The first run happens one period after start-up.
/// Failures are logged by the trigger and the timer keeps going.
pub fn spawn(trigger: Arc<Trigger>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Aggregation timer every {}s", period.as_secs());

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let _ = trigger.fire(Origin::Timer).await;
        }
    })
}
