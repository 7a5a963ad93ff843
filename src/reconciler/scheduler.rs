//! Cancellable repeating refresh timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// `interval_at` panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owns at most one ticking task. Re-arming replaces it; dropping cancels it.
#[derive(Debug, Default)]
pub(super) struct RefreshScheduler {
    task: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl RefreshScheduler {
    /// Start ticking every `period`, first tick one period from now.
    pub(super) fn arm(&mut self, period: Duration, tick_tx: mpsc::UnboundedSender<()>) {
        self.cancel();
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            // A stalled actor gets one tick, not a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tick_tx.send(()).is_err() {
                    break;
                }
            }
        });
        self.task = Some(task);
        self.period = Some(period);
    }

    pub(super) fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.period = None;
    }

    pub(super) fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    pub(super) fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
