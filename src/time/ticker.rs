use embassy_time::{Duration, Instant, Timer};

use crate::peripheral::Pacer;

/// Paces sweep steps at a fixed interval.
///
/// Each interval is measured from the previous deadline, so time spent writing
/// the peripherals doesn't stretch the sweep. After an overrun the schedule
/// restarts from the current instant rather than firing back-to-back ticks.
pub struct StepTicker {
    measured_from: Instant,
    interval: Duration,
}

impl StepTicker {
    /// Creates a new ticker that ticks at the specified interval
    pub fn every(interval: Duration) -> Self {
        Self {
            measured_from: Instant::now(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until `interval` has elapsed since the last tick time
    pub async fn next(&mut self) {
        let expires_at = self.measured_from + self.interval;
        let now = Instant::now();
        if expires_at > now {
            Timer::at(expires_at).await;
            self.measured_from = expires_at;
        } else {
            debug!(
                "Step overran its interval by {}us",
                (now - expires_at).as_micros()
            );
            self.measured_from = now;
        }
    }
}

impl Pacer for StepTicker {
    async fn pace(&mut self) {
        self.next().await;
    }
}
