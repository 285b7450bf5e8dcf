//! Background countdown driving the quiz time limit.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use quiz_core::{Countdown, CountdownTick};

const TICK: Duration = Duration::from_secs(1);

/// One countdown tick, tagged with the run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub epoch: u64,
    pub tick: CountdownTick,
}

/// At most one running countdown task.
///
/// Every `start` bumps the epoch; consumers drop events whose epoch is not
/// the current one, so ticks queued by a cancelled run are harmless.
#[derive(Debug, Default)]
pub struct QuizTimer {
    handle: Option<JoinHandle<()>>,
    epoch: u64,
}

impl QuizTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch of the most recent `start`.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel any running countdown and start a new one of `total_secs`.
    ///
    /// Sends one event per second until expiry. Must be called inside a
    /// Tokio runtime. Returns the new epoch.
    pub fn start(&mut self, total_secs: u32, events: UnboundedSender<TimerEvent>) -> u64 {
        self.stop();
        self.epoch += 1;
        let epoch = self.epoch;

        self.handle = Some(tokio::spawn(async move {
            let mut countdown = Countdown::new(total_secs);
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let tick = countdown.tick();
                if events.send(TimerEvent { epoch, tick }).is_err() {
                    tracing::debug!(epoch, "timer receiver dropped");
                    break;
                }
                if tick.is_expired() {
                    tracing::debug!(epoch, "countdown expired");
                    break;
                }
            }
        }));
        tracing::debug!(epoch, total_secs, "timer started");
        epoch
    }

    /// Cancel the running countdown, if any. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(epoch = self.epoch, "timer stopped");
        }
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn counts_down_then_expires_once() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = QuizTimer::new();
        let epoch = timer.start(3, tx);

        let mut ticks = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.epoch, epoch);
            ticks.push(event.tick);
        }
        assert_eq!(
            ticks,
            vec![
                CountdownTick::Running { remaining: 2 },
                CountdownTick::Running { remaining: 1 },
                CountdownTick::Expired,
            ]
        );
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_previous_run() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = QuizTimer::new();
        let first = timer.start(100, tx.clone());
        let second = timer.start(1, tx);
        assert_eq!(second, first + 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.epoch, second);
        assert_eq!(event.tick, CountdownTick::Expired);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_events() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = QuizTimer::new();
        timer.start(10, tx);
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
        assert!(rx.recv().await.is_none());
    }
}
