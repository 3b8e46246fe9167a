//! Timers for the background loops.
//!
//! [`Interval`] is a virtual clock: callers feed it elapsed time and it reports
//! how many periods completed. Production code feeds it from a [`TickSource`],
//! tests feed it directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    period: Duration,
    elapsed: Duration,
    running: bool,
}

impl Interval {
    /// A stopped interval. A zero period is bumped to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops the interval and discards any partially elapsed period, so a
    /// later restart never fires early.
    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed = Duration::ZERO;
    }

    /// Time left until the next firing, if running.
    pub fn remaining(&self) -> Option<Duration> {
        self.running.then(|| self.period.saturating_sub(self.elapsed))
    }

    /// Advances the clock and returns how many periods completed, saturating
    /// at `u32::MAX`.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        let elapsed = self.elapsed.saturating_add(dt).as_nanos();
        let period = self.period.as_nanos();
        let rest = elapsed % period;
        self.elapsed = Duration::new((rest / NANOS_PER_SEC) as u64, (rest % NANOS_PER_SEC) as u32);
        u32::try_from(elapsed / period).unwrap_or(u32::MAX)
    }
}

/// Real-time tick producer. Each message carries the wall time since the
/// previous one. The thread exits on [`TickSource::stop`], on drop, or when
/// the receiver hangs up.
pub struct TickSource {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    pub fn spawn<T, F>(rate: Duration, tx: Sender<T>, make: F) -> Self
    where
        T: Send + 'static,
        F: Fn(Duration) -> T + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            let mut last = Instant::now();
            while flag.load(Ordering::Acquire) {
                thread::sleep(rate);
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                let now = Instant::now();
                let dt = now.duration_since(last);
                last = now;
                if tx.send(make(dt)).is_err() {
                    break;
                }
            }
            debug!("tick source stopped");
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the thread and waits for it, so no tick is delivered afterwards.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop();
    }
}
