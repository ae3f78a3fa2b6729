use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::warn;

/// Tripped once any periodic activity has overrun its period too many
/// times in a row. The control activity polls it and latches a fault.
#[derive(Debug, Default)]
pub struct DeadlineAlarm {
    tripped: AtomicBool,
}

impl DeadlineAlarm {
    pub fn trip(&self) {
        self.tripped.store(true, Ordering::Relaxed);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }
}

/// Spawn a paced periodic activity on its own thread.
///
/// The body runs once per period and the remainder of the period is slept
/// away; the stop flag is checked at every cycle boundary. An overrunning
/// cycle is logged, and `overrun_threshold` consecutive overruns trip the
/// shared alarm. After an overrun the schedule restarts from now instead
/// of bursting to catch up on missed cycles.
pub fn spawn_periodic(
    name: &'static str,
    period: Duration,
    stop: Arc<AtomicBool>,
    alarm: Arc<DeadlineAlarm>,
    overrun_threshold: u32,
    mut body: impl FnMut() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name.into()).spawn(move || {
        let mut overrun_streak = 0u32;
        let mut next_deadline = Instant::now() + period;
        while !stop.load(Ordering::Relaxed) {
            body();

            let now = Instant::now();
            if now <= next_deadline {
                overrun_streak = 0;
                thread::sleep(next_deadline - now);
                next_deadline += period;
            } else {
                overrun_streak += 1;
                warn!(
                    "{}: cycle overran its {:?} period ({} in a row)",
                    name, period, overrun_streak
                );
                if overrun_threshold > 0 && overrun_streak >= overrun_threshold {
                    alarm.trip();
                }
                next_deadline = now + period;
            }
        }
    })
}
