//! Inspection countdown and stopwatch.
//!
//! Leaving [`Phase::Idle`] spawns one worker thread that owns the tick loop for
//! the attempt. The foreground talks to it through a mutex-guarded command and a
//! condvar; the worker answers through the published display string and a
//! one-shot slot holding the finished solve.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::time_format::{format_deciseconds, format_time_seconds, IDLE_DISPLAY};

pub const INSPECTION_SECONDS: i32 = 15;

/// Added to every measured solve to offset the time lost to truncating at tick boundaries
pub const STOP_CORRECTION: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Inspecting,
    Running,
}

/// How the last attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Disposition {
    Accepted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickIntervals {
    pub inspection: Duration,
    pub running: Duration,
}

impl Default for TickIntervals {
    // slightly under a full second/decisecond, tuned per platform for scheduler overhead
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                inspection: Duration::from_millis(970),
                running: Duration::from_millis(97),
            }
        } else {
            Self {
                inspection: Duration::from_millis(990),
                running: Duration::from_millis(99),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerConfig {
    pub with_inspection: bool,
    pub inspection_secs: i32,
    pub intervals: TickIntervals,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            with_inspection: true,
            inspection_secs: INSPECTION_SECONDS,
            intervals: TickIntervals::default(),
        }
    }
}

/// A stopped attempt waiting to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSolve {
    pub elapsed: Duration,
    /// Two-decimal rendering, what the display showed last
    pub formatted: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Idle,
    Inspect,
    Run {
        started_at: Instant,
    },
    Stop {
        disposition: Disposition,
        elapsed: Option<Duration>,
    },
}

impl Command {
    fn phase(&self) -> Phase {
        match self {
            Command::Inspect => Phase::Inspecting,
            Command::Run { .. } => Phase::Running,
            Command::Idle | Command::Stop { .. } => Phase::Idle,
        }
    }
}

#[derive(Debug)]
struct PhaseState {
    command: Command,
    countdown: i32,
    ticks: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<PhaseState>,
    wake: Condvar,
    display: Mutex<String>,
    ready: Mutex<Option<FinishedSolve>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking worker must not take the foreground down with it
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn publish(&self, text: String) {
        *lock(&self.display) = text;
    }
}

#[derive(Debug)]
pub struct Timer {
    config: TimerConfig,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    last_disposition: Option<Disposition>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl Timer {
    pub fn new(config: TimerConfig) -> Self {
        let shared = Shared {
            state: Mutex::new(PhaseState {
                command: Command::Idle,
                countdown: config.inspection_secs,
                ticks: 0,
            }),
            wake: Condvar::new(),
            display: Mutex::new(IDLE_DISPLAY.to_string()),
            ready: Mutex::new(None),
        };

        Self {
            config,
            shared: Arc::new(shared),
            worker: None,
            last_disposition: None,
        }
    }

    /// Takes effect on the next attempt.
    pub fn set_inspection(&mut self, enabled: bool) {
        self.config.with_inspection = enabled;
    }

    pub fn with_inspection(&self) -> bool {
        self.config.with_inspection
    }

    /// Idle starts an attempt, Inspecting moves on to Running, Running ignores it.
    pub fn start(&mut self) {
        match self.phase() {
            Phase::Idle => self.begin_attempt(),
            Phase::Inspecting => {
                let mut state = lock(&self.shared.state);
                state.command = Command::Run {
                    started_at: Instant::now(),
                };
                state.ticks = 0;
                drop(state);
                self.shared.wake.notify_all();
            }
            Phase::Running => {}
        }
    }

    /// Running finishes the solve. Inspecting counts as a cancellation.
    pub fn stop(&mut self) {
        let now = Instant::now();
        let finish = match lock(&self.shared.state).command {
            Command::Run { started_at } => Some((
                Disposition::Accepted,
                Some(now.saturating_duration_since(started_at) + STOP_CORRECTION),
            )),
            Command::Inspect => Some((Disposition::Cancelled, None)),
            Command::Idle | Command::Stop { .. } => None,
        };

        if let Some((disposition, elapsed)) = finish {
            self.finish(disposition, elapsed);
        }
    }

    /// Abandon the attempt in flight. The display returns to idle and no solve is produced.
    pub fn cancel(&mut self) {
        if self.phase() != Phase::Idle {
            self.finish(Disposition::Cancelled, None);
        }
    }

    /// Blank out a finished time. Only acts while idle, a live attempt owns the display.
    pub fn reset_display(&self) {
        if self.is_idle() {
            self.shared.publish(IDLE_DISPLAY.to_string());
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.shared.state).command.phase()
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle
    }

    pub fn is_inspecting(&self) -> bool {
        self.phase() == Phase::Inspecting
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn display(&self) -> String {
        lock(&self.shared.display).clone()
    }

    /// Hands out the finished solve once; later calls return `None` until the next accepted stop.
    pub fn take_solve(&self) -> Option<FinishedSolve> {
        lock(&self.shared.ready).take()
    }

    pub fn last_disposition(&self) -> Option<Disposition> {
        self.last_disposition
    }

    pub fn inspection_remaining(&self) -> i32 {
        lock(&self.shared.state).countdown
    }

    pub fn elapsed_ticks(&self) -> u64 {
        lock(&self.shared.state).ticks
    }

    fn begin_attempt(&mut self) {
        self.join_worker();

        {
            let mut state = lock(&self.shared.state);
            state.countdown = self.config.inspection_secs;
            state.ticks = 0;
            state.command = if self.config.with_inspection {
                Command::Inspect
            } else {
                Command::Run {
                    started_at: Instant::now(),
                }
            };
        }

        let shared = Arc::clone(&self.shared);
        let intervals = self.config.intervals;
        debug!(inspection = self.config.with_inspection, "starting timer worker");
        self.worker = Some(thread::spawn(move || run_worker(&shared, intervals)));
    }

    fn finish(&mut self, disposition: Disposition, elapsed: Option<Duration>) {
        {
            let mut state = lock(&self.shared.state);
            state.command = Command::Stop {
                disposition,
                elapsed,
            };
            state.countdown = self.config.inspection_secs;
            state.ticks = 0;
        }
        self.shared.wake.notify_all();
        self.last_disposition = Some(disposition);

        // already signalled, so this returns within one wakeup
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("timer worker panicked");
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
        self.join_worker();
    }
}

fn run_worker(shared: &Shared, intervals: TickIntervals) {
    let mut state = lock(&shared.state);

    loop {
        match state.command {
            Command::Inspect => {
                shared.publish(state.countdown.to_string());
                let (guard, wait) = shared
                    .wake
                    .wait_timeout_while(state, intervals.inspection, |s| {
                        s.command == Command::Inspect
                    })
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;
                // holds at zero until the solver starts
                if wait.timed_out() && state.countdown > 0 {
                    state.countdown -= 1;
                }
            }
            Command::Run { started_at } => {
                shared.publish(format_deciseconds(state.ticks));
                let (guard, wait) = shared
                    .wake
                    .wait_timeout_while(state, intervals.running, |s| {
                        s.command == Command::Run { started_at }
                    })
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;
                if wait.timed_out() {
                    state.ticks += 1;
                }
            }
            Command::Stop {
                disposition,
                elapsed,
            } => {
                state.command = Command::Idle;
                drop(state);

                match (disposition, elapsed) {
                    (Disposition::Accepted, Some(elapsed)) => {
                        let formatted = format_time_seconds(elapsed.as_secs_f64());
                        debug!(time = %formatted, "actual time");
                        shared.publish(formatted.clone());
                        *lock(&shared.ready) = Some(FinishedSolve { elapsed, formatted });
                    }
                    _ => shared.publish(IDLE_DISPLAY.to_string()),
                }
                return;
            }
            Command::Idle => return,
        }
    }
}
