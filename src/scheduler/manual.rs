use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::lock;
use super::{Scheduler, TimerHandle, TimerTask};

/// Scheduler driven by a virtual clock.
///
/// Nothing runs until [`advance`](ManualScheduler::advance) moves the clock. Tasks fire in deadline
/// order, ties in scheduling order. Useful in tests and for hosts that already run a frame clock.
#[derive(Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ClockState>>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_seq: u64,
    tasks: BTreeMap<(Duration, u64), TimerTask>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.tasks.len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        lock(&self.state).now
    }

    /// Number of scheduled tasks that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    /// Moves the clock forward by `by`, running every task that becomes due.
    ///
    /// Tasks run without the clock lock held, so a task may schedule or cancel other tasks; those
    /// fire in the same call if they fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.state).now + by;

        loop {
            let task = {
                let mut state = lock(&self.state);
                let due = state.tasks.keys().next().copied().filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.tasks.remove(&key)
                    }
                    None => None,
                }
            };

            match task {
                Some(task) => task(),
                None => break,
            }
        }

        lock(&self.state).now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let key = {
            let mut state = lock(&self.state);
            let key = (state.now + delay, state.next_seq);
            state.next_seq += 1;
            state.tasks.insert(key, task);
            key
        };

        let weak = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = weak.upgrade() {
                lock(&state).tasks.remove(&key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> TimerTask {
        let log = log.clone();
        Box::new(move || log.lock().unwrap().push(name))
    }

    #[test]
    fn runs_in_deadline_order() {
        let clock = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        clock.schedule(Duration::from_millis(30), push(&log, "c"));
        clock.schedule(Duration::from_millis(10), push(&log, "a"));
        clock.schedule(Duration::from_millis(20), push(&log, "b"));
        clock.schedule(Duration::from_millis(20), push(&log, "b2"));

        clock.advance(Duration::from_millis(25));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "b2"]);
        assert_eq!(clock.pending(), 1);
        assert_eq!(clock.now(), Duration::from_millis(25));

        clock.advance(Duration::from_millis(5));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "b2", "c"]);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let clock = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = clock.schedule(Duration::from_millis(10), push(&log, "x"));
        handle.cancel();
        clock.advance(Duration::from_millis(100));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn dropping_handle_keeps_task() {
        let clock = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        drop(clock.schedule(Duration::from_millis(10), push(&log, "kept")));
        clock.advance(Duration::from_millis(10));
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }
}
