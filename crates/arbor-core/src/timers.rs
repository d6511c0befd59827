//! Deferred callbacks on a host-driven clock.
//!
//! Nothing here sleeps: the host calls [`Timers::advance`] (usually through
//! [`Runtime::advance`](crate::Runtime::advance)) and every callback that
//! became due runs in deadline order.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Delay applied to "Enter" key actions.
pub const ENTER_DEBOUNCE: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type Callback = Box<dyn FnOnce()>;

#[derive(Clone)]
pub struct Timers(Rc<RefCell<Inner>>);

struct Inner {
    now: Instant,
    next_id: u64,
    queue: BTreeMap<(Instant, TimerId), Callback>,
}

impl Default for Timers {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl Timers {
    pub fn starting_at(now: Instant) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            now,
            next_id: 0,
            queue: BTreeMap::new(),
        })))
    }

    pub fn now(&self) -> Instant {
        self.0.borrow().now
    }

    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.0.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let deadline = inner.now + delay;
        inner.queue.insert((deadline, id), Box::new(callback));
        id
    }

    /// Returns false if the timer already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.0.borrow_mut();
        let key = inner.queue.keys().find(|(_, t)| *t == id).copied();
        key.and_then(|key| inner.queue.remove(&key)).is_some()
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().queue.len()
    }

    /// Moves the clock to `now` and runs every due callback. Callbacks may
    /// schedule new timers; those run too if they are already due.
    pub fn advance(&self, now: Instant) -> usize {
        {
            let mut inner = self.0.borrow_mut();
            if now > inner.now {
                inner.now = now;
            }
        }
        let mut ran = 0;
        loop {
            let next = {
                let mut inner = self.0.borrow_mut();
                let now = inner.now;
                match inner.queue.first_key_value() {
                    Some(((deadline, _), _)) if *deadline <= now => inner.queue.pop_first(),
                    _ => None,
                }
            };
            let Some((_, callback)) = next else {
                break;
            };
            callback();
            ran += 1;
        }
        ran
    }

    pub fn advance_by(&self, delay: Duration) -> usize {
        let now = self.now() + delay;
        self.advance(now)
    }
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Runs only the last of a burst of calls, `delay` after it was made.
#[derive(Clone, Debug)]
pub struct Debouncer {
    timers: Timers,
    delay: Duration,
    scheduled: Rc<Cell<Option<TimerId>>>,
}

impl Debouncer {
    pub fn new(timers: Timers, delay: Duration) -> Self {
        Self {
            timers,
            delay,
            scheduled: Rc::new(Cell::new(None)),
        }
    }

    pub fn call(&self, action: impl FnOnce() + 'static) {
        if let Some(id) = self.scheduled.take() {
            self.timers.cancel(id);
        }
        let scheduled = self.scheduled.clone();
        let id = self.timers.schedule(self.delay, move || {
            scheduled.set(None);
            action();
        });
        self.scheduled.set(Some(id));
    }

    pub fn is_pending(&self) -> bool {
        self.scheduled.get().is_some()
    }
}

/// Key handler running `action` through `debouncer` when Enter is pressed.
pub fn handle_enter(debouncer: Debouncer, action: impl Fn() + 'static) -> impl Fn(&str) {
    let action = Rc::new(action);
    move |key: &str| {
        if key == "Enter" {
            let action = action.clone();
            debouncer.call(move || action());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_run_in_deadline_order() {
        let start = Instant::now();
        let timers = Timers::starting_at(start);
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            timers.schedule(Duration::from_millis(delay), move || log.borrow_mut().push(tag));
        }

        assert_eq!(timers.advance(start + Duration::from_millis(20)), 2);
        assert_eq!(*log.borrow(), ["a", "b"]);
        assert_eq!(timers.pending(), 1);
        timers.advance_by(Duration::from_millis(10));
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn cancelled_timer_never_runs() {
        let timers = Timers::default();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        let id = timers.schedule(Duration::ZERO, move || r.set(true));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        timers.advance_by(Duration::from_secs(1));
        assert!(!ran.get());
    }

    #[test]
    fn enter_is_debounced() {
        let timers = Timers::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let on_key = handle_enter(Debouncer::new(timers.clone(), ENTER_DEBOUNCE), move || {
            h.set(h.get() + 1)
        });

        on_key("a");
        on_key("Enter");
        on_key("Enter");
        timers.advance_by(Duration::from_millis(5));
        assert_eq!(hits.get(), 0);
        timers.advance_by(ENTER_DEBOUNCE);
        assert_eq!(hits.get(), 1);
        assert_eq!(timers.pending(), 0);
    }
}
