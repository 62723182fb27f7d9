//! Debounced single-flight executor.
//!
//! Triggers restart a quiet-period timer; when it expires the caller gets a
//! [`FlightPermit`] unless a previous permit is still alive, in which case the
//! fire is dropped. Time comes from a [`Clock`] so tests can drive it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FirePoll {
    /// No trigger is pending.
    Quiet,
    /// A trigger is pending; it fires after the remaining delay.
    Waiting(Duration),
    Fire(FlightPermit),
    /// The timer expired while a flight was outstanding; the trigger is gone.
    Dropped,
}

/// Proof that the caller owns the single flight. Dropping it ends the flight.
#[derive(Debug)]
pub struct FlightPermit {
    in_flight: Rc<Cell<bool>>,
}

impl PartialEq for FlightPermit {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.in_flight, &other.in_flight)
    }
}

impl Eq for FlightPermit {}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.in_flight.set(false);
    }
}

#[derive(Debug)]
pub struct DebouncedSingleFlight<C: Clock = SystemClock> {
    clock: C,
    delay: Duration,
    deadline: Option<Instant>,
    in_flight: Rc<Cell<bool>>,
}

impl<C: Clock> DebouncedSingleFlight<C> {
    pub fn with_clock(clock: C, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            deadline: None,
            in_flight: Rc::new(Cell::new(false)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// (Re)starts the quiet period.
    pub fn trigger(&mut self) {
        self.deadline = Some(self.clock.now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.get()
    }

    pub fn poll(&mut self) -> FirePoll {
        let Some(deadline) = self.deadline else {
            return FirePoll::Quiet;
        };
        let now = self.clock.now();
        if now < deadline {
            return FirePoll::Waiting(deadline - now);
        }
        self.deadline = None;
        if self.in_flight.get() {
            return FirePoll::Dropped;
        }
        self.in_flight.set(true);
        FirePoll::Fire(FlightPermit {
            in_flight: Rc::clone(&self.in_flight),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Manually advanced clock shared between a test and the code under test.
    #[derive(Debug, Clone)]
    pub(crate) struct FakeClock {
        now: Rc<Cell<Instant>>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }

    fn executor() -> (FakeClock, DebouncedSingleFlight<FakeClock>) {
        let clock = FakeClock::new();
        let executor = DebouncedSingleFlight::with_clock(clock.clone(), DEFAULT_DEBOUNCE);
        (clock, executor)
    }

    #[test]
    fn retrigger_within_window_fires_once_after_last_trigger() {
        let (clock, mut executor) = executor();
        executor.trigger();
        clock.advance(Duration::from_millis(200));
        executor.trigger();

        clock.advance(Duration::from_millis(399));
        assert_eq!(
            executor.poll(),
            FirePoll::Waiting(Duration::from_millis(1))
        );

        clock.advance(Duration::from_millis(1));
        let permit = match executor.poll() {
            FirePoll::Fire(permit) => permit,
            other => panic!("expected fire, got {other:?}"),
        };
        assert!(executor.in_flight());
        assert_eq!(executor.poll(), FirePoll::Quiet);
        drop(permit);
    }

    #[test]
    fn expiry_during_flight_is_dropped_not_queued() {
        let (clock, mut executor) = executor();
        executor.trigger();
        clock.advance(DEFAULT_DEBOUNCE);
        let permit = match executor.poll() {
            FirePoll::Fire(permit) => permit,
            other => panic!("expected fire, got {other:?}"),
        };

        executor.trigger();
        clock.advance(DEFAULT_DEBOUNCE);
        assert_eq!(executor.poll(), FirePoll::Dropped);

        drop(permit);
        assert!(!executor.in_flight());
        assert_eq!(executor.poll(), FirePoll::Quiet);
    }

    #[test]
    fn dropping_permit_reopens_single_flight() {
        let (clock, mut executor) = executor();
        executor.trigger();
        clock.advance(DEFAULT_DEBOUNCE);
        let first = executor.poll();
        assert!(matches!(first, FirePoll::Fire(_)));
        drop(first);
        assert!(!executor.in_flight());

        executor.trigger();
        clock.advance(DEFAULT_DEBOUNCE);
        assert!(matches!(executor.poll(), FirePoll::Fire(_)));
    }

    #[test]
    fn cancel_clears_pending_trigger() {
        let (clock, mut executor) = executor();
        executor.trigger();
        executor.cancel();
        clock.advance(DEFAULT_DEBOUNCE);
        assert!(!executor.is_pending());
        assert_eq!(executor.poll(), FirePoll::Quiet);
    }
}
