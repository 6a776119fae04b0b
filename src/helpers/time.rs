use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, PoisonError, RwLock};

/// Tells the current UTC time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `chrono::Utc::now`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give another
/// to the token under test.
#[derive(Debug, Clone)]
pub struct FixedClock(Arc<RwLock<DateTime<Utc>>>);

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(Arc::new(RwLock::new(time)))
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// Moves the clock by `by`, saturating at the ends of the `DateTime` range
    pub fn advance(&self, by: TimeDelta) {
        let mut time = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *time = time.checked_add_signed(by).unwrap_or(if by < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }
}
