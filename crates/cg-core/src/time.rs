//! Simulation time model.
//!
//! Time is an integer count of milliseconds since the start of an invocation.
//! Every schedule field (offset, response, cycle) uses the same unit, so all
//! scheduling arithmetic stays exact.

use std::fmt;

/// An absolute simulation time in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SimTime(pub i32);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Return the time `ms` milliseconds after `self`.
    #[inline]
    pub fn offset(self, ms: i32) -> SimTime {
        SimTime(self.0 + ms)
    }

    #[inline]
    pub fn as_millis(self) -> i32 {
        self.0
    }
}

impl std::ops::Add<i32> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i32) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = i32;
    #[inline]
    fn sub(self, rhs: SimTime) -> i32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
