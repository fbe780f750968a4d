//! Strongly typed identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Link and channel ids come straight
//! from system configurations, so the inner integer is `pub`.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// The id `n` steps after `self`, or `None` if that would reach
            /// [`INVALID`](Self::INVALID) or overflow.
            #[inline]
            pub fn checked_offset(self, n: $inner) -> Option<$name> {
                self.0.checked_add(n).map($name).filter(|id| *id != Self::INVALID)
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(n: $inner) -> $name {
                $name(n)
            }
        }
    };
}

typed_id! {
    /// Identity of one live agent within an invocation.
    pub struct AgentId(u32);
}

typed_id! {
    /// Identity of a channel, unique within one agent.
    pub struct ChannelId(u32);
}

typed_id! {
    /// Component-local input or output link number.
    pub struct LinkId(u32);
}

typed_id! {
    /// Identity of a loaded observation module.
    pub struct ObserverId(u32);
}
