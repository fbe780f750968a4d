//! Signal values published on channels.
//!
//! A producer publishes a fresh [`Signal`] per cycle.  The value is immutable
//! once published and shared by reference count with every consumer, so
//! fan-out never copies the payload.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value that can travel along a channel.
pub trait SignalInterface: Any + fmt::Debug + Send + Sync {
    /// Short type tag used in log output, e.g. `"SensorDataSignal"`.
    fn kind(&self) -> &'static str;

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

impl dyn SignalInterface {
    /// Downcast to a concrete signal type.
    pub fn downcast_ref<T: SignalInterface>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Shared, immutable signal handle.
pub type Signal = Arc<dyn SignalInterface>;

/// Generic single-value signal for plugins that do not need a dedicated type.
#[derive(Clone, PartialEq, Debug)]
pub struct ValueSignal<T> {
    pub value: T,
}

impl<T: fmt::Debug + Send + Sync + 'static> ValueSignal<T> {
    /// Wrap `value` into a ready-to-publish [`Signal`].
    pub fn shared(value: T) -> Signal {
        Arc::new(ValueSignal { value })
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> SignalInterface for ValueSignal<T> {
    fn kind(&self) -> &'static str {
        "ValueSignal"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
