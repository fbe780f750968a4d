//! Per-component schedule metadata consumed by the external scheduler.

use crate::{CoreError, CoreResult};

/// Timing blueprint of one component.
///
/// Init components run once before the cyclic phase, so their timing fields
/// are meaningless and always stored as zero.  Cyclic components must have a
/// strictly positive cycle time.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleMetadata {
    is_init:       bool,
    priority:      i32,
    offset_time:   i32,
    response_time: i32,
    cycle_time:    i32,
}

impl ScheduleMetadata {
    /// Validate and build schedule metadata.
    ///
    /// For init components the three timing fields are forced to 0 regardless
    /// of what was passed in.
    pub fn new(
        is_init:       bool,
        priority:      i32,
        offset_time:   i32,
        response_time: i32,
        cycle_time:    i32,
    ) -> CoreResult<Self> {
        if is_init {
            return Ok(Self::init(priority));
        }
        if cycle_time <= 0 {
            return Err(CoreError::Schedule(format!(
                "cyclic component requires cycle time > 0, got {cycle_time}"
            )));
        }
        if offset_time < 0 || response_time < 0 {
            return Err(CoreError::Schedule(format!(
                "negative timing (offset {offset_time}, response {response_time})"
            )));
        }
        Ok(Self { is_init, priority, offset_time, response_time, cycle_time })
    }

    /// Metadata for an init component with the given priority.
    pub fn init(priority: i32) -> Self {
        Self {
            is_init:       true,
            priority,
            offset_time:   0,
            response_time: 0,
            cycle_time:    0,
        }
    }

    #[inline]
    pub fn is_init(&self) -> bool {
        self.is_init
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub fn offset_time(&self) -> i32 {
        self.offset_time
    }

    #[inline]
    pub fn response_time(&self) -> i32 {
        self.response_time
    }

    #[inline]
    pub fn cycle_time(&self) -> i32 {
        self.cycle_time
    }
}
