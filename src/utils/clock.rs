use chrono::{FixedOffset, Local, NaiveDate, Offset, Utc};

/// Calendar clock pinned to one UTC offset, so "today" does not depend on
/// where the process happens to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        LocalClock { offset }
    }

    /// Uses the host's current offset.
    pub fn host() -> Self {
        LocalClock::new(Local::now().offset().fix())
    }

    pub fn utc() -> Self {
        LocalClock::new(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}
