//! Cron trigger specification: each field is a fixed value or "every".

use std::fmt;

use crate::error::SchedulerError;

/// One cron field: a fixed value or the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronField {
    Every,
    At(u32),
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Every => f.write_str("*"),
            Self::At(v) => write!(f, "{v}"),
        }
    }
}

impl CronField {
    fn validate(
        self,
        field: &'static str,
        min: u32,
        max: u32,
    ) -> Result<(), SchedulerError> {
        match self {
            Self::Every => Ok(()),
            Self::At(value) if value >= min && value <= max => Ok(()),
            Self::At(value) => Err(SchedulerError::InvalidField {
                field,
                value,
                min,
                max,
            }),
        }
    }
}

/// Recurring trigger specification with minute-level granularity.
///
/// `day_of_week` uses standard cron numbering: 0 = Sunday. The `second`
/// field defaults to a fixed 0 so a schedule fires at most once per minute;
/// it is only loosened in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSchedule {
    pub second: CronField,
    pub minute: CronField,
    pub hour: CronField,
    pub day: CronField,
    pub month: CronField,
    pub day_of_week: CronField,
}

impl Default for CronSchedule {
    /// Every minute, at second 0.
    fn default() -> Self {
        Self {
            second: CronField::At(0),
            minute: CronField::Every,
            hour: CronField::Every,
            day: CronField::Every,
            month: CronField::Every,
            day_of_week: CronField::Every,
        }
    }
}

impl CronSchedule {
    /// Fire once per day at the given wall-clock time.
    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self {
            minute: CronField::At(minute),
            hour: CronField::At(hour),
            ..Self::default()
        }
    }

    /// Fire at minute 0 of every hour.
    pub fn hourly() -> Self {
        Self {
            minute: CronField::At(0),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        self.second.validate("second", 0, 59)?;
        self.minute.validate("minute", 0, 59)?;
        self.hour.validate("hour", 0, 23)?;
        self.day.validate("day", 1, 31)?;
        self.month.validate("month", 1, 12)?;
        self.day_of_week.validate("day_of_week", 0, 6)?;
        Ok(())
    }

    /// Render the six-field cron expression the underlying scheduler parses.
    pub fn expression(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.second, self.minute, self.hour, self.day, self.month, self.day_of_week
        )
    }
}
