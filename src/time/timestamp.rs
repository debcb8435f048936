use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::core::{Error, Result};
use super::util::{day_of_week, days_in_month};

/// Minutes in one day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Days from 2000-01-01 to 2100-01-01
pub const DAYS_PER_CENTURY: u32 = 100 * 365 + 25;

/// A point in time between 2000-01-01 00:00 and 2099-12-31 23:59 with
/// minute resolution.
///
/// Every date-affecting mutation re-normalizes the value and recomputes the
/// day of week, so a timestamp built through [`CalendarTimestamp::new`] or
/// the setters is always a valid calendar date. [`CalendarTimestamp::from_raw`]
/// is the one escape hatch, used when loading persisted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarTimestamp {
    minute: u8,
    hour: u8,
    date: u8,
    day_of_week: u8,
    month: u8,
    year: u8,
}

impl Default for CalendarTimestamp {
    fn default() -> Self {
        CalendarTimestamp::new(0, 0, 1, 0, 1, 0)
    }
}

impl CalendarTimestamp {
    /// Creates a normalized timestamp. The given day of week is replaced by
    /// the one computed from the date.
    pub fn new(minute: u8, hour: u8, date: u8, day_of_week: u8, month: u8, year: u8) -> Self {
        let mut timestamp = Self::from_raw(minute, hour, date, day_of_week, month, year);
        timestamp.check_date_validity(true);
        timestamp
    }

    /// Creates a timestamp without date validation. Minutes and hours are
    /// still reduced into range.
    pub fn from_raw(minute: u8, hour: u8, date: u8, day_of_week: u8, month: u8, year: u8) -> Self {
        CalendarTimestamp {
            minute: minute % 60,
            hour: hour % 24,
            date,
            day_of_week,
            month,
            year,
        }
    }

    /// Builds the timestamp `minutes` after 2000-01-01 00:00, wrapping at the
    /// end of the century.
    pub fn from_minutes_of_century(minutes: u32) -> Self {
        let minutes_of_day = minutes % MINUTES_PER_DAY;
        let mut days = (minutes / MINUTES_PER_DAY) % DAYS_PER_CENTURY;

        let mut year = 0u8;
        loop {
            let year_len = if year % 4 == 0 { 366 } else { 365 };
            if days < year_len {
                break;
            }
            days -= year_len;
            year += 1;
        }

        let mut month = 1u8;
        while days >= days_in_month(month, year) as u32 {
            days -= days_in_month(month, year) as u32;
            month += 1;
        }

        Self::new(
            (minutes_of_day % 60) as u8,
            (minutes_of_day / 60) as u8,
            days as u8 + 1,
            0,
            month,
            year,
        )
    }

    /// Converts a chrono date-time, dropping seconds.
    pub fn from_naive(datetime: &NaiveDateTime) -> Result<Self> {
        let year = datetime.year();
        if !(2000..=2099).contains(&year) {
            return Err(Error::invalid_date(format!(
                "year {} outside 2000..=2099",
                year
            )));
        }
        Ok(Self::new(
            datetime.minute() as u8,
            datetime.hour() as u8,
            datetime.day() as u8,
            0,
            datetime.month() as u8,
            (year - 2000) as u8,
        ))
    }

    /// Converts to a chrono date-time; `None` for un-normalized raw values.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.full_year() as i32, self.month as u32, self.date as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, 0)
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn date(&self) -> u8 {
        self.date
    }

    /// Day of week, Monday = 1 through Sunday = 7
    pub fn day_of_week(&self) -> u8 {
        self.day_of_week
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// Two-digit year
    pub fn year(&self) -> u8 {
        self.year
    }

    pub fn full_year(&self) -> u16 {
        2000 + self.year as u16
    }

    pub fn minutes_of_day(&self) -> u16 {
        self.minute as u16 + 60 * self.hour as u16
    }

    /// Minutes of the day folded onto a 12 hour dial, 0..=719
    pub fn minutes_of_12h_day(&self) -> u16 {
        self.minutes_of_day() % (12 * 60)
    }

    /// Minutes since Monday 00:00
    pub fn minutes_of_week(&self) -> u32 {
        self.day_of_week.saturating_sub(1) as u32 * MINUTES_PER_DAY + self.minutes_of_day() as u32
    }

    /// Minutes since 2000-01-01 00:00. This is the ordering key for timestamps
    /// and the basis for elapsed-time comparisons.
    pub fn minutes_of_century(&self) -> u32 {
        let year = self.year as u32;
        let mut days = year * 365 + (year + 3) / 4;
        for month in 1..self.month {
            days += days_in_month(month, self.year) as u32;
        }
        days += self.date.saturating_sub(1) as u32;
        days * MINUTES_PER_DAY + self.minutes_of_day() as u32
    }

    /// Stores `minute mod 60`; never carries into the hour.
    pub fn set_minutes(&mut self, minute: u8) {
        self.minute = minute % 60;
    }

    /// Stores `hour mod 24`; never carries into the date.
    pub fn set_hours(&mut self, hour: u8) {
        self.hour = hour % 24;
    }

    /// Overrides the day of week without touching the date.
    pub fn set_day_of_week(&mut self, day_of_week: u8) {
        self.day_of_week = day_of_week;
    }

    pub fn set_date(&mut self, date: u8, overflow: bool) {
        self.normalize_fields(date as u16, self.month as u16, self.year as u16, overflow);
    }

    pub fn set_month(&mut self, month: u8, overflow: bool) {
        self.normalize_fields(self.date as u16, month as u16, self.year as u16, overflow);
    }

    pub fn set_year(&mut self, year: u8, overflow: bool) {
        self.normalize_fields(self.date as u16, self.month as u16, year as u16, overflow);
    }

    /// Replaces all fields. With `check_validity` unset the values are kept
    /// as given, which is how stale persisted values are loaded.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        minute: u8,
        hour: u8,
        date: u8,
        day_of_week: u8,
        month: u8,
        year: u8,
        check_validity: bool,
    ) {
        *self = Self::from_raw(minute, hour, date, day_of_week, month, year);
        if check_validity {
            self.check_date_validity(true);
        }
    }

    /// Copies all fields from `other`
    pub fn set_from(&mut self, other: &CalendarTimestamp, check_validity: bool) {
        *self = *other;
        if check_validity {
            self.check_date_validity(true);
        }
    }

    pub fn inc_minutes(&mut self, minutes: u8) {
        self.minute = ((self.minute as u16 + minutes as u16) % 60) as u8;
    }

    pub fn inc_hours(&mut self, hours: u8) {
        self.hour = ((self.hour as u16 + hours as u16) % 24) as u8;
    }

    pub fn inc_date(&mut self, days: u8, overflow: bool) {
        self.normalize_fields(
            self.date as u16 + days as u16,
            self.month as u16,
            self.year as u16,
            overflow,
        );
    }

    pub fn inc_month(&mut self, months: u8, overflow: bool) {
        self.normalize_fields(
            self.date as u16,
            self.month as u16 + months as u16,
            self.year as u16,
            overflow,
        );
    }

    pub fn inc_year(&mut self, years: u8, overflow: bool) {
        self.normalize_fields(
            self.date as u16,
            self.month as u16,
            self.year as u16 + years as u16,
            overflow,
        );
    }

    /// Shifts the time by a signed number of hours, carrying across day,
    /// month and year boundaries in both directions.
    pub fn add_sub_hours_overflow(&mut self, hours: i8) {
        let mut sum = self.hour as i16 + hours as i16;
        let mut date = self.date as i16;
        let mut month = self.month.max(1) as i16;
        let mut year = self.year as i16;

        while sum < 0 {
            sum += 24;
            date -= 1;
            if date < 1 {
                month -= 1;
                if month < 1 {
                    month = 12;
                    year = if year == 0 { 99 } else { year - 1 };
                }
                date = days_in_month(month as u8, year as u8) as i16;
            }
        }
        date += sum / 24;
        self.hour = (sum % 24) as u8;

        self.normalize_fields(date as u16, month as u16, year as u16, true);
    }

    /// Advances by one minute with full carry, the tick of a free-running
    /// local clock.
    pub fn advance_minute(&mut self) {
        *self = Self::from_minutes_of_century(self.minutes_of_century() + 1);
    }

    /// Brings raw values back into a valid calendar date, carrying overflow.
    pub fn normalize(&mut self) {
        self.check_date_validity(true);
    }

    /// Clamps and reduces month and date into range, carrying into the next
    /// higher unit when `overflow` is set, then recomputes the day of week.
    pub fn check_date_validity(&mut self, overflow: bool) {
        self.normalize_fields(self.date as u16, self.month as u16, self.year as u16, overflow);
    }

    fn normalize_fields(&mut self, mut date: u16, mut month: u16, mut year: u16, overflow: bool) {
        if month < 1 {
            month = 1;
        }
        while month > 12 {
            month -= 12;
            if overflow {
                year += 1;
            }
        }

        if date < 1 {
            date = 1;
        }
        loop {
            let month_len = days_in_month(month as u8, (year % 100) as u8) as u16;
            if date <= month_len {
                break;
            }
            date -= month_len;
            if overflow {
                month += 1;
                if month > 12 {
                    month -= 12;
                    year += 1;
                }
            }
        }

        self.date = date as u8;
        self.month = month as u8;
        self.year = (year % 100) as u8;
        self.day_of_week = day_of_week(self.date, self.month, self.year);
    }
}

impl PartialOrd for CalendarTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalendarTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.minutes_of_century()
            .cmp(&other.minutes_of_century())
            .then_with(|| {
                (self.year, self.month, self.date, self.hour, self.minute, self.day_of_week).cmp(&(
                    other.year,
                    other.month,
                    other.date,
                    other.hour,
                    other.minute,
                    other.day_of_week,
                ))
            })
    }
}

impl fmt::Display for CalendarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} {:02}.{:02}.{:02}",
            self.hour, self.minute, self.date, self.month, self.year
        )
    }
}
