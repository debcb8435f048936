//! Calendar time for the radio clock
//!
//! [`CalendarTimestamp`] is the single representation of a point in time used
//! throughout the crate: the decoder produces it, the quality gate compares it
//! and the host clock ticks it.
//!
//! The calendar is restricted to the years 2000 to 2099. Inside that window
//! every year divisible by four is a leap year, so no century exception is
//! needed and the two-digit year carries all the information.
//!
//! # Examples
//!
//! ```
//! use wordclock_sync::time::CalendarTimestamp;
//!
//! // 23:30 on 28.02.2024, shifted one hour forward for a manual time zone
//! let mut ts = CalendarTimestamp::new(30, 23, 28, 0, 2, 24);
//! ts.add_sub_hours_overflow(1);
//! assert_eq!(ts.to_string(), "00:30 29.02.24");
//! assert_eq!(ts.day_of_week(), 4);
//! ```

mod timestamp;

pub use self::timestamp::{CalendarTimestamp, DAYS_PER_CENTURY, MINUTES_PER_DAY};

/// Calendar arithmetic for the 2000 to 2099 window
pub mod util {
    /// Returns true if the two-digit `year` is a leap year
    pub fn is_leap_year(year: u8) -> bool {
        year % 4 == 0
    }

    /// Days of `month` in the two-digit `year`; 0 for an invalid month
    pub fn days_in_month(month: u8, year: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Day of week (Monday = 1 .. Sunday = 7) by Schwerdtfeger's congruence.
    ///
    /// January and February count towards the previous year, which for
    /// 2000 is year -1; Euclidean division keeps the formula exact there.
    pub fn day_of_week(date: u8, month: u8, year: u8) -> u8 {
        let g = year as i32 - if month < 3 { 1 } else { 0 };
        let e = match month {
            2 | 6 => 3,
            3 | 11 => 2,
            4 | 7 => 5,
            8 => 1,
            9 | 12 => 4,
            10 => 6,
            _ => 0,
        };
        let w = (date as i32 + e + g + g.div_euclid(4)).rem_euclid(7);
        if w == 0 {
            7
        } else {
            w as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn test_days_in_month_matches_chrono() {
        for year in 0..100u8 {
            for month in 1..=12u8 {
                let first = NaiveDate::from_ymd_opt(2000 + year as i32, month as u32, 1).unwrap();
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(2001 + year as i32, 1, 1).unwrap()
                } else {
                    NaiveDate::from_ymd_opt(2000 + year as i32, month as u32 + 1, 1).unwrap()
                };
                let expected = (next - first).num_days() as u8;
                assert_eq!(util::days_in_month(month, year), expected, "{}-{}", year, month);
            }
        }
    }

    #[test]
    fn test_february_leap_rule() {
        assert_eq!(util::days_in_month(2, 0), 29);
        assert_eq!(util::days_in_month(2, 24), 29);
        assert_eq!(util::days_in_month(2, 23), 28);
        assert_eq!(util::days_in_month(2, 99), 28);
        assert_eq!(util::days_in_month(13, 24), 0);
    }

    #[test]
    fn test_day_of_week_start_of_century() {
        // 2000-01-01 was a Saturday, 2000-02-29 a Tuesday
        assert_eq!(util::day_of_week(1, 1, 0), 6);
        assert_eq!(util::day_of_week(29, 2, 0), 2);

        let date = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
        assert_eq!(date.weekday().number_from_monday(), 2);
    }
}
