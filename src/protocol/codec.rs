use crate::time::CalendarTimestamp;
use crate::util::{bcd_bits, even_parity};
use super::telegram::Telegram;
use super::{
    DATE_PARITY_BIT, DAY_BITS, HOUR_BITS, HOUR_PARITY_BIT, LEAP_TELEGRAM_BITS, MINUTE_BITS,
    MINUTE_PARITY_BIT, MONTH_BITS, STANDARD_TIME_BIT, START_OF_TIME_BIT, SUMMER_TIME_BIT,
    TELEGRAM_BITS, WEEKDAY_BITS, YEAR_BITS,
};

/// Announces an upcoming leap second
const LEAP_ANNOUNCEMENT_BIT: usize = 19;

/// Flags carried in a telegram besides the calendar fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelegramFlags {
    /// Summer time instead of standard time
    pub summer_time: bool,
    /// Minute ends with an inserted leap second
    pub leap_second: bool,
}

/// Builds the telegram broadcast during the minute before `timestamp`.
///
/// Fields are written as-is, including the day of week, so a transmitter may
/// announce a weekday that differs from the computed one.
pub fn encode(timestamp: &CalendarTimestamp, flags: TelegramFlags) -> Telegram {
    let mut bits = [false; LEAP_TELEGRAM_BITS];

    bits[SUMMER_TIME_BIT] = flags.summer_time;
    bits[STANDARD_TIME_BIT] = !flags.summer_time;
    bits[LEAP_ANNOUNCEMENT_BIT] = flags.leap_second;
    bits[START_OF_TIME_BIT] = true;

    write_field(&mut bits, MINUTE_BITS.start, MINUTE_BITS.len(), timestamp.minute());
    bits[MINUTE_PARITY_BIT] = !even_parity(&bits[MINUTE_BITS]);

    write_field(&mut bits, HOUR_BITS.start, HOUR_BITS.len(), timestamp.hour());
    bits[HOUR_PARITY_BIT] = !even_parity(&bits[HOUR_BITS]);

    write_field(&mut bits, DAY_BITS.start, DAY_BITS.len(), timestamp.date());
    write_field(&mut bits, WEEKDAY_BITS.start, WEEKDAY_BITS.len(), timestamp.day_of_week());
    write_field(&mut bits, MONTH_BITS.start, MONTH_BITS.len(), timestamp.month());
    write_field(&mut bits, YEAR_BITS.start, YEAR_BITS.len(), timestamp.year());
    bits[DATE_PARITY_BIT] = !even_parity(&bits[DAY_BITS.start..DATE_PARITY_BIT]);

    let len = if flags.leap_second {
        LEAP_TELEGRAM_BITS
    } else {
        TELEGRAM_BITS
    };
    Telegram::from_array(bits, len)
}

fn write_field(bits: &mut [bool], start: usize, width: usize, value: u8) {
    for (i, bit) in bcd_bits(value, width).into_iter().enumerate() {
        bits[start + i] = bit;
    }
}
