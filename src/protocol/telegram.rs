use std::fmt;

use crate::core::{Error, Result, TelegramField};
use crate::time::{util::days_in_month, CalendarTimestamp};
use crate::util::{bcd_digits_valid, bcd_value, even_parity};
use super::{
    DATE_PARITY_BIT, DAY_BITS, HOUR_BITS, HOUR_PARITY_BIT, LEAP_SECOND_BIT,
    LEAP_TELEGRAM_BITS, MINUTE_BITS, MINUTE_PARITY_BIT, MONTH_BITS, STANDARD_TIME_BIT,
    START_OF_MINUTE_BIT, START_OF_TIME_BIT, SUMMER_TIME_BIT, TELEGRAM_BITS, WEEKDAY_BITS,
    YEAR_BITS,
};

/// Bits received during one minute, with a bounded write cursor
#[derive(Clone, PartialEq, Eq)]
pub struct Telegram {
    bits: [bool; LEAP_TELEGRAM_BITS],
    len: usize,
}

impl Default for Telegram {
    fn default() -> Self {
        Telegram::new()
    }
}

impl Telegram {
    /// Creates an empty telegram
    pub fn new() -> Self {
        Telegram {
            bits: [false; LEAP_TELEGRAM_BITS],
            len: 0,
        }
    }

    pub(super) fn from_array(bits: [bool; LEAP_TELEGRAM_BITS], len: usize) -> Self {
        Telegram {
            bits,
            len: len.min(LEAP_TELEGRAM_BITS),
        }
    }

    /// Appends the bit of the next second.
    ///
    /// A full telegram means a minute marker was missed; the bit is rejected
    /// and the caller is expected to resynchronize.
    pub fn push(&mut self, bit: bool) -> Result<()> {
        if self.len >= LEAP_TELEGRAM_BITS {
            return Err(Error::desync(format!(
                "telegram overflow after {} bits without minute marker",
                self.len
            )));
        }
        self.bits[self.len] = bit;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once a regular or leap-second telegram has been collected
    pub fn is_complete(&self) -> bool {
        self.len == TELEGRAM_BITS || self.len == LEAP_TELEGRAM_BITS
    }

    pub fn clear(&mut self) {
        self.bits = [false; LEAP_TELEGRAM_BITS];
        self.len = 0;
    }

    pub fn bit(&self, index: usize) -> Option<bool> {
        self.as_slice().get(index).copied()
    }

    /// Overwrites an already received bit
    pub fn set_bit(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= self.len {
            return Err(Error::framing(format!(
                "bit {} beyond telegram length {}",
                index, self.len
            )));
        }
        self.bits[index] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits[..self.len]
    }

    /// Summer time flag, `None` unless exactly one of the two zone bits is set
    pub fn summer_time(&self) -> Option<bool> {
        match (self.bit(SUMMER_TIME_BIT)?, self.bit(STANDARD_TIME_BIT)?) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    /// Decodes the minute, hour and date fields.
    ///
    /// Each field is guarded by an even parity bit; the first field failing
    /// its parity or range check is reported. The returned timestamp keeps the
    /// broadcast day of week.
    pub fn decode(&self) -> Result<CalendarTimestamp> {
        if !self.is_complete() {
            return Err(Error::TelegramLength(self.len));
        }
        let bits = self.as_slice();

        if bits[START_OF_MINUTE_BIT] {
            return Err(Error::framing("start of minute bit set"));
        }
        if !bits[START_OF_TIME_BIT] {
            return Err(Error::framing("start of time bit missing"));
        }
        if self.len == LEAP_TELEGRAM_BITS && bits[LEAP_SECOND_BIT] {
            return Err(Error::framing("leap second bit set"));
        }

        if !even_parity(&bits[MINUTE_BITS.start..=MINUTE_PARITY_BIT]) {
            return Err(Error::Parity(TelegramField::Minute));
        }
        let minute = checked_bcd(&bits[MINUTE_BITS], TelegramField::Minute)?;
        if minute > 59 {
            return Err(Error::OutOfRange(TelegramField::Minute));
        }

        if !even_parity(&bits[HOUR_BITS.start..=HOUR_PARITY_BIT]) {
            return Err(Error::Parity(TelegramField::Hour));
        }
        let hour = checked_bcd(&bits[HOUR_BITS], TelegramField::Hour)?;
        if hour > 23 {
            return Err(Error::OutOfRange(TelegramField::Hour));
        }

        if !even_parity(&bits[DAY_BITS.start..=DATE_PARITY_BIT]) {
            return Err(Error::Parity(TelegramField::Date));
        }
        let date = checked_bcd(&bits[DAY_BITS], TelegramField::Date)?;
        let day_of_week = bcd_value(&bits[WEEKDAY_BITS]);
        let month = checked_bcd(&bits[MONTH_BITS], TelegramField::Date)?;
        let year = checked_bcd(&bits[YEAR_BITS], TelegramField::Date)?;
        if !(1..=12).contains(&month)
            || !(1..=7).contains(&day_of_week)
            || date < 1
            || date > days_in_month(month, year)
        {
            return Err(Error::OutOfRange(TelegramField::Date));
        }

        let mut timestamp = CalendarTimestamp::new(minute, hour, date, day_of_week, month, year);
        timestamp.set_day_of_week(day_of_week);
        Ok(timestamp)
    }
}

fn checked_bcd(bits: &[bool], field: TelegramField) -> Result<u8> {
    if !bcd_digits_valid(bits) {
        return Err(Error::OutOfRange(field));
    }
    Ok(bcd_value(bits))
}

impl fmt::Debug for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: String = self
            .as_slice()
            .iter()
            .map(|bit| if *bit { '1' } else { '0' })
            .collect();
        f.debug_struct("Telegram")
            .field("len", &self.len)
            .field("bits", &bits)
            .finish()
    }
}
