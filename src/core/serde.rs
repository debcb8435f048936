use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

use crate::time::CalendarTimestamp;

/// Serializes Duration as seconds
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    duration.as_secs_f64().serialize(serializer)
}

/// Deserializes Duration from seconds
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(serde::de::Error::custom(format!("invalid duration: {}", secs)));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Serializes a timestamp as its six raw fields:
/// minute, hour, date, day of week, month, year
pub fn serialize_timestamp<S>(
    timestamp: &CalendarTimestamp,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    (
        timestamp.minute(),
        timestamp.hour(),
        timestamp.date(),
        timestamp.day_of_week(),
        timestamp.month(),
        timestamp.year(),
    )
        .serialize(serializer)
}

/// Deserializes a timestamp from six raw fields without normalizing them
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<CalendarTimestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let (minute, hour, date, day_of_week, month, year): (u8, u8, u8, u8, u8, u8) =
        Deserialize::deserialize(deserializer)?;
    Ok(CalendarTimestamp::from_raw(
        minute,
        hour,
        date,
        day_of_week,
        month,
        year,
    ))
}
