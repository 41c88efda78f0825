use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

/// Convert a point in time to fractional epoch seconds (millisecond precision).
pub fn to_epoch_f64<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    dt.timestamp_millis() as f64 / 1000.0
}

/// Convert fractional epoch seconds to local time.
/// Out-of-range values fall back to the epoch itself.
pub fn from_epoch_f64(epoch: f64) -> DateTime<Local> {
    let millis = (epoch * 1000.0).round() as i64;
    Local
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Local))
}

/// Returns the current epoch seconds.
pub fn current_epoch_f64() -> f64 {
    to_epoch_f64(&Utc::now())
}

/// Minute of the day, 0..=1439, in the timezone of `dt`.
pub fn minute_of_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> u16 {
    (dt.hour() * 60 + dt.minute()) as u16
}

/// `YYYY-mm-dd HH:MM:SS` in local time, as shown in replies.
pub fn format_local(epoch: f64) -> String {
    from_epoch_f64(epoch).format("%Y-%m-%d %H:%M:%S").to_string()
}
