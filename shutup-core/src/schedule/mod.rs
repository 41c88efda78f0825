//! src/schedule/mod.rs
//!
//! Daily quiet windows. A schedule is a set of `HH:MM-HH:MM` ranges that are OR-combined;
//! ranges whose start is later than their end wrap around midnight.

use std::fmt;

use chrono::{DateTime, TimeZone};
use tracing::warn;

use crate::utils::time::minute_of_day;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// One daily range, both ends inclusive, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u16,
    pub end: u16,
}

impl TimeWindow {
    pub fn new(start: u16, end: u16) -> Option<Self> {
        if start < MINUTES_PER_DAY && end < MINUTES_PER_DAY {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// `start > end`: the window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, minute: u16) -> bool {
        if self.wraps_midnight() {
            minute >= self.start || minute <= self.end
        } else {
            self.start <= minute && minute <= self.end
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

/// A line of schedule text that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWarning {
    /// 1-based line number in the source text.
    pub line: usize,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct TimeRangeSet {
    windows: Vec<TimeWindow>,
    warnings: Vec<ScheduleWarning>,
}

impl TimeRangeSet {
    /// Parses newline-separated `HH:MM-HH:MM` lines. Blank lines and `#` comments are
    /// ignored; malformed lines are skipped and recorded in [`TimeRangeSet::warnings`].
    pub fn parse(text: &str) -> Self {
        let mut set = TimeRangeSet::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_window(line) {
                Ok(window) => set.windows.push(window),
                Err(reason) => {
                    warn!("Skipping quiet-hours line {} '{}': {}", idx + 1, line, reason);
                    set.warnings.push(ScheduleWarning {
                        line: idx + 1,
                        text: line.to_string(),
                        reason,
                    });
                }
            }
        }

        set
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    pub fn warnings(&self) -> &[ScheduleWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn is_active_at_minute(&self, minute: u16) -> bool {
        self.windows.iter().any(|w| w.contains(minute))
    }

    /// Whether `now`'s wall-clock minute falls into any window. Empty sets are never active.
    pub fn is_active<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.is_active_at_minute(minute_of_day(now))
    }
}

fn parse_window(line: &str) -> Result<TimeWindow, String> {
    let (start, end) = line
        .split_once('-')
        .ok_or_else(|| "expected HH:MM-HH:MM".to_string())?;
    let start = parse_clock(start.trim())?;
    let end = parse_clock(end.trim())?;
    TimeWindow::new(start, end).ok_or_else(|| "time out of range".to_string())
}

fn parse_clock(s: &str) -> Result<u16, String> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| format!("'{}' is not HH:MM", s))?;

    let digits = |part: &str| -> Result<u16, String> {
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("'{}' is not HH:MM", s));
        }
        part.parse::<u16>().map_err(|e| e.to_string())
    };

    let hour = digits(h)?;
    let minute = digits(m)?;
    if hour > 23 {
        return Err(format!("hour {} out of range", hour));
    }
    if minute > 59 {
        return Err(format!("minute {} out of range", minute));
    }
    Ok(hour * 60 + minute)
}
