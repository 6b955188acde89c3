//! Utility functions for ferrozip-core

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use filetime::FileTime;
use std::time::SystemTime;

/// An MS-DOS date and time pair as stored in zip headers.
///
/// Zip stores local wall-clock time with two-second resolution, limited to
/// the years 1980 through 2107.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00
    pub const MIN: DosDateTime = DosDateTime {
        date: 1 << 5 | 1,
        time: 0,
    };

    /// 2107-12-31 23:59:58
    pub const MAX: DosDateTime = DosDateTime {
        date: 127 << 9 | 12 << 5 | 31,
        time: 23 << 11 | 59 << 5 | 29,
    };

    /// Encode a naive local date-time.
    ///
    /// Times before 1980 clamp to [`DosDateTime::MIN`] and times after 2107
    /// clamp to [`DosDateTime::MAX`]. Odd seconds round down.
    pub fn from_naive(naive: NaiveDateTime) -> Self {
        if naive.year() < 1980 {
            return Self::MIN;
        }
        if naive.year() > 2107 {
            return Self::MAX;
        }

        DosDateTime {
            date: ((naive.year() - 1980) as u16) << 9
                | (naive.month() as u16) << 5
                | naive.day() as u16,
            time: (naive.hour() as u16) << 11
                | (naive.minute() as u16) << 5
                | (naive.second() / 2) as u16,
        }
    }

    /// Encode a file modification time in the local time zone.
    pub fn from_system_time(time: SystemTime) -> Self {
        let local: DateTime<Local> = time.into();
        Self::from_naive(local.naive_local())
    }

    /// Decode into a naive local date-time.
    ///
    /// Returns `None` for field combinations that are not a real date.
    pub fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            1980 + i32::from(self.date >> 9),
            u32::from(self.date >> 5 & 0x0f),
            u32::from(self.date & 0x1f),
        )?
        .and_hms_opt(
            u32::from(self.time >> 11),
            u32::from(self.time >> 5 & 0x3f),
            u32::from(self.time & 0x1f) * 2,
        )
    }
}

/// Local wall-clock time of a Unix timestamp.
pub fn local_from_unix(seconds: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_opt(seconds, 0)
        .earliest()
        .map(|local| local.naive_local())
}

/// Interpret a naive local date-time as a file system timestamp.
pub fn to_file_time(naive: NaiveDateTime) -> FileTime {
    let seconds = match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.timestamp(),
        // Skipped by a DST transition
        None => naive.and_utc().timestamp(),
    };
    FileTime::from_unix_time(seconds, 0)
}
