//! Calendar time source for record timestamps
//!
//! Looking up the local time zone on every record is expensive, so the
//! local offset is cached per UTC day and only recomputed for instants
//! outside the day of the last lookup.

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike};
use parking_lot::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: i64 = 86_400;

/// Broken-down calendar time with second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Four digit year
    pub year: u16,
    /// Month, 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-60
    pub second: u8,
}

impl Timestamp {
    /// Sentinel used when the system clock cannot be read
    pub const ZERO: Timestamp = Timestamp {
        year: 0,
        month: 0,
        day: 0,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Break down seconds since the Unix epoch, read as wall-clock time.
    ///
    /// Values outside the four digit year range map to [`Timestamp::ZERO`].
    pub fn from_unix(secs: i64) -> Self {
        let Some(time) = DateTime::from_timestamp(secs, 0) else {
            return Self::ZERO;
        };
        let Ok(year) = u16::try_from(time.year()) else {
            return Self::ZERO;
        };
        if year > 9999 {
            return Self::ZERO;
        }

        Self {
            year,
            month: time.month() as u8,
            day: time.day() as u8,
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second() as u8,
        }
    }
}

#[derive(Debug)]
struct OffsetCache {
    offset_secs: i64,
    valid_from: i64,
    valid_until: i64,
}

impl OffsetCache {
    const fn covers(&self, unix_secs: i64) -> bool {
        self.valid_from <= unix_secs && unix_secs < self.valid_until
    }
}

#[derive(Debug)]
enum Zone {
    Utc,
    Local(RwLock<OffsetCache>),
    Fixed(i64),
}

/// Produces the current calendar time in UTC or local time
#[derive(Debug)]
pub struct Clock {
    zone: Zone,
}

impl Clock {
    /// Create a clock, in UTC when `utc` is set and local time otherwise
    pub fn new(utc: bool) -> Self {
        if utc { Self::utc() } else { Self::local() }
    }

    /// Clock reporting UTC
    pub const fn utc() -> Self {
        Self { zone: Zone::Utc }
    }

    /// Clock reporting the system's local time
    pub fn local() -> Self {
        Self {
            zone: Zone::Local(RwLock::new(OffsetCache {
                offset_secs: 0,
                valid_from: i64::MAX,
                valid_until: i64::MIN,
            })),
        }
    }

    /// Clock reporting time at a fixed offset east of UTC
    pub const fn fixed_offset(offset_secs: i32) -> Self {
        Self {
            zone: Zone::Fixed(offset_secs as i64),
        }
    }

    /// Whether this clock reports UTC
    pub const fn is_utc(&self) -> bool {
        matches!(self.zone, Zone::Utc)
    }

    /// Current calendar time, or [`Timestamp::ZERO`] if the system clock
    /// reads before the epoch
    pub fn now(&self) -> Timestamp {
        match unix_now() {
            Some(secs) => self.at(secs),
            None => Timestamp::ZERO,
        }
    }

    /// Calendar time of the given instant in this clock's zone
    pub fn at(&self, unix_secs: i64) -> Timestamp {
        Timestamp::from_unix(unix_secs.saturating_add(self.offset_at(unix_secs)))
    }

    /// Offset east of UTC in seconds that applies at `unix_secs`.
    ///
    /// The local offset is looked up once per UTC day and reused for any
    /// instant of that day.
    pub fn offset_at(&self, unix_secs: i64) -> i64 {
        match &self.zone {
            Zone::Utc => 0,
            Zone::Fixed(offset) => *offset,
            Zone::Local(cache) => {
                {
                    let cache = cache.read();
                    if cache.covers(unix_secs) {
                        return cache.offset_secs;
                    }
                }

                let mut cache = cache.write();
                // Another writer may have refreshed it while we waited.
                if !cache.covers(unix_secs) {
                    cache.offset_secs = local_offset(unix_secs);
                    cache.valid_until = next_midnight(unix_secs);
                    cache.valid_from = cache.valid_until - SECONDS_PER_DAY;
                }
                cache.offset_secs
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::local()
    }
}

fn unix_now() -> Option<i64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(elapsed.as_secs()).ok()
}

/// First second of the UTC day following `t`
fn next_midnight(t: i64) -> i64 {
    t - t.rem_euclid(SECONDS_PER_DAY) + SECONDS_PER_DAY
}

fn local_offset(unix_secs: i64) -> i64 {
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(utc) => i64::from(
            Local
                .offset_from_utc_datetime(&utc.naive_utc())
                .fix()
                .local_minus_utc(),
        ),
        None => 0,
    }
}
