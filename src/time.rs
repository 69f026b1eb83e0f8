// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Packed temporal formats (MySql 5.6.4+) and their string renderings.
//!
//! `TIMESTAMP2`, `DATETIME2` and `TIME2` store their integer part big-endian
//! with a bias, followed by a fractional tail whose width depends on the
//! column's fractional-second precision (`dec`, 0..=6).

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::{error::Result, io::ParseBuf};

pub(crate) const DATETIMEF_INT_OFS: i64 = 0x80_0000_0000;
pub(crate) const TIMEF_INT_OFS: i64 = 0x80_0000;
pub(crate) const TIMEF_OFS: i64 = 0x8000_0000_0000;

/// Packed DATETIME integer value of `1970-01-01 00:00:00`. Values below it
/// (or with a zero month/day) only have a string rendering.
const DATETIMEF_UNIX_EPOCH: i64 = 107_420_450_816;

/// A decoded TIMESTAMP/DATETIME value that still remembers its fractional
/// precision and, for the TIMESTAMP family, the timezone to render string
/// forms in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FracTime {
    pub time: DateTime<Utc>,
    /// Fractional-second precision, 0..=6.
    pub dec: u16,
    /// Timezone applied when formatting. `None` formats in UTC.
    pub tz: Option<Tz>,
}

impl fmt::Display for FracTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = match self.tz {
            Some(tz) => self
                .time
                .with_timezone(&tz)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => self.time.format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        f.write_str(&formatted)?;
        write_frac(f, self.time.nanosecond() / 1_000, self.dec)
    }
}

/// A temporal value on its way out of the codec: either already a string
/// (zero sentinels, out-of-range values, TIME) or a time-point that the
/// caller renders according to `parse_time`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemporalValue {
    Str(String),
    Frac(FracTime),
}

fn write_frac(f: &mut impl fmt::Write, usec: u32, dec: u16) -> fmt::Result {
    if dec == 0 {
        return Ok(());
    }
    let dec = dec.min(6) as usize;
    let digits = format!("{:06}", usec % 1_000_000);
    write!(f, ".{}", &digits[..dec])
}

/// `0000-00-00 00:00:00` extended with `dec` fractional digits of `usec`.
pub(crate) fn format_zero_time(usec: u32, dec: u16) -> String {
    let mut s = String::from("0000-00-00 00:00:00");
    let _ = write_frac(&mut s, usec, dec);
    s
}

/// Civil datetime rendered with `dec` fractional digits of `usec`.
pub(crate) fn format_datetime(
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    usec: u32,
    dec: u16,
) -> String {
    let mut s = format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
    let _ = write_frac(&mut s, usec, dec);
    s
}

/// Reads the fractional tail shared by TIMESTAMP2 and DATETIME2 and returns
/// it as microseconds.
fn eat_frac_usec(buf: &mut ParseBuf<'_>, dec: u16) -> Result<i64> {
    Ok(match dec {
        1 | 2 => buf.eat_u8()? as i64 * 10_000,
        3 | 4 => buf.eat_uint_be(2)? as i64 * 100,
        5 | 6 => buf.eat_uint_be(3)? as i64,
        _ => 0,
    })
}

/// `TIMESTAMP2(dec)`: 4 big-endian bytes of unix seconds plus the
/// fractional tail.
pub(crate) fn decode_timestamp2(
    buf: &mut ParseBuf<'_>,
    dec: u16,
    tz: Option<Tz>,
) -> Result<TemporalValue> {
    let sec = buf.eat_uint_be(4)? as i64;
    let usec = eat_frac_usec(buf, dec)?;

    if sec == 0 {
        return Ok(TemporalValue::Str(format_zero_time(usec as u32, dec)));
    }

    // u32 seconds with sub-second nanos are always representable
    let time = Utc
        .timestamp_opt(sec, (usec * 1_000) as u32)
        .single()
        .expect("u32 unix seconds are in range");
    Ok(TemporalValue::Frac(FracTime { time, dec, tz }))
}

/// `DATETIME2(dec)`: 5 big-endian bytes biased by [`DATETIMEF_INT_OFS`] plus
/// the fractional tail.
///
/// A native time-point is produced only when `parse_time` is set, month and
/// day are non-zero and the value is not before the unix epoch; everything
/// else keeps the string form.
pub(crate) fn decode_datetime2(
    buf: &mut ParseBuf<'_>,
    dec: u16,
    parse_time: bool,
) -> Result<TemporalValue> {
    let int_part = buf.eat_uint_be(5)? as i64 - DATETIMEF_INT_OFS;
    let frac = eat_frac_usec(buf, dec)?;

    if int_part == 0 {
        return Ok(TemporalValue::Str(format_zero_time(frac as u32, dec)));
    }

    let mut tmp = (int_part << 24) + frac;
    if tmp < 0 {
        tmp = -tmp;
    }

    let ymdhms = tmp >> 24;

    let ymd = ymdhms >> 17;
    let ym = ymd >> 5;
    let hms = ymdhms % (1 << 17);

    let day = (ymd % (1 << 5)) as u32;
    let month = (ym % 13) as u32;
    let year = (ym / 13) as u32;

    let second = (hms % (1 << 6)) as u32;
    let minute = ((hms >> 6) % (1 << 6)) as u32;
    let hour = (hms >> 12) as u32;

    if !parse_time || int_part < DATETIMEF_UNIX_EPOCH || month == 0 || day == 0 {
        return Ok(TemporalValue::Str(format_datetime(
            year, month, day, hour, minute, second, frac as u32, dec,
        )));
    }

    let civil = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_micro_opt(hour, minute, second, frac as u32));
    Ok(match civil {
        Some(naive) => TemporalValue::Frac(FracTime {
            time: Utc.from_utc_datetime(&naive),
            dec,
            tz: None,
        }),
        // out-of-range field combinations keep the string form
        None => TemporalValue::Str(format_datetime(
            year, month, day, hour, minute, second, frac as u32, dec,
        )),
    })
}

/// `TIME2(dec)`: 3 big-endian bytes biased by [`TIMEF_INT_OFS`] plus a
/// fractional tail; for `dec` 5 and 6 the whole 6-byte value is biased by
/// [`TIMEF_OFS`] instead. Always renders to a string.
pub(crate) fn decode_time2(buf: &mut ParseBuf<'_>, dec: u16) -> Result<String> {
    let (int_part, frac, tmp) = match dec {
        1 | 2 => {
            let mut int_part = buf.eat_uint_be(3)? as i64 - TIMEF_INT_OFS;
            let mut frac = buf.eat_u8()? as i64;
            if int_part < 0 && frac != 0 {
                // Negative values store the fractional part in reverse order
                // for binary sort compatibility: shift to the next integer
                // value and subtract the complemented fraction.
                int_part += 1;
                frac -= 0x100;
            }
            (int_part, frac, (int_part << 24) + frac * 10_000)
        }
        3 | 4 => {
            let mut int_part = buf.eat_uint_be(3)? as i64 - TIMEF_INT_OFS;
            let mut frac = buf.eat_uint_be(2)? as i64;
            if int_part < 0 && frac != 0 {
                int_part += 1;
                frac -= 0x10000;
            }
            (int_part, frac, (int_part << 24) + frac * 100)
        }
        5 | 6 => {
            let tmp = buf.eat_uint_be(6)? as i64 - TIMEF_OFS;
            return Ok(format_time2(tmp, dec));
        }
        _ => {
            let int_part = buf.eat_uint_be(3)? as i64 - TIMEF_INT_OFS;
            (int_part, 0, int_part << 24)
        }
    };

    if int_part == 0 && frac == 0 {
        return Ok("00:00:00".into());
    }

    Ok(format_time2(tmp, dec))
}

fn format_time2(mut tmp: i64, dec: u16) -> String {
    let sign = if tmp < 0 {
        tmp = -tmp;
        "-"
    } else {
        ""
    };

    let hms = tmp >> 24;

    let hour = (hms >> 12) % (1 << 10);
    let minute = (hms >> 6) % (1 << 6);
    let second = hms % (1 << 6);
    let usec = (tmp % (1 << 24)) as u32;

    let mut s = format!("{sign}{hour:02}:{minute:02}:{second:02}");
    if usec != 0 {
        let _ = write_frac(&mut s, usec, dec);
    }
    s
}

/// Server-side representation of the packed int64 temporal values that occur
/// inside binary JSON documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MysqlTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
    pub neg: bool,
}

fn packed_int_part(packed: i64) -> i64 {
    packed >> 24
}

fn packed_frac_part(packed: i64) -> i64 {
    packed % (1 << 24)
}

impl MysqlTime {
    /// Converts the packed numeric TIME representation.
    pub fn from_int64_time_packed(mut packed: i64) -> Self {
        let neg = packed < 0;
        if neg {
            packed = -packed;
        }

        let hms = packed_int_part(packed);
        Self {
            hour: ((hms >> 12) % (1 << 10)) as u32,
            minute: ((hms >> 6) % (1 << 6)) as u32,
            second: (hms % (1 << 6)) as u32,
            microsecond: packed_frac_part(packed) as u32,
            neg,
            ..Self::default()
        }
    }

    /// Converts the packed numeric DATETIME representation.
    pub fn from_int64_datetime_packed(mut packed: i64) -> Self {
        let neg = packed < 0;
        if neg {
            packed = -packed;
        }

        let microsecond = packed_frac_part(packed) as u32;
        let ymdhms = packed_int_part(packed);

        let ymd = ymdhms >> 17;
        let ym = ymd >> 5;
        let hms = ymdhms % (1 << 17);

        Self {
            year: (ym / 13) as u32,
            month: (ym % 13) as u32,
            day: (ymd % (1 << 5)) as u32,
            hour: (hms >> 12) as u32,
            minute: ((hms >> 6) % (1 << 6)) as u32,
            second: (hms % (1 << 6)) as u32,
            microsecond,
            neg,
        }
    }

    /// Converts the packed numeric DATE representation.
    pub fn from_int64_date_packed(packed: i64) -> Self {
        Self::from_int64_datetime_packed(packed)
    }

    pub fn format_date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    pub fn format_datetime(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.microsecond
        )
    }

    pub fn format_time(&self) -> String {
        format!(
            "{}{:02}:{:02}:{:02}.{:06}",
            if self.neg { "-" } else { "" },
            self.hour,
            self.minute,
            self.second,
            self.microsecond
        )
    }
}
