// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Typed column values and the (type, meta) value codec.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
    constants::ColumnType,
    decimal,
    error::{EventError, Result},
    io::ParseBuf,
    jsonb,
    jsondiff::{self, JsonDiff},
    time::{self, FracTime, TemporalValue},
    DecodeOptions,
};

/// A single decoded column value.
///
/// Integer-backed columns (including YEAR, ENUM, SET and BIT) always decode
/// as *signed* integers; a caller that knows a column is unsigned from the
/// table map's signedness bitmap reinterprets the raw bits itself.
#[derive(Debug, Clone, PartialEq)]
pub enum BinlogValue {
    /// SQL NULL.
    Null,
    /// TINY/SHORT/INT24/LONG/LONGLONG, YEAR, ENUM (index), SET (bitset),
    /// BIT (zero-extended).
    Int(i64),
    Float(f32),
    Double(f64),
    /// NEWDECIMAL rendered as decimal text.
    Decimal(String),
    /// NEWDECIMAL with [`DecodeOptions::use_decimal`] set.
    BigDecimal(bigdecimal::BigDecimal),
    /// VARCHAR/VAR_STRING/STRING, lossily converted to UTF-8.
    Text(String),
    /// BLOB, GEOMETRY, VECTOR payloads, and the empty JSON document.
    Bytes(Vec<u8>),
    /// TIMESTAMP/DATETIME family with [`DecodeOptions::parse_time`] set.
    DateTime(DateTime<Utc>),
    /// Formatted temporal string (TIME/DATE always; TIMESTAMP/DATETIME
    /// family without `parse_time`).
    TimeText(String),
    /// Decoded JSON document text.
    Json(String),
    /// Partial-JSON update: the sequence of logged diffs.
    JsonDiff(Vec<JsonDiff>),
}

/// Decodes one column value from `buf`, advancing it by the number of bytes
/// the value occupies.
///
/// `column_type` and `meta` come from the table map; `is_partial` marks a
/// JSON column whose after-image is logged as a diff.
pub fn decode_value(
    buf: &mut ParseBuf<'_>,
    column_type: u8,
    meta: u16,
    is_partial: bool,
    opts: &DecodeOptions,
) -> Result<BinlogValue> {
    let mut column_type = column_type;
    let mut length = 0usize;

    // A STRING column packs its real type and length into the meta. See
    // log_event_print_value in sql/log_event.cc.
    if column_type == ColumnType::MYSQL_TYPE_STRING as u8 {
        if meta >= 256 {
            let b0 = (meta >> 8) as u8;
            let b1 = meta as u8;
            if b0 & 0x30 != 0x30 {
                // long string variant: the two spare bits of b0 hold the
                // high bits of the length
                length = b1 as usize | ((((b0 & 0x30) ^ 0x30) as usize) << 4);
                column_type = b0 | 0x30;
            } else {
                length = b1 as usize;
                column_type = b0;
            }
        } else {
            length = meta as usize;
        }
    }

    let column_type =
        ColumnType::try_from(column_type).map_err(|e| EventError::UnsupportedType(e.0))?;

    match column_type {
        ColumnType::MYSQL_TYPE_NULL => Ok(BinlogValue::Null),
        ColumnType::MYSQL_TYPE_TINY => Ok(BinlogValue::Int(buf.eat_u8()? as i8 as i64)),
        ColumnType::MYSQL_TYPE_SHORT => Ok(BinlogValue::Int(buf.eat_u16_le()? as i16 as i64)),
        ColumnType::MYSQL_TYPE_INT24 => {
            let raw = buf.eat_uint_le(3)? as i64;
            let value = if raw & 0x80_0000 != 0 {
                raw | !0xff_ffff
            } else {
                raw
            };
            Ok(BinlogValue::Int(value))
        }
        ColumnType::MYSQL_TYPE_LONG => Ok(BinlogValue::Int(buf.eat_u32_le()? as i32 as i64)),
        ColumnType::MYSQL_TYPE_LONGLONG => Ok(BinlogValue::Int(buf.eat_u64_le()? as i64)),
        ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            let precision = (meta >> 8) as usize;
            let scale = (meta & 0xff) as usize;
            let text = decimal::decode_decimal(buf, precision, scale)?;
            if opts.use_decimal {
                let value = text
                    .parse::<bigdecimal::BigDecimal>()
                    .map_err(|_| EventError::DecimalParseFailure(text))?;
                Ok(BinlogValue::BigDecimal(value))
            } else {
                Ok(BinlogValue::Decimal(text))
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT => Ok(BinlogValue::Float(buf.eat_f32_le()?)),
        ColumnType::MYSQL_TYPE_DOUBLE => Ok(BinlogValue::Double(buf.eat_f64_le()?)),
        ColumnType::MYSQL_TYPE_BIT => {
            let nbits = ((meta >> 8) * 8 + (meta & 0xff)) as usize;
            let len = (nbits + 7) / 8;
            Ok(BinlogValue::Int(decode_bit_be(buf, nbits, len)?))
        }
        ColumnType::MYSQL_TYPE_TIMESTAMP => {
            let sec = buf.eat_u32_le()?;
            if sec == 0 {
                Ok(BinlogValue::TimeText("0000-00-00 00:00:00".into()))
            } else {
                let time = Utc
                    .timestamp_opt(sec as i64, 0)
                    .single()
                    .expect("u32 unix seconds are in range");
                Ok(resolve_frac_time(
                    FracTime {
                        time,
                        dec: 0,
                        tz: opts.timestamp_string_location,
                    },
                    opts,
                ))
            }
        }
        ColumnType::MYSQL_TYPE_TIMESTAMP2 => {
            let value = time::decode_timestamp2(buf, meta, opts.timestamp_string_location)?;
            Ok(resolve_temporal(value, opts))
        }
        ColumnType::MYSQL_TYPE_DATETIME => decode_datetime(buf, opts),
        ColumnType::MYSQL_TYPE_DATETIME2 => {
            let value = time::decode_datetime2(buf, meta, opts.parse_time)?;
            Ok(resolve_temporal(value, opts))
        }
        ColumnType::MYSQL_TYPE_TIME => {
            let value = buf.eat_uint_le(3)? as u32;
            if value == 0 {
                Ok(BinlogValue::TimeText("00:00:00".into()))
            } else {
                Ok(BinlogValue::TimeText(format!(
                    "{:02}:{:02}:{:02}",
                    value / 10_000,
                    (value % 10_000) / 100,
                    value % 100
                )))
            }
        }
        ColumnType::MYSQL_TYPE_TIME2 => Ok(BinlogValue::TimeText(time::decode_time2(buf, meta)?)),
        ColumnType::MYSQL_TYPE_DATE => {
            let value = buf.eat_uint_le(3)? as u32;
            if value == 0 {
                Ok(BinlogValue::TimeText("0000-00-00".into()))
            } else {
                Ok(BinlogValue::TimeText(format!(
                    "{:04}-{:02}-{:02}",
                    value / (16 * 32),
                    value / 32 % 16,
                    value % 32
                )))
            }
        }
        ColumnType::MYSQL_TYPE_YEAR => {
            let year = buf.eat_u8()? as i64;
            Ok(BinlogValue::Int(if year == 0 { 0 } else { year + 1900 }))
        }
        ColumnType::MYSQL_TYPE_ENUM => match meta & 0xff {
            1 => Ok(BinlogValue::Int(buf.eat_u8()? as i64)),
            2 => Ok(BinlogValue::Int(buf.eat_u16_le()? as i64)),
            packlen => Err(EventError::UnknownEnumPacklen(packlen)),
        },
        ColumnType::MYSQL_TYPE_SET => {
            let len = (meta & 0xff) as usize;
            Ok(BinlogValue::Int(decode_bit_le(buf, len * 8, len)?))
        }
        ColumnType::MYSQL_TYPE_BLOB
        | ColumnType::MYSQL_TYPE_GEOMETRY
        | ColumnType::MYSQL_TYPE_VECTOR => Ok(BinlogValue::Bytes(decode_blob(buf, meta)?)),
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => {
            Ok(BinlogValue::Text(decode_string(buf, meta as usize)?))
        }
        ColumnType::MYSQL_TYPE_STRING => Ok(BinlogValue::Text(decode_string(buf, length)?)),
        ColumnType::MYSQL_TYPE_JSON => decode_json(buf, meta, is_partial, opts),
        other => Err(EventError::UnsupportedType(other as u8)),
    }
}

/// Resolves a decoded time-point according to `parse_time`.
fn resolve_frac_time(value: FracTime, opts: &DecodeOptions) -> BinlogValue {
    if opts.parse_time {
        BinlogValue::DateTime(value.time)
    } else {
        BinlogValue::TimeText(value.to_string())
    }
}

fn resolve_temporal(value: TemporalValue, opts: &DecodeOptions) -> BinlogValue {
    match value {
        TemporalValue::Str(s) => BinlogValue::TimeText(s),
        TemporalValue::Frac(f) => resolve_frac_time(f, opts),
    }
}

/// Pre-5.6.4 DATETIME: 8 little-endian bytes of packed `YYYYMMDDHHMMSS`.
fn decode_datetime(buf: &mut ParseBuf<'_>, opts: &DecodeOptions) -> Result<BinlogValue> {
    let value = buf.eat_u64_le()?;
    if value == 0 {
        return Ok(BinlogValue::TimeText("0000-00-00 00:00:00".into()));
    }

    let d = value / 1_000_000;
    let t = value % 1_000_000;
    let year = (d / 10_000) as u32;
    let month = ((d % 10_000) / 100) as u32;
    let day = (d % 100) as u32;
    let hour = (t / 10_000) as u32;
    let minute = ((t % 10_000) / 100) as u32;
    let second = (t % 100) as u32;

    if !opts.parse_time || month == 0 || day == 0 {
        return Ok(BinlogValue::TimeText(time::format_datetime(
            year, month, day, hour, minute, second, 0, 0,
        )));
    }

    let civil = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second));
    Ok(match civil {
        Some(naive) => resolve_frac_time(
            FracTime {
                time: Utc.from_utc_datetime(&naive),
                dec: 0,
                tz: None,
            },
            opts,
        ),
        None => BinlogValue::TimeText(time::format_datetime(
            year, month, day, hour, minute, second, 0, 0,
        )),
    })
}

/// Big-endian bit field, zero-extended to 64 bits.
fn decode_bit_be(buf: &mut ParseBuf<'_>, nbits: usize, length: usize) -> Result<i64> {
    if nbits > 1 {
        if !(1..=8).contains(&length) {
            return Err(EventError::InvalidBitLength(length));
        }
        Ok(buf.eat_uint_be(length)? as i64)
    } else if length != 1 {
        Err(EventError::InvalidBitLength(length))
    } else {
        Ok(buf.eat_u8()? as i64)
    }
}

/// Little-endian bit field (SET columns), zero-extended to 64 bits.
fn decode_bit_le(buf: &mut ParseBuf<'_>, nbits: usize, length: usize) -> Result<i64> {
    if nbits > 1 {
        if !(1..=8).contains(&length) {
            return Err(EventError::InvalidBitLength(length));
        }
        Ok(buf.eat_uint_le(length)? as i64)
    } else if length != 1 {
        Err(EventError::InvalidBitLength(length))
    } else {
        Ok(buf.eat_u8()? as i64)
    }
}

/// BLOB-family payload: `meta` bytes of little-endian length, then the data.
fn decode_blob(buf: &mut ParseBuf<'_>, meta: u16) -> Result<Vec<u8>> {
    match meta {
        1..=4 => {
            let len = buf.eat_uint_le(meta as usize)? as usize;
            Ok(buf.eat(len)?.to_vec())
        }
        _ => Err(EventError::InvalidBlobPacklen(meta)),
    }
}

/// Character payload with a 1-byte length prefix for lengths below 256 and a
/// 2-byte one otherwise.
fn decode_string(buf: &mut ParseBuf<'_>, length: usize) -> Result<String> {
    let bytes = if length < 256 {
        let len = buf.eat_u8()? as usize;
        buf.eat(len)?
    } else {
        let len = buf.eat_u16_le()? as usize;
        buf.eat(len)?
    };
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_json(
    buf: &mut ParseBuf<'_>,
    meta: u16,
    is_partial: bool,
    opts: &DecodeOptions,
) -> Result<BinlogValue> {
    if !(1..=4).contains(&meta) {
        return Err(EventError::InvalidBlobPacklen(meta));
    }
    let len = buf.eat_uint_le(meta as usize)? as usize;
    let payload = buf.eat(len)?;

    // Empty documents occur for inserts with the IGNORE keyword or non-strict
    // SQL mode; they are kept as an empty byte string.
    if payload.is_empty() {
        return Ok(BinlogValue::Bytes(Vec::new()));
    }

    if is_partial {
        match jsondiff::decode_diffs(payload) {
            Ok(diffs) => Ok(BinlogValue::JsonDiff(diffs)),
            Err(e) if opts.ignore_json_decode_err => {
                tracing::warn!(error = %e, "failed to decode partial JSON value, substituting null");
                Ok(BinlogValue::Json("null".into()))
            }
            Err(e) => Err(e),
        }
    } else {
        match jsonb::decode(payload) {
            Ok(value) => Ok(BinlogValue::Json(value.to_string())),
            Err(e) if opts.ignore_json_decode_err => {
                tracing::warn!(error = %e, "failed to decode JSON value, substituting null");
                Ok(BinlogValue::Json("null".into()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8], column_type: ColumnType, meta: u16) -> BinlogValue {
        let mut buf = ParseBuf::new(data);
        let value =
            decode_value(&mut buf, column_type as u8, meta, false, &Default::default()).unwrap();
        assert!(buf.is_empty(), "codec left {} bytes unread", buf.len());
        value
    }

    #[test]
    fn integers_are_always_signed() {
        // TINYINT UNSIGNED 250 decodes as -6; the signedness bitmap is the
        // caller's business.
        assert_eq!(
            decode(&[0xfa], ColumnType::MYSQL_TYPE_TINY, 0),
            BinlogValue::Int(-6)
        );
        assert_eq!(
            decode(&[0xff, 0x7f], ColumnType::MYSQL_TYPE_SHORT, 0),
            BinlogValue::Int(32767)
        );
        assert_eq!(
            decode(&[0xff, 0xff, 0xff], ColumnType::MYSQL_TYPE_INT24, 0),
            BinlogValue::Int(-1)
        );
        assert_eq!(
            decode(&[0x2a, 0x00, 0x00, 0x00], ColumnType::MYSQL_TYPE_LONG, 0),
            BinlogValue::Int(42)
        );
        assert_eq!(
            decode(
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
                ColumnType::MYSQL_TYPE_LONGLONG,
                0
            ),
            BinlogValue::Int(-1)
        );
    }

    #[test]
    fn floats() {
        assert_eq!(
            decode(&1.25f32.to_le_bytes(), ColumnType::MYSQL_TYPE_FLOAT, 0),
            BinlogValue::Float(1.25)
        );
        assert_eq!(
            decode(&(-2.5f64).to_le_bytes(), ColumnType::MYSQL_TYPE_DOUBLE, 0),
            BinlogValue::Double(-2.5)
        );
    }

    #[test]
    fn decimal_text_and_big() {
        let meta = (10 << 8) | 2;
        assert_eq!(
            decode(
                &[0x7f, 0xff, 0xff, 0xfe, 0xe8],
                ColumnType::MYSQL_TYPE_NEWDECIMAL,
                meta
            ),
            BinlogValue::Decimal("-1.23".into())
        );

        let mut buf = ParseBuf::new(&[0x7f, 0xff, 0xff, 0xfe, 0xe8]);
        let opts = DecodeOptions {
            use_decimal: true,
            ..Default::default()
        };
        let value = decode_value(
            &mut buf,
            ColumnType::MYSQL_TYPE_NEWDECIMAL as u8,
            meta,
            false,
            &opts,
        )
        .unwrap();
        assert_eq!(
            value,
            BinlogValue::BigDecimal("-1.23".parse().unwrap())
        );
    }

    #[test]
    fn bit_is_read_big_endian() {
        // BIT(12): meta = (1 << 8) | 4, 2 bytes
        assert_eq!(
            decode(&[0x01, 0x02], ColumnType::MYSQL_TYPE_BIT, (1 << 8) | 4),
            BinlogValue::Int(0x0102)
        );
        // BIT(1)
        assert_eq!(
            decode(&[0x01], ColumnType::MYSQL_TYPE_BIT, 1),
            BinlogValue::Int(1)
        );
    }

    #[test]
    fn enum_pack_lengths() {
        assert_eq!(
            decode(&[0x02], ColumnType::MYSQL_TYPE_ENUM, 1),
            BinlogValue::Int(2)
        );
        assert_eq!(
            decode(&[0x34, 0x12], ColumnType::MYSQL_TYPE_ENUM, 2),
            BinlogValue::Int(0x1234)
        );

        let mut buf = ParseBuf::new(&[0x00; 4]);
        assert!(matches!(
            decode_value(
                &mut buf,
                ColumnType::MYSQL_TYPE_ENUM as u8,
                3,
                false,
                &Default::default()
            ),
            Err(EventError::UnknownEnumPacklen(3))
        ));
    }

    #[test]
    fn set_is_read_little_endian() {
        assert_eq!(
            decode(&[0x01, 0x02], ColumnType::MYSQL_TYPE_SET, 2),
            BinlogValue::Int(0x0201)
        );
    }

    #[test]
    fn blob_length_prefixes() {
        assert_eq!(
            decode(&[0x02, b'h', b'i'], ColumnType::MYSQL_TYPE_BLOB, 1),
            BinlogValue::Bytes(b"hi".to_vec())
        );
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0xaa], ColumnType::MYSQL_TYPE_GEOMETRY, 4),
            BinlogValue::Bytes(vec![0xaa])
        );

        let mut buf = ParseBuf::new(&[0x00; 8]);
        assert!(matches!(
            decode_value(
                &mut buf,
                ColumnType::MYSQL_TYPE_BLOB as u8,
                5,
                false,
                &Default::default()
            ),
            Err(EventError::InvalidBlobPacklen(5))
        ));
    }

    #[test]
    fn varchar_prefix_width_follows_meta() {
        assert_eq!(
            decode(&[0x02, b'o', b'k'], ColumnType::MYSQL_TYPE_VARCHAR, 100),
            BinlogValue::Text("ok".into())
        );
        assert_eq!(
            decode(&[0x02, 0x00, b'o', b'k'], ColumnType::MYSQL_TYPE_VARCHAR, 300),
            BinlogValue::Text("ok".into())
        );
    }

    #[test]
    fn string_meta_rewrite() {
        // CHAR(4): meta high byte is the real type, low byte the length
        let meta = ((ColumnType::MYSQL_TYPE_STRING as u16) << 8) | 4;
        assert_eq!(
            decode(&[0x02, b'h', b'i'], ColumnType::MYSQL_TYPE_STRING, meta),
            BinlogValue::Text("hi".into())
        );

        // long variant: CHAR with byte length 300 packs the length's high
        // bits into the spare bits of the type byte
        let b0 = (ColumnType::MYSQL_TYPE_STRING as u8) ^ (((300usize >> 8) as u8) << 4);
        let meta = ((b0 as u16) << 8) | (300 & 0xff) as u16;
        assert_eq!(
            decode(
                &[0x02, 0x00, b'h', b'i'],
                ColumnType::MYSQL_TYPE_STRING,
                meta
            ),
            BinlogValue::Text("hi".into())
        );

        // ENUM stored as STRING with a real-type meta
        let meta = ((ColumnType::MYSQL_TYPE_ENUM as u16) << 8) | 1;
        assert_eq!(
            decode(&[0x02], ColumnType::MYSQL_TYPE_STRING, meta),
            BinlogValue::Int(2)
        );
    }

    #[test]
    fn year_and_dates() {
        assert_eq!(
            decode(&[0x00], ColumnType::MYSQL_TYPE_YEAR, 0),
            BinlogValue::Int(0)
        );
        assert_eq!(
            decode(&[123], ColumnType::MYSQL_TYPE_YEAR, 0),
            BinlogValue::Int(2023)
        );

        // DATE 2023-03-15: 2023 * 512 + 3 * 32 + 15
        let packed: u32 = 2023 * 512 + 3 * 32 + 15;
        let bytes = packed.to_le_bytes();
        assert_eq!(
            decode(&bytes[..3], ColumnType::MYSQL_TYPE_DATE, 0),
            BinlogValue::TimeText("2023-03-15".into())
        );
        assert_eq!(
            decode(&[0, 0, 0], ColumnType::MYSQL_TYPE_DATE, 0),
            BinlogValue::TimeText("0000-00-00".into())
        );
    }

    #[test]
    fn old_time_format() {
        // 12:34:56 packed as 123456
        let bytes = 123456u32.to_le_bytes();
        assert_eq!(
            decode(&bytes[..3], ColumnType::MYSQL_TYPE_TIME, 0),
            BinlogValue::TimeText("12:34:56".into())
        );
        assert_eq!(
            decode(&[0, 0, 0], ColumnType::MYSQL_TYPE_TIME, 0),
            BinlogValue::TimeText("00:00:00".into())
        );
    }

    #[test]
    fn old_datetime_string_and_native() {
        // 2023-03-15 12:34:56 packed as 20230315123456
        let bytes = 20230315123456u64.to_le_bytes();
        assert_eq!(
            decode(&bytes, ColumnType::MYSQL_TYPE_DATETIME, 0),
            BinlogValue::TimeText("2023-03-15 12:34:56".into())
        );

        let opts = DecodeOptions {
            parse_time: true,
            ..Default::default()
        };
        let mut buf = ParseBuf::new(&bytes);
        match decode_value(&mut buf, ColumnType::MYSQL_TYPE_DATETIME as u8, 0, false, &opts)
            .unwrap()
        {
            BinlogValue::DateTime(t) => {
                assert_eq!(t.to_string(), "2023-03-15 12:34:56 UTC");
            }
            other => panic!("expected a native datetime, got {other:?}"),
        }

        // zero month keeps the string form even with parse_time
        let bytes = 20230015123456u64.to_le_bytes();
        let mut buf = ParseBuf::new(&bytes);
        assert_eq!(
            decode_value(&mut buf, ColumnType::MYSQL_TYPE_DATETIME as u8, 0, false, &opts)
                .unwrap(),
            BinlogValue::TimeText("2023-00-15 12:34:56".into())
        );
    }

    #[test]
    fn old_timestamp_zero_sentinel() {
        assert_eq!(
            decode(&[0, 0, 0, 0], ColumnType::MYSQL_TYPE_TIMESTAMP, 0),
            BinlogValue::TimeText("0000-00-00 00:00:00".into())
        );
        assert_eq!(
            decode(&0x5e0dc625u32.to_le_bytes(), ColumnType::MYSQL_TYPE_TIMESTAMP, 0),
            BinlogValue::TimeText("2020-01-02 03:04:05".into())
        );
    }

    #[test]
    fn json_documents() {
        // empty document stays an empty byte string
        assert_eq!(
            decode(&[0, 0, 0, 0], ColumnType::MYSQL_TYPE_JSON, 4),
            BinlogValue::Bytes(Vec::new())
        );

        // literal true
        assert_eq!(
            decode(&[0x02, 0, 0, 0, 0x04, 0x01], ColumnType::MYSQL_TYPE_JSON, 4),
            BinlogValue::Json("true".into())
        );
    }

    #[test]
    fn json_errors_demote_with_flag() {
        let data = [0x02, 0, 0, 0, 0x42, 0x00]; // unknown type marker
        let mut buf = ParseBuf::new(&data);
        assert!(matches!(
            decode_value(
                &mut buf,
                ColumnType::MYSQL_TYPE_JSON as u8,
                4,
                false,
                &Default::default()
            ),
            Err(EventError::InvalidJson(_))
        ));

        let opts = DecodeOptions {
            ignore_json_decode_err: true,
            ..Default::default()
        };
        let mut buf = ParseBuf::new(&data);
        assert_eq!(
            decode_value(&mut buf, ColumnType::MYSQL_TYPE_JSON as u8, 4, false, &opts).unwrap(),
            BinlogValue::Json("null".into())
        );
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let mut buf = ParseBuf::new(&[0x00; 4]);
        assert!(matches!(
            decode_value(&mut buf, 21, 0, false, &Default::default()),
            Err(EventError::UnsupportedType(21))
        ));
    }
}
