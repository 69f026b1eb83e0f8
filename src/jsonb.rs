// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! MySql internal binary JSON representation.
//!
//! A document is a one-byte type marker followed by the value. Objects and
//! arrays come in a *small* flavor (16-bit counts, sizes and offsets) and a
//! *large* one (32-bit); their elements are offset-addressed relative to the
//! start of the container payload, with small scalars inlined directly into
//! the value entries.

use serde_json::{Map, Value};

use crate::{
    constants::ColumnType,
    decimal,
    error::{EventError, Result},
    io::ParseBuf,
    time::MysqlTime,
};

const JSONB_TYPE_SMALL_OBJECT: u8 = 0x00;
const JSONB_TYPE_LARGE_OBJECT: u8 = 0x01;
const JSONB_TYPE_SMALL_ARRAY: u8 = 0x02;
const JSONB_TYPE_LARGE_ARRAY: u8 = 0x03;
const JSONB_TYPE_LITERAL: u8 = 0x04;
const JSONB_TYPE_INT16: u8 = 0x05;
const JSONB_TYPE_UINT16: u8 = 0x06;
const JSONB_TYPE_INT32: u8 = 0x07;
const JSONB_TYPE_UINT32: u8 = 0x08;
const JSONB_TYPE_INT64: u8 = 0x09;
const JSONB_TYPE_UINT64: u8 = 0x0a;
const JSONB_TYPE_DOUBLE: u8 = 0x0b;
const JSONB_TYPE_STRING: u8 = 0x0c;
const JSONB_TYPE_OPAQUE: u8 = 0x0f;

const JSONB_LITERAL_NULL: u8 = 0x00;
const JSONB_LITERAL_TRUE: u8 = 0x01;
const JSONB_LITERAL_FALSE: u8 = 0x02;

fn invalid(msg: impl std::fmt::Display) -> EventError {
    EventError::InvalidJson(msg.to_string())
}

/// Decodes a whole binary JSON document.
pub fn decode(data: &[u8]) -> Result<Value> {
    let (&marker, payload) = data
        .split_first()
        .ok_or_else(|| invalid("empty JSON document"))?;
    decode_value(marker, payload)
}

fn decode_value(marker: u8, data: &[u8]) -> Result<Value> {
    match marker {
        JSONB_TYPE_SMALL_OBJECT => decode_object(data, true),
        JSONB_TYPE_LARGE_OBJECT => decode_object(data, false),
        JSONB_TYPE_SMALL_ARRAY => decode_array(data, true),
        JSONB_TYPE_LARGE_ARRAY => decode_array(data, false),
        JSONB_TYPE_LITERAL => {
            decode_literal(*data.first().ok_or_else(|| invalid("missing literal"))?)
        }
        JSONB_TYPE_INT16 => Ok(Value::from(read_i16(data, 0)?)),
        JSONB_TYPE_UINT16 => Ok(Value::from(read_u16(data, 0)?)),
        JSONB_TYPE_INT32 => Ok(Value::from(read_i32(data, 0)?)),
        JSONB_TYPE_UINT32 => Ok(Value::from(read_u32(data, 0)?)),
        JSONB_TYPE_INT64 => Ok(Value::from(i64::from_le_bytes(read_array::<8>(data, 0)?))),
        JSONB_TYPE_UINT64 => Ok(Value::from(u64::from_le_bytes(read_array::<8>(data, 0)?))),
        JSONB_TYPE_DOUBLE => {
            let value = f64::from_le_bytes(read_array::<8>(data, 0)?);
            serde_json::Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| invalid("non-finite double"))
        }
        JSONB_TYPE_STRING => {
            let (len, prefix) = read_var_len(data)?;
            let bytes = data
                .get(prefix..prefix + len)
                .ok_or_else(|| invalid("truncated string value"))?;
            Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
        }
        JSONB_TYPE_OPAQUE => decode_opaque(data),
        x => Err(invalid(format_args!("unknown JSONB type marker {x:#04x}"))),
    }
}

fn decode_literal(literal: u8) -> Result<Value> {
    match literal {
        JSONB_LITERAL_NULL => Ok(Value::Null),
        JSONB_LITERAL_TRUE => Ok(Value::Bool(true)),
        JSONB_LITERAL_FALSE => Ok(Value::Bool(false)),
        x => Err(invalid(format_args!("unknown JSONB literal {x:#04x}"))),
    }
}

fn decode_object(data: &[u8], small: bool) -> Result<Value> {
    let w = entry_width(small);
    let count = read_offset(data, 0, small)?;
    let size = read_offset(data, w, small)?;
    if size > data.len() {
        return Err(invalid("object size exceeds document"));
    }
    // offsets are relative to the container payload and bounded by its size
    let data = &data[..size];

    let key_entries = 2 * w;
    let value_entries = key_entries + count * (w + 2);

    let mut map = Map::with_capacity(count);
    for i in 0..count {
        let kpos = key_entries + i * (w + 2);
        let key_offset = read_offset(data, kpos, small)?;
        let key_len = read_u16(data, kpos + w)? as usize;
        let key = data
            .get(key_offset..key_offset + key_len)
            .ok_or_else(|| invalid("object key out of bounds"))?;

        let value = decode_entry(data, value_entries + i * (w + 1), small)?;
        map.insert(String::from_utf8_lossy(key).into_owned(), value);
    }
    Ok(Value::Object(map))
}

fn decode_array(data: &[u8], small: bool) -> Result<Value> {
    let w = entry_width(small);
    let count = read_offset(data, 0, small)?;
    let size = read_offset(data, w, small)?;
    if size > data.len() {
        return Err(invalid("array size exceeds document"));
    }
    let data = &data[..size];

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(decode_entry(data, 2 * w + i * (w + 1), small)?);
    }
    Ok(Value::Array(values))
}

/// Decodes one value entry of a container: either an inlined small scalar or
/// an offset to the value within the container payload.
fn decode_entry(data: &[u8], pos: usize, small: bool) -> Result<Value> {
    let marker = *data
        .get(pos)
        .ok_or_else(|| invalid("value entry out of bounds"))?;
    let inline = pos + 1;
    match marker {
        JSONB_TYPE_LITERAL => decode_literal(
            *data
                .get(inline)
                .ok_or_else(|| invalid("value entry out of bounds"))?,
        ),
        JSONB_TYPE_INT16 => Ok(Value::from(read_i16(data, inline)?)),
        JSONB_TYPE_UINT16 => Ok(Value::from(read_u16(data, inline)?)),
        JSONB_TYPE_INT32 if !small => Ok(Value::from(read_i32(data, inline)?)),
        JSONB_TYPE_UINT32 if !small => Ok(Value::from(read_u32(data, inline)?)),
        _ => {
            let offset = read_offset(data, inline, small)?;
            if offset >= data.len() {
                return Err(invalid("value offset out of bounds"));
            }
            decode_value(marker, &data[offset..])
        }
    }
}

fn decode_opaque(data: &[u8]) -> Result<Value> {
    let field_type = *data
        .first()
        .ok_or_else(|| invalid("truncated opaque value"))?;
    let (len, prefix) = read_var_len(&data[1..])?;
    let payload = data
        .get(1 + prefix..1 + prefix + len)
        .ok_or_else(|| invalid("truncated opaque value"))?;

    match ColumnType::try_from(field_type) {
        Ok(ColumnType::MYSQL_TYPE_NEWDECIMAL) => {
            let mut buf = ParseBuf::new(payload);
            let decimal = buf
                .eat_u8()
                .and_then(|precision| {
                    let scale = buf.eat_u8()?;
                    decimal::decode_decimal(&mut buf, precision as usize, scale as usize)
                })
                .map_err(|e| invalid(format_args!("bad opaque decimal: {e}")))?;
            Ok(Value::String(decimal))
        }
        Ok(ColumnType::MYSQL_TYPE_TIME) => {
            let packed = read_packed(payload)?;
            Ok(Value::String(
                MysqlTime::from_int64_time_packed(packed).format_time(),
            ))
        }
        Ok(ColumnType::MYSQL_TYPE_DATE) => {
            let packed = read_packed(payload)?;
            Ok(Value::String(
                MysqlTime::from_int64_date_packed(packed).format_date(),
            ))
        }
        Ok(ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_TIMESTAMP) => {
            let packed = read_packed(payload)?;
            Ok(Value::String(
                MysqlTime::from_int64_datetime_packed(packed).format_datetime(),
            ))
        }
        _ => Ok(Value::String(String::from_utf8_lossy(payload).into_owned())),
    }
}

fn read_packed(payload: &[u8]) -> Result<i64> {
    Ok(i64::from_le_bytes(read_array::<8>(payload, 0)?))
}

fn entry_width(small: bool) -> usize {
    if small {
        2
    } else {
        4
    }
}

fn read_array<const N: usize>(data: &[u8], pos: usize) -> Result<[u8; N]> {
    data.get(pos..pos + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| invalid("JSON document too short"))
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16> {
    Ok(u16::from_le_bytes(read_array::<2>(data, pos)?))
}

fn read_i16(data: &[u8], pos: usize) -> Result<i16> {
    Ok(i16::from_le_bytes(read_array::<2>(data, pos)?))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    Ok(u32::from_le_bytes(read_array::<4>(data, pos)?))
}

fn read_i32(data: &[u8], pos: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(read_array::<4>(data, pos)?))
}

fn read_offset(data: &[u8], pos: usize, small: bool) -> Result<usize> {
    if small {
        read_u16(data, pos).map(usize::from)
    } else {
        read_u32(data, pos).map(|x| x as usize)
    }
}

/// Variable-length size prefix: seven value bits per byte, high bit set on
/// all but the last byte, at most five bytes.
fn read_var_len(data: &[u8]) -> Result<(usize, usize)> {
    let mut len = 0usize;
    for i in 0..5 {
        let byte = *data
            .get(i)
            .ok_or_else(|| invalid("truncated length prefix"))?;
        len |= ((byte & 0x7f) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((len, i + 1));
        }
    }
    Err(invalid("length prefix too long"))
}
