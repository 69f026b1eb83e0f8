// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! MySql packed decimal (`MYSQL_TYPE_NEWDECIMAL`) codec.
//!
//! A decimal with precision `P` and scale `S` stores its `P - S` integral
//! digits and `S` fractional digits in big-endian base-10^9 groups of four
//! bytes each, with a shorter group at either end for the digits that do not
//! fill a whole group. The sign lives in the high bit of the first byte with
//! an inverted convention: the bit is *set* for non-negative values, and all
//! bytes of a negative value are bitwise-complemented.

use std::fmt::Write;

use crate::{
    error::{EventError, Result},
    io::ParseBuf,
};

const DIGITS_PER_INTEGER: usize = 9;

/// Bytes needed for `0..=9` leading decimal digits.
const COMPRESSED_BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];

/// Number of bytes a decimal with the given precision and scale occupies.
pub fn binary_size(precision: usize, scale: usize) -> usize {
    let integral = precision.saturating_sub(scale);
    let uncomp_integral = integral / DIGITS_PER_INTEGER;
    let uncomp_fractional = scale / DIGITS_PER_INTEGER;
    let comp_integral = integral - uncomp_integral * DIGITS_PER_INTEGER;
    let comp_fractional = scale - uncomp_fractional * DIGITS_PER_INTEGER;

    uncomp_integral * 4
        + COMPRESSED_BYTES[comp_integral]
        + uncomp_fractional * 4
        + COMPRESSED_BYTES[comp_fractional]
}

/// Decodes one packed decimal value, consuming exactly
/// [`binary_size`]`(precision, scale)` bytes.
///
/// Leading zero groups of the integral part are suppressed; a zero integral
/// part is rendered as a single `0`. The fractional part (and its `.`) is
/// emitted iff the scale is non-zero.
pub fn decode_decimal(buf: &mut ParseBuf<'_>, precision: usize, scale: usize) -> Result<String> {
    if scale > precision {
        return Err(EventError::DecimalParseFailure(format!(
            "scale {scale} exceeds precision {precision}"
        )));
    }

    let integral = precision - scale;
    let uncomp_integral = integral / DIGITS_PER_INTEGER;
    let uncomp_fractional = scale / DIGITS_PER_INTEGER;
    let comp_integral = integral - uncomp_integral * DIGITS_PER_INTEGER;
    let comp_fractional = scale - uncomp_fractional * DIGITS_PER_INTEGER;

    let bin_size = binary_size(precision, scale);
    let mut data = buf.eat(bin_size)?.to_vec();
    if data.is_empty() {
        return Ok("0".into());
    }

    // High bit of byte 0 is the (inverted) sign; negative values have every
    // byte complemented.
    let mask = if data[0] & 0x80 == 0 { 0xff } else { 0x00 };
    let mut out = String::with_capacity(precision + 2);
    if mask == 0xff {
        out.push('-');
    }
    data[0] ^= 0x80;

    let mut pos = 0;
    let mut zero_leading = true;

    let head = COMPRESSED_BYTES[comp_integral];
    let value = decompress_value(&data[..head], mask);
    pos += head;
    if value != 0 {
        zero_leading = false;
        let _ = write!(out, "{value}");
    }

    for _ in 0..uncomp_integral {
        let value = decompress_value(&data[pos..pos + 4], mask);
        pos += 4;
        if zero_leading {
            if value != 0 {
                zero_leading = false;
                let _ = write!(out, "{value}");
            }
        } else {
            let _ = write!(out, "{value:09}");
        }
    }

    if zero_leading {
        out.push('0');
    }

    if pos < data.len() {
        out.push('.');

        for _ in 0..uncomp_fractional {
            let value = decompress_value(&data[pos..pos + 4], mask);
            pos += 4;
            let _ = write!(out, "{value:09}");
        }

        let tail = COMPRESSED_BYTES[comp_fractional];
        if tail > 0 {
            let value = decompress_value(&data[pos..pos + tail], mask);
            let _ = write!(out, "{value:0width$}", width = comp_fractional);
        }
    }

    Ok(out)
}

/// Big-endian value of a 0..=4-byte group, with the sign mask applied
/// per byte.
fn decompress_value(data: &[u8], mask: u8) -> u32 {
    data.iter().fold(0u32, |acc, b| (acc << 8) | (b ^ mask) as u32)
}
