// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Table map event.
//!
//! In row-based mode, every row operation event is preceded by a table map
//! event which binds a table definition to a number. Rows events then refer
//! to that number.

use std::{borrow::Cow, collections::HashMap, fmt};

use bitvec::{
    order::{Lsb0, Msb0},
    slice::BitSlice,
};

use crate::{
    constants::{ColumnType, OptionalMetadataFieldType},
    error::{EventError, OptionalMetadataError, Result},
    io::ParseBuf,
    BinlogFlavor,
};

/// Table map event payload.
///
/// The fields after `null_bitmap` come from the optional metadata TLV block
/// and are only logged when `binlog_row_metadata=FULL` (MySql 8.0.1+,
/// MariaDB 10.5.0+); absent fields stay empty.
#[derive(Clone, PartialEq)]
pub struct TableMapEvent {
    flavor: BinlogFlavor,

    /// The number that identifies the table within the stream.
    ///
    /// It's 6 bytes long, so the valid range is `[0, 1 << 48)`.
    pub table_id: u64,
    /// Reserved for future use; currently always 0.
    pub flags: u16,

    /// Database name. Length must be <= 64 bytes.
    pub schema: Vec<u8>,
    /// Table name. Length must be <= 64 bytes.
    pub table: Vec<u8>,

    /// The type of each column, listed from left to right.
    pub column_type: Vec<u8>,
    /// Per-column metadata; its interpretation depends on the column type.
    pub column_meta: Vec<u16>,
    /// One bit per column, LSB-first: set if the column is nullable.
    pub null_bitmap: Vec<u8>,

    /// Signedness of numeric columns, one bit per *numeric* column,
    /// MSB-first within each byte.
    pub signedness_bitmap: Vec<u8>,
    /// `[default collation, (character column index, collation)*]`.
    pub default_charset: Vec<u64>,
    /// One collation per character column.
    pub column_charset: Vec<u64>,
    /// Per SET column: its member strings.
    pub set_str_values: Vec<Vec<Vec<u8>>>,
    /// Per ENUM column: its member strings.
    pub enum_str_values: Vec<Vec<Vec<u8>>>,
    /// One name per column.
    pub column_names: Vec<Vec<u8>>,
    /// Real type of every GEOMETRY column.
    pub geometry_types: Vec<u64>,
    /// Column indexes of the primary key.
    pub primary_key: Vec<u64>,
    /// Prefix length for each primary key column; 0 means the whole column.
    pub primary_key_prefix: Vec<u64>,
    /// Like `default_charset`, for ENUM and SET columns.
    pub enum_set_default_charset: Vec<u64>,
    /// Like `column_charset`, for ENUM and SET columns.
    pub enum_set_column_charset: Vec<u64>,
    /// One bit per column, MSB-first: set if the column is visible
    /// (MySql 8.0.23+).
    pub visibility_bitmap: Vec<u8>,
}

impl TableMapEvent {
    /// Decodes a table map event body.
    ///
    /// `table_id_size` (4 or 6) comes from the format description event of
    /// the surrounding stream; `flavor` decides whether GEOMETRY columns
    /// count as character columns for charset metadata.
    pub fn decode(data: &[u8], flavor: BinlogFlavor, table_id_size: usize) -> Result<Self> {
        let mut buf = ParseBuf::new(data);

        let table_id = buf.eat_uint_le(table_id_size)?;
        let flags = buf.eat_u16_le()?;

        let schema_len = buf.eat_u8()? as usize;
        let schema = buf.eat(schema_len)?.to_vec();
        buf.skip(1)?; // null terminator, unvalidated

        let table_len = buf.eat_u8()? as usize;
        let table = buf.eat(table_len)?.to_vec();
        buf.skip(1)?;

        let column_count = buf.eat_lenenc_int()? as usize;
        let column_type = buf.eat(column_count)?.to_vec();

        let metadata = buf.eat_lenenc_str()?;
        let column_meta = decode_meta(&column_type, metadata)?;

        let null_bitmap = buf.eat((column_count + 7) / 8)?.to_vec();

        let mut event = TableMapEvent {
            flavor,
            table_id,
            flags,
            schema,
            table,
            column_type,
            column_meta,
            null_bitmap,
            signedness_bitmap: Vec::new(),
            default_charset: Vec::new(),
            column_charset: Vec::new(),
            set_str_values: Vec::new(),
            enum_str_values: Vec::new(),
            column_names: Vec::new(),
            geometry_types: Vec::new(),
            primary_key: Vec::new(),
            primary_key_prefix: Vec::new(),
            enum_set_default_charset: Vec::new(),
            enum_set_column_charset: Vec::new(),
            visibility_bitmap: Vec::new(),
        };
        event.decode_optional_meta(&mut buf)?;

        Ok(event)
    }

    /// Optional metadata fields are stored as Type-Length-Value records:
    /// type takes one byte, length is a length-encoded integer. Unknown
    /// types are skipped for forward compatibility.
    fn decode_optional_meta(&mut self, buf: &mut ParseBuf<'_>) -> Result<()> {
        use OptionalMetadataFieldType::*;

        while !buf.is_empty() {
            let field_type = buf.eat_u8()?;
            let value = buf.eat_lenenc_str()?;

            match OptionalMetadataFieldType::try_from(field_type) {
                Ok(SIGNEDNESS) => self.signedness_bitmap = value.to_vec(),
                Ok(DEFAULT_CHARSET) => self.default_charset = decode_default_charset(value)?,
                Ok(COLUMN_CHARSET) => self.column_charset = decode_int_seq(value)?,
                Ok(COLUMN_NAME) => {
                    self.column_names = decode_column_names(value, self.column_type.len())?
                }
                Ok(SET_STR_VALUE) => self.set_str_values = decode_str_values(value)?,
                Ok(ENUM_STR_VALUE) => self.enum_str_values = decode_str_values(value)?,
                Ok(GEOMETRY_TYPE) => self.geometry_types = decode_int_seq(value)?,
                Ok(SIMPLE_PRIMARY_KEY) => self.decode_simple_primary_key(value),
                Ok(PRIMARY_KEY_WITH_PREFIX) => self.decode_primary_key_with_prefix(value),
                Ok(ENUM_AND_SET_DEFAULT_CHARSET) => {
                    self.enum_set_default_charset = decode_default_charset(value)?
                }
                Ok(ENUM_AND_SET_COLUMN_CHARSET) => {
                    self.enum_set_column_charset = decode_int_seq(value)?
                }
                Ok(COLUMN_VISIBILITY) => self.visibility_bitmap = value.to_vec(),
                Err(unknown) => {
                    tracing::debug!(field_type = unknown.0, "skipping optional metadata field");
                }
            }
        }

        Ok(())
    }

    // Historically tolerated: a malformed trailing fragment in the primary
    // key fields stops the loop instead of failing the event.
    fn decode_simple_primary_key(&mut self, value: &[u8]) {
        let mut buf = ParseBuf::new(value);
        while !buf.is_empty() {
            match buf.eat_lenenc_int() {
                Ok(index) => {
                    self.primary_key.push(index);
                    self.primary_key_prefix.push(0);
                }
                Err(_) => break,
            }
        }
    }

    fn decode_primary_key_with_prefix(&mut self, value: &[u8]) {
        let mut buf = ParseBuf::new(value);
        while !buf.is_empty() {
            match buf.eat_lenenc_int().and_then(|index| {
                let prefix = buf.eat_lenenc_int()?;
                Ok((index, prefix))
            }) {
                Ok((index, prefix)) => {
                    self.primary_key.push(index);
                    self.primary_key_prefix.push(prefix);
                }
                Err(_) => break,
            }
        }
    }

    pub fn flavor(&self) -> BinlogFlavor {
        self.flavor
    }

    /// Returns database name as a string (lossy converted).
    pub fn schema_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.schema)
    }

    /// Returns table name as a string (lossy converted).
    pub fn table_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.table)
    }

    pub fn column_count(&self) -> usize {
        self.column_type.len()
    }

    /// Nullability of the `i`-th column, or `None` when the bit is not
    /// available.
    pub fn nullable(&self, i: usize) -> Option<bool> {
        if self.null_bitmap.is_empty() {
            return None;
        }
        let bits = BitSlice::<Lsb0, u8>::from_slice(&self.null_bitmap).expect("bitmap too big");
        bits.get(i).as_deref().copied()
    }

    /// Number of JSON columns in this table.
    pub fn json_column_count(&self) -> usize {
        self.column_type
            .iter()
            .filter(|t| **t == ColumnType::MYSQL_TYPE_JSON as u8)
            .count()
    }

    /// Real type of the `i`-th column: resolves the ENUM/SET-inside-STRING
    /// and DATE/NEWDATE indirections.
    pub fn real_type(&self, i: usize) -> u8 {
        let column_type = self.column_type[i];

        if column_type == ColumnType::MYSQL_TYPE_STRING as u8 {
            let real = (self.column_meta[i] >> 8) as u8;
            if real == ColumnType::MYSQL_TYPE_ENUM as u8 || real == ColumnType::MYSQL_TYPE_SET as u8
            {
                return real;
            }
        } else if column_type == ColumnType::MYSQL_TYPE_DATE as u8 {
            return ColumnType::MYSQL_TYPE_NEWDATE as u8;
        }

        column_type
    }

    pub fn is_numeric_column(&self, i: usize) -> bool {
        ColumnType::try_from(self.real_type(i))
            .map(ColumnType::is_numeric_type)
            .unwrap_or(false)
    }

    /// `true` if the column type is considered a character type.
    ///
    /// GEOMETRY (like JSON, which is an alias for LONGTEXT there) counts as
    /// a character type on MariaDB.
    pub fn is_character_column(&self, i: usize) -> bool {
        match ColumnType::try_from(self.real_type(i)) {
            Ok(
                ColumnType::MYSQL_TYPE_STRING
                | ColumnType::MYSQL_TYPE_VAR_STRING
                | ColumnType::MYSQL_TYPE_VARCHAR
                | ColumnType::MYSQL_TYPE_BLOB,
            ) => true,
            Ok(ColumnType::MYSQL_TYPE_GEOMETRY) => self.flavor == BinlogFlavor::MariaDb,
            _ => false,
        }
    }

    pub fn is_enum_column(&self, i: usize) -> bool {
        self.real_type(i) == ColumnType::MYSQL_TYPE_ENUM as u8
    }

    pub fn is_set_column(&self, i: usize) -> bool {
        self.real_type(i) == ColumnType::MYSQL_TYPE_SET as u8
    }

    pub fn is_enum_or_set_column(&self, i: usize) -> bool {
        self.is_enum_column(i) || self.is_set_column(i)
    }

    pub fn is_geometry_column(&self, i: usize) -> bool {
        self.real_type(i) == ColumnType::MYSQL_TYPE_GEOMETRY as u8
    }

    /// Returns a map `column index -> unsigned`, covering numeric columns
    /// only. Empty if the signedness bitmap is not available.
    ///
    /// Signedness bits are enumerated MSB-first across numeric columns only.
    pub fn unsigned_map(&self) -> HashMap<usize, bool> {
        let mut map = HashMap::new();
        if self.signedness_bitmap.is_empty() {
            return map;
        }
        let bits =
            BitSlice::<Msb0, u8>::from_slice(&self.signedness_bitmap).expect("bitmap too big");

        let mut bit = 0;
        for i in 0..self.column_count() {
            if !self.is_numeric_column(i) {
                continue;
            }
            match bits.get(bit) {
                Some(unsigned) => map.insert(i, *unsigned),
                None => break,
            };
            bit += 1;
        }
        map
    }

    /// Returns a map `column index -> collation id` for character columns.
    pub fn collation_map(&self) -> HashMap<usize, u64> {
        self.build_collation_map(
            |i| self.is_character_column(i),
            &self.default_charset,
            &self.column_charset,
        )
    }

    /// Returns a map `column index -> collation id` for ENUM and SET columns.
    pub fn enum_set_collation_map(&self) -> HashMap<usize, u64> {
        self.build_collation_map(
            |i| self.is_enum_or_set_column(i),
            &self.enum_set_default_charset,
            &self.enum_set_column_charset,
        )
    }

    // The DEFAULT_CHARSET pairs are keyed by the index within the *filtered*
    // column sequence, not within all columns.
    fn build_collation_map(
        &self,
        includes: impl Fn(usize) -> bool,
        default_charset: &[u64],
        column_charset: &[u64],
    ) -> HashMap<usize, u64> {
        if let Some((&default_collation, overrides)) = default_charset.split_first() {
            let overrides: HashMap<u64, u64> = overrides
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect();

            let mut filtered = 0u64;
            let mut map = HashMap::new();
            for i in 0..self.column_count() {
                if !includes(i) {
                    continue;
                }
                let collation = overrides.get(&filtered).copied().unwrap_or(default_collation);
                map.insert(i, collation);
                filtered += 1;
            }
            return map;
        }

        if !column_charset.is_empty() {
            let mut filtered = 0;
            let mut map = HashMap::new();
            for i in 0..self.column_count() {
                if !includes(i) {
                    continue;
                }
                if let Some(&collation) = column_charset.get(filtered) {
                    map.insert(i, collation);
                }
                filtered += 1;
            }
            return map;
        }

        HashMap::new()
    }

    /// Returns a map `column index -> member strings` for ENUM columns.
    pub fn enum_str_value_map(&self) -> HashMap<usize, Vec<Vec<u8>>> {
        self.build_str_value_map(|i| self.is_enum_column(i), &self.enum_str_values)
    }

    /// Returns a map `column index -> member strings` for SET columns.
    pub fn set_str_value_map(&self) -> HashMap<usize, Vec<Vec<u8>>> {
        self.build_str_value_map(|i| self.is_set_column(i), &self.set_str_values)
    }

    fn build_str_value_map(
        &self,
        includes: impl Fn(usize) -> bool,
        values: &[Vec<Vec<u8>>],
    ) -> HashMap<usize, Vec<Vec<u8>>> {
        let mut map = HashMap::new();
        if values.is_empty() {
            return map;
        }
        let mut filtered = 0;
        for i in 0..self.column_count() {
            if !includes(i) {
                continue;
            }
            if let Some(vals) = values.get(filtered) {
                map.insert(i, vals.clone());
            }
            filtered += 1;
        }
        map
    }

    /// Returns a map `column index -> geometry type` for GEOMETRY columns.
    pub fn geometry_type_map(&self) -> HashMap<usize, u64> {
        let mut map = HashMap::new();
        if self.geometry_types.is_empty() {
            return map;
        }
        let mut filtered = 0;
        for i in 0..self.column_count() {
            if !self.is_geometry_column(i) {
                continue;
            }
            if let Some(&ty) = self.geometry_types.get(filtered) {
                map.insert(i, ty);
            }
            filtered += 1;
        }
        map
    }

    /// Returns a map `column index -> visible`. Empty if the visibility
    /// bitmap is not available.
    ///
    /// Visibility bits are enumerated MSB-first across all columns.
    pub fn visibility_map(&self) -> HashMap<usize, bool> {
        let mut map = HashMap::new();
        if self.visibility_bitmap.is_empty() {
            return map;
        }
        let bits =
            BitSlice::<Msb0, u8>::from_slice(&self.visibility_bitmap).expect("bitmap too big");
        for (i, visible) in bits.iter().take(self.column_count()).enumerate() {
            map.insert(i, *visible);
        }
        map
    }
}

impl fmt::Debug for TableMapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableMapEvent")
            .field("table_id", &self.table_id)
            .field("flags", &self.flags)
            .field("schema", &self.schema_str())
            .field("table", &self.table_str())
            .field(
                "column_type",
                &self
                    .column_type
                    .iter()
                    .map(|t| match ColumnType::try_from(*t) {
                        Ok(ty) => format!("{ty:?}"),
                        Err(raw) => format!("Unknown column type {}", raw.0),
                    })
                    .collect::<Vec<_>>(),
            )
            .field("column_meta", &self.column_meta)
            .field("null_bitmap", &self.null_bitmap)
            .field("column_names", &self.column_names.iter().map(|n| String::from_utf8_lossy(n)).collect::<Vec<_>>())
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

/// Consumes the per-column metadata block, deciding per type how many bytes
/// each column takes and how they pack into a 16-bit value.
fn decode_meta(column_type: &[u8], metadata: &[u8]) -> Result<Vec<u16>> {
    let mut buf = ParseBuf::new(metadata);
    let mut column_meta = Vec::with_capacity(column_type.len());

    for &t in column_type {
        let meta = match ColumnType::try_from(t).ok() {
            // high byte is the real type, low byte the pack/field length
            Some(ColumnType::MYSQL_TYPE_STRING) => {
                let bytes = buf.eat(2)?;
                ((bytes[0] as u16) << 8) | bytes[1] as u16
            }
            // high byte is the precision, low byte the scale
            Some(ColumnType::MYSQL_TYPE_NEWDECIMAL) => {
                let bytes = buf.eat(2)?;
                ((bytes[0] as u16) << 8) | bytes[1] as u16
            }
            Some(
                ColumnType::MYSQL_TYPE_VAR_STRING
                | ColumnType::MYSQL_TYPE_VARCHAR
                | ColumnType::MYSQL_TYPE_BIT,
            ) => buf.eat_u16_le()?,
            Some(
                ColumnType::MYSQL_TYPE_BLOB
                | ColumnType::MYSQL_TYPE_DOUBLE
                | ColumnType::MYSQL_TYPE_FLOAT
                | ColumnType::MYSQL_TYPE_GEOMETRY
                | ColumnType::MYSQL_TYPE_VECTOR
                | ColumnType::MYSQL_TYPE_JSON,
            ) => buf.eat_u8()? as u16,
            // fractional-second precision
            Some(
                ColumnType::MYSQL_TYPE_TIME2
                | ColumnType::MYSQL_TYPE_DATETIME2
                | ColumnType::MYSQL_TYPE_TIMESTAMP2,
            ) => buf.eat_u8()? as u16,
            Some(
                ColumnType::MYSQL_TYPE_NEWDATE
                | ColumnType::MYSQL_TYPE_ENUM
                | ColumnType::MYSQL_TYPE_SET
                | ColumnType::MYSQL_TYPE_TINY_BLOB
                | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
                | ColumnType::MYSQL_TYPE_LONG_BLOB,
            ) => return Err(EventError::UnsupportedType(t)),
            _ => 0,
        };
        column_meta.push(meta);
    }

    Ok(column_meta)
}

fn decode_int_seq(value: &[u8]) -> Result<Vec<u64>> {
    let mut buf = ParseBuf::new(value);
    let mut seq = Vec::new();
    while !buf.is_empty() {
        seq.push(buf.eat_lenenc_int()?);
    }
    Ok(seq)
}

fn decode_default_charset(value: &[u8]) -> Result<Vec<u64>> {
    let seq = decode_int_seq(value)?;
    if seq.len() % 2 != 1 {
        return Err(OptionalMetadataError::EvenDefaultCharsetCount(seq.len()).into());
    }
    Ok(seq)
}

fn decode_column_names(value: &[u8], column_count: usize) -> Result<Vec<Vec<u8>>> {
    let mut buf = ParseBuf::new(value);
    let mut names = Vec::with_capacity(column_count);
    while !buf.is_empty() {
        let len = buf.eat_u8()? as usize;
        names.push(buf.eat(len)?.to_vec());
    }
    if names.len() != column_count {
        return Err(OptionalMetadataError::ColumnNameCountMismatch {
            expected: column_count,
            actual: names.len(),
        }
        .into());
    }
    Ok(names)
}

fn decode_str_values(value: &[u8]) -> Result<Vec<Vec<Vec<u8>>>> {
    let mut buf = ParseBuf::new(value);
    let mut columns = Vec::new();
    while !buf.is_empty() {
        let count = buf.eat_lenenc_int()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(buf.eat_lenenc_str()?.to_vec());
        }
        columns.push(values);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ColumnType::*;

    /// Builds a table map body for the given columns. Optional metadata TLVs
    /// are appended verbatim.
    fn table_map_body(
        table_id: u64,
        columns: &[(ColumnType, &[u8])],
        null_bitmap: &[u8],
        optional: &[u8],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&table_id.to_le_bytes()[..6]);
        body.extend_from_slice(&[0x01, 0x00]); // flags
        body.push(4);
        body.extend_from_slice(b"test");
        body.push(0);
        body.push(2);
        body.extend_from_slice(b"t1");
        body.push(0);
        body.push(columns.len() as u8);
        for (ty, _) in columns {
            body.push(*ty as u8);
        }
        let meta_len: usize = columns.iter().map(|(_, m)| m.len()).sum();
        body.push(meta_len as u8);
        for (_, meta) in columns {
            body.extend_from_slice(meta);
        }
        body.extend_from_slice(null_bitmap);
        body.extend_from_slice(optional);
        body
    }

    #[test]
    fn basic_layout() {
        let body = table_map_body(
            1042,
            &[
                (MYSQL_TYPE_LONG, &[]),
                (MYSQL_TYPE_VARCHAR, &[0x2c, 0x01]),
                (MYSQL_TYPE_NEWDECIMAL, &[10, 2]),
                (MYSQL_TYPE_JSON, &[4]),
            ],
            &[0b0000_1010],
            &[],
        );

        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();
        assert_eq!(event.table_id, 1042);
        assert_eq!(event.flags, 1);
        assert_eq!(event.schema_str(), "test");
        assert_eq!(event.table_str(), "t1");
        assert_eq!(event.column_count(), 4);
        assert_eq!(event.column_meta, vec![0, 300, (10 << 8) | 2, 4]);
        assert_eq!(event.nullable(0), Some(false));
        assert_eq!(event.nullable(1), Some(true));
        assert_eq!(event.nullable(3), Some(true));
        assert_eq!(event.json_column_count(), 1);
    }

    #[test]
    fn four_byte_table_id() {
        let mut body = vec![0x39, 0x05, 0x00, 0x00]; // table id 1337
        body.extend_from_slice(&[0x00, 0x00]); // flags
        body.push(1);
        body.push(b'd');
        body.push(0);
        body.push(1);
        body.push(b't');
        body.push(0);
        body.push(1); // one column
        body.push(MYSQL_TYPE_TINY as u8);
        body.push(0); // empty metadata
        body.push(0x00); // null bitmap

        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 4).unwrap();
        assert_eq!(event.table_id, 1337);
        assert_eq!(event.column_meta, vec![0]);
    }

    #[test]
    fn direct_enum_type_is_unsupported() {
        let body = table_map_body(1, &[(MYSQL_TYPE_ENUM, &[])], &[0x00], &[]);
        assert!(matches!(
            TableMapEvent::decode(&body, BinlogFlavor::MySql, 6),
            Err(EventError::UnsupportedType(247))
        ));
    }

    #[test]
    fn truncated_null_bitmap() {
        let body = table_map_body(1, &[(MYSQL_TYPE_LONG, &[])], &[], &[]);
        assert!(matches!(
            TableMapEvent::decode(&body, BinlogFlavor::MySql, 6),
            Err(EventError::Truncated { .. })
        ));
    }

    fn optional_tlv(field_type: u8, value: &[u8]) -> Vec<u8> {
        let mut tlv = vec![field_type, value.len() as u8];
        tlv.extend_from_slice(value);
        tlv
    }

    #[test]
    fn optional_metadata_full() {
        let mut optional = Vec::new();
        // two numeric columns: first unsigned, second signed (MSB-first)
        optional.extend_from_slice(&optional_tlv(1, &[0b1000_0000]));
        // default charset 45, no overrides
        optional.extend_from_slice(&optional_tlv(2, &[45]));
        // column names
        let mut names = Vec::new();
        for name in [&b"id"[..], b"score", b"name", b"tags"] {
            names.push(name.len() as u8);
            names.extend_from_slice(name);
        }
        optional.extend_from_slice(&optional_tlv(4, &names));
        // SET column member strings: one SET column with members a, bc
        optional.extend_from_slice(&optional_tlv(5, &[2, 1, b'a', 2, b'b', b'c']));
        // simple primary key on column 0
        optional.extend_from_slice(&optional_tlv(8, &[0]));
        // column visibility, MSB-first: all four visible
        optional.extend_from_slice(&optional_tlv(12, &[0b1111_0000]));
        // unknown field type must be skipped
        optional.extend_from_slice(&optional_tlv(200, &[1, 2, 3]));

        let body = table_map_body(
            7,
            &[
                (MYSQL_TYPE_LONG, &[]),
                (MYSQL_TYPE_NEWDECIMAL, &[10, 2]),
                (MYSQL_TYPE_VARCHAR, &[0x20, 0x00]),
                // SET reaches the binlog as STRING with a real-type meta
                (MYSQL_TYPE_STRING, &[MYSQL_TYPE_SET as u8, 1]),
            ],
            &[0b0000_0000],
            &optional,
        );

        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();

        assert!(event.is_numeric_column(0));
        assert!(event.is_numeric_column(1));
        assert!(event.is_character_column(2));
        assert!(event.is_set_column(3));

        let unsigned = event.unsigned_map();
        assert_eq!(unsigned.len(), 2);
        assert_eq!(unsigned[&0], true);
        assert_eq!(unsigned[&1], false);

        let collations = event.collation_map();
        assert_eq!(collations.len(), 1);
        assert_eq!(collations[&2], 45);

        assert_eq!(
            event.column_names,
            vec![b"id".to_vec(), b"score".to_vec(), b"name".to_vec(), b"tags".to_vec()]
        );

        let sets = event.set_str_value_map();
        assert_eq!(sets[&3], vec![b"a".to_vec(), b"bc".to_vec()]);

        assert_eq!(event.primary_key, vec![0]);
        assert_eq!(event.primary_key_prefix, vec![0]);

        let visibility = event.visibility_map();
        assert_eq!(visibility.len(), 4);
        assert!(visibility.values().all(|v| *v));
    }

    #[test]
    fn default_charset_overrides_are_keyed_by_filtered_index() {
        // columns: LONG, VARCHAR, VARCHAR; override the *second* character
        // column (filtered index 1) to collation 63
        let mut optional = Vec::new();
        optional.extend_from_slice(&optional_tlv(2, &[45, 1, 63]));

        let body = table_map_body(
            7,
            &[
                (MYSQL_TYPE_LONG, &[]),
                (MYSQL_TYPE_VARCHAR, &[0x20, 0x00]),
                (MYSQL_TYPE_VARCHAR, &[0x20, 0x00]),
            ],
            &[0x00],
            &optional,
        );
        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();

        let collations = event.collation_map();
        assert_eq!(collations[&1], 45);
        assert_eq!(collations[&2], 63);
        assert!(!collations.contains_key(&0));
    }

    #[test]
    fn even_default_charset_count_is_malformed() {
        let mut optional = Vec::new();
        optional.extend_from_slice(&optional_tlv(2, &[45, 1]));

        let body = table_map_body(7, &[(MYSQL_TYPE_VARCHAR, &[0x20, 0x00])], &[0x00], &optional);
        assert!(matches!(
            TableMapEvent::decode(&body, BinlogFlavor::MySql, 6),
            Err(EventError::MalformedOptionalMetadata(
                OptionalMetadataError::EvenDefaultCharsetCount(2)
            ))
        ));
    }

    #[test]
    fn column_name_count_mismatch_is_malformed() {
        let mut optional = Vec::new();
        optional.extend_from_slice(&optional_tlv(4, &[1, b'a'])); // one name, two columns

        let body = table_map_body(
            7,
            &[(MYSQL_TYPE_LONG, &[]), (MYSQL_TYPE_LONG, &[])],
            &[0x00],
            &optional,
        );
        assert!(matches!(
            TableMapEvent::decode(&body, BinlogFlavor::MySql, 6),
            Err(EventError::MalformedOptionalMetadata(
                OptionalMetadataError::ColumnNameCountMismatch {
                    expected: 2,
                    actual: 1
                }
            ))
        ));
    }

    #[test]
    fn primary_key_with_prefix_pairs() {
        let mut optional = Vec::new();
        optional.extend_from_slice(&optional_tlv(9, &[0, 0, 1, 10]));

        let body = table_map_body(
            7,
            &[(MYSQL_TYPE_LONG, &[]), (MYSQL_TYPE_VARCHAR, &[0x20, 0x00])],
            &[0x00],
            &optional,
        );
        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();
        assert_eq!(event.primary_key, vec![0, 1]);
        assert_eq!(event.primary_key_prefix, vec![0, 10]);
    }

    #[test]
    fn geometry_counts_as_character_on_mariadb_only() {
        let body = table_map_body(7, &[(MYSQL_TYPE_GEOMETRY, &[4])], &[0x00], &[]);

        let mysql = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();
        assert!(!mysql.is_character_column(0));
        assert!(mysql.is_geometry_column(0));

        let mariadb = TableMapEvent::decode(&body, BinlogFlavor::MariaDb, 6).unwrap();
        assert!(mariadb.is_character_column(0));
    }

    #[test]
    fn real_type_resolves_date() {
        let body = table_map_body(7, &[(MYSQL_TYPE_DATE, &[])], &[0x00], &[]);
        let event = TableMapEvent::decode(&body, BinlogFlavor::MySql, 6).unwrap();
        assert_eq!(event.real_type(0), MYSQL_TYPE_NEWDATE as u8);
    }
}
