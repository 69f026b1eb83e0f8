// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Rows events: WRITE, UPDATE and DELETE in all their variants.

use std::{borrow::Cow, collections::HashMap, fmt, io::Read};

use bitflags::bitflags;
use bitvec::{order::Lsb0, slice::BitSlice};

use crate::{
    constants::{extra_row_info, ColumnType, EventType},
    error::{EventError, ParseRowsError, Result},
    io::ParseBuf,
    value::{decode_value, BinlogValue},
    DecodeOptions,
};

use super::table_map_event::TableMapEvent;

bitflags! {
    /// Rows event flags.
    pub struct RowsEventFlags: u16 {
        /// Last event of a statement.
        const STMT_END = 0x0001;
        /// No foreign key checks.
        const NO_FOREIGN_KEY_CHECKS = 0x0002;
        /// No unique key checks.
        const RELAXED_UNIQUE_CHECKS = 0x0004;
        /// Indicates that rows in this event are complete, that is contain
        /// values for all columns of the table.
        const COMPLETE_ROWS = 0x0008;
    }
}

/// Operation that produced a rows event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowsEventKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for RowsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("insert"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Which side of a change a row image belongs to.
///
/// See `enum_row_image_type` in sql/rpl_record.h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowImageType {
    WriteAi,
    UpdateBi,
    UpdateAi,
    DeleteBi,
}

/// `binlog_row_value_options` bit: JSON updates are logged in partial form.
const PARTIAL_JSON_UPDATES: u64 = 0x01;

/// A decoded row image: one entry per table column. `None` marks a column
/// absent from the image, `Some(BinlogValue::Null)` marks SQL NULL.
pub type BinlogRow = Vec<Option<BinlogValue>>;

/// A decoded rows event.
///
/// By default MySql and MariaDB log the full row image, in which case the
/// column bitmaps have every bit set and `skipped_columns` entries are
/// empty; see `binlog_row_image`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowsEvent<'a> {
    /// Rows-event version: 0, 1 or 2.
    pub version: u8,
    /// The exact variant this event arrived as.
    pub event_type: EventType,
    /// The table map event this rows event was resolved against.
    ///
    /// If the table id is `0x00ffffff` it is a dummy event that should have
    /// the end of statement flag set, declaring that all table maps can be
    /// freed. Otherwise it refers to a table defined by a table map event.
    pub table: &'a TableMapEvent,
    pub table_id: u64,
    /// Raw rows event flags (see [`RowsEventFlags`]).
    pub flags: u16,

    /// Extra row info of type NDB (v2 only).
    pub ndb_format: u8,
    pub ndb_data: Vec<u8>,
    /// Extra row info of type PARTITION (v2 only).
    pub partition_id: u16,
    /// Set only for UPDATE-family events.
    pub source_partition_id: u16,

    /// Number of columns as carried by the event.
    pub column_count: usize,
    /// Which columns are present in the (first) image; one bit per column,
    /// LSB-first.
    pub column_bitmap1: Vec<u8>,
    /// Same shape, for the after-image. Present iff the event is
    /// UPDATE-family.
    pub column_bitmap2: Vec<u8>,

    /// Decoded row images. For UPDATE-family events the images alternate
    /// *before, after, before, after, ...*.
    pub rows: Vec<BinlogRow>,
    /// Per row image: the column indexes whose presence bit was clear.
    pub skipped_columns: Vec<Vec<usize>>,
}

impl<'a> RowsEvent<'a> {
    /// Decodes a rows event body against the stream's table map cache.
    ///
    /// `event_type` must be one of the rows event variants and
    /// `table_id_size` (4 or 6) must match the stream's format description
    /// event. The referenced [`TableMapEvent`] must already be in `tables`.
    pub fn decode(
        data: &[u8],
        event_type: EventType,
        table_id_size: usize,
        tables: &'a HashMap<u64, TableMapEvent>,
        opts: &DecodeOptions,
    ) -> Result<Self> {
        let version = event_type
            .rows_version()
            .ok_or(EventError::UnsupportedType(event_type as u8))?;
        let needs_bitmap2 = event_type.needs_bitmap2();
        let compressed = event_type.is_compressed_rows_event();

        let mut buf = ParseBuf::new(data);

        let table_id = buf.eat_uint_le(table_id_size)?;
        let flags = buf.eat_u16_le()?;

        let mut ndb_format = 0u8;
        let mut ndb_data = Vec::new();
        let mut partition_id = 0u16;
        let mut source_partition_id = 0u16;

        if version == 2 {
            let extra_len = buf.eat_u16_le()? as usize;
            let extra = buf.eat(extra_len.saturating_sub(2))?;
            if extra_len > 2 {
                let mut extra = ParseBuf::new(extra);
                match extra.eat_u8()? {
                    extra_row_info::NDB => {
                        let len = extra.eat_u8()? as usize;
                        ndb_format = extra.eat_u8()?;
                        ndb_data = extra.eat(len.saturating_sub(2))?.to_vec();
                    }
                    extra_row_info::PARTITION => {
                        partition_id = extra.eat_u16_le()?;
                        if needs_bitmap2 {
                            source_partition_id = extra.eat_u16_le()?;
                        }
                    }
                    // unknown extra row info is skipped
                    _ => {}
                }
            }
        }

        let column_count = buf.eat_lenenc_int()? as usize;
        let bitmap_len = (column_count + 7) / 8;
        let column_bitmap1 = buf.eat(bitmap_len)?.to_vec();
        let column_bitmap2 = if needs_bitmap2 {
            buf.eat(bitmap_len)?.to_vec()
        } else {
            Vec::new()
        };

        let table = match tables.get(&table_id) {
            Some(table) => table,
            None if tables.is_empty() => return Err(EventError::MissingTableMap(table_id)),
            None => return Err(EventError::UnknownTableId(table_id)),
        };

        let body: Cow<'_, [u8]> = if compressed {
            Cow::Owned(decompress_mariadb(buf.remaining())?)
        } else {
            Cow::Borrowed(buf.remaining())
        };

        let first_image = match event_type {
            EventType::WRITE_ROWS_EVENT_V0
            | EventType::WRITE_ROWS_EVENT_V1
            | EventType::WRITE_ROWS_EVENT
            | EventType::MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1 => RowImageType::WriteAi,
            EventType::DELETE_ROWS_EVENT_V0
            | EventType::DELETE_ROWS_EVENT_V1
            | EventType::DELETE_ROWS_EVENT
            | EventType::MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1 => RowImageType::DeleteBi,
            _ => RowImageType::UpdateBi,
        };

        let mut rows = Vec::new();
        let mut skipped_columns = Vec::new();

        let decoded = decode_body(
            &body,
            table,
            opts,
            event_type,
            column_count,
            &column_bitmap1,
            &column_bitmap2,
            needs_bitmap2,
            first_image,
            &mut rows,
            &mut skipped_columns,
        );
        if let Err(source) = decoded {
            return Err(EventError::ParseRows(Box::new(ParseRowsError {
                schema: table.schema_str().into_owned(),
                table: table.table_str().into_owned(),
                table_id,
                rows_decoded: rows.len(),
                data: body.into_owned(),
                source,
            })));
        }

        Ok(RowsEvent {
            version,
            event_type,
            table,
            table_id,
            flags,
            ndb_format,
            ndb_data,
            partition_id,
            source_partition_id,
            column_count,
            column_bitmap1,
            column_bitmap2,
            rows,
            skipped_columns,
        })
    }

    /// The operation this event logs.
    pub fn kind(&self) -> RowsEventKind {
        match self.event_type {
            EventType::WRITE_ROWS_EVENT_V0
            | EventType::WRITE_ROWS_EVENT_V1
            | EventType::WRITE_ROWS_EVENT
            | EventType::MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1 => RowsEventKind::Insert,
            EventType::DELETE_ROWS_EVENT_V0
            | EventType::DELETE_ROWS_EVENT_V1
            | EventType::DELETE_ROWS_EVENT
            | EventType::MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1 => RowsEventKind::Delete,
            _ => RowsEventKind::Update,
        }
    }

    /// Parsed flags of this event. Unknown bits are dropped.
    pub fn event_flags(&self) -> RowsEventFlags {
        RowsEventFlags::from_bits_truncate(self.flags)
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_body(
    data: &[u8],
    table: &TableMapEvent,
    opts: &DecodeOptions,
    event_type: EventType,
    column_count: usize,
    bitmap1: &[u8],
    bitmap2: &[u8],
    needs_bitmap2: bool,
    first_image: RowImageType,
    rows: &mut Vec<BinlogRow>,
    skipped_columns: &mut Vec<Vec<usize>>,
) -> Result<()> {
    let mut buf = ParseBuf::new(data);
    while !buf.is_empty() {
        decode_image(
            &mut buf,
            table,
            opts,
            event_type,
            column_count,
            bitmap1,
            first_image,
            rows,
            skipped_columns,
        )?;
        if needs_bitmap2 {
            decode_image(
                &mut buf,
                table,
                opts,
                event_type,
                column_count,
                bitmap2,
                RowImageType::UpdateAi,
                rows,
                skipped_columns,
            )?;
        }
    }
    Ok(())
}

/// Decodes one row image: the per-image null bitmap followed by the values
/// of every present, non-null column.
#[allow(clippy::too_many_arguments)]
fn decode_image(
    buf: &mut ParseBuf<'_>,
    table: &TableMapEvent,
    opts: &DecodeOptions,
    event_type: EventType,
    column_count: usize,
    bitmap: &[u8],
    image_type: RowImageType,
    rows: &mut Vec<BinlogRow>,
    skipped_columns: &mut Vec<Vec<usize>>,
) -> Result<()> {
    // see WL#2955: the after-image of a partial update starts with
    // binlog_row_value_options and, when partial JSON is on, a bitmap over
    // all JSON columns
    let mut partial_json = false;
    let mut partial_bitmap: &[u8] = &[];
    if event_type == EventType::PARTIAL_UPDATE_ROWS_EVENT && image_type == RowImageType::UpdateAi {
        let value_options = buf.eat_lenenc_int()?;
        partial_json = value_options & PARTIAL_JSON_UPDATES != 0;
        if partial_json {
            partial_bitmap = buf.eat((table.json_column_count() + 7) / 8)?;
        }
    }

    let present_bits = BitSlice::<Lsb0, u8>::from_slice(bitmap).expect("bitmap too big");
    let present = present_bits[..column_count].count_ones();

    let null_bytes = buf.eat((present + 7) / 8)?;
    let null_bits = BitSlice::<Lsb0, u8>::from_slice(null_bytes).expect("bitmap too big");
    let partial_bits = BitSlice::<Lsb0, u8>::from_slice(partial_bitmap).expect("bitmap too big");

    let mut row: BinlogRow = vec![None; column_count];
    let mut skips = Vec::new();

    let mut partial_idx = 0usize;
    let mut null_idx = 0usize;

    for i in 0..column_count {
        let column_type =
            *table
                .column_type
                .get(i)
                .ok_or(EventError::UnknownColumnType {
                    index: i,
                    column_count: table.column_count(),
                })?;

        // The partial bitmap covers every JSON column whether or not the
        // image includes it, so this cursor moves before the presence check.
        let is_partial = partial_json
            && column_type == ColumnType::MYSQL_TYPE_JSON as u8
            && {
                let set = partial_bits
                    .get(partial_idx)
                    .as_deref()
                    .copied()
                    .unwrap_or(false);
                partial_idx += 1;
                set
            };

        if !present_bits.get(i).as_deref().copied().unwrap_or(false) {
            skips.push(i);
            continue;
        }

        let is_null = null_bits
            .get(null_idx)
            .as_deref()
            .copied()
            .unwrap_or(true);
        null_idx += 1;
        if is_null {
            row[i] = Some(BinlogValue::Null);
            continue;
        }

        let meta = table.column_meta.get(i).copied().unwrap_or(0);
        row[i] = Some(decode_value(buf, column_type, meta, is_partial, opts)?);
    }

    rows.push(row);
    skipped_columns.push(skips);
    Ok(())
}

/// Inflates a MariaDB compressed rows event body.
///
/// The body starts with one header byte: the top three bits must be `100`,
/// the low three give the byte count of the big-endian uncompressed-length
/// field that follows. The zlib stream starts after that field.
fn decompress_mariadb(data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = ParseBuf::new(data);
    let header = buf.eat_u8()?;
    if header & 0xe0 != 0x80 {
        return Err(EventError::Decompress(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("bad compressed event header {header:#04x}"),
        )));
    }
    let len_len = (header & 0x07) as usize;
    let expected = buf.eat_uint_be(len_len)? as usize;

    let mut out = Vec::with_capacity(expected);
    flate2::read::ZlibDecoder::new(buf.remaining())
        .read_to_end(&mut out)
        .map_err(EventError::Decompress)?;
    Ok(out)
}
