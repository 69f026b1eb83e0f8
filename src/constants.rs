// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Protocol constants shared by the table map and rows decoders.

/// Type of a MySQL column as stored in a table map event.
///
/// Values match `enum_field_types` in `include/field_types.h`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL = 0,
    MYSQL_TYPE_TINY = 1,
    MYSQL_TYPE_SHORT = 2,
    MYSQL_TYPE_LONG = 3,
    MYSQL_TYPE_FLOAT = 4,
    MYSQL_TYPE_DOUBLE = 5,
    MYSQL_TYPE_NULL = 6,
    MYSQL_TYPE_TIMESTAMP = 7,
    MYSQL_TYPE_LONGLONG = 8,
    MYSQL_TYPE_INT24 = 9,
    MYSQL_TYPE_DATE = 10,
    MYSQL_TYPE_TIME = 11,
    MYSQL_TYPE_DATETIME = 12,
    MYSQL_TYPE_YEAR = 13,
    /// Internal. Never appears in a binlog directly.
    MYSQL_TYPE_NEWDATE = 14,
    MYSQL_TYPE_VARCHAR = 15,
    MYSQL_TYPE_BIT = 16,
    MYSQL_TYPE_TIMESTAMP2 = 17,
    MYSQL_TYPE_DATETIME2 = 18,
    MYSQL_TYPE_TIME2 = 19,
    /// Used for replication of arrays (MySql 8.0.17+).
    MYSQL_TYPE_TYPED_ARRAY = 20,
    MYSQL_TYPE_VECTOR = 242,
    MYSQL_TYPE_INVALID = 243,
    MYSQL_TYPE_BOOL = 244,
    MYSQL_TYPE_JSON = 245,
    MYSQL_TYPE_NEWDECIMAL = 246,
    /// Internal. Reaches a binlog as `MYSQL_TYPE_STRING` with a real-type meta.
    MYSQL_TYPE_ENUM = 247,
    /// Internal. Reaches a binlog as `MYSQL_TYPE_STRING` with a real-type meta.
    MYSQL_TYPE_SET = 248,
    /// Internal.
    MYSQL_TYPE_TINY_BLOB = 249,
    /// Internal.
    MYSQL_TYPE_MEDIUM_BLOB = 250,
    /// Internal.
    MYSQL_TYPE_LONG_BLOB = 251,
    MYSQL_TYPE_BLOB = 252,
    MYSQL_TYPE_VAR_STRING = 253,
    MYSQL_TYPE_STRING = 254,
    MYSQL_TYPE_GEOMETRY = 255,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown column type {}", _0)]
#[repr(transparent)]
pub struct UnknownColumnType(pub u8);

impl From<UnknownColumnType> for u8 {
    fn from(x: UnknownColumnType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = UnknownColumnType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::MYSQL_TYPE_DECIMAL),
            1 => Ok(Self::MYSQL_TYPE_TINY),
            2 => Ok(Self::MYSQL_TYPE_SHORT),
            3 => Ok(Self::MYSQL_TYPE_LONG),
            4 => Ok(Self::MYSQL_TYPE_FLOAT),
            5 => Ok(Self::MYSQL_TYPE_DOUBLE),
            6 => Ok(Self::MYSQL_TYPE_NULL),
            7 => Ok(Self::MYSQL_TYPE_TIMESTAMP),
            8 => Ok(Self::MYSQL_TYPE_LONGLONG),
            9 => Ok(Self::MYSQL_TYPE_INT24),
            10 => Ok(Self::MYSQL_TYPE_DATE),
            11 => Ok(Self::MYSQL_TYPE_TIME),
            12 => Ok(Self::MYSQL_TYPE_DATETIME),
            13 => Ok(Self::MYSQL_TYPE_YEAR),
            14 => Ok(Self::MYSQL_TYPE_NEWDATE),
            15 => Ok(Self::MYSQL_TYPE_VARCHAR),
            16 => Ok(Self::MYSQL_TYPE_BIT),
            17 => Ok(Self::MYSQL_TYPE_TIMESTAMP2),
            18 => Ok(Self::MYSQL_TYPE_DATETIME2),
            19 => Ok(Self::MYSQL_TYPE_TIME2),
            20 => Ok(Self::MYSQL_TYPE_TYPED_ARRAY),
            242 => Ok(Self::MYSQL_TYPE_VECTOR),
            243 => Ok(Self::MYSQL_TYPE_INVALID),
            244 => Ok(Self::MYSQL_TYPE_BOOL),
            245 => Ok(Self::MYSQL_TYPE_JSON),
            246 => Ok(Self::MYSQL_TYPE_NEWDECIMAL),
            247 => Ok(Self::MYSQL_TYPE_ENUM),
            248 => Ok(Self::MYSQL_TYPE_SET),
            249 => Ok(Self::MYSQL_TYPE_TINY_BLOB),
            250 => Ok(Self::MYSQL_TYPE_MEDIUM_BLOB),
            251 => Ok(Self::MYSQL_TYPE_LONG_BLOB),
            252 => Ok(Self::MYSQL_TYPE_BLOB),
            253 => Ok(Self::MYSQL_TYPE_VAR_STRING),
            254 => Ok(Self::MYSQL_TYPE_STRING),
            255 => Ok(Self::MYSQL_TYPE_GEOMETRY),
            x => Err(UnknownColumnType(x)),
        }
    }
}

impl ColumnType {
    /// `true` for the types the signedness bitmap enumerates.
    pub fn is_numeric_type(self) -> bool {
        matches!(
            self,
            Self::MYSQL_TYPE_TINY
                | Self::MYSQL_TYPE_SHORT
                | Self::MYSQL_TYPE_INT24
                | Self::MYSQL_TYPE_LONG
                | Self::MYSQL_TYPE_LONGLONG
                | Self::MYSQL_TYPE_NEWDECIMAL
                | Self::MYSQL_TYPE_FLOAT
                | Self::MYSQL_TYPE_DOUBLE
        )
    }

    pub fn is_enum_or_set_type(self) -> bool {
        matches!(self, Self::MYSQL_TYPE_ENUM | Self::MYSQL_TYPE_SET)
    }
}

/// Real type of a `MYSQL_TYPE_GEOMETRY` column, as carried by the
/// `GEOMETRY_TYPE` optional metadata field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum GeometryType {
    GEOMETRY = 0,
    POINT = 1,
    LINESTRING = 2,
    POLYGON = 3,
    MULTIPOINT = 4,
    MULTILINESTRING = 5,
    MULTIPOLYGON = 6,
    GEOMETRYCOLLECTION = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown geometry type {}", _0)]
#[repr(transparent)]
pub struct UnknownGeometryType(pub u8);

impl From<UnknownGeometryType> for u8 {
    fn from(x: UnknownGeometryType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for GeometryType {
    type Error = UnknownGeometryType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::GEOMETRY),
            1 => Ok(Self::POINT),
            2 => Ok(Self::LINESTRING),
            3 => Ok(Self::POLYGON),
            4 => Ok(Self::MULTIPOINT),
            5 => Ok(Self::MULTILINESTRING),
            6 => Ok(Self::MULTIPOLYGON),
            7 => Ok(Self::GEOMETRYCOLLECTION),
            x => Err(UnknownGeometryType(x)),
        }
    }
}

/// Type of an optional metadata field in a table map event.
///
/// Optional metadata is stored as repeated Type-Length-Value records;
/// unrecognised types must be skipped by readers.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OptionalMetadataFieldType {
    /// Signedness of numeric colums, one bit per numeric column, MSB-first.
    SIGNEDNESS = 1,
    /// Default collation plus (column, collation) overrides for character columns.
    DEFAULT_CHARSET = 2,
    /// One collation per character column.
    COLUMN_CHARSET = 3,
    /// One name per column.
    COLUMN_NAME = 4,
    /// String values of SET columns.
    SET_STR_VALUE = 5,
    /// String values of ENUM columns.
    ENUM_STR_VALUE = 6,
    /// Real type of geometry columns.
    GEOMETRY_TYPE = 7,
    /// Primary key without any prefix.
    SIMPLE_PRIMARY_KEY = 8,
    /// Primary key with prefix.
    PRIMARY_KEY_WITH_PREFIX = 9,
    /// Charsets of ENUM and SET columns (default form).
    ENUM_AND_SET_DEFAULT_CHARSET = 10,
    /// Charsets of ENUM and SET columns (per-column form).
    ENUM_AND_SET_COLUMN_CHARSET = 11,
    /// Column visibility, one bit per column, MSB-first (MySql 8.0.23+).
    COLUMN_VISIBILITY = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown optional metadata field type {}", _0)]
#[repr(transparent)]
pub struct UnknownOptionalMetadataFieldType(pub u8);

impl From<UnknownOptionalMetadataFieldType> for u8 {
    fn from(x: UnknownOptionalMetadataFieldType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for OptionalMetadataFieldType {
    type Error = UnknownOptionalMetadataFieldType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::SIGNEDNESS),
            2 => Ok(Self::DEFAULT_CHARSET),
            3 => Ok(Self::COLUMN_CHARSET),
            4 => Ok(Self::COLUMN_NAME),
            5 => Ok(Self::SET_STR_VALUE),
            6 => Ok(Self::ENUM_STR_VALUE),
            7 => Ok(Self::GEOMETRY_TYPE),
            8 => Ok(Self::SIMPLE_PRIMARY_KEY),
            9 => Ok(Self::PRIMARY_KEY_WITH_PREFIX),
            10 => Ok(Self::ENUM_AND_SET_DEFAULT_CHARSET),
            11 => Ok(Self::ENUM_AND_SET_COLUMN_CHARSET),
            12 => Ok(Self::COLUMN_VISIBILITY),
            x => Err(UnknownOptionalMetadataFieldType(x)),
        }
    }
}

/// Type code of an extra-row-info record in a v2 rows event post-header.
pub mod extra_row_info {
    /// NDB-originated row info.
    pub const NDB: u8 = 0;
    /// Partition info (insert/update/delete into a partitioned table).
    pub const PARTITION: u8 = 1;
}

/// Binlog event types that concern row-based replication.
///
/// The MariaDB block (`0xa0..`) covers the compressed rows events of
/// MariaDB 10.2+.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventType {
    TABLE_MAP_EVENT = 0x13,
    /// Obsolete v0 variant (MySql 5.1.0 - 5.1.15).
    WRITE_ROWS_EVENT_V0 = 0x14,
    /// Obsolete v0 variant (MySql 5.1.0 - 5.1.15).
    UPDATE_ROWS_EVENT_V0 = 0x15,
    /// Obsolete v0 variant (MySql 5.1.0 - 5.1.15).
    DELETE_ROWS_EVENT_V0 = 0x16,
    WRITE_ROWS_EVENT_V1 = 0x17,
    UPDATE_ROWS_EVENT_V1 = 0x18,
    DELETE_ROWS_EVENT_V1 = 0x19,
    WRITE_ROWS_EVENT = 0x1e,
    UPDATE_ROWS_EVENT = 0x1f,
    DELETE_ROWS_EVENT = 0x20,
    /// Extension of UPDATE_ROWS_EVENT, allowing partial JSON values according
    /// to binlog_row_value_options.
    PARTIAL_UPDATE_ROWS_EVENT = 0x27,
    MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1 = 0xa6,
    MARIADB_UPDATE_ROWS_COMPRESSED_EVENT_V1 = 0xa7,
    MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1 = 0xa8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown event type {}", _0)]
#[repr(transparent)]
pub struct UnknownEventType(pub u8);

impl From<UnknownEventType> for u8 {
    fn from(x: UnknownEventType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for EventType {
    type Error = UnknownEventType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x13 => Ok(Self::TABLE_MAP_EVENT),
            0x14 => Ok(Self::WRITE_ROWS_EVENT_V0),
            0x15 => Ok(Self::UPDATE_ROWS_EVENT_V0),
            0x16 => Ok(Self::DELETE_ROWS_EVENT_V0),
            0x17 => Ok(Self::WRITE_ROWS_EVENT_V1),
            0x18 => Ok(Self::UPDATE_ROWS_EVENT_V1),
            0x19 => Ok(Self::DELETE_ROWS_EVENT_V1),
            0x1e => Ok(Self::WRITE_ROWS_EVENT),
            0x1f => Ok(Self::UPDATE_ROWS_EVENT),
            0x20 => Ok(Self::DELETE_ROWS_EVENT),
            0x27 => Ok(Self::PARTIAL_UPDATE_ROWS_EVENT),
            0xa6 => Ok(Self::MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1),
            0xa7 => Ok(Self::MARIADB_UPDATE_ROWS_COMPRESSED_EVENT_V1),
            0xa8 => Ok(Self::MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1),
            x => Err(UnknownEventType(x)),
        }
    }
}

impl EventType {
    /// Rows-event version (0, 1 or 2), or `None` for non-rows events.
    pub fn rows_version(self) -> Option<u8> {
        match self {
            Self::WRITE_ROWS_EVENT_V0 | Self::UPDATE_ROWS_EVENT_V0 | Self::DELETE_ROWS_EVENT_V0 => {
                Some(0)
            }
            Self::WRITE_ROWS_EVENT_V1
            | Self::UPDATE_ROWS_EVENT_V1
            | Self::DELETE_ROWS_EVENT_V1
            | Self::MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1
            | Self::MARIADB_UPDATE_ROWS_COMPRESSED_EVENT_V1
            | Self::MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1 => Some(1),
            Self::WRITE_ROWS_EVENT
            | Self::UPDATE_ROWS_EVENT
            | Self::DELETE_ROWS_EVENT
            | Self::PARTIAL_UPDATE_ROWS_EVENT => Some(2),
            Self::TABLE_MAP_EVENT => None,
        }
    }

    pub fn is_rows_event(self) -> bool {
        self.rows_version().is_some()
    }

    /// `true` for UPDATE-family events that carry a second (after-image)
    /// column bitmap. The obsolete v0 update event predates the second
    /// bitmap.
    pub fn needs_bitmap2(self) -> bool {
        matches!(
            self,
            Self::UPDATE_ROWS_EVENT_V1
                | Self::UPDATE_ROWS_EVENT
                | Self::PARTIAL_UPDATE_ROWS_EVENT
                | Self::MARIADB_UPDATE_ROWS_COMPRESSED_EVENT_V1
        )
    }

    /// `true` for MariaDB `*_COMPRESSED_EVENT_V1` rows events, whose body is
    /// a zlib-compressed copy of the corresponding uncompressed body.
    pub fn is_compressed_rows_event(self) -> bool {
        matches!(
            self,
            Self::MARIADB_WRITE_ROWS_COMPRESSED_EVENT_V1
                | Self::MARIADB_UPDATE_ROWS_COMPRESSED_EVENT_V1
                | Self::MARIADB_DELETE_ROWS_COMPRESSED_EVENT_V1
        )
    }
}
