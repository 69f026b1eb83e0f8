// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoder for MySql/MariaDB row-based binlog events.
//!
//! This crate turns the bodies of `TABLE_MAP_EVENT` and the rows events
//! (WRITE/UPDATE/DELETE in their v0/v1/v2 forms, MariaDB's compressed
//! variants and MySql's `PARTIAL_UPDATE_ROWS_EVENT`) into typed column
//! values, faithful to the on-disk numeric, temporal, decimal, string,
//! enum/set, bit, blob, geometry and JSON encodings.
//!
//! It operates strictly on event *bodies*: the common binlog event header
//! and the checksum trailer must already be stripped by the surrounding
//! stream reader, which also supplies the table-id width (from the format
//! description event), the event type and the server flavor.
//!
//! The stream reader owns a `table_id -> TableMapEvent` map, updated on
//! every table map event; rows events borrow their table map from it:
//!
//! ```ignore
//! use std::collections::HashMap;
//! use mysql_rowlog::{BinlogFlavor, DecodeOptions, RowsEvent, TableMapEvent};
//!
//! let mut tables: HashMap<u64, TableMapEvent> = HashMap::new();
//!
//! let table_map = TableMapEvent::decode(table_map_body, BinlogFlavor::MySql, 6)?;
//! tables.insert(table_map.table_id, table_map);
//!
//! let rows = RowsEvent::decode(rows_body, event_type, 6, &tables, &DecodeOptions::default())?;
//! for row in &rows.rows {
//!     // one Option<BinlogValue> per column
//! }
//! ```
//!
//! Decoders are pure: a call consumes a byte slice and either produces an
//! owned result or fails with an [`error::EventError`]; no state is shared
//! and table maps may be used from multiple threads once decoded.

pub mod constants;
pub mod decimal;
pub mod error;
pub mod events;
pub mod io;
pub mod jsonb;
pub mod jsondiff;
pub mod value;

mod time;

pub use self::{
    error::{EventError, OptionalMetadataError, ParseRowsError},
    events::{BinlogRow, RowsEvent, RowsEventFlags, RowsEventKind, TableMapEvent},
    jsondiff::{JsonDiff, JsonDiffOperation},
    value::BinlogValue,
};

/// Which server produced the stream.
///
/// The flavors diverge in a few metadata details; here it decides whether
/// GEOMETRY counts as a character column for charset metadata (it does on
/// MariaDB, where spatial and JSON types are stored as long text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinlogFlavor {
    MySql,
    MariaDb,
}

impl std::str::FromStr for BinlogFlavor {
    type Err = UnknownBinlogFlavor;

    fn from_str(s: &str) -> Result<Self, UnknownBinlogFlavor> {
        match s {
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            other => Err(UnknownBinlogFlavor(other.into())),
        }
    }
}

impl std::fmt::Display for BinlogFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySql => f.write_str("mysql"),
            Self::MariaDb => f.write_str("mariadb"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown binlog flavor {:?}", _0)]
pub struct UnknownBinlogFlavor(pub String);

/// Options controlling how rows events render column values.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Return TIMESTAMP/DATETIME-family values as native [`chrono`] time
    /// points instead of formatted strings.
    pub parse_time: bool,
    /// Timezone applied when formatting TIMESTAMP-family values as strings.
    /// `None` formats in UTC.
    pub timestamp_string_location: Option<chrono_tz::Tz>,
    /// Return DECIMAL columns as [`bigdecimal::BigDecimal`] instead of
    /// decimal text.
    pub use_decimal: bool,
    /// Formatting hint for callers that render FLOAT/DOUBLE columns: keep a
    /// trailing zero on round values. The decoder itself always returns raw
    /// IEEE values.
    pub use_float_with_trailing_zero: bool,
    /// Substitute a `null` placeholder (and log a warning) when a JSON
    /// column value fails to decode, instead of failing the whole event.
    pub ignore_json_decode_err: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_string_roundtrip() {
        assert_eq!("mysql".parse::<BinlogFlavor>().unwrap(), BinlogFlavor::MySql);
        assert_eq!(
            "mariadb".parse::<BinlogFlavor>().unwrap(),
            BinlogFlavor::MariaDb
        );
        assert_eq!(BinlogFlavor::MariaDb.to_string(), "mariadb");
        assert!("postgres".parse::<BinlogFlavor>().is_err());
    }
}
