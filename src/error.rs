// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoding error types.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EventError>;

/// An error raised while decoding a table map or rows event.
///
/// Decoders are total: they either produce a fully decoded event or fail with
/// one of these kinds, never a success with a truncated result.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The input ended before a structure could be read in full.
    #[error("event data truncated at offset {offset}: need {need} bytes, have {have}")]
    Truncated {
        /// Offset of the failed read, relative to the buffer handed to the decoder.
        offset: usize,
        /// Number of bytes the failed read required.
        need: usize,
        /// Number of bytes that were actually left.
        have: usize,
    },

    /// A length-encoded integer started with the reserved `0xff` byte.
    #[error("invalid length-encoded integer value at offset {0}")]
    InvalidLenencInt(usize),

    /// A column type that cannot appear in a binlog (or is not known to this
    /// implementation) was encountered.
    #[error("unsupported column type {0} in binlog")]
    UnsupportedType(u8),

    /// A rows event arrived before any table map event was seen.
    #[error("no corresponding table map event for table id {0}")]
    MissingTableMap(u64),

    /// A rows event references a table id that is absent from a non-empty
    /// table map cache.
    #[error("invalid table id {0}, no corresponding table map event")]
    UnknownTableId(u64),

    /// A recognised optional-metadata field had a malformed value.
    ///
    /// Unknown optional-metadata field types are skipped, not reported.
    #[error("malformed optional metadata: {0}")]
    MalformedOptionalMetadata(#[from] OptionalMetadataError),

    /// A column index addressed past the end of the table map's column list.
    #[error("column {index} out of range for table map with {column_count} columns")]
    UnknownColumnType { index: usize, column_count: usize },

    /// A BIT or SET column carried a storage length outside `1..=8`.
    #[error("invalid bit length {0}")]
    InvalidBitLength(usize),

    /// A BLOB-family or JSON column carried a length-prefix size outside `1..=4`.
    #[error("invalid blob packlen {0}")]
    InvalidBlobPacklen(u16),

    /// An ENUM column carried a pack length other than 1 or 2.
    #[error("unknown ENUM packlen {0}")]
    UnknownEnumPacklen(u16),

    /// A decoded decimal could not be converted into a big decimal.
    #[error("failed to parse decimal {0:?}")]
    DecimalParseFailure(String),

    /// A binary JSON document or partial-JSON diff was malformed.
    #[error("malformed JSON value: {0}")]
    InvalidJson(String),

    /// A MariaDB compressed rows event body could not be inflated.
    #[error("failed to decompress rows event body")]
    Decompress(#[source] std::io::Error),

    /// A rows event body failed mid-decode. Any partially decoded rows must
    /// be discarded by the caller.
    #[error(transparent)]
    ParseRows(Box<ParseRowsError>),
}

/// Sub-reasons for [`EventError::MalformedOptionalMetadata`].
#[derive(Debug, thiserror::Error)]
pub enum OptionalMetadataError {
    /// `DEFAULT_CHARSET` (or its ENUM/SET sibling) must hold the default
    /// collation followed by (column, collation) pairs.
    #[error("expected an odd number of items in DEFAULT_CHARSET but got {0}")]
    EvenDefaultCharsetCount(usize),

    /// `COLUMN_NAME` must carry exactly one name per column.
    #[error("expected {expected} column names but got {actual}")]
    ColumnNameCountMismatch { expected: usize, actual: usize },
}

/// Context carried by [`EventError::ParseRows`]: the identity of the table,
/// the raw (decompressed) body bytes and how far decoding got.
#[derive(Debug, thiserror::Error)]
#[error(
    "failed to decode rows of `{schema}`.`{table}` (table id {table_id}) \
     after {rows_decoded} row images: {source}"
)]
pub struct ParseRowsError {
    pub schema: String,
    pub table: String,
    pub table_id: u64,
    /// Row images decoded before the failure.
    pub rows_decoded: usize,
    /// Raw body bytes (after decompression, if any), kept for diagnosis.
    pub data: Vec<u8>,
    pub source: EventError,
}
