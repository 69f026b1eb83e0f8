// Copyright (c) 2022 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Logical changes to JSON documents, as logged by partial-JSON updates.

use std::borrow::Cow;

use crate::{
    error::{EventError, Result},
    io::ParseBuf,
    jsonb,
};

/// An operation kind of a JsonDiff object.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JsonDiffOperation {
    /// The JSON value in the given path is replaced with a new value.
    REPLACE = 0,
    /// Add a new element at the given path.
    INSERT = 1,
    /// The JSON value at the given path is removed from an array or object.
    REMOVE = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown JsonDiff operation {}", _0)]
#[repr(transparent)]
pub struct UnknownJsonDiffOperation(pub u8);

impl From<UnknownJsonDiffOperation> for u8 {
    fn from(x: UnknownJsonDiffOperation) -> Self {
        x.0
    }
}

impl TryFrom<u8> for JsonDiffOperation {
    type Error = UnknownJsonDiffOperation;

    fn try_from(value: u8) -> std::result::Result<Self, UnknownJsonDiffOperation> {
        match value {
            0 => Ok(Self::REPLACE),
            1 => Ok(Self::INSERT),
            2 => Ok(Self::REMOVE),
            x => Err(UnknownJsonDiffOperation(x)),
        }
    }
}

/// A single logical change to a JSON document.
///
/// Row-based replication sends these instead of whole updated documents when
/// `binlog_row_value_options` enables partial JSON updates.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDiff {
    operation: JsonDiffOperation,
    path: Vec<u8>,
    value: Option<serde_json::Value>,
}

impl JsonDiff {
    pub fn operation(&self) -> JsonDiffOperation {
        self.operation
    }

    /// JSON path the operation applies to, as raw bytes.
    pub fn path_raw(&self) -> &[u8] {
        &self.path
    }

    /// JSON path as a string (lossy converted).
    pub fn path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// The new value, absent for [`JsonDiffOperation::REMOVE`].
    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }
}

/// Decodes the diff sequence of one partial-JSON column value. Records are
/// read until the payload is exhausted.
pub fn decode_diffs(data: &[u8]) -> Result<Vec<JsonDiff>> {
    let mut buf = ParseBuf::new(data);
    let mut diffs = Vec::new();

    while !buf.is_empty() {
        let operation = JsonDiffOperation::try_from(buf.eat_u8()?)
            .map_err(|e| EventError::InvalidJson(e.to_string()))?;
        let path = buf.eat_lenenc_str()?.to_vec();
        let value = if operation == JsonDiffOperation::REMOVE {
            None
        } else {
            Some(jsonb::decode(buf.eat_lenenc_str()?)?)
        };

        diffs.push(JsonDiff {
            operation,
            path,
            value,
        });
    }

    Ok(diffs)
}
