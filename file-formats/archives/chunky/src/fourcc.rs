//! FourCC payload tags

use std::fmt;
use std::str::FromStr;

use crate::error::{ChunkyError, Result};

/// A 4-byte ASCII tag identifying the meaning of a chunk's payload
///
/// The codec never interprets the tag; it is carried through to the
/// materialized name and metadata for downstream interpreters. Bytes are
/// kept in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Size of a FourCC on the wire
    pub const SIZE: usize = 4;

    /// Create a FourCC from raw bytes, rejecting anything that is not ASCII
    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self> {
        if bytes.is_ascii() {
            Ok(Self(bytes))
        } else {
            Err(ChunkyError::InvalidFourCc(bytes.to_vec()))
        }
    }

    /// The raw tag bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The tag as a string
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl FromStr for FourCc {
    type Err = ChunkyError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ChunkyError::InvalidFourCc(s.as_bytes().to_vec()))?;
        Self::from_bytes(bytes)
    }
}

impl TryFrom<String> for FourCc {
    type Error = ChunkyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FourCc> for String {
    fn from(value: FourCc) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
