//! Upload acknowledgements returned by a Skynet portal.
//!
//! A successful upload answers with three redundant fields:
//!
//! ```json
//! { "skylink": "<46 chars>", "merkleroot": "<64 hex>", "bitfield": 0 }
//! ```
//!
//! The hash and bitfield are already encoded inside the skylink.  A response
//! whose fields disagree was corrupted or tampered with in transit and must
//! not be trusted.
//!
//! Field names are matched case-insensitively by `UploadResponse::from_slice`
//! and `from_reader` (`"SKYLINK"` works).  Deserializing `UploadResponse`
//! directly through serde only accepts the lowercase and capitalised spellings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read};
use thiserror::Error;
use tracing::{debug, warn};

use crate::skylink::Skylink;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Response skylink {0:?} cannot be parsed")]
    Unparseable(String),
    #[error("Response bitfield {reported} does not match the skylink's bitfield {encoded}")]
    BitfieldMismatch { reported: u16, encoded: u16 },
    #[error("Response merkleroot {reported} does not match the skylink's merkleroot {encoded}")]
    HashMismatch { reported: String, encoded: String },
    #[error("Malformed response JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ResponseError {
    /// True when the response decoded but failed the integrity check.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            ResponseError::Unparseable(_)
                | ResponseError::BitfieldMismatch { .. }
                | ResponseError::HashMismatch { .. }
        )
    }
}

/// Raw upload response fields, exactly as reported by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(alias = "Skylink")]
    pub skylink: String,
    #[serde(alias = "Merkleroot", alias = "hash")]
    pub merkleroot: String,
    #[serde(alias = "Bitfield")]
    pub bitfield: u16,
}

impl UploadResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResponseError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ResponseError> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    fn from_value(value: Value) -> Result<Self, ResponseError> {
        let value = match value {
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key.to_ascii_lowercase(), field))
                    .collect(),
            ),
            other => other,
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Parse the reported skylink and check it against the reported
    /// merkleroot and bitfield.
    pub fn parse_and_validate(&self) -> Result<Skylink, ResponseError> {
        validate_response(&self.skylink, &self.merkleroot, self.bitfield)
    }
}

/// Cross-check the three redundant upload response fields.  The merkleroot
/// comparison is case-insensitive.
pub fn validate_response(
    skylink:    &str,
    merkleroot: &str,
    bitfield:   u16,
) -> Result<Skylink, ResponseError> {
    let Some(parsed) = Skylink::try_parse(skylink) else {
        warn!(skylink, "rejecting upload response: skylink cannot be parsed");
        return Err(ResponseError::Unparseable(skylink.to_string()));
    };

    let encoded_bitfield = parsed.bitfield().raw();
    if bitfield != encoded_bitfield {
        warn!(skylink, reported = bitfield, encoded = encoded_bitfield,
              "rejecting upload response: bitfield mismatch");
        return Err(ResponseError::BitfieldMismatch {
            reported: bitfield,
            encoded:  encoded_bitfield,
        });
    }

    let encoded_hash = parsed.merkleroot_hex();
    if !merkleroot.eq_ignore_ascii_case(&encoded_hash) {
        warn!(skylink, reported = merkleroot, encoded = %encoded_hash,
              "rejecting upload response: merkleroot mismatch");
        return Err(ResponseError::HashMismatch {
            reported: merkleroot.to_string(),
            encoded:  encoded_hash,
        });
    }

    debug!(skylink, "upload response validated");
    Ok(parsed)
}
