//! Skylink: the 34-byte content identifier and its 46-character text form.
//!
//! # Wire format
//! ```text
//! byte 0-1   : bitfield, little-endian u16
//! byte 2-33  : 32-byte Merkle root
//! ```
//!
//! # Text format
//! The 34 raw bytes base64url-encoded with the `=` padding dropped, which is
//! always exactly 46 characters.  Parsing pads back to 48 before decoding.
//!
//! The all-zero Skylink (zero bitfield, zero hash) is a valid value; it is
//! what `Skylink::default()` returns.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;
use thiserror::Error;

use crate::bitfield::{Bitfield, BitfieldError, BITFIELD_SIZE};
use crate::encoding::{self, EncodingError};

pub const HASH_SIZE:      usize = 32;
pub const RAW_SIZE:       usize = BITFIELD_SIZE + HASH_SIZE;
pub const ENCODED_LENGTH: usize = 46;
/// `ENCODED_LENGTH` rounded up to a whole base64 quantum.
const PADDED_LENGTH:      usize = 48;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkylinkError {
    #[error("Skylink must be {ENCODED_LENGTH} characters, got {0}")]
    InvalidLength(usize),
    #[error("Skylink is not valid base64url: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Skylink bitfield is not valid: {0}")]
    Bitfield(#[from] BitfieldError),
}

/// A parsed, validated Skylink.  Immutable once constructed.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Skylink {
    bitfield:   Bitfield,
    merkleroot: [u8; HASH_SIZE],
}

impl Skylink {
    /// URI scheme used when a Skylink is written as `sia://<skylink>`.
    pub const SCHEME: &'static str = "sia";

    pub fn new(bitfield: Bitfield, merkleroot: [u8; HASH_SIZE]) -> Self {
        Self { bitfield, merkleroot }
    }

    /// Build from a bitfield and an optional hash; a missing hash reads as
    /// 32 zero bytes.
    pub fn with_optional_hash(bitfield: Bitfield, merkleroot: Option<[u8; HASH_SIZE]>) -> Self {
        Self::new(bitfield, merkleroot.unwrap_or([0u8; HASH_SIZE]))
    }

    /// Parse the 46-character text form.
    pub fn parse(value: &str) -> Result<Self, SkylinkError> {
        if value.len() != ENCODED_LENGTH {
            return Err(SkylinkError::InvalidLength(value.len()));
        }
        let mut padded = String::with_capacity(PADDED_LENGTH);
        padded.push_str(value);
        padded.push_str("==");

        let raw = encoding::decode_base64url(&padded)?;
        let raw: &[u8; RAW_SIZE] = raw
            .get(..RAW_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(SkylinkError::InvalidLength(value.len()))?;
        Self::from_bytes(raw)
    }

    /// Like [`Skylink::parse`], but every failure maps to `None`.
    pub fn try_parse(value: &str) -> Option<Self> {
        Self::parse(value).ok()
    }

    /// Decode the 34-byte wire form, validating the bitfield.
    pub fn from_bytes(raw: &[u8; RAW_SIZE]) -> Result<Self, SkylinkError> {
        let bitfield = Bitfield::new(u16::from_le_bytes([raw[0], raw[1]]))?;
        let mut merkleroot = [0u8; HASH_SIZE];
        merkleroot.copy_from_slice(&raw[BITFIELD_SIZE..]);
        Ok(Self::new(bitfield, merkleroot))
    }

    pub fn to_bytes(&self) -> [u8; RAW_SIZE] {
        let mut raw = [0u8; RAW_SIZE];
        raw[..BITFIELD_SIZE].copy_from_slice(&self.bitfield.to_le_bytes());
        raw[BITFIELD_SIZE..].copy_from_slice(&self.merkleroot);
        raw
    }

    /// The 46-character base64url text form.
    pub fn to_text(&self) -> String {
        let mut encoded = encoding::encode_base64url(&self.to_bytes());
        encoded.truncate(ENCODED_LENGTH);
        encoded
    }

    /// `sia://<skylink>`
    pub fn to_uri(&self) -> String {
        format!("{}://{}", Self::SCHEME, self.to_text())
    }

    pub fn bitfield(&self) -> Bitfield {
        self.bitfield
    }

    pub fn merkleroot(&self) -> &[u8; HASH_SIZE] {
        &self.merkleroot
    }

    /// Lowercase hex of the Merkle root.
    pub fn merkleroot_hex(&self) -> String {
        encoding::to_hex(&self.merkleroot)
    }

    /// True for the all-zero Skylink.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.bitfield.raw())?;
        writer.write_all(&self.merkleroot)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, SkylinkReadError> {
        let bitfield = Bitfield::new(reader.read_u16::<LittleEndian>()?)?;
        let mut merkleroot = [0u8; HASH_SIZE];
        reader.read_exact(&mut merkleroot)?;
        Ok(Self::new(bitfield, merkleroot))
    }
}

#[derive(Error, Debug)]
pub enum SkylinkReadError {
    #[error("Invalid bitfield: {0}")]
    Bitfield(#[from] BitfieldError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FromStr for Skylink {
    type Err = SkylinkError;

    /// Accepts the bare text form or a `sia://` URI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .strip_prefix(Self::SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .unwrap_or(s);
        Self::parse(value)
    }
}

impl fmt::Display for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skylink")
            .field("bitfield", &self.bitfield)
            .field("merkleroot", &self.merkleroot_hex())
            .finish()
    }
}

impl Serialize for Skylink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Skylink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Skylink::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const V8:   &str = "CADF7uURocUdK3Uyq_MQCvnJadk0g-cjs2wrN3kPiU7EDA";

    #[test]
    fn default_is_all_zero() {
        let skylink = Skylink::default();
        assert_eq!(skylink.to_bytes(), [0u8; RAW_SIZE]);
        assert_eq!(skylink.to_text(), ZERO);
        assert_eq!(skylink.merkleroot_hex(), "0".repeat(64));
        assert!(skylink.is_default());
    }

    #[test]
    fn missing_hash_reads_as_zero() {
        let skylink = Skylink::with_optional_hash(Bitfield::default(), None);
        assert_eq!(skylink, Skylink::default());
        assert_eq!(Skylink::parse(ZERO).unwrap(), skylink);
    }

    #[test]
    fn to_text_drops_padding() {
        let skylink = Skylink::parse(V8).unwrap();
        let text = skylink.to_text();
        assert_eq!(text.len(), ENCODED_LENGTH);
        assert!(!text.contains('='));
        assert_eq!(text, V8);
    }

    #[test]
    fn bytes_layout() {
        let skylink = Skylink::parse(V8).unwrap();
        let raw = skylink.to_bytes();
        assert_eq!(&raw[..2], &[8, 0]);
        assert_eq!(&raw[2..], skylink.merkleroot());
    }

    #[test]
    fn from_bytes_rejects_invalid_bitfield() {
        let mut raw = [0u8; RAW_SIZE];
        raw[0] = 0b01;
        assert_eq!(
            Skylink::from_bytes(&raw),
            Err(SkylinkError::Bitfield(BitfieldError::UnsupportedMode(1)))
        );
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(Skylink::parse(&V8[..45]), Err(SkylinkError::InvalidLength(45)));
        assert_eq!(
            Skylink::parse(&format!("{V8}A")),
            Err(SkylinkError::InvalidLength(47))
        );
        assert_eq!(Skylink::parse(""), Err(SkylinkError::InvalidLength(0)));
    }

    #[test]
    fn parse_rejects_non_base64url() {
        for value in [
            "!NVAliDLnADQbFx3tXOQdtjKf0MvFzqZoDIqj_VaebkqcA",
            "iNV@liDaLoDQbFx3tXOQdtjKf0MvFzqZoDIqj_VaebkqcA",
        ] {
            assert!(matches!(Skylink::parse(value), Err(SkylinkError::Encoding(_))), "{value}");
            assert!(Skylink::try_parse(value).is_none());
        }
    }

    #[test]
    fn parse_accepts_standard_alphabet() {
        let standard = Skylink::parse("CADF7uURocUdK3Uyq/MQCvnJadk0g+cjs2wrN3kPiU7EDA").unwrap();
        assert_eq!(standard, Skylink::parse(V8).unwrap());
        assert_eq!(standard.to_text(), V8);
    }

    #[test]
    fn parse_rejects_multibyte_text_of_right_byte_length() {
        // 44 ASCII chars + one 2-byte char = 46 bytes
        let value = format!("{}é", &V8[..44]);
        assert_eq!(value.len(), ENCODED_LENGTH);
        assert!(Skylink::parse(&value).is_err());
    }

    #[test]
    fn uri_round_trip() {
        let skylink = Skylink::parse(V8).unwrap();
        let uri = skylink.to_uri();
        assert_eq!(uri, format!("sia://{V8}"));
        assert_eq!(uri.parse::<Skylink>().unwrap(), skylink);
        assert_eq!(V8.parse::<Skylink>().unwrap(), skylink);
    }

    #[test]
    fn write_then_read() {
        let skylink = Skylink::parse(V8).unwrap();
        let mut buf = Vec::new();
        skylink.write(&mut buf).unwrap();
        assert_eq!(buf, skylink.to_bytes());
        assert_eq!(Skylink::read(&buf[..]).unwrap(), skylink);
    }

    #[test]
    fn read_rejects_truncated_input() {
        let skylink = Skylink::parse(V8).unwrap();
        let raw = skylink.to_bytes();
        assert!(matches!(Skylink::read(&raw[..20]), Err(SkylinkReadError::Io(_))));
    }

    #[test]
    fn serde_uses_text_form() {
        let skylink = Skylink::parse(V8).unwrap();
        let json = serde_json::to_string(&skylink).unwrap();
        assert_eq!(json, format!("\"{V8}\""));
        assert_eq!(serde_json::from_str::<Skylink>(&json).unwrap(), skylink);
        assert!(serde_json::from_str::<Skylink>("\"short\"").is_err());
    }
}
