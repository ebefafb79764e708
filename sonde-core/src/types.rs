//! Shared types, error enum, and hex helpers for sonde-core.

use serde::Serialize;
use thiserror::Error;

/// All errors produced by sonde-core.
#[derive(Debug, Error)]
pub enum SondeError {
    #[error("invalid frame length: expected {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    #[error("checksum mismatch: computed {computed:04X}, stored {stored:04X}")]
    Integrity { computed: u16, stored: u16 },
    #[error("{field} out of range: {value}")]
    FieldRange { field: FieldKind, value: i64 },
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("unknown sonde family: {0}")]
    UnknownFamily(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SondeError>;

// ---------------------------------------------------------------------------
// Field range errors
// ---------------------------------------------------------------------------

/// Decoded quantity that can fail its semantic range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FrameType,
    Latitude,
    Longitude,
    Altitude,
    Date,
    Time,
    TimeOfWeek,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::FrameType => "frame type",
            FieldKind::Latitude => "latitude",
            FieldKind::Longitude => "longitude",
            FieldKind::Altitude => "altitude",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::TimeOfWeek => "GPS time of week",
        };
        f.write_str(name)
    }
}

/// A field whose raw value violated its bounds. Kept in the snapshot so a
/// diagnostic consumer can see what was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FieldKind,
    pub value: i64,
}

impl FieldError {
    pub fn new(field: FieldKind, value: i64) -> Self {
        FieldError { field, value }
    }
}

impl From<FieldError> for SondeError {
    fn from(e: FieldError) -> Self {
        SondeError::FieldRange {
            field: e.field,
            value: e.value,
        }
    }
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Hex dump with `width` bytes per row, each row prefixed by its offset.
pub fn hex_rows(data: &[u8], width: usize) -> Vec<String> {
    data.chunks(width.max(1))
        .enumerate()
        .map(|(i, row)| {
            let cells: Vec<String> = row.iter().map(|b| format!("{b:02X}")).collect();
            format!("{:04X}: {}", i * width.max(1), cells.join(" "))
        })
        .collect()
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
