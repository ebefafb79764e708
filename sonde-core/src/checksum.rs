//! M10 frame checksum.
//!
//! 16-bit accumulator updated once per byte. The high byte of the new state
//! is the previous low byte; the new low byte mixes a rotated copy of the
//! input byte with parity bits of the previous state. Every update is linear
//! over GF(2) and invertible in the input byte, so a single flipped bit
//! anywhere in the checked range always changes the result.
//!
//! Placement depends on the declared length `L` in byte 0: the checksum
//! covers `[0, L - 1)` and is stored big-endian at `L - 1`. Only the standard
//! (`0x64`) and extended (`0x7A`) lengths are legal.

use std::ops::Range;

use serde::Serialize;

use crate::layout::{EXT_DECLARED_LEN, POS_DECLARED_LEN, STD_DECLARED_LEN};

/// Result of checking one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumStatus {
    /// Declared length byte as received.
    pub declared_len: u8,
    pub computed: u16,
    pub stored: u16,
}

impl ChecksumStatus {
    pub fn is_ok(&self) -> bool {
        declared_len_ok(self.declared_len) && self.computed == self.stored
    }
}

/// Fold one byte into the running checksum.
pub fn update(c: u16, byte: u8) -> u16 {
    let c = c as u32;
    let c1 = c & 0xFF;

    let mut b = byte.rotate_right(1) as u32;
    b ^= (b >> 2) & 0xFF;

    let t6 = (c & 1) ^ ((c >> 2) & 1) ^ ((c >> 4) & 1);
    let t7 = ((c >> 1) & 1) ^ ((c >> 3) & 1) ^ ((c >> 5) & 1);
    let t = (c & 0x3F) | (t6 << 6) | (t7 << 7);

    let mut s = (c >> 7) & 0xFF;
    s ^= (s >> 2) & 0xFF;

    let c0 = b ^ t ^ s;
    (((c1 << 8) | c0) & 0xFFFF) as u16
}

/// Checksum of a byte slice, starting from a zero state.
pub fn checksum(data: &[u8]) -> u16 {
    data.iter().fold(0, |c, &b| update(c, b))
}

fn declared_len_ok(declared: u8) -> bool {
    declared == STD_DECLARED_LEN || declared == EXT_DECLARED_LEN
}

/// Byte range covered by the checksum, or `None` if the declared length is
/// not one of the legal values or the frame is too short to hold it.
pub fn checked_range(frame: &[u8]) -> Option<Range<usize>> {
    let declared = *frame.get(POS_DECLARED_LEN)?;
    if !declared_len_ok(declared) {
        return None;
    }
    let end = declared as usize - 1;
    if frame.len() < end + 2 {
        return None;
    }
    Some(0..end)
}

/// Compute and compare the checksum.
///
/// With an illegal declared length the standard placement is used so the
/// dump still shows meaningful numbers; `is_ok()` is false regardless.
pub fn verify(frame: &[u8]) -> ChecksumStatus {
    let declared_len = frame.get(POS_DECLARED_LEN).copied().unwrap_or(0);
    let range = checked_range(frame).unwrap_or(0..STD_DECLARED_LEN as usize - 1);
    let end = range.end.min(frame.len());
    let computed = checksum(&frame[..end]);
    let stored = match (frame.get(end), frame.get(end + 1)) {
        (Some(&hi), Some(&lo)) => u16::from_be_bytes([hi, lo]),
        _ => !computed,
    };
    ChecksumStatus {
        declared_len,
        computed,
        stored,
    }
}

/// True if the frame's stored checksum matches its content.
pub fn validate(frame: &[u8]) -> bool {
    verify(frame).is_ok()
}

/// Write the correct checksum for the frame's declared length in place.
/// Returns `false` if the declared length is illegal.
pub fn seal(frame: &mut [u8]) -> bool {
    let Some(range) = checked_range(frame) else {
        return false;
    };
    let cs = checksum(&frame[range.clone()]).to_be_bytes();
    frame[range.end] = cs[0];
    frame[range.end + 1] = cs[1];
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
