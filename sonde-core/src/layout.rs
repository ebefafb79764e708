//! Byte layout tables for the supported M10 frame variants.
//!
//! Every family is described as data: where each field sits, how wide it is,
//! its byte order, and the scale that turns the raw integer into physical
//! units. The shared decoder walks these tables; nothing family-specific is
//! hard-coded in the decode path.
//!
//! Frame regions (offsets in bytes):
//! - `0x00..0x65` primary region (101 bytes, declared length byte 0x64 + 1)
//! - `0x65..0x79` auxiliary region (20 bytes)
//! - `0x79..0x7B` trailer (2 bytes, checksum of extended frames)

use std::ops::Range;

/// Primary region length: declared length 0x64 plus the length byte itself.
pub const FRAME_LEN: usize = 0x64 + 1;
/// Auxiliary region length.
pub const AUX_LEN: usize = 20;
/// Trailer region length.
pub const TRAILER_LEN: usize = 2;
/// Total bytes accepted by `change_data`.
pub const FRAME_TOTAL_LEN: usize = FRAME_LEN + AUX_LEN + TRAILER_LEN;

/// One complete frame buffer.
pub type RawFrame = [u8; FRAME_TOTAL_LEN];

/// Declared length (byte 0) of a standard frame.
pub const STD_DECLARED_LEN: u8 = 0x64;
/// Declared length (byte 0) of a frame carrying auxiliary data.
pub const EXT_DECLARED_LEN: u8 = (FRAME_TOTAL_LEN - 1) as u8;

pub const POS_DECLARED_LEN: usize = 0x00;
pub const POS_FRAME_TYPE: usize = 0x01;

/// Auxiliary region byte range.
pub const AUX_RANGE: Range<usize> = FRAME_LEN..FRAME_LEN + AUX_LEN;
/// Trailer byte range.
pub const TRAILER_RANGE: Range<usize> = FRAME_LEN + AUX_LEN..FRAME_TOTAL_LEN;

/// Serial number: 5 bytes starting here, same in all M10 variants.
pub const POS_SERIAL: usize = 0x5D;
pub const SERIAL_LEN: usize = 5;

/// Lowest altitude accepted for either M10 variant, in meters.
pub const M10_MIN_ALTITUDE: f64 = -500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A scaled integer field inside the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub pos: usize,
    pub width: usize,
    pub signed: bool,
    pub endian: Endian,
    /// Physical units per raw count.
    pub scale: f64,
}

impl Field {
    pub const fn be_signed(pos: usize, width: usize, scale: f64) -> Self {
        Field {
            pos,
            width,
            signed: true,
            endian: Endian::Big,
            scale,
        }
    }

    pub const fn be_unsigned(pos: usize, width: usize) -> Self {
        Field {
            pos,
            width,
            signed: false,
            endian: Endian::Big,
            scale: 1.0,
        }
    }

    pub const fn le_unsigned(pos: usize, width: usize) -> Self {
        Field {
            pos,
            width,
            signed: false,
            endian: Endian::Little,
            scale: 1.0,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.pos..self.pos + self.width
    }
}

/// How a family transmits UTC date and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeEncoding {
    /// Decimal digit groups packed into unsigned integers: `HHMMSS` and `DDMMYY`.
    DecimalGroups { time: Field, date: Field },
    /// GPS week number and time of week in milliseconds.
    GpsWeek { week: Field, tow_ms: Field },
}

/// Complete decode table for one family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub name: &'static str,
    /// Expected value of byte 1.
    pub frame_type: u8,
    pub lat: Field,
    pub lon: Field,
    pub alt: Field,
    pub min_altitude: f64,
    pub vel_east: Field,
    pub vel_north: Field,
    pub vel_up: Field,
    pub time: TimeEncoding,
    pub serial_pos: usize,
}

/// M10 with GTop GPS receiver (frame type 0xAF).
pub const M10_GTOP: FrameLayout = FrameLayout {
    name: "m10-gtop",
    frame_type: 0xAF,
    lat: Field::be_signed(0x04, 4, 1e-6),
    lon: Field::be_signed(0x08, 4, 1e-6),
    alt: Field::be_signed(0x0C, 3, 1e-2),
    min_altitude: M10_MIN_ALTITUDE,
    vel_east: Field::be_signed(0x0F, 2, 1e-2),
    vel_north: Field::be_signed(0x11, 2, 1e-2),
    vel_up: Field::be_signed(0x13, 2, 1e-2),
    time: TimeEncoding::DecimalGroups {
        time: Field::be_unsigned(0x15, 3),
        date: Field::be_unsigned(0x18, 3),
    },
    serial_pos: POS_SERIAL,
};

/// Degrees per raw count of a 32-bit semicircle angle.
pub const SEMICIRCLE_DEG: f64 = 360.0 / 4_294_967_296.0;

/// M10 with Trimble GPS receiver (frame type 0x9F).
pub const M10_TRIMBLE: FrameLayout = FrameLayout {
    name: "m10-trimble",
    frame_type: 0x9F,
    lat: Field::be_signed(0x0E, 4, SEMICIRCLE_DEG),
    lon: Field::be_signed(0x12, 4, SEMICIRCLE_DEG),
    alt: Field::be_signed(0x16, 4, 1e-3),
    min_altitude: M10_MIN_ALTITUDE,
    vel_east: Field::be_signed(0x04, 2, 1.0 / 200.0),
    vel_north: Field::be_signed(0x06, 2, 1.0 / 200.0),
    vel_up: Field::be_signed(0x08, 2, 1.0 / 200.0),
    time: TimeEncoding::GpsWeek {
        week: Field::be_unsigned(0x20, 2),
        tow_ms: Field::be_unsigned(0x0A, 4),
    },
    serial_pos: POS_SERIAL,
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
