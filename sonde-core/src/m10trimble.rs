//! M10 radiosonde with Trimble GPS receiver (frame type `0x9F`).
//!
//! Position as 32-bit semicircles, altitude in millimeters, velocity in
//! 1/200 m/s, and time as GPS week plus time of week. UTC is derived with the
//! configured leap second count.
//!
//! Beyond the shared fields the frame carries the satellite count, shown in
//! the dump next to the GPS time words and the sensor readings.

use std::fmt::Write;

use crate::decoder::{DecodeOptions, FrameBuffer, SondeDecoder};
use crate::family::SondeFamily;
use crate::fields::read_raw;
use crate::layout::{RawFrame, TimeEncoding, M10_TRIMBLE};
use crate::sensors::SensorReadings;

pub const POS_SATELLITES: usize = 0x1E;

pub fn satellites(frame: &RawFrame) -> u8 {
    frame[POS_SATELLITES]
}

pub struct M10TrimbleDecoder {
    buffer: FrameBuffer,
}

impl M10TrimbleDecoder {
    pub fn new() -> Self {
        M10TrimbleDecoder::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        M10TrimbleDecoder {
            buffer: FrameBuffer::with_options(&M10_TRIMBLE, options),
        }
    }

    pub fn with_leap_seconds(leap_seconds: i64) -> Self {
        M10TrimbleDecoder::with_options(DecodeOptions { leap_seconds })
    }

    pub fn satellites(&self) -> Option<u8> {
        self.buffer.raw().map(satellites)
    }
}

impl Default for M10TrimbleDecoder {
    fn default() -> Self {
        M10TrimbleDecoder::new()
    }
}

impl SondeDecoder for M10TrimbleDecoder {
    fn family(&self) -> SondeFamily {
        SondeFamily::M10Trimble
    }

    fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.buffer
    }

    fn dump(&self) -> String {
        let mut out = String::new();
        self.buffer.write_common_dump(&mut out);
        let Some(raw) = self.buffer.raw() else {
            return out;
        };

        if let TimeEncoding::GpsWeek { week, tow_ms } = M10_TRIMBLE.time {
            let _ = writeln!(
                out,
                "  gps: week {}  tow {} ms  leap {} s",
                read_raw(raw, &week),
                read_raw(raw, &tow_ms),
                self.buffer.options().leap_seconds
            );
        }
        let _ = writeln!(out, "  sats: {}", satellites(raw));
        SensorReadings::from_frame(raw).write_dump(&mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
