//! Family decoder contract and the shared frame buffer behind it.
//!
//! `FrameBuffer` owns the current raw frame and the latest snapshot. On
//! every accepted frame it validates, decodes all fields against the
//! family's `FrameLayout`, and swaps in a new `Arc<Telemetry>`.
//!
//! `SondeDecoder` is the accessor surface shared by all families. Families
//! supply only their buffer (built from their layout table) and a
//! diagnostic dump; every getter has a default body reading the snapshot.
//!
//! Failure policy: a decode never keeps stale telemetry. A checksum
//! mismatch still yields a best-effort snapshot flagged invalid; a field
//! that fails its range check is left `None` and reported in
//! `Telemetry::field_errors`.

use std::fmt::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::checksum;
use crate::family::SondeFamily;
use crate::fields::{self, DEFAULT_LEAP_SECONDS};
use crate::layout::{
    FrameLayout, RawFrame, AUX_RANGE, EXT_DECLARED_LEN, FRAME_TOTAL_LEN, POS_DECLARED_LEN,
    POS_FRAME_TYPE,
};
use crate::sensors::SensorReadings;
use crate::telemetry::Telemetry;
use crate::types::{hex_rows, Result, SondeError};

/// Bytes per row in diagnostic hex dumps.
const DUMP_ROW: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderState {
    /// No frame accepted yet.
    Uninitialized,
    Decoded { valid: bool },
}

/// Runtime parameters that are not part of a family's byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// GPS-UTC offset applied to GPS week/time-of-week families.
    pub leap_seconds: i64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            leap_seconds: DEFAULT_LEAP_SECONDS,
        }
    }
}

// ---------------------------------------------------------------------------
// Whole-frame decode
// ---------------------------------------------------------------------------

/// Decode one frame into a fresh snapshot. Pure: same bytes, same result.
pub fn decode_frame(
    frame: &RawFrame,
    layout: &FrameLayout,
    options: &DecodeOptions,
) -> Telemetry {
    let status = checksum::verify(frame);
    let mut errors = Vec::new();

    if let Err(e) = fields::check_frame_type(frame, layout) {
        errors.push(e);
    }

    let latitude = fields::decode_latitude(frame, layout)
        .map_err(|e| errors.push(e))
        .ok();
    let longitude = fields::decode_longitude(frame, layout)
        .map_err(|e| errors.push(e))
        .ok();

    let altitude = fields::decode_altitude(frame, layout)
        .map_err(|e| errors.push(e))
        .ok();

    let (date, time) = fields::decode_date_time(frame, layout, options.leap_seconds);
    let date = date.map_err(|e| errors.push(e)).ok();
    // A GPS time-of-week failure is reported once even though it voids both.
    let time = time
        .map_err(|e| {
            if !errors.contains(&e) {
                errors.push(e)
            }
        })
        .ok();

    let velocity = fields::decode_velocity(frame, layout);
    let serial = fields::decode_serial(frame, layout.serial_pos);

    trace!(
        family = layout.name,
        ?latitude,
        ?longitude,
        ?altitude,
        ?date,
        ?time,
        "decoded fields"
    );

    Telemetry {
        family: Some(layout.name),
        latitude,
        longitude,
        altitude,
        date,
        time,
        velocity: Some(velocity),
        serial: Some(serial),
        checksum: Some(status),
        field_errors: errors,
    }
}

// ---------------------------------------------------------------------------
// Frame buffer
// ---------------------------------------------------------------------------

/// Current frame and snapshot of one decoder instance.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    layout: &'static FrameLayout,
    options: DecodeOptions,
    raw: Option<Box<RawFrame>>,
    snapshot: Arc<Telemetry>,
}

impl FrameBuffer {
    pub fn new(layout: &'static FrameLayout) -> Self {
        FrameBuffer::with_options(layout, DecodeOptions::default())
    }

    pub fn with_options(layout: &'static FrameLayout, options: DecodeOptions) -> Self {
        FrameBuffer {
            layout,
            options,
            raw: None,
            snapshot: Arc::new(Telemetry::default()),
        }
    }

    pub fn layout(&self) -> &'static FrameLayout {
        self.layout
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The last accepted frame, if any.
    pub fn raw(&self) -> Option<&RawFrame> {
        self.raw.as_deref()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.snapshot
    }

    pub fn snapshot(&self) -> Arc<Telemetry> {
        Arc::clone(&self.snapshot)
    }

    pub fn state(&self) -> DecoderState {
        if self.raw.is_none() {
            DecoderState::Uninitialized
        } else {
            DecoderState::Decoded {
                valid: self.snapshot.is_valid(),
            }
        }
    }

    /// Accept a new frame: check its length, replace the buffer, decode.
    ///
    /// A wrong length fails before anything is touched.
    pub fn replace(&mut self, data: &[u8]) -> Result<Arc<Telemetry>> {
        let frame: RawFrame = data.try_into().map_err(|_| SondeError::FrameLength {
            expected: FRAME_TOTAL_LEN,
            actual: data.len(),
        })?;

        let snapshot = Arc::new(decode_frame(&frame, self.layout, &self.options));
        if let Err(e) = snapshot.check() {
            warn!(family = self.layout.name, "frame decoded with errors: {e}");
        } else {
            debug!(
                family = self.layout.name,
                serial = snapshot.serial_number(),
                "frame decoded"
            );
        }

        self.raw = Some(Box::new(frame));
        self.snapshot = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    /// Bytes of the auxiliary region, present only in extended frames.
    pub fn aux(&self) -> Option<&[u8]> {
        let raw = self.raw()?;
        (raw[POS_DECLARED_LEN] == EXT_DECLARED_LEN).then(|| &raw[AUX_RANGE])
    }

    /// Dump sections common to every family: header, navigation line,
    /// auxiliary bytes, and a hex dump of the whole frame.
    pub fn write_common_dump(&self, out: &mut String) {
        let Some(raw) = self.raw() else {
            let _ = writeln!(out, "[{}] no frame decoded", self.layout.name);
            return;
        };
        let t = self.telemetry();
        let _ = writeln!(
            out,
            "[{}] type {:02X}  len {:02X}",
            self.layout.name, raw[POS_FRAME_TYPE], raw[POS_DECLARED_LEN]
        );
        if let Some(cs) = t.checksum {
            let _ = writeln!(
                out,
                "  checksum: computed {:04X} stored {:04X} {}",
                cs.computed,
                cs.stored,
                if cs.is_ok() { "[OK]" } else { "[NO]" }
            );
        }
        let _ = writeln!(out, "  {}", t.summary_line());
        for e in &t.field_errors {
            let _ = writeln!(out, "  rejected {}: {}", e.field, e.value);
        }
        if let Some(aux) = self.aux() {
            let _ = writeln!(out, "  aux:");
            for row in hex_rows(aux, DUMP_ROW) {
                let _ = writeln!(out, "    {row}");
            }
        }
        let _ = writeln!(out, "  frame:");
        for row in hex_rows(raw, DUMP_ROW) {
            let _ = writeln!(out, "    {row}");
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder contract
// ---------------------------------------------------------------------------

/// Uniform telemetry interface over all sonde families.
///
/// Getters return the documented sentinels (`NaN`, `-1`, `""`) for fields
/// that are absent, either because no frame was accepted yet or because the
/// field failed its range check.
pub trait SondeDecoder {
    fn family(&self) -> SondeFamily;

    fn buffer(&self) -> &FrameBuffer;

    fn buffer_mut(&mut self) -> &mut FrameBuffer;

    /// Human-readable rendering of the whole frame, including auxiliary
    /// data not exposed through the shared getters.
    fn dump(&self) -> String;

    /// Replace the current frame and decode it.
    fn change_data(&mut self, data: &[u8]) -> Result<Arc<Telemetry>> {
        self.buffer_mut().replace(data)
    }

    fn state(&self) -> DecoderState {
        self.buffer().state()
    }

    fn telemetry(&self) -> Arc<Telemetry> {
        self.buffer().snapshot()
    }

    fn is_valid(&self) -> bool {
        self.buffer().telemetry().is_valid()
    }

    fn latitude(&self) -> f64 {
        self.buffer().telemetry().latitude()
    }

    fn longitude(&self) -> f64 {
        self.buffer().telemetry().longitude()
    }

    fn altitude(&self) -> f64 {
        self.buffer().telemetry().altitude()
    }

    fn day(&self) -> i32 {
        self.buffer().telemetry().day()
    }

    fn month(&self) -> i32 {
        self.buffer().telemetry().month()
    }

    fn year(&self) -> i32 {
        self.buffer().telemetry().year()
    }

    fn hours(&self) -> i32 {
        self.buffer().telemetry().hours()
    }

    fn minutes(&self) -> i32 {
        self.buffer().telemetry().minutes()
    }

    fn seconds(&self) -> i32 {
        self.buffer().telemetry().seconds()
    }

    fn vertical_speed(&self) -> f64 {
        self.buffer().telemetry().vertical_speed()
    }

    fn horizontal_speed(&self) -> f64 {
        self.buffer().telemetry().horizontal_speed()
    }

    fn direction(&self) -> f64 {
        self.buffer().telemetry().direction()
    }

    fn serial_number(&self) -> String {
        self.buffer().telemetry().serial_number().to_string()
    }

    /// Sensor boom readings of the current frame. These are not part of the
    /// snapshot, so they are `None` rather than a sentinel when unusable.
    fn sensors(&self) -> Option<SensorReadings> {
        self.buffer().raw().map(SensorReadings::from_frame)
    }

    fn temperature(&self) -> Option<f64> {
        self.sensors().and_then(|s| s.temperature)
    }

    fn humidity(&self) -> Option<f64> {
        self.sensors().and_then(|s| s.humidity)
    }

    fn dew_point(&self) -> Option<f64> {
        self.sensors().and_then(|s| s.dew_point)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
