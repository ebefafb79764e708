//! Decoded telemetry snapshot.
//!
//! A `Telemetry` is the immutable result of decoding one frame. Every field
//! is optional: `None` means the field was never decoded (no frame yet) or
//! was rejected by its range check. Decoders swap whole snapshots; nothing
//! mutates a published one.

use serde::Serialize;

use crate::checksum::ChecksumStatus;
use crate::types::{FieldError, Result, SondeError};

/// Sentinel returned by integer accessors for an absent field.
pub const INT_SENTINEL: i32 = -1;
/// Sentinel returned by floating-point accessors for an absent field.
pub const FLOAT_SENTINEL: f64 = f64::NAN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Velocity in m/s, with the derived horizontal speed and compass bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Velocity {
    pub east: f64,
    pub north: f64,
    /// Positive is ascending.
    pub vertical: f64,
    pub horizontal: f64,
    /// Degrees clockwise from north, in `[0, 360)`.
    pub direction: f64,
}

impl Velocity {
    pub fn from_components(east: f64, north: f64, vertical: f64) -> Self {
        Velocity {
            east,
            north,
            vertical,
            horizontal: east.hypot(north),
            direction: bearing(east, north),
        }
    }
}

/// Compass bearing of a horizontal velocity.
///
/// `atan2(east, north)` measures clockwise from north in `(-180, 180]`;
/// negative angles are shifted by a full turn. A tiny negative angle can
/// round up to exactly 360 after the shift, which folds back to 0.
pub fn bearing(east: f64, north: f64) -> f64 {
    let deg = east.atan2(north).to_degrees();
    let deg = if deg < 0.0 { deg + 360.0 } else { deg };
    if deg >= 360.0 {
        deg - 360.0
    } else {
        deg
    }
}

/// One decoded frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub family: Option<&'static str>,
    /// Degrees. Latitude and longitude are range-checked independently.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters.
    pub altitude: Option<f64>,
    pub date: Option<CalendarDate>,
    pub time: Option<TimeOfDay>,
    pub velocity: Option<Velocity>,
    pub serial: Option<String>,
    /// `None` until a frame has been accepted.
    pub checksum: Option<ChecksumStatus>,
    pub field_errors: Vec<FieldError>,
}

impl Telemetry {
    /// True once at least one frame has been decoded into this snapshot.
    pub fn is_decoded(&self) -> bool {
        self.checksum.is_some()
    }

    pub fn checksum_ok(&self) -> bool {
        self.checksum.is_some_and(|c| c.is_ok())
    }

    /// Integrity passed and every field was within bounds.
    pub fn is_valid(&self) -> bool {
        self.checksum_ok() && self.field_errors.is_empty()
    }

    /// Report the first reason this snapshot cannot be trusted. Integrity
    /// failures take precedence over field range failures.
    pub fn check(&self) -> Result<()> {
        match self.checksum {
            Some(cs) if !cs.is_ok() => {
                return Err(SondeError::Integrity {
                    computed: cs.computed,
                    stored: cs.stored,
                })
            }
            _ => {}
        }
        match self.field_errors.first() {
            Some(&e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude.unwrap_or(FLOAT_SENTINEL)
    }

    pub fn longitude(&self) -> f64 {
        self.longitude.unwrap_or(FLOAT_SENTINEL)
    }

    pub fn altitude(&self) -> f64 {
        self.altitude.unwrap_or(FLOAT_SENTINEL)
    }

    pub fn day(&self) -> i32 {
        self.date.map_or(INT_SENTINEL, |d| d.day as i32)
    }

    pub fn month(&self) -> i32 {
        self.date.map_or(INT_SENTINEL, |d| d.month as i32)
    }

    pub fn year(&self) -> i32 {
        self.date.map_or(INT_SENTINEL, |d| d.year)
    }

    pub fn hours(&self) -> i32 {
        self.time.map_or(INT_SENTINEL, |t| t.hour as i32)
    }

    pub fn minutes(&self) -> i32 {
        self.time.map_or(INT_SENTINEL, |t| t.minute as i32)
    }

    pub fn seconds(&self) -> i32 {
        self.time.map_or(INT_SENTINEL, |t| t.second as i32)
    }

    pub fn vertical_speed(&self) -> f64 {
        self.velocity.map_or(FLOAT_SENTINEL, |v| v.vertical)
    }

    pub fn horizontal_speed(&self) -> f64 {
        self.velocity.map_or(FLOAT_SENTINEL, |v| v.horizontal)
    }

    pub fn direction(&self) -> f64 {
        self.velocity.map_or(FLOAT_SENTINEL, |v| v.direction)
    }

    pub fn serial_number(&self) -> &str {
        self.serial.as_deref().unwrap_or("")
    }

    /// One-line summary used by the dumps and the feeder's text output.
    pub fn summary_line(&self) -> String {
        let date = self
            .date
            .map(|d| format!("{:04}-{:02}-{:02}", d.year, d.month, d.day))
            .unwrap_or_else(|| "----------".into());
        let time = self
            .time
            .map(|t| format!("{:02}:{:02}:{:02}", t.hour, t.minute, t.second))
            .unwrap_or_else(|| "--:--:--".into());
        let lat = self
            .latitude
            .map(|v| format!("lat: {v:.5}"))
            .unwrap_or_else(|| "lat: -".into());
        let lon = self
            .longitude
            .map(|v| format!("lon: {v:.5}"))
            .unwrap_or_else(|| "lon: -".into());
        let alt = self
            .altitude
            .map(|a| format!("alt: {a:.2}"))
            .unwrap_or_else(|| "alt: -".into());
        let vel = self
            .velocity
            .map(|v| {
                format!(
                    "vH: {:.1}  D: {:.1}  vV: {:.1}",
                    v.horizontal, v.direction, v.vertical
                )
            })
            .unwrap_or_else(|| "vH: -  D: -  vV: -".into());
        let status = if self.is_valid() { "[OK]" } else { "[NO]" };
        format!(
            "({}) {date} {time}  {lat}  {lon}  {alt}  {vel}  {status}",
            self.serial_number()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
