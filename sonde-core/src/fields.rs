//! Field decoders: byte ranges to physical values.
//!
//! Each function is pure and reads only the bytes named by the layout, so
//! fields can be decoded in any order once the frame is fixed. Range
//! violations are returned as `FieldError`, never clamped.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::layout::{
    Endian, Field, FrameLayout, RawFrame, TimeEncoding, POS_FRAME_TYPE, SERIAL_LEN,
};
use crate::telemetry::{CalendarDate, TimeOfDay, Velocity};
use crate::types::{FieldError, FieldKind};

pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Milliseconds in one GPS week.
pub const MS_PER_WEEK: i64 = 7 * 24 * 3600 * 1000;

/// GPS minus UTC as of 2017-01-01.
pub const DEFAULT_LEAP_SECONDS: i64 = 18;

// ---------------------------------------------------------------------------
// Raw integer access
// ---------------------------------------------------------------------------

/// Read a field as an integer, sign-extending when the field is signed.
pub fn read_raw(frame: &RawFrame, field: &Field) -> i64 {
    let bytes = &frame[field.range()];
    let mut val = 0u64;
    match field.endian {
        Endian::Big => {
            for &b in bytes {
                val = (val << 8) | b as u64;
            }
        }
        Endian::Little => {
            for &b in bytes.iter().rev() {
                val = (val << 8) | b as u64;
            }
        }
    }
    if field.signed && field.width < 8 {
        let shift = 64 - 8 * field.width as u32;
        ((val << shift) as i64) >> shift
    } else {
        val as i64
    }
}

/// Read a field and apply its scale.
pub fn read_scaled(frame: &RawFrame, field: &Field) -> f64 {
    read_raw(frame, field) as f64 * field.scale
}

// ---------------------------------------------------------------------------
// Frame type
// ---------------------------------------------------------------------------

pub fn check_frame_type(frame: &RawFrame, layout: &FrameLayout) -> FieldResult<()> {
    let actual = frame[POS_FRAME_TYPE];
    if actual == layout.frame_type {
        Ok(())
    } else {
        Err(FieldError::new(FieldKind::FrameType, actual as i64))
    }
}

// ---------------------------------------------------------------------------
// Position and altitude
// ---------------------------------------------------------------------------

pub fn decode_latitude(frame: &RawFrame, layout: &FrameLayout) -> FieldResult<f64> {
    let raw = read_raw(frame, &layout.lat);
    let lat = raw as f64 * layout.lat.scale;
    if (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(FieldError::new(FieldKind::Latitude, raw))
    }
}

pub fn decode_longitude(frame: &RawFrame, layout: &FrameLayout) -> FieldResult<f64> {
    let raw = read_raw(frame, &layout.lon);
    let lon = raw as f64 * layout.lon.scale;
    if (-180.0..=180.0).contains(&lon) {
        Ok(lon)
    } else {
        Err(FieldError::new(FieldKind::Longitude, raw))
    }
}

/// Altitude in meters. No ceiling; the floor is the family minimum.
pub fn decode_altitude(frame: &RawFrame, layout: &FrameLayout) -> FieldResult<f64> {
    let raw = read_raw(frame, &layout.alt);
    let alt = raw as f64 * layout.alt.scale;
    if alt >= layout.min_altitude {
        Ok(alt)
    } else {
        Err(FieldError::new(FieldKind::Altitude, raw))
    }
}

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

pub fn decode_velocity(frame: &RawFrame, layout: &FrameLayout) -> Velocity {
    Velocity::from_components(
        read_scaled(frame, &layout.vel_east),
        read_scaled(frame, &layout.vel_north),
        read_scaled(frame, &layout.vel_up),
    )
}

// ---------------------------------------------------------------------------
// Date and time
// ---------------------------------------------------------------------------

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-12) of `year`; 0 for an invalid month.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Split a decimal `HHMMSS` group.
pub fn decode_hhmmss(raw: i64) -> FieldResult<TimeOfDay> {
    let err = FieldError::new(FieldKind::Time, raw);
    if !(0..=235959).contains(&raw) {
        return Err(err);
    }
    let hour = (raw / 10000) as u32;
    let minute = ((raw % 10000) / 100) as u32;
    let second = (raw % 100) as u32;
    if hour > 23 || minute > 59 || second > 59 {
        return Err(err);
    }
    Ok(TimeOfDay {
        hour,
        minute,
        second,
    })
}

/// Split a decimal `DDMMYY` group. Two-digit years are in the 2000s.
pub fn decode_ddmmyy(raw: i64) -> FieldResult<CalendarDate> {
    let err = FieldError::new(FieldKind::Date, raw);
    if !(0..=999999).contains(&raw) {
        return Err(err);
    }
    let day = (raw / 10000) as u32;
    let month = ((raw % 10000) / 100) as u32;
    let year = 2000 + (raw % 100) as i32;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(month, year) {
        return Err(err);
    }
    Ok(CalendarDate { day, month, year })
}

fn gps_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1980, 1, 6)?.and_hms_opt(0, 0, 0)
}

/// Convert GPS week and time of week to UTC date and time of day.
pub fn gps_to_utc(
    week: i64,
    tow_ms: i64,
    leap_seconds: i64,
) -> FieldResult<(CalendarDate, TimeOfDay)> {
    let err = FieldError::new(FieldKind::TimeOfWeek, tow_ms);
    if !(0..MS_PER_WEEK).contains(&tow_ms) {
        return Err(err);
    }
    let utc = gps_epoch()
        .and_then(|t| t.checked_add_signed(TimeDelta::try_weeks(week)?))
        .and_then(|t| t.checked_add_signed(TimeDelta::try_milliseconds(tow_ms)?))
        .and_then(|t| t.checked_sub_signed(TimeDelta::try_seconds(leap_seconds)?))
        .ok_or(err)?;
    Ok((
        CalendarDate {
            day: utc.day(),
            month: utc.month(),
            year: utc.year(),
        },
        TimeOfDay {
            hour: utc.hour(),
            minute: utc.minute(),
            second: utc.second(),
        },
    ))
}

/// Decode date and time per the family's encoding. Date and time fail
/// independently for decimal groups; a bad GPS time of week fails both.
pub fn decode_date_time(
    frame: &RawFrame,
    layout: &FrameLayout,
    leap_seconds: i64,
) -> (FieldResult<CalendarDate>, FieldResult<TimeOfDay>) {
    match layout.time {
        TimeEncoding::DecimalGroups { time, date } => (
            decode_ddmmyy(read_raw(frame, &date)),
            decode_hhmmss(read_raw(frame, &time)),
        ),
        TimeEncoding::GpsWeek { week, tow_ms } => {
            match gps_to_utc(read_raw(frame, &week), read_raw(frame, &tow_ms), leap_seconds) {
                Ok((d, t)) => (Ok(d), Ok(t)),
                Err(e) => (Err(e), Err(e)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Serial number
// ---------------------------------------------------------------------------

/// Assemble the 11-character M10 serial number from the 5 bytes at `pos`.
///
/// Layout: `sn[2]` high nibble (hex) and low nibble (two decimal digits),
/// `sn[0]` low nibble (hex), then the little-endian word `sn[3..5]` split
/// into a 3-bit digit and a 13-bit four-digit counter.
pub fn decode_serial(frame: &RawFrame, pos: usize) -> String {
    let sn = &frame[pos..pos + SERIAL_LEN];
    let word = u16::from_le_bytes([sn[3], sn[4]]);
    format!(
        "{:X}{:02} {:X} {}{:04}",
        (sn[2] >> 4) & 0xF,
        sn[2] & 0xF,
        sn[0] & 0xF,
        (word >> 13) & 0x7,
        word & 0x1FFF
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
