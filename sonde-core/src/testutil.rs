//! Synthetic frame builders for unit tests.

use crate::checksum;
use crate::layout::{
    Endian, Field, FrameLayout, RawFrame, TimeEncoding, AUX_LEN, AUX_RANGE, EXT_DECLARED_LEN,
    FRAME_TOTAL_LEN, M10_GTOP, M10_TRIMBLE, SERIAL_LEN, STD_DECLARED_LEN,
};
use crate::sensors::{POS_TEMP_RANGE, RH_COUNT, TEMP_ADC_OFFSET};

/// Physical values to encode. Defaults describe a sonde over London on
/// 2024-03-15 12:30:45 UTC, climbing at 2.5 m/s and drifting east at 10 m/s.
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub vel_east: f64,
    pub vel_north: f64,
    pub vel_up: f64,
    /// DDMMYY, decimal-group families.
    pub date: u32,
    /// HHMMSS, decimal-group families.
    pub time: u32,
    /// GPS week, GPS-time families.
    pub gps_week: u16,
    /// GPS time of week in ms; default matches `date`/`time` with 18 leap seconds.
    pub tow_ms: u32,
    pub serial: [u8; SERIAL_LEN],
    /// Extended frame with this auxiliary payload.
    pub aux: Option<[u8; AUX_LEN]>,
    /// Bytes written after the layout fields, as `(offset, bytes)`.
    pub extra: Vec<(usize, Vec<u8>)>,
}

impl Default for FrameSpec {
    fn default() -> Self {
        FrameSpec {
            lat: 51.5074,
            lon: -0.1278,
            alt: 1000.0,
            vel_east: 10.0,
            vel_north: 0.0,
            vel_up: 2.5,
            date: 150324,
            time: 123045,
            gps_week: 2305,
            tow_ms: 477_063_000,
            // "903 2 20123"
            serial: [0x02, 0x00, 0x93, 0x7B, 0x40],
            aux: None,
            extra: Vec::new(),
        }
    }
}

/// `(offset, bytes)` patches placing a thermistor reading and a humidity
/// count, for `FrameSpec::extra`.
pub fn sensor_bytes(range: u8, adc: u16, rh_count: u32) -> Vec<(usize, Vec<u8>)> {
    let word = TEMP_ADC_OFFSET.wrapping_add(adc).to_le_bytes();
    let count = rh_count.to_le_bytes();
    vec![
        (RH_COUNT.pos, count[..3].to_vec()),
        (POS_TEMP_RANGE, vec![range, word[0], word[1]]),
    ]
}

pub fn put(frame: &mut RawFrame, field: &Field, raw: i64) {
    let bytes = raw.to_be_bytes();
    let be = &bytes[8 - field.width..];
    let dst = &mut frame[field.range()];
    match field.endian {
        Endian::Big => dst.copy_from_slice(be),
        Endian::Little => {
            for (d, s) in dst.iter_mut().zip(be.iter().rev()) {
                *d = *s;
            }
        }
    }
}

fn put_scaled(frame: &mut RawFrame, field: &Field, value: f64) {
    put(frame, field, (value / field.scale).round() as i64);
}

pub fn build(layout: &FrameLayout, spec: &FrameSpec) -> RawFrame {
    let mut frame = [0u8; FRAME_TOTAL_LEN];
    frame[0] = if spec.aux.is_some() {
        EXT_DECLARED_LEN
    } else {
        STD_DECLARED_LEN
    };
    frame[1] = layout.frame_type;

    put_scaled(&mut frame, &layout.lat, spec.lat);
    put_scaled(&mut frame, &layout.lon, spec.lon);
    put_scaled(&mut frame, &layout.alt, spec.alt);
    put_scaled(&mut frame, &layout.vel_east, spec.vel_east);
    put_scaled(&mut frame, &layout.vel_north, spec.vel_north);
    put_scaled(&mut frame, &layout.vel_up, spec.vel_up);
    match layout.time {
        TimeEncoding::DecimalGroups { time, date } => {
            put(&mut frame, &time, spec.time as i64);
            put(&mut frame, &date, spec.date as i64);
        }
        TimeEncoding::GpsWeek { week, tow_ms } => {
            put(&mut frame, &week, spec.gps_week as i64);
            put(&mut frame, &tow_ms, spec.tow_ms as i64);
        }
    }
    frame[layout.serial_pos..layout.serial_pos + SERIAL_LEN].copy_from_slice(&spec.serial);
    if let Some(aux) = spec.aux {
        frame[AUX_RANGE].copy_from_slice(&aux);
    }
    for (pos, bytes) in &spec.extra {
        frame[*pos..*pos + bytes.len()].copy_from_slice(bytes);
    }
    checksum::seal(&mut frame);
    frame
}

pub fn gtop_frame(spec: &FrameSpec) -> RawFrame {
    build(&M10_GTOP, spec)
}

pub fn trimble_frame(spec: &FrameSpec) -> RawFrame {
    build(&M10_TRIMBLE, spec)
}
