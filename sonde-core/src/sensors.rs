//! Sensor boom readings shared by both M10 variants.
//!
//! The GPS receiver differs between GTop and Trimble units but the
//! meteorological sensors and their frame positions do not:
//! - `0x35..0x38` humidity oscillator count (u24, little-endian)
//! - `0x3E` thermistor measurement range index
//! - `0x3F..0x41` thermistor ADC word (u16, little-endian, offset `0xA000`)
//!
//! Readings are not range-checked fields of the snapshot; an unusable
//! reading is simply `None` and shows as `n/a` in the dumps.

use std::fmt::Write;

use serde::Serialize;

use crate::fields::read_raw;
use crate::layout::{Field, RawFrame};

pub const POS_TEMP_RANGE: usize = 0x3E;
pub const TEMP_ADC: Field = Field::le_unsigned(0x3F, 2);
pub const RH_COUNT: Field = Field::le_unsigned(0x35, 3);

/// Offset subtracted from the raw thermistor word.
pub const TEMP_ADC_OFFSET: u16 = 0xA000;
const ADC_MAX: f64 = 4095.0;

/// Shibaura PB5-41E Steinhart-Hart coefficients and the per-range series and
/// parallel resistors (ohms), as published in rs1729's M10 decoder.
const THERM_P: [f64; 4] = [1.07303516e-03, 2.41296733e-04, 2.26744154e-06, 6.52855181e-08];
const THERM_RS: [f64; 3] = [12.1e3, 36.5e3, 475.0e3];
const THERM_RP: [f64; 3] = [1e20, 330.0e3, 3000.0e3];

const KELVIN: f64 = 273.15;

/// Capture clock of the humidity counter and the number of oscillator
/// periods it spans.
const RH_CAPTURE_HZ: f64 = 4.0e6;
const RH_PERIODS: f64 = 1000.0;
/// Nominal humidity capacitor model: 555 astable with this timing resistor,
/// 55 pF dry capacitance and a linear 0.4 %/%RH capacitance rise. No per-unit
/// calibration is applied.
const RH_TIMING_R: f64 = 100.0e3;
const RH_DRY_CAP: f64 = 55.0e-12;
const RH_SENSITIVITY: f64 = 0.004;

/// Magnus coefficients over water (Sonntag 1990).
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorReadings {
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Percent relative humidity.
    pub humidity: Option<f64>,
    /// Degrees Celsius.
    pub dew_point: Option<f64>,
}

impl SensorReadings {
    pub fn from_frame(frame: &RawFrame) -> Self {
        let temperature = temperature(frame);
        let humidity = humidity(frame);
        let dew_point = match (temperature, humidity) {
            (Some(t), Some(rh)) => dew_point(t, rh),
            _ => None,
        };
        SensorReadings {
            temperature,
            humidity,
            dew_point,
        }
    }

    pub fn write_dump(&self, out: &mut String) {
        let _ = writeln!(
            out,
            "  sensors: temp {}  rh {}  dew {}",
            fmt_reading(self.temperature, "C"),
            fmt_reading(self.humidity, "%"),
            fmt_reading(self.dew_point, "C"),
        );
    }
}

fn fmt_reading(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{v:.1} {unit}"))
        .unwrap_or_else(|| "n/a".into())
}

/// Main thermistor temperature in degrees Celsius, `None` when the range
/// index or ADC reading is unusable.
pub fn temperature(frame: &RawFrame) -> Option<f64> {
    let range = frame[POS_TEMP_RANGE] as usize;
    if range >= THERM_RS.len() {
        return None;
    }
    let adc = (read_raw(frame, &TEMP_ADC) as u16).wrapping_sub(TEMP_ADC_OFFSET) as f64;
    if adc <= 0.0 || adc > ADC_MAX {
        return None;
    }

    let x = (ADC_MAX - adc) / adc;
    let rs = THERM_RS[range];
    let r = rs / (x - rs / THERM_RP[range]);
    if !r.is_finite() || r <= 0.0 {
        return None;
    }

    let l = r.ln();
    let inv = THERM_P[0] + THERM_P[1] * l + THERM_P[2] * l * l + THERM_P[3] * l * l * l;
    let t = 1.0 / inv - KELVIN;
    t.is_finite().then_some(t)
}

/// Relative humidity in percent from the oscillator count, `None` when the
/// count is zero or the result falls outside `[0, 100]`.
pub fn humidity(frame: &RawFrame) -> Option<f64> {
    let count = read_raw(frame, &RH_COUNT);
    if count == 0 {
        return None;
    }
    let period = count as f64 / (RH_PERIODS * RH_CAPTURE_HZ);
    let cap = period / (2.0 * std::f64::consts::LN_2 * RH_TIMING_R);
    let rh = (cap / RH_DRY_CAP - 1.0) / RH_SENSITIVITY;
    (0.0..=100.0).contains(&rh).then_some(rh)
}

/// Dew point in degrees Celsius (Magnus formula).
pub fn dew_point(temperature: f64, humidity: f64) -> Option<f64> {
    if humidity <= 0.0 {
        return None;
    }
    let gamma = (humidity / 100.0).ln() + MAGNUS_A * temperature / (MAGNUS_B + temperature);
    let td = MAGNUS_B * gamma / (MAGNUS_A - gamma);
    td.is_finite().then_some(td)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
