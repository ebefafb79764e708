//! M10 radiosonde with GTop GPS receiver (frame type `0xAF`).
//!
//! Position in 1e-6 degrees, altitude in centimeters (24-bit), ENU velocity
//! in cm/s, and UTC carried directly as `HHMMSS` / `DDMMYY` decimal groups.
//! The dump adds the sensor boom readings.

use crate::decoder::{DecodeOptions, FrameBuffer, SondeDecoder};
use crate::family::SondeFamily;
use crate::layout::M10_GTOP;
use crate::sensors::SensorReadings;

pub struct M10GtopDecoder {
    buffer: FrameBuffer,
}

impl M10GtopDecoder {
    pub fn new() -> Self {
        M10GtopDecoder::with_options(DecodeOptions::default())
    }

    /// GTop frames carry UTC directly, so leap seconds are ignored.
    pub fn with_options(options: DecodeOptions) -> Self {
        M10GtopDecoder {
            buffer: FrameBuffer::with_options(&M10_GTOP, options),
        }
    }
}

impl Default for M10GtopDecoder {
    fn default() -> Self {
        M10GtopDecoder::new()
    }
}

impl SondeDecoder for M10GtopDecoder {
    fn family(&self) -> SondeFamily {
        SondeFamily::M10Gtop
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
        if let Some(raw) = self.buffer.raw() {
            SensorReadings::from_frame(raw).write_dump(&mut out);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderState;
    use crate::testutil::{gtop_frame, sensor_bytes, trimble_frame, FrameSpec};
    use crate::types::{FieldKind, SondeError};

    #[test]
    fn test_uninitialized_getters() {
        let dec = M10GtopDecoder::new();
        assert_eq!(dec.state(), DecoderState::Uninitialized);
        assert!(dec.latitude().is_nan());
        assert!(dec.vertical_speed().is_nan());
        assert_eq!(dec.year(), -1);
        assert_eq!(dec.seconds(), -1);
        assert_eq!(dec.serial_number(), "");
        assert!(!dec.is_valid());
        assert_eq!(dec.sensors(), None);
        assert_eq!(dec.humidity(), None);
        assert!(dec.dump().contains("no frame decoded"));
        assert!(!dec.dump().contains("sensors:"));
    }

    #[test]
    fn test_change_data_round_trip() {
        let mut dec = M10GtopDecoder::new();
        let t = dec.change_data(&gtop_frame(&FrameSpec::default())).unwrap();
        assert!(t.is_valid());
        assert_eq!(dec.state(), DecoderState::Decoded { valid: true });
        assert_eq!(dec.latitude(), 51.5074);
        assert_eq!(dec.longitude(), -0.1278);
        assert_eq!(dec.altitude(), 1000.0);
        assert_eq!((dec.day(), dec.month(), dec.year()), (15, 3, 2024));
        assert_eq!((dec.hours(), dec.minutes(), dec.seconds()), (12, 30, 45));
        assert_eq!(dec.vertical_speed(), 2.5);
        assert_eq!(dec.horizontal_speed(), 10.0);
        assert_eq!(dec.direction(), 90.0);
        assert_eq!(dec.serial_number(), "903 2 20123");
    }

    #[test]
    fn test_bearing_through_frame() {
        let cases = [
            (0.0, 5.0, 0.0),
            (5.0, 0.0, 90.0),
            (0.0, -5.0, 180.0),
            (-5.0, 0.0, 270.0),
        ];
        let mut dec = M10GtopDecoder::new();
        for (east, north, expected) in cases {
            let spec = FrameSpec {
                vel_east: east,
                vel_north: north,
                ..FrameSpec::default()
            };
            dec.change_data(&gtop_frame(&spec)).unwrap();
            assert_eq!(dec.direction(), expected, "east={east} north={north}");
            assert_eq!(dec.horizontal_speed(), 5.0);
        }
    }

    #[test]
    fn test_single_bit_flip_invalidates() {
        let frame = gtop_frame(&FrameSpec::default());
        let mut dec = M10GtopDecoder::new();
        for bit in [0x04 * 8 + 3, 0x15 * 8, 0x5D * 8 + 7, 0x62 * 8 + 1] {
            let mut corrupted = frame;
            corrupted[bit / 8] ^= 1 << (bit % 8);
            let t = dec.change_data(&corrupted).unwrap();
            assert!(!t.is_valid(), "bit {bit}");
            assert!(matches!(t.check(), Err(SondeError::Integrity { .. })));
            assert_eq!(dec.state(), DecoderState::Decoded { valid: false });
        }
        dec.change_data(&frame).unwrap();
        assert!(dec.is_valid());
    }

    #[test]
    fn test_month_zero_sentinel() {
        let spec = FrameSpec {
            date: 150024,
            ..FrameSpec::default()
        };
        let mut dec = M10GtopDecoder::new();
        let t = dec.change_data(&gtop_frame(&spec)).unwrap();
        assert!(t.checksum_ok());
        assert!(!t.is_valid());
        assert_eq!((dec.day(), dec.month(), dec.year()), (-1, -1, -1));
        assert_eq!(dec.hours(), 12);
        assert!(matches!(
            t.check(),
            Err(SondeError::FieldRange {
                field: FieldKind::Date,
                value: 150024
            })
        ));
    }

    #[test]
    fn test_bad_time_keeps_date() {
        let spec = FrameSpec {
            time: 246161,
            ..FrameSpec::default()
        };
        let mut dec = M10GtopDecoder::new();
        dec.change_data(&gtop_frame(&spec)).unwrap();
        assert_eq!(dec.hours(), -1);
        assert_eq!(dec.minutes(), -1);
        assert_eq!(dec.day(), 15);
    }

    #[test]
    fn test_wrong_length_keeps_previous() {
        let mut dec = M10GtopDecoder::new();
        let frame = gtop_frame(&FrameSpec::default());
        dec.change_data(&frame).unwrap();
        let before = dec.telemetry();

        let err = dec.change_data(&frame[..101]).unwrap_err();
        assert!(matches!(err, SondeError::FrameLength { actual: 101, .. }));
        assert_eq!(dec.telemetry(), before);
        assert_eq!(dec.buffer().raw(), Some(&frame));
    }

    #[test]
    fn test_idempotent_snapshots() {
        let frame = gtop_frame(&FrameSpec::default());
        let mut dec = M10GtopDecoder::new();
        let a = dec.change_data(&frame).unwrap();
        let b = dec.change_data(&frame).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.velocity.unwrap().direction.to_bits(),
            b.velocity.unwrap().direction.to_bits()
        );
    }

    #[test]
    fn test_trimble_frame_rejected_by_type() {
        let mut dec = M10GtopDecoder::new();
        let t = dec.change_data(&trimble_frame(&FrameSpec::default())).unwrap();
        assert!(t.checksum_ok());
        assert!(!t.is_valid());
        assert!(t
            .field_errors
            .iter()
            .any(|e| e.field == FieldKind::FrameType && e.value == 0x9F));
    }

    #[test]
    fn test_dump_extended_frame() {
        let spec = FrameSpec {
            aux: Some([0x42; 20]),
            ..FrameSpec::default()
        };
        let mut dec = M10GtopDecoder::new();
        dec.change_data(&gtop_frame(&spec)).unwrap();
        let dump = dec.dump();
        assert!(dump.starts_with("[m10-gtop] type AF  len 7A"));
        assert!(dump.contains("(903 2 20123) 2024-03-15 12:30:45"));
        assert!(dump.contains("    0010: 42 42 42 42"));
        assert!(dump.contains("  frame:\n    0000: 7A AF"));
    }

    #[test]
    fn test_sensor_readings() {
        let spec = FrameSpec {
            extra: sensor_bytes(0, 2048, 36_598),
            ..FrameSpec::default()
        };
        let mut dec = M10GtopDecoder::new();
        dec.change_data(&gtop_frame(&spec)).unwrap();
        assert!((dec.temperature().unwrap() - 4.9184).abs() < 1e-3);
        assert!((dec.humidity().unwrap() - 50.0).abs() < 1e-2);
        assert!((dec.dew_point().unwrap() + 4.6527).abs() < 1e-2);
        assert!(dec
            .dump()
            .contains("  sensors: temp 4.9 C  rh 50.0 %  dew -4.7 C\n"));
    }

    #[test]
    fn test_sensor_readings_unusable() {
        // range index 3 has no resistor pair, count 30000 is below dry
        let spec = FrameSpec {
            extra: sensor_bytes(3, 2048, 30_000),
            ..FrameSpec::default()
        };
        let mut dec = M10GtopDecoder::new();
        let t = dec.change_data(&gtop_frame(&spec)).unwrap();
        assert!(t.is_valid());
        assert_eq!(dec.temperature(), None);
        assert_eq!(dec.humidity(), None);
        assert_eq!(dec.dew_point(), None);
        assert!(dec.dump().contains("sensors: temp n/a  rh n/a  dew n/a"));
    }
}
