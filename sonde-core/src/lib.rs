//! sonde-core: Frame validation and telemetry decoding for M10 radiosondes.
//!
//! No async, no network. Frames arrive already demodulated as fixed-size
//! byte buffers; this crate checks their integrity, decodes navigation
//! fields through per-family layout tables, and publishes immutable
//! telemetry snapshots. `sonde-feeder` drives it from hex capture files.

pub mod checksum;
pub mod config;
pub mod decoder;
pub mod family;
pub mod fields;
pub mod layout;
pub mod m10gtop;
pub mod m10trimble;
pub mod sensors;
pub mod shared;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-export commonly used types at crate root
pub use decoder::{decode_frame, DecodeOptions, DecoderState, FrameBuffer, SondeDecoder};
pub use family::SondeFamily;
pub use layout::{FrameLayout, RawFrame, FRAME_TOTAL_LEN};
pub use m10gtop::M10GtopDecoder;
pub use m10trimble::M10TrimbleDecoder;
pub use sensors::SensorReadings;
pub use shared::SharedDecoder;
pub use telemetry::Telemetry;
pub use types::*;
