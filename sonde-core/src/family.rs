//! Sonde family registry: names, detection, and decoder construction.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::decoder::{DecodeOptions, SondeDecoder};
use crate::layout::{FrameLayout, M10_GTOP, M10_TRIMBLE, POS_FRAME_TYPE};
use crate::m10gtop::M10GtopDecoder;
use crate::m10trimble::M10TrimbleDecoder;
use crate::types::SondeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SondeFamily {
    M10Gtop,
    M10Trimble,
}

impl SondeFamily {
    pub const ALL: [SondeFamily; 2] = [SondeFamily::M10Gtop, SondeFamily::M10Trimble];

    pub fn layout(self) -> &'static FrameLayout {
        match self {
            SondeFamily::M10Gtop => &M10_GTOP,
            SondeFamily::M10Trimble => &M10_TRIMBLE,
        }
    }

    pub fn name(self) -> &'static str {
        self.layout().name
    }

    pub fn from_frame_type(frame_type: u8) -> Option<Self> {
        SondeFamily::ALL
            .into_iter()
            .find(|f| f.layout().frame_type == frame_type)
    }

    /// Guess the family from the frame type byte. Does not validate the frame.
    pub fn detect(data: &[u8]) -> Option<Self> {
        data.get(POS_FRAME_TYPE)
            .copied()
            .and_then(SondeFamily::from_frame_type)
    }

    pub fn decoder(self, options: DecodeOptions) -> Box<dyn SondeDecoder + Send> {
        match self {
            SondeFamily::M10Gtop => Box::new(M10GtopDecoder::with_options(options)),
            SondeFamily::M10Trimble => Box::new(M10TrimbleDecoder::with_options(options)),
        }
    }
}

impl fmt::Display for SondeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SondeFamily {
    type Err = SondeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SondeFamily::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| SondeError::UnknownFamily(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
