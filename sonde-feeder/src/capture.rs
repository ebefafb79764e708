//! Hex frame input for sonde-feeder.
//!
//! Reads pre-demodulated M10 frames, one per line, as printed by raw-mode
//! demodulators: a hex string optionally followed by whitespace and a
//! trailing comment or status marker. Blank lines and `#` lines are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use sonde_core::layout::POS_FRAME_TYPE;
use sonde_core::{hex_decode, Result, SondeError, FRAME_TOTAL_LEN};

/// One frame read from the input, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexFrame {
    pub line: usize,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Hex Frame Reader
// ---------------------------------------------------------------------------

/// Iterator over the frames of a hex capture.
///
/// Yields `Err(InvalidHex)` for lines that carry something other than hex,
/// and `Err(Io)` if the underlying reader fails.
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl FrameReader<Box<dyn BufRead>> {
    /// Open a capture file, or stdin when `path` is `-`.
    pub fn open(path: &Path) -> Result<Self> {
        let reader: Box<dyn BufRead> = if path.to_str() == Some("-") {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(File::open(path)?))
        };
        Ok(FrameReader::new(reader))
    }
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        FrameReader {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<HexFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SondeError::Io(e))),
            }
            self.line_no += 1;

            let Some(hex) = clean_hex_line(&self.buf) else {
                continue;
            };
            return Some(parse_frame_hex(hex).map(|bytes| HexFrame {
                line: self.line_no,
                bytes,
            }));
        }
    }
}

/// Extract the hex token from a line, dropping any trailing annotation.
pub fn clean_hex_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split_whitespace().next()
}

/// Decode a frame's hex and zero-pad a short capture to a full frame.
///
/// Longer input is left as is; the decoder rejects it by length.
pub fn parse_frame_hex(hex: &str) -> Result<Vec<u8>> {
    let mut bytes = hex_decode(hex).ok_or_else(|| SondeError::InvalidHex(hex.to_string()))?;
    if bytes.len() <= POS_FRAME_TYPE {
        return Err(SondeError::InvalidHex(hex.to_string()));
    }
    if bytes.len() < FRAME_TOTAL_LEN {
        bytes.resize(FRAME_TOTAL_LEN, 0);
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
