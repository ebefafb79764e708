//! Thread-safe wrapper around one family decoder.
//!
//! Writers serialize on the decoder mutex. Readers only touch the published
//! snapshot, so they never block on a decode in progress and never observe a
//! half-written frame: each `change_data` decodes into a fresh
//! `Arc<Telemetry>` and swaps it in whole.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::decoder::{DecodeOptions, SondeDecoder};
use crate::family::SondeFamily;
use crate::telemetry::Telemetry;
use crate::types::Result;

pub struct SharedDecoder {
    family: SondeFamily,
    decoder: Mutex<Box<dyn SondeDecoder + Send>>,
    published: RwLock<Arc<Telemetry>>,
}

impl SharedDecoder {
    pub fn new(family: SondeFamily, options: DecodeOptions) -> Self {
        let decoder = family.decoder(options);
        let published = RwLock::new(decoder.telemetry());
        SharedDecoder {
            family,
            decoder: Mutex::new(decoder),
            published,
        }
    }

    pub fn family(&self) -> SondeFamily {
        self.family
    }

    /// Decode `data` and publish the result. On a length error the previous
    /// snapshot stays published.
    pub fn change_data(&self, data: &[u8]) -> Result<Arc<Telemetry>> {
        let mut decoder = self.decoder.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = decoder.change_data(data)?;
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Telemetry> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn dump(&self) -> String {
        self.decoder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dump()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{gtop_frame, FrameSpec};
    use std::thread;

    #[test]
    fn test_initial_snapshot_is_empty() {
        let shared = SharedDecoder::new(SondeFamily::M10Gtop, DecodeOptions::default());
        assert_eq!(shared.family(), SondeFamily::M10Gtop);
        assert!(!shared.snapshot().is_decoded());
        assert!(shared.dump().contains("no frame decoded"));
    }

    #[test]
    fn test_length_error_keeps_published() {
        let shared = SharedDecoder::new(SondeFamily::M10Gtop, DecodeOptions::default());
        let frame = gtop_frame(&FrameSpec::default());
        let first = shared.change_data(&frame).unwrap();
        assert!(shared.change_data(&frame[..10]).is_err());
        assert!(Arc::ptr_eq(&shared.snapshot(), &first));
    }

    #[test]
    fn test_readers_see_whole_snapshots() {
        let shared = Arc::new(SharedDecoder::new(
            SondeFamily::M10Gtop,
            DecodeOptions::default(),
        ));
        let a = gtop_frame(&FrameSpec::default());
        let b = gtop_frame(&FrameSpec {
            lat: -33.8688,
            lon: 151.2093,
            alt: 25_000.0,
            serial: [0x01, 0x00, 0x84, 0x10, 0x20],
            ..FrameSpec::default()
        });
        let expected_a = shared.change_data(&a).unwrap();
        let expected_b = shared.change_data(&b).unwrap();

        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..500 {
                    let frame = if i % 2 == 0 { &a } else { &b };
                    shared.change_data(frame).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let (ea, eb) = (Arc::clone(&expected_a), Arc::clone(&expected_b));
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = shared.snapshot();
                        assert!(*snap == *ea || *snap == *eb);
                        assert!(snap.is_valid());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
