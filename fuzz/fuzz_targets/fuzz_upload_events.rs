//! Fuzz target: upload session state machine.
//!
//! Feeds arbitrary event sequences into the update handler and
//! verifies:
//! - No panics under arbitrary sequences
//! - At most one session conclusion
//! - The sink is never written after the session failed
//!
//! cargo fuzz run fuzz_upload_events

#![no_main]

use fieldcam::app::ports::{StorageError, UpdateSink};
use fieldcam::router::UploadEvent;
use fieldcam::update::{UpdateHandler, UploadPhase, UploadStatus};
use libfuzzer_sys::fuzz_target;

struct MemSink {
    open: bool,
    writes_after_close: u32,
}

impl UpdateSink for MemSink {
    fn begin(&mut self) -> Result<(), StorageError> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        if !self.open {
            self.writes_after_close += 1;
        }
        Ok(data.len())
    }

    fn commit(&mut self, _total: u64) -> Result<(), StorageError> {
        self.open = false;
        Ok(())
    }

    fn abort(&mut self) {
        self.open = false;
    }
}

fuzz_target!(|data: &[u8]| {
    let mut sink = MemSink {
        open: false,
        writes_after_close: 0,
    };
    let mut handler = UpdateHandler::new(64 * 1024);
    let mut conclusions = 0u32;

    for chunk in data.chunks(3) {
        let event = match chunk[0] % 3 {
            0 => UploadEvent::Start,
            1 => {
                let len = chunk.get(1).copied().unwrap_or(1) as usize;
                UploadEvent::Chunk(vec![chunk.get(2).copied().unwrap_or(0); len])
            }
            _ => UploadEvent::End,
        };

        if let Ok(UploadStatus::Complete { .. }) = handler.handle_event(event, &mut sink) {
            conclusions += 1;
        }

        if matches!(handler.phase(), UploadPhase::Failed { .. }) {
            // A failed session must never touch the sink again.
            assert_eq!(sink.writes_after_close, 0);
        }
    }

    assert!(conclusions <= 1, "a session may conclude at most once");
});
