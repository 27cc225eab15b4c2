//! Capture streaming - one frame per request.
//!
//! The frame buffer is a scarce reservation inside the capture source
//! (DMA framebuffer on real hardware). The handler owns it only for the
//! duration of one response and hands it back on every exit path: served,
//! empty, or transport failure mid-body. Release is a single point the
//! control flow cannot bypass, so an early transport error can never
//! starve later capture requests.

use log::{info, warn};

use crate::app::ports::{BodySink, FrameSource};
use crate::{Error, Result};

/// Media type declared for every streamed frame.
pub const FRAME_MEDIA_TYPE: &str = "image/jpeg";

// ── Frame ─────────────────────────────────────────────────────

/// One captured image payload plus its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub bytes: Vec<u8>,
}

/// What a capture request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The whole frame was streamed; `len` bytes were declared and sent.
    Served { len: usize },
    /// The source had no frame; no body was produced, no buffer held.
    Empty,
}

// ── Handler ───────────────────────────────────────────────────

/// Serves a single frame per request from a [`FrameSource`].
pub struct StreamingHandler {
    frames_served: u64,
}

impl StreamingHandler {
    pub fn new() -> Self {
        Self { frames_served: 0 }
    }

    /// Total frames fully streamed since boot.
    pub fn frames_served(&self) -> u64 {
        self.frames_served
    }

    /// Acquire one frame, stream it, release it.
    ///
    /// An empty capture is a distinguished result, not a success with a
    /// zero-length body. A transport failure mid-body surfaces as
    /// `Error::Transport` - after the frame has been released.
    pub fn handle_capture(
        &mut self,
        source: &mut impl FrameSource,
        body: &mut impl BodySink,
    ) -> Result<CaptureOutcome> {
        let Some(frame) = source.acquire() else {
            info!("Capture: no frame available");
            return Ok(CaptureOutcome::Empty);
        };

        let len = frame.bytes.len();
        let sent = body
            .begin_body(len, FRAME_MEDIA_TYPE)
            .and_then(|()| body.write_all(&frame.bytes));

        // Unconditional: the reservation goes back whether or not the
        // transport accepted the payload.
        source.release(frame);

        match sent {
            Ok(()) => {
                self.frames_served += 1;
                info!("Capture: served {} bytes", len);
                Ok(CaptureOutcome::Served { len })
            }
            Err(e) => {
                warn!("Capture: transport failed mid-body - {}", e);
                Err(Error::Transport(e))
            }
        }
    }
}

impl Default for StreamingHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────
