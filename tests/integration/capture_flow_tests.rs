//! Integration tests for the capture route.
//!
//! The invariant under test: one release per acquire, on every exit
//! path, so a failed response can never starve later captures.

use fieldcam::app::service::AppService;
use fieldcam::config::SystemConfig;
use fieldcam::router::{Request, Response};
use fieldcam::stream::FRAME_MEDIA_TYPE;

use crate::mock_hw::{LogSink, MockDevice, RecordingBody};

fn started_service(dev: &mut MockDevice, sink: &mut LogSink) -> AppService {
    let mut app = AppService::new(SystemConfig::default());
    app.start(dev, sink).unwrap();
    app
}

#[test]
fn capture_streams_the_whole_frame() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    let outcome = app.dispatch(Request::Capture, &mut dev, &mut body, &mut sink);

    assert_eq!(
        outcome.response,
        Response::Binary {
            media_type: FRAME_MEDIA_TYPE,
            len: dev.frame_bytes.len(),
        }
    );
    assert_eq!(
        body.declared,
        Some((dev.frame_bytes.len(), FRAME_MEDIA_TYPE.to_string()))
    );
    assert_eq!(body.payload, dev.frame_bytes);
    assert_eq!(dev.frames_outstanding(), 0);
    assert!(sink.saw("CaptureServed"));
}

#[test]
fn empty_capture_produces_no_body() {
    let mut dev = MockDevice::new();
    dev.frame_available = false;
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    let outcome = app.dispatch(Request::Capture, &mut dev, &mut body, &mut sink);

    assert_eq!(outcome.response, Response::Empty);
    assert!(body.declared.is_none());
    assert!(body.payload.is_empty());
    assert_eq!(dev.acquired, 0);
    assert!(sink.saw("CaptureEmpty"));
}

#[test]
fn transport_failure_is_silent_and_releases_the_frame() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::failing();

    let outcome = app.dispatch(Request::Capture, &mut dev, &mut body, &mut sink);

    // No error text for the requester, per the source's behavior.
    assert_eq!(outcome.response, Response::Empty);
    assert_eq!(dev.acquired, 1);
    assert_eq!(dev.frames_outstanding(), 0);
    assert!(!sink.saw("CaptureServed"));
}

#[test]
fn capture_works_in_hub_mode_too() {
    // Streaming depends only on the frame source, not on the mode.
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    let outcome = app.dispatch(Request::Capture, &mut dev, &mut body, &mut sink);
    assert!(matches!(outcome.response, Response::Binary { .. }));
}

#[test]
fn repeated_captures_never_leak_reservations() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);

    for i in 0..100 {
        let mut body = if i % 4 == 0 {
            RecordingBody::failing()
        } else {
            RecordingBody::new()
        };
        let _ = app.dispatch(Request::Capture, &mut dev, &mut body, &mut sink);
        assert_eq!(dev.frames_outstanding(), 0, "leak after request {i}");
    }
    assert_eq!(dev.acquired, 100);
    assert_eq!(dev.released, 100);
}
