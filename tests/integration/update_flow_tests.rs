//! Integration tests for the firmware upload flow.
//!
//! The session is driven exactly the way the HTTP glue drives it: a
//! strict Start → Chunk* → End event order, with the outcome reported
//! once at End and a restart action either way.

use fieldcam::app::service::AppService;
use fieldcam::config::SystemConfig;
use fieldcam::mode::DeviceMode;
use fieldcam::router::{DeviceAction, FormFields, Request, Response, UploadEvent};

use crate::mock_hw::{LogSink, MockDevice, RecordingBody};

/// Boot, provision and connect so updates are accepted.
fn client_service(dev: &mut MockDevice, sink: &mut LogSink) -> AppService {
    let mut app = AppService::new(SystemConfig::default());
    app.start(dev, sink).unwrap();
    app.dispatch(
        Request::SubmitCredentials(FormFields::from([("ssid", "HomeNet"), ("psk", "pw123456")])),
        dev,
        &mut RecordingBody::new(),
        sink,
    );
    app.dispatch(Request::Connect, dev, &mut RecordingBody::new(), sink);
    assert_eq!(app.mode(), DeviceMode::Client);
    app
}

fn upload(app: &mut AppService, dev: &mut MockDevice, sink: &mut LogSink, ev: UploadEvent) -> fieldcam::app::service::Outcome {
    app.dispatch(Request::Upload(ev), dev, &mut RecordingBody::new(), sink)
}

#[test]
fn megabyte_upload_finishes_ok_and_restarts() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    for _ in 0..256 {
        let outcome = upload(
            &mut app,
            &mut dev,
            &mut sink,
            UploadEvent::Chunk(vec![0x5A; 4096]),
        );
        assert_eq!(outcome.response, Response::Empty);
        assert!(outcome.action.is_none());
    }
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    assert_eq!(outcome.response, Response::Status("OK"));
    assert_eq!(outcome.action, Some(DeviceAction::Restart));
    assert_eq!(dev.committed, Some(1_048_576));
    assert_eq!(dev.staged.len(), 1_048_576);
    assert!(sink.saw("UpdateConcluded { ok: true"));
    assert!(sink.saw("RestartRequested"));
}

#[test]
fn chunk_sizes_accumulate_into_the_commit_total() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    for size in [100usize, 250, 64] {
        upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![1; size]));
    }
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    assert_eq!(outcome.response, Response::Status("OK"));
    assert_eq!(dev.committed, Some(414));
    assert_eq!(dev.sink_writes, vec![100, 250, 64]);
}

#[test]
fn short_write_fails_the_session_without_commit() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![1; 100]));
    dev.truncate_next_write = Some(10);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![1; 100]));
    // Later chunks are discarded, not written.
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![1; 100]));
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert_eq!(outcome.action, Some(DeviceAction::Restart));
    assert_eq!(dev.committed, None);
    assert_eq!(dev.sink_writes, vec![100, 10]);
    assert_eq!(dev.aborted, 1);
    assert!(sink.saw("UpdateConcluded { ok: false"));
}

#[test]
fn open_failure_discards_the_stream_and_reports_fail() {
    let mut dev = MockDevice::new();
    dev.fail_begin = true;
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    for _ in 0..4 {
        let outcome = upload(
            &mut app,
            &mut dev,
            &mut sink,
            UploadEvent::Chunk(vec![0; 512]),
        );
        assert_eq!(outcome.response, Response::Empty);
    }
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert_eq!(outcome.action, Some(DeviceAction::Restart));
    assert!(dev.sink_writes.is_empty());
    assert_eq!(dev.committed, None);
}

#[test]
fn finalize_failure_reports_fail_and_still_restarts() {
    let mut dev = MockDevice::new();
    dev.fail_commit = true;
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![0; 64]));
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert_eq!(outcome.action, Some(DeviceAction::Restart));
}

#[test]
fn upload_is_rejected_while_unprovisioned() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = AppService::new(SystemConfig::default());
    app.start(&mut dev, &mut sink).unwrap();

    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert!(outcome.action.is_none());
    assert_eq!(dev.sink_opens, 0);
}

#[test]
fn out_of_order_events_are_rejected_without_state_change() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    // Chunk before Start.
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![0; 8]));
    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert!(outcome.action.is_none());
    assert_eq!(dev.sink_opens, 0);

    // The rejection did not poison the machine: a well-ordered session
    // still succeeds.
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(vec![0; 8]));
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::End);
    assert_eq!(outcome.response, Response::Status("OK"));
}

#[test]
fn events_after_conclusion_are_errors_until_restart() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    // The session concluded; only a restart re-arms it.
    let outcome = upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert!(outcome.action.is_none());
    assert_eq!(dev.sink_opens, 1);
}

#[test]
fn staged_digest_matches_the_image() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = client_service(&mut dev, &mut sink);

    upload(&mut app, &mut dev, &mut sink, UploadEvent::Start);
    upload(&mut app, &mut dev, &mut sink, UploadEvent::Chunk(b"new-firmware".to_vec()));
    upload(&mut app, &mut dev, &mut sink, UploadEvent::End);

    let expected = hmac_sha256::Hash::hash(b"new-firmware");
    assert!(sink.saw(&format!("{:?}", expected)[..20]));
}
