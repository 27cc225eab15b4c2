//! Integration tests for the portal → credential store → connect flow.
//!
//! Verifies the end-to-end sequence: the operator submits form fields,
//! the store merges them, and the connect trigger consumes them for one
//! bounded attach attempt - with the fallback-to-hub policy on failure.

use fieldcam::app::ports::AttachError;
use fieldcam::app::service::AppService;
use fieldcam::config::SystemConfig;
use fieldcam::mode::DeviceMode;
use fieldcam::provision::SECRET_MASK;
use fieldcam::router::{FormFields, Request, Response};

use crate::mock_hw::{LogSink, MockDevice, NetCall, RecordingBody};

fn started_service(dev: &mut MockDevice, sink: &mut LogSink) -> AppService {
    let mut app = AppService::new(SystemConfig::default());
    app.start(dev, sink).unwrap();
    app
}

fn page_of(response: Response) -> String {
    match response {
        Response::Page(html) => html,
        other => panic!("expected a page, got {other:?}"),
    }
}

#[test]
fn boot_brings_the_hub_up() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let app = started_service(&mut dev, &mut sink);

    assert_eq!(app.mode(), DeviceMode::Hub);
    assert!(app.hub_active());
    assert_eq!(
        dev.net_calls,
        vec![NetCall::HubStart {
            name: "fieldcam-setup".to_string()
        }]
    );
    assert!(sink.saw("Started(Hub)"));
}

#[test]
fn portal_reflects_submitted_name_and_masks_secret() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    let fields = FormFields::from([("ssid", "HomeNet"), ("psk", "abc")]);
    let outcome = app.dispatch(
        Request::SubmitCredentials(fields),
        &mut dev,
        &mut body,
        &mut sink,
    );
    let html = page_of(outcome.response);
    assert!(html.contains("HomeNet"));
    assert!(html.contains(SECRET_MASK));
    assert!(!html.contains("abc"));

    // A later GET must stay masked too.
    let outcome = app.dispatch(Request::PortalPage, &mut dev, &mut body, &mut sink);
    let html = page_of(outcome.response);
    assert!(html.contains(SECRET_MASK));
    assert!(!html.contains("abc"));
}

#[test]
fn submissions_merge_field_by_field() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    for fields in [
        FormFields::from([("ssid", "X")]),
        FormFields::from([("psk", "Y")]),
        FormFields::new(),
    ] {
        app.dispatch(Request::SubmitCredentials(fields), &mut dev, &mut body, &mut sink);
    }

    // Connect proves what the store holds: the attach call sees X.
    let outcome = app.dispatch(Request::Connect, &mut dev, &mut body, &mut sink);
    assert_eq!(outcome.response, Response::Status("OK"));
    assert!(matches!(
        dev.net_calls.last(),
        Some(NetCall::Attach { name, .. }) if name == "X"
    ));
}

#[test]
fn connect_success_moves_to_client_and_drops_hub() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    app.dispatch(
        Request::SubmitCredentials(FormFields::from([("ssid", "HomeNet"), ("psk", "pw123456")])),
        &mut dev,
        &mut body,
        &mut sink,
    );
    let outcome = app.dispatch(Request::Connect, &mut dev, &mut body, &mut sink);

    assert_eq!(outcome.response, Response::Status("OK"));
    assert!(outcome.action.is_none());
    assert_eq!(app.mode(), DeviceMode::Client);
    assert!(!app.hub_active());
    // Teardown strictly precedes the attach attempt.
    assert_eq!(
        dev.net_calls,
        vec![
            NetCall::HubStart {
                name: "fieldcam-setup".to_string()
            },
            NetCall::HubStop,
            NetCall::Attach {
                name: "HomeNet".to_string(),
                timeout_ms: SystemConfig::default().attach_timeout_ms,
            },
        ]
    );
    assert!(sink.saw("ModeChanged"));
}

#[test]
fn connect_timeout_falls_back_to_hub() {
    let mut dev = MockDevice::new();
    dev.attach_result = Err(AttachError::TimedOut);
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    app.dispatch(
        Request::SubmitCredentials(FormFields::from([("ssid", "HomeNet"), ("psk", "pw123456")])),
        &mut dev,
        &mut body,
        &mut sink,
    );
    let outcome = app.dispatch(Request::Connect, &mut dev, &mut body, &mut sink);

    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert_eq!(app.mode(), DeviceMode::Hub);
    assert!(app.hub_active());
    // The hub came back after the failed attach.
    assert!(dev.hub_is_up());
    assert!(sink.saw("AttachFailed"));
    assert!(sink.saw("hub_resumed: true"));
}

#[test]
fn connect_auth_rejection_reports_fail() {
    let mut dev = MockDevice::new();
    dev.attach_result = Err(AttachError::AuthRejected);
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    app.dispatch(
        Request::SubmitCredentials(FormFields::from([("ssid", "HomeNet"), ("psk", "wrong-pw")])),
        &mut dev,
        &mut body,
        &mut sink,
    );
    let outcome = app.dispatch(Request::Connect, &mut dev, &mut body, &mut sink);

    assert_eq!(outcome.response, Response::Status("FAIL"));
    assert_eq!(app.mode(), DeviceMode::Hub);
    assert!(sink.saw("AuthRejected"));
}

#[test]
fn connect_without_name_is_rejected_inline_without_teardown() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    let outcome = app.dispatch(Request::Connect, &mut dev, &mut body, &mut sink);
    let html = page_of(outcome.response);
    assert!(html.contains("network name required"));
    assert_eq!(app.mode(), DeviceMode::Hub);
    assert!(app.hub_active());
    // No HubStop - nothing was torn down for a locally rejected request.
    assert!(!dev.net_calls.contains(&NetCall::HubStop));
}

#[test]
fn oversized_field_keeps_prior_value_and_shows_notice() {
    let mut dev = MockDevice::new();
    let mut sink = LogSink::new();
    let mut app = started_service(&mut dev, &mut sink);
    let mut body = RecordingBody::new();

    app.dispatch(
        Request::SubmitCredentials(FormFields::from([("ssid", "HomeNet")])),
        &mut dev,
        &mut body,
        &mut sink,
    );
    let long = "x".repeat(40);
    let mut fields = FormFields::new();
    fields.insert("ssid", &long);
    let outcome = app.dispatch(Request::SubmitCredentials(fields), &mut dev, &mut body, &mut sink);

    let html = page_of(outcome.response);
    assert!(html.contains("exceeds 32 bytes"));
    assert!(html.contains("HomeNet"));
}
