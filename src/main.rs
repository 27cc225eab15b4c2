//! FieldCam Firmware - Main Entry Point
//!
//! Hexagonal architecture: the binary is the composition root that wires
//! the ESP-IDF peripherals to the application service and translates
//! HTTP traffic into the typed request boundary.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter      CameraAdapter    FlashSink    LogEventSink   │
//! │  (NetworkPort)    (FrameSource)    (UpdateSink) (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Provisioning · Mode · Streaming · Update              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  HTTP glue (EspHttpServer) → router::Request → dispatch        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::info;

use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpConnection, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{Read as _, Write as _};

use fieldcam::adapters::device::DeviceAdapter;
use fieldcam::adapters::device_id;
use fieldcam::adapters::flash;
use fieldcam::adapters::log_sink::LogEventSink;
use fieldcam::app::ports::{BodySink, TransportError};
use fieldcam::app::service::{AppService, Outcome};
use fieldcam::config::SystemConfig;
use fieldcam::router::{DeviceAction, FormFields, Request, Response, UploadEvent};

/// Everything a request handler needs, behind one lock. Requests are
/// serviced one at a time; the lock makes that structural guarantee
/// explicit to the HTTP server's session tasks.
struct Shared {
    app: AppService,
    io: DeviceAdapter,
    sink: LogEventSink,
}

impl Shared {
    fn dispatch(&mut self, req: Request, body: &mut impl BodySink) -> Outcome {
        self.app.dispatch(req, &mut self.io, body, &mut self.sink)
    }
}

/// Body sink over an in-flight HTTP exchange. The response is initiated
/// lazily on `begin_body` so the declared length and media type come
/// from the core, not from the glue.
struct HttpBody<'r, 'c> {
    req: Option<esp_idf_svc::http::server::Request<&'r mut EspHttpConnection<'c>>>,
    resp: Option<esp_idf_svc::http::server::Response<&'r mut EspHttpConnection<'c>>>,
}

impl BodySink for HttpBody<'_, '_> {
    fn begin_body(&mut self, len: usize, media_type: &str) -> std::result::Result<(), TransportError> {
        let Some(req) = self.req.take() else {
            return Err(TransportError::WriteFailed);
        };
        let len_header = len.to_string();
        let headers = [
            ("Content-Type", media_type),
            ("Content-Length", len_header.as_str()),
        ];
        match req.into_response(200, Some("OK"), &headers) {
            Ok(resp) => {
                self.resp = Some(resp);
                Ok(())
            }
            Err(_) => Err(TransportError::ConnectionClosed),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> std::result::Result<(), TransportError> {
        let Some(resp) = self.resp.as_mut() else {
            return Err(TransportError::WriteFailed);
        };
        resp.write_all(data)
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

/// Sink for routes that never stream a body.
struct NoBody;

impl BodySink for NoBody {
    fn begin_body(&mut self, _len: usize, _media_type: &str) -> std::result::Result<(), TransportError> {
        Err(TransportError::WriteFailed)
    }

    fn write_all(&mut self, _data: &[u8]) -> std::result::Result<(), TransportError> {
        Err(TransportError::WriteFailed)
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("FieldCam v{}", env!("CARGO_PKG_VERSION"));

    // ── 1b. OTA rollback check ────────────────────────────────
    flash::check_rollback();

    // ── 2. Configuration + device identity ────────────────────
    let mut config = SystemConfig::default();
    let mac = device_id::read_mac();
    config.hub_name = device_id::hub_ssid(&mac);
    info!(
        "Device ID: {} (hub SSID: {})",
        device_id::device_id(&mac),
        config.hub_name
    );

    // ── 3. Adapters + service ─────────────────────────────────
    let mut io = DeviceAdapter::new(&config);
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config);
    app.start(&mut io, &mut sink)?;

    let shared = Arc::new(Mutex::new(Shared { app, io, sink }));

    // ── 4. HTTP glue ──────────────────────────────────────────
    let mut server = EspHttpServer::new(&HttpConfig::default())?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/", Method::Get, move |req| {
        let outcome = state.lock().unwrap().dispatch(Request::PortalPage, &mut NoBody);
        write_plain_outcome(req, &outcome)?;
        Ok(())
    })?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/", Method::Post, move |mut req| {
        let mut buf = [0u8; 512];
        let len = req.read(&mut buf)?;
        let body = std::str::from_utf8(&buf[..len])?;
        let fields = FormFields::parse_urlencoded(body);
        let outcome = state
            .lock()
            .unwrap()
            .dispatch(Request::SubmitCredentials(fields), &mut NoBody);
        write_plain_outcome(req, &outcome)?;
        Ok(())
    })?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/connect", Method::Get, move |req| {
        let outcome = state.lock().unwrap().dispatch(Request::Connect, &mut NoBody);
        write_plain_outcome(req, &outcome)?;
        Ok(())
    })?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/capture", Method::Get, move |req| {
        let mut body = HttpBody {
            req: Some(req),
            resp: None,
        };
        let outcome = state.lock().unwrap().dispatch(Request::Capture, &mut body);
        match outcome.response {
            // Already streamed through the body sink.
            Response::Binary { .. } => {}
            // Empty capture (or a body that never started): no body.
            _ => {
                if let Some(req) = body.req.take() {
                    req.into_response(200, Some("OK"), &[])?;
                }
            }
        }
        Ok(())
    })?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/update", Method::Post, move |mut req| {
        // The raw request body is the image; translate the read loop
        // into the strict Start → Chunk* → End event order.
        let _ = state
            .lock()
            .unwrap()
            .dispatch(Request::Upload(UploadEvent::Start), &mut NoBody);

        let mut buf = [0u8; 4096];
        loop {
            let n = req.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let _ = state.lock().unwrap().dispatch(
                Request::Upload(UploadEvent::Chunk(buf[..n].to_vec())),
                &mut NoBody,
            );
        }

        let outcome = state
            .lock()
            .unwrap()
            .dispatch(Request::Upload(UploadEvent::End), &mut NoBody);

        let mut resp = req.into_response(200, Some("OK"), &[("Content-Type", "text/plain")])?;
        if let Response::Status(status) = outcome.response {
            resp.write_all(status.as_bytes())?;
        }
        resp.flush()?;
        drop(resp);

        if outcome.action == Some(DeviceAction::Restart) {
            flash::restart();
        }
        Ok(())
    })?;

    info!("HTTP server started; portal reachable on the hub network");

    // ── 5. Park the main task; the server owns the traffic ────
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}

/// Write a non-streaming outcome to the requester.
fn write_plain_outcome(
    req: esp_idf_svc::http::server::Request<&mut EspHttpConnection<'_>>,
    outcome: &Outcome,
) -> Result<()> {
    match &outcome.response {
        Response::Page(html) => {
            let mut resp =
                req.into_response(200, Some("OK"), &[("Content-Type", "text/html")])?;
            resp.write_all(html.as_bytes())?;
        }
        Response::Status(status) => {
            let mut resp =
                req.into_response(200, Some("OK"), &[("Content-Type", "text/plain")])?;
            resp.write_all(status.as_bytes())?;
        }
        Response::Binary { .. } | Response::Empty => {
            req.into_response(200, Some("OK"), &[])?;
        }
    }
    Ok(())
}
