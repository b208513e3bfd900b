use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_test::assert_ok;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use led_api::{
    api,
    config::{AuthConfig, Backend, GpioConfig, Numbering},
    error::GpioError,
    gpio::{Level, PinController, PinDriver},
    state::AppState,
};

fn simulated_state() -> AppState {
    let controller = assert_ok!(PinController::initialize(&GpioConfig {
        pin: 18,
        numbering: Numbering::Bcm,
        backend: Backend::Simulated,
    }));
    AppState::new(controller, None)
}

fn credentials() -> AuthConfig {
    AuthConfig {
        username: "admin".to_string(),
        password: "raspberry".to_string(),
        force: true,
    }
}

// "admin:raspberry"
const GOOD_AUTH: &str = "Basic YWRtaW46cmFzcGJlcnJ5";
// "admin:raspberrz"
const BAD_AUTH: &str = "Basic YWRtaW46cmFzcGJlcnJ6";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get_led() -> Request<Body> {
    Request::get("/api/led").body(Body::empty()).unwrap()
}

fn post_led(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/led")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn led_starts_off() {
    let app = api::router(simulated_state(), None);

    let (status, body) = send(&app, get_led()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": false}));
}

#[tokio::test]
async fn write_then_read_is_consistent() {
    let app = api::router(simulated_state(), None);

    for value in [true, false, true, true, false] {
        let (status, body) = send(&app, post_led(json!({"status": value}).to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "status": value}));

        let (status, body) = send(&app, get_led()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": value}));
    }
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let app = api::router(simulated_state(), None);

    for body in ["not json", "{\"status\": tru", "", "null"] {
        let (status, response) = send(&app, post_led(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(response, json!({"success": false, "error": "Invalid JSON"}));
    }
}

#[tokio::test]
async fn missing_status_field_is_rejected() {
    let app = api::router(simulated_state(), None);

    for body in ["{}", "{\"state\": true}", "[true]", "true"] {
        let (status, response) = send(&app, post_led(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(
            response,
            json!({"success": false, "error": "Missing 'status' field"})
        );
    }

    let (_, body) = send(&app, get_led()).await;
    assert_eq!(body, json!({"status": false}));
}

#[tokio::test]
async fn truthy_values_switch_on_and_are_echoed() {
    let app = api::router(simulated_state(), None);

    let (status, body) = send(&app, post_led(r#"{"status": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "status": 1}));
    assert_eq!(send(&app, get_led()).await.1, json!({"status": true}));

    let (status, body) = send(&app, post_led(r#"{"status": ""}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "status": ""}));
    assert_eq!(send(&app, get_led()).await.1, json!({"status": false}));
}

#[tokio::test]
async fn content_type_is_not_required() {
    let app = api::router(simulated_state(), None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/led")
        .body(Body::from(r#"{"status": true}"#))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

/// Accepts the initial "off" write, then fails every write after it.
struct FlakyPin {
    writes: usize,
}

impl PinDriver for FlakyPin {
    fn write(&mut self, _level: Level) -> Result<(), GpioError> {
        self.writes += 1;
        if self.writes > 1 {
            Err(GpioError::Released(18))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<Level, GpioError> {
        Ok(Level::Low)
    }

    fn release(&mut self) {}
}

#[tokio::test]
async fn hardware_failure_is_internal_error() {
    let controller = assert_ok!(PinController::with_driver(18, Box::new(FlakyPin { writes: 0 })));
    let app = api::router(AppState::new(controller, None), None);

    let (status, body) = send(&app, post_led(r#"{"status": true}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "GPIO pin 18 has been released"})
    );
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn hardware_failure_is_logged_once() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let controller = assert_ok!(PinController::with_driver(18, Box::new(FlakyPin { writes: 0 })));
    let app = api::router(AppState::new(controller, None), None);
    let (status, _) = send(&app, post_led(r#"{"status": true}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // The trace layer adds its own 5xx line; only the write failure is counted.
    let output = logs.contents();
    let failures = output
        .lines()
        .filter(|line| line.contains("ERROR") && line.contains("has been released"))
        .count();
    assert_eq!(failures, 1, "logs: {output}");
}

#[tokio::test]
async fn read_after_cleanup_is_internal_error() {
    let state = simulated_state();
    state.controller.lock().await.cleanup();
    let app = api::router(state, None);

    let (status, body) = send(&app, get_led()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_credentials_are_challenged() {
    let auth = credentials();
    let app = api::router(simulated_state(), Some(&auth));

    let response = app.clone().oneshot(get_led()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
}

#[tokio::test]
async fn bad_credentials_never_reach_the_pin() {
    let auth = credentials();
    let state = simulated_state();
    let app = api::router(state.clone(), Some(&auth));

    let mut request = post_led(r#"{"status": true}"#);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, BAD_AUTH.parse().unwrap());
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, post_led(r#"{"status": true}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(!assert_ok!(state.controller.lock().await.status()));
}

#[tokio::test]
async fn valid_credentials_pass_through() {
    let auth = credentials();
    let app = api::router(simulated_state(), Some(&auth));

    let mut request = post_led(r#"{"status": true}"#);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, GOOD_AUTH.parse().unwrap());
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "status": true}));

    let mut request = get_led();
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, GOOD_AUTH.parse().unwrap());
    let (_, body) = send(&app, request).await;
    assert_eq!(body, json!({"status": true}));
}

#[tokio::test]
async fn health_reports_public_url() {
    let controller = assert_ok!(PinController::initialize(&GpioConfig {
        backend: Backend::Simulated,
        ..GpioConfig::default()
    }));
    let state = AppState::new(controller, Some("https://abcd.ngrok-free.app".to_string()));
    let app = api::router(state, None);

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["public_url"], "https://abcd.ngrok-free.app");

    let app = api::router(simulated_state(), None);
    let (_, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert!(body.get("public_url").is_none());
}
