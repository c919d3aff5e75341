#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
};
use chrono::{Duration, Local};
use halicare_client::{
    AppointmentLifecycleEngine, HttpApi, Session, Settings, SettingsStore,
    repository::AppointmentRepository,
};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

/// In-process stand-in for the remote API. Routes are keyed on method and
/// path; anything unregistered answers 404.
#[derive(Clone, Default)]
pub struct MockApi {
    routes: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, status: u16, body: impl Into<String>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.into()));
        self
    }

    pub fn on_json(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, status, body.to_string())
    }

    /// Serve on an ephemeral port; returns the base URL clients should use.
    pub async fn start(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn calls_with_method(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    pub fn last(&self, method: &str, path: &str) -> RecordedRequest {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .unwrap_or_else(|| panic!("no {method} {path} recorded"))
    }
}

async fn handle(
    State(mock): State<MockApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    mock.log.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    });

    let route = mock
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), path))
        .cloned();
    match route {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body),
        None => (StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#.to_string()),
    }
}

/* -------------------------
   Fixtures
--------------------------*/

pub fn appointment_json(id: &str, user: &str, center: &str, service: &str, status: &str, date: &str) -> Value {
    json!({
        "appointment_id": id,
        "booking_status": status,
        "transfer_letter": null,
        "appointment_date": date,
        "user_id": user,
        "center_id": center,
        "service_id": service
    })
}

pub fn clinic_json(id: &str, name: &str) -> Value {
    json!({
        "center_id": id,
        "center_name": name,
        "address": "Kenyatta Ave",
        "latitude": -1.28,
        "longitude": 36.82,
        "contact_number": "0700000000",
        "opening_time": "08:00",
        "closing_time": "17:00",
        "image_path": format!("https://img.example/{id}.png")
    })
}

pub fn service_json(id: &str, center: &str, name: &str) -> Value {
    json!({
        "service_id": id,
        "service_name": name,
        "center_id": center,
        "hours": "08:00 - 17:00",
        "description": "walk-ins welcome"
    })
}

/// An ISO instant `days` from now, UTC.
pub fn days_from_now(days: i64) -> String {
    (chrono::Utc::now() + Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

pub fn tomorrow() -> chrono::NaiveDate {
    Local::now().date_naive() + Duration::days(1)
}

pub fn api_for(base_url: &str) -> HttpApi {
    HttpApi::new(base_url, 5, Session::new()).unwrap()
}

pub fn logged_in(user_id: &str) -> SettingsStore {
    SettingsStore::in_memory(Settings {
        user_id: Some(user_id.to_string()),
        ..Settings::default()
    })
}

pub fn engine_for(base_url: &str, settings: SettingsStore) -> AppointmentLifecycleEngine {
    AppointmentLifecycleEngine::new(AppointmentRepository::new(api_for(base_url)), settings)
}
