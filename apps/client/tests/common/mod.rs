#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use url::Url;

use print_slots_client::clock::FixedClock;
use print_slots_client::identity::{Identity, DEFAULT_AVATAR};
use print_slots_client::{ApiClient, App, AppOptions, Dialogs, Timings};

pub const USER_ID: i64 = 77;

// ── Mock backend ──

/// One request as seen by the backend.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub tg_header: Option<String>,
}

#[derive(Default)]
pub struct Mock {
    pub hits: Mutex<Vec<Hit>>,
    pub slots: Mutex<HashMap<u8, Value>>,
    pub slot_delays: Mutex<HashMap<u8, Duration>>,
    pub is_admin: AtomicBool,
    pub book_error: Mutex<Option<String>>,
    pub booked: Mutex<Vec<Value>>,
    pub cancel_response: Mutex<Option<Value>>,
    pub bookings: Mutex<Value>,
    pub admin_bookings: Mutex<Value>,
    pub by_date: Mutex<Value>,
    pub models: Mutex<Value>,
    pub pending: Mutex<Value>,
    pub users: Mutex<Value>,
    pub submit_response: Mutex<Option<Value>>,
    pub uploads: Mutex<Vec<HashMap<String, String>>>,
    /// Raw body for `POST /api/cancel_booking/{id}` instead of JSON.
    pub admin_cancel_body: Mutex<Option<String>>,
}

impl Mock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_slots(&self, offset: u8, slots: Value) {
        self.slots.lock().unwrap().insert(offset, slots);
    }

    pub fn delay_slots(&self, offset: u8, delay: Duration) {
        self.slot_delays.lock().unwrap().insert(offset, delay);
    }

    pub fn set(&self, field: &Mutex<Value>, value: Value) {
        *field.lock().unwrap() = value;
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    /// Number of hits whose `METHOD path` starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.hits()
            .iter()
            .filter(|h| format!("{} {}", h.method, h.path).starts_with(prefix))
            .count()
    }

    pub fn clear_hits(&self) {
        self.hits.lock().unwrap().clear();
    }
}

fn list(value: &Mutex<Value>) -> Json<Value> {
    let value = value.lock().unwrap().clone();
    Json(if value.is_null() { json!([]) } else { value })
}

async fn record(State(mock): State<Arc<Mock>>, req: Request, next: Next) -> Response {
    mock.hits.lock().unwrap().push(Hit {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        tg_header: req
            .headers()
            .get("x-tg-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    next.run(req).await
}

async fn slots(State(mock): State<Arc<Mock>>, Path(offset): Path<u8>) -> Json<Value> {
    let delay = mock.slot_delays.lock().unwrap().get(&offset).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let slots = mock.slots.lock().unwrap().get(&offset).cloned();
    Json(slots.unwrap_or_else(|| json!([])))
}

async fn book(State(mock): State<Arc<Mock>>, Json(body): Json<Value>) -> Response {
    mock.booked.lock().unwrap().push(body);
    let error = mock.book_error.lock().unwrap().clone();
    match error {
        Some(text) => (StatusCode::BAD_REQUEST, text).into_response(),
        None => Json(json!({ "success": true })).into_response(),
    }
}

async fn cancel(State(mock): State<Arc<Mock>>) -> Json<Value> {
    let resp = mock.cancel_response.lock().unwrap().clone();
    Json(resp.unwrap_or_else(|| json!({ "ok": true, "message": "Бронирование отменено" })))
}

async fn is_admin(State(mock): State<Arc<Mock>>, Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({ "is_admin": mock.is_admin.load(Ordering::SeqCst) }))
}

async fn upload(State(mock): State<Arc<Mock>>, mut multipart: Multipart) -> Json<Value> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name() {
            Some(file_name) => file_name.to_string(),
            None => field.text().await.unwrap(),
        };
        fields.insert(name, value);
    }
    mock.uploads.lock().unwrap().push(fields);
    let resp = mock.submit_response.lock().unwrap().clone();
    Json(resp.unwrap_or_else(|| json!({ "success": true, "message": "Модель отправлена на модерацию" })))
}

async fn ok() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn admin_cancel(State(mock): State<Arc<Mock>>, Path(_id): Path<i64>) -> Response {
    let raw = mock.admin_cancel_body.lock().unwrap().clone();
    match raw {
        Some(text) => text.into_response(),
        None => Json(json!({ "message": "Бронирование отменено администратором" })).into_response(),
    }
}

pub fn router(mock: Arc<Mock>) -> Router {
    Router::new()
        .route("/api/models", get(|State(m): State<Arc<Mock>>| async move { list(&m.models) }))
        .route("/api/models/upload", post(upload))
        .route("/api/slots/{offset}", get(slots))
        .route("/api/book", post(book))
        .route("/api/book/cancel", post(cancel))
        .route("/api/bookings", get(|State(m): State<Arc<Mock>>| async move { list(&m.bookings) }))
        .route(
            "/api/bookings/by_date",
            get(|State(m): State<Arc<Mock>>| async move { list(&m.by_date) }),
        )
        .route(
            "/api/admin/bookings",
            get(|State(m): State<Arc<Mock>>| async move { list(&m.admin_bookings) }),
        )
        .route("/api/user_is_admin/{id}", get(is_admin))
        .route(
            "/api/pending_models",
            get(|State(m): State<Arc<Mock>>| async move { list(&m.pending) }),
        )
        .route("/api/users", get(|State(m): State<Arc<Mock>>| async move { list(&m.users) }))
        .route("/api/admin/approve_model", post(ok))
        .route("/api/admin/reject_model", post(ok))
        .route("/api/cancel_booking/{id}", post(admin_cancel))
        .layer(middleware::from_fn_with_state(mock.clone(), record))
        .with_state(mock)
}

pub async fn serve(mock: Arc<Mock>) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(mock)).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

// ── Dialogs ──

/// Answers confirmations from a script (default "yes") and records every
/// prompt and alert.
#[derive(Default)]
pub struct RecordingDialogs {
    pub answers: Mutex<VecDeque<bool>>,
    pub confirms: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingDialogs {
    pub fn answer_next(&self, answer: bool) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialogs for RecordingDialogs {
    async fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(true)
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

// ── Fixtures ──

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn fast_timings() -> Timings {
    Timings {
        refresh_interval: Duration::from_secs(3600),
        reveal_delay: Duration::from_millis(10),
        teardown_delay: Duration::from_millis(40),
    }
}

pub fn make_user() -> Identity {
    Identity {
        id: Some(USER_ID),
        display_name: "Анна".into(),
        handle: "@anna3d".into(),
        avatar_url: DEFAULT_AVATAR.into(),
        username: Some("anna3d".into()),
        first_name: "Анна".into(),
    }
}

pub fn make_slot(day: u32, hour: u32, occupied: bool) -> Value {
    json!({
        "start": format!("2026-10-{day:02}T{hour:02}:00:00"),
        "end": format!("2026-10-{day:02}T{:02}:00:00", hour + 1),
        "occupied": occupied,
    })
}

pub fn make_booking(id: i64, hour: u32, status: &str) -> Value {
    json!({
        "id": id,
        "start": format!("2026-10-21T{hour:02}:00:00"),
        "end": format!("2026-10-21T{:02}:00:00", hour + 1),
        "title": null,
        "status": status,
        "tg_user": USER_ID,
        "user_name": "anna3d",
    })
}

pub struct Harness {
    pub app: App,
    pub mock: Arc<Mock>,
    pub dialogs: Arc<RecordingDialogs>,
}

pub async fn make_app(mock: Arc<Mock>, identity: Identity) -> Harness {
    let base = serve(mock.clone()).await;
    let api = ApiClient::new(base, &identity).unwrap();
    let dialogs = Arc::new(RecordingDialogs::default());
    let app = App::new(
        api,
        identity,
        dialogs.clone(),
        AppOptions {
            timings: fast_timings(),
            clock: Arc::new(FixedClock(today())),
            ..AppOptions::default()
        },
    );
    app.render_calendar();
    Harness { app, mock, dialogs }
}

/// Wait past the reveal and teardown transitions.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(120)).await;
}
