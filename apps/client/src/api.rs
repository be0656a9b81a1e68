//! HTTP gateway to the printer booking backend.
//!
//! Every request carries the session identity: the `X-TG-ID` header when the
//! user is known, plus a `tg_user` field on mutating requests.

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{multipart, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::calendar::DayOffset;
use crate::identity::Identity;
use crate::models::*;

pub const IDENTITY_HEADER: &str = "X-TG-ID";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Text shown to the user. Server-side refusals are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Transport(_) | Self::Url(_) => "Ошибка сети, попробуйте позже".into(),
        }
    }
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url, identity: &Identity) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(id) = identity.id {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                headers.insert(IDENTITY_HEADER, value);
            }
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.http.get(self.endpoint(path)?).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    // ── Library ──

    /// GET /api/models
    pub async fn models(&self) -> Result<Vec<Model>, ApiError> {
        self.get_json("/api/models").await
    }

    /// POST /api/models/upload (multipart)
    pub async fn upload_model(
        &self,
        title: &str,
        file: &Upload,
        image: Option<&Upload>,
        identity: &Identity,
    ) -> Result<SubmitResponse, ApiError> {
        let mut form = multipart::Form::new()
            .text("title", title.to_string())
            .part(
                "file",
                multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone()),
            )
            .text(
                "tg_user",
                identity.id.map(|id| id.to_string()).unwrap_or_default(),
            );
        if let Some(image) = image {
            form = form.part(
                "image",
                multipart::Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
            );
        }

        let resp = self
            .http
            .post(self.endpoint("/api/models/upload")?)
            .multipart(form)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    // ── Slots & bookings ──

    /// GET /api/slots/{offset}
    pub async fn slots(&self, offset: DayOffset) -> Result<Vec<Slot>, ApiError> {
        self.get_json(&format!("/api/slots/{}", offset.get())).await
    }

    /// POST /api/book
    pub async fn book(&self, slot: &Slot, identity: &Identity, tg_user: i64) -> Result<(), ApiError> {
        let body = BookRequest {
            start: slot.start,
            end: slot.end,
            tg_user,
            username: identity.username.as_deref(),
            first_name: &identity.first_name,
        };
        let resp = self
            .http
            .post(self.endpoint("/api/book")?)
            .json(&body)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// POST /api/book/cancel
    pub async fn cancel(&self, booking_id: i64, tg_user: i64) -> Result<CancelResponse, ApiError> {
        let resp = self
            .http
            .post(self.endpoint("/api/book/cancel")?)
            .json(&CancelRequest {
                booking_id,
                tg_user,
            })
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    /// GET /api/bookings?tg_user=ID
    pub async fn bookings(&self, tg_user: i64) -> Result<Vec<Booking>, ApiError> {
        let mut url = self.endpoint("/api/bookings")?;
        url.query_pairs_mut()
            .append_pair("tg_user", &tg_user.to_string());
        let resp = self.http.get(url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    // ── Admin ──

    /// GET /api/user_is_admin/{id}
    pub async fn is_admin(&self, tg_user: i64) -> Result<bool, ApiError> {
        let check: AdminCheck = self
            .get_json(&format!("/api/user_is_admin/{tg_user}"))
            .await?;
        Ok(check.is_admin)
    }

    /// GET /api/admin/bookings
    pub async fn admin_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.get_json("/api/admin/bookings").await
    }

    /// GET /api/pending_models
    pub async fn pending_models(&self) -> Result<Vec<PendingModel>, ApiError> {
        self.get_json("/api/pending_models").await
    }

    /// GET /api/users
    pub async fn users(&self) -> Result<Vec<UserStat>, ApiError> {
        self.get_json("/api/users").await
    }

    /// POST /api/admin/approve_model
    pub async fn approve_model(&self, pending_id: i64) -> Result<(), ApiError> {
        self.moderate("/api/admin/approve_model", pending_id).await
    }

    /// POST /api/admin/reject_model
    pub async fn reject_model(&self, pending_id: i64) -> Result<(), ApiError> {
        self.moderate("/api/admin/reject_model", pending_id).await
    }

    async fn moderate(&self, path: &str, pending_id: i64) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.endpoint(path)?)
            .json(&ModerationRequest { pending_id })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// POST /api/cancel_booking/{id}
    pub async fn admin_cancel(&self, booking_id: i64) -> Result<MessageResponse, ApiError> {
        let resp = self
            .http
            .post(self.endpoint(&format!("/api/cancel_booking/{booking_id}"))?)
            .send()
            .await?;
        match check(resp).await?.json().await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::debug!(booking_id, "unreadable admin cancel reply: {}", e);
                Ok(MessageResponse::default())
            }
        }
    }

    /// GET /api/bookings/by_date?date=YYYY-MM-DD
    pub async fn bookings_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, ApiError> {
        let mut url = self.endpoint("/api/bookings/by_date")?;
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y-%m-%d").to_string());
        let resp = self.http.get(url).send().await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// Turn a non-success response into `ApiError::Status` carrying the server
/// text.
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_text(status, &body);
    tracing::warn!("backend returned {}: {}", status, message);
    Err(ApiError::Status { status, message })
}

/// `detail` / `error` / `message` of a JSON object body, else the raw body,
/// else the status reason.
fn error_text(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Ошибка")
        .to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text_raw_body() {
        assert_eq!(error_text(StatusCode::BAD_REQUEST, "slot taken"), "slot taken");
    }

    #[test]
    fn test_error_text_detail_field() {
        assert_eq!(
            error_text(StatusCode::BAD_REQUEST, r#"{"detail":"Это время уже занято"}"#),
            "Это время уже занято"
        );
    }

    #[test]
    fn test_error_text_error_field() {
        assert_eq!(
            error_text(StatusCode::FORBIDDEN, r#"{"error":"Forbidden"}"#),
            "Forbidden"
        );
    }

    #[test]
    fn test_error_text_json_without_known_fields() {
        assert_eq!(error_text(StatusCode::BAD_REQUEST, r#"{"code":7}"#), r#"{"code":7}"#);
    }

    #[test]
    fn test_error_text_empty_body() {
        assert_eq!(error_text(StatusCode::NOT_FOUND, "  "), "Not Found");
    }

    #[test]
    fn test_user_message_verbatim_for_status() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "slot taken".into(),
        };
        assert_eq!(err.user_message(), "slot taken");
        assert_eq!(err.to_string(), "slot taken");
    }

    #[test]
    fn test_identity_header_only_when_known() {
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        assert!(ApiClient::new(base.clone(), &Identity::anonymous()).is_ok());
        let mut known = Identity::anonymous();
        known.id = Some(5);
        assert!(ApiClient::new(base, &known).is_ok());
    }
}
