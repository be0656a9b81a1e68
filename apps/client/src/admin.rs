//! Admin surfaces. Visibility follows the server's answer only and is
//! decided once per session.

use chrono::NaiveDate;

use crate::app::{AdminStatus, App, Outcome};
use crate::document::Tab;
use crate::render::{self, Section, MSG_MODELS_ERROR};

pub const MSG_NOT_ADMIN: &str = "Недостаточно прав";
pub const MSG_PICK_DATE: &str = "Выберите дату";
pub const MSG_CONFIRM_APPROVE: &str = "Одобрить модель?";
pub const MSG_CONFIRM_REJECT: &str = "Отклонить модель?";
pub const MSG_CONFIRM_ADMIN_CANCEL: &str = "Отменить это бронирование?";
pub const MSG_APPROVED: &str = "Модель одобрена";
pub const MSG_REJECTED: &str = "Модель отклонена";
pub const MSG_ADMIN_CANCELLED: &str = "Бронирование отменено";

impl App {
    /// Ask the backend once whether the user is an admin and show or hide
    /// the admin surfaces accordingly. Later calls return the cached answer.
    pub async fn resolve_admin(&self) -> AdminStatus {
        let identity = {
            let state = self.state();
            if state.admin != AdminStatus::Unresolved {
                return state.admin;
            }
            state.identity.clone()
        };

        let status = match identity.id {
            None => AdminStatus::Denied,
            Some(tg_user) => match self.inner.api.is_admin(tg_user).await {
                Ok(true) => AdminStatus::Granted,
                Ok(false) => AdminStatus::Denied,
                Err(e) => {
                    tracing::warn!(tg_user, "admin check failed: {}", e);
                    AdminStatus::Denied
                }
            },
        };

        {
            let mut state = self.state();
            // A concurrent resolve may have finished first.
            if state.admin != AdminStatus::Unresolved {
                return state.admin;
            }
            state.admin = status;
            let granted = status == AdminStatus::Granted;
            state.document.admin_tab_visible = granted;
            state.document.admin_panel_visible = granted;
            if !granted && state.document.active_tab == Tab::Admin {
                state.document.active_tab = Tab::Home;
            }
        }
        tracing::info!(id = ?identity.id, status = ?status, "admin status resolved");

        if status == AdminStatus::Granted {
            self.load_admin_views().await;
        }
        status
    }

    /// Load every admin list at once.
    pub async fn load_admin_views(&self) {
        if !self.admin_granted() {
            return;
        }
        tokio::join!(
            self.load_admin_bookings(),
            self.load_pending(),
            self.load_user_stats()
        );
    }

    pub async fn load_admin_bookings(&self) {
        if !self.admin_granted() {
            return;
        }
        let section = match self.inner.api.admin_bookings().await {
            Ok(bookings) => render::admin_bookings(&bookings, self.inner.locale),
            Err(e) => {
                tracing::warn!("failed to load admin bookings: {}", e);
                Section::Error(e.user_message())
            }
        };
        self.state().document.admin_bookings = section;
    }

    pub async fn load_pending(&self) {
        if !self.admin_granted() {
            return;
        }
        let section = match self.inner.api.pending_models().await {
            Ok(pending) => render::pending_models(&pending),
            Err(e) => {
                tracing::warn!("failed to load pending models: {}", e);
                Section::Error(format!("{}: {}", MSG_MODELS_ERROR, e.user_message()))
            }
        };
        self.state().document.pending_models = section;
    }

    pub async fn load_user_stats(&self) {
        if !self.admin_granted() {
            return;
        }
        let section = match self.inner.api.users().await {
            Ok(users) => render::user_stats(&users),
            Err(e) => {
                tracing::warn!("failed to load user stats: {}", e);
                Section::Error(e.user_message())
            }
        };
        self.state().document.user_stats = section;
    }

    // ── Moderation ──

    pub async fn approve(&self, pending_id: i64) -> Outcome {
        if !self.admin_granted() {
            return self.refuse(MSG_NOT_ADMIN);
        }
        if !self.confirm(MSG_CONFIRM_APPROVE).await {
            return Outcome::Declined;
        }
        match self.inner.api.approve_model(pending_id).await {
            Ok(()) => {
                tracing::info!(pending_id, "model approved");
                self.alert(MSG_APPROVED);
                tokio::join!(self.load_pending(), self.load_models());
                Outcome::Done
            }
            Err(e) => self.admin_failure("approve", e),
        }
    }

    pub async fn reject(&self, pending_id: i64) -> Outcome {
        if !self.admin_granted() {
            return self.refuse(MSG_NOT_ADMIN);
        }
        if !self.confirm(MSG_CONFIRM_REJECT).await {
            return Outcome::Declined;
        }
        match self.inner.api.reject_model(pending_id).await {
            Ok(()) => {
                tracing::info!(pending_id, "model rejected");
                self.alert(MSG_REJECTED);
                self.load_pending().await;
                Outcome::Done
            }
            Err(e) => self.admin_failure("reject", e),
        }
    }

    // ── Bookings ──

    /// Cancel any user's booking.
    pub async fn admin_cancel(&self, booking_id: i64) -> Outcome {
        if !self.admin_granted() {
            return self.refuse(MSG_NOT_ADMIN);
        }
        if !self.confirm(MSG_CONFIRM_ADMIN_CANCEL).await {
            return Outcome::Declined;
        }
        match self.inner.api.admin_cancel(booking_id).await {
            Ok(resp) => {
                tracing::info!(booking_id, "booking cancelled by admin");
                self.alert(resp.message.as_deref().unwrap_or(MSG_ADMIN_CANCELLED));
                tokio::join!(
                    self.load_admin_bookings(),
                    self.list_mine(),
                    self.refresh_slots()
                );
                Outcome::Done
            }
            Err(e) => self.admin_failure("cancel booking", e),
        }
    }

    /// Every booking of one date, inactive ones included.
    pub async fn lookup_date(&self, date: Option<NaiveDate>) -> Outcome {
        if !self.admin_granted() {
            return self.refuse(MSG_NOT_ADMIN);
        }
        let Some(date) = date else {
            return self.refuse(MSG_PICK_DATE);
        };
        match self.inner.api.bookings_by_date(date).await {
            Ok(bookings) => {
                self.state().document.date_lookup = render::date_lookup(&bookings, self.inner.locale);
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(%date, "date lookup failed: {}", e);
                let message = e.user_message();
                self.state().document.date_lookup = Section::Error(message.clone());
                Outcome::Failed(message)
            }
        }
    }

    fn admin_failure(&self, what: &str, e: crate::api::ApiError) -> Outcome {
        tracing::warn!("admin {} failed: {}", what, e);
        let message = e.user_message();
        self.alert(&format!("Ошибка: {message}"));
        Outcome::Failed(message)
    }
}
