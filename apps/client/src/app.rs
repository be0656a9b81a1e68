use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Locale;

use crate::api::ApiClient;
use crate::calendar::DayOffset;
use crate::clock::{Clock, SystemClock};
use crate::config::Timings;
use crate::dialogs::Dialogs;
use crate::document::{Document, Tab};
use crate::identity::Identity;
use crate::prefs::{Prefs, Theme};
use crate::render::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus {
    Unresolved,
    Denied,
    Granted,
}

/// Result of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The user answered "no" to the confirmation.
    Declined,
    /// Rejected locally before any request.
    Refused(String),
    /// The backend or the network failed; carries the text shown.
    Failed(String),
}

/// Session state. Mutated only through `App` operations.
#[derive(Debug)]
pub struct AppState {
    pub identity: Identity,
    pub expanded: Option<DayOffset>,
    pub admin: AdminStatus,
    pub document: Document,
    /// Token of the latest slot request; older responses are dropped.
    pub(crate) slot_request: u64,
}

/// Everything besides the backend, identity and dialogs.
pub struct AppOptions {
    pub locale: Locale,
    pub timings: Timings,
    pub clock: Arc<dyn Clock>,
    pub prefs: Prefs,
    pub host_color_scheme: Option<String>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            locale: Locale::ru_RU,
            timings: Timings::default(),
            clock: Arc::new(SystemClock),
            prefs: Prefs::in_memory(),
            host_color_scheme: None,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) api: ApiClient,
    pub(crate) dialogs: Arc<dyn Dialogs>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locale: Locale,
    pub(crate) timings: Timings,
    host_color_scheme: Option<String>,
    prefs: Mutex<Prefs>,
    state: Mutex<AppState>,
}

/// The Mini App client. Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct App {
    pub(crate) inner: Arc<Inner>,
}

impl App {
    pub fn new(
        api: ApiClient,
        identity: Identity,
        dialogs: Arc<dyn Dialogs>,
        options: AppOptions,
    ) -> Self {
        let identity = identity.with_overrides(&options.prefs.profile());
        let state = AppState {
            identity,
            expanded: None,
            admin: AdminStatus::Unresolved,
            document: Document::new(),
            slot_request: 0,
        };
        Self {
            inner: Arc::new(Inner {
                api,
                dialogs,
                clock: options.clock,
                locale: options.locale,
                timings: options.timings,
                host_color_scheme: options.host_color_scheme,
                prefs: Mutex::new(options.prefs),
                state: Mutex::new(state),
            }),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, AppState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prefs(&self) -> MutexGuard<'_, Prefs> {
        self.inner
            .prefs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Read access for hosts ──

    /// Snapshot of the page.
    pub fn document(&self) -> Document {
        self.state().document.clone()
    }

    pub fn identity(&self) -> Identity {
        self.state().identity.clone()
    }

    pub fn expanded(&self) -> Option<DayOffset> {
        self.state().expanded
    }

    pub fn admin_status(&self) -> AdminStatus {
        self.state().admin
    }

    pub(crate) fn admin_granted(&self) -> bool {
        self.admin_status() == AdminStatus::Granted
    }

    // ── Dialog helpers ──

    pub(crate) fn alert(&self, message: &str) {
        self.inner.dialogs.alert(message);
    }

    pub(crate) async fn confirm(&self, message: &str) -> bool {
        self.inner.dialogs.confirm(message).await
    }

    /// Show a precondition failure and report it.
    pub(crate) fn refuse(&self, message: &str) -> Outcome {
        self.alert(message);
        Outcome::Refused(message.to_string())
    }

    // ── Bootstrap ──

    /// Initial page load: theme, welcome, calendar, library, own bookings
    /// and the admin check.
    pub async fn bootstrap(&self) {
        let theme = {
            let prefs = self.prefs();
            prefs.theme(self.inner.host_color_scheme.as_deref())
        };
        {
            let mut state = self.state();
            state.document.theme = theme;
            apply_profile(&mut state);
        }
        self.render_calendar();

        tokio::join!(self.load_models(), self.list_mine());
        let admin = self.resolve_admin().await;

        let identity = self.identity();
        tracing::info!(
            id = ?identity.id,
            admin = ?admin,
            "client ready for {}",
            identity.display_name
        );
    }

    /// Route a control's action to its operation.
    pub async fn dispatch(&self, action: Action) -> Outcome {
        match action {
            Action::SelectDay(offset) => {
                self.select_day(offset).await;
                Outcome::Done
            }
            Action::Book(slot) => self.book(&slot).await,
            Action::Cancel(id) => self.cancel(id).await,
            Action::AdminCancel(id) => self.admin_cancel(id).await,
            Action::Approve(id) => self.approve(id).await,
            Action::Reject(id) => self.reject(id).await,
        }
    }

    // ── Tabs ──

    /// Activate a tab. The admin tab only opens while it is visible.
    pub fn switch_tab(&self, tab: Tab) -> bool {
        let mut state = self.state();
        if tab == Tab::Admin && !state.document.admin_tab_visible {
            return false;
        }
        state.document.active_tab = tab;
        true
    }

    // ── Theme ──

    pub fn toggle_theme(&self) -> Theme {
        let next = {
            let mut state = self.state();
            let next = state.document.theme.toggled();
            state.document.theme = next;
            next
        };
        if let Err(e) = self.prefs().save_theme(next) {
            tracing::warn!("failed to save theme preference: {}", e);
        }
        next
    }

    // ── Profile overrides ──

    pub fn update_display_name(&self, name: &str) -> String {
        let saved = match self.prefs().save_display_name(name) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("failed to save display name: {}", e);
                return self.identity().display_name;
            }
        };
        let mut state = self.state();
        state.identity.display_name = saved.clone();
        apply_profile(&mut state);
        saved
    }

    pub fn update_handle(&self, handle: &str) -> String {
        let saved = match self.prefs().save_handle(handle) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("failed to save handle: {}", e);
                return self.identity().handle;
            }
        };
        let mut state = self.state();
        state.identity.handle = saved.clone();
        apply_profile(&mut state);
        saved
    }

    pub fn update_avatar(&self, avatar_url: &str) {
        if let Err(e) = self.prefs().save_avatar(avatar_url) {
            tracing::warn!("failed to save avatar: {}", e);
            return;
        }
        let mut state = self.state();
        state.identity.avatar_url = avatar_url.trim().to_string();
        apply_profile(&mut state);
    }
}

fn apply_profile(state: &mut AppState) {
    state.document.welcome = format!("Привет, {}!", state.identity.display_name);
    state.document.handle = state.identity.handle.clone();
    state.document.avatar_url = state.identity.avatar_url.clone();
}
