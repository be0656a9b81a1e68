//! Rolling calendar with an accordion of slot panels.
//!
//! At most one day is expanded. Every slot request takes a fresh token and
//! its response is rendered only while that token is the latest and the day
//! is still expanded, so late responses never land in a collapsed or
//! replaced panel.

use std::fmt;

use crate::app::App;
use crate::document::{PanelBody, PanelId};
use crate::render::{self, MSG_SLOTS_ERROR};

/// Number of days shown, today included.
pub const CALENDAR_DAYS: u8 = 14;

/// Day relative to today, in `0..CALENDAR_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayOffset(u8);

impl DayOffset {
    pub fn new(offset: u8) -> Option<Self> {
        (offset < CALENDAR_DAYS).then_some(Self(offset))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl App {
    /// Rebuild the day controls from the clock, keeping the selection.
    pub fn render_calendar(&self) {
        let today = self.inner.clock.today();
        let mut state = self.state();
        let selected = state.expanded;
        state.document.calendar = render::calendar(today, self.inner.locale, selected);
    }

    /// Toggle a day: collapse it if expanded, otherwise expand it in place of
    /// the previous one and load its slots.
    pub async fn select_day(&self, offset: DayOffset) {
        let (expand, leaving) = {
            let mut state = self.state();
            let leaving = state.document.begin_teardown();
            if state.expanded == Some(offset) {
                state.expanded = None;
                state.slot_request += 1;
                state.document.mark_selected(None);
                (false, leaving)
            } else {
                state.expanded = Some(offset);
                state.document.mark_selected(Some(offset));
                (true, leaving)
            }
        };

        for id in leaving {
            self.schedule_removal(id);
        }

        if expand {
            tracing::debug!(day = offset.get(), "day expanded");
            self.load_slots(offset).await;
        } else {
            tracing::debug!(day = offset.get(), "day collapsed");
        }
    }

    /// Show the loading placeholder for the expanded day, then fetch and
    /// render its slots. Ignored when `offset` is not the expanded day.
    pub async fn load_slots(&self, offset: DayOffset) {
        let (token, panel, inserted) = {
            let mut state = self.state();
            if state.expanded != Some(offset) {
                tracing::debug!(day = offset.get(), "not expanded, skipping slot load");
                return;
            }
            state.slot_request += 1;
            let token = state.slot_request;
            match state.document.active_panel_for(offset) {
                Some(id) => {
                    state.document.set_panel_body(id, PanelBody::Loading);
                    (token, id, false)
                }
                None => (token, state.document.insert_panel(offset), true),
            }
        };

        if inserted {
            self.schedule_reveal(panel);
        }
        self.fetch_into(offset, token, panel).await;
    }

    /// Re-fetch the expanded day's slots into its existing panel. No-op when
    /// nothing is expanded.
    pub async fn refresh_slots(&self) {
        enum Target {
            Nothing,
            Reload(DayOffset),
            Panel(DayOffset, u64, PanelId),
        }

        let target = {
            let mut state = self.state();
            match state.expanded {
                None => Target::Nothing,
                Some(offset) => match state.document.active_panel_for(offset) {
                    Some(panel) => {
                        state.slot_request += 1;
                        Target::Panel(offset, state.slot_request, panel)
                    }
                    None => Target::Reload(offset),
                },
            }
        };

        match target {
            Target::Nothing => {}
            Target::Reload(offset) => self.load_slots(offset).await,
            Target::Panel(offset, token, panel) => self.fetch_into(offset, token, panel).await,
        }
    }

    async fn fetch_into(&self, offset: DayOffset, token: u64, panel: PanelId) {
        let result = self.inner.api.slots(offset).await;

        let mut state = self.state();
        if state.slot_request != token || state.expanded != Some(offset) {
            tracing::debug!(day = offset.get(), token, "dropping stale slot response");
            return;
        }
        let body = match result {
            Ok(slots) => PanelBody::Slots(render::slot_buttons(&slots)),
            Err(e) => {
                tracing::warn!("failed to load slots for day {}: {}", offset, e);
                PanelBody::Error(format!("{}: {}", MSG_SLOTS_ERROR, e.user_message()))
            }
        };
        state.document.set_panel_body(panel, body);
    }

    fn schedule_reveal(&self, panel: PanelId) {
        let app = self.clone();
        let delay = self.inner.timings.reveal_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            app.state().document.reveal_panel(panel);
        });
    }

    fn schedule_removal(&self, panel: PanelId) {
        let app = self.clone();
        let delay = self.inner.timings.teardown_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            app.state().document.remove_panel(panel);
        });
    }
}

// ── Tests ──
