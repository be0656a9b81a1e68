//! In-memory page model mutated by the application and read by hosts.

use crate::calendar::DayOffset;
use crate::prefs::Theme;
use crate::render::{
    BookingRow, DayControl, ModelCard, PendingCard, Section, SlotButton, UserStatRow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Calendar,
    Library,
    Submit,
    Profile,
    Admin,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Home,
        Tab::Calendar,
        Tab::Library,
        Tab::Submit,
        Tab::Profile,
        Tab::Admin,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "home" => Some(Self::Home),
            "calendar" => Some(Self::Calendar),
            "library" => Some(Self::Library),
            "submit" => Some(Self::Submit),
            "profile" => Some(Self::Profile),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Calendar => "calendar",
            Self::Library => "library",
            Self::Submit => "submit",
            Self::Profile => "profile",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(u64);

/// Lifecycle of a slot panel. A panel is inserted hidden, revealed by a
/// separate step, and removed only after it has been `Leaving` for the
/// teardown delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Inserted,
    Shown,
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelBody {
    Loading,
    Slots(Vec<SlotButton>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPanel {
    pub id: PanelId,
    /// Day control the panel is placed right after.
    pub anchor: DayOffset,
    pub phase: PanelPhase,
    pub body: PanelBody,
}

impl SlotPanel {
    pub fn buttons(&self) -> &[SlotButton] {
        match &self.body {
            PanelBody::Slots(buttons) => buttons,
            _ => &[],
        }
    }
}

/// Calendar area in display order: each panel follows its anchor day.
#[derive(Debug, Clone, Copy)]
pub enum CalendarItem<'a> {
    Day(&'a DayControl),
    Panel(&'a SlotPanel),
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub theme: Theme,
    pub welcome: String,
    pub handle: String,
    pub avatar_url: String,
    pub active_tab: Tab,
    pub admin_tab_visible: bool,
    pub admin_panel_visible: bool,
    pub calendar: Vec<DayControl>,
    pub slot_panels: Vec<SlotPanel>,
    pub models: Section<ModelCard>,
    pub my_bookings: Section<BookingRow>,
    pub admin_bookings: Section<BookingRow>,
    pub pending_models: Section<PendingCard>,
    pub user_stats: Section<UserStatRow>,
    pub date_lookup: Section<BookingRow>,
    pub submit_result: Option<String>,
    next_panel: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Slot panels ──

    /// The panel that is not being torn down, if any.
    pub fn active_panel(&self) -> Option<&SlotPanel> {
        self.slot_panels
            .iter()
            .find(|p| p.phase != PanelPhase::Leaving)
    }

    pub fn panel(&self, id: PanelId) -> Option<&SlotPanel> {
        self.slot_panels.iter().find(|p| p.id == id)
    }

    pub(crate) fn active_panel_for(&self, anchor: DayOffset) -> Option<PanelId> {
        self.active_panel()
            .filter(|p| p.anchor == anchor)
            .map(|p| p.id)
    }

    /// Insert a hidden panel with a loading placeholder after `anchor`.
    pub(crate) fn insert_panel(&mut self, anchor: DayOffset) -> PanelId {
        self.next_panel += 1;
        let id = PanelId(self.next_panel);
        self.slot_panels.push(SlotPanel {
            id,
            anchor,
            phase: PanelPhase::Inserted,
            body: PanelBody::Loading,
        });
        id
    }

    pub(crate) fn reveal_panel(&mut self, id: PanelId) -> bool {
        match self.slot_panels.iter_mut().find(|p| p.id == id) {
            Some(panel) if panel.phase == PanelPhase::Inserted => {
                panel.phase = PanelPhase::Shown;
                true
            }
            _ => false,
        }
    }

    /// Start hiding every live panel. Returns the ids to remove once the
    /// transition is over.
    pub(crate) fn begin_teardown(&mut self) -> Vec<PanelId> {
        self.slot_panels
            .iter_mut()
            .filter(|p| p.phase != PanelPhase::Leaving)
            .map(|p| {
                p.phase = PanelPhase::Leaving;
                p.id
            })
            .collect()
    }

    pub(crate) fn remove_panel(&mut self, id: PanelId) {
        self.slot_panels.retain(|p| p.id != id);
    }

    /// Replace the body of a live panel. Leaving or removed panels are not
    /// touched.
    pub(crate) fn set_panel_body(&mut self, id: PanelId, body: PanelBody) -> bool {
        match self
            .slot_panels
            .iter_mut()
            .find(|p| p.id == id && p.phase != PanelPhase::Leaving)
        {
            Some(panel) => {
                panel.body = body;
                true
            }
            None => false,
        }
    }

    /// Mark exactly one day control as selected, or none.
    pub(crate) fn mark_selected(&mut self, offset: Option<DayOffset>) {
        for day in &mut self.calendar {
            day.selected = Some(day.offset) == offset;
        }
    }

    /// Calendar days with their panels interleaved.
    pub fn calendar_layout(&self) -> Vec<CalendarItem<'_>> {
        let mut items = Vec::with_capacity(self.calendar.len() + self.slot_panels.len());
        for day in &self.calendar {
            items.push(CalendarItem::Day(day));
            items.extend(
                self.slot_panels
                    .iter()
                    .filter(|p| p.anchor == day.offset)
                    .map(CalendarItem::Panel),
            );
        }
        items
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;
    use chrono::{Locale, NaiveDate};

    fn day(n: u8) -> DayOffset {
        DayOffset::new(n).unwrap()
    }

    fn make_document() -> Document {
        let mut doc = Document::new();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        doc.calendar = render::calendar(today, Locale::ru_RU, None);
        doc
    }

    #[test]
    fn test_tab_parse_roundtrip() {
        for tab in Tab::ALL {
            assert_eq!(Tab::parse(tab.as_str()), Some(tab));
        }
        assert_eq!(Tab::parse("Admin"), Some(Tab::Admin));
        assert_eq!(Tab::parse("settings"), None);
    }

    #[test]
    fn test_insert_then_reveal() {
        let mut doc = make_document();
        let id = doc.insert_panel(day(2));
        assert_eq!(doc.panel(id).unwrap().phase, PanelPhase::Inserted);
        assert_eq!(doc.panel(id).unwrap().body, PanelBody::Loading);
        assert!(doc.reveal_panel(id));
        assert_eq!(doc.panel(id).unwrap().phase, PanelPhase::Shown);
        assert!(!doc.reveal_panel(id));
    }

    #[test]
    fn test_teardown_keeps_panel_until_removed() {
        let mut doc = make_document();
        let id = doc.insert_panel(day(1));
        let leaving = doc.begin_teardown();
        assert_eq!(leaving, vec![id]);
        assert!(doc.active_panel().is_none());
        assert_eq!(doc.slot_panels.len(), 1);
        doc.remove_panel(id);
        assert!(doc.slot_panels.is_empty());
    }

    #[test]
    fn test_leaving_panel_not_revealed_or_filled() {
        let mut doc = make_document();
        let id = doc.insert_panel(day(1));
        doc.begin_teardown();
        assert!(!doc.reveal_panel(id));
        assert!(!doc.set_panel_body(id, PanelBody::Error("x".into())));
        assert_eq!(doc.panel(id).unwrap().body, PanelBody::Loading);
    }

    #[test]
    fn test_mark_selected_exactly_one() {
        let mut doc = make_document();
        doc.mark_selected(Some(day(4)));
        let selected: Vec<_> = doc.calendar.iter().filter(|d| d.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].offset, day(4));
        doc.mark_selected(None);
        assert!(doc.calendar.iter().all(|d| !d.selected));
    }

    #[test]
    fn test_layout_places_panel_after_anchor() {
        let mut doc = make_document();
        let id = doc.insert_panel(day(2));
        let layout = doc.calendar_layout();
        assert_eq!(layout.len(), 15);
        match (layout[2], layout[3]) {
            (CalendarItem::Day(d), CalendarItem::Panel(p)) => {
                assert_eq!(d.offset, day(2));
                assert_eq!(p.id, id);
            }
            other => panic!("unexpected layout: {:?}", other),
        }
    }
}
