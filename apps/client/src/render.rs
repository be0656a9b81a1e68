//! Pure render layer: server data in, view values out.
//!
//! Views carry the `Action` their control triggers, so hosts only dispatch
//! what the view offers. A control without an action is inert.

use std::fmt;

use chrono::{Duration, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::calendar::{DayOffset, CALENDAR_DAYS};
use crate::models::{Booking, BookingStatus, Model, PendingModel, Slot, UserStat};

// ── User-facing messages ──

pub const MSG_LOADING_SLOTS: &str = "Загрузка слотов...";
pub const MSG_SLOTS_ERROR: &str = "Не удалось загрузить слоты";
pub const MSG_NO_SLOTS: &str = "Свободных слотов нет";
pub const MSG_AUTH_PROMPT: &str = "Откройте приложение через Telegram, чтобы увидеть свои бронирования";
pub const MSG_NO_BOOKINGS: &str = "У вас пока нет бронирований";
pub const MSG_NO_ADMIN_BOOKINGS: &str = "Бронирований пока нет.";
pub const MSG_NO_PENDING: &str = "Нет моделей на модерации";
pub const MSG_NO_MODELS: &str = "Библиотека пока пуста";
pub const MSG_NO_USERS: &str = "Пользователей пока нет";
pub const MSG_MODELS_ERROR: &str = "Ошибка загрузки моделей";
pub const DEFAULT_BOOKING_TITLE: &str = "Бронирование";

// ── Actions ──

/// What activating a control does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectDay(DayOffset),
    Book(Slot),
    Cancel(i64),
    AdminCancel(i64),
    Approve(i64),
    Reject(i64),
}

// ── Views ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayControl {
    pub offset: DayOffset,
    pub date: NaiveDate,
    pub label: String,
    pub weekday: String,
    pub selected: bool,
    pub on_click: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotButton {
    pub label: String,
    pub slot: Slot,
    pub disabled: bool,
    pub on_click: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRow {
    pub id: i64,
    pub title: String,
    pub range: String,
    /// Owner line, present in admin lists.
    pub owner: Option<String>,
    /// Status label, present when inactive rows are listed.
    pub status: Option<String>,
    pub on_cancel: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCard {
    pub title: String,
    pub image: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCard {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub file: Option<String>,
    pub submitter: String,
    pub on_approve: Action,
    pub on_reject: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatRow {
    pub name: String,
    pub handle: String,
    pub booking_count: i64,
}

/// Content of a list panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    /// Never loaded.
    Idle,
    Items(Vec<T>),
    Empty(String),
    /// Informational text shown instead of data (e.g. login prompt).
    Notice(String),
    Error(String),
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Section<T> {
    fn from_items(items: Vec<T>, empty: &str) -> Self {
        if items.is_empty() {
            Self::Empty(empty.to_string())
        } else {
            Self::Items(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Self::Items(items) => items,
            _ => &[],
        }
    }
}

// ── Formatting helpers ──

fn localized(at: NaiveDateTime, fmt: &str, locale: Locale) -> String {
    Utc.from_utc_datetime(&at)
        .format_localized(fmt, locale)
        .to_string()
}

/// Local `HH:MM` of a slot start.
pub fn slot_label(slot: &Slot) -> String {
    slot.start.format("%H:%M").to_string()
}

/// Human-readable date and time, e.g. `21.10.2026 09:00`.
pub fn date_time(at: NaiveDateTime, locale: Locale) -> String {
    localized(at, "%x %H:%M", locale)
}

pub fn booking_range(start: NaiveDateTime, end: NaiveDateTime, locale: Locale) -> String {
    format!("{} — {}", date_time(start, locale), date_time(end, locale))
}

pub fn confirm_booking_text(slot: &Slot, locale: Locale) -> String {
    format!("Забронировать {}?", date_time(slot.start, locale))
}

// ── Renderers ──

/// Day controls for today and the following days.
pub fn calendar(today: NaiveDate, locale: Locale, selected: Option<DayOffset>) -> Vec<DayControl> {
    (0..CALENDAR_DAYS)
        .filter_map(DayOffset::new)
        .map(|offset| {
            let date = today + Duration::days(i64::from(offset.get()));
            let midnight = date.and_time(chrono::NaiveTime::MIN);
            DayControl {
                offset,
                date,
                label: localized(midnight, "%x", locale),
                weekday: localized(midnight, "%a", locale),
                selected: selected == Some(offset),
                on_click: Action::SelectDay(offset),
            }
        })
        .collect()
}

/// One button per slot. Occupied slots are disabled and carry no action.
pub fn slot_buttons(slots: &[Slot]) -> Vec<SlotButton> {
    slots
        .iter()
        .map(|slot| SlotButton {
            label: slot_label(slot),
            slot: slot.clone(),
            disabled: slot.occupied,
            on_click: (!slot.occupied).then(|| Action::Book(slot.clone())),
        })
        .collect()
}

fn booking_title(booking: &Booking) -> String {
    booking
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BOOKING_TITLE.into())
}

fn owner_line(booking: &Booking) -> String {
    let name = booking.user_name.as_deref().unwrap_or("неизвестно");
    let handle = booking
        .tg_user
        .map(|id| id.to_string())
        .unwrap_or_else(|| "guest".into());
    format!("Пользователь: {name} (@{handle})")
}

fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Active => "активна",
        BookingStatus::Cancelled => "отменена",
        BookingStatus::Other => "завершена",
    }
}

/// The user's own active bookings.
pub fn my_bookings(bookings: &[Booking], locale: Locale) -> Section<BookingRow> {
    let rows = bookings
        .iter()
        .filter(|b| b.is_active())
        .map(|b| BookingRow {
            id: b.id,
            title: booking_title(b),
            range: booking_range(b.start, b.end, locale),
            owner: None,
            status: None,
            on_cancel: Some(Action::Cancel(b.id)),
        })
        .collect();
    Section::from_items(rows, MSG_NO_BOOKINGS)
}

/// Active bookings of every user, with the owner next to the time range.
pub fn admin_bookings(bookings: &[Booking], locale: Locale) -> Section<BookingRow> {
    let rows = bookings
        .iter()
        .filter(|b| b.is_active())
        .map(|b| BookingRow {
            id: b.id,
            title: booking_title(b),
            range: booking_range(b.start, b.end, locale),
            owner: Some(owner_line(b)),
            status: None,
            on_cancel: Some(Action::AdminCancel(b.id)),
        })
        .collect();
    Section::from_items(rows, MSG_NO_ADMIN_BOOKINGS)
}

/// Every booking of a date, inactive ones included and labelled.
pub fn date_lookup(bookings: &[Booking], locale: Locale) -> Section<BookingRow> {
    let rows = bookings
        .iter()
        .map(|b| BookingRow {
            id: b.id,
            title: booking_title(b),
            range: booking_range(b.start, b.end, locale),
            owner: Some(owner_line(b)),
            status: Some(status_label(b.status).to_string()),
            on_cancel: b.is_active().then_some(Action::AdminCancel(b.id)),
        })
        .collect();
    Section::from_items(rows, MSG_NO_ADMIN_BOOKINGS)
}

pub fn models(models: &[Model]) -> Section<ModelCard> {
    let cards = models
        .iter()
        .map(|m| ModelCard {
            title: m.title.clone(),
            image: m.image.clone().filter(|i| !i.is_empty()),
            download_url: m.file.clone(),
        })
        .collect();
    Section::from_items(cards, MSG_NO_MODELS)
}

pub fn pending_models(pending: &[PendingModel]) -> Section<PendingCard> {
    let cards = pending
        .iter()
        .map(|p| PendingCard {
            id: p.id,
            title: p.title.clone(),
            image: p.image.clone().filter(|i| !i.is_empty()),
            file: p.file.clone(),
            submitter: p
                .submitter
                .map(|id| id.to_string())
                .unwrap_or_else(|| "неизвестно".into()),
            on_approve: Action::Approve(p.id),
            on_reject: Action::Reject(p.id),
        })
        .collect();
    Section::from_items(cards, MSG_NO_PENDING)
}

pub fn user_stats(users: &[UserStat]) -> Section<UserStatRow> {
    let rows = users
        .iter()
        .map(|u| UserStatRow {
            name: u
                .first_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Гость".into()),
            handle: format!("@{}", u.username.as_deref().unwrap_or("guest")),
            booking_count: u.booking_count.unwrap_or(0),
        })
        .collect();
    Section::from_items(rows, MSG_NO_USERS)
}

// ── Text markup ──

impl fmt::Display for DayControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.selected { '>' } else { ' ' };
        write!(f, "{marker}[{:>2}] {} {}", self.offset.get(), self.label, self.weekday)
    }
}

impl fmt::Display for SlotButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disabled {
            write!(f, "{} (занято)", self.label)
        } else {
            write!(f, "{}", self.label)
        }
    }
}

impl fmt::Display for BookingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} · {}", self.id, self.title, self.range)?;
        if let Some(status) = &self.status {
            write!(f, " [{status}]")?;
        }
        if let Some(owner) = &self.owner {
            write!(f, "\n    {owner}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ModelCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = self.image.as_deref().unwrap_or("Нет фото");
        write!(f, "{} · {} · Скачать: {}", self.title, image, self.download_url)
    }
}

impl fmt::Display for PendingCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} (от {})", self.id, self.title, self.submitter)?;
        if let Some(file) = &self.file {
            write!(f, " · {file}")?;
        }
        Ok(())
    }
}

impl fmt::Display for UserStatRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} · Броней: {}", self.name, self.handle, self.booking_count)
    }
}

impl<T: fmt::Display> fmt::Display for Section<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  {item}")?;
                }
                Ok(())
            }
            Self::Empty(text) | Self::Notice(text) => write!(f, "  {text}"),
            Self::Error(text) => write!(f, "  ! {text}"),
        }
    }
}

// ── Tests ──
