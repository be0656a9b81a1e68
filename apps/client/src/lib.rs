//! Client for the 3D-printer booking Mini App: calendar of print slots,
//! bookings, model library and admin moderation.

pub mod admin;
pub mod api;
pub mod app;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod dialogs;
pub mod document;
pub mod identity;
pub mod library;
pub mod models;
pub mod prefs;
pub mod refresh;
pub mod render;
pub mod terminal;

pub use api::{ApiClient, ApiError, Upload};
pub use app::{AdminStatus, App, AppOptions, Outcome};
pub use calendar::DayOffset;
pub use config::{Config, Timings};
pub use dialogs::Dialogs;
pub use document::{Document, Tab};
pub use identity::Identity;
pub use library::ModelForm;
pub use refresh::spawn_refresh;
