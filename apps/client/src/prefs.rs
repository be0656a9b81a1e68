//! Client-local preferences persisted as a flat JSON object.
//!
//! Keys match the ones the web client kept in `localStorage`, so a file
//! exported from there can be reused as-is.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::identity::GUEST_NAME;

pub const THEME_KEY: &str = "themePreference";
pub const NAME_KEY: &str = "userName";
pub const USERNAME_KEY: &str = "userUsername";
pub const AVATAR_KEY: &str = "userAvatar";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Locally saved profile fields that take precedence over host values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileOverrides {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug)]
pub struct Prefs {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl Prefs {
    /// Load preferences from `path`. A missing or unreadable file yields an
    /// empty store that will be created on the first write.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed prefs file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("cannot read prefs file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            values,
        }
    }

    /// Store that lives only for the session.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> std::io::Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.save()
    }

    fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, text)
    }

    // ── Theme ──

    /// Saved preference, then host colour scheme, then light.
    pub fn theme(&self, host_scheme: Option<&str>) -> Theme {
        self.get(THEME_KEY)
            .and_then(Theme::parse)
            .or_else(|| host_scheme.and_then(Theme::parse))
            .unwrap_or_default()
    }

    pub fn save_theme(&mut self, theme: Theme) -> std::io::Result<()> {
        self.set(THEME_KEY, theme.as_str())
    }

    // ── Profile ──

    pub fn profile(&self) -> ProfileOverrides {
        ProfileOverrides {
            display_name: self.get(NAME_KEY).map(str::to_string),
            handle: self.get(USERNAME_KEY).map(str::to_string),
            avatar_url: self.get(AVATAR_KEY).map(str::to_string),
        }
    }

    /// Persist a display name; blank input stores the guest name.
    pub fn save_display_name(&mut self, name: &str) -> std::io::Result<String> {
        let name = match name.trim() {
            "" => GUEST_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.set(NAME_KEY, name.clone())?;
        Ok(name)
    }

    /// Persist a handle, normalised to start with `@`.
    pub fn save_handle(&mut self, handle: &str) -> std::io::Result<String> {
        let handle = handle.trim();
        let handle = if handle.starts_with('@') {
            handle.to_string()
        } else {
            format!("@{handle}")
        };
        self.set(USERNAME_KEY, handle.clone())?;
        Ok(handle)
    }

    pub fn save_avatar(&mut self, avatar_url: &str) -> std::io::Result<()> {
        self.set(AVATAR_KEY, avatar_url.trim())
    }
}

// ── Tests ──
