//! Resolution of the current user.
//!
//! Order: Telegram host `initData` → launch URL query → anonymous guest.
//! Resolution never fails; an identity without an id is anonymous and cannot
//! book or submit.

use std::collections::BTreeMap;

use crate::models::TelegramUser;
use crate::prefs::ProfileOverrides;

pub const GUEST_NAME: &str = "Гость";
pub const GUEST_HANDLE: &str = "@guest";
pub const DEFAULT_AVATAR: &str = "/static/img/default-avatar.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<i64>,
    pub display_name: String,
    pub handle: String,
    pub avatar_url: String,
    /// Raw username without `@`, sent to the backend on booking.
    pub username: Option<String>,
    /// First name as the host reported it. Sent to the backend; local
    /// profile overrides never change it.
    pub first_name: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            display_name: GUEST_NAME.into(),
            handle: GUEST_HANDLE.into(),
            avatar_url: DEFAULT_AVATAR.into(),
            username: None,
            first_name: GUEST_NAME.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// Apply locally saved profile fields. The id is never overridden.
    pub fn with_overrides(mut self, overrides: &ProfileOverrides) -> Self {
        if let Some(name) = &overrides.display_name {
            self.display_name = name.clone();
        }
        if let Some(handle) = &overrides.handle {
            self.handle = handle.clone();
        }
        if let Some(avatar) = &overrides.avatar_url {
            self.avatar_url = avatar.clone();
        }
        self
    }

    fn from_parts(
        id: Option<i64>,
        first_name: Option<&str>,
        username: Option<&str>,
        photo_url: Option<&str>,
    ) -> Self {
        let first_name = first_name.map(str::trim).filter(|s| !s.is_empty());
        let username = username
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty());
        let first_name = first_name.unwrap_or(GUEST_NAME).to_string();
        Self {
            id,
            display_name: first_name.clone(),
            handle: username
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| GUEST_HANDLE.into()),
            avatar_url: photo_url
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_AVATAR)
                .to_string(),
            username: username.map(str::to_string),
            first_name,
        }
    }
}

/// Ambient context handed over by the host that embeds the app.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    /// Raw Mini App `initData` query string.
    pub init_data: Option<String>,
    /// Host colour scheme (`light` / `dark`).
    pub color_scheme: Option<String>,
    /// URL the app was launched with.
    pub launch_url: Option<String>,
}

/// Resolve the session identity from the host context.
pub fn resolve(host: &HostContext) -> Identity {
    if let Some(identity) = host.init_data.as_deref().and_then(from_init_data) {
        tracing::info!(id = ?identity.id, "identity resolved from host initData");
        return identity;
    }
    if let Some(identity) = host.launch_url.as_deref().and_then(from_launch_url) {
        tracing::info!(id = ?identity.id, "identity resolved from launch URL");
        return identity;
    }
    tracing::info!("no identity available, continuing as guest");
    Identity::anonymous()
}

/// Extract the user from an `initData` string. The signature is not checked
/// here; the backend is the one that trusts or rejects it.
pub fn from_init_data(init_data: &str) -> Option<Identity> {
    let params: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let user_json = params.get("user")?;
    let user = match serde_json::from_str::<TelegramUser>(user_json) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("malformed initData user: {}", e);
            return None;
        }
    };
    if user.id <= 0 {
        return None;
    }

    Some(Identity::from_parts(
        Some(user.id),
        Some(user.first_name.as_str()),
        user.username.as_deref(),
        user.photo_url.as_deref(),
    ))
}

/// Build an identity from `tg_user`/`tgId`, `name`, `username` and
/// `photo_url` launch parameters. Returns `None` when none is present.
pub fn from_launch_url(launch_url: &str) -> Option<Identity> {
    let url = url::Url::parse(launch_url).ok()?;
    let mut id_param = None;
    let mut name = None;
    let mut username = None;
    let mut photo_url = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "tg_user" | "tgId" => id_param = Some(value.into_owned()),
            "name" => name = Some(value.into_owned()),
            "username" => username = Some(value.into_owned()),
            "photo_url" => photo_url = Some(value.into_owned()),
            _ => {}
        }
    }

    if id_param.is_none() && name.is_none() && username.is_none() && photo_url.is_none() {
        return None;
    }

    let id = id_param
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0);

    Some(Identity::from_parts(
        id,
        name.as_deref(),
        username.as_deref(),
        photo_url.as_deref(),
    ))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn make_init_data(user_json: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("user", user_json)
            .append_pair("auth_date", "1760000000")
            .append_pair("hash", "deadbeef")
            .finish()
    }

    #[test]
    fn test_init_data_user() {
        let data = make_init_data(r#"{"id":1127824573,"first_name":"Oleg","username":"shezyyy","photo_url":"https://t.me/a.jpg"}"#);
        let id = from_init_data(&data).unwrap();
        assert_eq!(id.id, Some(1127824573));
        assert_eq!(id.display_name, "Oleg");
        assert_eq!(id.handle, "@shezyyy");
        assert_eq!(id.username.as_deref(), Some("shezyyy"));
        assert_eq!(id.avatar_url, "https://t.me/a.jpg");
    }

    #[test]
    fn test_init_data_without_user() {
        assert!(from_init_data("auth_date=1&hash=x").is_none());
    }

    #[test]
    fn test_init_data_malformed_user() {
        let data = make_init_data("{not json");
        assert!(from_init_data(&data).is_none());
    }

    #[test]
    fn test_launch_url_tg_user() {
        let id = from_launch_url("https://app.example/?tg_user=77&name=Anna&username=anna3d").unwrap();
        assert_eq!(id.id, Some(77));
        assert_eq!(id.display_name, "Anna");
        assert_eq!(id.handle, "@anna3d");
        assert_eq!(id.avatar_url, DEFAULT_AVATAR);
    }

    #[test]
    fn test_launch_url_tg_id_alias() {
        let id = from_launch_url("https://app.example/?tgId=5").unwrap();
        assert_eq!(id.id, Some(5));
        assert_eq!(id.display_name, GUEST_NAME);
    }

    #[test]
    fn test_launch_url_bad_id_is_anonymous() {
        let id = from_launch_url("https://app.example/?tg_user=abc&name=Bob").unwrap();
        assert!(id.is_anonymous());
        assert_eq!(id.display_name, "Bob");
    }

    #[test]
    fn test_launch_url_without_params() {
        assert!(from_launch_url("https://app.example/?lang=ru").is_none());
    }

    #[test]
    fn test_resolve_prefers_host_over_url() {
        let host = HostContext {
            init_data: Some(make_init_data(r#"{"id":1,"first_name":"Host"}"#)),
            launch_url: Some("https://app.example/?tg_user=2&name=Url".into()),
            ..Default::default()
        };
        let id = resolve(&host);
        assert_eq!(id.id, Some(1));
        assert_eq!(id.display_name, "Host");
    }

    #[test]
    fn test_resolve_falls_back_to_url() {
        let host = HostContext {
            init_data: Some(make_init_data("[]")),
            launch_url: Some("https://app.example/?tg_user=2&name=Url".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&host).id, Some(2));
    }

    #[test]
    fn test_resolve_guest() {
        let id = resolve(&HostContext::default());
        assert_eq!(id, Identity::anonymous());
        assert!(id.is_anonymous());
    }

    #[test]
    fn test_overrides_keep_id() {
        let id = from_launch_url("https://app.example/?tg_user=9&name=Real").unwrap();
        let overrides = ProfileOverrides {
            display_name: Some("Nick".into()),
            handle: Some("@nick".into()),
            avatar_url: None,
        };
        let id = id.with_overrides(&overrides);
        assert_eq!(id.id, Some(9));
        assert_eq!(id.display_name, "Nick");
        assert_eq!(id.first_name, "Real");
        assert_eq!(id.handle, "@nick");
        assert_eq!(id.avatar_url, DEFAULT_AVATAR);
    }
}
