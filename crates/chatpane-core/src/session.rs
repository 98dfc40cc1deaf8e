//! Session state and the admin gate
//!
//! Every field is persisted on its own key and falls back to a default when
//! the stored value is missing or not recognized.

use tracing::{info, warn};

use crate::prefs::PreferenceStore;

pub const KEY_IS_ADMIN: &str = "isAdmin";
pub const KEY_SELECTED_MODEL: &str = "selectedModel";
pub const KEY_API_VERSION: &str = "apiVersion";
pub const KEY_API_PORT: &str = "apiPort";

pub const MAX_PORT_DIGITS: usize = 5;

// Fixed demo credentials. The gate only toggles UI mode.
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    GeminiFlashPreview,
    Gemma3,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::GeminiFlashPreview => "gemini-2.5-flash-preview-05-20",
            Model::Gemma3 => "gemma3:12b",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|m| m.as_str() == s)
    }

    pub fn all() -> Vec<Model> {
        vec![Model::GeminiFlashPreview, Model::Gemma3]
    }

    pub fn next(&self) -> Self {
        match self {
            Model::GeminiFlashPreview => Model::Gemma3,
            Model::Gemma3 => Model::GeminiFlashPreview,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
    V3,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "chat_v1",
            ApiVersion::V2 => "chat_v2",
            ApiVersion::V3 => "chat_v3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|v| v.as_str() == s)
    }

    pub fn all() -> Vec<ApiVersion> {
        vec![ApiVersion::V1, ApiVersion::V2, ApiVersion::V3]
    }

    /// URL path segment: `chat_v2` is served at `chat2`
    pub fn path_segment(&self) -> String {
        self.as_str().replacen("_v", "", 1)
    }

    pub fn next(&self) -> Self {
        match self {
            ApiVersion::V1 => ApiVersion::V2,
            ApiVersion::V2 => ApiVersion::V3,
            ApiVersion::V3 => ApiVersion::V1,
        }
    }
}

/// Keep ASCII digits only, at most five of them
pub fn sanitize_port(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_PORT_DIGITS)
        .collect()
}

fn is_valid_port(raw: &str) -> bool {
    !raw.is_empty() && raw.len() <= MAX_PORT_DIGITS && raw.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub is_admin: bool,
    pub selected_model: Model,
    pub api_version: ApiVersion,
    pub port: String,
}

impl SessionState {
    /// Read every field once from the store, falling back per field
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let is_admin = store.read(KEY_IS_ADMIN).as_deref() == Some("true");

        let selected_model = store
            .read(KEY_SELECTED_MODEL)
            .and_then(|m| Model::from_str(&m))
            .unwrap_or_default();

        let api_version = store
            .read(KEY_API_VERSION)
            .and_then(|v| ApiVersion::from_str(&v))
            .unwrap_or_default();

        let port = store
            .read(KEY_API_PORT)
            .filter(|p| is_valid_port(p))
            .unwrap_or_default();

        Self {
            is_admin,
            selected_model,
            api_version,
            port,
        }
    }

    pub fn set_model(&mut self, store: &mut dyn PreferenceStore, model: Model) {
        self.selected_model = model;
        persist(store, KEY_SELECTED_MODEL, model.as_str());
    }

    pub fn set_api_version(&mut self, store: &mut dyn PreferenceStore, version: ApiVersion) {
        self.api_version = version;
        persist(store, KEY_API_VERSION, version.as_str());
    }

    /// Sanitize and store raw port input; called on every keystroke
    pub fn set_port(&mut self, store: &mut dyn PreferenceStore, raw: &str) {
        self.port = sanitize_port(raw);
        persist(store, KEY_API_PORT, &self.port);
    }

    /// Session gate login. Returns whether the credentials matched.
    pub fn login(&mut self, store: &mut dyn PreferenceStore, username: &str, password: &str) -> bool {
        if username != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            info!("admin login rejected");
            return false;
        }

        self.is_admin = true;
        persist(store, KEY_IS_ADMIN, "true");
        info!("admin mode enabled");
        true
    }

    pub fn logout(&mut self, store: &mut dyn PreferenceStore) {
        self.is_admin = false;
        if let Err(e) = store.remove(KEY_IS_ADMIN) {
            warn!(error = %e, "failed to clear admin flag");
        }
        info!("admin mode disabled");
    }
}

fn persist(store: &mut dyn PreferenceStore, key: &str, value: &str) {
    if let Err(e) = store.write(key, value) {
        warn!(key, error = %e, "failed to persist preference");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferenceStore;

    #[test]
    fn test_sanitize_port_digits_only_max_five() {
        assert_eq!(sanitize_port("12a3456xyz"), "12345");
        assert_eq!(sanitize_port("abc"), "");
        assert_eq!(sanitize_port("80"), "80");
        assert_eq!(sanitize_port("٣٣"), "");
    }

    #[test]
    fn test_load_defaults_from_empty_store() {
        let store = MemoryPreferenceStore::new();
        let session = SessionState::load(&store);
        assert_eq!(session, SessionState::default());
        assert_eq!(session.selected_model.as_str(), "gemini-2.5-flash-preview-05-20");
        assert_eq!(session.api_version.as_str(), "chat_v2");
        assert!(session.port.is_empty());
    }

    #[test]
    fn test_load_invalid_values_fall_back() {
        let store = MemoryPreferenceStore::with_entries([
            (KEY_IS_ADMIN, "yes"),
            (KEY_SELECTED_MODEL, "gpt-unknown"),
            (KEY_API_VERSION, "chat_v9"),
            (KEY_API_PORT, "12ab"),
        ]);
        assert_eq!(SessionState::load(&store), SessionState::default());
    }

    #[test]
    fn test_load_valid_values() {
        let store = MemoryPreferenceStore::with_entries([
            (KEY_IS_ADMIN, "true"),
            (KEY_SELECTED_MODEL, "gemma3:12b"),
            (KEY_API_VERSION, "chat_v3"),
            (KEY_API_PORT, "9090"),
        ]);
        let session = SessionState::load(&store);
        assert!(session.is_admin);
        assert_eq!(session.selected_model, Model::Gemma3);
        assert_eq!(session.api_version, ApiVersion::V3);
        assert_eq!(session.port, "9090");
    }

    #[test]
    fn test_set_port_persists_sanitized_value() {
        let mut store = MemoryPreferenceStore::new();
        let mut session = SessionState::default();
        session.set_port(&mut store, "12a3456xyz");
        assert_eq!(session.port, "12345");
        assert_eq!(store.read(KEY_API_PORT).as_deref(), Some("12345"));

        session.set_port(&mut store, "");
        assert_eq!(store.read(KEY_API_PORT).as_deref(), Some(""));
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(ApiVersion::V1.path_segment(), "chat1");
        assert_eq!(ApiVersion::V2.path_segment(), "chat2");
        assert_eq!(ApiVersion::V3.path_segment(), "chat3");
    }

    #[test]
    fn test_login_and_logout() {
        let mut store = MemoryPreferenceStore::new();
        let mut session = SessionState::default();

        assert!(!session.login(&mut store, "admin", "wrong"));
        assert!(!session.is_admin);
        assert_eq!(store.read(KEY_IS_ADMIN), None);

        assert!(session.login(&mut store, "admin", "admin"));
        assert!(session.is_admin);
        assert_eq!(store.read(KEY_IS_ADMIN).as_deref(), Some("true"));

        session.logout(&mut store);
        assert!(!session.is_admin);
        assert_eq!(store.read(KEY_IS_ADMIN), None);
    }

    #[test]
    fn test_model_and_version_persist() {
        let mut store = MemoryPreferenceStore::new();
        let mut session = SessionState::default();
        session.set_model(&mut store, Model::Gemma3);
        session.set_api_version(&mut store, ApiVersion::V1);

        let reloaded = SessionState::load(&store);
        assert_eq!(reloaded.selected_model, Model::Gemma3);
        assert_eq!(reloaded.api_version, ApiVersion::V1);
    }
}
