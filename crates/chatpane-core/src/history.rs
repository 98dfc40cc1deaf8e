use tracing::warn;

use crate::prefs::PreferenceStore;

pub const KEY_QUERY_HISTORY: &str = "queryHistory";
pub const MAX_HISTORY: usize = 10;

/// Recent distinct queries, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHistory {
    entries: Vec<String>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the store. Malformed data yields an empty history.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let Some(raw) = store.read(KEY_QUERY_HISTORY) else {
            return Self::new();
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(saved) => Self::from_entries(saved),
            Err(e) => {
                warn!(error = %e, "ignoring malformed query history");
                Self::new()
            }
        }
    }

    fn from_entries(saved: Vec<String>) -> Self {
        let mut entries: Vec<String> = Vec::with_capacity(MAX_HISTORY);
        for query in saved {
            if !entries.contains(&query) {
                entries.push(query);
            }
            if entries.len() == MAX_HISTORY {
                break;
            }
        }
        Self { entries }
    }

    /// Move `query` to the front, drop older copies, cap the length, persist
    pub fn record(&mut self, store: &mut dyn PreferenceStore, query: &str) {
        self.entries.retain(|q| q != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_HISTORY);

        match serde_json::to_string(&self.entries) {
            Ok(json) => {
                if let Err(e) = store.write(KEY_QUERY_HISTORY, &json) {
                    warn!(error = %e, "failed to persist query history");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode query history"),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
