use std::collections::HashMap;

use crate::preview::locale::Locale;
use crate::preview::sandbox::SandboxPolicy;

pub const TEMPLATE_KEY: &str = "vellum.template";
pub const CONTEXT_KEY: &str = "vellum.context";
pub const ALLOW_SCRIPTS_KEY: &str = "vellum.allowScripts";
pub const LOCALE_KEY: &str = "vellum.locale";

/// Client-side storage of the session, like the browser local storage.
///
/// Values are plain strings. Failing writes are the store's concern, the session
/// never waits for them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// A `KeyValueStore` living in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Everything the session keeps between visits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSnapshot {
    pub template_text: String,
    pub context_text: String,
    pub sandbox_policy: SandboxPolicy,
    pub locale: Locale,
}

impl PersistedSnapshot {
    /// Reads the snapshot, any missing or unreadable entry takes its default value
    pub fn load(store: &dyn KeyValueStore) -> PersistedSnapshot {
        let allow_scripts = store
            .get(ALLOW_SCRIPTS_KEY)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        PersistedSnapshot {
            template_text: store.get(TEMPLATE_KEY).unwrap_or_default(),
            context_text: store.get(CONTEXT_KEY).unwrap_or_default(),
            sandbox_policy: SandboxPolicy::from_allow_scripts(allow_scripts),
            locale: store
                .get(LOCALE_KEY)
                .and_then(|tag| Locale::from_tag(&tag))
                .unwrap_or_default(),
        }
    }

    /// Writes every entry of the snapshot
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        store.set(TEMPLATE_KEY, &self.template_text);
        store.set(CONTEXT_KEY, &self.context_text);
        save_policy(store, self.sandbox_policy);
        save_locale(store, self.locale);
    }
}

pub(crate) fn save_policy(store: &mut dyn KeyValueStore, policy: SandboxPolicy) {
    store.set(ALLOW_SCRIPTS_KEY, if policy.allows_scripts() { "true" } else { "false" });
}

pub(crate) fn save_locale(store: &mut dyn KeyValueStore, locale: Locale) {
    store.set(LOCALE_KEY, locale.tag());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(PersistedSnapshot::load(&store), PersistedSnapshot::default());
    }

    #[test]
    fn can_save_and_load_snapshot() {
        let snapshot = PersistedSnapshot {
            template_text: "<p>$name</p>".to_string(),
            context_text: r#"{"name": "Ada"}"#.to_string(),
            sandbox_policy: SandboxPolicy::PermitActiveContent,
            locale: Locale::Sinhala,
        };
        let mut store = MemoryStore::new();
        snapshot.save(&mut store);

        assert_eq!(store.len(), 4);
        assert_eq!(store.get(ALLOW_SCRIPTS_KEY).as_deref(), Some("true"));
        assert_eq!(store.get(LOCALE_KEY).as_deref(), Some("si"));
        assert_eq!(PersistedSnapshot::load(&store), snapshot);
    }

    #[test]
    fn allow_scripts_is_only_true_for_true() {
        let cases = vec![("true", true), ("TRUE", true), ("yes", false), ("1", false), ("", false)];
        for (stored, expected) in cases {
            let mut store = MemoryStore::new();
            store.set(ALLOW_SCRIPTS_KEY, stored);
            assert_eq!(PersistedSnapshot::load(&store).sandbox_policy.allows_scripts(), expected);
        }
    }

    #[test]
    fn bad_locale_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(LOCALE_KEY, "fr-FR");
        assert_eq!(PersistedSnapshot::load(&store).locale, Locale::English);
    }
}
