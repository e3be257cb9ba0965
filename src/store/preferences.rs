use super::storage::Storage;
use crate::shortcut::ShortcutPreset;
use tracing::error;

pub const SHORTCUT_PRESET_KEY: &str = "shortcut_preset";
pub const RECENT_APP_FIRST_KEY: &str = "recent_app_first";
pub const HAS_PROMPTED_KEY: &str = "has_prompted_permissions";

/// Небольшие пользовательские настройки поверх общего хранилища
#[derive(Clone)]
pub struct Preferences {
    storage: Storage,
}

impl Preferences {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn shortcut_preset(&self) -> ShortcutPreset {
        let raw = self.storage.get::<String>(SHORTCUT_PRESET_KEY);
        ShortcutPreset::from_stored(raw.as_deref())
    }

    pub fn set_shortcut_preset(&self, preset: ShortcutPreset) {
        self.write(SHORTCUT_PRESET_KEY, preset.as_str());
    }

    pub fn recent_app_first(&self) -> bool {
        self.storage.get(RECENT_APP_FIRST_KEY).unwrap_or(false)
    }

    pub fn set_recent_app_first(&self, enabled: bool) {
        self.write(RECENT_APP_FIRST_KEY, &enabled);
    }

    pub fn has_prompted_permissions(&self) -> bool {
        self.storage.get(HAS_PROMPTED_KEY).unwrap_or(false)
    }

    pub fn mark_prompted_permissions(&self) {
        self.write(HAS_PROMPTED_KEY, &true);
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.storage.set(key, value) {
            error!("Не удалось сохранить настройку '{}': {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_absent() {
        let prefs = Preferences::new(Storage::memory());
        assert_eq!(prefs.shortcut_preset(), ShortcutPreset::AltTab);
        assert!(!prefs.recent_app_first());
        assert!(!prefs.has_prompted_permissions());
    }

    #[test]
    fn unknown_preset_falls_back_to_default() {
        let storage = Storage::memory();
        storage.set_raw(SHORTCUT_PRESET_KEY, json!("hyper_space")).unwrap();
        assert_eq!(Preferences::new(storage).shortcut_preset(), ShortcutPreset::AltTab);
    }

    #[test]
    fn values_round_trip_through_storage() {
        let storage = Storage::memory();
        let prefs = Preferences::new(storage.clone());
        prefs.set_shortcut_preset(ShortcutPreset::AltGrave);
        prefs.set_recent_app_first(true);
        prefs.mark_prompted_permissions();

        let again = Preferences::new(storage);
        assert_eq!(again.shortcut_preset(), ShortcutPreset::AltGrave);
        assert!(again.recent_app_first());
        assert!(again.has_prompted_permissions());
    }
}
