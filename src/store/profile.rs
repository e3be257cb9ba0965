use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Идентификатор виртуального рабочего стола (локален для сессии)
pub type SpaceId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Закреплённое приложение. Запущено ли оно и его иконка не хранятся:
/// это всегда выводится из системы в момент чтения.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinnedApp {
    /// Стабильный идентификатор приложения (WM_CLASS / id .desktop-файла)
    pub identifier: String,
    /// Кэшированное имя, может устареть
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "order")]
    pub sort_order: usize,
}

impl PinnedApp {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            sort_order: 0,
        }
    }
}

impl fmt::Display for PinnedApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    #[serde(rename = "pins", default)]
    pub pinned_apps: Vec<PinnedApp>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_apps(name, Vec::new())
    }

    pub fn with_apps(name: impl Into<String>, pinned_apps: Vec<PinnedApp>) -> Self {
        let mut profile = Self {
            id: ProfileId::generate(),
            name: name.into(),
            pinned_apps,
        };
        profile.reindex();
        profile
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.pinned_apps.iter().any(|app| app.identifier == identifier)
    }

    /// Порядок сортировки = позиция в списке, без дыр и повторов
    pub fn reindex(&mut self) {
        for (index, app) in self.pinned_apps.iter_mut().enumerate() {
            app.sort_order = index;
        }
    }

    /// Убрать повторяющиеся идентификаторы, оставив первое вхождение
    pub fn dedup(&mut self) -> usize {
        let before = self.pinned_apps.len();
        let mut seen = std::collections::HashSet::new();
        self.pinned_apps
            .retain(|app| seen.insert(app.identifier.clone()));
        before - self.pinned_apps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_reindexed() {
        let mut apps = vec![PinnedApp::new("firefox", "Firefox"), PinnedApp::new("kitty", "Kitty")];
        apps[0].sort_order = 7;
        let profile = Profile::with_apps("Work", apps);

        let orders: Vec<usize> = profile.pinned_apps.iter().map(|a| a.sort_order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut profile = Profile::with_apps(
            "Work",
            vec![
                PinnedApp::new("firefox", "Firefox"),
                PinnedApp::new("kitty", "Kitty"),
                PinnedApp::new("firefox", "Firefox (old)"),
            ],
        );

        assert_eq!(profile.dedup(), 1);
        assert_eq!(profile.pinned_apps[0].display_name, "Firefox");
        assert!(profile.contains("kitty"));
    }

    #[test]
    fn persisted_field_names() {
        let app = PinnedApp::new("org.gnome.Nautilus", "Files");
        let json = serde_json::to_value(&app).unwrap();

        assert_eq!(json["identifier"], "org.gnome.Nautilus");
        assert_eq!(json["name"], "Files");
        assert_eq!(json["order"], 0);
    }
}
