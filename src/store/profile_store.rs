//! ProfileStore: профили закреплённых приложений, активный профиль и
//! привязка рабочих столов к профилям.
//!
//! Все мутации пишут в хранилище три независимых блоба (профили, id
//! активного профиля, карта рабочих столов) и синхронно уведомляют
//! подписчиков. Чтение отсутствующих или битых данных откатывается к
//! минимальному валидному состоянию: один пустой профиль "Default".

use super::profile::{PinnedApp, Profile, ProfileId, SpaceId};
use super::storage::Storage;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const PROFILES_KEY: &str = "profiles";
pub const ACTIVE_PROFILE_KEY: &str = "active_profile_id";
pub const SPACE_MAPPING_KEY: &str = "space_to_profile";
pub const LEGACY_PINS_KEY: &str = "pinned_apps";
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Откуда хранилище узнаёт текущий рабочий стол
pub trait DesktopSource: Send + Sync {
    fn current_space(&self) -> Option<SpaceId>;
}

pub type ChangeListener = Box<dyn Fn(&ProfileStore) + Send + Sync>;

pub struct ProfileStore {
    profiles: Vec<Profile>,
    active_profile_id: Option<ProfileId>,
    space_mapping: BTreeMap<SpaceId, ProfileId>,
    revision: u64,
    storage: Storage,
    desktop: Arc<dyn DesktopSource>,
    listeners: Vec<ChangeListener>,
}

impl ProfileStore {
    pub fn load(storage: Storage, desktop: Arc<dyn DesktopSource>) -> Self {
        let mut store = Self {
            profiles: Vec::new(),
            active_profile_id: None,
            space_mapping: BTreeMap::new(),
            revision: 0,
            storage,
            desktop,
            listeners: Vec::new(),
        };
        store.load_state();
        store
    }

    /// Перечитать состояние из хранилища (например, после SIGHUP)
    pub fn reload(&mut self) {
        if let Err(e) = self.storage.refresh() {
            warn!("Не удалось перечитать хранилище: {}", e);
        }
        self.load_state();
        self.notify();
    }

    /// Подхватить правки другого процесса (подкоманды CLI), если они были.
    /// Вызывается перед каждой мутацией, чтобы не затереть чужую запись.
    pub fn refresh(&mut self) -> bool {
        match self.storage.refresh() {
            Ok(true) => {
                debug!("Хранилище изменено извне, перечитываем профили");
                self.load_state();
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Не удалось проверить хранилище: {}", e);
                false
            }
        }
    }

    // ---- чтение ----

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn active_profile_id(&self) -> Option<ProfileId> {
        self.active_profile_id
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active_profile_id.and_then(|id| self.profile(id))
    }

    /// Приложения активного профиля; без активного профиля список пуст
    pub fn apps(&self) -> &[PinnedApp] {
        self.active_profile()
            .map(|p| p.pinned_apps.as_slice())
            .unwrap_or(&[])
    }

    pub fn space_mapping(&self) -> &BTreeMap<SpaceId, ProfileId> {
        &self.space_mapping
    }

    /// Растёт на единицу после каждой мутации
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    // ---- профили ----

    pub fn add_profile(&mut self, name: &str) -> ProfileId {
        self.refresh();
        let profile = Profile::new(name);
        let id = profile.id;
        self.profiles.push(profile);
        if self.profiles.len() == 1 {
            self.active_profile_id = Some(id);
        }
        info!("Добавлен профиль '{}' ({})", name, id);
        self.commit();
        id
    }

    pub fn rename_profile(&mut self, id: ProfileId, name: &str) {
        self.refresh();
        let Some(profile) = self.profiles.iter_mut().find(|p| p.id == id) else {
            debug!("Переименование неизвестного профиля {} пропущено", id);
            return;
        };
        profile.name = name.to_string();
        self.commit();
    }

    pub fn delete_profile(&mut self, id: ProfileId) {
        self.refresh();
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        if self.profiles.len() == before {
            debug!("Удаление неизвестного профиля {} пропущено", id);
            return;
        }

        self.space_mapping.retain(|_, profile_id| *profile_id != id);
        if self.active_profile_id == Some(id) {
            self.active_profile_id = self.profiles.first().map(|p| p.id);
            match self.active_profile_id {
                Some(next) => info!("Активный профиль удалён, активен {}", next),
                None => warn!("Удалён последний профиль, список переключателя пуст"),
            }
        }
        self.commit();
    }

    pub fn set_active_profile(&mut self, id: ProfileId) {
        self.refresh();
        if self.profile(id).is_none() {
            debug!("Активация неизвестного профиля {} пропущена", id);
            return;
        }
        self.active_profile_id = Some(id);
        self.commit();
    }

    // ---- рабочие столы ----

    /// Привязать профиль к текущему рабочему столу. У профиля может быть
    /// не больше одного стола: старая привязка удаляется.
    pub fn assign_profile_to_current_space(&mut self, profile_id: ProfileId) {
        self.refresh();
        let Some(space_id) = self.desktop.current_space() else {
            warn!("Текущий рабочий стол неизвестен, привязка профиля пропущена");
            return;
        };
        if self.profile(profile_id).is_none() {
            debug!("Привязка неизвестного профиля {} пропущена", profile_id);
            return;
        }
        self.space_mapping.retain(|_, id| *id != profile_id);
        self.space_mapping.insert(space_id, profile_id);
        info!("Профиль {} привязан к рабочему столу {}", profile_id, space_id);
        self.commit();
    }

    pub fn unassign_profile_from_space(&mut self, profile_id: ProfileId) {
        self.refresh();
        if self.desktop.current_space().is_none() {
            warn!("Текущий рабочий стол неизвестен, отвязка профиля пропущена");
            return;
        }
        self.space_mapping.retain(|_, id| *id != profile_id);
        self.commit();
    }

    /// Профиль рабочего стола, только если он всё ещё существует
    pub fn profile_for_space(&self, space_id: SpaceId) -> Option<ProfileId> {
        let profile_id = *self.space_mapping.get(&space_id)?;
        self.profile(profile_id).map(|p| p.id)
    }

    pub fn space_for_profile(&self, profile_id: ProfileId) -> Option<SpaceId> {
        self.space_mapping
            .iter()
            .find(|(_, id)| **id == profile_id)
            .map(|(space, _)| *space)
    }

    /// Переключиться на профиль рабочего стола; true, если активный сменился
    pub fn apply_space(&mut self, space_id: SpaceId) -> bool {
        self.refresh();
        let Some(profile_id) = self.profile_for_space(space_id) else {
            return false;
        };
        if self.active_profile_id == Some(profile_id) {
            return false;
        }
        info!("Рабочий стол {} -> профиль {}", space_id, profile_id);
        self.set_active_profile(profile_id);
        true
    }

    // ---- закреплённые приложения (только активный профиль) ----

    pub fn is_pinned(&self, identifier: &str) -> bool {
        self.active_profile()
            .map(|p| p.contains(identifier))
            .unwrap_or(false)
    }

    pub fn add(&mut self, app: PinnedApp) {
        self.refresh();
        let Some(profile) = self.active_profile_mut() else {
            return;
        };
        if profile.contains(&app.identifier) {
            debug!("{} уже закреплено", app.identifier);
            return;
        }
        profile.pinned_apps.push(app);
        profile.reindex();
        self.commit();
    }

    pub fn remove(&mut self, identifier: &str) {
        self.refresh();
        let Some(profile) = self.active_profile_mut() else {
            return;
        };
        let before = profile.pinned_apps.len();
        profile.pinned_apps.retain(|app| app.identifier != identifier);
        if profile.pinned_apps.len() == before {
            return;
        }
        profile.reindex();
        self.commit();
    }

    /// Перенести элементы с позиций `from` так, чтобы они оказались перед
    /// элементом, стоявшим на позиции `to` (`to == len` означает в конец).
    pub fn move_apps(&mut self, from: &[usize], to: usize) {
        self.refresh();
        let Some(profile) = self.active_profile_mut() else {
            return;
        };
        let len = profile.pinned_apps.len();
        let mut sources: Vec<usize> = from.iter().copied().filter(|&i| i < len).collect();
        sources.sort_unstable();
        sources.dedup();
        if sources.is_empty() {
            return;
        }

        let to = to.min(len);
        let shift = sources.iter().filter(|&&i| i < to).count();
        let mut moving = Vec::with_capacity(sources.len());
        for &index in sources.iter().rev() {
            moving.push(profile.pinned_apps.remove(index));
        }
        moving.reverse();

        let insert_at = to - shift;
        profile.pinned_apps.splice(insert_at..insert_at, moving);
        profile.reindex();
        self.commit();
    }

    pub fn move_to_front(&mut self, identifier: &str) {
        self.refresh();
        let Some(profile) = self.active_profile_mut() else {
            return;
        };
        let Some(index) = profile
            .pinned_apps
            .iter()
            .position(|app| app.identifier == identifier)
        else {
            return;
        };
        let app = profile.pinned_apps.remove(index);
        profile.pinned_apps.insert(0, app);
        profile.reindex();
        self.commit();
    }

    pub fn toggle_pin(&mut self, identifier: &str, display_name: &str) {
        self.refresh();
        if self.is_pinned(identifier) {
            self.remove(identifier);
        } else {
            self.add(PinnedApp::new(identifier, display_name));
        }
    }

    // ---- служебное ----

    fn active_profile_mut(&mut self) -> Option<&mut Profile> {
        let id = self.active_profile_id?;
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    fn commit(&mut self) {
        self.persist();
        self.notify();
    }

    fn notify(&mut self) {
        self.revision += 1;
        let this: &ProfileStore = self;
        for listener in &this.listeners {
            listener(this);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.storage.set(PROFILES_KEY, &self.profiles) {
            error!("Не удалось сохранить профили: {}", e);
        }

        let active = match self.active_profile_id {
            Some(id) => self.storage.set(ACTIVE_PROFILE_KEY, &id.to_string()),
            None => self.storage.remove(ACTIVE_PROFILE_KEY),
        };
        if let Err(e) = active {
            error!("Не удалось сохранить активный профиль: {}", e);
        }

        let mapping: BTreeMap<String, String> = self
            .space_mapping
            .iter()
            .map(|(space, id)| (space.to_string(), id.to_string()))
            .collect();
        if let Err(e) = self.storage.set(SPACE_MAPPING_KEY, &mapping) {
            error!("Не удалось сохранить привязку рабочих столов: {}", e);
        }
    }

    fn load_state(&mut self) {
        self.space_mapping = self.load_space_mapping();

        if let Some(profiles) = self.storage.get::<Vec<Profile>>(PROFILES_KEY) {
            if !profiles.is_empty() {
                self.profiles = Self::sanitize(profiles);
                let stored_active = self
                    .storage
                    .get::<String>(ACTIVE_PROFILE_KEY)
                    .and_then(|raw| ProfileId::parse(&raw))
                    .filter(|id| self.profiles.iter().any(|p| p.id == *id));
                self.active_profile_id = stored_active.or_else(|| self.profiles.first().map(|p| p.id));

                // Миграция могла прерваться между записью и удалением старого блоба
                if self.storage.contains(LEGACY_PINS_KEY) {
                    self.drop_legacy();
                }
                info!("Загружено профилей: {}", self.profiles.len());
                return;
            }
            warn!("Сохранённый список профилей пуст");
        }

        if let Some(mut legacy) = self.storage.get::<Vec<PinnedApp>>(LEGACY_PINS_KEY) {
            legacy.sort_by_key(|app| app.sort_order);
            info!("Миграция {} закреплённых приложений в профиль '{}'", legacy.len(), DEFAULT_PROFILE_NAME);
            self.install_default(legacy);
            self.drop_legacy();
            return;
        }

        info!("Профилей нет, создаём '{}'", DEFAULT_PROFILE_NAME);
        self.install_default(Vec::new());
    }

    fn install_default(&mut self, apps: Vec<PinnedApp>) {
        let profile = Self::sanitize(vec![Profile::with_apps(DEFAULT_PROFILE_NAME, apps)])
            .remove(0);
        self.active_profile_id = Some(profile.id);
        self.profiles = vec![profile];
        self.persist();
    }

    fn drop_legacy(&self) {
        if let Err(e) = self.storage.remove(LEGACY_PINS_KEY) {
            error!("Не удалось удалить старый список закреплённых приложений: {}", e);
        }
    }

    fn load_space_mapping(&self) -> BTreeMap<SpaceId, ProfileId> {
        let raw = self
            .storage
            .get::<BTreeMap<String, String>>(SPACE_MAPPING_KEY)
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut mapping = BTreeMap::new();
        for (space, profile) in raw {
            let (Ok(space_id), Some(profile_id)) = (space.parse::<SpaceId>(), ProfileId::parse(&profile)) else {
                warn!("Пропущена некорректная привязка {} -> {}", space, profile);
                continue;
            };
            if seen.insert(profile_id) {
                mapping.insert(space_id, profile_id);
            }
        }
        mapping
    }

    /// Восстановить инварианты после чтения с диска
    fn sanitize(mut profiles: Vec<Profile>) -> Vec<Profile> {
        let mut ids = HashSet::new();
        profiles.retain(|p| ids.insert(p.id));
        for profile in profiles.iter_mut() {
            profile.pinned_apps.sort_by_key(|app| app.sort_order);
            let dropped = profile.dedup();
            if dropped > 0 {
                warn!("Профиль '{}': удалено {} дубликатов", profile.name, dropped);
            }
            profile.reindex();
        }
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct FixedDesktop(Option<SpaceId>);

    impl DesktopSource for FixedDesktop {
        fn current_space(&self) -> Option<SpaceId> {
            self.0
        }
    }

    fn store_on(storage: Storage, space: Option<SpaceId>) -> ProfileStore {
        ProfileStore::load(storage, Arc::new(FixedDesktop(space)))
    }

    fn fresh_store() -> ProfileStore {
        store_on(Storage::memory(), Some(1))
    }

    fn orders(store: &ProfileStore) -> Vec<usize> {
        store.apps().iter().map(|a| a.sort_order).collect()
    }

    fn identifiers(store: &ProfileStore) -> Vec<&str> {
        store.apps().iter().map(|a| a.identifier.as_str()).collect()
    }

    fn pin_three(store: &mut ProfileStore) {
        store.add(PinnedApp::new("firefox", "Firefox"));
        store.add(PinnedApp::new("kitty", "Kitty"));
        store.add(PinnedApp::new("code", "Code"));
    }

    #[test]
    fn empty_storage_yields_single_default_profile() {
        let store = fresh_store();

        assert_eq!(store.profiles().len(), 1);
        let active = store.active_profile().unwrap();
        assert_eq!(active.name, DEFAULT_PROFILE_NAME);
        assert!(active.pinned_apps.is_empty());
    }

    #[test]
    fn legacy_list_is_migrated_once() {
        let storage = Storage::memory();
        storage
            .set_raw(
                LEGACY_PINS_KEY,
                json!([
                    {"identifier": "code", "name": "Code", "order": 2},
                    {"identifier": "firefox", "name": "Firefox", "order": 0},
                    {"identifier": "kitty", "name": "Kitty", "order": 1}
                ]),
            )
            .unwrap();

        let store = store_on(storage.clone(), None);
        assert_eq!(store.profiles().len(), 1);
        assert_eq!(store.profiles()[0].name, DEFAULT_PROFILE_NAME);
        assert_eq!(identifiers(&store), vec!["firefox", "kitty", "code"]);
        assert!(!storage.contains(LEGACY_PINS_KEY));

        let id = store.active_profile_id();
        let reloaded = store_on(storage, None);
        assert_eq!(reloaded.active_profile_id(), id);
        assert_eq!(identifiers(&reloaded), vec!["firefox", "kitty", "code"]);
    }

    #[test]
    fn leftover_legacy_blob_is_removed_without_remigration() {
        let storage = Storage::memory();
        let first = store_on(storage.clone(), None);
        storage
            .set_raw(LEGACY_PINS_KEY, json!([{"identifier": "x", "name": "X", "order": 0}]))
            .unwrap();

        let second = store_on(storage.clone(), None);
        assert_eq!(second.active_profile_id(), first.active_profile_id());
        assert!(second.apps().is_empty());
        assert!(!storage.contains(LEGACY_PINS_KEY));
    }

    #[test]
    fn malformed_profiles_fall_back_to_default() {
        let storage = Storage::memory();
        storage.set_raw(PROFILES_KEY, json!({"oops": true})).unwrap();
        storage.set_raw(SPACE_MAPPING_KEY, json!(["bad"])).unwrap();

        let store = store_on(storage, None);
        assert_eq!(store.profiles().len(), 1);
        assert!(store.space_mapping().is_empty());
    }

    #[test]
    fn stale_active_id_falls_back_to_first_profile() {
        let storage = Storage::memory();
        let mut store = store_on(storage.clone(), None);
        let first = store.active_profile_id().unwrap();
        store.add_profile("Second");
        storage.set(ACTIVE_PROFILE_KEY, &ProfileId::generate().to_string()).unwrap();

        let reloaded = store_on(storage, None);
        assert_eq!(reloaded.active_profile_id(), Some(first));
    }

    #[test]
    fn first_added_profile_becomes_active() {
        let mut store = fresh_store();
        let default = store.active_profile_id().unwrap();
        store.delete_profile(default);
        assert_eq!(store.active_profile_id(), None);

        let id = store.add_profile("Work");
        assert_eq!(store.active_profile_id(), Some(id));

        let other = store.add_profile("Play");
        assert_eq!(store.active_profile_id(), Some(id));
        assert_ne!(other, id);
    }

    #[test]
    fn rename_and_set_active_ignore_unknown_ids() {
        let mut store = fresh_store();
        let active = store.active_profile_id().unwrap();
        let revision = store.revision();

        store.rename_profile(ProfileId::generate(), "Ghost");
        store.set_active_profile(ProfileId::generate());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.active_profile_id(), Some(active));

        store.rename_profile(active, "Main");
        assert_eq!(store.active_profile().unwrap().name, "Main");
    }

    #[test]
    fn deleting_active_profile_promotes_first_remaining() {
        let mut store = fresh_store();
        let default = store.active_profile_id().unwrap();
        let work = store.add_profile("Work");

        store.delete_profile(default);
        assert_eq!(store.active_profile_id(), Some(work));

        store.delete_profile(work);
        assert_eq!(store.active_profile_id(), None);
        assert!(store.apps().is_empty());
    }

    #[test]
    fn deleting_profile_drops_its_space_mapping() {
        let mut store = fresh_store();
        let work = store.add_profile("Work");
        store.assign_profile_to_current_space(work);
        assert_eq!(store.profile_for_space(1), Some(work));

        store.delete_profile(work);
        assert!(store.space_mapping().is_empty());
        assert_eq!(store.profile_for_space(1), None);
    }

    #[test]
    fn space_mapping_stays_injective_by_profile() {
        let storage = Storage::memory();
        let desktop = Arc::new(Mutex::new(Some(1)));

        struct SharedDesktop(Arc<Mutex<Option<SpaceId>>>);
        impl DesktopSource for SharedDesktop {
            fn current_space(&self) -> Option<SpaceId> {
                *self.0.lock()
            }
        }

        let mut store = ProfileStore::load(storage, Arc::new(SharedDesktop(desktop.clone())));
        let default = store.active_profile_id().unwrap();
        let work = store.add_profile("Work");

        store.assign_profile_to_current_space(work);
        *desktop.lock() = Some(2);
        store.assign_profile_to_current_space(work);
        store.assign_profile_to_current_space(default);
        *desktop.lock() = Some(3);
        store.assign_profile_to_current_space(default);

        let targets: Vec<ProfileId> = store.space_mapping().values().copied().collect();
        let unique: HashSet<ProfileId> = targets.iter().copied().collect();
        assert_eq!(targets.len(), unique.len());
        assert_eq!(store.space_for_profile(work), None);
        assert_eq!(store.space_for_profile(default), Some(3));
    }

    #[test]
    fn space_operations_need_a_known_desktop() {
        let mut store = store_on(Storage::memory(), None);
        let id = store.active_profile_id().unwrap();
        let revision = store.revision();

        store.assign_profile_to_current_space(id);
        store.unassign_profile_from_space(id);
        assert!(store.space_mapping().is_empty());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn unassign_removes_mapping() {
        let mut store = fresh_store();
        let id = store.active_profile_id().unwrap();
        store.assign_profile_to_current_space(id);
        store.unassign_profile_from_space(id);
        assert_eq!(store.space_for_profile(id), None);
    }

    #[test]
    fn apply_space_switches_active_profile() {
        let mut store = fresh_store();
        let default = store.active_profile_id().unwrap();
        let work = store.add_profile("Work");
        store.assign_profile_to_current_space(work);

        assert!(store.apply_space(1));
        assert_eq!(store.active_profile_id(), Some(work));
        assert!(!store.apply_space(1));
        assert!(!store.apply_space(42));
        assert_ne!(store.active_profile_id(), Some(default));
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let mut store = fresh_store();
        pin_three(&mut store);
        let revision = store.revision();

        store.add(PinnedApp::new("kitty", "Another Kitty"));
        assert_eq!(identifiers(&store), vec!["firefox", "kitty", "code"]);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn pin_mutations_keep_dense_order() {
        let mut store = fresh_store();
        pin_three(&mut store);
        store.add(PinnedApp::new("gimp", "GIMP"));
        assert_eq!(orders(&store), vec![0, 1, 2, 3]);

        store.remove("kitty");
        assert_eq!(identifiers(&store), vec!["firefox", "code", "gimp"]);
        assert_eq!(orders(&store), vec![0, 1, 2]);

        store.move_to_front("gimp");
        assert_eq!(identifiers(&store), vec!["gimp", "firefox", "code"]);
        assert_eq!(orders(&store), vec![0, 1, 2]);

        store.move_apps(&[0], 3);
        assert_eq!(identifiers(&store), vec!["firefox", "code", "gimp"]);
        assert_eq!(orders(&store), vec![0, 1, 2]);
    }

    #[test]
    fn move_apps_follows_offset_semantics() {
        let mut store = fresh_store();
        pin_three(&mut store);
        store.add(PinnedApp::new("gimp", "GIMP"));

        store.move_apps(&[1, 3], 0);
        assert_eq!(identifiers(&store), vec!["kitty", "gimp", "firefox", "code"]);

        store.move_apps(&[0, 1], 3);
        assert_eq!(identifiers(&store), vec!["firefox", "kitty", "gimp", "code"]);

        store.move_apps(&[9], 0);
        assert_eq!(identifiers(&store), vec!["firefox", "kitty", "gimp", "code"]);
    }

    #[test]
    fn toggle_pin_adds_then_removes() {
        let mut store = fresh_store();
        store.toggle_pin("firefox", "Firefox");
        assert!(store.is_pinned("firefox"));
        store.toggle_pin("firefox", "Firefox");
        assert!(!store.is_pinned("firefox"));
    }

    #[test]
    fn pin_mutations_without_active_profile_are_noops() {
        let mut store = fresh_store();
        let id = store.active_profile_id().unwrap();
        store.delete_profile(id);
        let revision = store.revision();

        store.add(PinnedApp::new("firefox", "Firefox"));
        store.move_to_front("firefox");
        store.toggle_pin("kitty", "Kitty");
        assert!(store.apps().is_empty());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn mutations_are_persisted_and_notified() {
        let storage = Storage::memory();
        let mut store = store_on(storage.clone(), Some(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(Box::new(move |s: &ProfileStore| sink.lock().push(s.apps().len())));

        pin_three(&mut store);
        let id = store.active_profile_id().unwrap();
        store.assign_profile_to_current_space(id);

        assert_eq!(*seen.lock(), vec![1, 2, 3, 3]);

        let reloaded = store_on(storage, None);
        assert_eq!(identifiers(&reloaded), vec!["firefox", "kitty", "code"]);
        assert_eq!(reloaded.profile_for_space(5), Some(id));
    }

    #[test]
    fn edits_from_another_process_survive_daemon_writes() {
        let dir = std::env::temp_dir().join(format!("hopswitch-store-{}", uuid::Uuid::new_v4()));
        let path = dir.join("state.json");

        let mut daemon = store_on(Storage::open_file(&path), Some(2));
        let mut cli = store_on(Storage::open_file(&path), None);
        cli.add(PinnedApp::new("kitty", "Kitty"));

        let work = daemon.add_profile("Work");
        daemon.assign_profile_to_current_space(work);
        assert_eq!(identifiers(&daemon), vec!["kitty"]);

        let reopened = store_on(Storage::open_file(&path), None);
        assert_eq!(identifiers(&reopened), vec!["kitty"]);
        assert_eq!(reopened.profiles().len(), 2);
        assert_eq!(reopened.profile_for_space(2), Some(work));

        // Без правок извне refresh ничего не перечитывает
        assert!(!daemon.refresh());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn loaded_duplicates_are_repaired() {
        let storage = Storage::memory();
        let id = ProfileId::generate();
        storage
            .set_raw(
                PROFILES_KEY,
                json!([{
                    "id": id.to_string(),
                    "name": "Work",
                    "pins": [
                        {"identifier": "kitty", "name": "Kitty", "order": 4},
                        {"identifier": "firefox", "name": "Firefox", "order": 1},
                        {"identifier": "kitty", "name": "Kitty", "order": 9}
                    ]
                }]),
            )
            .unwrap();

        let store = store_on(storage, None);
        assert_eq!(identifiers(&store), vec!["firefox", "kitty"]);
        assert_eq!(orders(&store), vec![0, 1]);
    }
}
