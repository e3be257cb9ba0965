//! Контроллер сессии переключателя: превращает намерения автомата в
//! показ полосы, смену выбора и активацию приложения.

use crate::events::SwitcherIntent;
use crate::store::{Preferences, ProfileStore};
use tracing::debug;

use super::app_activator::AppActivator;
use super::overlay::Overlay;

pub struct SwitcherSession {
    overlay: Box<dyn Overlay>,
    activator: Box<dyn AppActivator>,
    preferences: Preferences,
    selected_index: usize,
    visible: bool,
}

impl SwitcherSession {
    pub fn new(
        overlay: Box<dyn Overlay>,
        activator: Box<dyn AppActivator>,
        preferences: Preferences,
    ) -> Self {
        Self {
            overlay,
            activator,
            preferences,
            selected_index: 0,
            visible: false,
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handle(&mut self, intent: SwitcherIntent, store: &mut ProfileStore) {
        debug!("Намерение переключателя: {}", intent);
        match intent {
            SwitcherIntent::Activate => self.activate(store),
            SwitcherIntent::CycleForward => self.cycle(store, true),
            SwitcherIntent::CycleBackward => self.cycle(store, false),
            SwitcherIntent::Commit => self.commit(store),
            SwitcherIntent::Cancel => self.cancel(),
        }
    }

    fn activate(&mut self, store: &mut ProfileStore) {
        // Закрепления могли поменять из CLI
        store.refresh();
        let apps = store.apps();
        if apps.is_empty() {
            debug!("Нет закреплённых приложений, сессия не открывается");
            return;
        }
        // Самое недавнее приложение и так на экране: сразу выделяем второе
        self.selected_index = if apps.len() > 1 { 1 } else { 0 };
        self.visible = true;
        self.overlay.show(apps, self.selected_index);
    }

    fn cycle(&mut self, store: &ProfileStore, forward: bool) {
        let apps = store.apps();
        if !self.visible || apps.is_empty() {
            return;
        }
        let count = apps.len();
        let current = self.selected_index % count;
        self.selected_index = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        self.overlay.update(apps, self.selected_index);
    }

    fn commit(&mut self, store: &mut ProfileStore) {
        if !self.visible {
            return;
        }
        // Список мог уменьшиться за время сессии
        let Some(app) = store.apps().get(self.selected_index).cloned() else {
            debug!("Выбор {} вне списка, отмена", self.selected_index);
            self.cancel();
            return;
        };

        self.visible = false;
        self.overlay.dismiss();
        self.activator.activate(&app);
        if self.preferences.recent_app_first() {
            store.move_to_front(&app.identifier);
        }
    }

    fn cancel(&mut self) {
        if self.visible {
            self.visible = false;
            self.overlay.dismiss();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::desktop_detector::DesktopState;
    use crate::store::{PinnedApp, Storage};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Show(usize),
        Update(usize),
        Dismiss,
        Activate(String),
    }

    type Journal = Arc<Mutex<Vec<Call>>>;

    struct RecordingOverlay(Journal);

    impl Overlay for RecordingOverlay {
        fn show(&mut self, _apps: &[PinnedApp], selected: usize) {
            self.0.lock().push(Call::Show(selected));
        }

        fn update(&mut self, _apps: &[PinnedApp], selected: usize) {
            self.0.lock().push(Call::Update(selected));
        }

        fn dismiss(&mut self) {
            self.0.lock().push(Call::Dismiss);
        }
    }

    struct RecordingActivator(Journal);

    impl AppActivator for RecordingActivator {
        fn activate(&self, app: &PinnedApp) {
            self.0.lock().push(Call::Activate(app.identifier.clone()));
        }
    }

    struct Fixture {
        session: SwitcherSession,
        store: ProfileStore,
        preferences: Preferences,
        journal: Journal,
    }

    fn fixture(apps: &[&str]) -> Fixture {
        let storage = Storage::memory();
        let preferences = Preferences::new(storage.clone());
        let mut store = ProfileStore::load(storage, Arc::new(DesktopState::new()));
        for app in apps {
            store.add(PinnedApp::new(*app, app.to_uppercase()));
        }
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let session = SwitcherSession::new(
            Box::new(RecordingOverlay(journal.clone())),
            Box::new(RecordingActivator(journal.clone())),
            preferences.clone(),
        );
        Fixture {
            session,
            store,
            preferences,
            journal,
        }
    }

    impl Fixture {
        fn send(&mut self, intent: SwitcherIntent) {
            self.session.handle(intent, &mut self.store);
        }

        fn calls(&self) -> Vec<Call> {
            self.journal.lock().clone()
        }

        fn identifiers(&self) -> Vec<String> {
            self.store.apps().iter().map(|a| a.identifier.clone()).collect()
        }
    }

    #[test]
    fn activation_preselects_second_and_cycles_wrap() {
        let mut f = fixture(&["a", "b", "c"]);
        f.send(SwitcherIntent::Activate);
        assert_eq!(f.session.selected_index(), 1);
        f.send(SwitcherIntent::CycleForward);
        f.send(SwitcherIntent::CycleForward);
        assert_eq!(f.session.selected_index(), 0);
        f.send(SwitcherIntent::CycleBackward);
        assert_eq!(f.session.selected_index(), 2);

        assert_eq!(
            f.calls(),
            vec![Call::Show(1), Call::Update(2), Call::Update(0), Call::Update(2)]
        );
    }

    #[test]
    fn cycling_is_a_cyclic_group_action() {
        let names = ["a", "b", "c", "d", "e"];
        for count in 1..=names.len() {
            let mut f = fixture(&names[..count]);
            f.send(SwitcherIntent::Activate);
            let start = f.session.selected_index();

            for _ in 0..count {
                f.send(SwitcherIntent::CycleForward);
            }
            assert_eq!(f.session.selected_index(), start, "{} apps", count);

            f.send(SwitcherIntent::CycleForward);
            f.send(SwitcherIntent::CycleBackward);
            assert_eq!(f.session.selected_index(), start, "{} apps", count);

            f.send(SwitcherIntent::CycleBackward);
            f.send(SwitcherIntent::CycleForward);
            assert_eq!(f.session.selected_index(), start, "{} apps", count);
        }
    }

    #[test]
    fn activation_after_last_profile_deleted_is_ignored() {
        let mut f = fixture(&["a", "b"]);
        let only = f.store.active_profile_id().unwrap();
        f.store.delete_profile(only);
        assert_eq!(f.store.active_profile_id(), None);

        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::CycleForward);
        f.send(SwitcherIntent::Commit);

        assert!(f.calls().is_empty());
        assert!(!f.session.is_visible());
    }

    #[test]
    fn single_app_selects_it() {
        let mut f = fixture(&["only"]);
        f.send(SwitcherIntent::Activate);
        assert_eq!(f.session.selected_index(), 0);
        f.send(SwitcherIntent::CycleForward);
        assert_eq!(f.session.selected_index(), 0);
    }

    #[test]
    fn empty_profile_shows_nothing() {
        let mut f = fixture(&[]);
        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::CycleForward);
        f.send(SwitcherIntent::Commit);
        assert!(f.calls().is_empty());
        assert!(!f.session.is_visible());
    }

    #[test]
    fn commit_activates_selection_without_reordering_by_default() {
        let mut f = fixture(&["a", "b", "c"]);
        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::Commit);

        assert_eq!(
            f.calls(),
            vec![Call::Show(1), Call::Dismiss, Call::Activate("b".to_string())]
        );
        assert_eq!(f.identifiers(), vec!["a", "b", "c"]);
        assert!(!f.session.is_visible());
    }

    #[test]
    fn recent_first_moves_committed_app_to_front() {
        let mut f = fixture(&["a", "b", "c"]);
        f.preferences.set_recent_app_first(true);
        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::CycleForward);
        f.send(SwitcherIntent::Commit);

        assert_eq!(f.identifiers(), vec!["c", "a", "b"]);
        let orders: Vec<usize> = f.store.apps().iter().map(|a| a.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn commit_after_list_shrank_is_a_cancel() {
        let mut f = fixture(&["a", "b", "c"]);
        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::CycleForward);
        f.store.remove("c");
        f.store.remove("b");
        f.send(SwitcherIntent::Commit);

        assert_eq!(f.calls(), vec![Call::Show(1), Call::Update(2), Call::Dismiss]);
        assert_eq!(f.identifiers(), vec!["a"]);
    }

    #[test]
    fn cancel_dismisses_without_touching_store() {
        let mut f = fixture(&["a", "b"]);
        let revision = f.store.revision();
        f.send(SwitcherIntent::Activate);
        f.send(SwitcherIntent::Cancel);

        assert_eq!(f.calls(), vec![Call::Show(1), Call::Dismiss]);
        assert_eq!(f.store.revision(), revision);
    }
}
