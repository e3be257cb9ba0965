use crate::store::{DesktopSource, SpaceId};
use parking_lot::RwLock;
use std::sync::Arc;

/// Последний известный рабочий стол. Пишет только детектор, читают
/// хранилище профилей и цикл событий; чтение дешёвое и не ждёт утилит.
#[derive(Debug, Clone, Default)]
pub struct DesktopState {
    current: Arc<RwLock<Option<SpaceId>>>,
}

impl DesktopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<SpaceId> {
        *self.current.read()
    }

    /// Возвращает true, если значение изменилось
    pub fn set(&self, desktop: Option<SpaceId>) -> bool {
        let mut current = self.current.write();
        if *current == desktop {
            return false;
        }
        *current = desktop;
        true
    }
}

impl DesktopSource for DesktopState {
    fn current_space(&self) -> Option<SpaceId> {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_changes_only() {
        let state = DesktopState::new();
        assert_eq!(state.current_space(), None);

        assert!(state.set(Some(2)));
        assert!(!state.set(Some(2)));
        assert_eq!(state.current_space(), Some(2));

        assert!(state.set(None));
        assert_eq!(state.get(), None);
    }

    #[test]
    fn clones_share_the_value() {
        let state = DesktopState::new();
        let reader = state.clone();
        state.set(Some(7));
        assert_eq!(reader.current_space(), Some(7));
    }
}
