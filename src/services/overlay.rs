use crate::store::PinnedApp;
use tracing::info;

/// Плавающая полоса переключателя. Все вызовы «выстрелил и забыл».
pub trait Overlay: Send {
    fn show(&mut self, apps: &[PinnedApp], selected: usize);
    fn update(&mut self, apps: &[PinnedApp], selected: usize);
    fn dismiss(&mut self);
}

/// Рисует полосу строкой журнала: `Firefox  [Kitty]  Code`
#[derive(Debug, Default)]
pub struct LogOverlay {
    visible: bool,
}

impl LogOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Overlay for LogOverlay {
    fn show(&mut self, apps: &[PinnedApp], selected: usize) {
        self.visible = true;
        info!(target: "hopswitch::overlay", "▶ {}", render_strip(apps, selected));
    }

    fn update(&mut self, apps: &[PinnedApp], selected: usize) {
        if self.visible {
            info!(target: "hopswitch::overlay", "  {}", render_strip(apps, selected));
        }
    }

    fn dismiss(&mut self) {
        if self.visible {
            self.visible = false;
            info!(target: "hopswitch::overlay", "■ переключатель закрыт");
        }
    }
}

pub fn render_strip(apps: &[PinnedApp], selected: usize) -> String {
    apps.iter()
        .enumerate()
        .map(|(index, app)| {
            if index == selected {
                format!("[{}]", app.display_name)
            } else {
                app.display_name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
