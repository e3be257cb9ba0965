//! Подкоманды управления: работают с тем же файлом состояния, что и
//! демон. Запущенный демон подхватывает изменения по SIGHUP.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::services::desktop_detector::probe_current_desktop;
use crate::services::{DesktopState, InputPermissions, PermissionProbe};
use crate::shortcut::ShortcutPreset;
use crate::store::{PinnedApp, Preferences, ProfileId, ProfileStore, Storage};
use crate::{Command, PinCommand, PresetCommand, ProfileCommand, Toggle};

pub async fn execute(command: Command, config: &Config) -> Result<()> {
    let storage = Storage::open_file(config.state_file());
    let preferences = Preferences::new(storage.clone());
    let desktop = DesktopState::new();

    match command {
        Command::Run => bail!("run обрабатывается в main"),
        Command::Profile(command) => {
            if let Some(requested) = command.desktop() {
                desktop.set(Some(requested));
            } else if command.needs_desktop() {
                desktop.set(probe_current_desktop(&config.desktop.detection).await);
            }
            let mut store = ProfileStore::load(storage, Arc::new(desktop));
            profile(command, &mut store)?;
        }
        Command::Pin(command) => {
            let mut store = ProfileStore::load(storage, Arc::new(desktop));
            pin(command, &mut store);
        }
        Command::Preset(PresetCommand::List) => {
            let current = preferences.shortcut_preset();
            for preset in ShortcutPreset::ALL {
                let marker = if preset == current { "*" } else { " " };
                println!("{} {:<10} {}", marker, preset.as_str(), preset.display_name());
            }
        }
        Command::Preset(PresetCommand::Set { preset }) => {
            preferences.set_shortcut_preset(preset);
            info!("Пресет сохранён: {}", preset);
        }
        Command::RecentFirst { state } => {
            preferences.set_recent_app_first(state == Toggle::On);
        }
        Command::Status => {
            let store = ProfileStore::load(storage, Arc::new(desktop));
            status(config, &preferences, &store);
        }
    }

    Ok(())
}

impl ProfileCommand {
    fn desktop(&self) -> Option<i64> {
        match self {
            ProfileCommand::Assign { desktop, .. } | ProfileCommand::Unassign { desktop, .. } => *desktop,
            _ => None,
        }
    }

    fn needs_desktop(&self) -> bool {
        matches!(self, ProfileCommand::Assign { .. } | ProfileCommand::Unassign { .. })
    }
}

fn profile(command: ProfileCommand, store: &mut ProfileStore) -> Result<()> {
    match command {
        ProfileCommand::List => {
            let active = store.active_profile_id();
            for profile in store.profiles() {
                let marker = if Some(profile.id) == active { "*" } else { " " };
                let desktop = store
                    .space_for_profile(profile.id)
                    .map(|d| format!("стол {}", d))
                    .unwrap_or_default();
                println!(
                    "{} {}  {:<20} {:>3} прил.  {}",
                    marker,
                    profile.id,
                    profile.name,
                    profile.pinned_apps.len(),
                    desktop
                );
            }
        }
        ProfileCommand::Add { name } => {
            let id = store.add_profile(&name);
            println!("{}", id);
        }
        ProfileCommand::Rename { profile, name } => {
            let id = resolve_profile(store, &profile)?;
            store.rename_profile(id, &name);
        }
        ProfileCommand::Delete { profile } => {
            let id = resolve_profile(store, &profile)?;
            store.delete_profile(id);
        }
        ProfileCommand::Use { profile } => {
            let id = resolve_profile(store, &profile)?;
            store.set_active_profile(id);
        }
        ProfileCommand::Assign { profile, .. } => {
            let id = resolve_profile(store, &profile)?;
            store.assign_profile_to_current_space(id);
        }
        ProfileCommand::Unassign { profile, .. } => {
            let id = resolve_profile(store, &profile)?;
            store.unassign_profile_from_space(id);
        }
    }
    Ok(())
}

fn pin(command: PinCommand, store: &mut ProfileStore) {
    match command {
        PinCommand::List => {
            for app in store.apps() {
                println!("{:>3}  {:<24} {}", app.sort_order, app.identifier, app.display_name);
            }
        }
        PinCommand::Add { identifier, name } => {
            let name = name.unwrap_or_else(|| identifier.clone());
            store.add(PinnedApp::new(identifier, name));
        }
        PinCommand::Remove { identifier } => store.remove(&identifier),
        PinCommand::Move { from, to } => store.move_apps(&from, to),
        PinCommand::Front { identifier } => store.move_to_front(&identifier),
        PinCommand::Toggle { identifier, name } => {
            let name = name.unwrap_or_else(|| identifier.clone());
            store.toggle_pin(&identifier, &name);
        }
    }
}

fn status(config: &Config, preferences: &Preferences, store: &ProfileStore) {
    println!("Файл состояния:   {:?}", config.state_file());
    println!("Горячая клавиша:  {}", preferences.shortcut_preset());
    println!(
        "Недавнее первым:  {}",
        if preferences.recent_app_first() { "вкл" } else { "выкл" }
    );
    println!(
        "Доступ к вводу:   {}",
        if InputPermissions.is_trusted() { "есть" } else { "нет" }
    );
    match store.active_profile() {
        Some(profile) => {
            println!("Активный профиль: {} ({} прил.)", profile.name, profile.pinned_apps.len())
        }
        None => println!("Активный профиль: нет"),
    }
    for (desktop, profile_id) in store.space_mapping() {
        let name = store
            .profile(*profile_id)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        println!("  стол {} -> {}", desktop, name);
    }
}

/// Профиль по id или по имени; имя должно быть однозначным
fn resolve_profile(store: &ProfileStore, reference: &str) -> Result<ProfileId> {
    if let Some(id) = ProfileId::parse(reference) {
        if store.profile(id).is_some() {
            return Ok(id);
        }
    }

    let mut matches = store.profiles().iter().filter(|p| p.name == reference);
    match (matches.next(), matches.next()) {
        (Some(profile), None) => Ok(profile.id),
        (Some(_), Some(_)) => bail!("Несколько профилей с именем '{}', укажите id", reference),
        (None, _) => bail!("Профиль '{}' не найден", reference),
    }
}
