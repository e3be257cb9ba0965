use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
mod app;
mod cli;
mod config;
mod error;
mod events;
mod services;
mod shortcut;
mod store;
mod utils;

use app::App;
use config::Config;
use shortcut::ShortcutPreset;

#[derive(Parser, Debug)]
#[command(name = "hopswitch")]
#[command(about = "Переключатель закреплённых приложений по удерживаемому модификатору")]
#[command(version)]
struct Args {
    /// Путь к файлу конфигурации (по умолчанию ~/.config/hopswitch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Режим сухого запуска (без захвата клавиатуры и реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Запустить переключатель (по умолчанию)
    Run,
    /// Профили закреплённых приложений
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Закреплённые приложения активного профиля
    #[command(subcommand)]
    Pin(PinCommand),
    /// Комбинация клавиш
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Переносить выбранное приложение в начало списка
    RecentFirst {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Показать сохранённое состояние
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    List,
    Add {
        name: String,
    },
    Rename {
        /// Имя или id профиля
        profile: String,
        name: String,
    },
    Delete {
        profile: String,
    },
    /// Сделать профиль активным
    Use {
        profile: String,
    },
    /// Назначить профиль рабочему столу
    Assign {
        profile: String,
        /// Номер стола; по умолчанию текущий
        #[arg(long)]
        desktop: Option<i64>,
    },
    /// Снять назначение с текущего рабочего стола
    Unassign {
        profile: String,
        #[arg(long)]
        desktop: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PinCommand {
    List,
    Add {
        /// WM_CLASS или id .desktop-файла
        identifier: String,
        /// Отображаемое имя; по умолчанию идентификатор
        #[arg(long)]
        name: Option<String>,
    },
    Remove {
        identifier: String,
    },
    /// Переставить элементы с позиций FROM перед позицией --to
    Move {
        #[arg(required = true)]
        from: Vec<usize>,
        #[arg(long)]
        to: usize,
    },
    Front {
        identifier: String,
    },
    Toggle {
        identifier: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    List,
    Set {
        #[arg(value_enum)]
        preset: ShortcutPreset,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("Запуск HopSwitch v{}", env!("CARGO_PKG_VERSION"));
            info!("Конфигурация: {:?}", config_path);
            if args.dry_run {
                warn!("Режим сухого запуска - реальные действия отключены");
            }
            App::new(Arc::new(config), args.dry_run)?.run().await?;
        }
        command => cli::execute(command, &config).await?,
    }

    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    // stdout остаётся за выводом подкоманд
    if format == "full" {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
