//! Хранилище ключ/значение для профилей и настроек.
//!
//! Каждый ключ хранит независимый JSON-блоб. Чтение никогда не падает:
//! отсутствующий или битый блоб читается как `None`, а вызывающий код сам
//! выбирает минимальное валидное значение по умолчанию.

use crate::error::Result;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const APP_DIR: &str = "hopswitch";
pub const STATE_FILENAME: &str = "state.json";

/// Бэкенд, который умеет хранить блобы по ключу
pub trait KeyValueBackend: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Подтянуть изменения, сделанные другим процессом; true, если данные изменились
    fn refresh(&mut self) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, Value>,
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Все ключи в одном JSON-документе; запись через временный файл и rename.
///
/// Файл делят демон и подкоманды CLI, поэтому каждая запись сначала
/// перечитывает документ и меняет в нём только свой ключ.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl JsonFileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_values(&path);
        info!("Состояние загружено из {:?} ({} ключей)", path, values.len());
        Self { path, values }
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(STATE_FILENAME);
        path
    }

    fn read_values(path: &Path) -> BTreeMap<String, Value> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Файл состояния {:?} не прочитан: {}", path, e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(values) => values,
            Err(e) => {
                warn!("Файл состояния {:?} повреждён, начинаем с пустого: {}", path, e);
                BTreeMap::new()
            }
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&self.values)?;
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Состояние записано в {:?}", self.path);
        Ok(())
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.refresh()?;
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.refresh()?;
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<bool> {
        let fresh = Self::read_values(&self.path);
        if fresh == self.values {
            return Ok(false);
        }
        debug!("Файл состояния {:?} изменён извне", self.path);
        self.values = fresh;
        Ok(true)
    }
}

/// Разделяемый дескриптор хранилища с типизированным доступом
#[derive(Clone)]
pub struct Storage {
    backend: Arc<Mutex<Box<dyn KeyValueBackend>>>,
}

impl Storage {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::open(path))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.backend.lock().get(key).is_some()
    }

    /// Прочитать значение; битые данные считаются отсутствующими
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.backend.lock().get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Не удалось разобрать ключ '{}', используем значение по умолчанию: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.backend.lock().set(key, value)
    }

    pub fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        self.backend.lock().set(key, value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.lock().remove(key)
    }

    /// Перечитать источник; true, если другой процесс что-то поменял
    pub fn refresh(&self) -> Result<bool> {
        self.backend.lock().refresh()
    }
}
