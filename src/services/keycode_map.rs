use crate::events::{KeyCode, ModifierKey};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Маппинг между именами клавиш и кодами evdev
pub struct KeycodeMap;

// Статическая карта клавиш, которые нужны переключателю
static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // Триггеры и отмена
    map.insert("escape", 1); // KEY_ESC
    map.insert("tab", 15); // KEY_TAB
    map.insert("grave", 41); // KEY_GRAVE
    map.insert("space", 57); // KEY_SPACE
    map.insert("enter", 28); // KEY_ENTER

    // Модификаторы (левые и правые)
    map.insert("leftctrl", 29); // KEY_LEFTCTRL
    map.insert("rightctrl", 97); // KEY_RIGHTCTRL
    map.insert("leftalt", 56); // KEY_LEFTALT
    map.insert("rightalt", 100); // KEY_RIGHTALT
    map.insert("leftshift", 42); // KEY_LEFTSHIFT
    map.insert("rightshift", 54); // KEY_RIGHTSHIFT
    map.insert("leftmeta", 125); // KEY_LEFTMETA
    map.insert("rightmeta", 126); // KEY_RIGHTMETA

    // Клавиши-маски: не назначены ни в одной раскладке
    map.insert("f13", 183); // KEY_F13
    map.insert("f14", 184); // KEY_F14
    map.insert("f20", 190); // KEY_F20
    map.insert("f24", 194); // KEY_F24
    map.insert("unknown", 240); // KEY_UNKNOWN

    map
});

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    KEY_NAME_TO_CODE
        .iter()
        .map(|(&name, &code)| (code, name))
        .collect()
});

impl KeycodeMap {
    /// Получить код клавиши по её имени
    pub fn get_keycode(key_name: &str) -> Result<KeyCode, String> {
        let normalized = key_name.to_lowercase();
        KEY_NAME_TO_CODE
            .get(normalized.as_str())
            .map(|&code| KeyCode(code))
            .ok_or_else(|| format!("Unknown key: {}", key_name))
    }

    /// Получить имя клавиши по её коду
    pub fn get_key_name(keycode: KeyCode) -> Option<&'static str> {
        CODE_TO_KEY_NAME.get(&keycode.value()).copied()
    }

    /// Какой модификатор (если есть) обозначает данный код
    pub fn modifier_of(keycode: KeyCode) -> Option<ModifierKey> {
        match keycode.value() {
            29 | 97 => Some(ModifierKey::Ctrl),
            56 | 100 => Some(ModifierKey::Alt),
            42 | 54 => Some(ModifierKey::Shift),
            125 | 126 => Some(ModifierKey::Super),
            _ => None,
        }
    }

    pub fn is_modifier(keycode: KeyCode) -> bool {
        Self::modifier_of(keycode).is_some()
    }
}
