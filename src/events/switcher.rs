use super::keyboard::KeyEvent;
use std::fmt;

/// Событие от низкоуровневого захвата в том виде, в котором его видит автомат
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedEvent {
    /// Клавиатурное событие с модификаторами после его применения
    Key(KeyEvent),
    /// Захват приостановлен ядром или сбоем чтения, нужно перевооружиться
    Suspended,
}

/// Что сделать с событием после классификации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Пробросить дальше в систему
    Pass,
    /// Поглотить: ни одно приложение не увидит событие
    Swallow,
}

/// Намерение переключателя, которое автомат отдаёт контроллеру сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitcherIntent {
    Activate,
    CycleForward,
    CycleBackward,
    Commit,
    Cancel,
}

impl fmt::Display for SwitcherIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwitcherIntent::Activate => "activate",
            SwitcherIntent::CycleForward => "cycle-forward",
            SwitcherIntent::CycleBackward => "cycle-backward",
            SwitcherIntent::Commit => "commit",
            SwitcherIntent::Cancel => "cancel",
        };
        f.write_str(name)
    }
}
