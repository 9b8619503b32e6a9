use serde::{Deserialize, Serialize};
use std::fmt;

/// Key identity as delivered by a capture backend.
///
/// Backends pick whichever variant they can report reliably. The Windows hook
/// reports virtual-key codes, the rdev listener reports characters for
/// printable keys and [`NamedKey`] for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKey {
    /// Character code of a printable key, or a control byte when Ctrl is held.
    Char(u32),
    /// Non-printable key with a well-known name.
    Named(NamedKey),
    /// Platform virtual-key / key code.
    VirtualKey(u32),
}

impl RawKey {
    pub fn from_char(c: char) -> Self {
        Self::Char(c as u32)
    }

    /// Form used for held-key bookkeeping.
    ///
    /// Ctrl and Shift change the code a backend reports for the same physical
    /// letter (`0x01`, `'A'`, `'a'`), so press and release may disagree.
    /// Collapsing them keeps the held set consistent.
    pub fn identity(self) -> Self {
        match self {
            Self::Char(code @ 1..=26) => Self::Char(code - 1 + 'a' as u32),
            Self::Char(code) if (b'A' as u32..=b'Z' as u32).contains(&code) => {
                Self::Char(code + 32)
            }
            other => other,
        }
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(code) => match char::from_u32(*code) {
                Some(c) if !c.is_control() => write!(f, "{c}"),
                _ => write!(f, "u+{code:04x}"),
            },
            Self::Named(named) => write!(f, "{named:?}"),
            Self::VirtualKey(code) => write!(f, "vk{code}"),
        }
    }
}

/// Keys that have no printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    ControlLeft,
    ControlRight,
    ShiftLeft,
    ShiftRight,
    AltLeft,
    AltRight,
    MetaLeft,
    MetaRight,
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    CapsLock,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    PrintScreen,
    ScrollLock,
    Pause,
    NumLock,
    Menu,
    Function,
    /// F1..F24
    F(u8),
    /// Keypad digit 0..9
    Numpad(u8),
    NumpadEnter,
    NumpadAdd,
    NumpadSubtract,
    NumpadMultiply,
    NumpadDivide,
    NumpadDecimal,
}

/// How a key takes part in chord assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Modifier,
    Regular,
}

/// Labels of one completed keypress: held modifiers in press order, then the
/// regular key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord(pub Vec<String>);

impl Chord {
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_collapses_ctrl_and_shift_variants() {
        let plain = RawKey::from_char('a');
        assert_eq!(RawKey::Char(0x01).identity(), plain);
        assert_eq!(RawKey::from_char('A').identity(), plain);
        assert_eq!(plain.identity(), plain);
        assert_eq!(
            RawKey::VirtualKey(0x41).identity(),
            RawKey::VirtualKey(0x41)
        );
    }

    #[test]
    fn chord_display_joins_with_plus() {
        let chord = Chord(vec!["CTRL".into(), "SHIFT".into(), "A".into()]);
        assert_eq!(chord.to_string(), "CTRL+SHIFT+A");
        assert_eq!(chord.len(), 3);
    }
}
