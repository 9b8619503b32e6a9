use crate::types::{NamedKey, RawKey, Role};
use std::collections::HashMap;

/// Labels whose keys act as chord modifiers.
pub const MODIFIER_LABELS: &[&str] = &["CTRL", "ALT", "SHIFT"];

/// Windows virtual-key codes that are neither letters nor top-row digits.
/// Letters (0x41..=0x5A) and digits (0x30..=0x39) are derived arithmetically.
pub const VK_LABELS: &[(u32, &str)] = &[
    (0x08, "BACKSPACE"),
    (0x09, "TAB"),
    (0x0D, "ENTER"),
    (0x10, "SHIFT"),
    (0x11, "CTRL"),
    (0x12, "ALT"),
    (0x13, "PAUSE"),
    (0x14, "CAPS_LOCK"),
    (0x1B, "ESC"),
    (0x20, "SPACE"),
    (0x21, "PAGE_UP"),
    (0x22, "PAGE_DOWN"),
    (0x23, "END"),
    (0x24, "HOME"),
    (0x25, "LEFT"),
    (0x26, "UP"),
    (0x27, "RIGHT"),
    (0x28, "DOWN"),
    (0x2C, "PRINT_SCREEN"),
    (0x2D, "INSERT"),
    (0x2E, "DELETE"),
    (0x5B, "META"), // LWin
    (0x5C, "META"), // RWin
    (0x5D, "MENU"),
    (0x6A, "NUM*"),
    (0x6B, "NUM+"),
    (0x6D, "NUM-"),
    (0x6E, "NUM."),
    (0x6F, "NUM/"),
    (0x90, "NUM_LOCK"),
    (0x91, "SCROLL_LOCK"),
    (0xA0, "SHIFT"), // LShift
    (0xA1, "SHIFT"), // RShift
    (0xA2, "CTRL"),  // LControl
    (0xA3, "CTRL"),  // RControl
    (0xA4, "ALT"),   // LMenu
    (0xA5, "ALT"),   // RMenu
    (0xBA, ";"),
    (0xBB, "="),
    (0xBC, ","),
    (0xBD, "-"),
    (0xBE, "."),
    (0xBF, "/"),
    (0xC0, "`"),
    (0xDB, "["),
    (0xDC, "\\"),
    (0xDD, "]"),
    (0xDE, "'"),
    (0xE2, "\\"), // OEM_102, ISO extra key
];

const VK_NUMPAD0: u32 = 0x60;
const VK_F1: u32 = 0x70;
const VK_F24: u32 = 0x87;

lazy_static::lazy_static! {
    static ref VK_LOOKUP: HashMap<u32, &'static str> = VK_LABELS.iter().copied().collect();
}

/// Role of a canonical label.
pub fn role_of(label: &str) -> Role {
    if MODIFIER_LABELS.contains(&label) {
        Role::Modifier
    } else {
        Role::Regular
    }
}

/// Canonical display label and role for a raw key. Total: every input yields a
/// non-empty label.
pub fn name(key: &RawKey) -> (String, Role) {
    let label = match key {
        RawKey::Char(code) => char_label(*code),
        RawKey::Named(named) => named_label(*named),
        RawKey::VirtualKey(vk) => vk_label(*vk),
    };
    let role = role_of(&label);
    (label, role)
}

fn fallback(key: RawKey) -> String {
    key.to_string().to_uppercase()
}

fn char_label(code: u32) -> String {
    // Ctrl+<letter> arrives as the control byte 1..=26.
    let code = match code {
        1..=26 => code - 1 + 'a' as u32,
        other => other,
    };
    match char::from_u32(code) {
        Some(' ') => "SPACE".to_string(),
        Some('\u{1b}') => "ESC".to_string(),
        Some('\u{7f}') => "DELETE".to_string(),
        Some(c) if !c.is_control() => c.to_uppercase().collect(),
        _ => fallback(RawKey::Char(code)),
    }
}

fn named_label(named: NamedKey) -> String {
    let label = match named {
        NamedKey::ControlLeft | NamedKey::ControlRight => "CTRL",
        NamedKey::ShiftLeft | NamedKey::ShiftRight => "SHIFT",
        NamedKey::AltLeft | NamedKey::AltRight => "ALT",
        NamedKey::MetaLeft | NamedKey::MetaRight => "META",
        NamedKey::Enter => "ENTER",
        NamedKey::Escape => "ESC",
        NamedKey::Backspace => "BACKSPACE",
        NamedKey::Tab => "TAB",
        NamedKey::Space => "SPACE",
        NamedKey::CapsLock => "CAPS_LOCK",
        NamedKey::Delete => "DELETE",
        NamedKey::Insert => "INSERT",
        NamedKey::Home => "HOME",
        NamedKey::End => "END",
        NamedKey::PageUp => "PAGE_UP",
        NamedKey::PageDown => "PAGE_DOWN",
        NamedKey::Up => "UP",
        NamedKey::Down => "DOWN",
        NamedKey::Left => "LEFT",
        NamedKey::Right => "RIGHT",
        NamedKey::PrintScreen => "PRINT_SCREEN",
        NamedKey::ScrollLock => "SCROLL_LOCK",
        NamedKey::Pause => "PAUSE",
        NamedKey::NumLock => "NUM_LOCK",
        NamedKey::Menu => "MENU",
        NamedKey::Function => "FN",
        NamedKey::F(n) if (1..=24).contains(&n) => return format!("F{n}"),
        NamedKey::Numpad(d) if d <= 9 => return format!("NUM{d}"),
        NamedKey::NumpadEnter => "NUMENTER",
        NamedKey::NumpadAdd => "NUM+",
        NamedKey::NumpadSubtract => "NUM-",
        NamedKey::NumpadMultiply => "NUM*",
        NamedKey::NumpadDivide => "NUM/",
        NamedKey::NumpadDecimal => "NUM.",
        NamedKey::F(_) | NamedKey::Numpad(_) => return fallback(RawKey::Named(named)),
    };
    label.to_string()
}

fn vk_label(vk: u32) -> String {
    match vk {
        0x30..=0x39 | 0x41..=0x5A => char_label(vk),
        VK_NUMPAD0..=0x69 => format!("NUM{}", vk - VK_NUMPAD0),
        VK_F1..=VK_F24 => format!("F{}", vk - VK_F1 + 1),
        _ => match VK_LOOKUP.get(&vk) {
            Some(label) => label.to_string(),
            None => fallback(RawKey::VirtualKey(vk)),
        },
    }
}
