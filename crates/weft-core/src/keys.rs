#![forbid(unsafe_code)]

//! Lookup tables mapping raw bytes and escape sequences to named keys.
//!
//! The [`InputParser`](crate::input_parser::InputParser) drives these tables
//! from its state machine; [`lookup_sequence`] exposes the same mapping for a
//! complete byte sequence.

use crate::event::{Key, Modifiers};

/// Final bytes of `CSI [1;mod] X` sequences.
const CSI_FINALS: &[(u8, &str)] = &[
    (b'A', "up"),
    (b'B', "down"),
    (b'C', "right"),
    (b'D', "left"),
    (b'H', "home"),
    (b'F', "end"),
    (b'P', "f1"),
    (b'Q', "f2"),
    (b'R', "f3"),
    (b'S', "f4"),
];

/// Numeric parameters of `CSI n [;mod] ~` sequences.
const TILDE_CODES: &[(u32, &str)] = &[
    (1, "home"),
    (2, "insert"),
    (3, "delete"),
    (4, "end"),
    (5, "pageup"),
    (6, "pagedown"),
    (7, "home"),
    (8, "end"),
    (11, "f1"),
    (12, "f2"),
    (13, "f3"),
    (14, "f4"),
    (15, "f5"),
    (17, "f6"),
    (18, "f7"),
    (19, "f8"),
    (20, "f9"),
    (21, "f10"),
    (23, "f11"),
    (24, "f12"),
];

/// Final bytes of `ESC O X` sequences.
const SS3_FINALS: &[(u8, &str)] = &[
    (b'A', "up"),
    (b'B', "down"),
    (b'C', "right"),
    (b'D', "left"),
    (b'H', "home"),
    (b'F', "end"),
    (b'M', "enter"),
    (b'P', "f1"),
    (b'Q', "f2"),
    (b'R', "f3"),
    (b'S', "f4"),
];

/// Key for a single byte outside of any escape sequence.
///
/// Covers C0 controls, DEL and printable ASCII. `ESC` itself is ambiguous
/// until the next byte arrives and is not handled here.
pub fn control_key(byte: u8) -> Option<Key> {
    let key = match byte {
        0x00 => Key::ctrl(' '),
        0x08 | 0x7F => Key::special("backspace"),
        0x09 => Key::special("tab"),
        0x0D => Key::special("enter"),
        0x01..=0x1A => Key::ctrl(char::from(byte - 1 + b'a')),
        0x1C => Key::ctrl('\\'),
        0x1D => Key::ctrl(']'),
        0x1E => Key::ctrl('^'),
        0x1F => Key::ctrl('_'),
        0x20..=0x7E => Key::character(char::from(byte)),
        _ => return None,
    };
    Some(key)
}

/// Decode the xterm modifier parameter (`1 + bits`, shift 1, alt 2, ctrl 4).
pub fn xterm_modifiers(value: u32) -> Modifiers {
    let bits = value.saturating_sub(1);
    let mut mods = Modifiers::NONE;
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        mods |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

/// Key for a complete CSI sequence, given its parameter bytes and final byte.
pub fn csi_key(params: &[u8], final_byte: u8) -> Option<Key> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';');
    let first = fields.next().unwrap_or("");
    let mods = fields
        .next()
        .and_then(|m| m.parse().ok())
        .map_or(Modifiers::NONE, xterm_modifiers);

    if final_byte == b'Z' {
        return Some(Key::special("tab").with_modifiers(Modifiers::SHIFT | mods));
    }
    if final_byte == b'~' {
        let code: u32 = first.parse().ok()?;
        let name = TILDE_CODES.iter().find(|(n, _)| *n == code)?.1;
        return Some(Key::special(name).with_modifiers(mods));
    }
    // Only `CSI X` and `CSI 1;mod X` forms are keys.
    if !(first.is_empty() || first == "1") {
        return None;
    }
    let name = CSI_FINALS.iter().find(|(b, _)| *b == final_byte)?.1;
    Some(Key::special(name).with_modifiers(mods))
}

/// Key for an `ESC O X` sequence.
pub fn ss3_key(final_byte: u8) -> Option<Key> {
    SS3_FINALS
        .iter()
        .find(|(b, _)| *b == final_byte)
        .map(|(_, name)| Key::special(name))
}

/// Look up a complete byte sequence.
///
/// Returns `None` for anything that is not exactly one key, including
/// mouse reports and unknown sequences.
pub fn lookup_sequence(seq: &[u8]) -> Option<Key> {
    match seq {
        [] => None,
        [0x1B] => Some(Key::special("escape")),
        [0x1B, 0x1B] => Some(Key::special("escape").with_modifiers(Modifiers::ALT)),
        [byte] => control_key(*byte),
        [0x1B, b'[', body @ ..] => {
            let (&final_byte, params) = body.split_last()?;
            if params.first() == Some(&b'<') || body == b"M" {
                return None;
            }
            csi_key(params, final_byte)
        }
        [0x1B, b'O', final_byte] => ss3_key(*final_byte),
        [0x1B, byte @ 0x20..=0x7E] => Some(Key::alt(char::from(*byte))),
        _ => None,
    }
}
