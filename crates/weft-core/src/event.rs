#![forbid(unsafe_code)]

//! Input event types.
//!
//! Keys are identified by a canonical lowercase name (`"a"`, `"up"`,
//! `"ctrl+c"`, `"shift+tab"`) so that handlers and widgets can match them
//! without caring which wire encoding produced them. Modifier prefixes always
//! appear in the order `ctrl+`, `alt+`, `shift+`.
//!
//! Mouse coordinates are 0-indexed; the terminal reports them 1-indexed and
//! the decoders convert.

use std::fmt;

use bitflags::bitflags;
#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
use crossterm::event as cte;

/// A decoded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(Key),

    /// A mouse report, possibly synthesized into a click.
    Mouse(MouseEvent),

    /// The terminal changed size.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },

    /// Text delivered through bracketed paste.
    Paste(String),

    /// Terminal focus gained (`true`) or lost (`false`).
    Focus(bool),
}

/// Broad classification of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// A printable character, possibly with `alt+`.
    Character,
    /// A named key such as `up`, `enter` or `f5`.
    Special,
    /// A control chord such as `ctrl+c`.
    Control,
}

bitflags! {
    /// Modifier keys held during a key or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b000;
        /// Shift key.
        const SHIFT = 0b001;
        /// Alt/Option key.
        const ALT   = 0b010;
        /// Control key.
        const CTRL  = 0b100;
    }
}

const MODIFIER_PREFIXES: [(&str, Modifiers); 3] = [
    ("ctrl+", Modifiers::CTRL),
    ("alt+", Modifiers::ALT),
    ("shift+", Modifiers::SHIFT),
];

/// A decoded key press.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// Canonical name, including modifier prefixes.
    pub name: String,
    /// Classification of the key.
    pub key_type: KeyType,
    /// The character produced, for character keys.
    pub ch: Option<char>,
}

impl Key {
    /// A plain printable character.
    pub fn character(c: char) -> Self {
        Self {
            name: char_name(c),
            key_type: KeyType::Character,
            ch: Some(c),
        }
    }

    /// A named non-character key such as `"up"` or `"f3"`.
    pub fn special(name: &str) -> Self {
        Self {
            name: name.to_string(),
            key_type: KeyType::Special,
            ch: None,
        }
    }

    /// A control chord; the letter is lowercased.
    pub fn ctrl(c: char) -> Self {
        Self {
            name: format!("ctrl+{}", char_name(c.to_ascii_lowercase())),
            key_type: KeyType::Control,
            ch: None,
        }
    }

    /// An alt-prefixed character.
    pub fn alt(c: char) -> Self {
        Self {
            name: format!("alt+{}", char_name(c)),
            key_type: KeyType::Character,
            ch: Some(c),
        }
    }

    /// Build a key from a canonical or user-written name.
    ///
    /// Modifier prefixes are normalized into canonical order, so
    /// `"shift+ctrl+up"` and `"ctrl+shift+up"` produce the same key.
    pub fn named(name: &str) -> Self {
        let (mods, base) = split_modifiers(name);
        let mut chars = base.chars();
        let single = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ if base == "space" => Some(' '),
            _ => None,
        };
        let key = match single {
            Some(c) if mods.contains(Modifiers::CTRL) => Key::ctrl(c),
            Some(c) => Key::character(c),
            None => Key::special(base),
        };
        key.with_modifiers(mods)
    }

    /// Add modifier prefixes to the name.
    pub fn with_modifiers(mut self, extra: Modifiers) -> Self {
        let (existing, base) = split_modifiers(&self.name);
        let mods = existing | extra;
        if mods == existing {
            return self;
        }
        let mut name = String::with_capacity(self.name.len() + 12);
        for (prefix, flag) in MODIFIER_PREFIXES {
            if mods.contains(flag) {
                name.push_str(prefix);
            }
        }
        name.push_str(base);
        self.name = name;
        self
    }

    /// Modifiers encoded in the name prefixes.
    pub fn modifiers(&self) -> Modifiers {
        split_modifiers(&self.name).0
    }

    /// The name without modifier prefixes.
    pub fn base_name(&self) -> &str {
        split_modifiers(&self.name).1
    }

    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// True only for an unmodified `ctrl+c` chord.
    #[inline]
    pub fn is_ctrl_c(&self) -> bool {
        self.name == "ctrl+c"
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn char_name(c: char) -> String {
    if c == ' ' {
        "space".to_string()
    } else {
        c.to_string()
    }
}

fn split_modifiers(name: &str) -> (Modifiers, &str) {
    let mut mods = Modifiers::NONE;
    let mut rest = name;
    'outer: loop {
        for (prefix, flag) in MODIFIER_PREFIXES {
            if rest.len() > prefix.len() && rest.starts_with(prefix) {
                mods |= flag;
                rest = &rest[prefix.len()..];
                continue 'outer;
            }
        }
        return (mods, rest);
    }
}

/// What kind of mouse report this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// A button went down.
    Press,
    /// A button came up away from its press, or without one.
    Release,
    /// The pointer moved with a button held.
    Drag,
    /// The pointer moved with no button held.
    Move,
    /// A wheel notch; the direction is in the button.
    Scroll,
    /// A press and release close together.
    Click,
    /// Two clicks close together in time and space.
    DoubleClick,
}

/// The button (or wheel direction) involved in a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// No button, as in motion reports or legacy releases.
    None,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

/// A decoded mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// Report kind.
    pub kind: MouseEventKind,
    /// Button or wheel direction.
    pub button: MouseButton,
    /// Column, 0-indexed.
    pub x: u16,
    /// Row, 0-indexed.
    pub y: u16,
    /// Modifiers held.
    pub modifiers: Modifiers,
    /// 1 for clicks, 2 for double clicks, 0 otherwise.
    pub click_count: u8,
}

impl MouseEvent {
    pub const fn new(kind: MouseEventKind, button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            kind,
            button,
            x,
            y,
            modifiers: Modifiers::NONE,
            click_count: 0,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }

    #[inline]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    #[inline]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[inline]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Whether this is a synthesized click of any count.
    #[inline]
    pub const fn is_click(&self) -> bool {
        matches!(
            self.kind,
            MouseEventKind::Click | MouseEventKind::DoubleClick
        )
    }
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
impl Event {
    /// Convert a crossterm event. Key releases and unmapped keys yield `None`.
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => Key::from_crossterm(key).map(Event::Key),
            cte::Event::Mouse(mouse) => Some(Event::Mouse(map_mouse_event(mouse))),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::Paste(text) => Some(Event::Paste(text)),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
        }
    }
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
impl Key {
    /// Convert a crossterm key event into its canonical name.
    pub fn from_crossterm(event: cte::KeyEvent) -> Option<Self> {
        if event.kind == cte::KeyEventKind::Release {
            return None;
        }
        let mods = map_modifiers(event.modifiers);
        let key = match event.code {
            cte::KeyCode::Char(c) if mods.contains(Modifiers::CTRL) => {
                return Some(Key::ctrl(c).with_modifiers(mods & Modifiers::ALT));
            }
            cte::KeyCode::Char(c) if mods.contains(Modifiers::ALT) => return Some(Key::alt(c)),
            // Shift is already folded into the character.
            cte::KeyCode::Char(c) => return Some(Key::character(c)),
            cte::KeyCode::BackTab => return Some(Key::special("tab").with_modifiers(Modifiers::SHIFT)),
            cte::KeyCode::F(n) => Key::special(&format!("f{n}")),
            code => Key::special(special_name(code)?),
        };
        Some(key.with_modifiers(mods))
    }
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
fn special_name(code: cte::KeyCode) -> Option<&'static str> {
    Some(match code {
        cte::KeyCode::Backspace => "backspace",
        cte::KeyCode::Enter => "enter",
        cte::KeyCode::Left => "left",
        cte::KeyCode::Right => "right",
        cte::KeyCode::Up => "up",
        cte::KeyCode::Down => "down",
        cte::KeyCode::Home => "home",
        cte::KeyCode::End => "end",
        cte::KeyCode::PageUp => "pageup",
        cte::KeyCode::PageDown => "pagedown",
        cte::KeyCode::Tab => "tab",
        cte::KeyCode::Delete => "delete",
        cte::KeyCode::Insert => "insert",
        cte::KeyCode::Esc => "escape",
        _ => return None,
    })
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    mapped
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
fn map_mouse_event(event: cte::MouseEvent) -> MouseEvent {
    let (kind, button) = match event.kind {
        cte::MouseEventKind::Down(b) => (MouseEventKind::Press, map_mouse_button(b)),
        cte::MouseEventKind::Up(b) => (MouseEventKind::Release, map_mouse_button(b)),
        cte::MouseEventKind::Drag(b) => (MouseEventKind::Drag, map_mouse_button(b)),
        cte::MouseEventKind::Moved => (MouseEventKind::Move, MouseButton::None),
        cte::MouseEventKind::ScrollUp => (MouseEventKind::Scroll, MouseButton::ScrollUp),
        cte::MouseEventKind::ScrollDown => (MouseEventKind::Scroll, MouseButton::ScrollDown),
        cte::MouseEventKind::ScrollLeft => (MouseEventKind::Scroll, MouseButton::ScrollLeft),
        cte::MouseEventKind::ScrollRight => (MouseEventKind::Scroll, MouseButton::ScrollRight),
    };
    MouseEvent::new(kind, button, event.column, event.row)
        .with_modifiers(map_modifiers(event.modifiers))
}

#[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
fn map_mouse_button(button: cte::MouseButton) -> MouseButton {
    match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_keys_name_themselves() {
        let key = Key::character('q');
        assert_eq!(key.name, "q");
        assert_eq!(key.key_type, KeyType::Character);
        assert_eq!(key.ch, Some('q'));
        assert_eq!(Key::character(' ').name, "space");
    }

    #[test]
    fn ctrl_chords() {
        let key = Key::ctrl('C');
        assert_eq!(key.name, "ctrl+c");
        assert_eq!(key.key_type, KeyType::Control);
        assert!(key.is_ctrl_c());
        assert_eq!(key.modifiers(), Modifiers::CTRL);
        assert!(!Key::character('c').is_ctrl_c());
        assert!(!Key::ctrl('c').with_modifiers(Modifiers::ALT).is_ctrl_c());
    }

    #[test]
    fn modifiers_are_canonically_ordered() {
        let key = Key::special("up").with_modifiers(Modifiers::SHIFT | Modifiers::CTRL);
        assert_eq!(key.name, "ctrl+shift+up");
        assert_eq!(key.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(key.base_name(), "up");
    }

    #[test]
    fn named_normalizes() {
        assert_eq!(Key::named("shift+ctrl+up"), Key::named("ctrl+shift+up"));
        assert_eq!(Key::named("ctrl+x"), Key::ctrl('x'));
        assert_eq!(Key::named("a"), Key::character('a'));
        assert_eq!(Key::named("space"), Key::character(' '));
        assert_eq!(Key::named("f5").key_type, KeyType::Special);
        assert_eq!(Key::named("alt+x").modifiers(), Modifiers::ALT);
    }

    #[test]
    fn plus_key_is_not_a_modifier() {
        let key = Key::character('+');
        assert_eq!(key.modifiers(), Modifiers::NONE);
        assert_eq!(key.base_name(), "+");
        let chord = Key::ctrl('+');
        assert_eq!(chord.name, "ctrl++");
        assert_eq!(chord.base_name(), "+");
    }

    #[test]
    fn with_no_new_modifiers_is_identity() {
        let key = Key::ctrl('a');
        assert_eq!(key.clone().with_modifiers(Modifiers::CTRL), key);
    }

    #[test]
    fn mouse_modifier_accessors() {
        let ev = MouseEvent::new(MouseEventKind::Press, MouseButton::Left, 3, 4)
            .with_modifiers(Modifiers::SHIFT | Modifiers::CTRL);
        assert!(ev.shift());
        assert!(ev.ctrl());
        assert!(!ev.alt());
        assert_eq!(ev.position(), (3, 4));
        assert_eq!(ev.click_count, 0);
        assert!(!ev.is_click());
    }

    #[cfg(all(feature = "crossterm", not(target_arch = "wasm32")))]
    mod crossterm_mapping {
        use super::*;
        use crossterm::event as ct;

        fn press(code: ct::KeyCode, mods: ct::KeyModifiers) -> ct::KeyEvent {
            ct::KeyEvent::new(code, mods)
        }

        #[test]
        fn maps_chars_and_chords() {
            let key = Key::from_crossterm(press(ct::KeyCode::Char('a'), ct::KeyModifiers::NONE));
            assert_eq!(key, Some(Key::character('a')));
            let key = Key::from_crossterm(press(ct::KeyCode::Char('c'), ct::KeyModifiers::CONTROL));
            assert!(key.is_some_and(|k| k.is_ctrl_c()));
            let key = Key::from_crossterm(press(ct::KeyCode::Char('x'), ct::KeyModifiers::ALT));
            assert_eq!(key, Some(Key::alt('x')));
        }

        #[test]
        fn maps_special_keys() {
            let key = Key::from_crossterm(press(ct::KeyCode::Up, ct::KeyModifiers::SHIFT));
            assert_eq!(key.map(|k| k.name), Some("shift+up".to_string()));
            let key = Key::from_crossterm(press(ct::KeyCode::BackTab, ct::KeyModifiers::SHIFT));
            assert_eq!(key.map(|k| k.name), Some("shift+tab".to_string()));
            let key = Key::from_crossterm(press(ct::KeyCode::F(7), ct::KeyModifiers::NONE));
            assert_eq!(key.map(|k| k.name), Some("f7".to_string()));
        }

        #[test]
        fn ignores_releases() {
            let mut event = press(ct::KeyCode::Enter, ct::KeyModifiers::NONE);
            event.kind = ct::KeyEventKind::Release;
            assert_eq!(Key::from_crossterm(event), None);
        }

        #[test]
        fn maps_mouse_and_resize() {
            let mouse = ct::MouseEvent {
                kind: ct::MouseEventKind::Down(ct::MouseButton::Left),
                column: 4,
                row: 2,
                modifiers: ct::KeyModifiers::NONE,
            };
            let ev = Event::from_crossterm(ct::Event::Mouse(mouse));
            assert_eq!(
                ev,
                Some(Event::Mouse(MouseEvent::new(
                    MouseEventKind::Press,
                    MouseButton::Left,
                    4,
                    2
                )))
            );
            assert_eq!(
                Event::from_crossterm(ct::Event::Resize(80, 24)),
                Some(Event::Resize {
                    width: 80,
                    height: 24
                })
            );
        }
    }
}
