#![forbid(unsafe_code)]

//! Byte-level terminal input decoder.
//!
//! [`InputParser`] is a resumable state machine: bytes may arrive split at
//! any point and decoding continues where it left off. It recognizes
//!
//! - printable ASCII and UTF-8 characters
//! - C0 control bytes (`ctrl+a` ... `ctrl+z`, enter, tab, backspace)
//! - CSI and SS3 key sequences with xterm modifier parameters
//! - SGR mouse reports `ESC [ < b ; x ; y (M|m)`
//! - legacy mouse reports `ESC [ M cb cx cy`
//! - bracketed paste and focus reports
//!
//! Anything else is dropped without producing an event. Buffers are bounded
//! (CSI 256 bytes, OSC 4 KiB, paste 1 MiB) so hostile input cannot exhaust
//! memory.

use crate::event::{Event, Key, Modifiers, MouseButton, MouseEvent, MouseEventKind};
use crate::keys;

const MAX_CSI_LEN: usize = 256;
const MAX_OSC_LEN: usize = 4096;
const MAX_PASTE_LEN: usize = 1024 * 1024;

const PASTE_END: &[u8] = b"\x1b[201~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    #[default]
    Ground,
    /// After a lone ESC.
    Escape,
    /// Inside `ESC [`, collecting parameter bytes.
    Csi,
    /// After `ESC O`.
    Ss3,
    /// Inside `ESC ]`, discarding until BEL or ST.
    Osc,
    /// ESC seen inside an OSC string.
    OscEscape,
    /// After an SGR mouse report ended on a final byte other than `M`/`m`;
    /// discarding its tail. `len` counts bytes consumed so far.
    SgrDiscard { len: usize },
    /// After `ESC [ M`, collecting the three payload bytes.
    LegacyMouse { collected: u8 },
    /// Inside a multi-byte UTF-8 character.
    Utf8 { collected: u8, expected: u8 },
}

/// Terminal input decoder.
///
/// ```
/// use weft_core::event::Event;
/// use weft_core::input_parser::InputParser;
///
/// let mut parser = InputParser::new();
/// let events = parser.parse(b"\x1b[A");
/// assert!(matches!(&events[..], [Event::Key(k)] if k.name == "up"));
/// ```
#[derive(Debug, Default)]
pub struct InputParser {
    state: ParserState,
    buffer: Vec<u8>,
    osc_len: usize,
    legacy_mouse: [u8; 3],
    utf8: [u8; 4],
    in_paste: bool,
    paste: Vec<u8>,
    paste_match: usize,
}

impl InputParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(32),
            ..Self::default()
        }
    }

    /// Decode a chunk of input bytes into completed events.
    pub fn parse(&mut self, input: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in input {
            if let Some(event) = self.process_byte(byte) {
                events.push(event);
            }
        }
        events
    }

    /// Resolve a pending lone ESC into an `escape` key.
    ///
    /// Call when the input source goes idle: a bare ESC is indistinguishable
    /// from the start of a sequence until either more bytes or a pause arrive.
    pub fn flush(&mut self) -> Option<Event> {
        if self.state == ParserState::Escape {
            self.state = ParserState::Ground;
            return Some(Event::Key(Key::special("escape")));
        }
        None
    }

    /// Whether the last byte seen was an ESC that may still start a
    /// sequence. [`flush`](Self::flush) resolves it.
    pub fn has_lone_escape(&self) -> bool {
        self.state == ParserState::Escape && !self.in_paste
    }

    /// Whether the parser is in the middle of a sequence.
    pub fn is_pending(&self) -> bool {
        self.state != ParserState::Ground || self.in_paste
    }

    fn process_byte(&mut self, byte: u8) -> Option<Event> {
        if self.in_paste {
            return self.process_paste_byte(byte);
        }
        match self.state {
            ParserState::Ground => self.process_ground(byte),
            ParserState::Escape => self.process_escape(byte),
            ParserState::Csi => self.process_csi(byte),
            ParserState::Ss3 => {
                self.state = ParserState::Ground;
                let key = keys::ss3_key(byte);
                if key.is_none() {
                    dropped(&[0x1B, b'O', byte]);
                }
                key.map(Event::Key)
            }
            ParserState::Osc => self.process_osc(byte),
            ParserState::OscEscape => {
                // ST terminates; anything else is more string content.
                self.state = if byte == b'\\' {
                    ParserState::Ground
                } else {
                    ParserState::Osc
                };
                None
            }
            ParserState::SgrDiscard { len } => self.process_sgr_discard(byte, len),
            ParserState::LegacyMouse { collected } => self.process_legacy_mouse(byte, collected),
            ParserState::Utf8 {
                collected,
                expected,
            } => self.process_utf8(byte, collected, expected),
        }
    }

    fn process_ground(&mut self, byte: u8) -> Option<Event> {
        let expected = match byte {
            0x1B => {
                self.state = ParserState::Escape;
                return None;
            }
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return keys::control_key(byte).map(Event::Key),
        };
        self.utf8[0] = byte;
        self.state = ParserState::Utf8 {
            collected: 1,
            expected,
        };
        None
    }

    fn process_escape(&mut self, byte: u8) -> Option<Event> {
        self.state = ParserState::Ground;
        match byte {
            b'[' => {
                self.state = ParserState::Csi;
                self.buffer.clear();
                None
            }
            b'O' => {
                self.state = ParserState::Ss3;
                None
            }
            b']' => {
                self.state = ParserState::Osc;
                self.osc_len = 0;
                None
            }
            0x1B => Some(Event::Key(
                Key::special("escape").with_modifiers(Modifiers::ALT),
            )),
            0x20..=0x7E => Some(Event::Key(Key::alt(char::from(byte)))),
            // ESC prefixing a control byte is the alt-modified control key.
            _ => Some(Event::Key(keys::control_key(byte).map_or_else(
                || Key::special("escape"),
                |key| key.with_modifiers(Modifiers::ALT),
            ))),
        }
    }

    fn process_csi(&mut self, byte: u8) -> Option<Event> {
        if self.buffer.is_empty() && byte == b'M' {
            self.state = ParserState::LegacyMouse { collected: 0 };
            return None;
        }
        if self.buffer.len() >= MAX_CSI_LEN {
            self.state = ParserState::Ground;
            self.buffer.clear();
            return None;
        }
        match byte {
            0x30..=0x3F => {
                self.buffer.push(byte);
                None
            }
            0x40..=0x7E if self.buffer.first() == Some(&b'<') && !matches!(byte, b'M' | b'm') => {
                self.state = ParserState::SgrDiscard {
                    len: self.buffer.len() + 1,
                };
                self.buffer.clear();
                None
            }
            0x40..=0x7E => {
                self.state = ParserState::Ground;
                let params = std::mem::take(&mut self.buffer);
                let event = self.finish_csi(&params, byte);
                if event.is_none() && !self.in_paste {
                    dropped(&params);
                }
                event
            }
            _ => {
                self.state = ParserState::Ground;
                self.buffer.clear();
                None
            }
        }
    }

    fn finish_csi(&mut self, params: &[u8], final_byte: u8) -> Option<Event> {
        match (params, final_byte) {
            ([], b'I') => Some(Event::Focus(true)),
            ([], b'O') => Some(Event::Focus(false)),
            (b"200", b'~') => {
                self.in_paste = true;
                self.paste.clear();
                self.paste_match = 0;
                None
            }
            ([b'<', rest @ ..], b'M' | b'm') => parse_sgr_mouse(rest, final_byte == b'm'),
            _ => keys::csi_key(params, final_byte).map(Event::Key),
        }
    }

    fn process_sgr_discard(&mut self, byte: u8, len: usize) -> Option<Event> {
        self.state = match byte {
            b'M' | b'm' => ParserState::Ground,
            0x1B => ParserState::Escape,
            _ if len + 1 >= MAX_CSI_LEN => ParserState::Ground,
            _ => ParserState::SgrDiscard { len: len + 1 },
        };
        None
    }

    fn process_legacy_mouse(&mut self, byte: u8, collected: u8) -> Option<Event> {
        self.legacy_mouse[usize::from(collected)] = byte;
        if collected < 2 {
            self.state = ParserState::LegacyMouse {
                collected: collected + 1,
            };
            return None;
        }
        self.state = ParserState::Ground;
        let [cb, cx, cy] = self.legacy_mouse;
        let button_code = u16::from(cb.saturating_sub(32));
        let x = u16::from(cx.saturating_sub(33));
        let y = u16::from(cy.saturating_sub(33));
        Some(Event::Mouse(decode_mouse(button_code, x, y, false)))
    }

    fn process_osc(&mut self, byte: u8) -> Option<Event> {
        self.osc_len += 1;
        match byte {
            0x07 => self.state = ParserState::Ground,
            0x1B => self.state = ParserState::OscEscape,
            _ if self.osc_len >= MAX_OSC_LEN => self.state = ParserState::Ground,
            _ => {}
        }
        None
    }

    fn process_utf8(&mut self, byte: u8, collected: u8, expected: u8) -> Option<Event> {
        if byte & 0xC0 != 0x80 {
            // Truncated character: drop it and decode this byte afresh.
            self.state = ParserState::Ground;
            return self.process_ground(byte);
        }
        self.utf8[usize::from(collected)] = byte;
        let collected = collected + 1;
        if collected < expected {
            self.state = ParserState::Utf8 {
                collected,
                expected,
            };
            return None;
        }
        self.state = ParserState::Ground;
        let text = std::str::from_utf8(&self.utf8[..usize::from(expected)]).ok()?;
        text.chars().next().map(|c| Event::Key(Key::character(c)))
    }

    fn process_paste_byte(&mut self, byte: u8) -> Option<Event> {
        if byte == PASTE_END[self.paste_match] {
            self.paste_match += 1;
            if self.paste_match == PASTE_END.len() {
                self.paste_match = 0;
                self.in_paste = false;
                let text = String::from_utf8_lossy(&self.paste).into_owned();
                self.paste.clear();
                return Some(Event::Paste(text));
            }
            return None;
        }
        // A partial terminator turned out to be content.
        let partial = std::mem::take(&mut self.paste_match);
        self.push_paste(&PASTE_END[..partial]);
        if byte == PASTE_END[0] {
            self.paste_match = 1;
        } else {
            self.push_paste(&[byte]);
        }
        None
    }

    fn push_paste(&mut self, bytes: &[u8]) {
        let room = MAX_PASTE_LEN.saturating_sub(self.paste.len());
        self.paste.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
}

fn parse_sgr_mouse(params: &[u8], is_release: bool) -> Option<Event> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';');
    let button_code: u16 = fields.next()?.parse().ok()?;
    let x: u16 = fields.next()?.parse().ok()?;
    let y: u16 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Event::Mouse(decode_mouse(
        button_code,
        x.saturating_sub(1),
        y.saturating_sub(1),
        is_release,
    )))
}

/// Decode an xterm mouse button code into an event at a 0-based position.
///
/// Bits 2..=4 carry shift, alt and ctrl; bit 5 flags motion and bit 6 a
/// wheel notch, whose direction is in the low two bits. Without the wheel
/// flag the low bits select left, middle or right, and the value 3 means
/// "no button" (a legacy release, or motion with nothing held).
pub fn decode_mouse(button_code: u16, x: u16, y: u16, is_release: bool) -> MouseEvent {
    let mut modifiers = Modifiers::NONE;
    if button_code & 0b0_0100 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if button_code & 0b0_1000 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if button_code & 0b1_0000 != 0 {
        modifiers |= Modifiers::CTRL;
    }
    let motion = button_code & 32 != 0;
    let scroll = button_code & 64 != 0;
    let low = button_code & 0b11;

    let (kind, button) = if scroll {
        let direction = match low {
            0 => MouseButton::ScrollUp,
            1 => MouseButton::ScrollDown,
            2 => MouseButton::ScrollLeft,
            _ => MouseButton::ScrollRight,
        };
        (MouseEventKind::Scroll, direction)
    } else {
        let button = match low {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        };
        let kind = match (motion, button) {
            (true, MouseButton::None) => MouseEventKind::Move,
            (true, _) => MouseEventKind::Drag,
            (false, MouseButton::None) => MouseEventKind::Release,
            (false, _) if is_release => MouseEventKind::Release,
            (false, _) => MouseEventKind::Press,
        };
        (kind, button)
    };
    MouseEvent::new(kind, button, x, y).with_modifiers(modifiers)
}

#[cfg(feature = "tracing")]
fn dropped(seq: &[u8]) {
    tracing::trace!(sequence = ?String::from_utf8_lossy(seq), "dropped unrecognized input sequence");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
fn dropped(_seq: &[u8]) {}
