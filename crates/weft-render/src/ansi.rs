#![forbid(unsafe_code)]

//! ANSI escape sequence generation.
//!
//! Pure byte writers with no state: the renderer decides *when* to emit,
//! these functions only decide *what* to emit.
//!
//! # Sequence Reference
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ n m` | SGR (Select Graphic Rendition) |
//! | CSI | `ESC [ row ; col H` | CUP (Cursor Position, 1-indexed) |
//! | CSI | `ESC [ col G` | CHA (Cursor Horizontal Absolute) |
//! | CSI | `ESC [ 2 J` | ED (Erase Display) |
//! | CSI | `ESC [ ? 1049 h/l` | Alternate screen |
//! | CSI | `ESC [ ? 1000;1002;1006 h/l` | Mouse reporting (SGR encoding) |
//! | CSI | `ESC [ ? 2004 h/l` | Bracketed paste |

use std::io::{self, Write};

use crate::cell::StyleFlags;
use crate::color::{Color, ColorDepth};
use crate::style::Style;

// =============================================================================
// SGR
// =============================================================================

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// SGR "on" code for each attribute flag.
pub const FLAG_TABLE: [(StyleFlags, u8); 5] = [
    (StyleFlags::BOLD, 1),
    (StyleFlags::DIM, 2),
    (StyleFlags::ITALIC, 3),
    (StyleFlags::UNDERLINE, 4),
    (StyleFlags::REVERSE, 7),
];

/// Enable every attribute in `flags`: `CSI 1;3 m`. Writes nothing when empty.
pub fn sgr_flags<W: Write>(w: &mut W, flags: StyleFlags) -> io::Result<()> {
    if flags.is_empty() {
        return Ok(());
    }
    let mut params = Vec::with_capacity(FLAG_TABLE.len());
    push_flag_params(&mut params, flags);
    write_sgr(w, &params)
}

/// Foreground RGB: `CSI 38;2;r;g;b m`
pub fn sgr_fg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

/// Background RGB: `CSI 48;2;r;g;b m`
pub fn sgr_bg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}

/// Foreground palette entry: `CSI 38;5;n m`
pub fn sgr_fg_256<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[38;5;{index}m")
}

/// Background palette entry: `CSI 48;5;n m`
pub fn sgr_bg_256<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[48;5;{index}m")
}

/// Foreground standard color (`30-37`, bright `90-97`).
pub fn sgr_fg_16<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[{}m", ansi16_code(index, false))
}

/// Background standard color (`40-47`, bright `100-107`).
pub fn sgr_bg_16<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[{}m", ansi16_code(index, true))
}

/// Reset and apply a full style in one sequence: `CSI 0;1;31 m`.
///
/// Colors are downgraded to `depth` first. A plain style emits `CSI 0 m`.
pub fn sgr_style<W: Write>(w: &mut W, style: &Style, depth: ColorDepth) -> io::Result<()> {
    let mut params: Vec<u16> = vec![0];
    push_flag_params(&mut params, style.attrs);
    if let Some(fg) = style.fg {
        push_color_params(&mut params, fg.downgrade(depth), false);
    }
    if let Some(bg) = style.bg {
        push_color_params(&mut params, bg.downgrade(depth), true);
    }
    write_sgr(w, &params)
}

fn ansi16_code(index: u8, background: bool) -> u16 {
    let index = u16::from(index & 0x0F);
    let base = if index < 8 { 30 + index } else { 90 + index - 8 };
    if background { base + 10 } else { base }
}

fn push_flag_params(params: &mut Vec<u16>, flags: StyleFlags) {
    params.extend(
        FLAG_TABLE
            .iter()
            .filter(|(flag, _)| flags.contains(*flag))
            .map(|(_, code)| u16::from(*code)),
    );
}

fn push_color_params(params: &mut Vec<u16>, color: Color, background: bool) {
    let extended = if background { 48 } else { 38 };
    match color {
        Color::Ansi(n) => params.push(ansi16_code(n, background)),
        Color::Indexed(n) => params.extend([extended, 5, u16::from(n)]),
        Color::Rgb(r, g, b) => {
            params.extend([extended, 2, u16::from(r), u16::from(g), u16::from(b)]);
        }
    }
}

fn write_sgr<W: Write>(w: &mut W, params: &[u16]) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            w.write_all(b";")?;
        }
        write!(w, "{param}")?;
    }
    w.write_all(b"m")
}

// =============================================================================
// Cursor positioning
// =============================================================================

/// Move the cursor to 0-based `(row, col)`: emits 1-based `CSI row;col H`.
#[inline]
pub fn cup<W: Write>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        u32::from(row) + 1,
        u32::from(col) + 1
    )
}

/// Move to 0-based column `col` on the current row: `CSI col G`.
#[inline]
pub fn cha<W: Write>(w: &mut W, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{}G", u32::from(col) + 1)
}

/// Cursor home: `CSI H`
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

#[inline]
pub fn cursor_home<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

// =============================================================================
// Erase
// =============================================================================

/// Erase the whole display: `CSI 2 J`
pub const ERASE_DISPLAY: &[u8] = b"\x1b[2J";

#[inline]
pub fn erase_display<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ERASE_DISPLAY)
}

// =============================================================================
// Terminal modes
// =============================================================================

pub const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";
pub const ALT_SCREEN_LEAVE: &[u8] = b"\x1b[?1049l";
pub const BRACKETED_PASTE_ENABLE: &[u8] = b"\x1b[?2004h";
pub const BRACKETED_PASTE_DISABLE: &[u8] = b"\x1b[?2004l";

/// Button presses, drag motion, SGR encoding.
pub const MOUSE_ENABLE: &[u8] = b"\x1b[?1000;1002;1006h";
pub const MOUSE_DISABLE: &[u8] = b"\x1b[?1000;1002;1006l";

#[inline]
pub fn alt_screen_enter<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ALT_SCREEN_ENTER)
}

#[inline]
pub fn alt_screen_leave<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ALT_SCREEN_LEAVE)
}

#[inline]
pub fn bracketed_paste_enable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(BRACKETED_PASTE_ENABLE)
}

#[inline]
pub fn bracketed_paste_disable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(BRACKETED_PASTE_DISABLE)
}

#[inline]
pub fn mouse_enable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(MOUSE_ENABLE)
}

#[inline]
pub fn mouse_disable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(MOUSE_DISABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).expect("writing to a Vec cannot fail");
        String::from_utf8(out).expect("escape output is UTF-8")
    }

    #[test]
    fn cursor_position_is_one_based() {
        assert_eq!(emit(|w| cup(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cup(w, 4, 9)), "\x1b[5;10H");
        assert_eq!(emit(|w| cup(w, u16::MAX, 0)), "\x1b[65536;1H");
        assert_eq!(emit(|w| cha(w, 0)), "\x1b[1G");
    }

    #[test]
    fn flags() {
        assert_eq!(emit(|w| sgr_flags(w, StyleFlags::empty())), "");
        assert_eq!(
            emit(|w| sgr_flags(w, StyleFlags::BOLD | StyleFlags::REVERSE)),
            "\x1b[1;7m"
        );
    }

    #[test]
    fn sixteen_colors() {
        assert_eq!(emit(|w| sgr_fg_16(w, 1)), "\x1b[31m");
        assert_eq!(emit(|w| sgr_fg_16(w, 9)), "\x1b[91m");
        assert_eq!(emit(|w| sgr_bg_16(w, 4)), "\x1b[44m");
        assert_eq!(emit(|w| sgr_bg_16(w, 15)), "\x1b[107m");
    }

    #[test]
    fn extended_colors() {
        assert_eq!(emit(|w| sgr_fg_256(w, 202)), "\x1b[38;5;202m");
        assert_eq!(emit(|w| sgr_bg_rgb(w, 1, 2, 3)), "\x1b[48;2;1;2;3m");
    }

    #[test]
    fn full_style_in_one_sequence() {
        let style = Style::new().bold().fg(Color::RED).bg(Color::Indexed(17));
        assert_eq!(
            emit(|w| sgr_style(w, &style, ColorDepth::TrueColor)),
            "\x1b[0;1;31;48;5;17m"
        );
        assert_eq!(emit(|w| sgr_style(w, &Style::new(), ColorDepth::Ansi16)), "\x1b[0m");
    }

    #[test]
    fn style_downgrades_colors() {
        let style = Style::new().fg(Color::Rgb(255, 0, 0));
        assert_eq!(
            emit(|w| sgr_style(w, &style, ColorDepth::Ansi256)),
            "\x1b[0;38;5;196m"
        );
        assert_eq!(emit(|w| sgr_style(w, &style, ColorDepth::Ansi16)), "\x1b[0;91m");
    }

    #[test]
    fn mode_constants() {
        assert_eq!(emit(alt_screen_enter), "\x1b[?1049h");
        assert_eq!(emit(mouse_disable), "\x1b[?1000;1002;1006l");
        assert_eq!(emit(erase_display), "\x1b[2J");
    }
}
