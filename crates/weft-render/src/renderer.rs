#![forbid(unsafe_code)]

//! Diff renderer: turns a frame into the bytes that update the terminal.
//!
//! # Modes
//!
//! - **Full**: no previous frame, or the size changed. Clears the screen,
//!   homes the cursor and writes every row. Rows are separated by `\n` plus a
//!   move to column 1, so stripping the escapes from the output yields exactly
//!   [`ScreenBuffer::to_text`].
//! - **Incremental**: only cells that differ inside the new buffer's dirty
//!   union are written. The cursor position is tracked so that consecutive
//!   cells on a row need no repositioning.
//! - **Skipped**: nothing dirty, nothing changed; no bytes at all.
//!
//! Style changes always reset first (`CSI 0;… m`), so the emitted style never
//! depends on what the terminal had before. Output that wrote any styled cell
//! ends with a reset.

use std::io::{self, Write};

use weft_core::TerminalCapabilities;

use crate::ansi;
use crate::buffer::ScreenBuffer;
use crate::cell::Cell;
use crate::color::ColorDepth;
use crate::diff::BufferDiff;
use crate::style::Style;

/// How a frame was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    Full,
    Incremental,
    #[default]
    Skipped,
}

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub mode: RenderMode,
    pub cells_written: usize,
    pub cursor_moves: usize,
    pub style_changes: usize,
    pub bytes: usize,
}

/// Rendered bytes plus what it took to produce them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFrame {
    pub bytes: Vec<u8>,
    pub stats: RenderStats,
}

/// Stateless frame-to-bytes converter.
#[derive(Debug, Clone, Copy)]
pub struct DiffRenderer {
    depth: ColorDepth,
}

impl DiffRenderer {
    pub fn new(caps: &TerminalCapabilities) -> Self {
        Self {
            depth: ColorDepth::from_capabilities(caps),
        }
    }

    pub fn with_depth(depth: ColorDepth) -> Self {
        Self { depth }
    }

    pub fn color_depth(&self) -> ColorDepth {
        self.depth
    }

    /// Bytes that turn a screen showing `old` into one showing `new`.
    pub fn render_diff(&self, old: Option<&ScreenBuffer>, new: &ScreenBuffer) -> Vec<u8> {
        self.render(old, new).bytes
    }

    pub fn render(&self, old: Option<&ScreenBuffer>, new: &ScreenBuffer) -> RenderedFrame {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "render_diff",
            width = new.width(),
            height = new.height(),
            has_previous = old.is_some()
        )
        .entered();

        let mut bytes = Vec::new();
        let full = old.is_none_or(|old| {
            old.width() != new.width() || old.height() != new.height()
        });
        // Writes into a Vec cannot fail.
        let result = match old {
            Some(old) if !full => self.emit_incremental(&mut bytes, old, new),
            _ => self.emit_full(&mut bytes, new),
        };
        let mut stats = result.unwrap_or_default();
        stats.bytes = bytes.len();

        #[cfg(feature = "tracing")]
        tracing::trace!(
            mode = ?stats.mode,
            cells = stats.cells_written,
            cursor_moves = stats.cursor_moves,
            bytes = stats.bytes,
            "frame rendered"
        );

        RenderedFrame { bytes, stats }
    }

    /// Render and write to `w`, flushing once.
    pub fn present<W: Write>(
        &self,
        w: &mut W,
        old: Option<&ScreenBuffer>,
        new: &ScreenBuffer,
    ) -> io::Result<RenderStats> {
        let frame = self.render(old, new);
        if !frame.bytes.is_empty() {
            w.write_all(&frame.bytes)?;
            w.flush()?;
        }
        Ok(frame.stats)
    }

    fn emit_full(&self, out: &mut Vec<u8>, new: &ScreenBuffer) -> io::Result<RenderStats> {
        let mut stats = RenderStats {
            mode: RenderMode::Full,
            ..RenderStats::default()
        };
        ansi::sgr_reset(out)?;
        ansi::erase_display(out)?;
        ansi::cursor_home(out)?;

        let mut current = Style::default();
        for y in 0..new.height() {
            if y > 0 {
                out.write_all(b"\n")?;
                ansi::cha(out, 0)?;
            }
            for cell in new.row(y) {
                if cell.is_continuation() {
                    continue;
                }
                let style = cell.style();
                if style != current {
                    ansi::sgr_style(out, &style, self.depth)?;
                    current = style;
                    stats.style_changes += 1;
                }
                write_glyph(out, cell)?;
                stats.cells_written += 1;
            }
            if !current.is_plain() {
                ansi::sgr_reset(out)?;
                current = Style::default();
            }
        }
        Ok(stats)
    }

    fn emit_incremental(
        &self,
        out: &mut Vec<u8>,
        old: &ScreenBuffer,
        new: &ScreenBuffer,
    ) -> io::Result<RenderStats> {
        let mut stats = RenderStats::default();
        let diff = BufferDiff::compute(old, new);
        if diff.is_empty() {
            return Ok(stats);
        }
        stats.mode = RenderMode::Incremental;

        let mut cursor: Option<(u16, u16)> = None;
        let mut current: Option<Style> = None;
        for &(x, y) in diff.changes() {
            let Some(cell) = new.get(x, y) else {
                continue;
            };
            // The head cell's glyph already covers its continuation.
            if cell.is_continuation() {
                continue;
            }
            if cursor != Some((x, y)) {
                ansi::cup(out, y, x)?;
                stats.cursor_moves += 1;
            }
            let style = cell.style();
            if current != Some(style) {
                ansi::sgr_style(out, &style, self.depth)?;
                current = Some(style);
                stats.style_changes += 1;
            }
            write_glyph(out, cell)?;
            stats.cells_written += 1;

            let next = x.saturating_add(cell.width());
            cursor = (next < new.width()).then_some((next, y));
        }
        if stats.cells_written > 0 {
            ansi::sgr_reset(out)?;
        }
        Ok(stats)
    }
}

/// Control characters would move the terminal cursor; they print as spaces.
fn write_glyph(out: &mut Vec<u8>, cell: &Cell) -> io::Result<()> {
    let mut utf8 = [0u8; 4];
    out.write_all(cell.ch.encode_utf8(&mut utf8).as_bytes())
}
