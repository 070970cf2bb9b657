#![forbid(unsafe_code)]

//! Display-width measurement and wrapping for terminal text.
//!
//! Widths are in terminal columns: most characters take one, East Asian wide
//! characters and many emoji take two, combining marks take none. Text is
//! segmented into extended grapheme clusters so a base character and its
//! combining marks are measured and wrapped as one unit.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Columns occupied by one grapheme cluster, clamped to `0..=2`.
#[inline]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_ascii() {
        return grapheme.bytes().filter(|b| (0x20..0x7F).contains(b)).count().min(1);
    }
    // C1 controls reach here; like C0 they occupy no cell.
    if grapheme.chars().next().is_some_and(char::is_control) {
        return 0;
    }
    grapheme.width().min(2)
}

/// Columns occupied by a single line of text.
pub fn display_width(text: &str) -> usize {
    if text.is_ascii() {
        return text.bytes().filter(|b| (0x20..0x7F).contains(b)).count();
    }
    text.graphemes(true).map(grapheme_width).sum()
}

/// Widest line and line count of a block of text.
///
/// An empty string is zero lines; a trailing newline does not add a line.
pub fn measure_lines(text: &str) -> (usize, usize) {
    text.lines()
        .fold((0, 0), |(width, count), line| (width.max(display_width(line)), count + 1))
}

/// Longest prefix of `text` that fits in `max_width` columns.
///
/// Returns the prefix and its width. A wide grapheme that would straddle the
/// limit is left out entirely.
pub fn truncate_to_width(text: &str, max_width: usize) -> (&str, usize) {
    let mut used = 0;
    for (offset, grapheme) in text.grapheme_indices(true) {
        let w = grapheme_width(grapheme);
        if used + w > max_width {
            return (&text[..offset], used);
        }
        used += w;
    }
    (text, used)
}

/// Break one line into rows of at most `width` columns.
///
/// Breaks prefer the last whitespace before the limit; a word longer than a
/// whole row is split mid-word. An empty line wraps to a single empty row.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;
    // Byte offset in `row` just after the last whitespace, and the width there.
    let mut last_break: Option<(usize, usize)> = None;

    for grapheme in line.graphemes(true) {
        let w = grapheme_width(grapheme);
        if row_width + w > width && !row.is_empty() {
            if grapheme.trim().is_empty() {
                rows.push(std::mem::take(&mut row).trim_end().to_string());
                row_width = 0;
                last_break = None;
                continue;
            }
            match last_break {
                Some((at, at_width)) if at < row.len() => {
                    let rest = row.split_off(at);
                    rows.push(row.trim_end().to_string());
                    row = rest;
                    row_width -= at_width;
                }
                _ => {
                    rows.push(std::mem::take(&mut row).trim_end().to_string());
                    row_width = 0;
                }
            }
            last_break = None;
            if row.is_empty() && grapheme.trim().is_empty() {
                continue;
            }
        }
        row.push_str(grapheme);
        row_width += w;
        if grapheme.trim().is_empty() {
            last_break = Some((row.len(), row_width));
        }
    }
    rows.push(row.trim_end().to_string());
    rows
}

/// Wrap every line of a block of text.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    text.lines().flat_map(|line| wrap_line(line, width)).collect()
}
