#![forbid(unsafe_code)]

//! Terminal capability detection.
//!
//! Capabilities are computed once, usually at startup, and then passed by
//! value to whatever needs them (the renderer picks a color depth, paint
//! contexts pick Unicode or ASCII glyphs). Detection is a pure function of
//! the environment, so the same inputs always produce the same result.
//!
//! # Detection Strategy
//!
//! - `LC_ALL`, `LC_CTYPE`, `LANG`: first non-empty value decides Unicode
//!   support (a `UTF-8` codeset enables it)
//! - `TERM`: `dumb` or empty disables everything; `*-256color` enables the
//!   256-color palette; `linux` and `vt*` consoles lack Unicode line drawing
//! - `COLORTERM`: `truecolor` or `24bit` enables RGB
//! - `NO_COLOR`: present disables color upgrades
//! - `WEFT_GLYPH_MODE`: `unicode` or `ascii` overrides the locale decision

use std::env;

/// Environment variable overriding glyph mode (`unicode` or `ascii`).
pub const ENV_GLYPH_MODE: &str = "WEFT_GLYPH_MODE";

/// What the attached terminal can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    /// Box drawing and other non-ASCII glyphs render correctly.
    pub unicode: bool,
    /// 24-bit RGB colors.
    pub true_color: bool,
    /// The 256-color palette.
    pub colors_256: bool,
    /// SGR (1006) mouse reporting.
    pub mouse_sgr: bool,
    /// Bracketed paste mode.
    pub bracketed_paste: bool,
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self::basic()
    }
}

/// Raw environment values that detection depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectInputs {
    pub locale: String,
    pub term: String,
    pub colorterm: String,
    pub no_color: bool,
    pub glyph_mode: Option<String>,
}

impl DetectInputs {
    /// Read the inputs from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Read the inputs through an injectable lookup.
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|key| get_env(key))
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        Self {
            locale,
            term: get_env("TERM").unwrap_or_default(),
            colorterm: get_env("COLORTERM").unwrap_or_default(),
            no_color: get_env("NO_COLOR").is_some(),
            glyph_mode: get_env(ENV_GLYPH_MODE),
        }
    }
}

impl TerminalCapabilities {
    /// Conservative defaults: ASCII glyphs, 16 colors, SGR mouse.
    pub const fn basic() -> Self {
        Self {
            unicode: false,
            true_color: false,
            colors_256: false,
            mouse_sgr: true,
            bracketed_paste: true,
        }
    }

    /// Everything on; useful for tests and known-modern terminals.
    pub const fn modern() -> Self {
        Self {
            unicode: true,
            true_color: true,
            colors_256: true,
            mouse_sgr: true,
            bracketed_paste: true,
        }
    }

    /// Detect from the process environment.
    pub fn detect() -> Self {
        Self::detect_from_inputs(&DetectInputs::from_env())
    }

    pub fn detect_from_inputs(inputs: &DetectInputs) -> Self {
        let term = inputs.term.as_str();
        let is_dumb = term.is_empty() || term == "dumb";
        let is_console = term == "linux" || term.starts_with("vt");

        let locale = inputs.locale.to_ascii_lowercase();
        let utf8_locale = locale.contains("utf-8") || locale.contains("utf8");
        let unicode = match inputs.glyph_mode.as_deref().map(str::trim) {
            Some(mode) if mode.eq_ignore_ascii_case("unicode") => true,
            Some(mode) if mode.eq_ignore_ascii_case("ascii") => false,
            _ => utf8_locale && !is_dumb && !is_console,
        };

        let colorterm = inputs.colorterm.to_ascii_lowercase();
        let color_allowed = !inputs.no_color && !is_dumb;
        let true_color =
            color_allowed && (colorterm.contains("truecolor") || colorterm.contains("24bit"));
        let colors_256 = color_allowed && (true_color || term.contains("256color"));

        Self {
            unicode,
            true_color,
            colors_256,
            mouse_sgr: !is_dumb,
            bracketed_paste: !is_dumb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn detect(vars: &[(&str, &str)]) -> TerminalCapabilities {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TerminalCapabilities::detect_from_inputs(&DetectInputs::from_env_with(|key| {
            map.get(key).cloned()
        }))
    }

    #[test]
    fn utf8_xterm_256() {
        let caps = detect(&[("LANG", "en_US.UTF-8"), ("TERM", "xterm-256color")]);
        assert!(caps.unicode);
        assert!(caps.colors_256);
        assert!(!caps.true_color);
        assert!(caps.mouse_sgr);
    }

    #[test]
    fn truecolor_implies_256() {
        let caps = detect(&[("TERM", "xterm"), ("COLORTERM", "truecolor")]);
        assert!(caps.true_color);
        assert!(caps.colors_256);
    }

    #[test]
    fn no_color_disables_upgrades() {
        let caps = detect(&[
            ("TERM", "xterm-256color"),
            ("COLORTERM", "truecolor"),
            ("NO_COLOR", "1"),
        ]);
        assert!(!caps.true_color);
        assert!(!caps.colors_256);
    }

    #[test]
    fn dumb_terminal_has_nothing() {
        let caps = detect(&[("TERM", "dumb"), ("LANG", "C.UTF-8")]);
        assert!(!caps.unicode);
        assert!(!caps.mouse_sgr);
        assert!(!caps.bracketed_paste);
    }

    #[test]
    fn lc_all_wins_over_lang() {
        let caps = detect(&[("TERM", "xterm"), ("LC_ALL", "C"), ("LANG", "en_US.UTF-8")]);
        assert!(!caps.unicode);
        let caps = detect(&[("TERM", "xterm"), ("LC_ALL", ""), ("LANG", "en_US.utf8")]);
        assert!(caps.unicode);
    }

    #[test]
    fn glyph_mode_override() {
        let caps = detect(&[("TERM", "xterm"), ("LANG", "C"), (ENV_GLYPH_MODE, "Unicode")]);
        assert!(caps.unicode);
        let caps = detect(&[
            ("TERM", "xterm"),
            ("LANG", "en_US.UTF-8"),
            (ENV_GLYPH_MODE, "ascii"),
        ]);
        assert!(!caps.unicode);
    }

    #[test]
    fn linux_console_is_ascii() {
        let caps = detect(&[("TERM", "linux"), ("LANG", "en_US.UTF-8")]);
        assert!(!caps.unicode);
    }

    #[test]
    fn detection_is_deterministic() {
        let vars = [("TERM", "xterm-256color"), ("LANG", "en_US.UTF-8")];
        assert_eq!(detect(&vars), detect(&vars));
    }
}
