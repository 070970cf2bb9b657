//! Property-based invariant tests for input decoding and geometry.
//!
//! 1. The parser never panics on arbitrary bytes.
//! 2. Decoding is independent of how the input is split across reads.
//! 3. Every mouse report decodes to 0-based coordinates one less than sent.
//! 4. Bounds intersection is commutative and lies within both inputs.
//! 5. Union contains both (non-empty) inputs.
//! 6. `Size::Percent` never exceeds the available extent at or below 100%.

use proptest::prelude::*;
use weft_core::event::{Event, MouseEventKind};
use weft_core::geometry::{Bounds, Size};
use weft_core::input_parser::InputParser;

// ── Helpers ─────────────────────────────────────────────────────────────

fn bounds_strategy() -> impl Strategy<Value = Bounds> {
    (0u16..=500, 0u16..=500, 0u16..=500, 0u16..=500)
        .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
}

/// Byte soup biased towards escape-sequence structure.
fn input_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            any::<u8>(),
            Just(0x1B),
            Just(b'['),
            Just(b';'),
            Just(b'<'),
            Just(b'M'),
            Just(b'~'),
            (b'0'..=b'9'),
        ],
        0..200,
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1. No panics
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn parser_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut parser = InputParser::new();
        let _ = parser.parse(&bytes);
        let _ = parser.flush();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Split independence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn decoding_ignores_read_boundaries(bytes in input_strategy(), split in 0usize..200) {
        let split = split.min(bytes.len());
        let whole = InputParser::new().parse(&bytes);

        let mut parser = InputParser::new();
        let mut pieces = parser.parse(&bytes[..split]);
        pieces.extend(parser.parse(&bytes[split..]));

        prop_assert_eq!(whole, pieces);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Mouse coordinates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sgr_coordinates_are_zero_based(x in 1u16..=1000, y in 1u16..=1000, button in 0u16..3) {
        let seq = format!("\x1b[<{button};{x};{y}M");
        let events = InputParser::new().parse(seq.as_bytes());
        prop_assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Mouse(m) => {
                prop_assert_eq!(m.kind, MouseEventKind::Press);
                prop_assert_eq!(m.position(), (x - 1, y - 1));
            }
            other => prop_assert!(false, "unexpected event {:?}", other),
        }
    }

    #[test]
    fn legacy_coordinates_are_zero_based(x in 1u8..=200, y in 1u8..=200) {
        let seq = [0x1B, b'[', b'M', 32, x + 32, y + 32];
        let events = InputParser::new().parse(&seq);
        match events.as_slice() {
            [Event::Mouse(m)] => prop_assert_eq!(m.position(), (u16::from(x) - 1, u16::from(y) - 1)),
            other => prop_assert!(false, "unexpected events {:?}", other),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Bounds algebra
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_commutes_and_fits(a in bounds_strategy(), b in bounds_strategy()) {
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        if let Some(i) = a.intersection(&b) {
            prop_assert!(i.x >= a.x && i.right() <= a.right());
            prop_assert!(i.y >= b.y && i.bottom() <= b.bottom());
            prop_assert!(a.overlaps(&b));
        } else {
            prop_assert!(!a.overlaps(&b));
        }
    }

    #[test]
    fn union_contains_both(a in bounds_strategy(), b in bounds_strategy()) {
        prop_assume!(!a.is_empty() && !b.is_empty());
        let u = a.union(&b);
        prop_assert!(u.x <= a.x && u.y <= a.y && u.right() >= a.right() && u.bottom() >= a.bottom());
        prop_assert!(u.x <= b.x && u.y <= b.y && u.right() >= b.right() && u.bottom() >= b.bottom());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Percent sizing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn percent_is_bounded(available in any::<u16>(), p in 0u16..=100) {
        let resolved = Size::Percent(p).resolve(available, 0);
        prop_assert!(resolved <= available);
    }
}
