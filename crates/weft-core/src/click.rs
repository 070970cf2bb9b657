#![forbid(unsafe_code)]

//! Click and double-click synthesis from raw press/release reports.
//!
//! Terminals only report button transitions. [`ClickSynthesizer`] watches the
//! stream and rewrites a release that lands near its press into a
//! [`MouseEventKind::Click`], and a click that quickly follows another nearby
//! click into a [`MouseEventKind::DoubleClick`].
//!
//! # Invariants
//!
//! 1. Only releases are rewritten; every other event passes through unchanged.
//! 2. A double click consumes the click memory, so a third rapid click is a
//!    fresh single click rather than a triple.
//! 3. Any click that does not pair up becomes the new first click.

use std::time::{Duration, Instant};

use crate::event::{MouseButton, MouseEvent, MouseEventKind};

/// Thresholds for click synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickConfig {
    /// Longest gap between two clicks that still counts as a double click.
    /// Default: 500ms
    pub double_click_threshold: Duration,

    /// Largest Manhattan distance in cells between press and release, and
    /// between the two clicks of a double click.
    /// Default: 2
    pub double_click_distance: u16,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            double_click_threshold: Duration::from_millis(500),
            double_click_distance: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    button: MouseButton,
    x: u16,
    y: u16,
    at: Instant,
}

impl Mark {
    fn distance_to(&self, x: u16, y: u16) -> u32 {
        u32::from(self.x.abs_diff(x)) + u32::from(self.y.abs_diff(y))
    }
}

/// Stateful click detector; one instance per input session.
#[derive(Debug, Clone, Default)]
pub struct ClickSynthesizer {
    config: ClickConfig,
    press: Option<Mark>,
    last_click: Option<Mark>,
}

impl ClickSynthesizer {
    pub fn new(config: ClickConfig) -> Self {
        Self {
            config,
            press: None,
            last_click: None,
        }
    }

    pub fn config(&self) -> &ClickConfig {
        &self.config
    }

    /// Feed one decoded mouse event observed at `now`.
    pub fn process(&mut self, event: MouseEvent, now: Instant) -> MouseEvent {
        match event.kind {
            MouseEventKind::Press => {
                self.press = Some(Mark {
                    button: event.button,
                    x: event.x,
                    y: event.y,
                    at: now,
                });
                event
            }
            MouseEventKind::Release => self.release(event, now),
            _ => event,
        }
    }

    /// Forget any pending press and click.
    pub fn reset(&mut self) {
        self.press = None;
        self.last_click = None;
    }

    fn release(&mut self, event: MouseEvent, now: Instant) -> MouseEvent {
        let Some(press) = self.press.take() else {
            return event;
        };
        // Legacy encodings cannot say which button was released.
        let button = if event.button == MouseButton::None {
            press.button
        } else {
            event.button
        };
        let max = u32::from(self.config.double_click_distance);
        if button != press.button || press.distance_to(event.x, event.y) > max {
            return event;
        }

        let mut click = event;
        click.button = button;

        let pairs_with_last = self.last_click.is_some_and(|prev| {
            prev.button == button
                && now.duration_since(prev.at) <= self.config.double_click_threshold
                && prev.distance_to(event.x, event.y) <= max
        });

        if pairs_with_last {
            self.last_click = None;
            click.kind = MouseEventKind::DoubleClick;
            click.click_count = 2;
        } else {
            self.last_click = Some(Mark {
                button,
                x: event.x,
                y: event.y,
                at: now,
            });
            click.kind = MouseEventKind::Click;
            click.click_count = 1;
        }
        click
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn press(x: u16, y: u16) -> MouseEvent {
        MouseEvent::new(MouseEventKind::Press, MouseButton::Left, x, y)
    }

    fn release(x: u16, y: u16) -> MouseEvent {
        MouseEvent::new(MouseEventKind::Release, MouseButton::Left, x, y)
    }

    #[test]
    fn press_passes_through() {
        let mut clicks = ClickSynthesizer::default();
        let ev = clicks.process(press(1, 1), Instant::now());
        assert_eq!(ev, press(1, 1));
    }

    #[test]
    fn release_near_press_is_click() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        clicks.process(press(4, 2), t0);
        let ev = clicks.process(release(5, 3), at(t0, 100));
        assert_eq!(ev.kind, MouseEventKind::Click);
        assert_eq!(ev.click_count, 1);
        assert_eq!(ev.position(), (5, 3));
    }

    #[test]
    fn release_far_from_press_stays_release() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        clicks.process(press(0, 0), t0);
        let ev = clicks.process(release(2, 1), at(t0, 50));
        assert_eq!(ev.kind, MouseEventKind::Release);
    }

    #[test]
    fn release_of_other_button_stays_release() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        clicks.process(press(0, 0), t0);
        let right = MouseEvent::new(MouseEventKind::Release, MouseButton::Right, 0, 0);
        assert_eq!(clicks.process(right, t0).kind, MouseEventKind::Release);
    }

    #[test]
    fn release_without_press_stays_release() {
        let mut clicks = ClickSynthesizer::default();
        let ev = clicks.process(release(0, 0), Instant::now());
        assert_eq!(ev.kind, MouseEventKind::Release);
    }

    #[test]
    fn buttonless_release_inherits_press_button() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        let right = MouseEvent::new(MouseEventKind::Press, MouseButton::Right, 3, 3);
        clicks.process(right, t0);
        let legacy = MouseEvent::new(MouseEventKind::Release, MouseButton::None, 3, 3);
        let ev = clicks.process(legacy, at(t0, 10));
        assert_eq!(ev.kind, MouseEventKind::Click);
        assert_eq!(ev.button, MouseButton::Right);
    }

    #[test]
    fn click_double_then_fresh_click() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();

        clicks.process(press(4, 2), t0);
        assert_eq!(clicks.process(release(4, 2), at(t0, 100)).kind, MouseEventKind::Click);

        clicks.process(press(4, 2), at(t0, 200));
        let second = clicks.process(release(4, 2), at(t0, 300));
        assert_eq!(second.kind, MouseEventKind::DoubleClick);
        assert_eq!(second.click_count, 2);

        clicks.process(press(4, 2), at(t0, 400));
        let third = clicks.process(release(4, 2), at(t0, 500));
        assert_eq!(third.kind, MouseEventKind::Click);
        assert_eq!(third.click_count, 1);
    }

    #[test]
    fn slow_second_click_starts_over() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        clicks.process(press(0, 0), t0);
        clicks.process(release(0, 0), at(t0, 10));
        clicks.process(press(0, 0), at(t0, 700));
        let ev = clicks.process(release(0, 0), at(t0, 710));
        assert_eq!(ev.kind, MouseEventKind::Click);

        // The slow click became the new first click.
        clicks.process(press(0, 0), at(t0, 800));
        let ev = clicks.process(release(0, 0), at(t0, 810));
        assert_eq!(ev.kind, MouseEventKind::DoubleClick);
    }

    #[test]
    fn distant_second_click_is_not_double() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::default();
        clicks.process(press(0, 0), t0);
        clicks.process(release(0, 0), at(t0, 10));
        clicks.process(press(10, 0), at(t0, 20));
        let ev = clicks.process(release(10, 0), at(t0, 30));
        assert_eq!(ev.kind, MouseEventKind::Click);
    }

    #[test]
    fn custom_thresholds() {
        let t0 = Instant::now();
        let mut clicks = ClickSynthesizer::new(ClickConfig {
            double_click_threshold: Duration::from_millis(50),
            double_click_distance: 0,
        });
        clicks.process(press(1, 1), t0);
        assert_eq!(clicks.process(release(1, 2), t0).kind, MouseEventKind::Release);
        clicks.process(press(1, 1), t0);
        clicks.process(release(1, 1), t0);
        clicks.process(press(1, 1), at(t0, 60));
        assert_eq!(clicks.process(release(1, 1), at(t0, 60)).kind, MouseEventKind::Click);
    }

    #[test]
    fn other_events_pass_through() {
        let mut clicks = ClickSynthesizer::default();
        let scroll = MouseEvent::new(MouseEventKind::Scroll, MouseButton::ScrollUp, 1, 1);
        assert_eq!(clicks.process(scroll, Instant::now()), scroll);
    }
}
