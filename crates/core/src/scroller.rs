use std::time::Duration;

use thiserror::Error;

/// Base dwell time per line at speed 1.0.
pub const BASE_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_SPEED: f32 = 0.7;
pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScrollerError {
    #[error("scroller needs at least one line")]
    Empty,
}

/// Cursor over the lines of a long-form text, with optional auto-advance.
///
/// Navigation wraps around at both ends. The caller owns the timer: it sleeps
/// for [`SentenceScroller::interval`] and calls [`SentenceScroller::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceScroller {
    lines: Vec<String>,
    index: usize,
    auto: bool,
    speed: f32,
}

impl SentenceScroller {
    /// # Errors
    ///
    /// Returns `ScrollerError::Empty` when `lines` is empty.
    pub fn new(lines: Vec<String>) -> Result<Self, ScrollerError> {
        if lines.is_empty() {
            return Err(ScrollerError::Empty);
        }
        Ok(Self {
            lines,
            index: 0,
            auto: false,
            speed: DEFAULT_SPEED,
        })
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.lines[self.index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn is_auto_scrolling(&self) -> bool {
        self.auto
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Sets the speed multiplier, clamped to `[MIN_SPEED, MAX_SPEED]`.
    /// Non-finite values reset to the default speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() {
            speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            DEFAULT_SPEED
        };
    }

    pub fn toggle_auto(&mut self) -> bool {
        self.auto = !self.auto;
        self.auto
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.lines.len();
    }

    pub fn previous(&mut self) {
        self.index = (self.index + self.lines.len() - 1) % self.lines.len();
    }

    /// Advances one line if auto-scrolling. Returns whether the cursor moved.
    pub fn tick(&mut self) -> bool {
        if self.auto {
            self.next();
        }
        self.auto
    }

    /// Dwell time per line at the current speed.
    #[must_use]
    pub fn interval(&self) -> Duration {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = (BASE_INTERVAL_MS as f32 / self.speed).round() as u64;
        Duration::from_millis(ms)
    }

    /// Fraction of the text read so far, in `(0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let fraction = (self.index + 1) as f32 / self.lines.len() as f32;
        fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroller(n: usize) -> SentenceScroller {
        SentenceScroller::new((1..=n).map(|i| format!("line {i}")).collect()).unwrap()
    }

    #[test]
    fn rejects_empty_text() {
        assert_eq!(SentenceScroller::new(Vec::new()).unwrap_err(), ScrollerError::Empty);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut s = scroller(3);
        s.previous();
        assert_eq!(s.index(), 2);
        assert_eq!(s.current(), "line 3");
        s.next();
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn tick_only_moves_while_auto() {
        let mut s = scroller(2);
        assert!(!s.tick());
        assert_eq!(s.index(), 0);
        assert!(s.toggle_auto());
        assert!(s.tick());
        assert_eq!(s.index(), 1);
        assert!(s.tick());
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn interval_scales_with_speed() {
        let s = scroller(1).with_speed(1.0);
        assert_eq!(s.interval(), Duration::from_millis(3_000));
        let s = scroller(1).with_speed(0.5);
        assert_eq!(s.interval(), Duration::from_millis(6_000));
        let s = scroller(1).with_speed(100.0);
        assert!((s.speed() - MAX_SPEED).abs() < f32::EPSILON);
        let s = scroller(1).with_speed(f32::NAN);
        assert!((s.speed() - DEFAULT_SPEED).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_counts_current_line() {
        let mut s = scroller(4);
        assert!((s.progress() - 0.25).abs() < f32::EPSILON);
        s.next();
        s.next();
        s.next();
        assert!((s.progress() - 1.0).abs() < f32::EPSILON);
    }
}
