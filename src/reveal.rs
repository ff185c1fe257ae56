//! Entrance animations for content blocks.
//!
//! Each block is Hidden until enough of it is inside the viewport, then
//! Visible. With `once` set the transition is one-way; otherwise leaving the
//! viewport hides it again. Timing is compressed while the page scrolls fast.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

pub const MIN_DELAY_MS: f64 = 50.0;
pub const MIN_DURATION_S: f64 = 0.2;

/// Maps scroll speed in pixels per millisecond to an animation speed-up.
pub fn multiplier_for_speed(speed: f64) -> u32 {
    if speed > 2.0 {
        3
    } else if speed > 1.0 {
        2
    } else {
        1
    }
}

/// Shared scroll-speed estimate, updated on every scroll. Positions are in
/// pixels; the page converts rows with `page::ROW_HEIGHT_PX`.
#[derive(Debug, Clone)]
pub struct ScrollSpeedTracker {
    last_y: f64,
    last_time: Instant,
    speed: f64,
    multiplier: u32,
}

impl ScrollSpeedTracker {
    pub fn new(y: f64, now: Instant) -> Self {
        Self {
            last_y: y,
            last_time: now,
            speed: 0.0,
            multiplier: 1,
        }
    }

    pub fn update(&mut self, y: f64, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.last_time).as_secs_f64() * 1000.0;
        if elapsed_ms > 0.0 {
            self.speed = (y - self.last_y).abs() / elapsed_ms;
            self.multiplier = multiplier_for_speed(self.speed);
        }
        self.last_y = y;
        self.last_time = now;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealOptions {
    pub direction: Direction,
    pub delay_ms: f64,
    pub duration_s: f64,
    /// Slide distance in rows (or columns for horizontal directions).
    pub distance: u16,
    pub once: bool,
    /// Visible fraction of the block that triggers the reveal.
    pub threshold: f64,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Up,
            delay_ms: 0.0,
            duration_s: 0.6,
            distance: 3,
            once: true,
            threshold: 0.1,
        }
    }
}

impl RevealOptions {
    pub fn delayed(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn sliding(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealTiming {
    pub delay_ms: f64,
    pub duration_s: f64,
}

impl RevealTiming {
    /// Divides delay and duration by the multiplier, never going under the floors.
    pub fn compute(options: &RevealOptions, multiplier: u32) -> Self {
        let m = multiplier.max(1) as f64;
        Self {
            delay_ms: (options.delay_ms / m).max(MIN_DELAY_MS),
            duration_s: (options.duration_s / m).max(MIN_DURATION_S),
        }
    }

    fn total(&self) -> Duration {
        Duration::from_secs_f64(self.delay_ms / 1000.0 + self.duration_s)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealState {
    pub in_view: bool,
    pub has_triggered_once: bool,
    visible_since: Option<Instant>,
    timing: Option<RevealTiming>,
}

impl RevealState {
    /// Feeds the current intersection ratio. Timing is fixed when the block
    /// becomes visible, using the speed multiplier of that moment.
    pub fn observe(&mut self, ratio: f64, options: &RevealOptions, multiplier: u32, now: Instant) {
        let intersecting = ratio > 0.0 && ratio >= options.threshold;
        if intersecting {
            if !self.in_view {
                self.in_view = true;
                self.has_triggered_once = true;
                self.visible_since = Some(now);
                self.timing = Some(RevealTiming::compute(options, multiplier));
            }
        } else if !(options.once && self.has_triggered_once) {
            self.in_view = false;
            self.visible_since = None;
            self.timing = None;
        }
    }

    /// Animation progress in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f64 {
        let (Some(since), Some(timing)) = (self.visible_since, self.timing) else {
            return 0.0;
        };
        let elapsed_ms = now.saturating_duration_since(since).as_secs_f64() * 1000.0;
        if elapsed_ms < timing.delay_ms {
            return 0.0;
        }
        ((elapsed_ms - timing.delay_ms) / (timing.duration_s * 1000.0)).clamp(0.0, 1.0)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        match (self.visible_since, self.timing) {
            (Some(since), Some(timing)) => now.saturating_duration_since(since) < timing.total(),
            _ => false,
        }
    }
}

/// Fraction of `[top, top + height)` inside `[scroll_y, scroll_y + viewport)`.
pub fn intersection_ratio(top: u16, height: u16, scroll_y: u16, viewport: u16) -> f64 {
    if height == 0 {
        return 0.0;
    }
    let start = top.max(scroll_y) as u32;
    let end = (top as u32 + height as u32).min(scroll_y as u32 + viewport as u32);
    end.saturating_sub(start) as f64 / height as f64
}

/// Reveal state per mounted block, keyed by block key.
#[derive(Debug, Default)]
pub struct RevealRegistry {
    states: HashMap<String, RevealState>,
}

impl RevealRegistry {
    pub fn observe(&mut self, key: &str, ratio: f64, options: &RevealOptions, multiplier: u32, now: Instant) {
        self.states
            .entry(key.to_string())
            .or_default()
            .observe(ratio, options, multiplier, now);
    }

    pub fn get(&self, key: &str) -> Option<&RevealState> {
        self.states.get(key)
    }

    pub fn progress(&self, key: &str, now: Instant) -> f64 {
        self.states.get(key).map_or(0.0, |s| s.progress(now))
    }

    /// Drops state for blocks that are no longer on the page.
    pub fn retain_mounted(&mut self, mounted: &HashSet<String>) {
        self.states.retain(|key, _| mounted.contains(key));
    }

    pub fn any_animating(&self, now: Instant) -> bool {
        self.states.values().any(|s| s.is_animating(now))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_maps_to_multiplier() {
        assert_eq!(multiplier_for_speed(0.0), 1);
        assert_eq!(multiplier_for_speed(1.0), 1);
        assert_eq!(multiplier_for_speed(1.5), 2);
        assert_eq!(multiplier_for_speed(2.0), 2);
        assert_eq!(multiplier_for_speed(2.5), 3);
    }

    #[test]
    fn tracker_measures_pixels_per_millisecond() {
        let t0 = Instant::now();
        let mut tracker = ScrollSpeedTracker::new(0.0, t0);
        assert_eq!(tracker.multiplier(), 1);

        tracker.update(250.0, t0 + Duration::from_millis(100));
        assert!((tracker.speed() - 2.5).abs() < 1e-9);
        assert_eq!(tracker.multiplier(), 3);

        tracker.update(150.0, t0 + Duration::from_millis(200));
        assert_eq!(tracker.multiplier(), 1);
    }

    #[test]
    fn same_instant_update_keeps_previous_speed() {
        let t0 = Instant::now();
        let mut tracker = ScrollSpeedTracker::new(0.0, t0);
        tracker.update(100.0, t0 + Duration::from_millis(50));
        tracker.update(400.0, t0 + Duration::from_millis(50));
        assert_eq!(tracker.multiplier(), 2);
    }

    #[test]
    fn fast_scroll_divides_timing_with_floors() {
        let options = RevealOptions {
            delay_ms: 300.0,
            duration_s: 0.9,
            ..RevealOptions::default()
        };
        let fast = RevealTiming::compute(&options, multiplier_for_speed(2.5));
        assert!((fast.duration_s - 0.3).abs() < 1e-9);
        assert!((fast.delay_ms - 100.0).abs() < 1e-9);

        let defaults = RevealTiming::compute(&RevealOptions::default(), 3);
        assert_eq!(defaults.duration_s, MIN_DURATION_S);
        assert_eq!(defaults.delay_ms, MIN_DELAY_MS);

        let idle = RevealTiming::compute(&RevealOptions::default(), 1);
        assert!((idle.duration_s - 0.6).abs() < 1e-9);

        let zero = RevealTiming::compute(&RevealOptions::default(), 0);
        assert!(zero.duration_s >= MIN_DURATION_S);
    }

    #[test]
    fn once_pins_visible() {
        let options = RevealOptions::default();
        let mut state = RevealState::default();
        let now = Instant::now();
        state.observe(0.05, &options, 1, now);
        assert!(!state.in_view);
        state.observe(0.1, &options, 1, now);
        assert!(state.in_view && state.has_triggered_once);
        state.observe(0.0, &options, 1, now);
        assert!(state.in_view);
    }

    #[test]
    fn replay_hides_when_leaving() {
        let options = RevealOptions {
            once: false,
            ..RevealOptions::default()
        };
        let mut state = RevealState::default();
        let now = Instant::now();
        state.observe(0.5, &options, 1, now);
        state.observe(0.0, &options, 1, now);
        assert!(!state.in_view);
        assert!(state.has_triggered_once);
        assert_eq!(state.progress(now), 0.0);
    }

    #[test]
    fn progress_waits_for_delay_then_runs_for_duration() {
        let options = RevealOptions::default();
        let mut state = RevealState::default();
        let t0 = Instant::now();
        state.observe(1.0, &options, 1, t0);
        assert_eq!(state.progress(t0 + Duration::from_millis(40)), 0.0);
        let mid = state.progress(t0 + Duration::from_millis(350));
        assert!((mid - 0.5).abs() < 1e-6);
        assert_eq!(state.progress(t0 + Duration::from_secs(2)), 1.0);
        assert!(state.is_animating(t0 + Duration::from_millis(100)));
        assert!(!state.is_animating(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn intersection_ratio_clips_to_viewport() {
        assert_eq!(intersection_ratio(10, 10, 0, 30), 1.0);
        assert_eq!(intersection_ratio(25, 10, 0, 30), 0.5);
        assert_eq!(intersection_ratio(40, 10, 0, 30), 0.0);
        assert_eq!(intersection_ratio(0, 10, 5, 30), 0.5);
        assert_eq!(intersection_ratio(0, 0, 0, 30), 0.0);
    }

    #[test]
    fn registry_drops_unmounted_blocks() {
        let mut registry = RevealRegistry::default();
        let now = Instant::now();
        registry.observe("a", 1.0, &RevealOptions::default(), 1, now);
        registry.observe("b", 1.0, &RevealOptions::default(), 1, now);
        let mounted: HashSet<String> = ["a".to_string()].into_iter().collect();
        registry.retain_mounted(&mounted);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("b").is_none());
    }
}
