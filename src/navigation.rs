//! Active-section tracking.
//!
//! Three triggers move the active section: scrolling, key presses and
//! programmatic navigation requests. A request sets the section immediately and
//! suppresses scroll-driven recomputation for `SETTLE_DELAY`; scroll updates
//! during that window are ignored so the smooth scroll cannot fight the
//! highlight. The delay is a fixed constant, not tied to the scroll animation.

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::debug;

pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// A navigable page region. `id` names the layout span it scrolls to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub id: &'static str,
    pub label: &'static str,
    pub key: char,
}

pub const SECTIONS: [Section; 6] = [
    Section { id: "home", label: "Explore", key: '1' },
    Section { id: "about", label: "About", key: '2' },
    Section { id: "experience", label: "Experience", key: '3' },
    Section { id: "projects", label: "Projects", key: '4' },
    Section { id: "stack", label: "Stack", key: '5' },
    Section { id: "travels", label: "Personal Travels", key: '6' },
];

/// What navigation needs from the page: positions and a smooth-scroll primitive.
pub trait ScrollSurface {
    fn scroll_y(&self) -> u16;
    fn viewport_height(&self) -> u16;
    /// Document-relative top row of the region, if it is laid out.
    fn element_top(&self, id: &str) -> Option<u16>;
    fn smooth_scroll_to(&mut self, top: u16);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub active_section_id: String,
    pub sidebar_collapsed: bool,
    pub is_programmatic_scroll: bool,
    pub dialogs_open_count: usize,
}

pub struct NavigationController {
    sections: Vec<Section>,
    state: NavigationState,
    settle_at: Option<Instant>,
    hover_zone: u16,
}

impl NavigationController {
    pub fn new(sections: &[Section], sidebar_collapsed: bool, hover_zone: u16) -> Self {
        let first = sections.first().map(|s| s.id).unwrap_or_default();
        Self {
            sections: sections.to_vec(),
            state: NavigationState {
                active_section_id: first.to_string(),
                sidebar_collapsed,
                is_programmatic_scroll: false,
                dialogs_open_count: 0,
            },
            settle_at: None,
            hover_zone,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn active_section_id(&self) -> &str {
        &self.state.active_section_id
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.id == self.state.active_section_id)
    }

    /// Optimistically activates `section_id` and starts the settle window.
    /// A missing layout target still updates the highlight, it just does not scroll.
    pub fn request_scroll_to(&mut self, section_id: &str, surface: &mut impl ScrollSurface, now: Instant) {
        debug!(section_id, "navigation request");
        self.state.active_section_id = section_id.to_string();
        self.state.is_programmatic_scroll = true;
        // a newer request replaces the older deadline
        self.settle_at = Some(now + SETTLE_DELAY);
        if let Some(top) = surface.element_top(section_id) {
            surface.smooth_scroll_to(top);
        }
    }

    /// Ends the settle window once its deadline has passed.
    pub fn settle(&mut self, now: Instant) {
        if let Some(deadline) = self.settle_at {
            if now >= deadline {
                self.settle_at = None;
                self.state.is_programmatic_scroll = false;
            }
        }
    }

    /// Recomputes the active section from the scroll position. The active
    /// section is the last one whose top is at or above the scan line a third
    /// of the way down the viewport. Returns whether it changed.
    pub fn on_scroll(&mut self, surface: &impl ScrollSurface, now: Instant) -> bool {
        self.settle(now);
        if self.state.is_programmatic_scroll {
            return false;
        }
        let scan = surface.scroll_y() as f64 + surface.viewport_height() as f64 / 3.0;
        let mut current = self.sections.first().map(|s| s.id).unwrap_or_default();
        for section in &self.sections {
            if let Some(top) = surface.element_top(section.id) {
                if scan >= top as f64 {
                    current = section.id;
                }
            }
        }
        if current != self.state.active_section_id {
            debug!(from = %self.state.active_section_id, to = current, "active section changed by scroll");
            self.state.active_section_id = current.to_string();
            return true;
        }
        false
    }

    /// Shortcut digits and ←/→ (wrapping). Inert while any dialog is open.
    /// Returns whether the key was a navigation key that was acted on.
    pub fn on_key_press(&mut self, key: KeyCode, surface: &mut impl ScrollSurface, now: Instant) -> bool {
        if self.state.dialogs_open_count > 0 {
            return false;
        }
        let len = self.sections.len();
        if len == 0 {
            return false;
        }
        let target = match key {
            KeyCode::Char(c) => self
                .sections
                .iter()
                .find(|s| s.key.eq_ignore_ascii_case(&c))
                .map(|s| s.id),
            KeyCode::Left | KeyCode::Right => {
                let current = self.active_index().unwrap_or(0);
                let next = if key == KeyCode::Left {
                    (current + len - 1) % len
                } else {
                    (current + 1) % len
                };
                Some(self.sections[next].id)
            }
            _ => None,
        };
        match target {
            Some(id) => {
                self.request_scroll_to(id, surface, now);
                true
            }
            None => false,
        }
    }

    /// Hover-to-reveal for the collapsed rail.
    pub fn on_mouse_move(&mut self, column: u16) {
        if self.state.sidebar_collapsed && column <= self.hover_zone {
            self.state.sidebar_collapsed = false;
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.state.sidebar_collapsed = !self.state.sidebar_collapsed;
    }

    /// Adjusts the open-dialog count. Never drops below zero.
    pub fn set_dialogs_open(&mut self, delta: i32) {
        let count = self.state.dialogs_open_count as i64 + delta as i64;
        self.state.dialogs_open_count = count.max(0) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Sections stacked at fixed rows; `scrolls` records smooth-scroll targets.
    struct FakeSurface {
        scroll_y: u16,
        viewport: u16,
        tops: HashMap<&'static str, u16>,
        scrolls: Vec<u16>,
    }

    impl FakeSurface {
        fn new() -> Self {
            let tops = [
                ("home", 0),
                ("about", 40),
                ("experience", 100),
                ("projects", 130),
                ("stack", 190),
                ("travels", 230),
            ];
            Self {
                scroll_y: 0,
                viewport: 30,
                tops: tops.into_iter().collect(),
                scrolls: Vec::new(),
            }
        }
    }

    impl ScrollSurface for FakeSurface {
        fn scroll_y(&self) -> u16 {
            self.scroll_y
        }
        fn viewport_height(&self) -> u16 {
            self.viewport
        }
        fn element_top(&self, id: &str) -> Option<u16> {
            self.tops.get(id).copied()
        }
        fn smooth_scroll_to(&mut self, top: u16) {
            self.scrolls.push(top);
        }
    }

    fn controller() -> NavigationController {
        NavigationController::new(&SECTIONS, false, 1)
    }

    #[test]
    fn request_sets_active_immediately_and_scrolls() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        nav.request_scroll_to("projects", &mut surface, Instant::now());
        assert_eq!(nav.active_section_id(), "projects");
        assert!(nav.state().is_programmatic_scroll);
        assert_eq!(surface.scrolls, vec![130]);
    }

    #[test]
    fn request_for_missing_target_updates_state_without_scrolling() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        surface.tops.remove("stack");
        nav.request_scroll_to("stack", &mut surface, Instant::now());
        assert_eq!(nav.active_section_id(), "stack");
        assert!(surface.scrolls.is_empty());
    }

    #[test]
    fn scroll_inside_settle_window_is_ignored() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        let t0 = Instant::now();
        nav.request_scroll_to("travels", &mut surface, t0);

        for (offset, y) in [(0, 0), (10, 50), (500, 120), (999, 135)] {
            surface.scroll_y = y;
            assert!(!nav.on_scroll(&surface, t0 + Duration::from_millis(offset)));
            assert_eq!(nav.active_section_id(), "travels");
        }

        surface.scroll_y = 0;
        assert!(nav.on_scroll(&surface, t0 + SETTLE_DELAY));
        assert_eq!(nav.active_section_id(), "home");
        assert!(!nav.state().is_programmatic_scroll);
    }

    #[test]
    fn newer_request_extends_the_settle_window() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        let t0 = Instant::now();
        nav.request_scroll_to("about", &mut surface, t0);
        nav.request_scroll_to("stack", &mut surface, t0 + Duration::from_millis(800));

        surface.scroll_y = 0;
        assert!(!nav.on_scroll(&surface, t0 + Duration::from_millis(1200)));
        assert_eq!(nav.active_section_id(), "stack");
        assert!(nav.on_scroll(&surface, t0 + Duration::from_millis(1800)));
    }

    #[test]
    fn last_passed_section_wins() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        let now = Instant::now();

        // scan = 30 + 10 = 40, exactly at about's top
        surface.scroll_y = 30;
        assert!(nav.on_scroll(&surface, now));
        assert_eq!(nav.active_section_id(), "about");

        // deep inside a tall section, next top not reached: 80 + 10 = 90 < 100
        surface.scroll_y = 80;
        assert!(!nav.on_scroll(&surface, now));
        assert_eq!(nav.active_section_id(), "about");

        surface.scroll_y = 90;
        nav.on_scroll(&surface, now);
        assert_eq!(nav.active_section_id(), "experience");
    }

    #[test]
    fn scan_before_every_section_defaults_to_first() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        surface.tops.insert("home", 20);
        nav.request_scroll_to("stack", &mut surface, Instant::now() - SETTLE_DELAY * 2);
        surface.scroll_y = 0;
        nav.on_scroll(&surface, Instant::now());
        assert_eq!(nav.active_section_id(), "home");
    }

    #[test]
    fn digit_keys_jump_to_sections() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        assert!(nav.on_key_press(KeyCode::Char('3'), &mut surface, Instant::now()));
        assert_eq!(nav.active_section_id(), "experience");
        assert!(!nav.on_key_press(KeyCode::Char('x'), &mut surface, Instant::now()));
        assert_eq!(nav.active_section_id(), "experience");
    }

    #[test]
    fn arrows_wrap_around() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        let now = Instant::now();
        nav.on_key_press(KeyCode::Left, &mut surface, now);
        assert_eq!(nav.active_section_id(), "travels");
        nav.on_key_press(KeyCode::Right, &mut surface, now);
        assert_eq!(nav.active_section_id(), "home");
        nav.on_key_press(KeyCode::Right, &mut surface, now);
        assert_eq!(nav.active_section_id(), "about");
    }

    #[test]
    fn keys_are_inert_while_dialogs_are_open() {
        let mut nav = controller();
        let mut surface = FakeSurface::new();
        nav.set_dialogs_open(1);
        let before = nav.state().clone();
        for key in [KeyCode::Char('4'), KeyCode::Left, KeyCode::Right] {
            assert!(!nav.on_key_press(key, &mut surface, Instant::now()));
        }
        assert_eq!(nav.state(), &before);
        assert!(surface.scrolls.is_empty());
    }

    #[test]
    fn dialog_count_never_goes_negative() {
        let mut nav = controller();
        nav.set_dialogs_open(-1);
        assert_eq!(nav.state().dialogs_open_count, 0);
        nav.set_dialogs_open(1);
        nav.set_dialogs_open(1);
        nav.set_dialogs_open(-1);
        assert_eq!(nav.state().dialogs_open_count, 1);
    }

    #[test]
    fn hover_at_left_edge_expands_collapsed_sidebar() {
        let mut nav = NavigationController::new(&SECTIONS, true, 1);
        nav.on_mouse_move(5);
        assert!(nav.state().sidebar_collapsed);
        nav.on_mouse_move(1);
        assert!(!nav.state().sidebar_collapsed);

        // no effect when already expanded
        nav.on_mouse_move(0);
        assert!(!nav.state().sidebar_collapsed);
        nav.toggle_sidebar();
        assert!(nav.state().sidebar_collapsed);
    }
}
