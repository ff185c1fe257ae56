//! The shell: owns every piece of page state, routes input, runs fetches on
//! the runtime and folds their results back in on the UI thread.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arboard::Clipboard;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::github::{RepoStats, RepoStatsClient};
use crate::loader::{ContentLoader, Resource};
use crate::models::Effect;
use crate::navigation::{NavigationController, ScrollSurface, SECTIONS};
use crate::page::{Page, PageLayout, ScrollIndicator, ROW_HEIGHT_PX};
use crate::reveal::{intersection_ratio, RevealRegistry, ScrollSpeedTracker};
use crate::sections::{HomeDialog, Sections};
use crate::theme::Theme;
use crate::ui::{content_width, screen_areas};
use crate::utils::contains;

const STATUS_TTL: Duration = Duration::from_secs(3);
const WHEEL_ROWS: i32 = 3;

/// Results delivered from background tasks.
#[derive(Debug)]
pub enum AppMessage {
    Content {
        resource: Resource,
        result: Result<Vec<Value>, String>,
    },
    RepoStats {
        project_id: String,
        result: Result<RepoStats, String>,
    },
}

/// Clickable regions recorded by the last draw.
#[derive(Debug, Default, Clone)]
pub struct Hitboxes {
    pub nav_items: Vec<(Rect, &'static str)>,
    pub chevron: Option<Rect>,
    pub indicator: Option<Rect>,
    pub main: Rect,
}

pub struct App {
    settings: Settings,
    pub theme: Theme,
    pub nav: NavigationController,
    pub page: Page,
    pub speed: ScrollSpeedTracker,
    pub reveals: RevealRegistry,
    pub sections: Sections,
    /// Selected item as (section id, item index).
    pub selection: Option<(&'static str, usize)>,
    pub indicator: ScrollIndicator,
    pub hitboxes: Hitboxes,
    pub status: Option<(String, Instant)>,
    loader: Arc<ContentLoader>,
    stats_client: Arc<RepoStatsClient>,
    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
    cancel: CancellationToken,
    runtime: Handle,
    frame_area: Rect,
    geometry: (u16, u16, bool),
    layout_dirty: bool,
    scroll_dirty: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        settings: Settings,
        loader: Arc<ContentLoader>,
        stats_client: Arc<RepoStatsClient>,
        runtime: Handle,
        now: Instant,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            nav: NavigationController::new(&SECTIONS, settings.sidebar_collapsed, settings.hover_zone),
            sections: Sections::new(&settings.profile),
            settings,
            theme: Theme::default(),
            page: Page::new(),
            speed: ScrollSpeedTracker::new(0.0, now),
            reveals: RevealRegistry::default(),
            selection: None,
            indicator: ScrollIndicator::default(),
            hitboxes: Hitboxes::default(),
            status: None,
            loader,
            stats_client,
            tx,
            rx,
            cancel: CancellationToken::new(),
            runtime,
            frame_area: Rect::default(),
            geometry: (0, 0, false),
            layout_dirty: true,
            scroll_dirty: false,
            should_quit: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Starts one load per resource. Each section renders its own loading
    /// and error state, so one failure never blocks the others.
    pub fn start(&self) {
        for resource in Resource::ALL {
            let loader = self.loader.clone();
            let tx = self.tx.clone();
            let cancel = self.cancel.clone();
            self.runtime.spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(resource = resource.label(), "load cancelled");
                    }
                    result = loader.load(resource) => {
                        let result = result.map_err(|e| {
                            warn!(resource = resource.label(), error = %e, "content load failed");
                            e.to_string()
                        });
                        let _ = tx.send(AppMessage::Content { resource, result });
                    }
                }
            });
        }
    }

    /// Stops background work. Results still in flight are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_compact(&self) -> bool {
        self.frame_area.width <= self.settings.compact_width
    }

    /// Whether the next frames change without input: smooth scroll, reveals
    /// or a pending settle deadline.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.page.is_animating() || self.reveals.any_animating(now) || self.nav.state().is_programmatic_scroll
    }

    pub fn resize(&mut self, area: Rect) {
        self.frame_area = area;
    }

    /// One frame: fold in results, advance the smooth scroll, run the
    /// throttled scroll handler and update reveal states.
    pub fn tick(&mut self, now: Instant) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
        self.sync_geometry();
        if self.layout_dirty {
            self.relayout();
        }
        if self.page.advance() {
            self.scroll_dirty = true;
        }
        if self.scroll_dirty {
            self.scroll_dirty = false;
            self.nav.on_scroll(&self.page, now);
            self.speed.update(self.page.scroll_y() as f64 * ROW_HEIGHT_PX, now);
            self.indicator.update(self.page.scroll_y());
        }
        self.nav.settle(now);
        self.observe_reveals(now);
        if let Some((_, at)) = &self.status {
            if now.saturating_duration_since(*at) > STATUS_TTL {
                self.status = None;
            }
        }
    }

    fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Content { resource, result } => {
                debug!(resource = resource.label(), ok = result.is_ok(), "content arrived");
                self.sections.apply_content(resource, result);
            }
            AppMessage::RepoStats { project_id, result } => {
                debug!(project_id, ok = result.is_ok(), "repository stats arrived");
                self.sections.apply_stats(&project_id, result);
            }
        }
        self.layout_dirty = true;
    }

    fn sync_geometry(&mut self) {
        let collapsed = self.nav.state().sidebar_collapsed;
        let areas = screen_areas(self.frame_area, collapsed);
        let geometry = (content_width(areas.main), areas.main.height, collapsed);
        if geometry != self.geometry {
            self.geometry = geometry;
            self.page.set_viewport_height(areas.main.height);
            self.layout_dirty = true;
            self.scroll_dirty = true;
        }
    }

    fn relayout(&mut self) {
        self.layout_dirty = false;
        let (width, height, _) = self.geometry;
        let contents = self.sections.contents(&self.theme, height);
        let layout = PageLayout::build(contents, width);
        let mounted: HashSet<String> = layout.blocks.iter().map(|b| b.block.key.clone()).collect();
        self.reveals.retain_mounted(&mounted);
        if let Some((section, item)) = self.selection {
            if item >= layout.item_count(section) {
                self.selection = None;
            }
        }
        self.page.set_layout(layout);
    }

    fn observe_reveals(&mut self, now: Instant) {
        let multiplier = self.speed.multiplier();
        let scroll_y = self.page.scroll_y();
        let viewport = self.page.viewport_height();
        for placed in &self.page.layout().blocks {
            let ratio = intersection_ratio(placed.y, placed.height, scroll_y, viewport);
            self.reveals
                .observe(&placed.block.key, ratio, &placed.block.reveal, multiplier, now);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if let Some(owner) = self.sections.modal_owner_mut() {
            let effects = owner.handle_modal_key(key.code);
            self.apply_effects(effects);
            return;
        }
        if self.nav.on_key_press(key.code, &mut self.page, now) {
            self.selection = None;
            return;
        }
        let page_rows = self.page.viewport_height().saturating_sub(2).max(1) as i32;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-page_rows),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(page_rows),
            KeyCode::Home | KeyCode::Char('g') => {
                if self.page.jump_to(0) {
                    self.scroll_dirty = true;
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                let bottom = self.page.max_scroll();
                if self.page.jump_to(bottom) {
                    self.scroll_dirty = true;
                }
            }
            KeyCode::Tab => self.cycle_selection(true),
            KeyCode::BackTab => self.cycle_selection(false),
            KeyCode::Enter => self.open_selection(),
            KeyCode::Char('r') => {
                let effects = self.sections.home.open(HomeDialog::Resume);
                self.apply_effects(effects);
            }
            KeyCode::Char('e') => {
                let effects = self.sections.home.open(HomeDialog::Email);
                self.apply_effects(effects);
            }
            KeyCode::Char('b') => self.nav.toggle_sidebar(),
            KeyCode::Esc => self.selection = None,
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let modal_open = self.sections.modal_owner().is_some();
        match mouse.kind {
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let down = mouse.kind == MouseEventKind::ScrollDown;
                if let Some(owner) = self.sections.modal_owner_mut() {
                    let key = if down { KeyCode::Down } else { KeyCode::Up };
                    let effects = owner.handle_modal_key(key);
                    self.apply_effects(effects);
                } else {
                    self.scroll_by(if down { WHEEL_ROWS } else { -WHEEL_ROWS });
                }
            }
            MouseEventKind::Moved => self.nav.on_mouse_move(mouse.column),
            MouseEventKind::Down(MouseButton::Left) if !modal_open => {
                self.click(mouse.column, mouse.row, now);
            }
            _ => {}
        }
    }

    fn click(&mut self, column: u16, row: u16, now: Instant) {
        if self.hitboxes.chevron.is_some_and(|r| contains(r, column, row)) {
            self.nav.toggle_sidebar();
            return;
        }
        let nav_target = self
            .hitboxes
            .nav_items
            .iter()
            .find(|(r, _)| contains(*r, column, row))
            .map(|(_, id)| *id);
        if let Some(id) = nav_target {
            self.selection = None;
            self.nav.request_scroll_to(id, &mut self.page, now);
            return;
        }
        if self.hitboxes.indicator.is_some_and(|r| contains(r, column, row)) {
            ScrollIndicator::scroll_to_next(self.nav.sections(), self.nav.active_index(), &mut self.page);
            return;
        }
        let main = self.hitboxes.main;
        if contains(main, column, row) {
            let doc_y = self.page.scroll_y() + (row - main.y);
            let hit = self
                .page
                .layout()
                .blocks
                .iter()
                .find(|b| doc_y >= b.y && doc_y < b.y + b.height)
                .and_then(|b| b.block.item.map(|item| (b.section, item)));
            if let Some(selection) = hit {
                self.selection = Some(selection);
                self.open_selection();
            }
        }
    }

    fn scroll_by(&mut self, rows: i32) {
        if self.page.scroll_by(rows) {
            self.scroll_dirty = true;
        }
    }

    /// Tab walks the selectable items of the active section, wrapping.
    fn cycle_selection(&mut self, forward: bool) {
        let Some(section) = self.nav.active_index().map(|i| self.nav.sections()[i].id) else {
            return;
        };
        let count = self.page.layout().item_count(section);
        if count == 0 {
            self.selection = None;
            return;
        }
        let next = match self.selection {
            Some((current, i)) if current == section => {
                if forward { (i + 1) % count } else { (i + count - 1) % count }
            }
            _ => {
                if forward { 0 } else { count - 1 }
            }
        };
        self.selection = Some((section, next));
        if let Some(block) = self.page.layout().item_block(section, next) {
            let (y, height) = (block.y, block.height);
            if self.page.reveal_rows(y, height) {
                self.scroll_dirty = true;
            }
        }
    }

    fn open_selection(&mut self) {
        let Some((section, item)) = self.selection else {
            return;
        };
        if let Some(target) = self.sections.get_mut(section) {
            let effects = target.open_item(item);
            self.apply_effects(effects);
        }
    }

    pub fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::DialogOpened => self.nav.set_dialogs_open(1),
                Effect::DialogClosed => self.nav.set_dialogs_open(-1),
                Effect::FetchRepoStats { project_id, url } => self.spawn_stats_fetch(project_id, url),
                Effect::Copy(text) => self.copy_to_clipboard(text),
            }
        }
        self.layout_dirty = true;
    }

    fn spawn_stats_fetch(&self, project_id: String, url: String) {
        info!(project_id, url, "fetching repository stats");
        let client = self.stats_client.clone();
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                result = client.fetch(&url) => {
                    let result = result.map_err(|e| {
                        warn!(project_id, error = %e, "repository stats failed");
                        e.to_string()
                    });
                    let _ = tx.send(AppMessage::RepoStats { project_id, result });
                }
            }
        });
    }

    fn copy_to_clipboard(&mut self, text: String) {
        let now = Instant::now();
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.clone())) {
            Ok(()) => {
                info!(text, "copied to clipboard");
                self.status = Some((format!("Copied {text}"), now));
            }
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                self.status = Some((format!("Clipboard unavailable: {text}"), now));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::ManualClock;
    use crate::cache::{MemoryStore, TimeBoxedCache};
    use crate::loader::ContentSource;
    use crate::network::fake::FakeTransport;
    use crate::network::HttpTransport;
    use crossterm::event::{KeyEventState, MouseEvent};

    const BASE: &str = "https://site.test/cache";

    fn transport() -> FakeTransport {
        let envelope = |items: &str| format!(r#"{{"result": {items}}}"#);
        FakeTransport::new()
            .route(&format!("{BASE}/skills.json"), 200, &envelope(r#"[{"name": "Networking"}]"#))
            .route(&format!("{BASE}/education.json"), 200, &envelope("[]"))
            .route(&format!("{BASE}/courses.json"), 200, &envelope("[]"))
            .route(&format!("{BASE}/jobs.json"), 500, "oops")
            .route(&format!("{BASE}/technologies.json"), 200, &envelope(r#"[{"name": "Linux", "category": "Ops"}]"#))
            .route(
                &format!("{BASE}/projects.json"),
                200,
                &envelope(r#"[{"id": 1, "name": "Site", "github": "https://github.com/octo/site"}]"#),
            )
            .route(&format!("{BASE}/travel.json"), 200, &envelope("[]"))
    }

    fn app() -> App {
        let transport: Arc<dyn HttpTransport> = Arc::new(transport());
        let cache = TimeBoxedCache::new(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(0)));
        let loader = ContentLoader::new(
            ContentSource::Remote { base_url: BASE.to_string() },
            transport.clone(),
            cache,
        );
        let stats = RepoStatsClient::new(transport, "https://api.test");
        let mut app = App::new(
            Settings::with_defaults(),
            Arc::new(loader),
            Arc::new(stats),
            Handle::current(),
            Instant::now(),
        );
        app.resize(Rect::new(0, 0, 120, 40));
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    async fn run_ticks(app: &mut App, ticks: usize) {
        for _ in 0..ticks {
            tokio::task::yield_now().await;
            app.tick(Instant::now());
        }
    }

    #[tokio::test]
    async fn content_arrives_per_section() {
        let mut app = app();
        app.start();
        run_ticks(&mut app, 20).await;

        let layout = app.page.layout();
        assert!(layout.section("stack").is_some());
        assert_eq!(layout.item_count("stack"), 1);
        assert_eq!(layout.item_count("projects"), 1);
        let errors: Vec<_> = layout
            .blocks
            .iter()
            .filter(|b| b.block.key.starts_with("experience:status"))
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].block.lines[0].to_string().contains("Error loading experience"));
    }

    #[tokio::test]
    async fn digits_navigate_until_a_dialog_opens() {
        let mut app = app();
        app.start();
        run_ticks(&mut app, 20).await;

        app.handle_key(press(KeyCode::Char('4')), Instant::now());
        assert_eq!(app.nav.active_section_id(), "projects");

        app.handle_key(press(KeyCode::Char('r')), Instant::now());
        assert_eq!(app.nav.state().dialogs_open_count, 1);
        app.handle_key(press(KeyCode::Char('2')), Instant::now());
        assert_eq!(app.nav.active_section_id(), "projects");

        app.handle_key(press(KeyCode::Esc), Instant::now());
        assert_eq!(app.nav.state().dialogs_open_count, 0);
        app.handle_key(press(KeyCode::Char('2')), Instant::now());
        assert_eq!(app.nav.active_section_id(), "about");
    }

    #[tokio::test]
    async fn smooth_scroll_lands_on_the_requested_section() {
        let mut app = app();
        app.start();
        run_ticks(&mut app, 20).await;

        let t0 = Instant::now();
        app.handle_key(press(KeyCode::Char('5')), t0);
        for _ in 0..60 {
            app.tick(t0);
        }
        let top = app.page.layout().section("stack").unwrap().top;
        assert_eq!(app.page.scroll_y(), top.min(app.page.max_scroll()));
        assert_eq!(app.nav.active_section_id(), "stack");
        assert!(app.nav.state().is_programmatic_scroll);

        app.tick(t0 + Duration::from_millis(1000));
        assert!(!app.nav.state().is_programmatic_scroll);
    }

    #[tokio::test]
    async fn tab_selects_and_enter_fetches_stats_once() {
        let mut app = app();
        app.start();
        run_ticks(&mut app, 20).await;

        app.handle_key(press(KeyCode::Char('4')), Instant::now());
        app.handle_key(press(KeyCode::Tab), Instant::now());
        assert_eq!(app.selection, Some(("projects", 0)));
        app.handle_key(press(KeyCode::Enter), Instant::now());
        assert_eq!(app.nav.state().dialogs_open_count, 1);
        assert!(app.sections.projects.stats("1").is_some());

        run_ticks(&mut app, 20).await;
        // no route for the repository API: the fetch fails and stays scoped to the panel
        assert!(matches!(
            app.sections.projects.stats("1"),
            Some(crate::github::StatsSlot::Failed(_))
        ));
    }

    #[tokio::test]
    async fn sidebar_toggle_relayouts_width() {
        let mut app = app();
        app.tick(Instant::now());
        let expanded_width = app.page.layout().width;
        app.handle_key(press(KeyCode::Char('b')), Instant::now());
        app.tick(Instant::now());
        assert!(app.page.layout().width > expanded_width);

        app.handle_mouse(
            MouseEvent {
                kind: MouseEventKind::Moved,
                column: 0,
                row: 5,
                modifiers: KeyModifiers::NONE,
            },
            Instant::now(),
        );
        assert!(!app.nav.state().sidebar_collapsed);
    }

    #[tokio::test]
    async fn shutdown_drops_pending_loads() {
        let mut app = app();
        app.shutdown();
        app.start();
        run_ticks(&mut app, 5).await;
        assert_eq!(app.page.layout().item_count("stack"), 0);
    }
}
