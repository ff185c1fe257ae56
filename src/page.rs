//! The scrolling document: content blocks stacked into sections, the scroll
//! position, and the smooth-scroll animation.

use ratatui::{
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::navigation::{ScrollSurface, Section};
use crate::reveal::RevealOptions;
use crate::theme::Theme;

/// Nominal pixel height of one terminal row, used for scroll-speed estimates.
pub const ROW_HEIGHT_PX: f64 = 16.0;

const SECTION_HEADER_ROWS: u16 = 2;
const SECTION_PADDING_ROWS: u16 = 2;
const BLOCK_GAP_ROWS: u16 = 1;
pub const FOOTER_ROWS: u16 = 3;

/// One renderable, revealable unit of a section.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub key: String,
    pub title: Option<String>,
    pub lines: Vec<Line<'static>>,
    pub accent: Option<Color>,
    /// Index among the selectable items of the owning section.
    pub item: Option<usize>,
    pub bordered: bool,
    pub reveal: RevealOptions,
}

impl ContentBlock {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: None,
            lines: Vec::new(),
            accent: None,
            item: None,
            bordered: true,
            reveal: RevealOptions::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn lines(mut self, lines: Vec<Line<'static>>) -> Self {
        self.lines = lines;
        self
    }

    pub fn accent(mut self, accent: Option<Color>) -> Self {
        self.accent = accent;
        self
    }

    pub fn item(mut self, index: usize) -> Self {
        self.item = Some(index);
        self
    }

    pub fn plain(mut self) -> Self {
        self.bordered = false;
        self
    }

    pub fn reveal(mut self, reveal: RevealOptions) -> Self {
        self.reveal = reveal;
        self
    }

    /// Rows needed at `width` columns, borders included.
    pub fn height(&self, width: u16) -> u16 {
        let chrome = if self.bordered { 4 } else { 0 };
        let inner = width.saturating_sub(chrome).max(1);
        let body = Paragraph::new(self.lines.clone())
            .wrap(Wrap { trim: false })
            .line_count(inner) as u16;
        let body = body.max(1);
        if self.bordered { body + 2 } else { body }
    }

    /// `faded` renders the block mid-reveal.
    pub fn paragraph(&self, selected: bool, faded: bool, theme: &Theme) -> Paragraph<'static> {
        let mut paragraph = Paragraph::new(self.lines.clone()).wrap(Wrap { trim: false });
        if self.bordered {
            let border_color = if selected {
                theme.primary
            } else {
                self.accent.unwrap_or(theme.border)
            };
            let mut block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .padding(Padding::horizontal(1));
            if selected {
                block = block.border_type(ratatui::widgets::BorderType::Thick);
            }
            if let Some(title) = &self.title {
                let style = if selected {
                    theme.highlight
                } else {
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
                };
                block = block.title(Line::styled(format!(" {title} "), style));
            }
            paragraph = paragraph.block(block);
        }
        if faded {
            paragraph = paragraph.style(Style::default().fg(theme.text_muted).add_modifier(Modifier::DIM));
        }
        paragraph
    }
}

/// Blocks and heading of one section, ready for layout.
pub struct SectionContent {
    pub id: &'static str,
    pub title: Option<String>,
    pub min_height: u16,
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpan {
    pub id: &'static str,
    pub title: Option<String>,
    pub top: u16,
    pub height: u16,
}

#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub section: &'static str,
    pub block: ContentBlock,
    pub y: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub width: u16,
    pub sections: Vec<SectionSpan>,
    pub blocks: Vec<PlacedBlock>,
    pub footer_top: u16,
    pub total_height: u16,
}

impl PageLayout {
    pub fn build(contents: Vec<SectionContent>, width: u16) -> Self {
        let mut layout = PageLayout {
            width,
            ..Default::default()
        };
        let mut y: u16 = 0;
        for content in contents {
            let top = y;
            if content.title.is_some() {
                y = y.saturating_add(SECTION_HEADER_ROWS);
            }
            for block in content.blocks {
                let height = block.height(width);
                layout.blocks.push(PlacedBlock {
                    section: content.id,
                    block,
                    y,
                    height,
                });
                y = y.saturating_add(height + BLOCK_GAP_ROWS);
            }
            let height = (y - top + SECTION_PADDING_ROWS).max(content.min_height);
            layout.sections.push(SectionSpan {
                id: content.id,
                title: content.title,
                top,
                height,
            });
            y = top.saturating_add(height);
        }
        layout.footer_top = y;
        layout.total_height = y.saturating_add(FOOTER_ROWS);
        layout
    }

    pub fn section(&self, id: &str) -> Option<&SectionSpan> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// The selectable block for `item` in section `id`.
    pub fn item_block(&self, id: &str, item: usize) -> Option<&PlacedBlock> {
        self.blocks
            .iter()
            .find(|b| b.section == id && b.block.item == Some(item))
    }

    pub fn item_count(&self, id: &str) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.section == id && b.block.item.is_some())
            .count()
    }
}

#[derive(Debug, Default)]
pub struct Page {
    layout: PageLayout,
    scroll_y: u16,
    viewport_height: u16,
    target: Option<u16>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
        self.clamp();
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.clamp();
    }

    pub fn max_scroll(&self) -> u16 {
        self.layout.total_height.saturating_sub(self.viewport_height)
    }

    fn clamp(&mut self) {
        self.scroll_y = self.scroll_y.min(self.max_scroll());
        if let Some(target) = self.target {
            self.target = Some(target.min(self.max_scroll()));
        }
    }

    /// User scroll. Interrupts a running smooth scroll. Returns whether the
    /// position moved.
    pub fn scroll_by(&mut self, delta: i32) -> bool {
        let y = (self.scroll_y as i32 + delta).clamp(0, self.max_scroll() as i32) as u16;
        self.jump_to(y)
    }

    pub fn jump_to(&mut self, y: u16) -> bool {
        self.target = None;
        let y = y.min(self.max_scroll());
        let moved = y != self.scroll_y;
        self.scroll_y = y;
        moved
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    /// One frame of the smooth scroll: a quarter of the remaining distance,
    /// at least one row. Returns whether the position moved.
    pub fn advance(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let distance = target as i32 - self.scroll_y as i32;
        if distance == 0 {
            self.target = None;
            return false;
        }
        let step = ((distance.abs() + 3) / 4).max(1) * distance.signum();
        self.scroll_y = (self.scroll_y as i32 + step) as u16;
        if self.scroll_y == target {
            self.target = None;
        }
        true
    }

    /// Bottom-most visible row, exclusive.
    pub fn viewport_bottom(&self) -> u16 {
        self.scroll_y.saturating_add(self.viewport_height)
    }

    /// Scrolls just enough for rows `[y, y + height)` to be on screen.
    pub fn reveal_rows(&mut self, y: u16, height: u16) -> bool {
        if y < self.scroll_y {
            return self.jump_to(y);
        }
        let bottom = y.saturating_add(height);
        if bottom > self.viewport_bottom() {
            let top = bottom.saturating_sub(self.viewport_height).min(y);
            return self.jump_to(top);
        }
        false
    }
}

impl ScrollSurface for Page {
    fn scroll_y(&self) -> u16 {
        self.scroll_y
    }

    fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    fn element_top(&self, id: &str) -> Option<u16> {
        self.layout.section(id).map(|s| s.top)
    }

    fn smooth_scroll_to(&mut self, top: u16) {
        let top = top.min(self.max_scroll());
        self.target = if top == self.scroll_y { None } else { Some(top) };
    }
}

/// "More below" hint for compact terminals.
#[derive(Debug, Default)]
pub struct ScrollIndicator {
    has_scrolled: bool,
}

impl ScrollIndicator {
    /// Shows again at the very top, hides once scrolled past a few rows.
    pub fn update(&mut self, scroll_y: u16) {
        if scroll_y <= 1 {
            self.has_scrolled = false;
        } else if scroll_y > 3 {
            self.has_scrolled = true;
        }
    }

    pub fn is_visible(&self, compact: bool, active_is_last: bool) -> bool {
        compact && !active_is_last && !self.has_scrolled
    }

    /// Smooth-scrolls to the section after `active`, wrapping to the first.
    /// Navigation state is left to the scroll handler.
    pub fn scroll_to_next(sections: &[Section], active: Option<usize>, surface: &mut impl ScrollSurface) {
        if sections.is_empty() {
            return;
        }
        let current = active.unwrap_or(0);
        let next = if current + 1 < sections.len() { current + 1 } else { 0 };
        if let Some(top) = surface.element_top(sections[next].id) {
            surface.smooth_scroll_to(top);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::SECTIONS;

    fn block(key: &str, rows: usize) -> ContentBlock {
        ContentBlock::new(key).lines((0..rows).map(|i| Line::from(format!("line {i}"))).collect())
    }

    fn layout() -> PageLayout {
        PageLayout::build(
            vec![
                SectionContent {
                    id: "home",
                    title: None,
                    min_height: 20,
                    blocks: vec![block("hero", 3)],
                },
                SectionContent {
                    id: "about",
                    title: Some("About".into()),
                    min_height: 0,
                    blocks: vec![block("a1", 2).item(0), block("a2", 1).item(1)],
                },
            ],
            40,
        )
    }

    #[test]
    fn sections_stack_with_headers_and_gaps() {
        let layout = layout();
        assert_eq!(layout.sections[0].top, 0);
        assert_eq!(layout.sections[0].height, 20);
        let about = layout.section("about").unwrap();
        assert_eq!(about.top, 20);
        // header 2, block 4 + gap, block 3 + gap, padding 2
        assert_eq!(about.height, 2 + 5 + 4 + 2);
        assert_eq!(layout.blocks[1].y, 22);
        assert_eq!(layout.blocks[2].y, 27);
        assert_eq!(layout.total_height, 20 + 13 + FOOTER_ROWS);
        assert_eq!(layout.item_count("about"), 2);
        assert_eq!(layout.item_block("about", 1).unwrap().block.key, "a2");
    }

    #[test]
    fn wrapped_lines_grow_the_block() {
        let long = ContentBlock::new("long").lines(vec![Line::from("word ".repeat(20))]);
        assert!(long.height(24) > 3);
        assert_eq!(ContentBlock::new("empty").plain().height(24), 1);
    }

    #[test]
    fn smooth_scroll_eases_to_target() {
        let mut page = Page::new();
        page.set_layout(layout());
        page.set_viewport_height(10);
        page.smooth_scroll_to(20);
        assert!(page.is_animating());
        let mut frames = 0;
        while page.advance() {
            frames += 1;
            assert!(frames < 50);
        }
        assert_eq!(page.scroll_y(), 20);
        assert!(!page.is_animating());
    }

    #[test]
    fn smooth_scroll_target_is_clamped_to_document() {
        let mut page = Page::new();
        page.set_layout(layout());
        page.set_viewport_height(30);
        page.smooth_scroll_to(500);
        while page.advance() {}
        assert_eq!(page.scroll_y(), page.max_scroll());
    }

    #[test]
    fn user_scroll_interrupts_animation() {
        let mut page = Page::new();
        page.set_layout(layout());
        page.set_viewport_height(10);
        page.smooth_scroll_to(20);
        page.advance();
        assert!(page.scroll_by(-1));
        assert!(!page.is_animating());
        page.scroll_by(-100);
        assert_eq!(page.scroll_y(), 0);
        assert!(!page.scroll_by(-1));
    }

    #[test]
    fn reveal_rows_scrolls_minimally() {
        let mut page = Page::new();
        page.set_layout(layout());
        page.set_viewport_height(10);
        assert!(page.reveal_rows(27, 3));
        assert_eq!(page.viewport_bottom(), 30);
        assert!(!page.reveal_rows(25, 2));
        assert!(page.reveal_rows(5, 2));
        assert_eq!(page.scroll_y(), 5);
    }

    #[test]
    fn indicator_hysteresis_and_visibility() {
        let mut indicator = ScrollIndicator::default();
        assert!(indicator.is_visible(true, false));
        assert!(!indicator.is_visible(false, false));
        assert!(!indicator.is_visible(true, true));
        indicator.update(2);
        assert!(indicator.is_visible(true, false));
        indicator.update(4);
        assert!(!indicator.is_visible(true, false));
        indicator.update(2);
        assert!(!indicator.is_visible(true, false));
        indicator.update(0);
        assert!(indicator.is_visible(true, false));
    }

    #[test]
    fn indicator_scrolls_to_next_section_with_wrap() {
        let mut page = Page::new();
        page.set_layout(layout());
        page.set_viewport_height(5);
        ScrollIndicator::scroll_to_next(&SECTIONS[..2], Some(0), &mut page);
        while page.advance() {}
        assert_eq!(page.scroll_y(), 20);
        ScrollIndicator::scroll_to_next(&SECTIONS[..2], Some(1), &mut page);
        while page.advance() {}
        assert_eq!(page.scroll_y(), 0);
    }
}
