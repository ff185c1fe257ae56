//! The six page regions. Each section turns its content into blocks for the
//! page, owns its dialogs and reports side effects back to the shell.

mod about;
mod experience;
mod home;
mod projects;
mod stack;
mod travels;

pub use about::AboutSection;
pub use experience::ExperienceSection;
pub use home::{HomeDialog, HomeSection};
pub use projects::ProjectsSection;
pub use stack::StackSection;
pub use travels::TravelsSection;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Rect},
    prelude::Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use serde_json::Value;

use crate::config::Profile;
use crate::github::RepoStats;
use crate::loader::Resource;
use crate::models::{ContentState, Effect};
use crate::page::{ContentBlock, SectionContent};
use crate::theme::Theme;
use crate::utils::centered_rect;

pub trait PageSection {
    fn id(&self) -> &'static str;

    fn resources(&self) -> &'static [Resource] {
        &[]
    }

    fn apply_content(&mut self, _resource: Resource, _result: Result<Vec<Value>, String>) {}

    fn content(&self, theme: &Theme, viewport_height: u16) -> SectionContent;

    /// Opens the dialog for the `item`-th selectable block.
    fn open_item(&mut self, item: usize) -> Vec<Effect>;

    fn has_modal(&self) -> bool;

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Effect>;

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme);
}

pub struct Sections {
    pub home: HomeSection,
    pub about: AboutSection,
    pub experience: ExperienceSection,
    pub projects: ProjectsSection,
    pub stack: StackSection,
    pub travels: TravelsSection,
}

impl Sections {
    pub fn new(profile: &Profile) -> Self {
        Self {
            home: HomeSection::new(profile.clone()),
            about: AboutSection::default(),
            experience: ExperienceSection::default(),
            projects: ProjectsSection::default(),
            stack: StackSection::default(),
            travels: TravelsSection::default(),
        }
    }

    /// Page order.
    pub fn all(&self) -> [&dyn PageSection; 6] {
        [
            &self.home,
            &self.about,
            &self.experience,
            &self.projects,
            &self.stack,
            &self.travels,
        ]
    }

    fn all_mut(&mut self) -> [&mut dyn PageSection; 6] {
        [
            &mut self.home,
            &mut self.about,
            &mut self.experience,
            &mut self.projects,
            &mut self.stack,
            &mut self.travels,
        ]
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut dyn PageSection> {
        self.all_mut().into_iter().find(|s| s.id() == id)
    }

    /// The section whose dialog is open, if any.
    pub fn modal_owner(&self) -> Option<&dyn PageSection> {
        self.all().into_iter().find(|s| s.has_modal())
    }

    pub fn modal_owner_mut(&mut self) -> Option<&mut dyn PageSection> {
        self.all_mut().into_iter().find(|s| s.has_modal())
    }

    /// Hands a loaded resource to every section that renders it.
    pub fn apply_content(&mut self, resource: Resource, result: Result<Vec<Value>, String>) {
        for section in self.all_mut() {
            if section.resources().contains(&resource) {
                section.apply_content(resource, result.clone());
            }
        }
    }

    pub fn apply_stats(&mut self, project_id: &str, result: Result<RepoStats, String>) {
        self.projects.apply_stats(project_id, result);
    }

    pub fn contents(&self, theme: &Theme, viewport_height: u16) -> Vec<SectionContent> {
        self.all()
            .into_iter()
            .map(|s| s.content(theme, viewport_height))
            .collect()
    }
}

/// Loading and error placeholders. `None` once the content is ready.
pub(crate) fn status_block<T>(
    section: &str,
    resource: Resource,
    state: &ContentState<T>,
    theme: &Theme,
) -> Option<ContentBlock> {
    let key = format!("{section}:status:{}", resource.label());
    match state {
        ContentState::Loading => Some(
            ContentBlock::new(key)
                .plain()
                .lines(vec![Line::styled(
                    format!("Loading {}…", resource.label()),
                    Style::default().fg(theme.text_muted),
                )]),
        ),
        ContentState::Failed(message) => Some(
            ContentBlock::new(key)
                .accent(Some(theme.error))
                .lines(vec![
                    Line::styled(
                        format!("Error loading {}", resource.label()),
                        Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                    ),
                    Line::styled(message.clone(), Style::default().fg(theme.text_muted)),
                ]),
        ),
        ContentState::Ready(_) => None,
    }
}

/// Paragraphs of `text`, one line per source line.
pub(crate) fn text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|l| Line::styled(l.trim().to_string(), style))
        .collect()
}

pub(crate) fn bullet_lines(items: &[String], theme: &Theme) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|item| {
            Line::from(vec![
                Span::styled("• ", Style::default().fg(theme.primary)),
                Span::styled(item.clone(), Style::default().fg(theme.text_secondary)),
            ])
        })
        .collect()
}

pub(crate) fn chip_line(words: &[String], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!("[{word}]"), theme.chip));
    }
    Line::from(spans)
}

pub(crate) fn heading(text: impl Into<String>, theme: &Theme) -> Line<'static> {
    Line::styled(text.into(), theme.popup_title)
}

/// ↑/↓ scrolling shared by every dialog. Returns whether the key was used.
pub(crate) fn scroll_key(key: KeyCode, scroll: &mut u16, limit: usize) -> bool {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            *scroll = scroll.saturating_sub(1);
            true
        }
        KeyCode::Down | KeyCode::Char('j') => {
            *scroll = (*scroll + 1).min(limit as u16);
            true
        }
        KeyCode::PageUp => {
            *scroll = scroll.saturating_sub(10);
            true
        }
        KeyCode::PageDown => {
            *scroll = (*scroll + 10).min(limit as u16);
            true
        }
        _ => false,
    }
}

pub(crate) fn is_close_key(key: KeyCode) -> bool {
    matches!(key, KeyCode::Esc | KeyCode::Char('q'))
}

/// A bordered popup with a hint row underneath.
pub(crate) struct DialogView {
    pub title: String,
    pub lines: Vec<Line<'static>>,
    pub scroll: u16,
    pub hint: String,
    pub percent_x: u16,
    pub percent_y: u16,
}

impl DialogView {
    pub fn new(title: impl Into<String>, lines: Vec<Line<'static>>) -> Self {
        Self {
            title: title.into(),
            lines,
            scroll: 0,
            hint: "Esc close".to_string(),
            percent_x: 70,
            percent_y: 80,
        }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn size(mut self, percent_x: u16, percent_y: u16) -> Self {
        self.percent_x = percent_x;
        self.percent_y = percent_y;
        self
    }

    pub fn render(self, f: &mut Frame, area: Rect, theme: &Theme) -> Rect {
        let popup_area = centered_rect(self.percent_x, self.percent_y, area);
        f.render_widget(Clear, popup_area);
        let block = Block::default()
            .title(Line::styled(format!(" {} ", self.title), theme.popup_title))
            .borders(Borders::ALL)
            .style(theme.popup_border);
        let inner_width = popup_area.width.saturating_sub(2).max(1);
        let inner_height = popup_area.height.saturating_sub(2);
        let para = Paragraph::new(self.lines).wrap(Wrap { trim: false });
        let max_scroll = (para.line_count(inner_width) as u16).saturating_sub(inner_height);
        let para = para
            .block(block)
            .alignment(Alignment::Left)
            .style(theme.popup_text)
            .scroll((self.scroll.min(max_scroll), 0));
        f.render_widget(para, popup_area);

        let bottom = popup_area.y + popup_area.height;
        if bottom < area.y + area.height {
            let footer_area = Rect {
                x: popup_area.x,
                y: bottom,
                width: popup_area.width,
                height: 1,
            };
            f.render_widget(Paragraph::new(self.hint).style(theme.hint), footer_area);
        }
        popup_area
    }
}
