use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    prelude::Frame,
    style::Style,
    text::{Line, Span},
};
use serde_json::Value;

use super::{bullet_lines, heading, is_close_key, scroll_key, status_block, text_lines, DialogView, PageSection};
use crate::loader::Resource;
use crate::models::{ContentState, Effect, Job};
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::RevealOptions;
use crate::theme::{parse_hex, Theme};

#[derive(Debug, Default)]
pub struct ExperienceSection {
    jobs: ContentState<Job>,
    /// Open job and its scroll offset.
    modal: Option<(usize, u16)>,
}

impl PageSection for ExperienceSection {
    fn id(&self) -> &'static str {
        "experience"
    }

    fn resources(&self) -> &'static [Resource] {
        &[Resource::Jobs]
    }

    fn apply_content(&mut self, _resource: Resource, result: Result<Vec<Value>, String>) {
        self.jobs = ContentState::from_result(result);
    }

    fn content(&self, theme: &Theme, _viewport_height: u16) -> SectionContent {
        let mut blocks: Vec<ContentBlock> = status_block(self.id(), Resource::Jobs, &self.jobs, theme)
            .into_iter()
            .collect();
        for (i, job) in self.jobs.items().iter().enumerate() {
            let accent = job.color.as_deref().and_then(parse_hex);
            blocks.push(
                ContentBlock::new(format!("experience:job:{i}"))
                    .title(job.role.clone())
                    .item(i)
                    .accent(accent)
                    .lines(vec![
                        Line::from(vec![
                            Span::styled(job.company.clone(), theme.highlight),
                            Span::styled(format!("  {}", job.location), Style::default().fg(theme.text_muted)),
                        ]),
                        Line::styled(job.period.clone(), Style::default().fg(theme.text_muted)),
                        Line::styled(job.summary.clone(), Style::default().fg(theme.text_secondary)),
                    ])
                    .reveal(RevealOptions::default().delayed(i as f64 * 150.0)),
            );
        }
        SectionContent {
            id: self.id(),
            title: Some("Experience".into()),
            min_height: 0,
            blocks,
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        if item >= self.jobs.items().len() {
            return Vec::new();
        }
        let was_open = self.modal.is_some();
        self.modal = Some((item, 0));
        if was_open { Vec::new() } else { vec![Effect::DialogOpened] }
    }

    fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.modal.is_none() {
            return Vec::new();
        }
        if is_close_key(key) {
            self.modal = None;
            return vec![Effect::DialogClosed];
        }
        let limit = self
            .modal
            .and_then(|(i, _)| self.jobs.items().get(i))
            .map_or(0, |job| job.responsibilities.len() + 20);
        if let Some((_, scroll)) = self.modal.as_mut() {
            scroll_key(key, scroll, limit);
        }
        Vec::new()
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some((index, scroll)) = self.modal else {
            return;
        };
        let Some(job) = self.jobs.items().get(index) else {
            return;
        };
        let muted = Style::default().fg(theme.text_muted);
        let mut lines = vec![
            Line::styled(job.company.clone(), theme.highlight),
            Line::styled(format!("{} · {}", job.location, job.period), muted),
            Line::raw(""),
        ];
        lines.extend(text_lines(&job.description, Style::default().fg(theme.text_secondary)));
        if !job.responsibilities.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Key responsibilities", theme));
            lines.extend(bullet_lines(&job.responsibilities, theme));
        }
        DialogView::new(job.role.clone(), lines)
            .scroll(scroll)
            .hint("↑/↓ scroll · Esc close")
            .render(f, area, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use serde_json::json;

    fn loaded() -> ExperienceSection {
        let mut section = ExperienceSection::default();
        section.apply_content(
            Resource::Jobs,
            Ok(vec![json!({
                "company": "Fairmont Hotels",
                "role": "Guest Services",
                "color": "#8b5cf6",
                "responsibilities": ["Front desk operations"]
            })]),
        );
        section
    }

    #[test]
    fn job_cards_take_their_accent() {
        let content = loaded().content(&Theme::default(), 30);
        assert_eq!(content.blocks.len(), 1);
        assert_eq!(content.blocks[0].accent, parse_hex("#8b5cf6"));
        assert_eq!(content.blocks[0].item, Some(0));
    }

    #[test]
    fn modal_lists_responsibilities() {
        let mut section = loaded();
        assert_eq!(section.open_item(0), vec![Effect::DialogOpened]);
        let screen = render_modal_text(&section);
        assert!(screen.contains("Guest Services"));
        assert!(screen.contains("Front desk operations"));
        assert_eq!(section.handle_modal_key(KeyCode::Char('q')), vec![Effect::DialogClosed]);
    }

    #[test]
    fn failed_load_shows_error_block() {
        let mut section = ExperienceSection::default();
        section.apply_content(Resource::Jobs, Err("HTTP 500".into()));
        let content = section.content(&Theme::default(), 30);
        assert!(block_text(&content).contains("Error loading experience"));
        assert!(section.open_item(0).is_empty());
    }
}
