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
use crate::models::{ContentState, Effect, Technology};
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::RevealOptions;
use crate::theme::{parse_hex, Theme};

#[derive(Debug, Default)]
pub struct StackSection {
    technologies: ContentState<Technology>,
    /// Technology index (into the loaded list) and scroll offset.
    modal: Option<(usize, u16)>,
}

impl StackSection {
    /// Categories in first-seen order with the indices of their technologies.
    pub fn grouped(&self) -> Vec<(&str, Vec<usize>)> {
        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for (i, tech) in self.technologies.items().iter().enumerate() {
            let category = if tech.category.is_empty() { "Other" } else { tech.category.as_str() };
            match groups.iter_mut().find(|(name, _)| *name == category) {
                Some((_, members)) => members.push(i),
                None => groups.push((category, vec![i])),
            }
        }
        groups
    }

    /// Selectable items run through the groups in page order.
    fn technology_for(&self, item: usize) -> Option<usize> {
        self.grouped()
            .into_iter()
            .flat_map(|(_, members)| members)
            .nth(item)
    }
}

impl PageSection for StackSection {
    fn id(&self) -> &'static str {
        "stack"
    }

    fn resources(&self) -> &'static [Resource] {
        &[Resource::Technologies]
    }

    fn apply_content(&mut self, _resource: Resource, result: Result<Vec<Value>, String>) {
        self.technologies = ContentState::from_result(result);
    }

    fn content(&self, theme: &Theme, _viewport_height: u16) -> SectionContent {
        let mut blocks: Vec<ContentBlock> =
            status_block(self.id(), Resource::Technologies, &self.technologies, theme)
                .into_iter()
                .collect();
        let technologies = self.technologies.items();
        let mut item = 0;
        for (g, (category, members)) in self.grouped().into_iter().enumerate() {
            blocks.push(
                ContentBlock::new(format!("stack:category:{g}"))
                    .plain()
                    .lines(vec![Line::styled(category.to_string(), theme.section_title)]),
            );
            for (n, index) in members.into_iter().enumerate() {
                let tech = &technologies[index];
                let mut meta = vec![Span::styled(tech.proficiency.clone(), theme.chip)];
                if let Some(years) = tech.years {
                    meta.push(Span::styled(format!("  {years} yrs"), Style::default().fg(theme.text_muted)));
                }
                blocks.push(
                    ContentBlock::new(format!("stack:tech:{index}"))
                        .title(tech.name.clone())
                        .item(item)
                        .accent(tech.color.as_deref().and_then(parse_hex))
                        .lines(vec![Line::from(meta)])
                        .reveal(RevealOptions::default().delayed((n % 4) as f64 * 60.0)),
                );
                item += 1;
            }
        }
        SectionContent {
            id: self.id(),
            title: Some("Stack".into()),
            min_height: 0,
            blocks,
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        let Some(index) = self.technology_for(item) else {
            return Vec::new();
        };
        let was_open = self.modal.is_some();
        self.modal = Some((index, 0));
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
        if let Some((_, scroll)) = self.modal.as_mut() {
            scroll_key(key, scroll, 30);
        }
        Vec::new()
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some((index, scroll)) = self.modal else {
            return;
        };
        let Some(tech) = self.technologies.items().get(index) else {
            return;
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(tech.category.clone(), theme.chip),
            Span::styled(format!(" · {}", tech.proficiency), Style::default().fg(theme.text_muted)),
        ])];
        if let Some(years) = tech.years {
            lines.push(Line::styled(format!("{years} years of experience"), Style::default().fg(theme.text_muted)));
        }
        lines.push(Line::raw(""));
        lines.extend(text_lines(&tech.description, Style::default().fg(theme.text_secondary)));
        if !tech.uses.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Where I use it", theme));
            lines.extend(bullet_lines(&tech.uses, theme));
        }
        DialogView::new(tech.name.clone(), lines)
            .scroll(scroll)
            .size(60, 60)
            .render(f, area, theme);
    }
}
