use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Rect},
    prelude::Frame,
    style::Style,
    text::{Line, Span},
};
use serde_json::Value;

use super::{bullet_lines, heading, is_close_key, scroll_key, status_block, text_lines, DialogView, PageSection};
use crate::loader::Resource;
use crate::models::{ContentState, Effect, Travel};
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::{Direction, RevealOptions};
use crate::theme::Theme;

#[derive(Debug, Default)]
pub struct TravelsSection {
    travels: ContentState<Travel>,
    modal: Option<(usize, u16)>,
}

impl PageSection for TravelsSection {
    fn id(&self) -> &'static str {
        "travels"
    }

    fn resources(&self) -> &'static [Resource] {
        &[Resource::Travel]
    }

    fn apply_content(&mut self, _resource: Resource, result: Result<Vec<Value>, String>) {
        self.travels = ContentState::from_result(result);
    }

    fn content(&self, theme: &Theme, _viewport_height: u16) -> SectionContent {
        let mut blocks: Vec<ContentBlock> = status_block(self.id(), Resource::Travel, &self.travels, theme)
            .into_iter()
            .collect();
        if let ContentState::Ready(travels) = &self.travels {
            if travels.is_empty() {
                blocks.push(
                    ContentBlock::new("travels:coming-soon")
                        .title("Travel Section Coming Soon")
                        .accent(Some(theme.primary))
                        .lines(vec![
                            Line::raw(""),
                            Line::styled(
                                "This section will be coming soon, in a future update.",
                                Style::default().fg(theme.text_secondary),
                            )
                            .alignment(Alignment::Center),
                            Line::raw(""),
                        ])
                        .reveal(RevealOptions::default().sliding(Direction::Down)),
                );
            }
        }
        for (i, travel) in self.travels.items().iter().enumerate() {
            blocks.push(
                ContentBlock::new(format!("travels:trip:{i}"))
                    .title(travel.destination.clone())
                    .item(i)
                    .lines(vec![
                        Line::from(vec![
                            Span::styled(travel.country.clone(), theme.highlight),
                            Span::styled(format!("  {}", travel.date), Style::default().fg(theme.text_muted)),
                        ]),
                        Line::styled(travel.summary.clone(), Style::default().fg(theme.text_secondary)),
                    ])
                    .reveal(RevealOptions::default().delayed(i as f64 * 100.0)),
            );
        }
        SectionContent {
            id: self.id(),
            title: Some("Personal Travels".into()),
            min_height: 0,
            blocks,
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        if item >= self.travels.items().len() {
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
        if let Some((_, scroll)) = self.modal.as_mut() {
            scroll_key(key, scroll, 30);
        }
        Vec::new()
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some((index, scroll)) = self.modal else {
            return;
        };
        let Some(travel) = self.travels.items().get(index) else {
            return;
        };
        let mut lines = vec![
            Line::styled(format!("{} · {}", travel.country, travel.date), Style::default().fg(theme.text_muted)),
            Line::raw(""),
        ];
        lines.extend(text_lines(&travel.description, Style::default().fg(theme.text_secondary)));
        if !travel.highlights.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Highlights", theme));
            lines.extend(bullet_lines(&travel.highlights, theme));
        }
        DialogView::new(travel.destination.clone(), lines)
            .scroll(scroll)
            .render(f, area, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_list_renders_placeholder() {
        let mut section = TravelsSection::default();
        section.apply_content(Resource::Travel, Ok(vec![]));
        let content = section.content(&Theme::default(), 30);
        assert!(block_text(&content).contains("Coming Soon"));
        assert!(content.blocks.iter().all(|b| b.item.is_none()));
    }

    #[test]
    fn trip_opens_detail_dialog() {
        let mut section = TravelsSection::default();
        section.apply_content(
            Resource::Travel,
            Ok(vec![json!({"destination": "Niseko", "country": "Japan", "highlights": ["Powder days"]})]),
        );
        assert_eq!(section.open_item(0), vec![Effect::DialogOpened]);
        let screen = render_modal_text(&section);
        assert!(screen.contains("Niseko"));
        assert!(screen.contains("Powder days"));
        assert_eq!(section.handle_modal_key(KeyCode::Esc), vec![Effect::DialogClosed]);
    }
}
