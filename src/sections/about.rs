use std::cmp::Ordering;

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    prelude::Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use serde_json::Value;

use super::{bullet_lines, heading, is_close_key, scroll_key, status_block, text_lines, DialogView, PageSection};
use crate::loader::Resource;
use crate::models::{ContentState, Course, Education, Effect, Skill, Unit};
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::{Direction, RevealOptions};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Education(usize),
    Skill(usize),
    Course(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct Modal {
    entry: Entry,
    scroll: u16,
    selected_unit: Option<usize>,
    drawer_open: bool,
}

/// Education, skills and certifications. Education and course dialogs list
/// their units; a unit opens in a drawer stacked over the dialog.
#[derive(Debug, Default)]
pub struct AboutSection {
    skills: ContentState<Skill>,
    education: ContentState<Education>,
    courses: ContentState<Course>,
    modal: Option<Modal>,
}

/// Highest level first; within a level the most recent end date first, with
/// courses still in progress ahead of finished ones.
pub fn sort_courses(courses: &mut [Course]) {
    courses.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| match (a.end(), b.end()) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => b.cmp(&a),
            })
            .then_with(|| a.title.cmp(&b.title))
    });
}

impl AboutSection {
    fn entry_for(&self, item: usize) -> Option<Entry> {
        let education = self.education.items().len();
        let skills = self.skills.items().len();
        let courses = self.courses.items().len();
        if item < education {
            Some(Entry::Education(item))
        } else if item < education + skills {
            Some(Entry::Skill(item - education))
        } else if item < education + skills + courses {
            Some(Entry::Course(item - education - skills))
        } else {
            None
        }
    }

    fn units(&self, entry: Entry) -> &[Unit] {
        match entry {
            Entry::Education(i) => self.education.items().get(i).map(|e| e.units.as_slice()).unwrap_or_default(),
            Entry::Course(i) => self.courses.items().get(i).map(|c| c.units.as_slice()).unwrap_or_default(),
            Entry::Skill(_) => &[],
        }
    }

    fn dialog_lines(&self, modal: &Modal, theme: &Theme) -> (String, Vec<Line<'static>>) {
        let body = Style::default().fg(theme.text_secondary);
        let muted = Style::default().fg(theme.text_muted);
        let mut lines = Vec::new();
        let title = match modal.entry {
            Entry::Education(i) => {
                let Some(edu) = self.education.items().get(i) else {
                    return (String::new(), lines);
                };
                lines.push(Line::styled(edu.institution.clone(), theme.highlight));
                lines.push(Line::styled(edu.period.clone(), muted));
                lines.push(Line::raw(""));
                lines.extend(text_lines(&edu.description, body));
                if !edu.achievements.is_empty() {
                    lines.push(Line::raw(""));
                    lines.push(heading("Achievements", theme));
                    lines.extend(bullet_lines(&edu.achievements, theme));
                }
                edu.qualification.clone()
            }
            Entry::Course(i) => {
                let Some(course) = self.courses.items().get(i) else {
                    return (String::new(), lines);
                };
                lines.push(Line::styled(course.organization.clone(), theme.highlight));
                lines.push(Line::styled(course.period.clone(), muted));
                lines.push(Line::raw(""));
                lines.extend(text_lines(&course.description, body));
                course.title.clone()
            }
            Entry::Skill(i) => {
                let Some(skill) = self.skills.items().get(i) else {
                    return (String::new(), lines);
                };
                lines.push(Line::styled(skill.category.clone(), theme.chip));
                lines.push(Line::raw(""));
                lines.extend(text_lines(&skill.description, body));
                if !skill.highlights.is_empty() {
                    lines.push(Line::raw(""));
                    lines.push(heading("Examples", theme));
                    lines.extend(bullet_lines(&skill.highlights, theme));
                }
                skill.name.clone()
            }
        };
        let units = self.units(modal.entry);
        if !units.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading(format!("Units ({})", units.len()), theme));
            for (i, unit) in units.iter().enumerate() {
                let selected = modal.selected_unit == Some(i);
                let marker = if selected { "→ " } else { "  " };
                let style = if selected {
                    theme.highlight
                } else {
                    Style::default().fg(theme.text)
                };
                lines.push(Line::from(vec![
                    Span::styled(marker, theme.highlight),
                    Span::styled(format!("{:<10}", unit.code), Style::default().fg(theme.secondary)),
                    Span::styled(unit.name.clone(), style),
                ]));
            }
        }
        (title, lines)
    }

    fn render_drawer(&self, f: &mut Frame, area: Rect, unit: &Unit, theme: &Theme) {
        let width = (area.width * 2 / 5).max(30).min(area.width);
        let drawer = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: area.height,
        };
        f.render_widget(Clear, drawer);
        let mut lines = vec![
            Line::styled(unit.name.clone(), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
            Line::raw(""),
        ];
        lines.extend(text_lines(&unit.description, Style::default().fg(theme.text_secondary)));
        lines.push(Line::raw(""));
        lines.push(Line::styled("Esc to close this panel", theme.hint));
        let para = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(Line::styled(format!(" {} ", unit.code), Style::default().fg(theme.secondary)))
                    .borders(Borders::ALL)
                    .style(theme.popup_border),
            );
        f.render_widget(para, drawer);
    }
}

impl PageSection for AboutSection {
    fn id(&self) -> &'static str {
        "about"
    }

    fn resources(&self) -> &'static [Resource] {
        &[Resource::Education, Resource::Skills, Resource::Courses]
    }

    fn apply_content(&mut self, resource: Resource, result: Result<Vec<Value>, String>) {
        match resource {
            Resource::Education => self.education = ContentState::from_result(result),
            Resource::Skills => self.skills = ContentState::from_result(result),
            Resource::Courses => {
                let mut state = ContentState::from_result(result);
                if let ContentState::Ready(courses) = &mut state {
                    sort_courses(courses);
                }
                self.courses = state;
            }
            _ => {}
        }
    }

    fn content(&self, theme: &Theme, _viewport_height: u16) -> SectionContent {
        let muted = Style::default().fg(theme.text_muted);
        let body = Style::default().fg(theme.text_secondary);
        let mut blocks = Vec::new();
        let mut item = 0;

        blocks.push(ContentBlock::new("about:h:education").plain().lines(vec![Line::styled("Education", theme.section_title)]));
        blocks.extend(status_block(self.id(), Resource::Education, &self.education, theme));
        for (i, edu) in self.education.items().iter().enumerate() {
            blocks.push(
                ContentBlock::new(format!("about:education:{i}"))
                    .title(edu.qualification.clone())
                    .item(item)
                    .lines(vec![
                        Line::styled(edu.institution.clone(), theme.highlight),
                        Line::styled(edu.period.clone(), muted),
                        Line::styled(edu.description.clone(), body),
                    ])
                    .reveal(RevealOptions::default().sliding(Direction::Left).delayed(i as f64 * 100.0)),
            );
            item += 1;
        }

        blocks.push(ContentBlock::new("about:h:skills").plain().lines(vec![Line::styled("Skills", theme.section_title)]));
        blocks.extend(status_block(self.id(), Resource::Skills, &self.skills, theme));
        for (i, skill) in self.skills.items().iter().enumerate() {
            blocks.push(
                ContentBlock::new(format!("about:skill:{i}"))
                    .title(skill.name.clone())
                    .item(item)
                    .lines(vec![Line::from(vec![
                        Span::styled(format!("{} · ", skill.category), theme.chip),
                        Span::styled(skill.summary.clone(), body),
                    ])])
                    .reveal(RevealOptions::default().delayed((i % 4) as f64 * 80.0)),
            );
            item += 1;
        }

        blocks.push(
            ContentBlock::new("about:h:courses")
                .plain()
                .lines(vec![Line::styled("Professional Certifications", theme.section_title)]),
        );
        blocks.extend(status_block(self.id(), Resource::Courses, &self.courses, theme));
        for (i, course) in self.courses.items().iter().enumerate() {
            let status = if course.end().is_none() { " · in progress" } else { "" };
            blocks.push(
                ContentBlock::new(format!("about:course:{i}"))
                    .title(course.title.clone())
                    .item(item)
                    .lines(vec![
                        Line::styled(course.organization.clone(), theme.highlight),
                        Line::styled(format!("{}{status}", course.period), muted),
                    ])
                    .reveal(RevealOptions::default().sliding(Direction::Right).delayed(i as f64 * 100.0)),
            );
            item += 1;
        }

        SectionContent {
            id: self.id(),
            title: Some("About".into()),
            min_height: 0,
            blocks,
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        let Some(entry) = self.entry_for(item) else {
            return Vec::new();
        };
        let was_open = self.modal.is_some();
        self.modal = Some(Modal {
            entry,
            scroll: 0,
            selected_unit: None,
            drawer_open: false,
        });
        if was_open { Vec::new() } else { vec![Effect::DialogOpened] }
    }

    fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let Some(modal) = self.modal.clone() else {
            return Vec::new();
        };
        let units = self.units(modal.entry).len();

        if is_close_key(key) {
            if modal.drawer_open {
                if let Some(current) = self.modal.as_mut() {
                    current.drawer_open = false;
                }
            } else {
                self.modal = None;
            }
            return vec![Effect::DialogClosed];
        }
        if modal.drawer_open {
            return Vec::new();
        }
        let Some(current) = self.modal.as_mut() else {
            return Vec::new();
        };
        match key {
            KeyCode::Tab if units > 0 => {
                current.selected_unit = Some(current.selected_unit.map_or(0, |i| (i + 1) % units));
            }
            KeyCode::BackTab if units > 0 => {
                current.selected_unit = Some(current.selected_unit.map_or(units - 1, |i| (i + units - 1) % units));
            }
            KeyCode::Enter if current.selected_unit.is_some() => {
                current.drawer_open = true;
                return vec![Effect::DialogOpened];
            }
            _ => {
                scroll_key(key, &mut current.scroll, 40 + units);
            }
        }
        Vec::new()
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some(modal) = &self.modal else {
            return;
        };
        let (title, lines) = self.dialog_lines(modal, theme);
        let hint = if self.units(modal.entry).is_empty() {
            "↑/↓ scroll · Esc close"
        } else {
            "Tab select unit · Enter open · ↑/↓ scroll · Esc close"
        };
        DialogView::new(title, lines)
            .scroll(modal.scroll)
            .hint(hint)
            .render(f, area, theme);
        if modal.drawer_open {
            if let Some(unit) = modal.selected_unit.and_then(|i| self.units(modal.entry).get(i)) {
                self.render_drawer(f, area, unit, theme);
            }
        }
    }
}
