use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    prelude::Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use serde_json::Value;

use super::{chip_line, heading, is_close_key, scroll_key, status_block, text_lines, DialogView, PageSection};
use crate::github::{days_between, format_date, RepoStats, StatsRegistry, StatsSlot};
use crate::loader::Resource;
use crate::models::{ContentState, Effect, Project};
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::{Direction, RevealOptions};
use crate::theme::{parse_hex, Theme};
use crate::utils::{percent_bar, plural};

const LANGUAGE_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Modal {
    index: usize,
    slide: usize,
    scroll: u16,
}

/// Project cards and the project dialog with its gallery, links and
/// repository stats. Stats are fetched once per project per session.
#[derive(Debug, Default)]
pub struct ProjectsSection {
    projects: ContentState<Project>,
    stats: StatsRegistry,
    modal: Option<Modal>,
}

fn language_color(name: &str, index: usize) -> Color {
    let known = match name {
        "JavaScript" => Some("#f1c40f"),
        "TypeScript" => Some("#3178c6"),
        "HTML" => Some("#e34f26"),
        "CSS" => Some("#1572b6"),
        "Python" => Some("#3776ab"),
        "Java" => Some("#007396"),
        "C++" => Some("#00599c"),
        "Go" => Some("#00add8"),
        "Rust" => Some("#dea584"),
        "Swift" => Some("#fa7343"),
        "PHP" => Some("#777bb4"),
        "C#" => Some("#239120"),
        "Ruby" => Some("#cc342d"),
        "C" => Some("#a8b9cc"),
        "Shell" => Some("#89e051"),
        _ => None,
    };
    const FALLBACK: [&str; 6] = ["#f1c40f", "#e74c3c", "#3498db", "#2ecc71", "#9b59b6", "#e67e22"];
    known
        .or(Some(FALLBACK[index % FALLBACK.len()]))
        .and_then(parse_hex)
        .unwrap_or(Color::Gray)
}

/// `1247` → `"1,247"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn stats_lines(slot: Option<&StatsSlot>, theme: &Theme) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.text_secondary);
    let value = Style::default().fg(theme.text).add_modifier(Modifier::BOLD);
    let row = |name: &str, v: String| {
        Line::from(vec![Span::styled(format!("{name:<16}"), label), Span::styled(v, value)])
    };
    let mut lines = vec![heading("Repository Info", theme)];
    match slot {
        None | Some(StatsSlot::Loading) => {
            lines.push(Line::styled("Loading repository stats…", Style::default().fg(theme.text_muted)));
        }
        Some(StatsSlot::Failed(_)) => {
            lines.push(Line::styled("Unable to load repository stats", Style::default().fg(theme.error)));
        }
        Some(StatsSlot::Ready(stats)) => {
            lines.push(row("Total commits", group_thousands(stats.total_commits)));
            lines.push(row("First commit", format_date(stats.first_commit_date.as_deref())));
            lines.push(row("Last commit", format_date(stats.last_commit_date.as_deref())));
            let days = days_between(stats.first_commit_date.as_deref(), stats.last_commit_date.as_deref());
            lines.push(row("Active for", plural(days as usize, "day")));
            lines.push(row(
                "Stars / Forks",
                format!("{} / {}", group_thousands(stats.stars), group_thousands(stats.forks)),
            ));
            lines.push(row("Open issues", group_thousands(stats.open_issues)));
            if let Some(branch) = &stats.default_branch {
                lines.push(row("Default branch", branch.clone()));
            }
            lines.push(Line::raw(""));
            lines.push(heading("Languages", theme));
            let shown: Vec<_> = stats.languages.iter().filter(|l| l.percent_value() > 0.0).collect();
            if shown.is_empty() {
                lines.push(Line::styled("No language data available", Style::default().fg(theme.text_muted)));
            }
            for (i, lang) in shown.into_iter().enumerate() {
                let color = language_color(&lang.name, i);
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<14}", lang.name), label),
                    Span::styled(percent_bar(lang.percent_value(), LANGUAGE_BAR_WIDTH), Style::default().fg(color)),
                    Span::styled(format!(" {}%", lang.percentage), value),
                ]));
            }
        }
    }
    lines
}

impl ProjectsSection {
    pub fn apply_stats(&mut self, project_id: &str, result: Result<RepoStats, String>) {
        self.stats.finish(project_id, result);
    }

    #[cfg(test)]
    pub fn stats(&self, project_id: &str) -> Option<&StatsSlot> {
        self.stats.get(project_id)
    }

    fn current(&self) -> Option<(&Project, Modal)> {
        let modal = self.modal?;
        self.projects.items().get(modal.index).map(|p| (p, modal))
    }

    fn dialog_lines(&self, project: &Project, modal: Modal, theme: &Theme) -> Vec<Line<'static>> {
        let muted = Style::default().fg(theme.text_muted);
        let body = Style::default().fg(theme.text_secondary);
        let mut lines = vec![
            Line::styled(project.date.clone(), muted),
            Line::styled(project.short_description.clone(), body),
        ];
        if !project.key_words.is_empty() {
            lines.push(chip_line(&project.key_words, theme));
        }

        if !project.gallery.is_empty() {
            let count = project.gallery.len();
            let item = &project.gallery[modal.slide % count];
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                Span::styled("Gallery ", theme.popup_title),
                Span::styled(format!("‹ {} / {} ›", modal.slide % count + 1, count), theme.highlight),
            ]));
            lines.push(Line::styled(item.caption.clone(), body));
            lines.push(Line::styled(item.image.clone(), muted));
        }

        if !project.details.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Project Overview", theme));
            lines.extend(text_lines(&project.details, body));
        }

        if !project.links.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Links", theme));
            for link in &project.links {
                lines.push(Line::from(vec![
                    Span::styled(link.title.clone(), theme.highlight),
                    Span::styled(format!("  {}", link.url), muted),
                ]));
                if !link.description.is_empty() {
                    lines.push(Line::styled(link.description.clone(), body));
                }
            }
        }

        if let Some(url) = &project.github {
            lines.push(Line::raw(""));
            lines.extend(stats_lines(self.stats.get(&project.key()), theme));
            lines.push(Line::styled(format!("View on GitHub: {url}"), muted));
        }

        if !project.footnotes.is_empty() {
            lines.push(Line::raw(""));
            lines.push(heading("Notes", theme));
            lines.extend(text_lines(&project.footnotes, muted.add_modifier(Modifier::ITALIC)));
        }
        lines
    }
}

impl PageSection for ProjectsSection {
    fn id(&self) -> &'static str {
        "projects"
    }

    fn resources(&self) -> &'static [Resource] {
        &[Resource::Projects]
    }

    fn apply_content(&mut self, _resource: Resource, result: Result<Vec<Value>, String>) {
        self.projects = ContentState::from_result(result);
    }

    fn content(&self, theme: &Theme, _viewport_height: u16) -> SectionContent {
        let mut blocks: Vec<ContentBlock> = status_block(self.id(), Resource::Projects, &self.projects, theme)
            .into_iter()
            .collect();
        for (i, project) in self.projects.items().iter().enumerate() {
            let mut lines = vec![
                Line::styled(project.date.clone(), Style::default().fg(theme.text_muted)),
                Line::styled(project.short_description.clone(), Style::default().fg(theme.text_secondary)),
            ];
            if !project.key_words.is_empty() {
                lines.push(chip_line(&project.key_words, theme));
            }
            let direction = if i % 2 == 0 { Direction::Left } else { Direction::Right };
            blocks.push(
                ContentBlock::new(format!("projects:card:{}", project.key()))
                    .title(project.name.clone())
                    .item(i)
                    .lines(lines)
                    .reveal(RevealOptions::default().sliding(direction).delayed((i % 3) as f64 * 120.0)),
            );
        }
        SectionContent {
            id: self.id(),
            title: Some("Projects".into()),
            min_height: 0,
            blocks,
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        let Some(project) = self.projects.items().get(item) else {
            return Vec::new();
        };
        let key = project.key();
        let github = project.github.clone();
        let mut effects = Vec::new();
        if self.modal.is_none() {
            effects.push(Effect::DialogOpened);
        }
        self.modal = Some(Modal {
            index: item,
            slide: 0,
            scroll: 0,
        });
        if let Some(url) = github {
            if self.stats.begin(&key) {
                effects.push(Effect::FetchRepoStats { project_id: key, url });
            }
        }
        effects
    }

    fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let Some((project, _)) = self.current() else {
            return Vec::new();
        };
        let slides = project.gallery.len();
        let copy_target = project
            .github
            .clone()
            .or_else(|| project.links.first().map(|l| l.url.clone()));
        if is_close_key(key) {
            self.modal = None;
            return vec![Effect::DialogClosed];
        }
        let Some(modal) = self.modal.as_mut() else {
            return Vec::new();
        };
        match key {
            KeyCode::Right if slides > 0 => modal.slide = (modal.slide + 1) % slides,
            KeyCode::Left if slides > 0 => modal.slide = (modal.slide + slides - 1) % slides,
            KeyCode::Char('c') => {
                return copy_target.map(Effect::Copy).into_iter().collect();
            }
            _ => {
                scroll_key(key, &mut modal.scroll, 60);
            }
        }
        Vec::new()
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some((project, modal)) = self.current() else {
            return;
        };
        let mut hint = String::from("↑/↓ scroll");
        if !project.gallery.is_empty() {
            hint.push_str(" · ←/→ gallery");
        }
        if project.github.is_some() || !project.links.is_empty() {
            hint.push_str(" · c copy link");
        }
        hint.push_str(" · Esc close");
        DialogView::new(project.name.clone(), self.dialog_lines(project, modal, theme))
            .scroll(modal.scroll)
            .hint(hint)
            .size(80, 85)
            .render(f, area, theme);
    }
}
