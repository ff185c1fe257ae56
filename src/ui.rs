use std::time::Instant;

use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Position, Rect, Size},
    prelude::Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::app::{App, Hitboxes};
use crate::navigation::ScrollSurface;
use crate::page::FOOTER_ROWS;
use crate::reveal::Direction;
use crate::theme::Theme;

pub const SIDEBAR_WIDTH: u16 = 30;
pub const RAIL_WIDTH: u16 = 5;
pub const CONTENT_MARGIN: u16 = 2;

pub struct ScreenAreas {
    pub sidebar: Rect,
    pub main: Rect,
    pub status: Rect,
}

/// Sidebar (or rail) on the left, the scrolling page, one status row.
pub fn screen_areas(area: Rect, collapsed: bool) -> ScreenAreas {
    let rows = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let sidebar_width = if collapsed { RAIL_WIDTH } else { SIDEBAR_WIDTH };
    let columns = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
        .split(rows[0]);
    ScreenAreas {
        sidebar: columns[0],
        main: columns[1],
        status: rows[1],
    }
}

/// Width available to content blocks: the main area minus the scrollbar
/// column and the side margins.
pub fn content_width(main: Rect) -> u16 {
    main.width.saturating_sub(1 + 2 * CONTENT_MARGIN)
}

pub fn draw(f: &mut Frame, app: &mut App, now: Instant) {
    let areas = screen_areas(f.area(), app.nav.state().sidebar_collapsed);
    let mut hitboxes = Hitboxes {
        main: areas.main,
        ..Hitboxes::default()
    };

    render_sidebar(f, areas.sidebar, app, &mut hitboxes);
    render_page(f, areas.main, app, now);
    render_indicator(f, areas.main, app, &mut hitboxes);
    render_status(f, areas.status, app);

    if let Some(owner) = app.sections.modal_owner() {
        owner.render_modal(f, f.area(), &app.theme);
    }
    app.hitboxes = hitboxes;
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &App, hitboxes: &mut Hitboxes) {
    let theme = &app.theme;
    let state = app.nav.state();
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.paper_bg));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let chevron_symbol = if state.sidebar_collapsed { "»" } else { "«" };
    let chevron = Rect {
        x: inner.x + inner.width.saturating_sub(2),
        y: inner.y,
        width: 2.min(inner.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Span::styled(chevron_symbol, Style::default().fg(theme.primary))),
        chevron,
    );
    hitboxes.chevron = Some(chevron);

    if state.sidebar_collapsed {
        for (i, section) in app.nav.sections().iter().enumerate() {
            let row = Rect {
                x: inner.x,
                y: inner.y + 2 + i as u16,
                width: inner.width,
                height: 1,
            };
            if row.y >= inner.y + inner.height {
                break;
            }
            let style = if section.id == state.active_section_id {
                theme.nav_active
            } else {
                theme.nav_key
            };
            f.render_widget(Paragraph::new(Span::styled(format!(" {} ", section.key), style)), row);
            hitboxes.nav_items.push((row, section.id));
        }
        return;
    }

    let profile = &app.settings().profile;
    let mut header = vec![
        Line::styled(profile.name.clone(), theme.hero_title),
        Line::styled(profile.title.clone(), Style::default().fg(theme.text_muted)),
    ];
    let socials: Vec<&str> = [
        ("GitHub", &profile.github),
        ("LinkedIn", &profile.linkedin),
        ("Instagram", &profile.instagram),
    ]
    .into_iter()
    .filter(|(_, url)| url.is_some())
    .map(|(label, _)| label)
    .collect();
    if !socials.is_empty() {
        header.push(Line::styled(socials.join(" · "), theme.chip));
    }
    let header_height = header.len() as u16;
    f.render_widget(
        Paragraph::new(header),
        Rect {
            height: header_height.min(inner.height),
            width: inner.width.saturating_sub(2),
            ..inner
        },
    );

    let nav_top = inner.y + header_height + 1;
    for (i, section) in app.nav.sections().iter().enumerate() {
        let row = Rect {
            x: inner.x,
            y: nav_top + i as u16,
            width: inner.width,
            height: 1,
        };
        if row.y >= inner.y + inner.height {
            break;
        }
        let active = section.id == state.active_section_id;
        let style = if active { theme.nav_active } else { theme.nav_item };
        let label_width = (inner.width as usize).saturating_sub(5);
        let line = Line::from(vec![
            Span::styled(format!(" {:<label_width$}", section.label), style),
            Span::styled(format!(" {} ", section.key), if active { style } else { theme.nav_key }),
        ]);
        f.render_widget(Paragraph::new(line), row);
        hitboxes.nav_items.push((row, section.id));
    }

    let help = vec![
        Line::styled("Keyboard Shortcuts", Style::default().fg(theme.text_secondary).add_modifier(Modifier::BOLD)),
        Line::styled("Press number keys to navigate", theme.hint),
        Line::styled("Use ← → to jump between sections", theme.hint),
        Line::styled("b toggle sidebar · q quit", theme.hint),
    ];
    let help_height = help.len() as u16;
    let help_top = inner.y + inner.height.saturating_sub(help_height);
    if help_top > nav_top + app.nav.sections().len() as u16 {
        f.render_widget(
            Paragraph::new(help).wrap(Wrap { trim: true }),
            Rect {
                y: help_top,
                height: help_height,
                ..inner
            },
        );
    }
}

fn render_page(f: &mut Frame, area: Rect, app: &App, now: Instant) {
    let theme = &app.theme;
    let layout = app.page.layout();
    let view_width = area.width.saturating_sub(1);
    let size = Size::new(view_width, layout.total_height.max(area.height));
    let bounds = Rect::new(0, 0, size.width, size.height);
    let mut scroll_view = ScrollView::new(size)
        .horizontal_scrollbar_visibility(ScrollbarVisibility::Never)
        .vertical_scrollbar_visibility(ScrollbarVisibility::Always);
    scroll_view.render_widget(Block::default().style(Style::default().bg(theme.root_bg)), bounds);

    let width = layout.width;
    for span in &layout.sections {
        if let Some(title) = &span.title {
            let rule = "─".repeat((width as usize).saturating_sub(title.chars().count() + 1));
            let heading = Line::from(vec![
                Span::styled(title.clone(), theme.section_title),
                Span::styled(format!(" {rule}"), Style::default().fg(theme.border)),
            ]);
            scroll_view.render_widget(
                Paragraph::new(heading),
                Rect::new(CONTENT_MARGIN, span.top, width, 1).intersection(bounds),
            );
        }
    }

    for placed in &layout.blocks {
        let progress = app.reveals.progress(&placed.block.key, now);
        if progress <= 0.0 {
            continue;
        }
        let offset = ((1.0 - progress) * placed.block.reveal.distance as f64).round() as u16;
        let (mut x, mut y) = (CONTENT_MARGIN, placed.y);
        match placed.block.reveal.direction {
            Direction::Up => y += offset,
            Direction::Down => y = y.saturating_sub(offset),
            Direction::Left => x += offset,
            Direction::Right => x = x.saturating_sub(offset),
        }
        let rect = Rect::new(x, y, width, placed.height).intersection(bounds);
        if rect.is_empty() {
            continue;
        }
        let selected = placed
            .block
            .item
            .is_some_and(|item| app.selection == Some((placed.section, item)));
        scroll_view.render_widget(placed.block.paragraph(selected, progress < 0.5, theme), rect);
    }

    let year = chrono::Local::now().year();
    let footer = Paragraph::new(vec![
        Line::styled("─".repeat(width as usize), Style::default().fg(theme.border)),
        Line::styled(format!("© {year} {}. All rights reserved.", app.settings().profile.name), theme.footer),
        Line::styled("Website inspired by https://www.cleverdeveloper.in/", theme.footer),
    ])
    .alignment(Alignment::Center);
    scroll_view.render_widget(
        footer,
        Rect::new(CONTENT_MARGIN, layout.footer_top, width, FOOTER_ROWS).intersection(bounds),
    );

    let mut state = ScrollViewState::default();
    state.set_offset(Position::new(0, app.page.scroll_y()));
    f.render_stateful_widget(scroll_view, area, &mut state);
}

fn render_indicator(f: &mut Frame, area: Rect, app: &App, hitboxes: &mut Hitboxes) {
    let last = app.nav.sections().len().saturating_sub(1);
    let on_last = app.nav.active_index() == Some(last);
    if !app.indicator.is_visible(app.is_compact(), on_last) || area.height < 3 {
        return;
    }
    let label = " ⌄ scroll ⌄ ";
    let width = (label.chars().count() as u16).min(area.width);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height - 2,
        width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Span::styled(label, app.theme.highlight)).style(Style::default().bg(app.theme.paper_bg)),
        rect,
    );
    hitboxes.indicator = Some(rect);
}

fn status_text(app: &App) -> String {
    if let Some((message, _)) = &app.status {
        return message.clone();
    }
    if app.sections.modal_owner().is_some() {
        return "Esc close | ↑/↓ scroll | c copy | Tab/Enter units | ←/→ gallery".to_string();
    }
    "1-6 Sections | ←/→ Prev/Next | ↑/↓ PgUp/PgDn Scroll | Tab Select | Enter Open | r Resume | e Contact | b Sidebar | q Quit"
        .to_string()
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let theme: &Theme = &app.theme;
    let style = if app.status.is_some() {
        theme.highlight
    } else {
        theme.footer
    };
    f.render_widget(Paragraph::new(status_text(app)).style(style), area);
}
