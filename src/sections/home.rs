use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    prelude::Frame,
    style::{Modifier, Style},
    text::{Line, Span},
};

use super::{is_close_key, DialogView, PageSection};
use crate::config::Profile;
use crate::models::Effect;
use crate::page::{ContentBlock, SectionContent};
use crate::reveal::{Direction, RevealOptions};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeDialog {
    Resume,
    Email,
}

/// The hero: greeting, title, tagline and the two contact actions.
pub struct HomeSection {
    profile: Profile,
    dialog: Option<HomeDialog>,
}

impl HomeSection {
    pub fn new(profile: Profile) -> Self {
        Self { profile, dialog: None }
    }

    #[cfg(test)]
    pub fn dialog(&self) -> Option<HomeDialog> {
        self.dialog
    }

    /// Opening while another home dialog is up swaps it without changing the count.
    pub fn open(&mut self, dialog: HomeDialog) -> Vec<Effect> {
        let was_open = self.dialog.is_some();
        self.dialog = Some(dialog);
        if was_open { Vec::new() } else { vec![Effect::DialogOpened] }
    }

    fn dialog_view(&self, dialog: HomeDialog, theme: &Theme) -> DialogView {
        let label = Style::default().fg(theme.text_muted);
        match dialog {
            HomeDialog::Resume => DialogView::new(
                "Resume",
                vec![
                    Line::from(format!("{} · {}", self.profile.name, self.profile.title)),
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled("PDF  ", label),
                        Span::styled(self.profile.resume_url.clone(), theme.highlight),
                    ]),
                    Line::raw(""),
                    Line::styled("Open the link in a browser to view or download.", label),
                ],
            )
            .hint("c copy link · Esc close")
            .size(60, 40),
            HomeDialog::Email => DialogView::new(
                "Get In Touch",
                vec![
                    Line::from("I'd love to hear from you."),
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled("Email  ", label),
                        Span::styled(self.profile.email.clone(), theme.highlight),
                    ]),
                    Line::raw(""),
                    Line::styled("Include your name, company and a short message.", label),
                ],
            )
            .hint("c copy address · Esc close")
            .size(60, 40),
        }
    }
}

impl PageSection for HomeSection {
    fn id(&self) -> &'static str {
        "home"
    }

    fn content(&self, theme: &Theme, viewport_height: u16) -> SectionContent {
        let hero = ContentBlock::new("home:hero").plain().lines(vec![
            Line::raw(""),
            Line::from(vec![
                Span::styled("G'day", Style::default().fg(theme.secondary).add_modifier(Modifier::BOLD)),
                Span::styled(", I'm ", theme.hero_title),
                Span::styled(self.profile.name.clone(), theme.highlight),
                Span::styled(",", theme.hero_title),
            ]),
            Line::from(vec![
                Span::styled("An ", theme.hero_title),
                Span::styled(self.profile.title.clone(), theme.highlight),
                Span::styled(".", theme.hero_title),
            ]),
            Line::raw(""),
            Line::styled(self.profile.tagline.clone(), Style::default().fg(theme.text_secondary)),
        ]);
        let resume = ContentBlock::new("home:resume")
            .title("Resume")
            .item(0)
            .accent(Some(theme.primary))
            .lines(vec![Line::from(vec![
                Span::styled("[r] ", theme.nav_key),
                Span::raw("View my résumé"),
            ])])
            .reveal(RevealOptions::default().delayed(200.0).sliding(Direction::Left));
        let contact = ContentBlock::new("home:contact")
            .title("Get in touch")
            .item(1)
            .accent(Some(theme.secondary))
            .lines(vec![Line::from(vec![
                Span::styled("[e] ", theme.nav_key),
                Span::raw("Send me a message"),
            ])])
            .reveal(RevealOptions::default().delayed(300.0).sliding(Direction::Left));
        SectionContent {
            id: self.id(),
            title: None,
            min_height: viewport_height,
            blocks: vec![hero, resume, contact],
        }
    }

    fn open_item(&mut self, item: usize) -> Vec<Effect> {
        match item {
            0 => self.open(HomeDialog::Resume),
            1 => self.open(HomeDialog::Email),
            _ => Vec::new(),
        }
    }

    fn has_modal(&self) -> bool {
        self.dialog.is_some()
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let Some(dialog) = self.dialog else {
            return Vec::new();
        };
        if is_close_key(key) {
            self.dialog = None;
            return vec![Effect::DialogClosed];
        }
        match (dialog, key) {
            (HomeDialog::Resume, KeyCode::Char('c')) => vec![Effect::Copy(self.profile.resume_url.clone())],
            (HomeDialog::Email, KeyCode::Char('c')) => vec![Effect::Copy(self.profile.email.clone())],
            _ => Vec::new(),
        }
    }

    fn render_modal(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        if let Some(dialog) = self.dialog {
            self.dialog_view(dialog, theme).render(f, area, theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn hero_fills_the_viewport() {
        let home = HomeSection::new(profile());
        let content = home.content(&Theme::default(), 40);
        assert_eq!(content.min_height, 40);
        assert!(content.title.is_none());
        assert!(block_text(&content).contains("Tristan Jones"));
    }

    #[test]
    fn dialogs_count_once_and_close() {
        let mut home = HomeSection::new(profile());
        assert_eq!(home.open_item(0), vec![Effect::DialogOpened]);
        assert!(home.open(HomeDialog::Email).is_empty());
        assert_eq!(home.dialog(), Some(HomeDialog::Email));
        assert_eq!(
            home.handle_modal_key(KeyCode::Char('c')),
            vec![Effect::Copy("me@example.com".into())]
        );
        assert_eq!(home.handle_modal_key(KeyCode::Esc), vec![Effect::DialogClosed]);
        assert!(!home.has_modal());
        assert!(home.handle_modal_key(KeyCode::Esc).is_empty());
    }

    #[test]
    fn resume_dialog_shows_the_link() {
        let mut home = HomeSection::new(profile());
        home.open(HomeDialog::Resume);
        let screen = render_modal_text(&home);
        assert!(screen.contains("Resume"));
        assert!(screen.contains("example.com/resume.pdf"));
    }
}
