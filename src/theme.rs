use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub root_bg: Color,
    pub paper_bg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub error: Color,

    // Specific components
    pub section_title: Style,
    pub hero_title: Style,
    pub highlight: Style,
    pub nav_item: Style,
    pub nav_active: Style,
    pub nav_key: Style,
    pub chip: Style,
    pub footer: Style,
    pub popup_title: Style,
    pub popup_border: Style,
    pub popup_text: Style,
    pub hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let primary = Color::Rgb(59, 130, 246);
        let secondary = Color::Rgb(139, 92, 246);
        Self {
            root_bg: Color::Rgb(10, 10, 10),
            paper_bg: Color::Rgb(26, 26, 26),
            primary,
            secondary,
            border: Color::Rgb(60, 60, 60),
            text: Color::White,
            text_secondary: Color::Rgb(204, 204, 204),
            text_muted: Color::Rgb(136, 136, 136),
            error: Color::Rgb(239, 68, 68),

            section_title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            hero_title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            highlight: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            nav_item: Style::default().fg(Color::Rgb(204, 204, 204)),
            nav_active: Style::default().fg(Color::White).bg(primary).add_modifier(Modifier::BOLD),
            nav_key: Style::default().fg(Color::Rgb(136, 136, 136)),
            chip: Style::default().fg(secondary),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            popup_title: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            popup_border: Style::default().fg(primary).bg(Color::Rgb(26, 26, 26)),
            popup_text: Style::default().fg(Color::White),
            hint: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        }
    }
}

/// `#rrggbb` (leading `#` optional) to a terminal color.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#3b82f6"), Some(Color::Rgb(59, 130, 246)));
        assert_eq!(parse_hex("8B5CF6"), Some(Color::Rgb(139, 92, 246)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }
}
