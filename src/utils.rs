use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}

/// A horizontal bar of `width` cells filled to `percent`.
pub fn percent_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn contains(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 80, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 40);
        assert!(contains(outer, inner.x, inner.y));
    }

    #[test]
    fn bars_and_plurals() {
        assert_eq!(percent_bar(50.0, 4), "██░░");
        assert_eq!(percent_bar(120.0, 2), "██");
        assert_eq!(plural(1, "day"), "1 day");
        assert_eq!(plural(3, "day"), "3 days");
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 2, 3, 1);
        assert!(contains(r, 2, 2));
        assert!(contains(r, 4, 2));
        assert!(!contains(r, 5, 2));
        assert!(!contains(r, 2, 3));
    }
}
