use crate::app::Pending;
use crate::ui::theme::Theme;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render_confirm(f: &mut Frame, pending: &Pending, theme: &Theme) {
    let area = centered_rect(60, 8, f.area());
    f.render_widget(Clear, area);

    let warning = match pending {
        Pending::Unmount { busy: true, .. } =>
            "Files are open on this mount. The unmount will likely fail as busy.",
        Pending::Unmount { .. } =>
            "The device will be detached from the filesystem tree.",
        Pending::Kill { .. } =>
            "The process is sent SIGKILL and cannot clean up.",
        Pending::RestartAutomount { .. } =>
            "Automounted paths disappear until the daemon remounts them.",
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", pending.describe()), theme.title)),
        Line::from(Span::styled(format!("  {}", warning), theme.warn)),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y/Enter ", theme.footer_key),
            Span::styled(" confirm    ", theme.text_dim),
            Span::styled(" n/Esc ", theme.footer_key),
            Span::styled(" cancel", theme.text_dim),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_focused)
        .title(Span::styled(" Confirm ", theme.title));

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn render_working(f: &mut Frame, label: &str, theme: &Theme) {
    let area = centered_rect(52, 5, f.area());
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}…", label), theme.text_dim)),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_focused)
        .title(Span::styled(" Working ", theme.title));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let w = width.min(r.width);
    let h = height.min(r.height);
    Rect::new(
        r.x + (r.width.saturating_sub(w)) / 2,
        r.y + (r.height.saturating_sub(h)) / 2,
        w, h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_clamped_to_screen() {
        let r = centered_rect(60, 8, Rect::new(0, 0, 40, 6));
        assert_eq!((r.width, r.height), (40, 6));
        let r = centered_rect(20, 4, Rect::new(0, 0, 100, 30));
        assert_eq!((r.x, r.y), (40, 13));
    }
}
