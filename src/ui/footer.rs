use crate::app::Focus;
use crate::ui::theme::Theme;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render_footer(f: &mut Frame, area: Rect, focus: Focus, theme: &Theme) {
    let keys: &[(&str, &str)] = match focus {
        Focus::Mounts => &[
            ("q", "Quit"), ("↑↓/jk", "Select"), ("Enter", "Holders"), ("u", "Unmount"),
            ("R", "Restart autofs"), ("r", "Refresh"), ("t", "Theme"), ("?", "Help"),
        ],
        Focus::Holders => &[
            ("Esc", "Mounts"), ("↑↓/jk", "Select"), ("x", "Kill"), ("u", "Unmount"),
            ("r", "Refresh"), ("?", "Help"),
        ],
    };

    let mut spans: Vec<Span> = vec![Span::styled(" ", theme.footer_bg)];
    for (key, desc) in keys {
        spans.push(Span::styled(format!(" {} ", key), theme.footer_key));
        spans.push(Span::styled(format!("{}  ", desc), theme.footer_text));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).style(theme.footer_bg), area);
}
