use crate::ui::theme::Theme;
use unmounter::models::{ServiceStatus, SystemSnapshot};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

// Status lines shown per service below its summary
const DETAIL_LINES: usize = 3;

pub fn render_services(f: &mut Frame, area: Rect, snap: Option<&SystemSnapshot>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled("3 Services", theme.title));

    let mut lines: Vec<Line> = Vec::new();
    match snap {
        None => lines.push(Line::from(Span::styled(" checking…", theme.text_dim))),
        Some(s) => {
            service_lines(&mut lines, &s.autofs, s.autofs_error.as_deref(), "running", "not running", theme);
            lines.push(Line::from(""));
            service_lines(&mut lines, &s.samba, s.samba_error.as_deref(), "no locked files", "files locked", theme);
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn service_lines<'a>(
    lines:    &mut Vec<Line<'a>>,
    svc:      &'a ServiceStatus,
    err:      Option<&'a str>,
    good:     &'a str,
    bad:      &'a str,
    theme:    &Theme,
) {
    let (dot, label, style) = match err {
        Some(_)            => ("✖", "check failed", theme.crit),
        None if svc.active => ("●", good, theme.service_style(true)),
        None               => ("○", bad, theme.service_style(false)),
    };
    lines.push(Line::from(vec![
        Span::styled(format!(" {} ", dot), style),
        Span::styled(format!("{:<8}", svc.name), theme.title),
        Span::styled(label, style),
    ]));

    if let Some(e) = err {
        lines.push(Line::from(Span::styled(format!("   {}", e), theme.text_dim)));
        return;
    }
    for l in svc.detail.lines().filter(|l| !l.trim().is_empty()).take(DETAIL_LINES) {
        lines.push(Line::from(Span::styled(format!("   {}", l.trim()), theme.text_dim)));
    }
}
