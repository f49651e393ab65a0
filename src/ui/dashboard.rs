use crate::app::{App, Focus};
use crate::ui::{
    footer::render_footer,
    holders::render_holders,
    mount_table::render_mount_table,
    services::render_services,
};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let area  = f.area();
    let theme = app.theme.clone();

    // ── Root: header (2 lines) | body | footer ─────────────────────
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header line 1: title + clock ───────────────────────────────
    let now   = Local::now().format("%H:%M:%S").to_string();
    let left  = format!(" Unmounter v{}  {} ", env!("CARGO_PKG_VERSION"), app.theme_variant.name());
    let taken = app.snapshot.as_ref().map(|s| format!("read {} ", s.taken_at)).unwrap_or_default();
    let right = format!(" {}{} ", taken, now);
    let pad   = (area.width as usize).saturating_sub(left.chars().count() + right.chars().count());

    let line1 = Line::from(vec![
        Span::styled(left, theme.title),
        Span::styled(" ".repeat(pad), theme.header),
        Span::styled(right, theme.text_dim),
    ]);

    // ── Header line 2: last action outcome or summary ──────────────
    let line2 = match app.active_flash() {
        Some(fl) if fl.ok => Line::from(Span::styled(format!(" ✔ {}", fl.text), theme.ok)),
        Some(fl) => {
            let mut spans = vec![Span::styled(format!(" ✖ {}", fl.text), theme.crit)];
            if let Some(g) = fl.guidance {
                spans.push(Span::styled(format!("   {}", g), theme.warn));
            }
            Line::from(spans)
        }
        None => match &app.snapshot {
            Some(s) => {
                let held: usize = s.mounts.iter().map(|m| m.usages.len()).sum();
                Line::from(vec![
                    Span::styled(format!(" {} mounts  ", s.mounts.len()), theme.text_dim),
                    Span::styled(format!("{} busy  ", s.busy_count()), if s.busy_count() > 0 { theme.warn } else { theme.text_dim }),
                    Span::styled(format!("{} holders", held), theme.text_dim),
                    Span::styled(
                        if s.has_errors() { "   some checks failed" } else { "" },
                        theme.crit,
                    ),
                ])
            }
            None => Line::from(Span::styled(" reading mount table…", theme.text_dim)),
        },
    };

    f.render_widget(Paragraph::new(vec![line1, line2]).style(theme.header), root[0]);

    // ── Body: mounts left | services + holders right ───────────────
    let body = root[1];
    let narrow = area.width < 100;
    let cols = Layout::default()
        .direction(if narrow { Direction::Vertical } else { Direction::Horizontal })
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(0)])
        .split(cols[1]);

    let error = app.snapshot.as_ref().and_then(|s| s.error.clone());
    let focus = app.focus;
    let mounts = app.mounts().to_vec();
    render_mount_table(
        f, cols[0], &mounts, error.as_deref(), &mut app.mount_state,
        focus == Focus::Mounts, &theme,
    );

    render_services(f, right[0], app.snapshot.as_ref(), &theme);

    let selected = app.selected_mount().cloned();
    render_holders(
        f, right[1], selected.as_ref(), &mut app.holder_state,
        focus == Focus::Holders, &theme,
    );

    // ── Footer ─────────────────────────────────────────────────────
    render_footer(f, root[2], focus, &theme);
}
