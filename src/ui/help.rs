use crate::ui::popup::centered_rect;
use crate::ui::theme::Theme;
use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(62, 26, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_focused)
        .title(Span::styled(" Unmounter · Keybindings (? or F1 to close) ", theme.title));

    let lines = vec![
        key_line(theme, "Global", ""),
        key_line(theme, "  q / Ctrl-C",     "Quit"),
        key_line(theme, "  Tab / Shift-Tab","Switch between mounts and open files"),
        key_line(theme, "  ↑↓ / j k",       "Select"),
        key_line(theme, "  g / G",          "Jump first / last"),
        key_line(theme, "  Enter / l",      "Open the holders of a busy mount"),
        key_line(theme, "  Esc / h",        "Back / dismiss message"),
        key_line(theme, "  r / F5",         "Re-read mounts now"),
        key_line(theme, "  t",              "Cycle color theme"),
        Line::from(""),
        key_line(theme, "Actions (asked before running)", ""),
        key_line(theme, "  u",  "Unmount selected mount"),
        key_line(theme, "  x",  "Kill selected process (SIGKILL)"),
        key_line(theme, "  R",  "Restart the automount daemon"),
        key_line(theme, "  y / n", "Confirm / cancel"),
        Line::from(""),
        key_line(theme, "CLI modes", ""),
        key_line(theme, "  --json",          "Snapshot as JSON"),
        key_line(theme, "  --report",        "Human-readable report"),
        key_line(theme, "  --unmount PATH",  "Unmount and exit"),
        key_line(theme, "  --kill PID",      "Kill a holder and exit"),
        key_line(theme, "  --history",       "Recent actions [--last N]"),
        key_line(theme, "  --fixture",       "Run against demo data"),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn key_line<'a>(theme: &Theme, key: &'a str, desc: &'a str) -> Line<'a> {
    if desc.is_empty() {
        Line::from(Span::styled(key, theme.title))
    } else {
        Line::from(vec![
            Span::styled(format!("{:<20}", key), theme.footer_key),
            Span::styled(desc, theme.text_dim),
        ])
    }
}
