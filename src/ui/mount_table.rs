use crate::ui::theme::Theme;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use unmounter::models::Mount;

const BAR_WIDTH: usize = 8;

pub fn render_mount_table(
    f: &mut Frame,
    area: Rect,
    mounts: &[Mount],
    error: Option<&str>,
    state: &mut TableState,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused { theme.border_focused } else { theme.border };
    let busy = mounts.iter().filter(|m| m.is_busy()).count();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!("1 Mounts  ({} total, {} busy)", mounts.len(), busy), theme.title));

    if let Some(err) = error {
        let msg = Paragraph::new(Span::styled(format!(" ✖ {}", err), theme.crit)).block(block);
        f.render_widget(msg, area);
        return;
    }
    if mounts.is_empty() {
        let msg = Paragraph::new(Span::styled(" No removable mounts", theme.text_dim)).block(block);
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(["Device", "Path", "Free", "", "Size", "Holders"].map(|h| Cell::from(h).style(theme.text_dim)))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = mounts.iter().map(|m| {
        let (free, bar, bar_style) = match (&m.free_space, m.free_space_percentage) {
            (Some(fs), Some(pct)) => (fs.clone(), free_bar(pct), theme.free_style(pct)),
            _ => ("unknown".to_string(), "·".repeat(BAR_WIDTH), theme.text_dim),
        };
        let (holders, holders_style) = if m.usage_error.is_some() {
            ("error".to_string(), theme.crit)
        } else if m.is_busy() {
            (format!("{} busy", m.usages.len()), theme.warn)
        } else {
            ("idle".to_string(), theme.ok)
        };

        Row::new(vec![
            Cell::from(m.short_device().to_string()).style(theme.text_dim),
            Cell::from(m.path.clone()).style(theme.text),
            Cell::from(free).style(theme.text),
            Cell::from(bar).style(bar_style),
            Cell::from(m.total_space.clone().unwrap_or_else(|| "-".into())).style(theme.text_dim),
            Cell::from(holders).style(holders_style),
        ])
    }).collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(11),
        Constraint::Length(BAR_WIDTH as u16 + 5),
        Constraint::Length(11),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(theme.selected)
        .highlight_symbol("▶ ");

    f.render_stateful_widget(table, area, state);
}

/// "█████░░░ 62%": filled part is the free share.
fn free_bar(pct: u8) -> String {
    let filled = (pct as usize * BAR_WIDTH + 50) / 100;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{} {:>2}%", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled), pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_rounds_to_width() {
        assert_eq!(free_bar(0), "░░░░░░░░  0%");
        assert_eq!(free_bar(50), "████░░░░ 50%");
        assert_eq!(free_bar(100), "████████ 100%");
    }
}
