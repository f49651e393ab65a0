use crate::ui::theme::Theme;
use unmounter::models::Mount;
use unmounter::util::human::truncate_left;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

pub fn render_holders(
    f: &mut Frame,
    area: Rect,
    mount: Option<&Mount>,
    state: &mut TableState,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused { theme.border_focused } else { theme.border };
    let title = match mount {
        Some(m) => format!("2 Open files  {}", m.path),
        None    => "2 Open files".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, theme.title));

    let m = match mount {
        Some(m) => m,
        None    => {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        }
    };

    if let Some(err) = &m.usage_error {
        let p = Paragraph::new(Span::styled(err.clone(), theme.crit))
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
        return;
    }
    if m.usages.is_empty() {
        let p = Paragraph::new(Span::styled(" Nothing holds this mount open", theme.ok)).block(block);
        f.render_widget(p, area);
        return;
    }

    // room left for the file column once the fixed columns are drawn
    let name_width = area.width.saturating_sub(34) as usize;

    let header = Row::new(["Command", "PID", "User", "File"].map(|h| Cell::from(h).style(theme.text_dim)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = m.usages.iter().map(|u| {
        let mut name = truncate_left(&u.name, name_width.max(8));
        if u.also_open > 0 {
            name = format!("{} (+{})", name, u.also_open);
        }
        Row::new(vec![
            Cell::from(u.command.clone()).style(theme.text),
            Cell::from(u.pid.to_string()).style(theme.warn),
            Cell::from(u.user.clone()).style(theme.text_dim),
            Cell::from(name).style(theme.text),
        ])
    }).collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(if focused { theme.selected } else { Style::default() })
        .highlight_symbol(if focused { "▶ " } else { "  " });

    f.render_stateful_widget(table, area, state);
}
