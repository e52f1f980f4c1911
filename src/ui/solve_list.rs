use std::ops::Range;

use cubik::{
    session::SessionData,
    stats::{average_ending_at, AO12_WINDOW, AO5_WINDOW},
    time_format::format_time_seconds,
};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

pub struct SolveRowData<'a> {
    /// 1-based
    pub index: usize,
    pub time: &'a str,
    pub ao5: Option<f64>,
    pub ao12: Option<f64>,
    pub is_best: bool,
    pub is_selected: bool,
}

/// Pure presenter for a single solve row
pub fn present_row(data: &SolveRowData) -> Row<'static> {
    let average = |value: Option<f64>| value.map(format_time_seconds).unwrap_or_default();

    let time_style = if data.is_best {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let row = Row::new(vec![
        Cell::from(data.index.to_string()).style(Style::default().fg(Color::DarkGray)),
        Cell::from(data.time.to_string()).style(time_style),
        Cell::from(average(data.ao5)),
        Cell::from(average(data.ao12)),
    ]);

    if data.is_selected {
        row.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        row
    }
}

/// Rows to show for `len` solves in `height` lines: the newest ones, scrolled
/// back far enough to keep `selected` in view.
pub fn visible_range(len: usize, height: usize, selected: Option<usize>) -> Range<usize> {
    if len == 0 || height == 0 {
        return 0..0;
    }
    let anchor = selected.unwrap_or(len - 1).min(len - 1);
    let start = len.saturating_sub(height).min(anchor);
    start..(start + height).min(len)
}

pub fn render_solve_list(
    session: Option<&SessionData>,
    selected: Option<usize>,
    area: Rect,
    buf: &mut Buffer,
) {
    let title = session.map_or_else(|| "Solves".to_string(), |s| format!("Solves ({})", s.len()));
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some(session) = session.filter(|s| !s.is_empty()) else {
        Paragraph::new("no solves yet")
            .style(Style::default().fg(Color::Gray))
            .block(block)
            .render(area, buf);
        return;
    };

    // borders + header
    let height = area.height.saturating_sub(3) as usize;
    let best = session.stats().best_time;

    let rows: Vec<Row> = visible_range(session.len(), height, selected)
        .map(|i| {
            let solve = &session.solves()[i];
            let index = i + 1;
            present_row(&SolveRowData {
                index,
                time: &solve.time,
                ao5: average_ending_at(session.all_ao5(), AO5_WINDOW, index),
                ao12: average_ending_at(session.all_ao12(), AO12_WINDOW, index),
                is_best: best == Some(solve.raw_time),
                is_selected: selected == Some(i),
            })
        })
        .collect();

    let header = Row::new(vec!["#", "time", "ao5", "ao12"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let widths = [
        Constraint::Length(4),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Min(6),
    ];

    Widget::render(
        Table::new(rows, widths).header(header).block(block).column_spacing(1),
        area,
        buf,
    );
}
