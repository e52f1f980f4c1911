pub mod charting;
pub mod screen;
pub mod solve_list;

use cubik::{
    celebration::Celebration,
    stats::{format_optional, Metric, Statistics},
    time_series::SessionSeries,
    timer::Phase,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{ui::solve_list::render_solve_list, App, Prompt};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SOLVE_LIST_WIDTH: u16 = 32;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let coordinator = &self.coordinator;
        let phase = coordinator.phase();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SOLVE_LIST_WIDTH), Constraint::Min(1)])
            .split(area);

        render_solve_list(
            coordinator.session(),
            self.solve_list.selected,
            columns[0],
            buf,
        );

        let scramble = coordinator.scramble().to_string();
        let inner_width = columns[1].width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let scramble_lines = (scramble.width() as f64 / inner_width as f64).ceil().max(1.0) as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),              // session header
                Constraint::Length(1),              // padding
                Constraint::Length(scramble_lines), // scramble
                Constraint::Min(1),                 // timer
                Constraint::Length(4),              // statistics
                Constraint::Length(1),              // status
                Constraint::Length(2),              // legend
            ])
            .split(columns[1]);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let session_name = coordinator
            .session()
            .map_or("no session", |session| session.name());
        let inspection = if coordinator.inspection_enabled() {
            "inspection on"
        } else {
            "inspection off"
        };
        Paragraph::new(Line::from(vec![
            Span::styled(session_name.to_string(), bold_style.fg(Color::Cyan)),
            Span::raw(format!("   {}   {inspection}", coordinator.cube_size())),
        ]))
        .render(chunks[0], buf);

        let scramble_style = if phase == Phase::Idle {
            bold_style
        } else {
            bold_style.add_modifier(Modifier::DIM)
        };
        Paragraph::new(Span::styled(scramble, scramble_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        render_timer(&coordinator.display(), phase, chunks[3], buf);

        if let Some(session) = coordinator.session() {
            Paragraph::new(stats_lines(session.stats()))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
        }

        if let Some(status) = &self.status {
            let style = if status.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)
            };
            Paragraph::new(Span::styled(status.text.clone(), style))
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }

        let legend = match phase {
            Phase::Idle => "(space) start  (n)ew (o)pen (r)ename (d)elete session  (z) undo  (x) remove selected  (i)nspection  (c)ube  (s)cramble  (g)raph  (q)uit",
            Phase::Inspecting => "(space) start solving  (esc) cancel",
            Phase::Running => "(any key) stop  (esc) cancel",
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        if self.celebration.is_active() {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

fn render_timer(display: &str, phase: Phase, area: Rect, buf: &mut Buffer) {
    let color = match phase {
        Phase::Idle => Color::White,
        Phase::Inspecting => match display.parse::<i32>() {
            Ok(secs) if secs <= 3 => Color::Red,
            _ => Color::Yellow,
        },
        Phase::Running => Color::Green,
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Percentage(50),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        display.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(rows[1], buf);
}

fn stats_lines(stats: &Statistics) -> Vec<Line<'static>> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let metric_line = |label: &str, metric: Metric| {
        Line::from(vec![
            Span::styled(format!("{label:<7}"), dim),
            Span::raw(format!("{:>8}", format_optional(stats.current(metric)))),
            Span::styled("   best ", dim),
            Span::raw(format!("{:>8}", format_optional(stats.best(metric)))),
        ])
    };

    vec![
        metric_line("single", Metric::Single),
        metric_line("ao5", Metric::Ao5),
        metric_line("ao12", Metric::Ao12),
        Line::from(vec![
            Span::styled("mean ", dim),
            Span::raw(format_optional(stats.mean)),
            Span::styled("   sd ", dim),
            Span::raw(format_optional(stats.std_dev)),
            Span::styled("   solves ", dim),
            Span::raw(stats.count.to_string()),
        ]),
    ]
}

/// Full screen chart of singles, ao5 and ao12 over the session
pub fn render_session_chart(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let series = app
        .coordinator
        .session()
        .map(SessionSeries::from_session)
        .unwrap_or_default();

    if series.is_empty() {
        Paragraph::new("No solves to chart yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[0], buf);
    } else {
        let (solves, slowest) = charting::compute_chart_params(&series);

        let as_tuples = |points: &[cubik::time_series::TimeSeriesPoint]| -> Vec<(f64, f64)> {
            points.iter().map(|p| (*p).into()).collect()
        };
        let singles = as_tuples(&series.singles);
        let ao5 = as_tuples(&series.ao5);
        let ao12 = as_tuples(&series.ao12);

        let datasets = vec![
            dataset("single", Color::Magenta, &singles),
            dataset("ao5", Color::Cyan, &ao5),
            dataset("ao12", Color::Yellow, &ao12),
        ];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("solve")
                    .bounds([1.0, solves])
                    .labels(vec![
                        Span::styled("1", bold_style),
                        Span::styled(charting::format_label(solves), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, slowest])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(slowest), bold_style),
                    ]),
            )
            .render(chunks[0], buf);
    }

    if let Some(session) = app.coordinator.session() {
        let stats = session.stats();
        Paragraph::new(Span::styled(
            format!(
                "best {}   ao5 {}   ao12 {}   mean {}",
                format_optional(stats.best_time),
                format_optional(stats.best_ao5),
                format_optional(stats.best_ao12),
                format_optional(stats.mean),
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    Paragraph::new(Span::styled(
        "(g) back to timer  (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[3], buf);
}

fn dataset<'a>(name: &'static str, color: Color, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(data)
}

/// Text input or confirmation box drawn over the timer
pub fn render_prompt(app: &App, prompt: &Prompt, area: Rect, buf: &mut Buffer) {
    let (title, body) = match prompt {
        Prompt::NewSession => ("New session", format!("name: {}_", app.input)),
        Prompt::OpenSession => ("Open session", format!("name: {}_", app.input)),
        Prompt::RenameSession => ("Rename session", format!("new name: {}_", app.input)),
        Prompt::ConfirmOverwrite(name) => (
            "Session exists",
            format!("replace {name:?} with an empty session? (y/n)"),
        ),
        Prompt::ConfirmDelete => (
            "Delete session",
            format!(
                "delete {:?} and all its solves? (y/n)",
                app.coordinator.session().map_or("", |s| s.name())
            ),
        ),
    };

    let hint = match prompt {
        Prompt::ConfirmOverwrite(_) | Prompt::ConfirmDelete => "(y) yes  (any other key) no",
        _ => "(enter) confirm  (esc) cancel",
    };

    let popup = centered_rect(60, 5, area);
    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from(body),
        Line::from(""),
        Line::from(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan)),
    )
    .wrap(Wrap { trim: true })
    .render(popup, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Render celebration particles on top of the timer screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let alpha = 1.0 - (particle.age / particle.max_age);

            let style = if particle.is_letter() {
                if alpha > 0.4 {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                }
            } else if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, FileCoordinator, Status};
    use cubik::{
        config::{Config, FileConfigStore},
        coordinator::{Coordinator, TimerKey},
        session::FileSessionStore,
        stats::PersonalBest,
        timer::{TickIntervals, TimerConfig},
    };
    use std::{thread, time::Duration};
    use tempfile::{tempdir, TempDir};

    fn test_coordinator(dir: &TempDir) -> FileCoordinator {
        Coordinator::new(
            FileSessionStore::with_dir(dir.path().join("sessions")),
            FileConfigStore::with_path(dir.path().join("config.json")),
            Config {
                enable_inspection: false,
                ..Config::default()
            },
            TimerConfig {
                intervals: TickIntervals {
                    inspection: Duration::from_millis(20),
                    running: Duration::from_millis(5),
                },
                ..TimerConfig::default()
            },
        )
    }

    fn app_with_solves(dir: &TempDir, solves: usize) -> App {
        let mut coordinator = test_coordinator(dir);
        coordinator.new_session("practice", false).unwrap();
        for _ in 0..solves {
            coordinator.tap(TimerKey::Space).unwrap();
            thread::sleep(Duration::from_millis(10));
            coordinator.tap(TimerKey::Space).unwrap();
            coordinator.poll();
        }
        App::new(coordinator, false)
    }

    fn render(app: &App, area: Rect) -> Buffer {
        let mut buffer = Buffer::empty(area);
        match &app.state {
            AppState::Timer => app.render(area, &mut buffer),
            AppState::Chart => render_session_chart(app, area, &mut buffer),
            AppState::Prompt(prompt) => {
                app.render(area, &mut buffer);
                render_prompt(app, prompt, area, &mut buffer);
            }
        }
        buffer
    }

    fn text(buffer: &Buffer) -> String {
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_timer_screen_without_session() {
        let dir = tempdir().unwrap();
        let app = App::new(test_coordinator(&dir), false);
        let rendered = text(&render(&app, Rect::new(0, 0, 120, 30)));
        assert!(rendered.contains("no session"));
        assert!(rendered.contains("0.00"));
        assert!(rendered.contains("(q)uit"));
    }

    #[test]
    fn test_timer_screen_shows_session_and_stats() {
        let dir = tempdir().unwrap();
        let app = app_with_solves(&dir, 2);
        let rendered = text(&render(&app, Rect::new(0, 0, 120, 30)));
        assert!(rendered.contains("practice"));
        assert!(rendered.contains("3x3x3"));
        assert!(rendered.contains("Solves (2)"));
        assert!(rendered.contains("solves 2"));
        // no ao5 yet
        assert!(rendered.contains("n/a"));
    }

    #[test]
    fn test_status_line_is_rendered() {
        let dir = tempdir().unwrap();
        let mut app = App::new(test_coordinator(&dir), false);
        app.status = Some(Status {
            text: "no session loaded".into(),
            is_error: true,
        });
        let rendered = text(&render(&app, Rect::new(0, 0, 120, 30)));
        assert!(rendered.contains("no session loaded"));
    }

    #[test]
    fn test_chart_screen() {
        let dir = tempdir().unwrap();
        let mut app = app_with_solves(&dir, 0);
        app.state = AppState::Chart;
        let rendered = text(&render(&app, Rect::new(0, 0, 80, 24)));
        assert!(rendered.contains("No solves to chart yet"));

        let dir = tempdir().unwrap();
        let mut app = app_with_solves(&dir, 6);
        app.state = AppState::Chart;
        let rendered = text(&render(&app, Rect::new(0, 0, 80, 24)));
        assert!(rendered.contains("solve"));
        assert!(rendered.contains("seconds"));
        assert!(rendered.contains("back to timer"));
    }

    #[test]
    fn test_prompt_overlay() {
        let dir = tempdir().unwrap();
        let mut app = App::new(test_coordinator(&dir), false);
        app.state = AppState::Prompt(Prompt::NewSession);
        app.input = "sunday".into();
        let rendered = text(&render(&app, Rect::new(0, 0, 100, 30)));
        assert!(rendered.contains("New session"));
        assert!(rendered.contains("name: sunday_"));
    }

    #[test]
    fn test_tiny_areas_do_not_panic() {
        let dir = tempdir().unwrap();
        let mut app = app_with_solves(&dir, 1);
        for area in [Rect::new(0, 0, 10, 4), Rect::new(0, 0, 200, 5), Rect::new(0, 0, 20, 50)] {
            app.state = AppState::Timer;
            assert_eq!(*render(&app, area).area(), area);
            app.state = AppState::Chart;
            assert_eq!(*render(&app, area).area(), area);
            app.state = AppState::Prompt(Prompt::ConfirmDelete);
            assert_eq!(*render(&app, area).area(), area);
        }
    }

    #[test]
    fn test_celebration_rendering() {
        let dir = tempdir().unwrap();
        let mut app = app_with_solves(&dir, 1);
        app.celebration.start(
            &[PersonalBest {
                metric: Metric::Single,
                value: 9.5,
                formatted: "9.50".into(),
                previous: Some(10.0),
            }],
            80,
            24,
        );
        assert!(app.celebration.is_active());

        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(*render(&app, area).area(), area);
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 3);
        assert_eq!(centered_rect(60, 5, area), area);
        assert_eq!(centered_rect(10, 1, area), Rect::new(15, 1, 10, 1));
    }
}
