use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::config::GameType;
use crate::engine::{ClaimFeedback, DisplaySymbol, Symbol};
use crate::highscore::Highscore;
use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Audio-channel encoding of a symbol, applied only at this boundary:
/// the engine never deals in letters.
pub fn audio_letter(symbol: Symbol) -> char {
    match symbol {
        1..=26 => (b'A' + symbol - 1) as char,
        _ => '?',
    }
}

fn humanized_age(entry: &Highscore) -> String {
    let elapsed = (chrono::Local::now() - entry.achieved_at)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Home => render_home(self, area, buf),
            AppState::Playing => render_playing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_home(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let magenta_style = Style::default().fg(Color::Magenta);

    let mut lines = vec![
        Line::from(Span::styled("nbak", bold_style.fg(Color::Cyan))),
        Line::from(Span::styled("n-back memory training", dim_style)),
        Line::default(),
    ];

    match app.controller.best() {
        Some(best) => lines.push(Line::from(vec![
            Span::raw("best score: "),
            Span::styled(best.score.to_string(), bold_style.fg(Color::Green)),
            Span::styled(format!("  ({})", humanized_age(best)), dim_style),
        ])),
        None => lines.push(Line::from(Span::styled("no sessions played yet", dim_style))),
    }

    let cfg = app.controller.config();
    lines.push(Line::from(vec![
        Span::raw("mode: "),
        Span::styled(app.controller.game_type().to_string(), magenta_style),
        Span::styled(
            format!("  ·  n = {}  ·  {} stimuli", cfg.n_back, cfg.size),
            dim_style,
        ),
    ]));
    lines.push(Line::default());

    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled(
        "(s)tart  (t)oggle mode  (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    centered_paragraph(lines, area, buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let snap = app.controller.snapshot();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(7),
            Constraint::Length(2),
        ])
        .split(area);

    // Progress counts positions, so cap at the total once the cursor
    // has walked off the end
    let position = (snap.index + 1).min(snap.total);
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("score {}", snap.score), bold_style),
        Span::styled(
            format!("   stimulus {}/{}", position, snap.total),
            dim_style,
        ),
        Span::styled(
            format!("   {}", app.controller.game_type()),
            dim_style,
        ),
    ]))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    match app.controller.game_type() {
        GameType::Audio => render_letter(snap.display, chunks[1], buf),
        _ => render_grid(snap.display, app.controller.config().combinations, chunks[1], buf),
    }

    let feedback = match app.last_feedback {
        Some(ClaimFeedback::Correct) => Span::styled(
            "match! +1",
            Style::default().fg(Color::Green).patch(bold_style),
        ),
        Some(ClaimFeedback::Incorrect) => Span::styled(
            "no match -1",
            Style::default().fg(Color::Red).patch(bold_style),
        ),
        Some(ClaimFeedback::AlreadyClaimed) => {
            Span::styled("already flagged", dim_style)
        }
        Some(ClaimFeedback::NotRunning) | None => {
            Span::styled("space: flag a match  ·  esc: abort", dim_style)
        }
    };
    Paragraph::new(Line::from(feedback))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
}

/// 3×3 (or wider) grid of cells; the active symbol's cell is filled.
fn render_grid(display: DisplaySymbol, combinations: u8, area: Rect, buf: &mut Buffer) {
    let side = (combinations as f64).sqrt().ceil() as u16;
    if side == 0 {
        return;
    }

    let active = match display {
        DisplaySymbol::Active(symbol) => Some(symbol),
        _ => None,
    };

    // Keep the board square and centered
    let cell = (area.height / side).min(area.width / (side * 2)).max(1);
    let board_height = cell * side;
    let board_width = cell * 2 * side;
    let board = Rect {
        x: area.x + (area.width.saturating_sub(board_width)) / 2,
        y: area.y + (area.height.saturating_sub(board_height)) / 2,
        width: board_width.min(area.width),
        height: board_height.min(area.height),
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, side as u32); side as usize])
        .split(board);

    for (row_idx, row) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, side as u32); side as usize])
            .split(*row);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let symbol = (row_idx * side as usize + col_idx) as u8 + 1;
            if symbol > combinations {
                continue;
            }
            let style = if active == Some(symbol) {
                Style::default().bg(Color::Cyan)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Block::default()
                .borders(Borders::ALL)
                .style(style)
                .render(*cell_area, buf);
        }
    }
}

/// Large letter stand-in for the spoken stimulus.
fn render_letter(display: DisplaySymbol, area: Rect, buf: &mut Buffer) {
    let text = match display {
        DisplaySymbol::Active(symbol) => Span::styled(
            audio_letter(symbol).to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        DisplaySymbol::NoStimulus => Span::styled("·", Style::default().add_modifier(Modifier::DIM)),
        DisplaySymbol::Ended => Span::default(),
    };

    let middle = Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    };
    Paragraph::new(Line::from(text))
        .alignment(Alignment::Center)
        .render(middle, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![Line::from(Span::styled("session complete", bold_style))];
    lines.push(Line::default());

    if let Some(result) = &app.last_result {
        lines.push(Line::from(vec![
            Span::raw("score: "),
            Span::styled(
                result.score.to_string(),
                bold_style.fg(if result.score >= 0 {
                    Color::Green
                } else {
                    Color::Red
                }),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "{} correct · {} wrong · {} unclaimed",
                result.summary.correct, result.summary.incorrect, result.summary.unclaimed
            ),
            dim_style,
        )));
        lines.push(Line::default());

        if result.new_highscore {
            lines.push(Line::from(Span::styled(
                "new high score!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            )));
            if let Some(previous) = &result.previous_best {
                lines.push(Line::from(Span::styled(
                    format!("previous best: {} ({})", previous.score, humanized_age(previous)),
                    dim_style,
                )));
            }
        } else if let Some(best) = app.controller.best() {
            lines.push(Line::from(Span::styled(
                format!("best: {} ({})", best.score, humanized_age(best)),
                dim_style,
            )));
        }
    }

    if !app.recent.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("recent sessions", bold_style)));
        for record in &app.recent {
            lines.push(Line::from(Span::styled(
                format!(
                    "{:>4}  {}  n={}  {}",
                    record.score,
                    record.game_type,
                    record.n_back,
                    HumanTime::from(
                        (chrono::Local::now() - record.played_at)
                            .to_std()
                            .unwrap_or_default()
                    )
                    .to_text_en(Accuracy::Rough, Tense::Past)
                ),
                dim_style,
            )));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r)etry  (h)ome  (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    centered_paragraph(lines, area, buf);
}

fn centered_paragraph(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
