#![allow(
    // Board coordinates are tiny, casting them to terminal units cannot truncate
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use crate::app::App;
use crate::components::{Cell, Tetromino};
use crate::config::{Config, DisplayConfig};
use crate::engine::{RunState, Snapshot};
use crate::game::{BOARD_HEIGHT, BOARD_WIDTH};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const CELL_WIDTH: u16 = 2; // Each cell is 2 characters wide
const BOARD_AREA_WIDTH: u16 = BOARD_WIDTH as u16 * CELL_WIDTH + 2; // +2 for borders
const BOARD_AREA_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;
const INFO_WIDTH: u16 = 26;
const NEON_GREEN: Color = Color::Rgb(0x39, 0xff, 0x14);

pub const MIN_WIDTH: u16 = BOARD_AREA_WIDTH + INFO_WIDTH;
pub const MIN_HEIGHT: u16 = BOARD_AREA_HEIGHT + 2;

pub fn render(f: &mut Frame, app: &App) {
    let snapshot = app.snapshot();
    let display = Config::current().display;
    let audio = app.audio_state();
    let audio_line = format!(
        "Music: {}  Sound: {}  Vol: {:.0}%",
        on_off(audio.is_music_enabled()),
        on_off(audio.is_sound_enabled()),
        audio.get_volume() * 100.0
    );
    render_snapshot(f, &snapshot, &display, &audio_line);
}

/// Draws one frame from an engine snapshot.
pub fn render_snapshot(f: &mut Frame, snapshot: &Snapshot, display: &DisplayConfig, footer: &str) {
    let area = f.area();

    // Check if the terminal is too small to render the game properly
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let warning_text = Paragraph::new(
            "Terminal too small!\nPlease resize your terminal\nto continue playing.",
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Retro Blocks"));
        f.render_widget(warning_text, area);
        return;
    }

    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_AREA_WIDTH),
            Constraint::Min(INFO_WIDTH),
        ])
        .split(area);

    let board_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(BOARD_AREA_HEIGHT),
            Constraint::Min(0),
        ])
        .split(main_layout[0]);

    render_board(f, snapshot, display, board_layout[0]);
    render_banner(f, snapshot, board_layout[0]);

    let info_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(5), // Score
            Constraint::Length(6), // Next piece
            Constraint::Min(5),    // Controls
            Constraint::Length(1), // Audio status
        ])
        .split(main_layout[1]);

    let title = Paragraph::new("RETRO BLOCKS")
        .alignment(Alignment::Center)
        .style(Style::default().fg(NEON_GREEN).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, info_layout[0]);

    let stats = Paragraph::new(stats_lines(snapshot))
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: true });
    f.render_widget(stats, info_layout[1]);

    if display.show_preview {
        render_preview(f, snapshot.preview.as_ref(), info_layout[2]);
    }

    let controls = Paragraph::new(
        "Controls:\n\
        ←/→: Move left/right\n\
        ↓: Soft drop\n\
        ↑: Rotate\n\
        Space: Hard drop\n\
        S/Enter: Start  P: Pause\n\
        R: Reset  M: Music  N: Sound\n\
        +/-: Volume  Q: Quit",
    )
    .block(Block::default().borders(Borders::TOP))
    .wrap(Wrap { trim: true });
    f.render_widget(controls, info_layout[3]);

    f.render_widget(
        Paragraph::new(footer.to_string()).style(Style::default().fg(Color::DarkGray)),
        info_layout[4],
    );
}

#[must_use]
pub fn stats_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let state = match snapshot.run_state {
        RunState::NotStarted => "READY",
        RunState::Running => "RUNNING",
        RunState::Paused => "PAUSED",
        RunState::GameOver => "GAME OVER",
    };
    vec![
        Line::from(format!("Score: {}", snapshot.stats.score)),
        Line::from(format!("Level: {}", snapshot.stats.level)),
        Line::from(format!("Lines: {}", snapshot.stats.lines_cleared)),
        Line::from(Span::styled(
            state.to_string(),
            Style::default().fg(NEON_GREEN),
        )),
    ]
}

/// One line per board row with the active piece drawn over the settled blocks.
#[must_use]
pub fn board_lines(snapshot: &Snapshot, show_grid: bool) -> Vec<Line<'static>> {
    let mut cells: Vec<Vec<Cell>> = snapshot.board.rows().map(<[Cell]>::to_vec).collect();

    if let Some(active) = &snapshot.active {
        for (x, y) in active.cells() {
            if x >= 0 && y >= 0 {
                if let Some(cell) = cells
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    *cell = Some(active.tetromino_type);
                }
            }
        }
    }

    cells
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|cell| cell_span(cell, show_grid))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn cell_span(cell: Cell, show_grid: bool) -> Span<'static> {
    match cell {
        Some(tetromino_type) => {
            Span::styled("██", Style::default().fg(tetromino_type.color()))
        }
        None if show_grid => Span::styled(" ·", Style::default().fg(Color::Rgb(0x0b, 0x33, 0x04))),
        None => Span::raw("  "),
    }
}

fn render_board(f: &mut Frame, snapshot: &Snapshot, display: &DisplayConfig, area: Rect) {
    let board = Paragraph::new(board_lines(snapshot, display.show_grid))
        .style(Style::default().bg(Color::Black))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(NEON_GREEN)),
        );
    f.render_widget(board, area);
}

fn render_preview(f: &mut Frame, preview: Option<&Tetromino>, area: Rect) {
    let lines: Vec<Line> = preview
        .map(|piece| {
            piece
                .shape
                .rows()
                .map(|row| {
                    Line::from(
                        row.iter()
                            .map(|filled| {
                                let cell = filled.then_some(piece.tetromino_type);
                                cell_span(cell, false)
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let next = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Next"));
    f.render_widget(next, area);
}

/// Text shown over the board for every state except a running game.
#[must_use]
pub fn banner_text(snapshot: &Snapshot) -> Option<String> {
    match snapshot.run_state {
        RunState::Running => None,
        RunState::NotStarted => Some("PRESS S TO START".to_string()),
        RunState::Paused => Some("PAUSED\nP to resume".to_string()),
        RunState::GameOver => Some(format!(
            "GAME OVER\nScore: {}\nS to restart",
            snapshot.stats.score
        )),
    }
}

fn render_banner(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let Some(text) = banner_text(snapshot) else {
        return;
    };

    let banner_area = centered_rect(90, 25, area);
    let color = if snapshot.run_state == RunState::GameOver {
        Color::Red
    } else {
        NEON_GREEN
    };
    let banner = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(Clear, banner_area);
    f.render_widget(banner, banner_area);
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// Helper function to create a centered rect using up certain percentage of the available rect
#[must_use]
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
