#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error, info};
use ratatui::{Terminal, prelude::*};
use retroblocks::app::App;
use retroblocks::config::{Config, loader};
use retroblocks::engine::Intent;
use retroblocks::systems::AudioAction;
use retroblocks::ui;

/// What a key press asks for.
enum Command {
    Game(Intent),
    Audio(AudioAction),
    Quit,
}

fn main() -> Result<()> {
    // Create log file and redirect stderr to it
    let log_path = "retroblocks.log";
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .with_context(|| format!("Failed to create log file {log_path}"))?;

    // Safety: We're redirecting stderr to our log file using standard POSIX operations
    unsafe {
        libc::dup2(log_file.as_raw_fd(), io::stderr().as_raw_fd());
    }

    // Configure the logger to use stderr (which is now redirected to our file)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    info!("Starting Retro Blocks");

    let config = Config::init();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // ~30 FPS rendering, game logic stepped a little faster than that
    let tick_rate = Duration::from_millis(33);
    let game_tick_rate = Duration::from_millis(16);

    let app = App::new(&config);
    let res = run_app(&mut terminal, app, tick_rate, game_tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match res {
        Ok(app) => {
            if let Err(e) = loader::save_config_to_file(&app.settings()) {
                error!("Failed to save configuration: {e}");
            }
        }
        Err(err) => error!("Game error: {err:?}"),
    }

    info!("Bye");
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
    game_tick_rate: Duration,
) -> Result<App> {
    let mut last_render = Instant::now();
    let mut last_game_tick = Instant::now();

    // Flag to track if we've already warned about audio device issues
    let mut audio_error_logged = false;

    // Explicitly flush any pending input events that might be in the buffer
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        // Draw the UI
        if last_render.elapsed() >= tick_rate {
            terminal.draw(|f| ui::render(f, &app))?;
            last_render = Instant::now();
        }

        if last_game_tick.elapsed() >= game_tick_rate {
            last_game_tick = Instant::now();
            app.on_tick();

            if !audio_error_logged && !app.audio_state().is_audio_available() {
                error!("Audio device is unavailable. Continuing without sound.");
                audio_error_logged = true;
            }

            Config::check_and_reload();
        }

        if app.should_quit {
            return Ok(app);
        }

        // Process keyboard input
        if event::poll(Duration::from_millis(5))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                debug!("Key event: {key:?}");

                match map_key(key) {
                    Some(Command::Game(intent)) => app.push_intent(intent),
                    Some(Command::Audio(action)) => app.audio(action),
                    Some(Command::Quit) => app.should_quit = true,
                    None => {}
                }
            }
        }
    }
}

fn map_key(key: KeyEvent) -> Option<Command> {
    let command = match key.code {
        KeyCode::Left | KeyCode::Char('a') => Command::Game(Intent::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') => Command::Game(Intent::MoveRight),
        KeyCode::Down => Command::Game(Intent::SoftDrop),
        KeyCode::Up | KeyCode::Char('w') => Command::Game(Intent::Rotate),
        KeyCode::Char(' ') => Command::Game(Intent::HardDrop),
        KeyCode::Enter | KeyCode::Char('s') => Command::Game(Intent::Start),
        KeyCode::Char('p') => Command::Game(Intent::PauseToggle),
        KeyCode::Char('r') => Command::Game(Intent::Reset),
        KeyCode::Char('m') => Command::Audio(AudioAction::ToggleMusic),
        KeyCode::Char('n') => Command::Audio(AudioAction::ToggleSound),
        KeyCode::Char('+' | '=') => Command::Audio(AudioAction::VolumeUp),
        KeyCode::Char('-' | '_') => Command::Audio(AudioAction::VolumeDown),
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(command)
}
