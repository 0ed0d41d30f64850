use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use courtside::catalog::{self, build_catalog};
use courtside::commands::{CommandContext, help_text};
use courtside::config::{BotConfig, ProviderKind};
use courtside::dispatcher::{ChannelEvent, Dispatcher};
use courtside::log_pane;
use courtside::state::{AppState, apply_event};
use courtside::stats_fetch::provider_from_config;

struct App {
    state: AppState,
    dispatcher: Dispatcher,
    banner: String,
    should_quit: bool,
}

impl App {
    fn new(dispatcher: Dispatcher, banner: String) -> Self {
        Self {
            state: AppState::new(),
            dispatcher,
            banner,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('l') if ctrl => self.state.messages.clear(),
            KeyCode::F(1) => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Up => self.state.scroll_up(1),
            KeyCode::Down => self.state.scroll_down(1),
            KeyCode::PageUp => self.state.scroll_up(10),
            KeyCode::PageDown => self.state.scroll_down(10),
            KeyCode::Char(c) if !ctrl => self.state.input.push(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(line) = self.state.take_input() else {
            return;
        };
        match self.dispatcher.submit(&line) {
            Some(id) => self.state.mark_submitted(id, &line),
            None => self.state.push_log(format!(
                "[INFO] not a command; start with {}",
                self.dispatcher.prefix()
            )),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let (log_tx, log_rx) = mpsc::channel();
    log_pane::init_pane_logging(log_tx)?;

    let config = BotConfig::from_env();
    let provider = provider_from_config(&config).context("stats provider setup failed")?;
    let catalog = catalog::install(build_catalog(config.catalog_source, provider.as_ref()));
    let banner = format!(
        "COURTSIDE | {} | {} players, {} teams | prefix {}",
        match config.provider {
            ProviderKind::Nba => "NBA LIVE",
            ProviderKind::Demo => "DEMO DATA",
        },
        catalog.players().len(),
        catalog.teams().len(),
        config.prefix
    );

    let (tx, rx) = mpsc::channel();
    let ctx = CommandContext::new(&config, catalog, provider);
    let dispatcher = Dispatcher::new(ctx, config.workers, tx);
    tracing::info!(workers = config.workers, "dispatcher ready");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(dispatcher, banner);
    let res = run_app(&mut terminal, &mut app, rx, log_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<ChannelEvent>,
    log_rx: mpsc::Receiver<String>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(event) = rx.try_recv() {
            apply_event(&mut app.state, event);
        }
        while let Ok(line) = log_rx.try_recv() {
            app.state.push_log(line);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.banner))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_chat(frame, chunks[1], app);

    let input = Paragraph::new(app.state.input.as_str())
        .block(Block::default().title("Message").borders(Borders::ALL));
    frame.render_widget(input, chunks[2]);
    let cursor_x = chunks[2].x + 1 + app.state.input.chars().count() as u16;
    frame.set_cursor(
        cursor_x.min(chunks[2].right().saturating_sub(2)),
        chunks[2].y + 1,
    );

    let console = Paragraph::new(console_text(&app.state, chunks[3].height))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size(), app.dispatcher.prefix());
    }
}

fn header_text(banner: &str) -> String {
    let line1 = format!("  (O)  {banner}");
    let line2 = " ~|~|~".to_string();
    format!("{line1}\n{line2}")
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let lines = app.state.transcript_lines();
    let height = area.height.saturating_sub(2) as usize;
    let text = if lines.is_empty() {
        format!("Type {}help to get started", app.dispatcher.prefix())
    } else {
        let (start, end) = app.state.visible_window(lines.len(), height);
        lines[start..end].join("\n")
    };
    let chat = Paragraph::new(text).block(Block::default().title("Channel").borders(Borders::ALL));
    frame.render_widget(chat, area);
}

fn console_text(state: &AppState, height: u16) -> String {
    if state.logs.is_empty() {
        return "No log lines yet".to_string();
    }
    let take = height.saturating_sub(2).max(1) as usize;
    let skip = state.logs.len().saturating_sub(take);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(state: &AppState) -> String {
    let running = if state.pending.is_empty() {
        "idle".to_string()
    } else {
        format!("{} running", state.pending.len())
    };
    format!(
        "Enter Send | ↑/↓ PgUp/PgDn Scroll | Ctrl-L Clear | F1 Help | Esc Quit | {running} | {} replies, {} images",
        state.replies, state.attachments
    )
}

fn render_help_overlay(frame: &mut Frame, area: Rect, prefix: &str) {
    let popup_area = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Courtside - Help".to_string(),
        String::new(),
        "Commands:".to_string(),
        help_text(prefix),
        String::new(),
        "Keys:".to_string(),
        "  Enter        Send message".to_string(),
        "  ↑/↓ PgUp/Dn  Scroll channel".to_string(),
        "  Ctrl-L       Clear channel".to_string(),
        "  F1           Toggle help".to_string(),
        "  Esc          Quit".to_string(),
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
