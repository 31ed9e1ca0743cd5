//! Terminal driver: owns the terminal, the mailbox, and effect execution.
//!
//! The loop alternates between draining queued messages, drawing, and
//! polling the terminal for input. Effects returned by `update` are run
//! here; anything that could block is spawned onto a background task that
//! reports back through the mailbox, so the loop itself never waits on
//! the daemon.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use unicode_width::UnicodeWidthStr;

use crate::client::{ChatEvent, DaemonClient, HealthStatus};
use crate::config::{Config, Settings};
use crate::connection::Transport;
use crate::core::effect::Effect;
use crate::core::msg::{Msg, Timer};
use crate::facts::{self, FactPoll, FactSubscription};
use crate::palette::{self, UiTheme};
use crate::tui::mode::Mode;
use crate::tui::shell::{Flash, FlashLevel, Shell};

/// Terminal poll cadence while idle.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Bring up the terminal, run the shell until it quits, restore the
/// terminal. The restore runs even when the loop errors.
pub async fn run_tui(
    config: Config,
    settings: Settings,
    transport: Transport,
    alt_screen: bool,
) -> Result<()> {
    let client = DaemonClient::new(transport.clone());
    let (shell, startup) = Shell::new(config, &settings, transport.to_string());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if alt_screen {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, shell, startup, client, settings).await;

    disable_raw_mode()?;
    if alt_screen {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut shell: Shell,
    startup: Vec<Effect>,
    client: DaemonClient,
    settings: Settings,
) -> Result<()> {
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let mut driver = Driver {
        client,
        msg_tx,
        cancel: cancel.clone(),
        chat_cancel: None,
        facts: None,
        settings,
    };

    let mut quit = driver.run_effects(startup);

    while !quit {
        // Absorb everything the background tasks queued since last pass.
        while let Ok(msg) = msg_rx.try_recv() {
            let effects = shell.update(msg);
            if driver.run_effects(effects) {
                quit = true;
                break;
            }
        }
        if quit {
            break;
        }

        terminal.draw(|frame| render(frame, &shell))?;

        if event::poll(INPUT_POLL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let effects = shell.update(Msg::Key(key));
                    quit = driver.run_effects(effects);
                }
                Event::Resize(width, height) => {
                    let effects = shell.update(Msg::Resize { width, height });
                    quit = driver.run_effects(effects);
                }
                _ => {}
            }
        }
    }

    cancel.cancel();
    if let Some(subscription) = driver.facts.take() {
        subscription.shutdown().await;
    }
    Ok(())
}

// === Effect interpreter ===

struct Driver {
    client: DaemonClient,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
    chat_cancel: Option<CancellationToken>,
    facts: Option<FactSubscription>,
    settings: Settings,
}

impl Driver {
    fn run_effects(&mut self, effects: Vec<Effect>) -> bool {
        let mut quit = false;
        for effect in effects {
            quit |= self.run_effect(effect);
        }
        quit
    }

    /// Run one effect. Returns true for the quit effect.
    fn run_effect(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::Quit => return true,
            Effect::Probe => {
                let client = self.client.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let status = client.health().await;
                    let _ = tx.send(Msg::ProbeResult(status));
                });
            }
            Effect::Schedule { delay, timer } => {
                let tx = self.msg_tx.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        () = tokio::time::sleep(delay) => {
                            let msg = match timer {
                                // The re-poll timer fires as its own message.
                                Timer::FactPoll => Msg::FactStreamContinue,
                                other => Msg::Timer(other),
                            };
                            let _ = tx.send(msg);
                        }
                    }
                });
            }
            Effect::SubscribeFacts => {
                if self.facts.is_none() {
                    self.facts = Some(facts::subscribe(
                        self.client.clone(),
                        self.cancel.child_token(),
                    ));
                }
            }
            Effect::PollFacts => {
                if let Some(subscription) = &mut self.facts {
                    match subscription.poll() {
                        FactPoll::Fact(fact) => {
                            let _ = self.msg_tx.send(Msg::FactReceived(fact));
                        }
                        FactPoll::Empty => {
                            self.run_effect(Effect::fact_poll_delay());
                        }
                        FactPoll::Disconnected => {
                            let _ = self.msg_tx.send(Msg::FactStreamDisconnected);
                        }
                    }
                }
            }
            Effect::SendChat(request) => {
                let client = self.client.clone();
                let tx = self.msg_tx.clone();
                let chat_cancel = self.cancel.child_token();
                self.chat_cancel = Some(chat_cancel.clone());
                tokio::spawn(async move {
                    match client.chat_stream(&request).await {
                        Ok(mut stream) => loop {
                            tokio::select! {
                                () = chat_cancel.cancelled() => break,
                                event = stream.next() => {
                                    let Some(event) = event else {
                                        let _ = tx.send(Msg::Chat(ChatEvent::Done));
                                        break;
                                    };
                                    let last = matches!(
                                        event,
                                        ChatEvent::Done | ChatEvent::Failed { .. }
                                    );
                                    if tx.send(Msg::Chat(event)).is_err() || last {
                                        break;
                                    }
                                }
                            }
                        },
                        Err(e) => {
                            tracing::error!("chat request failed: {}", e);
                            let _ = tx.send(Msg::Chat(ChatEvent::Failed {
                                message: e.to_string(),
                            }));
                        }
                    }
                });
            }
            Effect::CancelChat => {
                if let Some(token) = self.chat_cancel.take() {
                    token.cancel();
                }
            }
            Effect::LoadConversations => {
                let client = self.client.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = client.conversations().await.map_err(|e| e.to_string());
                    let _ = tx.send(Msg::ConversationsLoaded(result));
                });
            }
            Effect::RequestPairing => {
                let client = self.client.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = client.pairing_code().await.map_err(|e| e.to_string());
                    let _ = tx.send(Msg::PairingReady(result));
                });
            }
            Effect::LoadFile { path } => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = match tokio::fs::read_to_string(&path).await {
                        Ok(contents) => Ok(contents),
                        // A missing file opens as an empty buffer.
                        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(Msg::FileLoaded { path, result });
                });
            }
            Effect::SaveFile { path, contents } => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = write_file(&path, &contents).await.map_err(|e| e.to_string());
                    let _ = tx.send(Msg::FileSaved { path, result });
                });
            }
            Effect::PersistActivePanel(index) => {
                self.settings.set_active_studio(index);
                if let Err(e) = self.settings.save() {
                    tracing::error!("failed to save settings: {}", e);
                }
            }
            Effect::PersistTheme(name) => {
                let saved = self
                    .settings
                    .set_theme(&name)
                    .and_then(|()| self.settings.save());
                if let Err(e) = saved {
                    tracing::error!("failed to save settings: {}", e);
                }
            }
            Effect::Emit(msg) => {
                let _ = self.msg_tx.send(msg);
            }
        }
        false
    }
}

async fn write_file(path: &std::path::Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents.as_bytes()).await
}

// === Rendering ===

fn render(frame: &mut Frame, shell: &Shell) {
    let theme = shell.ui_theme();
    let area = frame.area();
    if shell.is_home_visible() {
        render_home(frame, area, shell, &theme);
        return;
    }

    let mode = shell.mode();
    let mut constraints = vec![Constraint::Length(1), Constraint::Min(1)];
    if let Some(flash) = shell.current_flash() {
        constraints.push(Constraint::Length(flash_height(flash)));
    }
    if mode.shows_composer() {
        constraints.push(Constraint::Length(3));
    }
    if mode.shows_command_line() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut slot = 0;
    render_tabs(frame, rows[slot], shell, &theme);
    slot += 1;
    shell
        .router()
        .active_panel()
        .render(rows[slot], frame.buffer_mut(), &theme);
    slot += 1;
    if let Some(flash) = shell.current_flash() {
        render_flash(frame, rows[slot], flash, &theme);
        slot += 1;
    }
    if mode.shows_composer() {
        render_composer(frame, rows[slot], shell, &theme);
        slot += 1;
    }
    if mode.shows_command_line() {
        render_command_line(frame, rows[slot], shell, &theme);
        slot += 1;
    }
    render_status(frame, rows[slot], shell, &theme);

    // Overlays draw last, centered over everything.
    shell.overlay().render(area, frame.buffer_mut(), &theme);
}

fn flash_height(flash: &Flash) -> u16 {
    let rows = flash.text.lines().count().clamp(1, 10);
    rows as u16
}

fn render_home(frame: &mut Frame, area: Rect, shell: &Shell, theme: &UiTheme) {
    frame.render_widget(
        Block::default().style(Style::default().bg(palette::HECATE_NIGHT)),
        area,
    );
    let bands = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Min(10),
            Constraint::Percentage(30),
        ])
        .split(area);
    let lines = vec![
        Line::styled("H E C A T E", Style::default().fg(theme.accent).bold()),
        Line::styled(
            "a torch for the daemon at the crossroads",
            Style::default().fg(palette::TEXT_MUTED).italic(),
        ),
        Line::styled(
            format!("v{}  ·  {}", env!("CARGO_PKG_VERSION"), shell.transport()),
            Style::default().fg(palette::TEXT_DIM),
        ),
        Line::from(""),
        Line::from("i      compose a prompt"),
        Line::from("/      run a command (try /help)"),
        Line::from("1-5    switch studios"),
        Line::from("q      quit"),
        Line::from(""),
        Line::styled("press any key", Style::default().fg(palette::TEXT_DIM)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), bands[1]);
}

fn render_tabs(frame: &mut Frame, area: Rect, shell: &Shell, theme: &UiTheme) {
    let mut spans = Vec::new();
    for (index, name) in shell.router().names().into_iter().enumerate() {
        let label = format!(" {} {name} ", index + 1);
        let style = if index == shell.router().active() {
            Style::default()
                .fg(palette::HECATE_NIGHT)
                .bg(theme.accent)
                .bold()
        } else {
            Style::default().fg(palette::TEXT_DIM)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.header_bg)),
        area,
    );
}

fn render_flash(frame: &mut Frame, area: Rect, flash: &Flash, theme: &UiTheme) {
    let color = match flash.level {
        FlashLevel::Info => palette::TEXT_PRIMARY,
        FlashLevel::Warn => palette::STATUS_DEGRADED,
        FlashLevel::Error => palette::STATUS_ERROR,
    };
    frame.render_widget(
        Paragraph::new(flash.text.as_str()).style(Style::default().fg(color).bg(theme.header_bg)),
        area,
    );
}

fn render_composer(frame: &mut Frame, area: Rect, shell: &Shell, theme: &UiTheme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette::BORDER_COLOR))
        .title(Span::styled(" prompt ", Style::default().fg(theme.accent)));
    let inner = block.inner(area);
    frame.render_widget(
        Paragraph::new(shell.composer())
            .block(block)
            .style(Style::default().bg(theme.composer_bg)),
        area,
    );
    let cursor_x = shell.composer().width() as u16;
    frame.set_cursor_position((
        inner.x + cursor_x.min(inner.width.saturating_sub(1)),
        inner.y,
    ));
}

fn render_command_line(frame: &mut Frame, area: Rect, shell: &Shell, theme: &UiTheme) {
    let line = Line::from(vec![
        Span::styled(
            shell.mode_prompt().to_string(),
            Style::default().fg(theme.accent).bold(),
        ),
        Span::raw(shell.command_line().to_string()),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.composer_bg)),
        area,
    );
    let cursor_x = 1 + shell.command_line().width() as u16;
    frame.set_cursor_position((area.x + cursor_x.min(area.width.saturating_sub(1)), area.y));
}

fn render_status(frame: &mut Frame, area: Rect, shell: &Shell, theme: &UiTheme) {
    let mode = shell.mode();
    let mode_color = match mode {
        Mode::Normal => palette::MODE_NORMAL,
        Mode::Insert => palette::MODE_INSERT,
        Mode::Command => palette::MODE_COMMAND,
        Mode::Browse | Mode::Pair | Mode::Edit | Mode::Form => palette::MODE_OVERLAY,
    };
    let health = shell.daemon_health();
    let health_color = match health {
        HealthStatus::Healthy => palette::STATUS_HEALTHY,
        HealthStatus::Degraded => palette::STATUS_DEGRADED,
        HealthStatus::Error => palette::STATUS_ERROR,
        HealthStatus::Unknown => palette::TEXT_MUTED,
    };

    let status = shell.router().active_panel().status();
    let right_width = (status.width() as u16).saturating_add(1);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);

    let left = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(palette::HECATE_NIGHT)
                .bg(mode_color)
                .bold(),
        ),
        Span::styled(
            format!(" ● {}", health.label()),
            Style::default().fg(health_color),
        ),
        Span::styled(
            format!("  {}", shell.model_name()),
            Style::default().fg(palette::TEXT_PRIMARY),
        ),
        Span::styled(
            format!("  {}", shell.transport()),
            Style::default().fg(palette::TEXT_MUTED),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(left).style(Style::default().bg(theme.header_bg)),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(Line::styled(status, Style::default().fg(palette::TEXT_DIM)))
            .alignment(Alignment::Right)
            .style(Style::default().bg(theme.header_bg)),
        columns[1],
    );
}
