mod export;
mod help;
mod state;

use crate::config::Settings;
use crate::engine::{GeminiClient, Generator};
use crate::markup::{self, Markup};
use crate::model::{AppEvent, SurfaceKind, SurfaceState};
use crate::orchestrator::{self, UiCommand};
use crate::speech;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{AssistantSurface, Form, FormSurface, Speaker, Surface, UiState, HELP_TAB, TABS};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(settings: Settings) -> Result<()> {
    let generator: Arc<dyn Generator> = Arc::new(GeminiClient::new(&settings)?);

    // Unbounded channels keep the UI thread from ever waiting on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let model = settings.model.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(model, event_rx, cmd_tx));

    let res = orchestrator::run_controller(generator, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    model: String,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(model);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) == KeyOutcome::Quit {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(
    state: &mut UiState,
    k: KeyEvent,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> KeyOutcome {
    match (k.modifiers, k.code) {
        (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return KeyOutcome::Quit;
        }
        (_, KeyCode::F(1)) => state.tab = HELP_TAB,
        (_, KeyCode::Tab) => state.next_tab(true),
        (_, KeyCode::BackTab) => state.next_tab(false),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
            if let Some(surface) = state.active_mut() {
                surface.reset();
                state.info = "Pestaña reiniciada".into();
            }
        }
        (KeyModifiers::CONTROL, KeyCode::Char('e')) => export_active(state),
        (KeyModifiers::CONTROL, KeyCode::Char('y')) => copy_active(state),
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
            if state.active_kind() == Some(SurfaceKind::Chords) {
                state.show_speech = !state.show_speech;
                state.info = if state.show_speech {
                    "Lectura en voz visible".into()
                } else {
                    "Lectura en voz oculta".into()
                };
            }
        }
        (_, KeyCode::Enter) => submit_active(state, cmd_tx),
        (_, KeyCode::Up) => with_active(state, |s| s.move_focus(false)),
        (_, KeyCode::Down) => with_active(state, |s| s.move_focus(true)),
        (_, KeyCode::Left) => with_active(state, |s| s.cycle_focused(false)),
        (_, KeyCode::Right) => with_active(state, |s| s.cycle_focused(true)),
        (_, KeyCode::PageUp) => with_active(state, |s| s.scroll_by(-5)),
        (_, KeyCode::PageDown) => with_active(state, |s| s.scroll_by(5)),
        (_, KeyCode::Backspace) => with_active(state, |s| s.backspace()),
        (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            with_active(state, |s| s.type_char(c))
        }
        _ => {}
    }
    KeyOutcome::Continue
}

fn with_active(state: &mut UiState, f: impl FnOnce(&mut dyn Surface)) {
    if let Some(surface) = state.active_mut() {
        f(surface);
    }
}

fn submit_active(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    let Some(kind) = state.active_kind() else {
        return;
    };
    let surface = state.surface_mut(kind);
    let was_loading = surface.coordinator().state().is_loading();
    if surface.submit(cmd_tx).is_some() {
        return;
    }
    state.info = if kind == SurfaceKind::Assistant && was_loading {
        "Espera la respuesta anterior antes de enviar otra pregunta".into()
    } else {
        "Completa los campos antes de generar".into()
    };
}

fn export_active(state: &mut UiState) {
    let Some(kind) = state.active_kind() else {
        return;
    };
    if !matches!(
        state.surface(kind).coordinator().state(),
        SurfaceState::Success { .. }
    ) {
        state.info = "Nada que exportar todavía".into();
        return;
    }
    let with_speech = kind == SurfaceKind::Chords && state.show_speech;
    state.info = match export::export_surface_html(state.surface(kind), &state.model, with_speech)
    {
        Ok(p) => format!("Exported HTML: {}", p.display()),
        Err(e) => format!("Export HTML failed: {e:#}"),
    };
}

fn copy_active(state: &mut UiState) {
    let Some(kind) = state.active_kind() else {
        return;
    };
    state.info = match state.surface(kind).copy_text() {
        Some(text) => match export::copy_to_clipboard(&text) {
            Ok(_) => "✓ Copiado al portapapeles".into(),
            Err(e) => format!("Clipboard copy failed: {e:#}"),
        },
        None => "Nada que copiar todavía".into(),
    };
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let tabs = Tabs::new(TABS.iter().map(|t| Line::from(*t)).collect::<Vec<_>>())
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("asistente-musical"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.active_kind() {
        Some(SurfaceKind::Assistant) => draw_assistant(chunks[1], f, &state.assistant),
        Some(SurfaceKind::Chords) => {
            let spoken = if state.show_speech {
                speech::speech_text(state.chords.coordinator.state().text())
            } else {
                None
            };
            draw_form(chunks[1], f, &state.chords, spoken)
        }
        Some(SurfaceKind::Exercises) => draw_form(chunks[1], f, &state.exercises, None),
        Some(SurfaceKind::LearningPath) => draw_form(chunks[1], f, &state.path, None),
        Some(SurfaceKind::Library) => draw_form(chunks[1], f, &state.library, None),
        None => help::draw_help(chunks[1], f, &state.model),
    }

    let info = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{} ", state.model),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(state.info.clone()),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Estado"));
    f.render_widget(info, chunks[2]);
}

fn status_line(state: &SurfaceState, complete: bool) -> Line<'static> {
    match state {
        SurfaceState::Idle if complete => Line::from(Span::styled(
            "Pulsa Enter para generar",
            Style::default().fg(Color::Gray),
        )),
        SurfaceState::Idle => Line::from(Span::styled(
            "Completa los campos para generar",
            Style::default().fg(Color::Gray),
        )),
        SurfaceState::Loading => Line::from(Span::styled(
            "Generando…",
            Style::default().fg(Color::Yellow),
        )),
        SurfaceState::Success { .. } => Line::from(Span::styled(
            "Listo",
            Style::default().fg(Color::Green),
        )),
        SurfaceState::Error { message } => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )),
    }
}

fn draw_form<F: Form + 'static>(
    area: Rect,
    f: &mut ratatui::Frame,
    surface: &FormSurface<F>,
    spoken: Option<String>,
) {
    let fields = surface.inputs.fields();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(fields.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let field_lines: Vec<Line> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == surface.focus;
            let marker = if focused { "▸ " } else { "  " };
            let value = match (field.editable, focused) {
                (true, true) => format!("{}_", field.value),
                (true, false) => field.value.clone(),
                (false, _) => format!("‹ {} ›", field.value),
            };
            let value_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<12}", field.label), Style::default().fg(Color::Gray)),
                Span::styled(value, value_style),
            ])
        })
        .collect();
    let form = Paragraph::new(field_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(surface.inputs.surface().title()),
    );
    f.render_widget(form, rows[0]);

    let state = surface.coordinator.state();
    let status = Paragraph::new(status_line(state, surface.inputs.is_complete()))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, rows[1]);

    let mut lines = result_lines(surface.inputs.markup(), state.text());
    if let Some(spoken) = spoken {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Lectura: ", Style::default().fg(Color::Magenta)),
            Span::raw(spoken),
        ]));
    }
    let result = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((surface.scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(surface.inputs.print_title()),
        );
    f.render_widget(result, rows[2]);
}

fn draw_assistant(area: Rect, f: &mut ratatui::Frame, surface: &AssistantSurface) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for msg in &surface.transcript {
        let (who, color) = match msg.speaker {
            Speaker::User => ("Tú", Color::Green),
            Speaker::Assistant => ("Asistente", Color::Cyan),
        };
        lines.push(Line::from(Span::styled(
            format!("{who}:"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(result_lines(Markup::EmphasisAndLineBreaks, &msg.text));
        lines.push(Line::from(""));
    }
    if surface.coordinator.state().is_loading() {
        lines.push(Line::from(Span::styled(
            "Asistente está escribiendo…",
            Style::default().fg(Color::Gray),
        )));
    }
    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((surface.scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Conversación"));
    f.render_widget(transcript, rows[0]);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(surface.input.clone()),
        Span::styled("_", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pregunta (Enter para enviar)"),
    );
    f.render_widget(input, rows[1]);
}

/// Render generated text line by line with bold runs as styled spans.
fn result_lines(markup: Markup, text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            if markup == Markup::Preformatted {
                return Line::from(line.to_string());
            }
            let base = if markup == Markup::EmphasisAndWeeks && is_week_heading(line) {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let spans: Vec<Span<'static>> = markup::emphasis_segments(line)
                .into_iter()
                .map(|seg| {
                    let style = if seg.strong {
                        base.add_modifier(Modifier::BOLD)
                    } else {
                        base
                    };
                    Span::styled(seg.text.to_string(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn is_week_heading(line: &str) -> bool {
    let rest = line.trim_start().trim_start_matches("**");
    rest.strip_prefix("Semana ")
        .and_then(|r| r.split_once(':'))
        .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
