//! TUI application loop — the main ratatui event loop for the interactive session.

use std::io;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use tokio::task::JoinHandle;

use citelens_core::{HealthStatus, QueryReply};

use super::*;

pub const WELCOME_NOTE: &str = "Ask a question about the data, press Enter.  /help for commands";

/// Transcript lines followed by the notice, if any.
pub fn session_lines(session: &ChatSession, view: &ViewState) -> RenderedTranscript {
    let mut rendered = session.render(view.show_tables);
    let theme = TuiTheme::default_dark();
    let notice = match &view.notice {
        Some(notice) => Some(notice.as_str()),
        None if session.transcript().is_empty() => Some(WELCOME_NOTE),
        None => None,
    };
    if let Some(notice) = notice {
        if !rendered.lines.is_empty() {
            rendered.lines.push(Line::default());
        }
        for text in notice.split('\n') {
            rendered.lines.push(Line::from(vec![
                Span::styled("  ⓘ ", Style::default().fg(theme.info)),
                Span::styled(text.to_string(), Style::default().fg(theme.info)),
            ]));
        }
    }
    rendered
}

fn describe_health(result: anyhow::Result<HealthStatus>) -> String {
    match result {
        Ok(health) => format!(
            "backend {} (version {})",
            health.status,
            health.version.as_deref().unwrap_or("unknown")
        ),
        Err(e) => format!("backend unreachable: {e:#}"),
    }
}

/// Apply a slash command. Returns true when the session should end.
fn apply_slash_command(
    command: Result<SlashCommand, String>,
    view: &mut ViewState,
    backend: &DynQueryBackend,
    health_handle: &mut Option<JoinHandle<anyhow::Result<HealthStatus>>>,
) -> bool {
    match command {
        Ok(SlashCommand::Help) => view.notice = Some(help_text()),
        Ok(SlashCommand::Sources) => {
            view.show_sources_panel = !view.show_sources_panel;
            view.notice = Some(format!(
                "sources panel {}",
                if view.show_sources_panel { "on" } else { "off" }
            ));
        }
        Ok(SlashCommand::Tables) => {
            view.show_tables = !view.show_tables;
            view.notice = Some(format!(
                "result tables {}",
                if view.show_tables { "on" } else { "off" }
            ));
        }
        Ok(SlashCommand::Health) => {
            view.notice = Some(format!("checking {}...", backend.endpoint()));
            let backend = backend.clone();
            *health_handle = Some(tokio::spawn(async move { backend.health().await }));
        }
        Ok(SlashCommand::Exit) => return true,
        Err(unknown) => view.notice = Some(format!("unknown command {unknown}, try /help")),
    }
    false
}

pub async fn run_tui(
    session: &mut ChatSession,
    backend: DynQueryBackend,
    view: &mut ViewState,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;
    terminal.clear()?;

    let theme = TuiTheme::default_dark();
    let endpoint = backend.endpoint();
    let mut input = String::new();
    let mut input_history = InputHistory::new(view.history_size);
    let mut processing_handle: Option<JoinHandle<anyhow::Result<QueryReply>>> = None;
    let mut health_handle: Option<JoinHandle<anyhow::Result<HealthStatus>>> = None;
    let mut session_view = TuiSessionViewState::default();
    let mut should_quit = false;

    tracing::info!(endpoint = %endpoint, "tui started");

    while !should_quit {
        let rendered = session_lines(session, view);
        let line_count = rendered.lines.len();
        let summaries = session.source_summaries();
        let marker_count = session.resolved_markers().len();

        terminal.draw(|f| {
            let constraints = tui_layout_constraints(input_line_count(&input));
            let areas = Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(f.area());

            // [0] Title bar
            f.render_widget(
                Paragraph::new(build_title_bar(&endpoint, session.is_pending(), &theme))
                    .style(Style::default().bg(Color::Rgb(30, 30, 30))),
                areas[0],
            );

            // [1] Conversation body (with optional sources sidebar)
            let (conv_area, sources_area) = tui_session_split(areas[1], view.show_sources_panel);
            let body_block = Block::default()
                .title(Span::styled(
                    " Conversation ",
                    Style::default().fg(theme.primary),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_normal));
            let inner = body_block.inner(conv_area);
            session_view.body_height = (inner.height as usize).max(1);
            let scroll = effective_log_scroll(line_count, &session_view);
            let body = Paragraph::new(Text::from(rendered.lines.clone()))
                .block(body_block)
                .wrap(Wrap { trim: false })
                .scroll((scroll.min(u16::MAX as usize) as u16, 0));
            f.render_widget(body, conv_area);
            if line_count > session_view.body_height {
                let mut scrollbar_state = ScrollbarState::new(line_count).position(scroll);
                let scrollbar = Scrollbar::default()
                    .orientation(ScrollbarOrientation::VerticalRight)
                    .thumb_style(Style::default().fg(theme.text_muted));
                f.render_stateful_widget(scrollbar, conv_area, &mut scrollbar_state);
            }
            if let Some(sidebar) = sources_area {
                render_sources_sidebar(f, sidebar, &summaries, view.sources_scroll_offset, &theme);
            }

            // [2] Hint bar
            f.render_widget(
                Paragraph::new(build_status_hint_bar(
                    &input,
                    marker_count,
                    session.selected_index(),
                    session.is_pending(),
                    &theme,
                ))
                .style(Style::default().bg(Color::Rgb(25, 25, 25))),
                areas[2],
            );

            // [3] Input area (multiline)
            let input_block = Block::default()
                .title(Span::styled(
                    if input.contains('\n') { " > (multiline) " } else { " > " },
                    Style::default()
                        .fg(theme.primary)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if session.is_pending() {
                    theme.border_dim
                } else {
                    theme.border_active
                }));
            let input_lines: Vec<Line<'_>> = input
                .split('\n')
                .map(|l| Line::from(l.to_string()))
                .collect();
            f.render_widget(
                Paragraph::new(Text::from(input_lines)).block(input_block),
                areas[3],
            );
            let last_line = input.rsplit('\n').next().unwrap_or(&input);
            let cursor_line_offset = input.chars().filter(|c| *c == '\n').count() as u16;
            let x = areas[3].x + 1 + last_line.chars().count() as u16;
            let y = areas[3].y + 1 + cursor_line_offset;
            f.set_cursor_position((x, y));

            if let Some(detail) = session.detail() {
                render_detail_popup(f, f.area(), detail, &theme);
            }
        })?;

        if processing_handle.as_ref().is_some_and(JoinHandle::is_finished)
            && let Some(handle) = processing_handle.take()
        {
            match handle.await {
                Ok(Ok(reply)) => session.on_reply(reply),
                Ok(Err(e)) => session.on_failure(&format!("{e:#}")),
                Err(e) => session.on_failure(&format!("request task failed: {e}")),
            }
            session_view.auto_follow = true;
        }

        if health_handle.as_ref().is_some_and(JoinHandle::is_finished)
            && let Some(handle) = health_handle.take()
        {
            view.notice = Some(match handle.await {
                Ok(result) => describe_health(result),
                Err(e) => format!("health check failed: {e}"),
            });
        }

        if !event::poll(Duration::from_millis(20))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let intent = classify_key(&key);

                if session.detail().is_some() {
                    match intent {
                        Some(KeyIntent::Quit) => should_quit = true,
                        Some(KeyIntent::Escape | KeyIntent::Enter) => {
                            session.dismiss();
                        }
                        _ => {}
                    }
                    continue;
                }

                if handle_session_scroll_key(&key, &mut session_view, line_count) {
                    continue;
                }
                if view.show_sources_panel
                    && handle_sources_scroll_key(
                        &key,
                        &mut view.sources_scroll_offset,
                        summaries.len(),
                    )
                {
                    continue;
                }

                match intent {
                    Some(KeyIntent::Quit) => {
                        if let Some(handle) = processing_handle.take() {
                            handle.abort();
                            session.on_failure("request cancelled");
                        } else {
                            should_quit = true;
                        }
                    }
                    Some(KeyIntent::Escape) => {
                        if session.selected_index().is_some() {
                            session.clear_selection();
                        } else {
                            should_quit = true;
                        }
                    }
                    Some(KeyIntent::NextMarker | KeyIntent::PrevMarker) => {
                        let marker = if intent == Some(KeyIntent::NextMarker) {
                            session.select_next()
                        } else {
                            session.select_prev()
                        };
                        if let Some(line) = marker.and_then(|m| rendered.line_of(m)) {
                            reveal_session_line(&mut session_view, line_count, line);
                        }
                    }
                    Some(KeyIntent::HistoryUp) => {
                        if let Some(prev) = input_history.up(&input) {
                            input = prev.to_string();
                        }
                    }
                    Some(KeyIntent::HistoryDown) => {
                        if let Some(next) = input_history.down() {
                            input = next.to_string();
                        }
                    }
                    Some(KeyIntent::Newline) => input.push('\n'),
                    Some(KeyIntent::Backspace) => {
                        input.pop();
                    }
                    Some(KeyIntent::Insert(ch)) => input.push(ch),
                    Some(KeyIntent::Enter) => {
                        let cmd = input.trim().to_string();
                        if cmd.is_empty() {
                            session.activate();
                            continue;
                        }
                        if let Some(command) = parse_slash_command(&cmd) {
                            input.clear();
                            input_history.push(cmd);
                            input_history.reset();
                            should_quit =
                                apply_slash_command(command, view, &backend, &mut health_handle);
                            continue;
                        }
                        let Some(request) = session.submit(&input) else {
                            continue;
                        };
                        input.clear();
                        input_history.push(cmd);
                        input_history.reset();
                        view.notice = None;
                        session_view.auto_follow = true;
                        let backend = backend.clone();
                        processing_handle =
                            Some(tokio::spawn(async move { backend.query(&request).await }));
                    }
                    None => {}
                }
            }
            Event::Mouse(mouse) => {
                let _ = handle_session_scroll_mouse(&mouse, &mut session_view, line_count);
            }
            _ => {}
        }
    }

    if let Some(handle) = processing_handle.take() {
        handle.abort();
    }
    tracing::info!(messages = session.transcript().len(), "tui stopped");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
