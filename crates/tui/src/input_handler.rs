//! Input Handler — key intents, input history, slash commands, scrolling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use super::{TUI_SCROLL_STEP, TuiSessionViewState, calc_log_scroll_usize, effective_log_scroll};

#[derive(Debug, Clone)]
pub struct InputHistory {
    pub entries: Vec<String>,
    pub cursor: Option<usize>,
    pub draft: String,
    pub max_entries: usize,
}

impl InputHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            draft: String::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn push(&mut self, entry: String) {
        if entry.trim().is_empty() {
            return;
        }
        self.entries.retain(|e| e != &entry);
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.cursor = None;
    }

    pub fn up(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        match self.cursor {
            None => {
                self.draft = current_input.to_string();
                self.cursor = Some(self.entries.len() - 1);
            }
            Some(0) => return Some(&self.entries[0]),
            Some(i) => {
                self.cursor = Some(i - 1);
            }
        }
        self.cursor.map(|i| self.entries[i].as_str())
    }

    pub fn down(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(i) if i + 1 >= self.entries.len() => {
                self.cursor = None;
                Some(self.draft.as_str())
            }
            Some(i) => {
                self.cursor = Some(i + 1);
                Some(self.entries[i + 1].as_str())
            }
        }
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.draft.clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlashCommandSpec {
    pub command: &'static str,
    pub summary: &'static str,
}

pub const SLASH_COMMAND_SPECS: &[SlashCommandSpec] = &[
    SlashCommandSpec {
        command: "/help",
        summary: "show help",
    },
    SlashCommandSpec {
        command: "/sources",
        summary: "toggle sources panel",
    },
    SlashCommandSpec {
        command: "/tables",
        summary: "toggle result tables",
    },
    SlashCommandSpec {
        command: "/health",
        summary: "check backend health",
    },
    SlashCommandSpec {
        command: "/exit",
        summary: "exit",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Sources,
    Tables,
    Health,
    Exit,
}

/// Parse a slash command line; `Err` carries the unknown command text.
pub fn parse_slash_command(input: &str) -> Option<Result<SlashCommand, String>> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    Some(match command.as_str() {
        "/help" | "/h" => Ok(SlashCommand::Help),
        "/sources" => Ok(SlashCommand::Sources),
        "/tables" => Ok(SlashCommand::Tables),
        "/health" => Ok(SlashCommand::Health),
        "/exit" | "/quit" | "/q" => Ok(SlashCommand::Exit),
        _ => Err(command),
    })
}

pub fn matching_slash_commands(prefix: &str) -> Vec<SlashCommandSpec> {
    let prefix = prefix.to_ascii_lowercase();
    SLASH_COMMAND_SPECS
        .iter()
        .filter(|spec| spec.command.starts_with(&prefix))
        .copied()
        .collect()
}

pub fn help_text() -> String {
    let mut lines = vec![
        "Tab/Shift+Tab select citation  Enter open  Esc close".to_string(),
        "PgUp/PgDn scroll  ↑↓ history  Shift+Enter newline".to_string(),
        "Alt+↑/Alt+↓ scroll sources panel".to_string(),
    ];
    lines.extend(
        SLASH_COMMAND_SPECS
            .iter()
            .map(|spec| format!("{:<10}{}", spec.command, spec.summary)),
    );
    lines.join("\n")
}

pub fn key_is_ctrl_char(key: &KeyEvent, ch: char) -> bool {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => c.eq_ignore_ascii_case(&ch),
        _ => false,
    }
}

/// What a key press asks for, before session state is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIntent {
    Quit,
    Escape,
    Enter,
    Newline,
    NextMarker,
    PrevMarker,
    HistoryUp,
    HistoryDown,
    Backspace,
    Insert(char),
}

pub fn classify_key(key: &KeyEvent) -> Option<KeyIntent> {
    if key_is_ctrl_char(key, 'c') || key_is_ctrl_char(key, 'd') {
        return Some(KeyIntent::Quit);
    }
    match key.code {
        KeyCode::Esc => Some(KeyIntent::Escape),
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => Some(KeyIntent::Newline),
        KeyCode::Enter => Some(KeyIntent::Enter),
        KeyCode::Tab => Some(KeyIntent::NextMarker),
        KeyCode::BackTab => Some(KeyIntent::PrevMarker),
        KeyCode::Up if key.modifiers.is_empty() => Some(KeyIntent::HistoryUp),
        KeyCode::Down if key.modifiers.is_empty() => Some(KeyIntent::HistoryDown),
        KeyCode::Backspace => Some(KeyIntent::Backspace),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyIntent::Insert(c))
        }
        _ => None,
    }
}

pub fn move_session_scroll(session_view: &mut TuiSessionViewState, log_count: usize, delta: isize) {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    let current = effective_log_scroll(log_count, session_view) as isize;
    let next = (current + delta).clamp(0, max_scroll as isize) as usize;
    session_view.scroll_offset = next;
    session_view.auto_follow = next >= max_scroll;
}

/// Scroll just enough to bring `line` into view.
pub fn reveal_session_line(session_view: &mut TuiSessionViewState, log_count: usize, line: usize) {
    let top = effective_log_scroll(log_count, session_view);
    let height = session_view.body_height.max(1);
    if line < top {
        move_session_scroll(session_view, log_count, line as isize - top as isize);
    } else if line >= top + height {
        move_session_scroll(
            session_view,
            log_count,
            (line + 1 - height) as isize - top as isize,
        );
    }
}

pub fn handle_session_scroll_key(
    key: &KeyEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    let page = (session_view.body_height / 2).max(1) as isize;
    match key.code {
        KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, -1);
            true
        }
        KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, 1);
            true
        }
        KeyCode::PageUp => {
            move_session_scroll(session_view, log_count, -page);
            true
        }
        KeyCode::PageDown => {
            move_session_scroll(session_view, log_count, page);
            true
        }
        KeyCode::Home => {
            session_view.scroll_offset = 0;
            session_view.auto_follow = false;
            true
        }
        KeyCode::End => {
            session_view.scroll_offset = calc_log_scroll_usize(log_count, session_view.body_height);
            session_view.auto_follow = true;
            true
        }
        _ => false,
    }
}

/// Alt+↑/↓ step the sources sidebar one entry. The offset never passes
/// the last entry.
pub fn handle_sources_scroll_key(key: &KeyEvent, offset: &mut usize, entry_count: usize) -> bool {
    if !key.modifiers.contains(KeyModifiers::ALT) {
        return false;
    }
    let last = entry_count.saturating_sub(1);
    match key.code {
        KeyCode::Up => {
            *offset = offset.saturating_sub(1).min(last);
            true
        }
        KeyCode::Down => {
            *offset = (*offset + 1).min(last);
            true
        }
        _ => false,
    }
}

pub fn handle_session_scroll_mouse(
    mouse: &MouseEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            move_session_scroll(session_view, log_count, -(TUI_SCROLL_STEP as isize));
            true
        }
        MouseEventKind::ScrollDown => {
            move_session_scroll(session_view, log_count, TUI_SCROLL_STEP as isize);
            true
        }
        _ => false,
    }
}
