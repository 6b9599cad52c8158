//! Terminal preview of the navigation shell.
//!
//! Mouse motion drives hover intent, clicks and keys go through the same
//! [`NavShell`] entry points a browser host would use, and the shell clock
//! follows wall time.

// Allow intentional type casts for terminal coordinates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

pub mod menubar;
pub mod theme;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use crate::dom::NodeId;
use crate::hover::{Modifiers, NavKey};
use crate::menu::LinkTarget;
use crate::shell::{Effect, NavShell};

pub use menubar::HitMap;
pub use theme::Theme;

/// Longest wait between two frames.
const FRAME_TIMEOUT: Duration = Duration::from_millis(100);

/// How often switch state written by other sessions is picked up.
const SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Approximate pixels per terminal column, for the search placeholder.
const COLUMN_PX: f64 = 8.0;

/// Everything the event loop owns.
#[derive(Debug)]
pub struct TuiState {
    /// The shell being previewed.
    pub shell: NavShell,
    /// Current palette.
    pub theme: Theme,
    /// Message shown in the status bar.
    pub status_message: String,
    /// Error shown in the status bar instead of the message.
    pub error_message: Option<String>,
    /// Where nodes were painted last frame.
    pub hits: HitMap,
    /// Set to leave the loop.
    pub should_quit: bool,
    started: Instant,
    last_sync: Duration,
}

impl TuiState {
    /// Wraps a mounted shell.
    #[must_use]
    pub fn new(shell: NavShell) -> Self {
        let theme = Theme::for_page(shell.theme());
        Self {
            shell,
            theme,
            status_message: "Hover a menu, or press Tab".to_string(),
            error_message: None,
            hits: HitMap::default(),
            should_quit: false,
            started: Instant::now(),
            last_sync: Duration::ZERO,
        }
    }

    /// Sets the status message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.error_message = None;
    }

    /// Sets the error message.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error_message = Some(error.into());
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Advances the shell clock to wall time and runs due timers.
    pub fn tick(&mut self) {
        let now = self.elapsed();
        self.shell.advance(now);
        if now.saturating_sub(self.last_sync) >= SYNC_INTERVAL {
            self.last_sync = now;
            let applied = self.shell.sync_external();
            if applied > 0 {
                self.set_status(format!("Picked up {applied} switch change(s)"));
            }
        }
        self.theme = Theme::for_page(self.shell.theme());
    }

    /// Time until the next frame must be drawn.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.shell
            .next_deadline()
            .map_or(FRAME_TIMEOUT, |deadline| {
                deadline.saturating_sub(self.elapsed()).min(FRAME_TIMEOUT)
            })
    }

    /// Reports an effect the terminal cannot carry out itself.
    pub fn apply_effect(&mut self, effect: Option<Effect>) {
        match effect {
            Some(Effect::Navigate(nav)) => {
                let tab = match nav.target {
                    LinkTarget::NewTab => " (new tab)",
                    _ => "",
                };
                tracing::info!("Navigate to {}{}", nav.href, tab);
                self.set_status(format!("Navigate: {}{}", nav.href, tab));
            }
            Some(Effect::Submit(request)) => {
                let fields = request
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&");
                tracing::info!("Search submit to {}", request.url);
                self.set_status(format!("POST {} {}", request.url, fields));
            }
            Some(Effect::Focus(_) | Effect::Blur) | None => {}
        }
    }

    /// Tab stops on the bar, in paint order.
    #[must_use]
    pub fn focus_order(&self) -> Vec<NodeId> {
        let doc = self.shell.document();
        let mut order: Vec<NodeId> = menubar::bar_items(doc).into_iter().map(|i| i.node).collect();
        if let Some(search) = self.shell.search() {
            order.push(search.input());
            order.extend(search.trigger());
        }
        order
    }

    fn move_focus(&mut self, backwards: bool) {
        let order = self.focus_order();
        if order.is_empty() {
            return;
        }
        let current = self.shell.focused().and_then(|f| {
            let doc = self.shell.document();
            order.iter().position(|&n| doc.contains(n, f))
        });
        let next = match (current, backwards) {
            (None, false) => 0,
            (None, true) => order.len() - 1,
            (Some(i), false) => (i + 1) % order.len(),
            (Some(i), true) => (i + order.len() - 1) % order.len(),
        };
        self.shell.focus(Some(order[next]));
    }

    fn search_focused(&self) -> bool {
        self.shell
            .search()
            .is_some_and(|s| self.shell.focused() == Some(s.input()))
    }
}

fn modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        alt: mods.contains(KeyModifiers::ALT),
        ctrl: mods.contains(KeyModifiers::CONTROL),
        meta: mods.contains(KeyModifiers::SUPER) || mods.contains(KeyModifiers::META),
        shift: mods.contains(KeyModifiers::SHIFT),
    }
}

/// Maps a terminal key to the key names menus understand.
#[must_use]
pub fn nav_key(code: KeyCode) -> NavKey {
    let name = match code {
        KeyCode::Enter => "Enter",
        KeyCode::Char(' ') => " ",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::Esc => "Escape",
        KeyCode::Tab | KeyCode::BackTab => "Tab",
        _ => "",
    };
    NavKey::from_key_name(name)
}

/// Handles one key press. Returns true when the user quits.
pub fn handle_key_event(state: &mut TuiState, key: KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let mods = modifiers(key.modifiers);
    if mods.ctrl && key.code == KeyCode::Char('c') {
        return true;
    }

    if state.search_focused() && !mods.any_command() {
        if let Some(search) = state.shell.search() {
            let mut query = search.query(state.shell.document()).to_string();
            match key.code {
                KeyCode::Char(c) => {
                    query.push(c);
                    state.shell.set_search_query(&query);
                    return false;
                }
                KeyCode::Backspace => {
                    query.pop();
                    state.shell.set_search_query(&query);
                    return false;
                }
                _ => {}
            }
        }
    } else if key.code == KeyCode::Char('q') {
        return true;
    }

    let nav = nav_key(key.code);
    if nav == NavKey::Tab {
        let effect = state.shell.key(nav, mods);
        state.apply_effect(effect);
        state.move_focus(key.code == KeyCode::BackTab || mods.shift);
        return false;
    }
    if nav != NavKey::Other {
        let effect = state.shell.key(nav, mods);
        // Enter on a focused control acts like a click unless something consumed it
        if effect.is_none() && nav == NavKey::Enter {
            if let Some(focused) = state.shell.focused() {
                let effect = state.shell.click(focused, mods);
                state.apply_effect(effect);
                return false;
            }
        }
        state.apply_effect(effect);
    }
    false
}

/// Handles one mouse event.
pub fn handle_mouse_event(state: &mut TuiState, mouse: MouseEvent) {
    let target = state.hits.node_at(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            state.shell.pointer_move(target);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            state.shell.pointer_down(target);
            if let Some(node) = target {
                let is_input = state.shell.search().is_some_and(|s| s.input() == node);
                if is_input {
                    state.shell.focus(Some(node));
                }
                let effect = state.shell.click(node, modifiers(mouse.modifiers));
                state.apply_effect(effect);
            }
        }
        _ => {}
    }
}

/// Initialize terminal for TUI
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore terminal to normal state
pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main event loop
pub fn run_tui(
    state: &mut TuiState,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    let size = terminal.size().context("Failed to read terminal size")?;
    state.shell.set_search_width(f64::from(size.width) * COLUMN_PX);

    loop {
        state.tick();
        terminal.draw(|f| render(f, state))?;

        if event::poll(state.poll_timeout())? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key_event(state, key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(state, mouse),
                Event::Resize(width, _) => {
                    state.shell.set_search_width(f64::from(width) * COLUMN_PX);
                }
                Event::FocusLost => state.shell.window_blur(),
                _ => {}
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

/// Render the UI from current state
fn render(f: &mut Frame, state: &mut TuiState) {
    let full_bg = Block::default().style(Style::default().bg(state.theme.background));
    f.render_widget(full_bg, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Menubar
            Constraint::Min(3),    // Page body
            Constraint::Length(4), // Status bar
        ])
        .split(f.area());

    render_body(f, chunks[1], state);
    render_status_bar(f, chunks[2], state);

    // Menus paint last so dropdowns overlap the body
    state.hits.clear();
    menubar::render(f, chunks[0], &state.shell, &state.theme, &mut state.hits);
}

/// Switch summary under the bar
fn render_body(f: &mut Frame, area: Rect, state: &TuiState) {
    let theme = &state.theme;
    let lines: Vec<Line> = state
        .shell
        .toggles()
        .list()
        .into_iter()
        .map(|entry| {
            let (mark, color) = if entry.value {
                ("on ", theme.success)
            } else {
                ("off", theme.text_muted)
            };
            Line::from(vec![
                Span::styled(format!("  {mark} "), Style::default().fg(color)),
                Span::styled(entry.label, Style::default().fg(theme.text)),
            ])
        })
        .collect();
    let body = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Switches ")
            .style(Style::default().fg(theme.primary).bg(theme.background)),
    );
    f.render_widget(body, area);
}

/// Render the status bar with contextual help
fn render_status_bar(f: &mut Frame, area: Rect, state: &TuiState) {
    let theme = &state.theme;
    let first = if let Some(error) = &state.error_message {
        Line::from(vec![
            Span::styled("ERROR: ", Style::default().fg(theme.error)),
            Span::raw(error.as_str()),
        ])
    } else {
        Line::from(Span::styled(
            state.status_message.as_str(),
            Style::default().fg(theme.text),
        ))
    };
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )
    };
    let help = Line::from(vec![
        key("Tab"),
        Span::raw(" focus  "),
        key("←↑↓→"),
        Span::raw(" navigate  "),
        key("Enter"),
        Span::raw(" activate  "),
        key("Alt+click"),
        Span::raw(" edit hotbutton  "),
        key("q"),
        Span::raw(" quit"),
    ]);
    let status = Paragraph::new(vec![first, help]).block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(theme.text_muted).bg(theme.background)),
    );
    f.render_widget(status, area);
}
