/// Terminal chat screen: key bindings, drawing and the event loop
use crate::backend::{Backend, HttpBackend};
use crate::clipboard::{Clipboard, Osc52Clipboard};
use crate::config::Config;
use crate::controller::{ChatController, Completion, Request};
use crate::model::{Author, Message};
use crate::view::{Button, ChatView, Notice};
use crossterm::{
    event::{
        self, DisableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend as TermBackend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What a key press means on the chat screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Submit,
    Newline,
    Char(char),
    Backspace,
    Clear,
    ToggleSender,
    Regenerate,
    ToggleKeys,
    Copy,
    ScrollUp,
    ScrollDown,
    Dismiss,
    Confirm(bool),
    Quit,
}

const SCROLL_STEP: usize = 5;

pub fn map_key(key: KeyEvent, view: &ChatView) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if view.confirm.is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Command::Confirm(true)),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Command::Confirm(false)),
            _ => None,
        };
    }
    if view.notice().is_some() {
        return Some(Command::Dismiss);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let command_key = key.modifiers.contains(KeyModifiers::SUPER);

    match key.code {
        KeyCode::Enter if ctrl || command_key => Some(Command::Submit),
        KeyCode::Enter => Some(Command::Newline),
        // Without keyboard enhancement many terminals report Ctrl+Enter as Ctrl+J
        KeyCode::Char('j') if ctrl => Some(Command::Submit),
        KeyCode::Char('c') if ctrl => Some(Command::Quit),
        KeyCode::Char('l') if ctrl => Some(Command::Clear),
        KeyCode::Char('r') if ctrl => Some(Command::Regenerate),
        KeyCode::Char('k') if ctrl => Some(Command::ToggleKeys),
        KeyCode::Char('y') if ctrl => Some(Command::Copy),
        KeyCode::Char(_) if ctrl || command_key => None,
        KeyCode::Char(c) => Some(Command::Char(c)),
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Tab => Some(Command::ToggleSender),
        KeyCode::Backspace => Some(Command::Backspace),
        KeyCode::PageUp => Some(Command::ScrollUp),
        KeyCode::PageDown => Some(Command::ScrollDown),
        _ => None,
    }
}

/// Apply a command to the controller; returns backend work to start
pub fn dispatch<C: Clipboard>(
    controller: &mut ChatController<C>,
    command: Command,
    now: Instant,
) -> Option<Request> {
    match command {
        Command::Submit => return controller.submit(),
        Command::Confirm(yes) => return controller.answer_confirm(yes),
        Command::ToggleKeys => return controller.toggle_keys(),
        Command::Newline => controller.view_mut().input.push('\n'),
        Command::Char(c) => controller.view_mut().input.push(c),
        Command::Backspace => controller.view_mut().input.backspace(),
        Command::Clear => controller.clear_input(),
        Command::ToggleSender => controller.toggle_sender(),
        Command::Regenerate => controller.regenerate_keys(),
        Command::Copy => controller.copy_bundle(now),
        Command::ScrollUp => controller.view_mut().messages.scroll_up(SCROLL_STEP),
        Command::ScrollDown => controller.view_mut().messages.scroll_down(SCROLL_STEP),
        Command::Dismiss => controller.dismiss_notice(),
        Command::Quit => {}
    }
    None
}

/// Set up the terminal, run the chat screen, restore the terminal
pub fn run(config: &Config) -> anyhow::Result<()> {
    let backend = Arc::new(HttpBackend::new(config.backend_url.clone()));
    let mut controller = ChatController::new(ChatView::new(config.sender), Osc52Clipboard::stdout());
    info!("Chat UI started against {}", backend.base_url());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, DisableMouseCapture)?;
    let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let label = backend.base_url().to_string();
    let res = run_app(&mut terminal, &mut controller, backend, &label);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        warn!("Chat UI stopped with error: {}", e);
    }
    Ok(res?)
}

/// Event loop. Backend requests run as tokio tasks; their completions come
/// back over a channel and are applied here, so only this loop ever touches
/// the controller.
pub fn run_app<T, B, C>(
    terminal: &mut Terminal<T>,
    controller: &mut ChatController<C>,
    backend: Arc<B>,
    backend_label: &str,
) -> std::io::Result<()>
where
    T: TermBackend,
    B: Backend + 'static,
    C: Clipboard,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    loop {
        while let Ok(completion) = rx.try_recv() {
            controller.complete(completion);
        }
        controller.tick(Instant::now());

        terminal.draw(|f| draw(f, controller.view(), backend_label))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(command) = map_key(key, controller.view()) else {
            continue;
        };
        if command == Command::Quit {
            return Ok(());
        }
        if let Some(request) = dispatch(controller, command, Instant::now()) {
            let backend = backend.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let completion = request.run(backend.as_ref()).await;
                let _ = tx.send(completion);
            });
        }
    }
}

// ─── Drawing ─────────────────────────────────────────────────────────────────

fn draw(f: &mut Frame, view: &ChatView, backend_label: &str) {
    let drawer = if view.key_drawer_visible {
        Constraint::Percentage(40)
    } else {
        Constraint::Length(0)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(5),
            drawer,
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(f.size());

    f.render_widget(header(view, backend_label), chunks[0]);
    draw_messages(f, view, chunks[1]);

    let bundle = if view.bundle_view.is_empty() {
        Paragraph::new(Span::styled("(nothing sent yet)", Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(view.bundle_view.as_str())
    };
    f.render_widget(
        bundle
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Encrypted bundle").borders(Borders::ALL)),
        chunks[2],
    );

    if view.key_drawer_visible {
        f.render_widget(
            Paragraph::new(view.keys_view.as_str())
                .wrap(Wrap { trim: false })
                .block(Block::default().title("Keys").borders(Borders::ALL)),
            chunks[3],
        );
    }

    draw_input(f, view, chunks[4]);
    f.render_widget(Paragraph::new(button_bar(view)), chunks[5]);

    if let Some(confirm) = view.confirm {
        let text = vec![
            Line::from(confirm.question()),
            Line::from(""),
            Line::from(Span::styled("[y] yes   [n] no", Style::default().fg(Color::Yellow))),
        ];
        popup(f, "Confirm", text, Color::Yellow);
    } else if let Some(notice) = view.notice() {
        let (title, color) = match notice {
            Notice::Info(_) => ("Notice", Color::Green),
            Notice::Error(_) => ("Error", Color::Red),
        };
        let mut text: Vec<Line> = notice.text().lines().map(|l| Line::from(l.to_string())).collect();
        text.push(Line::from(""));
        let more = view.notices.len() - 1;
        let hint = if more > 0 {
            format!("press any key ({} more)", more)
        } else {
            "press any key".to_string()
        };
        text.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )));
        popup(f, title, text, color);
    }
}

fn header(view: &ChatView, backend_label: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled(
            " CipherChat ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}   ", backend_label)),
        Span::raw("sender: "),
        Span::styled(
            view.sender_select.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   Esc quit", Style::default().fg(Color::DarkGray)),
    ]))
}

fn draw_messages(f: &mut Frame, view: &ChatView, area: Rect) {
    let block = Block::default().title("Messages").borders(Borders::ALL);
    let inner = block.inner(area);
    let lines = message_lines(view.messages.items(), inner.width as usize);

    let max_offset = lines.len().saturating_sub(inner.height as usize);
    let offset = max_offset.saturating_sub(view.messages.scroll_back());

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0)),
        area,
    );
}

/// Bubbles as lines: text wrapped to three quarters of the width, then a
/// dimmed sidecar cut to one line
fn message_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let bubble_width = (width * 3 / 4).max(10);
    let mut lines = Vec::new();

    for message in messages {
        let (alignment, color) = match message.author {
            Author::Me => (Alignment::Right, Color::Cyan),
            Author::Them => (Alignment::Left, Color::Green),
        };
        for chunk in wrap_text(&message.text, bubble_width) {
            lines.push(Line::from(Span::styled(chunk, Style::default().fg(color))).alignment(alignment));
        }
        let sidecar = format!("{} · {}", message.created_at.format("%H:%M"), message.sidecar);
        lines.push(
            Line::from(Span::styled(
                truncate(&sidecar, width),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
            .alignment(alignment),
        );
        lines.push(Line::from(""));
    }
    lines
}

fn draw_input(f: &mut Frame, view: &ChatView, area: Rect) {
    let block = Block::default()
        .title(format!("Message as {} (Ctrl+Enter to send)", view.sender_select))
        .borders(Borders::ALL);
    let inner = block.inner(area);

    let mut lines: Vec<Line> = Vec::new();
    for chunk in wrap_text(view.input.value(), inner.width.max(1) as usize) {
        lines.push(Line::from(chunk));
    }
    match lines.last_mut() {
        Some(last) => last.spans.push(Span::styled("▏", Style::default().fg(Color::Cyan))),
        None => lines.push(Line::from(Span::styled("▏", Style::default().fg(Color::Cyan)))),
    }
    let offset = lines.len().saturating_sub(inner.height as usize);

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0)),
        area,
    );
}

fn button_bar(view: &ChatView) -> Line<'static> {
    let buttons: [(&str, &Button); 6] = [
        ("^⏎", &view.send_button),
        ("^L", &view.clear_button),
        ("^R", &view.regenerate_button),
        ("^Y", &view.copy_button),
        ("^K", &view.show_keys_button),
        ("^K", &view.hide_keys_button),
    ];
    let mut spans = Vec::new();
    for (key, button) in buttons.iter().filter(|(_, b)| b.visible) {
        let style = if button.enabled {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", key), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(format!("{}  ", button.label), style));
    }
    spans.push(Span::styled(" Tab ", Style::default().fg(Color::Cyan)));
    spans.push(Span::raw("sender"));
    Line::from(spans)
}

fn popup(f: &mut Frame, title: &str, text: Vec<Line>, color: Color) {
    let height = (text.len() as u16).saturating_add(2);
    let area = centered_rect(60, height, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            ),
        area,
    );
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Split on newlines, then hard-wrap each line at `width` characters
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            out.push(chunk.iter().collect());
        }
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn ctrl_or_super_enter_submits() {
        let view = ChatView::default();
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::CONTROL), &view), Some(Command::Submit));
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::SUPER), &view), Some(Command::Submit));
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::NONE), &view), Some(Command::Newline));
        assert_eq!(map_key(key(KeyCode::Char('j'), KeyModifiers::CONTROL), &view), Some(Command::Submit));
    }

    #[test]
    fn plain_characters_are_typed() {
        let view = ChatView::default();
        assert_eq!(map_key(key(KeyCode::Char('a'), KeyModifiers::NONE), &view), Some(Command::Char('a')));
        assert_eq!(map_key(key(KeyCode::Char('A'), KeyModifiers::SHIFT), &view), Some(Command::Char('A')));
        assert_eq!(map_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL), &view), None);
    }

    #[test]
    fn notice_swallows_any_key() {
        let mut controller = ChatController::new(ChatView::default(), MemoryClipboard::new());
        assert!(controller.submit().is_none());
        assert!(controller.view().notice().is_some());
        let cmd = map_key(key(KeyCode::Char('q'), KeyModifiers::NONE), controller.view());
        assert_eq!(cmd, Some(Command::Dismiss));
        dispatch(&mut controller, Command::Dismiss, Instant::now());
        assert!(controller.view().notice().is_none());
    }

    #[test]
    fn centered_rect_fits_very_wide_terminals() {
        let area = Rect { x: 0, y: 0, width: 2000, height: 50 };
        let rect = centered_rect(60, 7, area);
        assert_eq!(rect.width, 1200);
        assert_eq!(rect.x, 400);
        assert_eq!(rect.height, 7);

        let full = centered_rect(100, 7, Rect { x: 0, y: 0, width: u16::MAX, height: 5 });
        assert_eq!(full.width, u16::MAX);
        assert_eq!(full.x, 0);
        assert_eq!(full.height, 5);
    }

    #[test]
    fn confirm_prompt_takes_yes_or_no() {
        let mut controller = ChatController::new(ChatView::default(), MemoryClipboard::new());
        dispatch(&mut controller, Command::Regenerate, Instant::now());
        let view = controller.view();
        assert_eq!(map_key(key(KeyCode::Char('y'), KeyModifiers::NONE), view), Some(Command::Confirm(true)));
        assert_eq!(map_key(key(KeyCode::Esc, KeyModifiers::NONE), view), Some(Command::Confirm(false)));
        assert_eq!(map_key(key(KeyCode::Char('x'), KeyModifiers::NONE), view), None);

        assert_eq!(
            dispatch(&mut controller, Command::Confirm(true), Instant::now()),
            Some(Request::RegenerateKeys)
        );
    }

    #[test]
    fn typing_then_submit_builds_send_request() {
        let mut controller = ChatController::new(ChatView::default(), MemoryClipboard::new());
        for c in "hi".chars() {
            dispatch(&mut controller, Command::Char(c), Instant::now());
        }
        dispatch(&mut controller, Command::ToggleSender, Instant::now());
        let request = dispatch(&mut controller, Command::Submit, Instant::now());
        match request {
            Some(Request::Send(req)) => {
                assert_eq!(req.plaintext, "hi");
                assert_eq!(req.sender, crate::model::Sender::Bob);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn wrap_and_truncate() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("a\n\nb", 4), vec!["a", "", "b"]);
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn message_lines_align_by_author() {
        let lines = message_lines(
            &[Message::optimistic("hello"), Message::reply("hi there", "XYZ")],
            40,
        );
        // bubble, sidecar, spacer for each message
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(lines[3].alignment, Some(Alignment::Left));
    }
}
