//! 事件处理
//!
//! 轮询 crossterm 事件并映射为 Command：Enter 提交（Shift/Alt+Enter 换行）、Ctrl+L 清空、Ctrl+R 重试、
//! F1..F4 示例、终端重新获得焦点视为页面重新可见、Ctrl+Q / Ctrl+C 退出。

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::{Command, InputEdit};

/// 翻页一次滚动的行数
const PAGE_LINES: isize = 10;

/// 应用事件：映射好的 Command，或需要重绘的终端尺寸变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Command(Command),
    Resize,
}

/// 事件处理器：poll 时读终端事件并返回 AppEvent
pub struct EventHandler {
    poll_interval: Duration,
}

impl EventHandler {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(self.poll_interval)? {
            let ev = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    map_key(key).map(AppEvent::Command)
                }
                Event::FocusGained => Some(AppEvent::Command(Command::Visible)),
                Event::Resize(_, _) => Some(AppEvent::Resize),
                _ => None,
            };
            return Ok(ev);
        }
        Ok(None)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

/// 按键到命令的映射
pub fn map_key(key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Some(Command::Quit),
        KeyCode::Char('l') if ctrl => Some(Command::Clear),
        KeyCode::Char('r') if ctrl => Some(Command::Retry),
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            Some(Command::Input(InputEdit::Newline))
        }
        KeyCode::Enter => Some(Command::Submit),
        KeyCode::F(n) if n >= 1 => Some(Command::Example(usize::from(n - 1))),
        KeyCode::Backspace => Some(Command::Input(InputEdit::Backspace)),
        KeyCode::Up => Some(Command::ScrollResponse(-1)),
        KeyCode::Down => Some(Command::ScrollResponse(1)),
        KeyCode::PageUp => Some(Command::ScrollResponse(-PAGE_LINES)),
        KeyCode::PageDown => Some(Command::ScrollResponse(PAGE_LINES)),
        KeyCode::Char(c) if !ctrl => Some(Command::Input(InputEdit::Char(c))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_enter_submits_unless_shifted() {
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Command::Submit)
        );
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            Some(Command::Input(InputEdit::Newline))
        );
    }

    #[test]
    fn test_control_shortcuts() {
        assert_eq!(
            map_key(key(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            Some(Command::Clear)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Command::Retry)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(map_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_function_keys_pick_examples() {
        assert_eq!(
            map_key(key(KeyCode::F(1), KeyModifiers::NONE)),
            Some(Command::Example(0))
        );
        assert_eq!(
            map_key(key(KeyCode::F(4), KeyModifiers::NONE)),
            Some(Command::Example(3))
        );
    }

    #[test]
    fn test_plain_chars_go_to_input() {
        assert_eq!(
            map_key(key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Command::Input(InputEdit::Char('A')))
        );
    }
}
