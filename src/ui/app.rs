//! TUI 应用主循环
//!
//! 进入全屏/原始模式并开启焦点上报，循环：poll 终端事件 → 转为 Command 交给控制器 →
//! 处理已到达的连接与定时器事件 → 按 UiState 与连接状态重绘。退出时恢复终端。

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::connection::Connector;
use crate::core::Controller;
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 运行 TUI：建立首个连接后循环 poll + 渲染，直到用户退出
pub async fn run_app<C: Connector>(mut controller: Controller<C>) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut controller).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop<C: Connector>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &mut Controller<C>,
) -> anyhow::Result<()> {
    let status_rx = controller.status();
    let event_handler = EventHandler::default();
    controller.start();

    loop {
        if let Some(AppEvent::Command(cmd)) = event_handler.poll()? {
            if !controller.handle_command(cmd) {
                tracing::info!("Quit requested");
                break;
            }
        }

        controller.drain();

        let status = status_rx.borrow().clone();
        let mut scroll_limit = None;
        terminal.draw(|f| {
            scroll_limit = draw(f, controller.ui_state(), &status, controller.examples());
        })?;
        controller.set_response_scroll_limit(scroll_limit);

        tokio::task::yield_now().await;
    }

    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;
    Ok(())
}
