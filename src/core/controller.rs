//! 控制器：把唯一的 ConnectionManager 与 Presenter 接在一起
//!
//! 所有事件（用户命令、链路事件、定时器）都在同一个循环里逐个处理，每个处理函数跑完才处理下一个，
//! 连接只会被 ConnectionManager 修改，不存在并发访问。

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::{timer, ClientError, ConnectionStatus, UiState};
use crate::config::AppConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionTimings, Connector, QueryChannel};
use crate::protocol::socket_url;
use crate::ui::presenter::{Presenter, SubmitOutcome};

/// 从 UI 发往控制器的用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 提交输入框内容
    Submit,
    /// 清空响应并重置会话
    Clear,
    /// 错误面板上的重试
    Retry,
    /// 第 n 个示例按钮
    Example(usize),
    /// 终端重新获得焦点
    Visible,
    Input(InputEdit),
    ScrollResponse(isize),
    Quit,
}

/// 输入框编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdit {
    Char(char),
    Newline,
    Backspace,
}

/// 控制器自己的定时器事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTimer {
    /// 示例按钮选中后的自动提交
    AutoSubmit,
}

pub struct Controller<C: Connector> {
    conn: ConnectionManager<C>,
    presenter: Presenter,
    conn_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    timer_tx: mpsc::UnboundedSender<AppTimer>,
    timer_rx: mpsc::UnboundedReceiver<AppTimer>,
    auto_submit_delay: Duration,
}

impl<C: Connector> Controller<C> {
    pub fn new(connector: C, cfg: &AppConfig) -> Result<Self, ClientError> {
        let url = socket_url(&cfg.server.origin)?;
        let (conn, conn_rx) =
            ConnectionManager::new(connector, url, ConnectionTimings::from(&cfg.connection));
        let presenter = Presenter::new(cfg.ui.examples.clone(), cfg.ui.render_width);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Ok(Self {
            conn,
            presenter,
            conn_rx,
            timer_tx,
            timer_rx,
            auto_submit_delay: Duration::from_millis(cfg.ui.auto_submit_delay_ms),
        })
    }

    /// 启动时建立第一条连接
    pub fn start(&mut self) {
        self.conn.connect();
    }

    pub fn ui_state(&self) -> &UiState {
        self.presenter.state()
    }

    pub fn examples(&self) -> &[String] {
        self.presenter.examples()
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.conn.status()
    }

    /// 渲染层回报的响应滚动上限
    pub fn set_response_scroll_limit(&mut self, limit: Option<usize>) {
        self.presenter.set_scroll_limit(limit);
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.conn
    }

    /// 处理一条用户命令；返回 false 表示应退出
    pub fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Submit => {
                let outcome = self.presenter.submit(&mut self.conn);
                tracing::debug!("Submit: {:?}", outcome);
            }
            Command::Clear => self.presenter.clear(&mut self.conn),
            Command::Retry => {
                let outcome = self.presenter.retry(&mut self.conn);
                tracing::debug!("Retry: {:?}", outcome);
            }
            Command::Example(index) => {
                if self.presenter.choose_example(index) {
                    timer::schedule(
                        self.timer_tx.clone(),
                        self.auto_submit_delay,
                        AppTimer::AutoSubmit,
                    );
                }
            }
            Command::Visible => self.presenter.on_visible(&mut self.conn),
            Command::Input(edit) => match edit {
                InputEdit::Char(c) => self.presenter.push_char(c),
                InputEdit::Newline => self.presenter.push_newline(),
                InputEdit::Backspace => self.presenter.backspace(),
            },
            Command::ScrollResponse(delta) => self.presenter.scroll_response(delta),
            Command::Quit => return false,
        }
        true
    }

    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        self.conn.handle_event(event, &mut self.presenter);
    }

    pub fn handle_timer(&mut self, event: AppTimer) {
        match event {
            AppTimer::AutoSubmit => {
                if self.presenter.submit(&mut self.conn) == SubmitOutcome::Ignored {
                    tracing::debug!("Auto-submit skipped");
                }
            }
        }
    }

    /// 不阻塞地处理所有已到达的事件，返回处理条数
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.conn_rx.try_recv() {
            self.handle_connection_event(event);
            handled += 1;
        }
        while let Ok(event) = self.timer_rx.try_recv() {
            self.handle_timer(event);
            handled += 1;
        }
        handled
    }

    /// 等待并处理下一条事件
    pub async fn next_event(&mut self) {
        tokio::select! {
            Some(event) = self.conn_rx.recv() => self.handle_connection_event(event),
            Some(event) = self.timer_rx.recv() => self.handle_timer(event),
            else => {}
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }
}
