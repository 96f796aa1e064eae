//! 状态定义：连接状态、状态指示、界面模式与 UiState 投影
//!
//! UI 只持有 UiState（模式、输入、面板内容、提交开关）；连接状态由 ConnectionManager 独占，
//! 通过 watch 通道把 ConnectionStatus 推给状态指示器。

use chrono::{DateTime, Local};

/// 单个连接的生命周期状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

/// 状态指示器的种类（决定圆点颜色）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Connecting,
    Connected,
    Error,
    Disconnected,
}

/// 推送给状态观察者的 (种类, 显示文本)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub kind: StatusKind,
    pub text: String,
}

impl ConnectionStatus {
    pub fn new(kind: StatusKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }

    pub fn connecting() -> Self {
        Self::new(StatusKind::Connecting, "Connecting...")
    }

    pub fn connected() -> Self {
        Self::new(StatusKind::Connected, "Connected")
    }

    pub fn error() -> Self {
        Self::new(StatusKind::Error, "Connection Error")
    }

    pub fn disconnected() -> Self {
        Self::new(StatusKind::Disconnected, "Disconnected")
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::connecting()
    }
}

/// 响应区的可见模式，互斥
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Idle,
    Loading,
    ShowingResponse,
    ShowingError,
}

/// 已渲染的一条响应
#[derive(Clone, Debug)]
pub struct RenderedResponse {
    /// 由 markup 转换得到的终端文本
    pub text: String,
    /// 工具标签，按服务端顺序
    pub tools: Vec<String>,
    pub received_at: DateTime<Local>,
}

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug)]
pub struct UiState {
    pub mode: UiMode,
    pub input: String,
    pub input_focused: bool,
    pub submit_enabled: bool,
    pub loading_text: String,
    pub response: Option<RenderedResponse>,
    pub error_message: Option<String>,
    /// 响应区滚动偏移（行）
    pub response_scroll: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            mode: UiMode::Idle,
            input: String::new(),
            input_focused: true,
            submit_enabled: true,
            loading_text: String::new(),
            response: None,
            error_message: None,
            response_scroll: 0,
        }
    }
}

impl UiState {
    pub fn loading_visible(&self) -> bool {
        self.mode == UiMode::Loading
    }

    pub fn response_visible(&self) -> bool {
        self.mode == UiMode::ShowingResponse
    }

    pub fn error_visible(&self) -> bool {
        self.mode == UiMode::ShowingError
    }

    /// 工具面板仅在显示响应且工具列表非空时可见
    pub fn tools_visible(&self) -> bool {
        self.response_visible()
            && self
                .response
                .as_ref()
                .map(|r| !r.tools.is_empty())
                .unwrap_or(false)
    }
}
