//! UI Presenter：持有界面状态，响应入站消息与用户动作
//!
//! 模式互斥：Idle → Loading（提交成功）→ ShowingResponse / ShowingError（对应消息）→ Idle（清空）
//! 或重新 Loading（重试）。Loading 期间禁止提交，其余模式允许。

use chrono::Local;

use super::markup::render_markup;
use crate::connection::QueryChannel;
use crate::core::{RenderedResponse, UiMode, UiState};
use crate::protocol::{MessageHandler, OutboundMessage, ResponseData};

pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to server. Please wait...";
pub const SEND_FAILED_MESSAGE: &str = "Failed to send query. Please try again.";
pub const CONNECTION_LOST_MESSAGE: &str =
    "Connection lost before the response arrived. Please try again.";
const DEFAULT_LOADING_TEXT: &str = "Processing your query...";

/// 一次提交的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 输入为空或当前禁止提交
    Ignored,
    NotConnected,
    SendFailed,
    Sent,
}

pub struct Presenter {
    state: UiState,
    examples: Vec<String>,
    render_width: usize,
    /// 最近一次绘制得到的响应最大滚动行数；未绘制过为 None
    scroll_limit: Option<usize>,
}

impl Presenter {
    pub fn new(examples: Vec<String>, render_width: usize) -> Self {
        Self {
            state: UiState::default(),
            examples,
            render_width,
            scroll_limit: None,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn mode(&self) -> UiMode {
        self.state.mode
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    // ------------------------------------------------------------------
    // 输入编辑
    // ------------------------------------------------------------------

    pub fn push_char(&mut self, c: char) {
        self.state.input.push(c);
    }

    pub fn push_newline(&mut self) {
        self.state.input.push('\n');
    }

    pub fn backspace(&mut self) {
        self.state.input.pop();
    }

    pub fn set_input(&mut self, text: &str) {
        self.state.input = text.to_string();
    }

    pub fn scroll_response(&mut self, delta: isize) {
        let scroll = self.state.response_scroll.saturating_add_signed(delta);
        self.state.response_scroll = match self.scroll_limit {
            Some(limit) => scroll.min(limit),
            None => scroll,
        };
    }

    /// 记录当前终端尺寸下的滚动上限，并把已有偏移收回到上限内
    pub fn set_scroll_limit(&mut self, limit: Option<usize>) {
        self.scroll_limit = limit;
        if let Some(limit) = limit {
            self.state.response_scroll = self.state.response_scroll.min(limit);
        }
    }

    // ------------------------------------------------------------------
    // 用户动作
    // ------------------------------------------------------------------

    /// 提交当前输入：空输入忽略；未连接或发送失败进入错误面板；成功则进入 Loading
    pub fn submit(&mut self, channel: &mut dyn QueryChannel) -> SubmitOutcome {
        let query = self.state.input.trim().to_string();
        if query.is_empty() || !self.state.submit_enabled {
            return SubmitOutcome::Ignored;
        }

        if !channel.is_connected() {
            self.show_error(NOT_CONNECTED_MESSAGE);
            return SubmitOutcome::NotConnected;
        }

        match channel.send(&OutboundMessage::query(query)) {
            Ok(()) => {
                self.show_loading(None);
                SubmitOutcome::Sent
            }
            Err(e) => {
                tracing::error!("Send error: {}", e);
                self.show_error(SEND_FAILED_MESSAGE);
                SubmitOutcome::SendFailed
            }
        }
    }

    /// 清空：回到 Idle、清空输入并聚焦，同时重置连接以丢弃服务端对话历史
    pub fn clear(&mut self, channel: &mut dyn QueryChannel) {
        self.state.mode = UiMode::Idle;
        self.state.response = None;
        self.state.error_message = None;
        self.state.response_scroll = 0;
        self.state.submit_enabled = true;
        self.state.input.clear();
        self.state.input_focused = true;
        channel.reset();
    }

    /// 重试：仅在错误面板可见时生效，隐藏错误后用同一输入重新提交
    pub fn retry(&mut self, channel: &mut dyn QueryChannel) -> SubmitOutcome {
        if self.state.mode != UiMode::ShowingError {
            return SubmitOutcome::Ignored;
        }
        self.state.mode = UiMode::Idle;
        self.state.error_message = None;
        self.submit(channel)
    }

    /// 选中示例：填入输入框并聚焦；返回 true 表示调用方应安排自动提交
    pub fn choose_example(&mut self, index: usize) -> bool {
        let Some(example) = self.examples.get(index).cloned() else {
            return false;
        };
        self.state.input = example;
        self.state.input_focused = true;
        true
    }

    /// 界面重新可见时交给连接层决定是否重连
    pub fn on_visible(&mut self, channel: &mut dyn QueryChannel) {
        channel.on_visible();
    }

    // ------------------------------------------------------------------
    // 面板切换
    // ------------------------------------------------------------------

    fn show_loading(&mut self, message: Option<&str>) {
        self.state.mode = UiMode::Loading;
        self.state.error_message = None;
        self.state.loading_text = message.unwrap_or(DEFAULT_LOADING_TEXT).to_string();
        self.state.submit_enabled = false;
    }

    fn show_response(&mut self, data: ResponseData) {
        let text = match render_markup(&data.output, self.render_width) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Falling back to raw output: {}", e);
                data.raw_output.clone().unwrap_or_else(|| data.output.clone())
            }
        };
        let tools = data.tools().to_vec();

        self.state.mode = UiMode::ShowingResponse;
        self.state.error_message = None;
        self.state.submit_enabled = true;
        self.state.response = Some(RenderedResponse {
            text,
            tools,
            received_at: Local::now(),
        });
        // 滚动到响应开头，上限等下一帧绘制后再定
        self.state.response_scroll = 0;
        self.scroll_limit = None;
    }

    fn show_error(&mut self, message: &str) {
        self.state.mode = UiMode::ShowingError;
        self.state.error_message = Some(message.to_string());
        self.state.submit_enabled = true;
    }
}

impl MessageHandler for Presenter {
    fn on_connected(&mut self, message: &str) {
        tracing::info!("Server: {}", message);
    }

    fn on_processing(&mut self, message: Option<&str>) {
        self.show_loading(message);
    }

    fn on_response(&mut self, data: ResponseData) {
        self.show_response(data);
    }

    fn on_error(&mut self, message: &str) {
        self.show_error(message);
    }

    /// 等待中的响应不会再到达（服务端会话随连接结束），转入错误面板以便重试
    fn on_disconnected(&mut self) {
        if self.state.mode == UiMode::Loading {
            self.show_error(CONNECTION_LOST_MESSAGE);
        }
    }
}
