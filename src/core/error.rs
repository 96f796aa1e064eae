//! 客户端错误类型
//!
//! 分类：传输层失败（由重连策略自动恢复，只体现在状态指示）、发送失败（展示错误面板，可重试）、
//! 入站帧异常（记录日志后丢弃）。没有任何一类会让界面不可交互。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// 连接未处于 Open 状态时尝试发送
    #[error("Not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::MalformedFrame(e.to_string())
    }
}
