//! query-client - 终端查询客户端
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **connection**: 唯一持久 WebSocket 的连接管理与重连策略
//! - **core**: 错误类型、状态投影、延迟回调、控制器
//! - **observability**: tracing 日志
//! - **protocol**: 消息格式、入站分发表、socket 地址推导
//! - **ui**: Ratatui TUI 界面与 Presenter

pub mod config;
pub mod connection;
pub mod core;
pub mod observability;
pub mod protocol;
pub mod ui;

pub use crate::connection::{ConnectionManager, WsConnector};
pub use crate::core::Controller;
