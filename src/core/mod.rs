//! 核心层：错误类型、状态投影、延迟回调与控制器

pub mod controller;
pub mod error;
pub mod state;
pub mod timer;

pub use controller::{AppTimer, Command, Controller, InputEdit};
pub use error::ClientError;
pub use state::{ConnectionState, ConnectionStatus, RenderedResponse, StatusKind, UiMode, UiState};
