//! TUI 层：Ratatui + crossterm，主循环（app）、事件（event）、渲染（render）、展示逻辑（presenter）

pub mod app;
pub mod event;
pub mod markup;
pub mod presenter;
pub mod render;

pub use app::run_app;
pub use event::EventHandler;
pub use presenter::{Presenter, SubmitOutcome};
pub use render::draw;
