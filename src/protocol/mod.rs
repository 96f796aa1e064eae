//! 与查询服务之间的协议：消息格式、分发表、端点推导

mod dispatch;
mod endpoint;
mod message;

pub use dispatch::{dispatch, MessageHandler};
pub use endpoint::{socket_url, Origin};
pub use message::{InboundMessage, OutboundMessage, ResponseData};
