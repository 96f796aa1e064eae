//! 连接层：唯一的持久 WebSocket、重连策略与入站分发

mod manager;
mod mock;
mod transport;

pub use manager::{ConnectionManager, ConnectionTimings, QueryChannel};
pub use mock::MockConnector;
pub use transport::{ConnectionEvent, Connector, LinkCommand, LinkHandle, WsConnector};
