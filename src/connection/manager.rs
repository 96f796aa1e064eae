//! 连接管理器：独占唯一的活动连接，负责连接、关闭后重连、状态上报与入站消息分发
//!
//! 重连策略：关闭后固定延迟重试，不设上限。重连是显式的状态迁移 Closed →(delay)→ Connecting，
//! 由 RetryDue 事件驱动；到点时若已有连接在建立或已打开，则什么都不做。

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::transport::{ConnectionEvent, Connector, LinkHandle};
use crate::config::ConnectionSection;
use crate::core::{timer, ClientError, ConnectionState, ConnectionStatus};
use crate::protocol::{dispatch, InboundMessage, MessageHandler, OutboundMessage};

/// 连接相关的固定延迟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimings {
    /// 关闭后到下一次重连
    pub reconnect_delay: Duration,
    /// reset 关闭旧连接后到重新连接，留给服务端丢弃与旧连接绑定的会话
    pub reset_delay: Duration,
}

impl Default for ConnectionTimings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
            reset_delay: Duration::from_millis(100),
        }
    }
}

impl From<&ConnectionSection> for ConnectionTimings {
    fn from(section: &ConnectionSection) -> Self {
        Self {
            reconnect_delay: Duration::from_millis(section.reconnect_delay_ms),
            reset_delay: Duration::from_millis(section.reset_delay_ms),
        }
    }
}

/// Presenter 看到的连接能力
pub trait QueryChannel {
    fn is_connected(&self) -> bool;

    fn send(&self, message: &OutboundMessage) -> Result<(), ClientError>;

    /// 丢弃当前连接（及服务端与之绑定的对话历史）并重新连接
    fn reset(&mut self);

    /// 界面重新可见：断开状态下立即尝试连接
    fn on_visible(&mut self);
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    url: String,
    timings: ConnectionTimings,
    state: ConnectionState,
    /// 当前连接的代号；旧代号的事件一律视为过期
    generation: u64,
    link: Option<LinkHandle>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl<C: Connector> ConnectionManager<C> {
    /// 创建管理器；返回的接收端需由调用方循环取出并交回 `handle_event`
    pub fn new(
        connector: C,
        url: String,
        timings: ConnectionTimings,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        let manager = Self {
            connector,
            url,
            timings,
            state: ConnectionState::Closed,
            generation: 0,
            link: None,
            events_tx,
            status_tx,
        };
        (manager, events_rx)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 订阅状态指示
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// 发起一次新连接（新的 generation）
    pub fn connect(&mut self) {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.publish(ConnectionStatus::connecting());
        tracing::info!("Connecting to {} (generation {})", self.url, self.generation);
        let link = self
            .connector
            .open(&self.url, self.generation, self.events_tx.clone());
        self.link = Some(link);
    }

    /// 处理一条链路或定时器事件；入站消息按类型分发给 `handler`
    pub fn handle_event(&mut self, event: ConnectionEvent, handler: &mut dyn MessageHandler) {
        match event {
            ConnectionEvent::Opened { generation } if self.is_current(generation) => {
                self.state = ConnectionState::Open;
                self.publish(ConnectionStatus::connected());
                tracing::info!("WebSocket connected");
            }
            ConnectionEvent::Frame { generation, text } if self.is_current(generation) => {
                match InboundMessage::parse(&text) {
                    Ok(msg) => {
                        tracing::debug!("Inbound message: {}", msg.kind());
                        dispatch(msg, handler);
                    }
                    Err(e) => {
                        tracing::warn!("Dropping inbound frame: {}", e);
                    }
                }
            }
            ConnectionEvent::Errored { generation, error } if self.is_current(generation) => {
                tracing::error!("WebSocket error: {}", error);
                self.state = ConnectionState::Errored;
                self.publish(ConnectionStatus::error());
            }
            ConnectionEvent::Closed { generation } if self.is_current(generation) => {
                self.state = ConnectionState::Closed;
                self.link = None;
                self.publish(ConnectionStatus::disconnected());
                handler.on_disconnected();
                tracing::info!(
                    "WebSocket disconnected, retrying in {:?}",
                    self.timings.reconnect_delay
                );
                timer::schedule(
                    self.events_tx.clone(),
                    self.timings.reconnect_delay,
                    ConnectionEvent::RetryDue,
                );
            }
            ConnectionEvent::RetryDue => self.connect_if_idle("retry"),
            ConnectionEvent::ResetDue => self.connect_if_idle("reset"),
            stale => {
                tracing::debug!("Ignoring stale event: {:?}", stale);
            }
        }
    }

    /// 仅在没有连接正在建立或已打开时才连接，避免并行的重复连接
    fn connect_if_idle(&mut self, reason: &str) {
        match self.state {
            ConnectionState::Closed | ConnectionState::Errored => {
                tracing::debug!("Reconnecting ({})", reason);
                self.connect();
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                tracing::debug!("Skipping {} reconnect, state is {:?}", reason, self.state);
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn publish(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }
}

impl<C: Connector> QueryChannel for ConnectionManager<C> {
    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    fn send(&self, message: &OutboundMessage) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open {
            return Err(ClientError::NotConnected);
        }
        let link = self.link.as_ref().ok_or(ClientError::NotConnected)?;
        link.send_text(message.to_frame()?)
    }

    fn reset(&mut self) {
        if self.state != ConnectionState::Open {
            return;
        }
        // 主动关闭并脱离旧连接，其后续事件按过期处理，不会再触发关闭重连
        if let Some(link) = self.link.take() {
            link.close();
        }
        self.generation += 1;
        self.state = ConnectionState::Closed;
        self.publish(ConnectionStatus::disconnected());
        tracing::info!("Resetting connection in {:?}", self.timings.reset_delay);
        timer::schedule(
            self.events_tx.clone(),
            self.timings.reset_delay,
            ConnectionEvent::ResetDue,
        );
    }

    fn on_visible(&mut self) {
        self.connect_if_idle("visibility");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MockConnector;
    use crate::core::StatusKind;
    use crate::protocol::ResponseData;

    #[derive(Default)]
    struct Recorder {
        kinds: Vec<&'static str>,
        disconnects: usize,
    }

    impl MessageHandler for Recorder {
        fn on_connected(&mut self, _message: &str) {
            self.kinds.push("connected");
        }

        fn on_processing(&mut self, _message: Option<&str>) {
            self.kinds.push("processing");
        }

        fn on_response(&mut self, _data: ResponseData) {
            self.kinds.push("response");
        }

        fn on_error(&mut self, _message: &str) {
            self.kinds.push("error");
        }

        fn on_disconnected(&mut self) {
            self.disconnects += 1;
        }
    }

    fn manager() -> (
        ConnectionManager<MockConnector>,
        mpsc::UnboundedReceiver<ConnectionEvent>,
        MockConnector,
    ) {
        let mock = MockConnector::new();
        let (mgr, rx) = ConnectionManager::new(
            mock.clone(),
            "ws://127.0.0.1:8000/ws".to_string(),
            ConnectionTimings::default(),
        );
        (mgr, rx, mock)
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn pump(
        mgr: &mut ConnectionManager<MockConnector>,
        rx: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
        rec: &mut Recorder,
    ) {
        while let Ok(ev) = rx.try_recv() {
            mgr.handle_event(ev, rec);
        }
    }

    #[tokio::test]
    async fn test_open_publishes_connected_status() {
        let (mut mgr, mut rx, mock) = manager();
        let status = mgr.status();
        let mut rec = Recorder::default();

        mgr.connect();
        assert_eq!(mgr.state(), ConnectionState::Connecting);
        assert_eq!(mock.last_url().as_deref(), Some("ws://127.0.0.1:8000/ws"));

        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);
        assert!(mgr.is_connected());
        assert_eq!(status.borrow().kind, StatusKind::Connected);
        assert_eq!(status.borrow().text, "Connected");
    }

    #[tokio::test]
    async fn test_send_requires_open() {
        let (mut mgr, mut rx, mock) = manager();
        let mut rec = Recorder::default();
        let msg = OutboundMessage::query("hello");

        assert!(matches!(mgr.send(&msg), Err(ClientError::NotConnected)));
        mgr.connect();
        assert!(matches!(mgr.send(&msg), Err(ClientError::NotConnected)));

        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);
        mgr.send(&msg).unwrap();
        assert_eq!(mock.sent_frames(), vec![r#"{"query":"hello"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_frames_dispatch_and_bad_frames_dropped() {
        let (mut mgr, mut rx, mock) = manager();
        let mut rec = Recorder::default();
        mgr.connect();
        mock.accept_last();
        mock.push_frame(r#"{"type":"processing"}"#);
        mock.push_frame("{broken");
        mock.push_frame(r#"{"type":"telemetry"}"#);
        mock.push_frame(r#"{"type":"error","message":"boom"}"#);
        pump(&mut mgr, &mut rx, &mut rec);

        assert_eq!(rec.kinds, vec!["processing", "error"]);
        assert!(mgr.is_connected());
    }

    #[tokio::test]
    async fn test_error_does_not_reconnect_by_itself() {
        let (mut mgr, mut rx, mock) = manager();
        let status = mgr.status();
        let mut rec = Recorder::default();
        mgr.connect();
        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);

        mgr.handle_event(
            ConnectionEvent::Errored {
                generation: mgr.generation(),
                error: "reset by peer".to_string(),
            },
            &mut rec,
        );
        assert_eq!(mgr.state(), ConnectionState::Errored);
        assert_eq!(status.borrow().kind, StatusKind::Error);
        assert_eq!(mock.open_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_single_retry() {
        let (mut mgr, mut rx, mock) = manager();
        let status = mgr.status();
        let mut rec = Recorder::default();
        mgr.connect();
        mock.fail_last("refused");
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mgr.state(), ConnectionState::Closed);
        assert_eq!(status.borrow().kind, StatusKind::Disconnected);
        assert_eq!(rec.disconnects, 1);

        tokio::time::sleep(Duration::from_millis(2900)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);
        assert_eq!(mgr.state(), ConnectionState::Connecting);

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_is_noop_when_already_open() {
        let (mut mgr, mut rx, mock) = manager();
        let mut rec = Recorder::default();
        mgr.connect();
        mock.close_last();
        pump(&mut mgr, &mut rx, &mut rec);

        // 重试到点前，界面可见触发了一次连接并成功
        mgr.on_visible();
        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);

        tokio::time::sleep(Duration::from_secs(4)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);
        assert!(mgr.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_reconnects_once_after_delay() {
        let (mut mgr, mut rx, mock) = manager();
        let mut rec = Recorder::default();
        mgr.connect();
        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);

        mgr.reset();
        assert!(mock.was_closed(0));
        assert!(!mgr.is_connected());

        tokio::time::sleep(Duration::from_millis(50)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);
        assert_eq!(mock.last_generation(), Some(mgr.generation()));

        // 旧连接迟到的 close 属于过期代号，不会再安排重连，也不通知界面
        mgr.handle_event(ConnectionEvent::Closed { generation: 1 }, &mut rec);
        assert_eq!(mgr.state(), ConnectionState::Connecting);
        assert_eq!(rec.disconnects, 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        pump(&mut mgr, &mut rx, &mut rec);
        assert_eq!(mock.open_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_when_not_open_is_noop() {
        let (mut mgr, _rx, mock) = manager();
        mgr.connect();
        mgr.reset();
        assert_eq!(mgr.state(), ConnectionState::Connecting);
        assert_eq!(mock.open_count(), 1);
    }

    #[tokio::test]
    async fn test_visible_only_connects_when_disconnected() {
        let (mut mgr, mut rx, mock) = manager();
        let mut rec = Recorder::default();
        mgr.on_visible();
        assert_eq!(mock.open_count(), 1);
        mgr.on_visible();
        assert_eq!(mock.open_count(), 1);

        mock.accept_last();
        pump(&mut mgr, &mut rx, &mut rec);
        mgr.on_visible();
        assert_eq!(mock.open_count(), 1);
    }
}
