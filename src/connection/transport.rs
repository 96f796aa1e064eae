//! 传输层：Connector trait 与基于 tokio-tungstenite 的实现
//!
//! 每次 open 都 spawn 一个独立的链路任务，链路上发生的一切（握手成功、收到文本帧、出错、关闭）
//! 都以带 generation 的 ConnectionEvent 投回 ConnectionManager；Manager 通过 LinkHandle 写帧或关闭。

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::ClientError;

/// 投递给 ConnectionManager 的事件：链路事件带 generation，定时器事件不带
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened { generation: u64 },
    Frame { generation: u64, text: String },
    Errored { generation: u64, error: String },
    Closed { generation: u64 },
    /// 关闭后的延迟重连到点
    RetryDue,
    /// reset 之后的延迟重连到点
    ResetDue,
}

/// Manager 发往链路任务的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    Text(String),
    Close,
}

/// 一条链路的写端
#[derive(Debug, Clone)]
pub struct LinkHandle {
    tx: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkHandle {
    pub fn new(tx: mpsc::UnboundedSender<LinkCommand>) -> Self {
        Self { tx }
    }

    pub fn send_text(&self, text: String) -> Result<(), ClientError> {
        self.tx
            .send(LinkCommand::Text(text))
            .map_err(|_| ClientError::SendFailed("link task has exited".to_string()))
    }

    pub fn close(&self) {
        let _ = self.tx.send(LinkCommand::Close);
    }
}

/// 建立链路的能力；生产实现为 WsConnector，测试用 MockConnector
pub trait Connector: Send + Sync + 'static {
    /// 发起一次连接；结果通过 `events` 异步上报，立即返回写端
    fn open(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> LinkHandle;
}

/// WebSocket 连接器
#[derive(Clone, Default)]
pub struct WsConnector {
    shutdown: CancellationToken,
    links: TaskTracker,
}

impl WsConnector {
    /// `shutdown` 取消时所有链路发送 close 帧并退出
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            links: TaskTracker::new(),
        }
    }

    /// 取消所有链路，并最多等待 `grace` 让 close 帧发出
    pub async fn shutdown(&self, grace: Duration) {
        self.shutdown.cancel();
        self.links.close();
        if tokio::time::timeout(grace, self.links.wait()).await.is_err() {
            tracing::warn!(
                "{} link task(s) still running after {:?}",
                self.links.len(),
                grace
            );
        }
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> LinkHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.links.spawn(run_link(
            url.to_string(),
            generation,
            events,
            rx,
            self.shutdown.clone(),
        ));
        LinkHandle::new(tx)
    }
}

async fn run_link(
    url: String,
    generation: u64,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
    shutdown: CancellationToken,
) {
    let connected = tokio::select! {
        _ = shutdown.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            // 与浏览器一致：握手失败先报 error 再报 close
            tracing::warn!("WebSocket connect to {} failed: {}", url, e);
            let _ = events.send(ConnectionEvent::Errored {
                generation,
                error: e.to_string(),
            });
            let _ = events.send(ConnectionEvent::Closed { generation });
            return;
        }
    };

    tracing::info!("WebSocket connected: {} (generation {})", url, generation);
    let _ = events.send(ConnectionEvent::Opened { generation });

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = ws_tx.close().await;
                break;
            }
            cmd = commands.recv() => match cmd {
                Some(LinkCommand::Text(text)) => {
                    if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                        tracing::warn!("WebSocket send error: {}", e);
                        let _ = events.send(ConnectionEvent::Errored {
                            generation,
                            error: e.to_string(),
                        });
                        break;
                    }
                }
                Some(LinkCommand::Close) | None => {
                    let _ = ws_tx.close().await;
                    break;
                }
            },
            frame = ws_rx.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = events.send(ConnectionEvent::Frame { generation, text });
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(other)) => {
                    tracing::debug!("Ignoring non-text frame ({} bytes)", other.len());
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket receive error: {}", e);
                    let _ = events.send(ConnectionEvent::Errored {
                        generation,
                        error: e.to_string(),
                    });
                    break;
                }
            },
        }
    }

    tracing::info!("WebSocket disconnected (generation {})", generation);
    let _ = events.send(ConnectionEvent::Closed { generation });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_shutdown_sends_close_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(msg) = ws.next().await {
                match msg {
                    Ok(WsMessage::Close(_)) => return true,
                    Ok(_) => continue,
                    Err(_) => return false,
                }
            }
            false
        });

        let connector = WsConnector::new(CancellationToken::new());
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let _link = connector.open(&format!("ws://{}/ws", addr), 1, events_tx);
        assert_eq!(
            events_rx.recv().await,
            Some(ConnectionEvent::Opened { generation: 1 })
        );

        connector.shutdown(Duration::from_secs(2)).await;
        assert!(connector.links.is_empty());
        assert!(server.await.unwrap());
        assert_eq!(
            events_rx.recv().await,
            Some(ConnectionEvent::Closed { generation: 1 })
        );
    }

    #[tokio::test]
    async fn test_refused_connect_reports_error_then_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = WsConnector::new(CancellationToken::new());
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let _link = connector.open(&format!("ws://{}/ws", addr), 7, events_tx);
        assert!(matches!(
            events_rx.recv().await,
            Some(ConnectionEvent::Errored { generation: 7, .. })
        ));
        assert_eq!(
            events_rx.recv().await,
            Some(ConnectionEvent::Closed { generation: 7 })
        );
    }
}
