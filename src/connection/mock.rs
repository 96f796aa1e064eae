//! Mock Connector：不做网络 I/O，记录每次 open，并允许测试手动注入链路事件

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::transport::{ConnectionEvent, Connector, LinkCommand, LinkHandle};

/// 一次 open 的记录
struct MockLink {
    url: String,
    generation: u64,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    commands: mpsc::UnboundedReceiver<LinkCommand>,
    /// 已从 commands 取出的指令
    received: Vec<LinkCommand>,
}

impl MockLink {
    fn drain(&mut self) {
        while let Ok(cmd) = self.commands.try_recv() {
            self.received.push(cmd);
        }
    }
}

/// 可克隆：测试持有一份，ConnectionManager 持有一份
#[derive(Clone, Default)]
pub struct MockConnector {
    links: Arc<Mutex<Vec<MockLink>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn links(&self) -> MutexGuard<'_, Vec<MockLink>> {
        self.links.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 总共发起过多少次连接
    pub fn open_count(&self) -> usize {
        self.links().len()
    }

    pub fn last_url(&self) -> Option<String> {
        self.links().last().map(|l| l.url.clone())
    }

    pub fn last_generation(&self) -> Option<u64> {
        self.links().last().map(|l| l.generation)
    }

    fn emit_last(&self, make: impl FnOnce(u64) -> Vec<ConnectionEvent>) {
        let links = self.links();
        if let Some(link) = links.last() {
            for ev in make(link.generation) {
                let _ = link.events.send(ev);
            }
        }
    }

    /// 最近一条链路握手成功
    pub fn accept_last(&self) {
        self.emit_last(|generation| vec![ConnectionEvent::Opened { generation }]);
    }

    /// 最近一条链路失败：error 后紧跟 close
    pub fn fail_last(&self, error: &str) {
        let error = error.to_string();
        self.emit_last(|generation| {
            vec![
                ConnectionEvent::Errored { generation, error },
                ConnectionEvent::Closed { generation },
            ]
        });
    }

    /// 服务端关闭最近一条链路
    pub fn close_last(&self) {
        self.emit_last(|generation| vec![ConnectionEvent::Closed { generation }]);
    }

    /// 服务端在最近一条链路上推送一帧
    pub fn push_frame(&self, text: &str) {
        let text = text.to_string();
        self.emit_last(|generation| vec![ConnectionEvent::Frame { generation, text }]);
    }

    /// 所有链路上客户端写出的文本帧（按链路顺序）
    pub fn sent_frames(&self) -> Vec<String> {
        let mut links = self.links();
        let mut frames = Vec::new();
        for link in links.iter_mut() {
            link.drain();
            for cmd in &link.received {
                if let LinkCommand::Text(t) = cmd {
                    frames.push(t.clone());
                }
            }
        }
        frames
    }

    /// 第 `index` 条链路是否被客户端主动关闭
    pub fn was_closed(&self, index: usize) -> bool {
        let mut links = self.links();
        match links.get_mut(index) {
            Some(link) => {
                link.drain();
                link.received.contains(&LinkCommand::Close)
            }
            None => false,
        }
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> LinkHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.links().push(MockLink {
            url: url.to_string(),
            generation,
            events,
            commands: rx,
            received: Vec::new(),
        });
        LinkHandle::new(tx)
    }
}
