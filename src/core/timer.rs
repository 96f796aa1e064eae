//! 延迟回调
//!
//! 所有挂起点（重连 3s、重置 100ms、示例自动提交 300ms）都走这里：spawn 一个 sleep，
//! 到点后把事件投回控制器的事件通道。定时器不可取消，到点时由接收方判断是否已失效。

use std::time::Duration;

use tokio::sync::mpsc;

/// 在 `delay` 之后把 `event` 发送到 `tx`；接收端已关闭时静默丢弃
pub fn schedule<E>(tx: mpsc::UnboundedSender<E>, delay: Duration, event: E)
where
    E: Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if tx.send(event).is_err() {
            tracing::debug!("Timer fired after receiver dropped");
        }
    });
}
