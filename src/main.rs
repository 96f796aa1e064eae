//! query-client
//!
//! 入口：加载配置、初始化日志、创建控制器与 TUI，并运行主循环。

use std::time::Duration;

use anyhow::Context;
use query_client::{config::load_config, observability, ui::run_app, Controller, WsConnector};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, config_error) = match load_config(None) {
        Ok(cfg) => (cfg, None),
        Err(e) => (Default::default(), Some(e)),
    };

    observability::init(&cfg.logging)?;
    if let Some(e) = config_error {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    let connector = WsConnector::new(CancellationToken::new());
    let controller =
        Controller::new(connector.clone(), &cfg).context("Failed to create controller")?;
    tracing::info!("Using socket {}", controller.connection().url());

    let result = run_app(controller).await.context("App run failed");
    // 退出前关闭所有链路，给 close 帧留出发送时间
    connector.shutdown(Duration::from_millis(500)).await;
    result
}
