//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `QUERY__*` 覆盖（双下划线表示嵌套，如 `QUERY__SERVER__ORIGIN=https://example.com`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub ui: UiSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// [server] 段：页面来源，socket 地址由它推导（https → wss）
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

/// [connection] 段：重连与重置延迟（毫秒）
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSection {
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_reset_delay_ms() -> u64 {
    100
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

/// [ui] 段：示例按钮、自动提交延迟、响应渲染宽度
#[derive(Debug, Clone, Deserialize)]
pub struct UiSection {
    #[serde(default = "default_auto_submit_delay_ms")]
    pub auto_submit_delay_ms: u64,
    /// 示例查询，依次绑定到 F1..F4
    #[serde(default = "default_examples")]
    pub examples: Vec<String>,
    #[serde(default = "default_render_width")]
    pub render_width: usize,
}

fn default_auto_submit_delay_ms() -> u64 {
    300
}

fn default_examples() -> Vec<String> {
    vec![
        "What is the current price of AAPL?".into(),
        "Compare TSLA and NVDA performance over the last month".into(),
        "Show me the latest news for Microsoft".into(),
        "What were yesterday's top gainers?".into(),
    ]
}

fn default_render_width() -> usize {
    100
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            auto_submit_delay_ms: default_auto_submit_delay_ms(),
            examples: default_examples(),
            render_width: default_render_width(),
        }
    }
}

/// [logging] 段：TUI 占用终端，日志写入文件
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("query-client.log")
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 QUERY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 QUERY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("QUERY")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.origin, "http://127.0.0.1:8000");
        assert_eq!(cfg.connection.reconnect_delay_ms, 3000);
        assert_eq!(cfg.connection.reset_delay_ms, 100);
        assert_eq!(cfg.ui.auto_submit_delay_ms, 300);
        assert_eq!(cfg.ui.examples.len(), 4);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("client.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[server]
origin = "https://markets.example.com"

[connection]
reconnect_delay_ms = 5000

[ui]
render_width = 72
"#
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.server.origin, "https://markets.example.com");
        assert_eq!(cfg.connection.reconnect_delay_ms, 5000);
        assert_eq!(cfg.connection.reset_delay_ms, 100);
        assert_eq!(cfg.ui.render_width, 72);
        assert_eq!(cfg.ui.auto_submit_delay_ms, 300);
    }
}
