//! 由页面来源（origin）推导 WebSocket 地址：https → wss，其余 → ws，路径固定 /ws

use crate::core::ClientError;

const SOCKET_PATH: &str = "/ws";

/// 解析后的来源：是否走安全传输 + host[:port]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub secure: bool,
    pub host: String,
}

impl Origin {
    /// 接受 `https://host:port`、`http://host`、`host:port` 等形式，忽略路径与查询串
    pub fn parse(origin: &str) -> Result<Self, ClientError> {
        let trimmed = origin.trim();
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("http".to_string(), trimmed),
        };
        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        if host.is_empty() {
            return Err(ClientError::InvalidOrigin(origin.to_string()));
        }
        Ok(Self {
            secure: scheme == "https",
            host,
        })
    }

    /// `<ws|wss>://<host>/ws`
    pub fn socket_url(&self) -> String {
        let scheme = if self.secure { "wss:" } else { "ws:" };
        format!("{}//{}{}", scheme, self.host, SOCKET_PATH)
    }
}

/// 便捷函数：origin 字符串直接得到 socket 地址
pub fn socket_url(origin: &str) -> Result<String, ClientError> {
    Ok(Origin::parse(origin)?.socket_url())
}
