//! 查询服务的消息协议
//!
//! 出站只有一种：`{"query": "..."}`；入站按 `type` 字段区分 connected / processing / response / error。

use serde::{Deserialize, Serialize};

use crate::core::ClientError;

/// 服务端推送的消息（按 `type` 打标签）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// 服务端完成初始化后的欢迎消息
    Connected {
        #[serde(default)]
        message: String,
    },

    /// 查询已受理，正在处理
    Processing {
        #[serde(default)]
        message: Option<String>,
    },

    Response { data: ResponseData },

    Error {
        #[serde(default)]
        message: String,
    },

    /// 协议之外的 type，记录后丢弃
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// 解析一帧文本；非法 JSON 或缺少 type 字段时返回 MalformedFrame
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Connected { .. } => "connected",
            InboundMessage::Processing { .. } => "processing",
            InboundMessage::Response { .. } => "response",
            InboundMessage::Error { .. } => "error",
            InboundMessage::Unknown => "unknown",
        }
    }
}

/// response 消息的负载
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResponseData {
    /// 已渲染为 HTML 的回答
    pub output: String,
    /// 原始 markdown，渲染失败时作为兜底文本
    #[serde(default)]
    pub raw_output: Option<String>,
    #[serde(default)]
    pub tools_used: Option<Vec<String>>,
}

impl ResponseData {
    pub fn tools(&self) -> &[String] {
        self.tools_used.as_deref().unwrap_or(&[])
    }
}

/// 客户端发出的查询
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub query: String,
}

impl OutboundMessage {
    pub fn query(text: impl Into<String>) -> Self {
        Self { query: text.into() }
    }

    /// 序列化为一帧 JSON 文本
    pub fn to_frame(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|e| ClientError::SendFailed(e.to_string()))
    }
}
