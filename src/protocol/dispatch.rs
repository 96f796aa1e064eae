//! 入站消息分发表：每种消息类型对应处理器上的一个方法

use super::message::{InboundMessage, ResponseData};

/// 消息处理器（由 Presenter 实现）
pub trait MessageHandler {
    fn on_connected(&mut self, message: &str);

    fn on_processing(&mut self, message: Option<&str>);

    fn on_response(&mut self, data: ResponseData);

    fn on_error(&mut self, message: &str);

    /// 当前连接关闭；不是服务端消息，由 ConnectionManager 直接调用
    fn on_disconnected(&mut self) {}
}

/// 按类型把消息交给对应方法；未知类型只记日志
pub fn dispatch(msg: InboundMessage, handler: &mut dyn MessageHandler) {
    match msg {
        InboundMessage::Connected { message } => handler.on_connected(&message),
        InboundMessage::Processing { message } => handler.on_processing(message.as_deref()),
        InboundMessage::Response { data } => handler.on_response(data),
        InboundMessage::Error { message } => handler.on_error(&message),
        InboundMessage::Unknown => {
            tracing::warn!("Unknown message type, dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl MessageHandler for Recorder {
        fn on_connected(&mut self, message: &str) {
            self.calls.push(format!("connected:{}", message));
        }

        fn on_processing(&mut self, _message: Option<&str>) {
            self.calls.push("processing".to_string());
        }

        fn on_response(&mut self, data: ResponseData) {
            self.calls.push(format!("response:{}", data.output));
        }

        fn on_error(&mut self, message: &str) {
            self.calls.push(format!("error:{}", message));
        }
    }

    #[test]
    fn test_each_kind_routes_to_one_handler() {
        let mut rec = Recorder::default();
        for frame in [
            r#"{"type":"connected","message":"Connected to Market Query AI"}"#,
            r#"{"type":"processing"}"#,
            r#"{"type":"response","data":{"output":"<p>hi</p>"}}"#,
            r#"{"type":"error","message":"boom"}"#,
            r#"{"type":"mystery"}"#,
        ] {
            dispatch(InboundMessage::parse(frame).unwrap(), &mut rec);
        }
        assert_eq!(
            rec.calls,
            vec![
                "connected:Connected to Market Query AI",
                "processing",
                "response:<p>hi</p>",
                "error:boom",
            ]
        );
    }
}
