//! 把服务端返回的 HTML 片段转成可在终端显示的纯文本

use crate::core::ClientError;

/// 渲染宽度下限，过窄时 html2text 无法排版表格
const MIN_RENDER_WIDTH: usize = 20;

pub fn render_markup(markup: &str, width: usize) -> Result<String, ClientError> {
    let text = html2text::from_read(markup.as_bytes(), width.max(MIN_RENDER_WIDTH))
        .map_err(|e| ClientError::Render(e.to_string()))?;
    Ok(text.trim_end().to_string())
}
