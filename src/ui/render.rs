//! 界面渲染
//!
//! 自上而下：状态栏（圆点 + 文本）、示例按钮、输入框、响应区。响应区按 UiMode 只显示一个面板：
//! 空闲提示、加载指示、响应（含工具标签）或错误（含重试提示）。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::core::{ConnectionStatus, StatusKind, UiMode, UiState};

/// 最多显示的示例按钮数（对应 F1..F4）
const MAX_EXAMPLES: usize = 4;

/// 状态圆点颜色：已连接绿色，出错/断开红色，其余（连接中）黄色
pub fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Connected => Color::Green,
        StatusKind::Error | StatusKind::Disconnected => Color::Red,
        StatusKind::Connecting => Color::Yellow,
    }
}

/// 每个工具一个小标签
pub fn tool_tags(tools: &[String]) -> Line<'static> {
    let mut spans = Vec::with_capacity(tools.len() * 2);
    for tool in tools {
        spans.push(Span::styled(
            format!(" {} ", tool),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// 响应正文在给定面板（含边框）内折行后可滚动的最大行数
pub fn response_max_scroll(text: &str, area: Rect) -> usize {
    let inner_width = area.width.saturating_sub(2);
    if inner_width == 0 {
        return 0;
    }
    let rows = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .line_count(inner_width);
    rows.saturating_sub(area.height.saturating_sub(2) as usize)
}

/// 绘制一帧；显示响应时返回本帧的最大滚动行数
pub fn draw(
    f: &mut Frame,
    state: &UiState,
    status: &ConnectionStatus,
    examples: &[String],
) -> Option<usize> {
    let example_count = examples.len().min(MAX_EXAMPLES) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(example_count + 2),
            Constraint::Length(5),
            Constraint::Min(5),
        ])
        .split(f.area());

    draw_status(f, chunks[0], status);
    draw_examples(f, chunks[1], examples);
    draw_input(f, chunks[2], state);

    match state.mode {
        UiMode::Idle => draw_idle(f, chunks[3]),
        UiMode::Loading => draw_loading(f, chunks[3], state),
        UiMode::ShowingResponse => return draw_response(f, chunks[3], state),
        UiMode::ShowingError => draw_error(f, chunks[3], state),
    }
    None
}

fn draw_status(f: &mut Frame, area: Rect, status: &ConnectionStatus) {
    let line = Line::from(vec![
        Span::styled(" ● ", Style::default().fg(status_color(status.kind))),
        Span::raw(status.text.clone()),
        Span::styled(
            "   Enter send │ Shift+Enter newline │ Ctrl+L clear │ Ctrl+R retry │ Ctrl+Q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_examples(f: &mut Frame, area: Rect, examples: &[String]) {
    let lines: Vec<Line> = examples
        .iter()
        .take(MAX_EXAMPLES)
        .enumerate()
        .map(|(i, example)| {
            Line::from(vec![
                Span::styled(
                    format!("[F{}] ", i + 1),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(example.clone()),
            ])
        })
        .collect();
    let block = Block::default()
        .title(" Examples ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_input(f: &mut Frame, area: Rect, state: &UiState) {
    let title = if state.submit_enabled {
        " Query "
    } else {
        " Waiting for response… "
    };
    let border = if state.input_focused {
        Color::Blue
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let input = Paragraph::new(state.input.as_str())
        .block(block)
        .wrap(Wrap { trim: false })
        .style(if state.submit_enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });
    f.render_widget(input, area);
}

fn draw_idle(f: &mut Frame, area: Rect) {
    let hint = Paragraph::new("Ask a question about the markets, or pick an example.")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(hint, area);
}

fn draw_loading(f: &mut Frame, area: Rect, state: &UiState) {
    let text = Line::from(vec![
        Span::styled("⏳ ", Style::default().fg(Color::Yellow)),
        Span::raw(state.loading_text.clone()),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_response(f: &mut Frame, area: Rect, state: &UiState) -> Option<usize> {
    let response = state.response.as_ref()?;

    let (body_area, tools_area) = if state.tools_visible() {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);
        (parts[0], Some(parts[1]))
    } else {
        (area, None)
    };

    let title = format!(" Response · {} ", response.received_at.format("%H:%M:%S"));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let max_scroll = response_max_scroll(&response.text, body_area);
    let scroll = u16::try_from(state.response_scroll.min(max_scroll)).unwrap_or(u16::MAX);
    let body = Paragraph::new(response.text.as_str())
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(body, body_area);

    if let Some(tools_area) = tools_area {
        let block = Block::default()
            .title(" Tools Used ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(Paragraph::new(tool_tags(&response.tools)).block(block), tools_area);
    }
    Some(max_scroll)
}

fn draw_error(f: &mut Frame, area: Rect, state: &UiState) {
    let message = state.error_message.clone().unwrap_or_default();
    let text = Text::from(vec![
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+R to retry",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
