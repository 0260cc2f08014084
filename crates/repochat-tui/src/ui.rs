use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use repochat_core::ConversationPhase;

use crate::app::App;

const URL_PLACEHOLDER: &str = "https://github.com/username/repository";
const EXAMPLE_REPOS: [&str; 3] = [
    "https://github.com/facebook/react",
    "https://github.com/rust-lang/rust",
    "https://github.com/tokio-rs/tokio",
];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.conversation().phase() {
        ConversationPhase::Intro | ConversationPhase::Analyzing => {
            app.chat_area = None;
            render_intro_screen(app, frame, body_area);
        }
        ConversationPhase::Ready => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let repo = app
        .conversation()
        .repo()
        .map(|r| format!(" [{}]", r.slug()))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(" GitHub Repository Analyzer ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(repo, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let conv = app.conversation();
    let (mode_text, mode_style) = if conv.is_loading() {
        (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" INPUT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = match conv.phase() {
        ConversationPhase::Intro if conv.is_loading() => " Ctrl+N: cancel | Esc: quit",
        ConversationPhase::Intro => " Enter: analyze | Esc: quit",
        ConversationPhase::Analyzing => " Ctrl+N: cancel | Esc: quit",
        ConversationPhase::Ready => {
            " Enter: ask | PgUp/PgDn: scroll | Ctrl+N: new analysis | Esc: quit"
        }
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("  {}", app.endpoint),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]))
    .style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_intro_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [_, content_area, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Max(72),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, title_area, input_area, status_area, examples_area, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Length(EXAMPLE_REPOS.len() as u16 + 1),
        Constraint::Fill(1),
    ])
    .areas(content_area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Analyze any GitHub Repository",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Paste a repository URL, then ask questions about its code.",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, title_area);

    render_input(app, frame, input_area, " Repository URL ", URL_PLACEHOLDER);

    let conv = app.conversation();
    let status = if conv.is_loading() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Line::from(Span::styled(
            format!("Analyzing repository{}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(notice) = conv.notice() {
        Line::from(Span::styled(notice.to_string(), Style::default().fg(Color::Red)))
    } else {
        Line::default()
    };
    frame.render_widget(
        Paragraph::new(status).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        status_area,
    );

    let mut examples = vec![Line::from(Span::styled(
        "Examples:",
        Style::default().fg(Color::DarkGray),
    ))];
    examples.extend(EXAMPLE_REPOS.iter().map(|url| {
        Line::from(Span::styled(format!("  {}", url), Style::default().fg(Color::DarkGray)))
    }));
    frame.render_widget(Paragraph::new(examples), examples_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area for mouse hit-testing and its inner size for scrolling
    app.chat_area = Some(chat_area);
    let resized = app.chat_height != chat_area.height.saturating_sub(2)
        || app.chat_width != chat_area.width.saturating_sub(2);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    if resized && app.follow_tail {
        app.scroll_chat_to_bottom();
    }

    let title = app
        .conversation()
        .repo()
        .map(|r| format!(" {} ", r.slug()))
        .unwrap_or_default();
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let lines = app.chat_lines();
    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(
        app,
        frame,
        input_area,
        " Ask about this repository ",
        "What does this project do?",
    );
}

/// Single-line input box with horizontal scrolling. Rendered dimmed and
/// without a cursor while a request is in flight.
fn render_input(app: &App, frame: &mut Frame, area: Rect, title: &str, placeholder: &str) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input().is_empty() {
        Paragraph::new(Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = app
            .input()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let fg = if enabled { Color::Cyan } else { Color::DarkGray };
        Paragraph::new(visible_text).style(Style::default().fg(fg))
    };

    frame.render_widget(input.block(block), area);

    if enabled {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use repochat_core::{AnalyzerClient, Controller, HttpAnalyzerApi, PollSchedule};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let api = HttpAnalyzerApi::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Controller::new(AnalyzerClient::new(Arc::new(api))), "http://127.0.0.1:9")
    }

    fn screen_text(app: &mut App) -> String {
        screen_text_sized(app, 100, 30)
    }

    fn screen_text_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_intro_screen() {
        let mut app = app();
        let text = screen_text(&mut app);
        assert!(text.contains("GitHub Repository Analyzer"));
        assert!(text.contains("Analyze any GitHub Repository"));
        assert!(text.contains(URL_PLACEHOLDER));
        assert!(app.chat_area.is_none());
    }

    #[tokio::test]
    async fn test_analyzing_indicator() {
        let mut app = app();
        app.insert_str("https://github.com/facebook/react");
        assert!(app.submit_input());

        let text = screen_text(&mut app);
        assert!(text.contains("Analyzing repository."));
        assert!(text.contains("[facebook/react]"));
    }

    /// Service that is ready at once and answers every query with `answer`.
    async fn spawn_service(answer: String) -> String {
        let router = Router::new()
            .route("/analyzer", post(|| async { Json(json!({ "analyzer_id": "a1" })) }))
            .route("/analyzer/{id}", get(|| async { Json(json!({ "progress": "READY" })) }))
            .route("/query", post(|| async { Json(json!({ "query_id": "q1" })) }))
            .route(
                "/query/{id}",
                get(move || {
                    let answer = answer.clone();
                    async move { Json(json!({ "progress": "DONE", "result": { "answer": answer } })) }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_end_of_long_wrapped_answer_is_reachable() {
        // Word wrapping leaves ragged line ends, so these paragraphs take
        // more rows than their character count suggests.
        let paragraph = "The quick brown fox jumps over the lazy dog. ".repeat(8);
        let answer = format!("{}\n\nENDMARK", vec![paragraph.trim_end(); 6].join("\n\n"));
        let endpoint = spawn_service(answer).await;

        let fast = PollSchedule { interval: Duration::from_millis(10), max_attempts: 5 };
        let api = HttpAnalyzerApi::new(&endpoint, Duration::from_secs(5)).unwrap();
        let client = AnalyzerClient::new(Arc::new(api)).with_schedules(fast, fast);
        let mut app = App::new(Controller::new(client), endpoint);

        app.insert_str("https://github.com/facebook/react");
        assert!(app.submit_input());
        tokio::time::timeout(Duration::from_secs(10), async {
            while app.conversation().phase() != ConversationPhase::Ready
                || app.conversation().is_loading()
            {
                app.controller.next_update().await;
            }
        })
        .await
        .unwrap();
        app.sync_with_conversation();

        let text = screen_text_sized(&mut app, 40, 16);
        assert!(text.contains("ENDMARK"), "tail not shown:\n{}", text);

        app.scroll_up(10_000);
        let text = screen_text_sized(&mut app, 40, 16);
        assert!(!text.contains("ENDMARK"));

        app.scroll_down(10_000);
        assert!(app.follow_tail);
        let text = screen_text_sized(&mut app, 40, 16);
        assert!(text.contains("ENDMARK"), "tail not reachable:\n{}", text);
    }
}
