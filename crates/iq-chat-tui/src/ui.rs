use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use iq_chat_core::{ChatMessage, ChatRole};
use crate::app::App;

const TITLE: &str = " IQ Agent ";
const SUBTITLE: &str = "Powered by Foundry IQ + Fabric IQ";
const PLACEHOLDER: &str = "Ask a question about your documents or data...";

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "You:",
        ChatRole::Assistant => "Agent:",
    }
}

fn push_message(lines: &mut Vec<Line<'static>>, msg: &ChatMessage) {
    lines.push(Line::from(Span::styled(role_label(msg.role), role_style(msg.role))));

    let body_style = match msg.role {
        ChatRole::User => Style::default().fg(Color::Cyan),
        ChatRole::Assistant => Style::default(),
    };
    if msg.content.is_empty() {
        lines.push(Line::default());
    }
    for line in msg.content.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), body_style)));
    }

    let sources = msg.sources();
    if !sources.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources:",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        for citation in sources {
            lines.push(Line::from(Span::styled(
                format!("  • {}", citation.source),
                Style::default().fg(Color::Magenta),
            )));
            if !citation.quote.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    \"{}\"", citation.quote),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines.push(Line::default());
}

/// Lines for the whole transcript
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for msg in app.messages() {
        push_message(&mut lines, msg);
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            role_label(ChatRole::Assistant),
            role_style(ChatRole::Assistant),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(TITLE, Style::default().fg(Color::Cyan).bold()),
        Span::styled(SUBTITLE, Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::Black)),
    ];
    if let Some(id) = app.conversation.conversation_id() {
        spans.push(Span::styled(format!("  [{}]", id), Style::default().fg(Color::Black)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_text = if app.messages().is_empty() && !app.is_loading() {
        Text::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(transcript_lines(app))
    };
    let chat = Paragraph::new(chat_text).wrap(Wrap { trim: false });

    // Row count measured without the block so borders are not included
    app.transcript_rows = chat.line_count(app.chat_width);
    if app.follow_bottom {
        app.scroll_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Chat ({}) ", app.messages().len()));

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let border_color = if loading { Color::DarkGray } else { Color::Yellow };
    let title = if loading { " Waiting for reply... " } else { " Message " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor in view by scrolling the input horizontally
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let input = Paragraph::new(visible_text).style(text_style).block(input_block);
    frame.render_widget(input, area);

    if !loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let (mode_text, mode_style) = if app.is_loading() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let send_style = if app.can_submit() { label_style } else { disabled_style };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::raw(" "),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", send_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];
    if !app.follow_bottom {
        spans.push(Span::styled(" [scrolled] ", Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
