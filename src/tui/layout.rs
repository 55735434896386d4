//! Two-pane layout: conversation sidebar and chat.
//!
//! ```text
//! ┌─ LLM Council ──────────┐┌─ Chat ──────────────────────────┐
//! │ + New Conversation (^N)││                                 │
//! │ Today                  ││  You                            │
//! │ > Why is the sky blue? ││  ...                            │
//! │   10:42 · 2 msgs       ││  LLM Council                    │
//! │ Older                  ││  Stage 1: Individual Responses  │
//! │   ...                  │├─ Message ───────────────────────┤
//! │                        ││ Ask your question...            │
//! └────────────────────────┘└─────────────────────────────────┘
//!  [idle]  [Conversations: 3]  [Chat]  Tab:Focus  ^N:New  ^C:Quit
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::conversation::grouping::{format_time_of_day, sidebar_rows, SidebarRow};
use crate::conversation::ConversationDetail;
use crate::pipeline::{plan_message, MessagePlan};

use super::app::{Focus, TuiApp};
use super::markdown::render_markdown;
use super::stages::{loading_line, render_block};
use super::suggestions::SUGGESTIONS;

const SIDEBAR_WIDTH: u16 = 32;
const INPUT_MAX_HEIGHT: u16 = 8;

pub const INPUT_PLACEHOLDER: &str = "Ask your question... (Shift+Enter for new line, Enter to send)";

/// Draw the full TUI layout.
pub fn draw(f: &mut Frame, app: &mut TuiApp) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // panes
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(outer[0]);

    draw_sidebar(f, app, panes[0]);

    let input_height = if app.input_visible() {
        let lines = app.input.content().split('\n').count() as u16;
        (lines + 2).clamp(3, INPUT_MAX_HEIGHT)
    } else {
        0
    };
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(input_height)])
        .split(panes[1]);

    draw_chat(f, app, right[0]);
    if input_height > 0 {
        draw_input(f, app, right[1]);
    }
    draw_status(f, app, outer[1]);
}

fn border_style(app: &TuiApp, pane: Focus) -> Style {
    if app.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Truncate to `max` display columns, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn draw_sidebar(f: &mut Frame, app: &TuiApp, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " LLM Council ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Sidebar));
    let text_width = area.width.saturating_sub(4) as usize;

    let mut items = vec![ListItem::new(Line::from(Span::styled(
        "+ New Conversation (^N)",
        Style::default().fg(Color::Green),
    )))];

    if app.snapshot.conversations.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No conversations yet",
            Style::default().fg(Color::DarkGray),
        ))));
        f.render_widget(List::new(items).block(block), area);
        return;
    }

    let current = app.snapshot.current_conversation_id.as_deref();
    let tz = app.now.timezone();
    let mut cursor_row = 0;
    let mut conv_index = 0;
    for row in sidebar_rows(&app.snapshot.conversations, &app.now) {
        match row {
            SidebarRow::Header(group) => {
                items.push(ListItem::new(Line::from(Span::styled(
                    group.label(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                ))));
            }
            SidebarRow::Conversation(c) => {
                let is_cursor = app.focus == Focus::Sidebar && conv_index == app.sidebar_selected;
                if conv_index == app.sidebar_selected {
                    cursor_row = items.len();
                }
                let style = if current == Some(c.id.as_str()) {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let prefix = if is_cursor { "> " } else { "  " };
                let meta = format!(
                    "{} · {} msgs",
                    format_time_of_day(&c.created_at, &tz),
                    c.message_count
                );
                items.push(ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(prefix, style),
                        Span::styled(truncate(c.display_title(), text_width), style),
                    ]),
                    Line::from(Span::styled(
                        format!("  {meta}"),
                        Style::default().fg(Color::DarkGray),
                    )),
                ]));
                conv_index += 1;
            }
        }
    }

    let mut state = ListState::default().with_selected(Some(cursor_row));
    f.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

/// Every line of the chat pane, before wrapping and scrolling.
pub fn chat_lines(app: &TuiApp) -> Vec<Line<'static>> {
    match &app.snapshot.conversation {
        None => empty_state(
            app,
            "Welcome to LLM Council",
            "Several models answer, rank each other anonymously, and a chairman synthesizes the result. Pick a prompt to start a new conversation.",
        ),
        Some(c) if c.messages.is_empty() => empty_state(
            app,
            "Start a conversation",
            "Ask a question to consult the LLM Council",
        ),
        Some(c) => message_lines(app, c),
    }
}

fn empty_state(app: &TuiApp, heading: &str, subtitle: &str) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            heading.to_string(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            subtitle.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    for (i, s) in SUGGESTIONS.iter().enumerate() {
        let selected = i == app.suggestion_selected;
        let (prefix, title_style) = if selected && app.focus == Focus::Chat {
            (
                "> ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().add_modifier(Modifier::BOLD))
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, title_style),
            Span::styled(s.title, title_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", s.text),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "\u{2191}\u{2193}:Choose  Enter:Ask",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn message_lines(app: &TuiApp, conversation: &ConversationDetail) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in &conversation.messages {
        match plan_message(message) {
            MessagePlan::User { content } => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "You",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markdown(content));
            }
            MessagePlan::Assistant(plan) => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "LLM Council",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )));
                for (i, block) in plan.iter().enumerate() {
                    if i > 0 {
                        lines.push(Line::from(""));
                    }
                    lines.extend(render_block(block, app.spinner_frame));
                }
            }
            MessagePlan::Unrenderable => {}
        }
    }

    if app.is_loading() {
        lines.push(Line::from(""));
        lines.extend(loading_line("Consulting the council...", app.spinner_frame));
    }
    lines
}

fn draw_chat(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    let title = app
        .snapshot
        .conversation
        .as_ref()
        .map(|c| format!(" {} ", c.display_title()))
        .unwrap_or_else(|| " Chat ".into());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Chat));

    let lines = chat_lines(app);

    // Clamp scroll so we never scroll past content. Each line may wrap
    // into several rows; count in u32 so long answers cannot overflow.
    let inner_height = area.height.saturating_sub(2) as u32;
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let total_lines: u32 = lines
        .iter()
        .map(|line| {
            let width: usize = line.spans.iter().map(|s| s.content.width()).sum();
            if width == 0 {
                1u32
            } else {
                width.div_ceil(inner_width) as u32
            }
        })
        .sum();
    let max_scroll = total_lines.saturating_sub(inner_height);
    let max_scroll_u16 = max_scroll.min(u16::MAX as u32) as u16;
    let scroll = if app.message_auto_scroll {
        max_scroll_u16
    } else {
        app.message_scroll.min(max_scroll_u16)
    };
    // Write the clamped value back so up/down keys respond immediately.
    app.message_scroll = scroll;
    app.viewport_height = inner_height.min(u16::MAX as u32) as u16;

    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(para, area);

    if total_lines > inner_height {
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll_u16 as usize).position(scroll as usize);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            area,
            &mut scrollbar_state,
        );
    }
}

fn draw_input(f: &mut Frame, app: &TuiApp, area: Rect) {
    let enabled = app.input_enabled();
    let (title, border) = if enabled {
        (" Message ", border_style(app, Focus::Input))
    } else {
        (" Waiting for the council ", Style::default().fg(Color::DarkGray))
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);

    let text_style = if enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let lines: Vec<Line> = if app.input.content().is_empty() {
        vec![Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.input
            .content()
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), text_style)))
            .collect()
    };

    let (line, col) = app.input.cursor_line_col();
    let visible = inner.height.max(1) as usize;
    let scroll = line.saturating_sub(visible - 1);

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((scroll.min(u16::MAX as usize) as u16, 0)),
        area,
    );

    if enabled && app.focus == Focus::Input {
        let cursor_line = app.input.content().split('\n').nth(line).unwrap_or("");
        let before: String = cursor_line.chars().take(col).collect();
        let x = inner.x + (before.width() as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (line - scroll) as u16;
        f.set_cursor_position(Position::new(x, y));
    }
}

fn draw_status(f: &mut Frame, app: &TuiApp, area: Rect) {
    let status_text = if let Some(err) = &app.last_error {
        Span::styled(format!("error: {err}"), Style::default().fg(Color::Red))
    } else if app.is_loading() {
        Span::styled("deliberating...", Style::default().fg(Color::Yellow))
    } else if app.is_busy() {
        Span::styled(
            "council busy in another conversation",
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled("idle", Style::default().fg(Color::Green))
    };

    let focus_name = match app.focus {
        Focus::Sidebar => "Sidebar",
        Focus::Chat => "Chat",
        Focus::Input => "Input",
    };

    let shortcuts = match app.focus {
        Focus::Sidebar => "j/k:Move  Enter:Open  n:New  Tab:Focus  ^C:Quit",
        Focus::Chat if app.showing_suggestions() => "\u{2191}\u{2193}:Choose  Enter:Ask  Tab:Focus  ^N:New  ^C:Quit",
        Focus::Chat => "\u{2191}\u{2193}:Scroll  PgUp/PgDn  End:Follow  Tab:Focus  ^N:New  ^C:Quit",
        Focus::Input => "Enter:Send  Shift+Enter:Newline  Esc:Clear  Tab:Focus  ^C:Quit",
    };

    let spans = vec![
        Span::styled(" [", Style::default().fg(Color::DarkGray)),
        status_text,
        Span::styled("]", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(
            format!("[Conversations: {}]", app.snapshot.conversations.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{focus_name}]"),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(shortcuts, Style::default().fg(Color::DarkGray)),
    ];

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
