//! Rendering routines for the csvchat TUI.

use crate::app::{App, Focus};
use crate::theme::{Palette, palette};
use chrono::Utc;
use csvchat_core::format_time_ago;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    Wrap,
};

const SIDEBAR_WIDTH: u16 = 40;
const SLASH_PALETTE_HEIGHT: u16 = 11;
const TYPING_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    app.mark_mounted();
    let colors = palette(app.chrome.theme);
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.surface)),
        area,
    );

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let sidebar_open = app.chrome.sidebar_open;
    if sidebar_open && !app.chrome.is_mobile {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(root[0]);
        draw_sidebar(frame, app, colors, cols[0]);
        draw_main(frame, app, colors, cols[1]);
    } else {
        draw_main(frame, app, colors, root[0]);
        if sidebar_open {
            // Compact layout: the sidebar overlays the thread.
            let overlay = Rect {
                width: SIDEBAR_WIDTH.min(root[0].width),
                ..root[0]
            };
            frame.render_widget(Clear, overlay);
            draw_sidebar(frame, app, colors, overlay);
        }
    }
    draw_status_bar(frame, app, colors, root[1]);
}

/// Draw the brand, the new-conversation hint, and the conversation list.
fn draw_sidebar(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    let focused = app.focus == Focus::Sidebar;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused {
            colors.border_active
        } else {
            colors.border
        }))
        .style(Style::default().bg(colors.surface))
        .title(Span::styled(
            " Conversations ",
            Style::default().fg(colors.text_muted),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                " csvchat",
                Style::default()
                    .fg(colors.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" v{VERSION}"), Style::default().fg(colors.text_muted)),
        ]),
        Line::from(vec![
            Span::styled(" Ctrl+N", Style::default().fg(colors.secondary)),
            Span::styled(" New conversation", Style::default().fg(colors.text)),
        ]),
        Line::from(""),
    ];

    if app.conversations().is_empty() {
        lines.push(Line::from(Span::styled(
            " No conversations yet.",
            Style::default().fg(colors.text_muted),
        )));
    }

    let now = Utc::now();
    let active_id = app.chat.conversations.active_id();
    let title_width = inner.width.saturating_sub(9) as usize;
    for (idx, conversation) in app.conversations().iter().enumerate() {
        let is_active = active_id == Some(conversation.id.as_str());
        let is_selected = focused && idx == app.selected;
        let marker = if is_selected { ">" } else { " " };
        let style = if is_active {
            Style::default()
                .fg(colors.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        let style = if is_selected {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        let title: String = conversation.title.chars().take(title_width).collect();
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} "), style),
            Span::styled(format!("{title:<title_width$}"), style),
            Span::styled(
                format!(" {:>4}", format_time_ago(conversation.last_message, now)),
                Style::default().fg(colors.text_muted),
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the header, the thread or welcome screen, and the composer.
fn draw_main(frame: &mut Frame<'_>, app: &mut App, colors: &Palette, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // thread
            Constraint::Length(1), // typing indicator
            Constraint::Length(3), // composer
        ])
        .split(area);

    draw_header(frame, app, colors, rows[0]);
    if app.active().is_some() {
        draw_thread(frame, app, colors, rows[1]);
    } else {
        draw_welcome(frame, app, colors, rows[1]);
    }
    if app.show_slash_commands {
        draw_slash_palette(frame, colors, rows[1]);
    }
    draw_typing(frame, app, colors, rows[2]);
    draw_composer(frame, app, colors, rows[3]);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    let title = app
        .active()
        .map(|conversation| conversation.title.clone())
        .unwrap_or_else(|| "New conversation".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border));
    let line = Line::from(vec![
        Span::styled(
            format!(" {title}"),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if app.remote { "  api" } else { "  simulated" },
            Style::default().fg(colors.text_muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_welcome(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    let files = |path: Option<&std::path::Path>| {
        path.and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "not set".to_string())
    };
    let lines = vec![
        Line::from(Span::styled(
            format!("hello {}", app.user_name),
            Style::default()
                .fg(colors.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Ask a question about your payers and transactions.",
            Style::default().fg(colors.text),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("payers ", Style::default().fg(colors.text_muted)),
            Span::styled(
                files(app.uploads.payers.as_deref()),
                Style::default().fg(colors.secondary),
            ),
            Span::styled("  transactions ", Style::default().fg(colors.text_muted)),
            Span::styled(
                files(app.uploads.transactions.as_deref()),
                Style::default().fg(colors.secondary),
            ),
        ]),
    ];
    let pad_top = area.height.saturating_sub(lines.len() as u16) / 2;
    let centered = Rect {
        y: area.y + pad_top,
        height: area.height.saturating_sub(pad_top),
        ..area
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(ratatui::layout::Alignment::Center),
        centered,
    );
}

/// Draw the active thread with border and scrollbar.
fn draw_thread(frame: &mut Frame<'_>, app: &mut App, colors: &Palette, area: Rect) {
    let lines = app.render_lines(colors);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1);
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let thread_inner = Rect {
        width: inner.width.saturating_sub(1),
        ..inner
    };
    let thread = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(thread, thread_inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(colors.border))
                .thumb_style(Style::default().fg(colors.text_muted)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

fn draw_typing(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    if !app.chat.loading {
        return;
    }
    let label = if app.chat.api_loading {
        " analyzing"
    } else {
        " typing"
    };
    let dots = TYPING_FRAMES[(app.ticks % TYPING_FRAMES.len() as u64) as usize];
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("{label}{dots}"),
            Style::default()
                .fg(colors.text_muted)
                .add_modifier(Modifier::ITALIC),
        ))),
        area,
    );
}

/// Draw the composer with border and cursor.
fn draw_composer(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    let is_active = app.focus == Focus::Composer;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if is_active {
            colors.border_active
        } else {
            colors.border
        }))
        .title(Span::styled(
            " Message ",
            Style::default().fg(if is_active {
                colors.secondary
            } else {
                colors.text_muted
            }),
        ));
    let inner = block.inner(area);

    let prompt_style = Style::default()
        .fg(colors.primary)
        .add_modifier(Modifier::BOLD);
    let input_text = if app.chat.input.is_empty() {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(
                "Ask about your CSV files...",
                Style::default().fg(colors.text_muted),
            ),
        ])
    } else {
        let (visible, _) = composer_tail(&app.chat.input, inner.width);
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(visible, Style::default().fg(colors.text)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    if is_active {
        let (_, offset) = composer_tail(&app.chat.input, inner.width);
        let x = inner
            .x
            .saturating_add(1)
            .saturating_add(offset)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}

/// The end of `input` that fits a composer `width` cells wide, leaving room
/// for the leading space and the cursor, plus the cursor offset into it.
fn composer_tail(input: &str, width: u16) -> (&str, u16) {
    let room = usize::from(width.saturating_sub(2));
    let count = input.chars().count();
    let skip = count.saturating_sub(room);
    let start = input
        .char_indices()
        .nth(skip)
        .map_or(input.len(), |(index, _)| index);
    let shown = count - skip;
    (&input[start..], u16::try_from(shown).unwrap_or(u16::MAX))
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, colors: &Palette, area: Rect) {
    let status_color = match app.status.as_str() {
        "idle" => colors.text_muted,
        status if status.starts_with("reply failed") => colors.error,
        _ => colors.primary,
    };

    let key = Style::default().fg(colors.text_muted);
    let label = Style::default().fg(colors.border);
    let shortcuts = vec![
        Span::styled(" Esc", key),
        Span::styled(" quit", label),
        Span::styled("  Ctrl+N", key),
        Span::styled(" new", label),
        Span::styled("  Ctrl+B", key),
        Span::styled(" sidebar", label),
        Span::styled("  Tab", key),
        Span::styled(" focus", label),
        Span::styled("  Ctrl+T", key),
        Span::styled(" theme", label),
        Span::styled("  /", key),
        Span::styled(" commands", label),
    ];

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(shortcuts)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

fn draw_slash_palette(frame: &mut Frame<'_>, colors: &Palette, area: Rect) {
    let cmd_style = Style::default()
        .fg(colors.primary)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(colors.text_muted);
    let entries = [
        ("/new", "Start a new conversation"),
        ("/delete", "Delete the open conversation"),
        ("/payers <path>", "Select the payers CSV"),
        ("/transactions <path>", "Select the transactions CSV"),
        ("/files", "Show the selected files"),
    ];

    let mut lines = vec![Line::from("")];
    for (command, description) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("  {command:<22}"), cmd_style),
            Span::styled(description, desc_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Esc to close",
        desc_style.add_modifier(Modifier::ITALIC),
    )));

    let height = SLASH_PALETTE_HEIGHT
        .min(area.height)
        .min(lines.len() as u16 + 2);
    let palette_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(height),
        width: area.width.saturating_sub(2).min(56),
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.primary))
        .title(Span::styled(
            " Commands ",
            Style::default()
                .fg(colors.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(colors.surface));

    frame.render_widget(Clear, palette_area);
    frame.render_widget(Paragraph::new(lines).block(block), palette_area);
}
