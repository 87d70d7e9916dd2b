//! Application state for the csvchat TUI.

use crate::theme::Palette;
use chrono::{DateTime, Local, Utc};
use csvchat_config::{CsvChatConfig, FilesConfig};
use csvchat_core::{
    AssistantView, ChatState, Conversation, ConversationState, CoreError, PARSE_ERROR_TEXT,
    PendingReply, QueryResponse, Reply, Role, UiChrome, demo_conversations, find_active,
};
use log::{debug, info};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Composer,
}

/// Top-level application state for the TUI.
pub struct App {
    /// Conversation store, composer input, and loading flags.
    pub chat: ChatState,
    /// Sidebar, viewport, and theme flags.
    pub chrome: UiChrome,
    pub focus: Focus,
    /// Highlighted row in the sidebar list.
    pub selected: usize,
    /// CSV files attached to remote queries.
    pub uploads: FilesConfig,
    /// Name shown in the welcome greeting.
    pub user_name: String,
    /// Status line text.
    pub status: String,
    /// Whether to show the slash command palette.
    pub show_slash_commands: bool,
    /// Terminals narrower than this use the compact layout.
    pub mobile_breakpoint: u16,
    /// Current scroll offset.
    pub scroll: u16,
    /// Whether to auto-scroll to the bottom.
    pub auto_scroll: bool,
    /// Maximum scroll offset for the thread view.
    pub chat_max_scroll: u16,
    /// Ticks since start; drives the typing indicator.
    pub ticks: u64,
    /// Replies come from the remote API.
    pub remote: bool,
}

impl App {
    /// Create application state from the loaded config.
    pub fn new(
        config: &CsvChatConfig,
        user_name: String,
        remote: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let conversations = if config.ui.seed_demo {
            ConversationState::new(demo_conversations(now))
        } else {
            ConversationState::default()
        };
        Self {
            chat: ChatState::new(conversations),
            chrome: UiChrome::default().with_theme(config.ui.theme),
            focus: Focus::Composer,
            selected: 0,
            uploads: config.files.clone(),
            user_name,
            status: "idle".to_string(),
            show_slash_commands: false,
            mobile_breakpoint: config.ui.mobile_breakpoint,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
            ticks: 0,
            remote,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        self.chat.conversations.conversations()
    }

    pub fn active(&self) -> Option<&Conversation> {
        find_active(&self.chat.conversations)
    }

    /// Apply a consuming chat transition in place.
    fn update_chat(&mut self, transition: impl FnOnce(ChatState) -> ChatState) {
        let chat = std::mem::take(&mut self.chat);
        self.chat = transition(chat);
    }

    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Record the composer contents as a user message.
    ///
    /// Returns `None` when the input is blank or a reply is outstanding.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Option<PendingReply> {
        if self.chat.loading {
            debug!("send ignored while loading");
            return None;
        }
        let content = self.chat.input.clone();
        let remote = self.remote;
        let chat = std::mem::take(&mut self.chat);
        let (chat, pending) = chat.begin_send(&content, remote, now);
        self.chat = chat;
        let pending = pending?;
        self.sync_selection();
        self.enable_auto_scroll();
        self.push_status(if remote { "querying" } else { "thinking" });
        Some(pending)
    }

    /// Record a finished reply.
    pub fn apply_reply(
        &mut self,
        pending: &PendingReply,
        outcome: Result<Reply, CoreError>,
        now: DateTime<Utc>,
    ) {
        match &outcome {
            Ok(_) => self.push_status("idle"),
            Err(err) => self.push_status(format!("reply failed: {err}")),
        }
        self.update_chat(|chat| chat.complete_send(pending, outcome, now));
        self.maybe_enable_auto_scroll();
    }

    /// Start a new chat; the conversation is created on first send.
    pub fn new_conversation(&mut self) {
        info!("new conversation started");
        self.update_chat(ChatState::create_new_conversation);
        self.chrome = self.chrome.close_sidebar_on_mobile();
        self.focus = Focus::Composer;
        self.reset_scroll();
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.conversations().len() {
            self.selected += 1;
        }
    }

    /// Open the highlighted conversation.
    pub fn open_selected(&mut self) {
        let Some(id) = self.conversations().get(self.selected).map(|c| c.id.clone()) else {
            return;
        };
        self.update_chat(|chat| chat.select_conversation(&id));
        self.chrome = self.chrome.close_sidebar_on_mobile();
        self.focus = Focus::Composer;
        self.reset_scroll();
    }

    /// Delete the highlighted conversation.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.conversations().get(self.selected).map(|c| c.id.clone()) else {
            return;
        };
        self.update_chat(|chat| chat.delete_conversation(&id));
        self.clamp_selection();
    }

    /// Delete the active conversation; false when nothing is active.
    pub fn delete_active(&mut self) -> bool {
        let Some(id) = self.chat.conversations.active_id().map(str::to_string) else {
            return false;
        };
        self.update_chat(|chat| chat.delete_conversation(&id));
        self.clamp_selection();
        true
    }

    pub fn toggle_sidebar(&mut self) {
        self.chrome = self.chrome.toggle_sidebar();
        if !self.chrome.sidebar_open {
            self.focus = Focus::Composer;
        }
    }

    /// Move focus between the sidebar and the composer.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Composer => {
                self.chrome = self.chrome.set_sidebar_open(true);
                self.sync_selection();
                Focus::Sidebar
            }
            Focus::Sidebar => Focus::Composer,
        };
    }

    pub fn toggle_theme(&mut self) {
        self.chrome = self.chrome.toggle_theme();
    }

    /// Re-run mobile detection after a resize.
    pub fn resize(&mut self, width: u16) {
        self.chrome = self.chrome.set_width(width, self.mobile_breakpoint);
        if !self.chrome.sidebar_open {
            self.focus = Focus::Composer;
        }
    }

    pub fn mark_mounted(&mut self) {
        if !self.chrome.mounted {
            debug!("first frame drawn");
            self.chrome = self.chrome.set_mounted(true);
        }
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    fn sync_selection(&mut self) {
        if let Some(active) = self.chat.conversations.active_id()
            && let Some(idx) = self.conversations().iter().position(|c| c.id == active)
        {
            self.selected = idx;
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.conversations().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn reset_scroll(&mut self) {
        self.scroll = 0;
        self.chat_max_scroll = 0;
        self.auto_scroll = true;
    }

    /// Scroll the thread view upward by a number of lines.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the thread view downward by a number of lines.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only when auto-scroll is on or the view was
    /// already pinned to the bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.scroll >= self.chat_max_scroll;
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
            self.auto_scroll = true;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn maybe_enable_auto_scroll(&mut self) {
        if self.auto_scroll {
            self.scroll = self.chat_max_scroll;
        }
    }

    /// Render the active thread into styled lines.
    pub fn render_lines(&self, palette: &Palette) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let Some(conversation) = self.active() else {
            return lines;
        };

        for (idx, message) in conversation.messages.iter().enumerate() {
            let (badge, badge_bg) = match message.role {
                Role::User => (" you ", palette.secondary),
                Role::Assistant => (" assistant ", palette.primary),
            };
            let time = message
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string();
            lines.push(Line::from(vec![
                Span::styled(
                    badge,
                    Style::default()
                        .fg(palette.badge_text)
                        .bg(badge_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {time}"), Style::default().fg(palette.text_muted)),
            ]));

            match message.role {
                Role::User => push_text(&mut lines, &message.content, palette.text),
                Role::Assistant => match AssistantView::classify(&message.content) {
                    AssistantView::Text(text) => push_text(&mut lines, &text, palette.text),
                    AssistantView::Table(response) => {
                        push_response(&mut lines, &response, palette)
                    }
                    AssistantView::ParseError => lines.push(Line::from(Span::styled(
                        format!(" {PARSE_ERROR_TEXT}"),
                        Style::default().fg(palette.error),
                    ))),
                },
            }

            if idx + 1 < conversation.messages.len() {
                lines.push(Line::from(Span::raw("")));
            }
        }

        // Trailing padding keeps the last message fully scrollable into view.
        lines.push(Line::from(Span::raw("")));
        lines
    }
}

fn push_text(lines: &mut Vec<Line<'static>>, content: &str, color: ratatui::style::Color) {
    for line in content.lines() {
        lines.push(Line::from(Span::styled(
            format!(" {line}"),
            Style::default().fg(color),
        )));
    }
}

fn push_response(lines: &mut Vec<Line<'static>>, response: &QueryResponse, palette: &Palette) {
    if let Some(summary) = response.summary_text() {
        lines.push(Line::from(Span::styled(
            format!(" {summary}"),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(explanation) = response.explanation_text() {
        push_text(lines, &explanation, palette.text_muted);
    }
    if let Some(table) = response.table() {
        let widths: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                table
                    .rows
                    .iter()
                    .map(|row| row[col].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let header: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, width)| format!("{name:<width$}"))
            .collect();
        lines.push(Line::from(Span::styled(
            format!(" {}", header.join(" │ ")),
            Style::default()
                .fg(palette.secondary)
                .add_modifier(Modifier::BOLD),
        )));
        let rule: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
        lines.push(Line::from(Span::styled(
            format!(" {}", rule.join("─┼─")),
            Style::default().fg(palette.border),
        )));
        for row in &table.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect();
            lines.push(Line::from(Span::styled(
                format!(" {}", cells.join(" │ ")),
                Style::default().fg(palette.text),
            )));
        }
    }
    if let Some(url) = response.download_text() {
        lines.push(Line::from(vec![
            Span::styled(" download ", Style::default().fg(palette.text_muted)),
            Span::styled(
                url,
                Style::default()
                    .fg(palette.secondary)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::{App, Focus};
    use crate::theme::palette;
    use chrono::{TimeZone, Utc};
    use csvchat_config::{CsvChatConfig, ThemeMode, UiConfig};
    use csvchat_core::{API_ERROR_PLACEHOLDER, CoreError, Reply};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app(seed_demo: bool) -> App {
        let config = CsvChatConfig::builder()
            .ui(UiConfig {
                seed_demo,
                ..UiConfig::default()
            })
            .build();
        App::new(&config, "tester".to_string(), true, Utc::now())
    }

    fn rendered(app: &App) -> Vec<String> {
        app.render_lines(palette(ThemeMode::Dark))
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut app = app(false);
        app.chat.input = "   ".to_string();
        assert!(app.submit(Utc::now()).is_none());
        assert!(app.conversations().is_empty());
        assert_eq!(app.chat.input, "   ");
    }

    #[test]
    fn submit_while_loading_is_ignored() {
        let mut app = app(false);
        app.chat.input = "first".to_string();
        assert!(app.submit(Utc::now()).is_some());
        app.chat.input = "second".to_string();
        assert!(app.submit(Utc::now()).is_none());
        assert_eq!(app.chat.input, "second");
        assert_eq!(app.active().map(|c| c.messages.len()), Some(1));
    }

    #[test]
    fn reply_failure_records_placeholder_and_status() {
        let mut app = app(false);
        app.chat.input = "Show totals".to_string();
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let pending = app.submit(now).expect("pending");
        assert!(app.chat.api_loading);
        app.apply_reply(&pending, Err(CoreError::MissingUpload("payers")), now);
        let active = app.active().expect("active");
        assert_eq!(active.messages[1].content, API_ERROR_PLACEHOLDER);
        assert!(!app.chat.loading);
        assert!(app.status.contains("no payers file selected"));
    }

    #[test]
    fn sidebar_navigation_opens_and_deletes() {
        let mut app = app(true);
        assert_eq!(app.conversations().len(), 2);
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Sidebar);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 1);
        app.open_selected();
        assert_eq!(app.chat.conversations.active_id(), Some("2"));
        assert_eq!(app.focus, Focus::Composer);

        app.delete_selected();
        assert!(app.chat.conversations.is_new_chat());
        assert_eq!(app.selected, 0);
        assert!(!app.delete_active());
    }

    #[test]
    fn narrow_terminal_closes_sidebar() {
        let mut app = app(false);
        app.toggle_focus();
        app.resize(60);
        assert!(app.chrome.is_mobile);
        assert!(!app.chrome.sidebar_open);
        assert_eq!(app.focus, Focus::Composer);
        app.resize(140);
        assert!(!app.chrome.is_mobile);
    }

    #[test]
    fn table_replies_render_columns() {
        let mut app = app(false);
        app.chat.input = "Show totals".to_string();
        let now = Utc::now();
        let pending = app.submit(now).expect("pending");
        let body = json!({
            "summary": "Total is 42",
            "result": [{"name": "Acme", "total": 42}],
            "downloadUrl": "https://example.test/totals.csv"
        });
        app.apply_reply(&pending, Ok(Reply::Json(body)), now);

        let lines = rendered(&app);
        assert!(lines.iter().any(|line| line == " Total is 42"));
        assert!(lines.iter().any(|line| line == " name │ total"));
        assert!(lines.iter().any(|line| line == " Acme │ 42   "));
        assert!(
            lines
                .iter()
                .any(|line| line == " download https://example.test/totals.csv")
        );
    }

    #[test]
    fn malformed_json_renders_parse_error() {
        let mut app = app(false);
        app.chat.input = "Show totals".to_string();
        let now = Utc::now();
        let pending = app.submit(now).expect("pending");
        app.apply_reply(&pending, Ok(Reply::Text("{\"summary\": ".to_string())), now);
        assert!(
            rendered(&app)
                .iter()
                .any(|line| line == " could not parse response")
        );
    }
}
