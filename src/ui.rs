use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Padding, Paragraph, Wrap};

use crate::app::{App, NoticeKind};
use crate::controller::DisplayTurn;
use crate::text_layout::{wrap_lines, wrap_word_with_positions};
use crate::theme::Theme;
use crate::transcript::Role;

const MAX_INPUT_TEXT_LINES: u16 = 5;
const TEXT_PADDING: u16 = 1;
const STATUS_HEIGHT: u16 = 3;
const TITLE_BAR_HEIGHT: u16 = 3;
const SIDEBAR_WIDTH: u16 = 32;
const TITLE_BG: Color = Color::Rgb(90, 145, 200);
const TITLE_FG: Color = Color::Black;
const STATUS_HELP_TEXT: &str = "Enter send | Up/Down or wheel scroll | PgUp/PgDn page | Ctrl+C quit";
const FILE_HELP_TEXT: &str = "Drop a file onto the terminal or type /attach <path>";
const ACCEPTED_FORMATS_TEXT: &str = "Accepted Formats: .csv, .json, .xlsx";

#[derive(Debug, Clone, Copy)]
struct ScreenAreas {
    title: Rect,
    sidebar: Option<Rect>,
    chat: Rect,
    status: Rect,
}

fn screen_areas(screen: Rect, with_sidebar: bool) -> ScreenAreas {
    let [title, body, status] = Layout::vertical([
        Constraint::Length(TITLE_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(screen);
    if with_sidebar {
        let [sidebar, chat] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .areas(body);
        ScreenAreas {
            title,
            sidebar: Some(sidebar),
            chat,
            status,
        }
    } else {
        ScreenAreas {
            title,
            sidebar: None,
            chat: body,
            status,
        }
    }
}

/// Splits the chat column into the transcript and the input box. Returns
/// `None` when there is no room to draw anything.
fn chat_regions(chat: Rect, app: &App) -> Option<(Rect, Rect, u16)> {
    if chat.width < 1 || chat.height < 2 {
        return None;
    }
    let input_text_width = chat.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let input_text_lines = wrap_word_with_positions(app.chat_input(), input_text_width).line_count;
    let (cursor_line, _) = app.chat_cursor_line_col(input_text_width);
    let max_input_height = chat.height.saturating_sub(1).max(1);
    let (input_height, input_scroll) =
        input_box_metrics(input_text_lines, cursor_line, max_input_height);
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(input_height)]).areas(chat);
    Some((messages_area, input_area, input_scroll))
}

pub fn transcript_max_scroll(screen: Rect, app: &App) -> u16 {
    let areas = screen_areas(screen, app.variant().requires_file());
    let Some((messages_area, _, _)) = chat_regions(areas.chat, app) else {
        return 0;
    };
    let width = messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let visible = messages_area.height.saturating_sub(TEXT_PADDING * 2);
    let total = u16::try_from(transcript_lines(app, width, &Theme::default()).len())
        .unwrap_or(u16::MAX);
    total.saturating_sub(visible)
}

pub fn transcript_page_height(screen: Rect, app: &App) -> u16 {
    let areas = screen_areas(screen, app.variant().requires_file());
    chat_regions(areas.chat, app)
        .map(|(messages_area, _, _)| messages_area.height.saturating_sub(TEXT_PADDING * 2))
        .unwrap_or(1)
        .max(1)
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let areas = screen_areas(frame.area(), app.variant().requires_file());

    render_title_bar(frame, areas.title, app);
    if let Some(sidebar) = areas.sidebar {
        render_file_sidebar(frame, sidebar, app, theme);
    }
    render_chat_pane(frame, areas.chat, app, theme);
    render_status_bar(frame, areas.status, app, theme);
}

fn render_title_bar(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(
        Paragraph::new(app.title().to_string())
            .style(Style::default().bg(TITLE_BG).fg(TITLE_FG))
            .block(
                Block::default()
                    .style(Style::default().bg(TITLE_BG))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_file_sidebar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let selected = match app.controller().attached_file() {
        Some(file) => Line::from(vec![
            Span::styled("Selected: ", Style::default().fg(theme.muted_fg)),
            Span::styled(file.name().to_string(), Style::default().fg(theme.agent_fg)),
        ]),
        None => Line::from(Span::styled(
            ACCEPTED_FORMATS_TEXT,
            Style::default().fg(theme.muted_fg),
        )),
    };
    let lines = vec![
        Line::from(Span::styled(
            "FILE UPLOAD",
            Style::default()
                .fg(theme.text_fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            FILE_HELP_TEXT,
            Style::default().fg(theme.text_fg),
        )),
        Line::default(),
        selected,
    ];
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(theme.sidebar_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.sidebar_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_chat_pane(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.chat_bg)),
        area,
    );
    let Some((messages_area, input_area, input_scroll)) = chat_regions(area, app) else {
        return;
    };

    let message_width = messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let lines = transcript_lines(app, message_width, theme);
    let max_scroll = transcript_max_scroll(frame.area(), app);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .scroll((app.chat_scroll(max_scroll), 0))
            .style(Style::default().bg(theme.chat_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.chat_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        messages_area,
    );

    let input_enabled = app.controller().input_enabled();
    let input_bg = if input_enabled {
        theme.input_bg
    } else {
        theme.input_disabled_bg
    };
    let input_text_width = input_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let (input_body, input_fg) = if app.chat_input().is_empty() {
        (input_placeholder(app).to_string(), theme.muted_fg)
    } else {
        (
            wrap_word_with_positions(app.chat_input(), input_text_width).rendered,
            theme.text_fg,
        )
    };
    frame.render_widget(
        Paragraph::new(input_body)
            .block(
                Block::default()
                    .style(Style::default().bg(input_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            )
            .style(Style::default().bg(input_bg).fg(input_fg))
            .scroll((input_scroll, 0)),
        input_area,
    );

    let suggestions = app.command_suggestions();
    if !suggestions.is_empty() {
        render_command_index(frame, &suggestions, messages_area, input_area, theme);
    }

    if app.is_typing_enabled() {
        let (cursor_line, cursor_col) = app.chat_cursor_line_col(input_text_width);
        let input_inner = input_area.inner(Margin {
            horizontal: TEXT_PADDING,
            vertical: TEXT_PADDING,
        });
        if input_inner.width > 0 && input_inner.height > 0 {
            let visible_cursor_line = cursor_line.saturating_sub(input_scroll);
            if visible_cursor_line < input_inner.height {
                frame.set_cursor_position((
                    input_inner
                        .x
                        .saturating_add(cursor_col.min(input_inner.width.saturating_sub(1))),
                    input_inner.y.saturating_add(visible_cursor_line),
                ));
            }
        }
    }
}

fn input_placeholder(app: &App) -> &'static str {
    let controller = app.controller();
    if controller.is_busy() {
        "Waiting for reply..."
    } else if controller.variant().requires_file() && controller.attached_file().is_none() {
        "Attach a file to start chatting (/attach <path>)"
    } else {
        "Type your message..."
    }
}

fn render_command_index(
    frame: &mut Frame,
    suggestions: &[(&'static str, &'static str)],
    messages_area: Rect,
    input_area: Rect,
    theme: &Theme,
) {
    if messages_area.height == 0 || input_area.width == 0 {
        return;
    }
    let max_items = messages_area.height.saturating_sub(2).max(1) as usize;
    let shown: Vec<Line> = suggestions
        .iter()
        .take(max_items)
        .map(|(command, description)| {
            Line::from(vec![
                Span::styled(
                    format!("{command:<10}"),
                    Style::default().fg(theme.user_fg),
                ),
                Span::styled(description.to_string(), Style::default().fg(theme.muted_fg)),
            ])
        })
        .collect();
    let overlay_height = u16::try_from(shown.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(messages_area.height.max(1));
    let y = input_area
        .y
        .saturating_sub(overlay_height)
        .max(messages_area.y);
    let overlay = Rect::new(input_area.x, y, input_area.width, overlay_height);
    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(Text::from(shown)).block(
            Block::default()
                .style(Style::default().bg(theme.status_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        ),
        overlay,
    );
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let line = match app.notice() {
        Some(notice) => {
            let fg = match notice.kind {
                NoticeKind::Info => theme.text_fg,
                NoticeKind::Warning => theme.notice_fg,
            };
            Line::from(Span::styled(notice.text.clone(), Style::default().fg(fg)))
        }
        None => Line::from(Span::styled(
            STATUS_HELP_TEXT,
            Style::default().fg(theme.muted_fg),
        )),
    };
    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.status_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.status_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn transcript_lines(app: &App, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let controller = app.controller();
    let agent_label = controller.role_label(Role::Agent);
    let mut out = Vec::new();
    for (idx, turn) in app.display_turns().into_iter().enumerate() {
        if idx > 0 {
            out.push(Line::default());
        }
        let (label, label_style, body, body_style) = match turn {
            DisplayTurn::Welcome(text) => (
                agent_label,
                Style::default().fg(theme.agent_fg),
                text,
                Style::default().fg(theme.muted_fg),
            ),
            DisplayTurn::Turn(turn) => {
                let label_fg = match turn.role {
                    Role::User => theme.user_fg,
                    Role::Agent => theme.agent_fg,
                };
                (
                    controller.role_label(turn.role),
                    Style::default().fg(label_fg),
                    turn.text,
                    Style::default().fg(theme.text_fg),
                )
            }
            DisplayTurn::Typing => (
                agent_label,
                Style::default().fg(theme.agent_fg),
                typing_dots(app.ticks).to_string(),
                Style::default().fg(theme.muted_fg),
            ),
        };
        let indent = label.chars().count() + 1;
        let body_width = u16::try_from(usize::from(width).saturating_sub(indent).max(1))
            .unwrap_or(width);
        for (line_idx, text) in wrap_lines(&body, body_width).into_iter().enumerate() {
            let lead = if line_idx == 0 {
                Span::styled(format!("{label} "), label_style)
            } else {
                Span::raw(" ".repeat(indent))
            };
            out.push(Line::from(vec![lead, Span::styled(text, body_style)]));
        }
    }
    out
}

fn typing_dots(ticks: u64) -> &'static str {
    const FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];
    let frame = (ticks / 8) % FRAMES.len() as u64;
    FRAMES[usize::try_from(frame).unwrap_or(0)]
}

fn input_box_metrics(input_text_lines: u16, cursor_line: u16, max_input_height: u16) -> (u16, u16) {
    let capped_text_lines = input_text_lines.clamp(1, MAX_INPUT_TEXT_LINES);
    let desired_height = capped_text_lines.saturating_add(TEXT_PADDING * 2);
    let input_height = desired_height.clamp(1, max_input_height.max(1));
    let visible_text_lines = input_height.saturating_sub(TEXT_PADDING * 2).max(1);
    let max_scroll = input_text_lines.saturating_sub(visible_text_lines);
    let middle_line = visible_text_lines / 2;
    let input_scroll = cursor_line.saturating_sub(middle_line).min(max_scroll);
    (input_height, input_scroll)
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
