use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;

use super::app::App;
use super::form::FormField;
use super::list::{Card, ListStatus};
use super::view::View;

const KEY_ENTRY_HELP: &str = "Enter: log in  Esc/Ctrl-C: quit";
const CONTACTS_HELP: &str =
    "/: search  j/k: nav  a: add  e: edit  d: delete  r: refresh  L: log out  q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter/Esc: done";
const FORM_HELP: &str = "Tab/Shift-Tab: field  Enter: save  Esc: cancel";
const CONFIRM_HELP: &str = "Y/Enter: confirm  N/Esc: cancel";
const NOTICE_HELP: &str = "Enter/Esc: dismiss";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_confirm_modal(frame, size, app);
    draw_notice_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!("CONTACT BOOK :: {}", app.router.current().title()),
        header_text_style(app),
    )];
    if let Some(key) = app.session.key() {
        spans.push(Span::raw("   "));
        spans.push(Span::raw(key.to_string()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    match app.router.current() {
        View::KeyEntry => draw_key_entry(frame, area, app),
        View::Contacts => draw_contacts(frame, area, app),
        View::AddContact | View::EditContact(_) => draw_form(frame, area, app),
    }
}

fn draw_key_entry(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let width = area.width.min(60);
    let height = area.height.min(7);
    let target = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(Span::styled(" API KEY ", header_text_style(app)));
    let inner = block.inner(target);
    frame.render_widget(block, target);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let label = "Email: ";
    let mut lines = vec![
        Line::from("Log in with the email address registered as your API key."),
        Line::from(""),
        Line::from(vec![
            Span::styled(label, header_text_style(app)),
            Span::raw(app.key_input.value().to_string()),
        ]),
    ];
    if let Some(error) = &app.key_error {
        lines.push(Line::from(Span::styled(error.clone(), error_style(app))));
    } else if let Some(label) = app.busy_label() {
        lines.push(Line::from(Span::styled(label, header_text_style(app))));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if app.notice.is_none() {
        let column = Span::raw(label).width() + app.key_input.visual_cursor();
        let x = inner.x.saturating_add(column as u16);
        frame.set_cursor_position((x, inner.y.saturating_add(2)));
    }
}

fn draw_contacts(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    draw_search_header(frame, layout[0], app, area.width);

    match app.list.placeholder() {
        Some(text) if app.list.visible_count() == 0 => {
            let style = match app.list.status() {
                ListStatus::Failed(_) => error_style(app),
                _ => placeholder_style(app),
            };
            render_centered_lines(frame, layout[1], &text, style);
        }
        _ => draw_card_list(frame, layout[1], app),
    }
}

fn draw_search_header(frame: &mut Frame<'_>, area: Rect, app: &App, outer_width: u16) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let active = app.search_active;
    let label = "SEARCH: ";
    let value_style = if active {
        selection_style(app)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(label, header_text_style(app)),
        Span::styled(app.search_input.value().to_string(), value_style),
    ];
    let count = app.list.visible_count();
    if !app.list.cards().is_empty() {
        spans.push(Span::styled(
            format!("   {}/{}", count, app.list.cards().len()),
            header_text_style(app),
        ));
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), parts[0]);

    if active && app.notice.is_none() && app.confirm_modal.is_none() {
        let column = Span::raw(label).width() + app.search_input.visual_cursor();
        let x = parts[0].x.saturating_add(column as u16);
        frame.set_cursor_position((x, parts[0].y));
    }

    if area.height < 2 {
        return;
    }

    // Separator with connector characters: ├───┤
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.to_string().repeat(inner_width),
        LINE.vertical_left
    );
    let separator_area = Rect {
        x: parts[1].x.saturating_sub(1),
        y: parts[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, border_style(app)))),
        separator_area,
    );
}

fn draw_card_list(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let mut state = ListState::default();
    let mut items = Vec::new();
    for (index, card) in app.list.cards().iter().enumerate() {
        if !card.visible {
            continue;
        }
        if app.list.selected_index() == Some(index) {
            state.select(Some(items.len()));
        }
        items.push(build_card_item(card, app));
    }

    let list = List::new(items)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ")
        .repeat_highlight_symbol(true);

    frame.render_stateful_widget(list, area, &mut state);
}

fn build_card_item(card: &Card, app: &App) -> ListItem<'static> {
    let label = header_text_style(app);
    let mut name = card.name.clone();
    if card.pending {
        name.push_str("  (deleting...)");
    }
    let lines = vec![
        Line::from(Span::styled(name, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  Mobile: ", label),
            Span::raw(card.mobile.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Email:  ", label),
            Span::raw(card.email.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Avatar: ", label),
            Span::raw(card.avatar_url.clone()),
        ]),
        Line::from(""),
    ];

    let item = ListItem::new(Text::from(lines));
    if card.pending {
        item.style(Style::default().add_modifier(Modifier::DIM))
    } else {
        item
    }
}

fn draw_form(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let title = format!(" {} ", app.router.current().title());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(Span::styled(title, header_text_style(app)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if app.form.loading {
        render_centered_lines(frame, inner, "Loading contact details...", placeholder_style(app));
        return;
    }

    let label_width = FormField::ALL
        .iter()
        .map(|field| field.label().len())
        .max()
        .unwrap_or(0)
        + 3;

    let focused = app.form.focused();
    let mut lines = Vec::new();
    let mut cursor = None;
    for field in FormField::ALL {
        let is_focused = field == focused;
        let label = format!("{:<width$}", format!("{}:", field.label()), width = label_width);
        let value_style = if is_focused {
            selection_style(app)
        } else {
            Style::default()
        };
        if is_focused {
            cursor = Some((label_width + app.form.visual_cursor(), lines.len()));
        }
        lines.push(Line::from(vec![
            Span::styled(label, header_text_style(app)),
            Span::styled(app.form.value(field).to_string(), value_style),
        ]));
        lines.push(Line::from(""));
    }

    if let Some(current) = &app.form.current_avatar {
        lines.push(Line::from(vec![
            Span::styled("Current avatar: ", header_text_style(app)),
            Span::raw(current.clone()),
        ]));
    }
    lines.push(Line::from(Span::styled(
        "Leave the avatar file empty to keep the current image.",
        placeholder_style(app),
    )));

    frame.render_widget(Paragraph::new(lines), inner);

    if app.notice.is_none() && app.confirm_modal.is_none() {
        if let Some((column, row)) = cursor {
            let x = inner.x.saturating_add(column as u16);
            let y = inner.y.saturating_add(row as u16);
            frame.set_cursor_position((x, y));
        }
    }
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.notice.is_some() {
        NOTICE_HELP.to_string()
    } else if app.confirm_modal.is_some() {
        CONFIRM_HELP.to_string()
    } else if let Some(status) = &app.status {
        status.clone()
    } else if let Some(label) = app.busy_label() {
        label.to_string()
    } else {
        match app.router.current() {
            View::KeyEntry => KEY_ENTRY_HELP.to_string(),
            View::Contacts if app.search_active => SEARCH_HELP.to_string(),
            View::Contacts => CONTACTS_HELP.to_string(),
            View::AddContact | View::EditContact(_) => FORM_HELP.to_string(),
        }
    };
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.notice.is_some() {
        return;
    }
    let Some(modal) = app.confirm_modal.as_ref() else { return; };

    let body_text = Text::from(vec![
        Line::from(modal.message.clone()),
        Line::from(""),
        Line::from(CONFIRM_HELP),
    ]);

    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_notice_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(notice) = app.notice.as_ref() else { return; };

    let (title, style) = if notice.is_error {
        ("ERROR", error_style(app))
    } else {
        ("INFO", header_text_style(app))
    };
    let mut lines: Vec<Line> = notice
        .message
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(NOTICE_HELP));

    let popup = Popup::new(Text::from(lines))
        .title(Line::from(Span::styled(title, style)))
        .border_style(style);

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn render_centered_lines(frame: &mut Frame<'_>, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();
    if lines.len() as u16 > area.height {
        lines.truncate(area.height as usize);
    }

    let height = lines.len() as u16;
    let start_y = area.y + (area.height.saturating_sub(height)) / 2;
    let target = Rect {
        x: area.x,
        y: start_y,
        width: area.width,
        height,
    };

    frame.render_widget(
        Paragraph::new(lines)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        target,
    );
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn error_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.ui_colors().error))
        .add_modifier(Modifier::BOLD)
}

fn placeholder_style(_app: &App) -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
