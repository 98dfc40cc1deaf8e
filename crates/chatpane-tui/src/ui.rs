use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use chatpane_core::{Message, Mode, Operation, Sender};
use crate::app::{App, FocusPane, InputMode, LoginField, Popup};
use crate::wrap::wrap_line;

const SIDEBAR_WIDTH: u16 = 30;

/// Ensure the selected item in a list is visible by adjusting the ListState offset.
fn ensure_selected_visible(state: &mut ListState, visible_height: usize) {
    let visible_height = visible_height.max(1);

    if let Some(selected) = state.selected() {
        let min_offset = selected.saturating_sub(visible_height - 1);
        let max_offset = selected;

        let new_offset = state.offset().clamp(min_offset, max_offset);
        if new_offset != state.offset() {
            *state.offset_mut() = new_offset;
        }
    }
}

/// Cut a string to at most `width` characters, marking the cut
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

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

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH.min(body_area.width / 2)),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_history(app, frame, sidebar_area);
    render_main(app, frame, main_area);
    render_footer(app, frame, footer_area);

    match app.popup {
        Some(Popup::Login) => render_login_popup(app, frame, area),
        Some(Popup::FilePicker) => render_file_picker(app, frame, area),
        Some(Popup::Port) => render_port_popup(app, frame, area),
        None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" Chat ", Style::default().fg(Color::Cyan).bold())];

    if app.is_admin() {
        spans.push(Span::styled(
            " Admin Mode ",
            Style::default().bg(Color::Magenta).fg(Color::White).bold(),
        ));
    }

    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    ));

    let account_hint = if app.is_admin() { "L: logout " } else { "L: login " };

    let [left, right] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(account_hint.len() as u16),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray)),
        left,
    );
    frame.render_widget(
        Paragraph::new(account_hint)
            .alignment(Alignment::Right)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        right,
    );
}

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    app.history_area = Some(area);

    let focused = app.focus == FocusPane::History;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Recent Queries ");

    if app.chat.history.is_empty() {
        let placeholder = Paragraph::new("No queries yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let inner_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .chat
        .history
        .entries()
        .iter()
        .map(|query| {
            // Multi-line queries show their first line only
            let first = query.lines().next().unwrap_or_default();
            ListItem::new(truncate(first, inner_width))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let visible_height = area.height.saturating_sub(2) as usize;
    ensure_selected_visible(&mut app.history_state, visible_height);

    frame.render_stateful_widget(list, area, &mut app.history_state);
}

fn render_main(app: &mut App, frame: &mut Frame, area: Rect) {
    let selector_height = if app.is_admin() { 1 } else { 0 };
    let chip_height = if app.composer.attachment.is_some() { 1 } else { 0 };
    let input_height = app.composer.visible_rows() + 2;

    let [settings_area, transcript_area, selector_area, chip_area, input_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(selector_height),
            Constraint::Length(chip_height),
            Constraint::Length(input_height),
        ])
        .areas(area);

    render_settings(app, frame, settings_area);
    render_transcript(app, frame, transcript_area);
    if selector_height > 0 {
        render_mode_selector(app, frame, selector_area);
    }
    if chip_height > 0 {
        render_attachment_chip(app, frame, chip_area);
    }
    render_input(app, frame, input_area);
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Yellow);

    let session = &app.chat.session;
    let mut spans = vec![
        Span::styled(" Model: ", label),
        Span::styled(session.selected_model.as_str(), value),
    ];

    if app.is_admin() {
        let port = if session.port.is_empty() {
            "default".to_string()
        } else {
            session.port.clone()
        };
        spans.extend(vec![
            Span::styled("  API Version: ", label),
            Span::styled(session.api_version.as_str(), value),
            Span::styled("  Port: ", label),
            Span::styled(port, value),
        ]);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Lines for one message, already wrapped to `width`
fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (alignment, text_style) = match message.sender {
        Sender::User => (Alignment::Right, Style::default().fg(Color::Cyan)),
        Sender::Assistant => (Alignment::Left, Style::default()),
    };

    let mut lines = Vec::new();

    if let Some(attachment) = &message.attachment {
        lines.push(
            Line::from(Span::styled(
                truncate(&format!("[ {} ]", attachment.name), width),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ))
            .alignment(alignment),
        );
        lines.push(
            Line::from(Span::styled(
                truncate(&attachment.preview_path().display().to_string(), width),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
            .alignment(alignment),
        );
    }

    for line in message.shown_text().split('\n') {
        for chunk in wrap_line(line, width) {
            lines.push(Line::from(Span::styled(chunk, text_style)).alignment(alignment));
        }
    }

    lines.push(
        Line::from(Span::styled(
            message.time_label(),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(alignment),
    );
    lines.push(Line::default());
    lines
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.transcript_area = Some(area);

    // Inner size minus borders, used by scroll calculations
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);
    app.transcript_scroll = app.transcript_scroll.min(app.max_transcript_scroll());

    let focused = app.focus == FocusPane::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let width = app.transcript_width.max(1) as usize;

    let text = if app.chat.transcript.is_empty() && app.in_flight == 0 {
        Text::from(
            Line::from(Span::styled(
                "Start a conversation",
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Center),
        )
    } else {
        let mut lines: Vec<Line> = app
            .chat
            .transcript
            .messages()
            .iter()
            .flat_map(|m| message_lines(m, width))
            .collect();

        if app.in_flight > 0 {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Waiting for reply{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        Text::from(lines)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_mode_selector(app: &App, frame: &mut Frame, area: Rect) {
    let active = Style::default().bg(Color::Blue).fg(Color::White).bold();
    let idle = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(" Mode ", Style::default().fg(Color::DarkGray))];
    for (i, mode) in Mode::all().into_iter().enumerate() {
        let style = if mode == app.composer.mode { active } else { idle };
        spans.push(Span::styled(format!(" {} {} ", i + 1, mode.display_name()), style));
    }

    if app.composer.mode == Mode::Data {
        spans.push(Span::styled("  Operation (o) ", Style::default().fg(Color::DarkGray)));
        for operation in Operation::all() {
            let style = if operation == app.composer.operation { active } else { idle };
            spans.push(Span::styled(format!(" {} ", operation.display_name()), style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_attachment_chip(app: &App, frame: &mut Frame, area: Rect) {
    let Some(attachment) = &app.composer.attachment else {
        return;
    };

    let chip = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!(" {} ", truncate(&attachment.name, area.width.saturating_sub(16) as usize)),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        Span::styled(" X: remove ", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(chip), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.popup.is_none();
    let focused = app.focus == FocusPane::Composer;
    let border_color = if editing || focused { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (cursor_row, cursor_col) = app.composer.cursor_row_col();

    // Horizontal scroll keeps the cursor column in view
    let h_offset = if inner_width == 0 {
        0
    } else if cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    let lines: Vec<Line> = app
        .composer
        .text
        .split('\n')
        .skip(app.composer.scroll as usize)
        .take(app.composer.visible_rows() as usize)
        .map(|line| Line::from(line.chars().skip(h_offset).take(inner_width).collect::<String>()))
        .collect();

    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_col - h_offset) as u16;
        let cursor_y = (cursor_row as u16).saturating_sub(app.composer.scroll);
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + cursor_y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let mut hints = vec![Span::styled(mode_text, mode_style)];

    match app.input_mode {
        InputMode::Editing => {
            let send_style = if app.composer.can_submit() { label_style } else { disabled_style };
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", send_style),
                Span::styled(" A-Enter ", key_style),
                Span::styled(" newline ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" normal ", label_style),
            ]);
        }
        InputMode::Normal => {
            if app.focus == FocusPane::History {
                hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" nav ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" reuse ", label_style),
                ]);
            } else {
                hints.extend(vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" edit ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" attach ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" model ", label_style),
            ]);
            if app.is_admin() {
                hints.extend(vec![
                    Span::styled(" v ", key_style),
                    Span::styled(" version ", label_style),
                    Span::styled(" p ", key_style),
                    Span::styled(" port ", label_style),
                    Span::styled(" 1-3 ", key_style),
                    Span::styled(" mode ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_login_popup(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 44, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Admin Login ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let field_style = |field: LoginField| {
        if app.login.field == field {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Username: ", field_style(LoginField::Username)),
            Span::raw(app.login.username.clone()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_style(LoginField::Password)),
            Span::raw("*".repeat(app.login.password.chars().count())),
        ]),
        Line::default(),
    ];
    match &app.login.error {
        Some(error) => lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Tab: switch field  Enter: login  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    frame.render_widget(Paragraph::new(lines), inner);

    let (row, typed) = match app.login.field {
        LoginField::Username => (0, app.login.username.chars().count()),
        LoginField::Password => (1, app.login.password.chars().count()),
    };
    let cursor_x = (10 + typed as u16).min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + cursor_x, inner.y + row));
}

fn render_file_picker(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 64, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Attach File ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let width = inner.width as usize;
    let typed = app.composer.picker_input.chars().count();
    let offset = typed.saturating_sub(width.saturating_sub(1));
    let visible: String = app.composer.picker_input.chars().skip(offset).collect();

    let status = match &app.picker_error {
        Some(error) => Span::styled(truncate(error, width), Style::default().fg(Color::Red)),
        None => Span::styled(
            "Enter: attach  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let lines = vec![
        Line::from(Span::styled("Path to file:", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(visible, Style::default().fg(Color::Cyan))),
        Line::default(),
        Line::from(status),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    let cursor_x = ((typed - offset) as u16).min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + cursor_x, inner.y + 1));
}

fn render_port_popup(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 36, 6);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" API Port ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            app.chat.session.port.clone(),
            Style::default().fg(Color::Cyan),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Empty uses the page origin",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled("Enter/Esc: close", Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    let cursor_x = (app.chat.session.port.len() as u16).min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + cursor_x, inner.y));
}
