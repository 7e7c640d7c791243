use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Padding, Paragraph, Row, Table, TableState, Wrap,
};

use crate::app::{App, InputMode};
use crate::config::Theme;
use crate::model::ResourceTab;
use crate::notifications::{Level, Notification};
use crate::overlay::{ConfirmDialog, FormDialog, LogViewer, Overlay};
use crate::resource_view::{LOG_OVERLAY_PERCENT, RowView, ViewState};
use crate::split_view::FocusState;

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ROW_HIGHLIGHT: Color = Color::Rgb(24, 36, 58);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);

const TOAST_WIDTH: u16 = 48;

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let view = app.view_state();
    render_header(frame, root[0], app, &view, theme);
    render_body(frame, root[1], &view, theme);
    render_footer(frame, root[2], app, &view, theme);

    match app.overlay() {
        Some(Overlay::Confirm(dialog)) => render_confirm(frame, dialog, theme),
        Some(Overlay::Form(form)) => render_form(frame, form, theme),
        Some(Overlay::Logs(viewer)) => render_logs(frame, root[1], viewer, theme),
        None => {}
    }

    render_notifications(frame, root[1], app, theme);

    if app.show_help() {
        render_help_modal(frame, app, theme);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, view: &ViewState, theme: &Theme) {
    let busy = app.busy_tabs();
    let mut spans = Vec::new();
    for tab in app.tabs() {
        let active = *tab == app.active_tab();
        let spinner = busy
            .contains(tab)
            .then(|| app.glyphs().spinner_frame(app.spinner_frame()));
        let label = tab_label(
            *tab,
            app.glyphs().ornament(*tab),
            app.item_count(*tab),
            spinner,
        );
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted).bg(BG)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::styled(" ", Style::default().bg(BG)));
    }

    let right = match &view.refreshed_at {
        Some(at) => format!("updated {at} "),
        None if view.error.is_some() => "offline ".to_string(),
        None => "loading… ".to_string(),
    };
    let right_width = right.chars().count() as u16;
    if right_width >= area.width / 2 {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right)
            .alignment(Alignment::Right)
            .style(Style::default().bg(BG).fg(theme.muted)),
        chunks[1],
    );
}

fn tab_label(tab: ResourceTab, ornament: &str, count: usize, spinner: Option<&str>) -> String {
    let mut label = format!(" {}", tab.index() + 1);
    if !ornament.is_empty() {
        label.push(' ');
        label.push_str(ornament);
    }
    label.push_str(&format!(" {} ({count})", tab.title()));
    if let Some(spinner) = spinner {
        label.push(' ');
        label.push_str(spinner);
    }
    label.push(' ');
    label
}

fn render_body(frame: &mut Frame, area: Rect, view: &ViewState, theme: &Theme) {
    let list_width = view.list_outer_width.min(area.width);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(list_width), Constraint::Min(1)])
        .split(area);

    render_list(frame, chunks[0], view, theme);
    render_detail(frame, chunks[1], view, theme);
}

fn pane_block(title: String, focused: bool, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(theme.primary)
        } else {
            Style::default().fg(theme.border)
        })
        .style(Style::default().bg(PANEL))
}

fn render_list(frame: &mut Frame, area: Rect, view: &ViewState, theme: &Theme) {
    let focused = view.focus == FocusState::List;
    let title = if view.selected > 0 {
        format!(
            "{} ({}/{}, {} selected)",
            view.tab.title(),
            view.rows.len(),
            view.total,
            view.selected
        )
    } else {
        format!("{} ({}/{})", view.tab.title(), view.rows.len(), view.total)
    };

    if let Some(error) = &view.error
        && view.rows.is_empty()
    {
        let panel = Paragraph::new(Text::from(error.clone()))
            .wrap(Wrap { trim: false })
            .block(pane_block(format!("{} Error", view.tab.title()), focused, theme))
            .style(Style::default().fg(theme.error));
        frame.render_widget(panel, area);
        return;
    }

    if view.rows.is_empty() {
        let message = if !view.loaded {
            "Loading…".to_string()
        } else if view.filter_query.is_empty() {
            format!("No {} found.", view.tab.noun())
        } else {
            format!("No {} match '{}'.", view.tab.noun(), view.filter_query)
        };
        let panel = Paragraph::new(message)
            .block(pane_block(title, focused, theme))
            .style(Style::default().fg(theme.muted));
        frame.render_widget(panel, area);
        return;
    }

    let rows = view.rows.iter().map(|row| list_row(row, theme));
    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(pane_block(title, focused, theme))
        .row_highlight_style(
            Style::default()
                .bg(ROW_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(view.cursor);
    frame.render_stateful_widget(table, area, &mut state);
}

fn list_row(row: &RowView, theme: &Theme) -> Row<'static> {
    let title = Line::from(vec![
        Span::styled(
            format!("{} ", row.title.marker),
            Style::default().fg(theme.tone(row.title.marker_tone)),
        ),
        Span::styled(
            row.title.label.clone(),
            Style::default().fg(theme.tone(row.title.label_tone)),
        ),
    ]);
    let description = Line::from(Span::styled(
        format!("  {}", row.description),
        Style::default().fg(theme.muted),
    ));
    Row::new([Cell::from(Text::from(vec![title, description]))]).height(2)
}

fn render_detail(frame: &mut Frame, area: Rect, view: &ViewState, theme: &Theme) {
    let focused = view.focus == FocusState::Detail;
    let block = pane_block("Details".to_string(), focused, theme).padding(Padding::horizontal(1));
    let paragraph = Paragraph::new(highlight_yaml_text(&view.detail, theme))
        .block(block)
        .style(Style::default().fg(theme.text))
        .wrap(Wrap { trim: false })
        .scroll((view.detail_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, view: &ViewState, theme: &Theme) {
    let mode = app.mode();
    let mut spans = Vec::new();
    push_powerline_segment(
        &mut spans,
        format!(" {} ", mode_label(mode)),
        Color::White,
        PL_A,
        PL_B,
    );

    if view.filtering {
        push_powerline_segment(
            &mut spans,
            format!(" /{}█ ", view.filter_query),
            Color::White,
            PL_B,
            BG,
        );
        spans.push(Span::styled(
            " enter keep  esc clear",
            Style::default().fg(theme.muted),
        ));
    } else {
        let filter = if view.filter_query.is_empty() {
            " no filter ".to_string()
        } else {
            format!(" /{} ", view.filter_query)
        };
        push_powerline_segment(&mut spans, filter, Color::White, PL_B, BG);
        spans.push(Span::styled(
            format!(" {}", footer_hints(mode, view.tab)),
            Style::default().fg(theme.muted),
        ));
    }

    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn footer_hints(mode: InputMode, tab: ResourceTab) -> &'static str {
    match mode {
        InputMode::Dialog => "←/→ choose  enter confirm  esc cancel",
        InputMode::Form => "tab next field  enter submit  esc cancel",
        InputMode::Logs => "j/k scroll  G follow  esc close",
        InputMode::Filter => "enter keep  esc clear",
        InputMode::Normal => match tab {
            ResourceTab::Containers => {
                "space select  s start  S stop  p pause  r remove  l logs  e shell  ? help"
            }
            ResourceTab::Images => "space select  i pull  c create  r remove  ? help",
            ResourceTab::Volumes | ResourceTab::Networks => "space select  r remove  ? help",
        },
    }
}

fn mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Filter => "filter",
        InputMode::Dialog => "dialog",
        InputMode::Form => "form",
        InputMode::Logs => "logs",
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn render_confirm(frame: &mut Frame, dialog: &ConfirmDialog, theme: &Theme) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = dialog
        .message
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect::<Vec<_>>();
    lines.push(Line::from(""));

    let mut buttons = Vec::new();
    for (index, button) in dialog.buttons().iter().enumerate() {
        let color = if button.danger {
            theme.error
        } else {
            theme.text
        };
        let mut style = Style::default().fg(color);
        if index == dialog.selected() {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        buttons.push(Span::styled(format!(" {} ", button.label), style));
        buttons.push(Span::raw("  "));
    }
    lines.push(Line::from(buttons).alignment(Alignment::Center));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(dialog.title.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.warning))
                .padding(Padding::uniform(1))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(theme.text));
    frame.render_widget(modal, area);
}

fn render_form(frame: &mut Frame, form: &FormDialog, theme: &Theme) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (index, field) in form.fields().iter().enumerate() {
        let focused = index == form.focused();
        let label = if field.required {
            format!("{} *", field.label)
        } else {
            field.label.clone()
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default()
                .fg(if focused { theme.primary } else { theme.muted })
                .add_modifier(Modifier::BOLD),
        )));

        let prefix = if focused { "> " } else { "  " };
        let value = if field.value.is_empty() && !focused {
            Span::styled(field.placeholder.clone(), Style::default().fg(theme.muted))
        } else if focused {
            Span::styled(
                format!("{}█", field.value),
                Style::default().fg(theme.text),
            )
        } else {
            Span::styled(field.value.clone(), Style::default().fg(theme.text))
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, Style::default().fg(theme.primary)),
            value,
        ]));
        lines.push(Line::from(""));
    }

    if let Some(error) = form.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(form.title.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.primary))
                .padding(Padding::horizontal(1))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(theme.text));
    frame.render_widget(modal, area);
}

fn render_logs(frame: &mut Frame, body: Rect, viewer: &LogViewer, theme: &Theme) {
    let area = centered_rect(LOG_OVERLAY_PERCENT, LOG_OVERLAY_PERCENT, body);
    frame.render_widget(Clear, area);

    let status = if viewer.following() {
        "follow"
    } else {
        "paused"
    };
    let mut block = Block::default()
        .title(format!("{} ({} lines, {status})", viewer.title, viewer.line_count()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.primary))
        .style(Style::default().bg(PANEL));
    if let Some(reason) = viewer.ended() {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {reason} "),
            Style::default().fg(theme.warning),
        )));
    }

    let lines = viewer
        .visible_lines()
        .map(|line| Line::from(line.to_string()))
        .collect::<Vec<_>>();
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(theme.text));
    frame.render_widget(paragraph, area);
}

fn render_notifications(frame: &mut Frame, body: Rect, app: &App, theme: &Theme) {
    let width = TOAST_WIDTH.min(body.width);
    if width < 8 || app.notifications().is_empty() {
        return;
    }
    let mut y = body.y;
    for notification in app.notifications().iter() {
        if y + 3 > body.y + body.height {
            break;
        }
        let area = Rect {
            x: body.x + body.width - width,
            y,
            width,
            height: 3,
        };
        frame.render_widget(Clear, area);
        frame.render_widget(toast(notification, width, theme), area);
        y += 3;
    }
}

fn toast(notification: &Notification, width: u16, theme: &Theme) -> Paragraph<'static> {
    let (title, color) = match notification.level {
        Level::Info => ("Info", theme.primary),
        Level::Success => ("Done", theme.success),
        Level::Warning => ("Warning", theme.warning),
        Level::Error => ("Error", theme.error),
    };
    let message = compact_text(
        notification.message.lines().next().unwrap_or_default(),
        width.saturating_sub(4) as usize,
    );
    Paragraph::new(message)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(theme.text))
}

fn highlight_yaml_text(input: &str, theme: &Theme) -> Text<'static> {
    let lines = input
        .lines()
        .map(|line| highlight_yaml_line(line, theme))
        .collect::<Vec<Line<'static>>>();
    Text::from(lines)
}

fn highlight_yaml_line(line: &str, theme: &Theme) -> Line<'static> {
    let indent_len = line
        .as_bytes()
        .iter()
        .take_while(|byte| **byte == b' ' || **byte == b'\t')
        .count();
    let indent = &line[..indent_len];
    let trimmed = &line[indent_len..];

    let mut spans = vec![Span::raw(indent.to_string())];
    if trimmed.is_empty() {
        return Line::from(spans);
    }

    if let Some(rest) = trimmed.strip_prefix("- ") {
        spans.push(Span::styled("- ", Style::default().fg(theme.primary)));
        spans.extend(highlight_yaml_content(rest, theme));
        return Line::from(spans);
    }

    spans.extend(highlight_yaml_content(trimmed, theme));
    Line::from(spans)
}

fn highlight_yaml_content(content: &str, theme: &Theme) -> Vec<Span<'static>> {
    let Some((key, value)) = split_yaml_key_value(content) else {
        return vec![Span::styled(
            content.to_string(),
            Style::default().fg(theme.text),
        )];
    };

    let mut spans = vec![
        Span::styled(key.to_string(), Style::default().fg(theme.selected)),
        Span::styled(":", Style::default().fg(theme.muted)),
    ];
    if value.trim().is_empty() {
        return spans;
    }

    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        value.trim_start().to_string(),
        Style::default().fg(yaml_value_color(value.trim(), theme)),
    ));
    spans
}

fn split_yaml_key_value(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim_end();
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    Some((key, value))
}

fn yaml_value_color(value: &str, theme: &Theme) -> Color {
    if matches!(value, "true" | "false" | "null" | "~") {
        theme.warning
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else if value.starts_with('{') || value.starts_with('[') {
        theme.muted
    } else {
        theme.text
    }
}

fn render_help_modal(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "berth help  mode:{}  tab:{}",
            mode_label(app.mode()),
            app.active_tab().title()
        )),
        Line::from(""),
    ];
    for line in contextual_help_lines(app.active_tab()) {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.primary))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(theme.text));

    frame.render_widget(modal, area);
}

fn contextual_help_lines(tab: ResourceTab) -> Vec<String> {
    let mut lines = vec![
        "Tabs: 1-4 jump  shift+tab next tab  tab switch pane".to_string(),
        "Move: j/k or arrows  g/G top/bottom  pgup/pgdn page".to_string(),
        "Select: space toggle  ctrl+a all  / filter".to_string(),
        "Misc: ctrl+r refresh  esc dismiss  ? close help  q quit".to_string(),
        String::new(),
    ];
    match tab {
        ResourceTab::Containers => {
            lines.push("Containers: s start  S stop  p pause  P unpause".to_string());
            lines.push("            r remove  l logs  e shell".to_string());
        }
        ResourceTab::Images => {
            lines.push("Images: i pull  c create container  r remove".to_string());
            lines.push("Images used by a container cannot be removed.".to_string());
        }
        ResourceTab::Volumes => lines.push("Volumes: r remove".to_string()),
        ResourceTab::Networks => lines.push("Networks: r remove".to_string()),
    }
    lines
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{compact_text, contextual_help_lines, split_yaml_key_value, tab_label};
    use crate::model::ResourceTab;

    #[test]
    fn tab_label_shows_index_count_and_spinner() {
        assert_eq!(
            tab_label(ResourceTab::Images, "", 3, None),
            " 2 Images (3) "
        );
        assert_eq!(
            tab_label(ResourceTab::Containers, "C", 0, Some("|")),
            " 1 C Containers (0) | "
        );
    }

    #[test]
    fn yaml_split_ignores_prose() {
        assert_eq!(split_yaml_key_value("name: web"), Some(("name", " web")));
        assert_eq!(split_yaml_key_value("not a key: value"), None);
        assert_eq!(split_yaml_key_value("plain"), None);
    }

    #[test]
    fn compact_text_truncates_with_ellipsis() {
        assert_eq!(compact_text("short", 10), "short");
        assert_eq!(compact_text("abcdefgh", 4), "abc…");
        assert_eq!(compact_text("abcdefgh", 1), "…");
    }

    #[test]
    fn help_mentions_tab_specific_keys() {
        let lines = contextual_help_lines(ResourceTab::Images);
        assert!(lines.iter().any(|line| line.contains("i pull")));
        let lines = contextual_help_lines(ResourceTab::Containers);
        assert!(lines.iter().any(|line| line.contains("l logs")));
    }
}
