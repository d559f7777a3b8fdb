use gtm_core::api::{DealScore, OutreachResult, RiskLevel};
use gtm_core::state::{ChatRole, ChatSession, EXAMPLE_QUESTIONS};
use gtm_core::Channel;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, OutreachFocus, Screen};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next(); // consume second *

        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(
                bold_text,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            // No closing **, treat as literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

/// `$1,234,567`, keeping cents only when present
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let remainder = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if remainder == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, remainder)
    }
}

fn risk_color(level: &RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::Red,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::Green,
        RiskLevel::Other(_) => Color::Gray,
    }
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

    match app.screen {
        Screen::Dashboard => render_dashboard(app, frame, body_area),
        Screen::AskGtm => render_ask_screen(app, frame, body_area),
        Screen::DealSense => render_deals_screen(app, frame, body_area),
        Screen::Outreach => render_outreach_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " GTM Synergy Suite ",
        Style::default().fg(Color::Cyan).bold(),
    )];

    for (i, tool) in Screen::tools().iter().enumerate() {
        let style = if app.screen == *tool {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} {} ", i + 1, tool.title()), style));
    }

    spans.push(Span::styled(
        format!("  {}  v{}", app.api_url, env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Dashboard => " HOME ",
        Screen::AskGtm => " ASK ",
        Screen::DealSense => " DEALS ",
        Screen::Outreach => " OUTREACH ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &str, label: &str| {
        vec![
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = Vec::new();
    match (app.screen, app.input_mode) {
        (Screen::Dashboard, _) => {
            hints.extend(hint("j/k", "nav"));
            hints.extend(hint("Enter", "open"));
            hints.extend(hint("1-3", "tool"));
            hints.extend(hint("q", "quit"));
        }
        (Screen::AskGtm, InputMode::Normal) => {
            hints.extend(hint("i", "ask"));
            if app.chat.messages.is_empty() {
                hints.extend(hint("j/k", "example"));
                hints.extend(hint("Enter", "use"));
            } else {
                hints.extend(hint("j/k", "scroll"));
            }
            hints.extend(hint("r", "reset"));
            hints.extend(hint("Esc", "home"));
        }
        (Screen::DealSense, InputMode::Normal) => {
            hints.extend(hint("i", "path"));
            hints.extend(hint("Enter", "analyze"));
            hints.extend(hint("h", if app.high_risk_only { "all deals" } else { "high risk" }));
            hints.extend(hint("j/k", "scroll"));
            hints.extend(hint("Esc", "home"));
        }
        (Screen::Outreach, InputMode::Normal) => {
            hints.extend(hint("j/k", "field"));
            if app.focused_row() == OutreachFocus::Channel {
                hints.extend(hint("h/l", "channel"));
            } else {
                hints.extend(hint("Enter", "edit"));
            }
            hints.extend(hint("g", "generate"));
            if app.outreach.result.is_some() {
                hints.extend(hint("c", "copy"));
            }
            hints.extend(hint("Esc", "home"));
        }
        (Screen::AskGtm, InputMode::Editing) => {
            hints.extend(hint("Enter", "send"));
            hints.extend(hint("Esc", "stop typing"));
        }
        (_, InputMode::Editing) => {
            hints.extend(hint("Enter", "done"));
            hints.extend(hint("Esc", "stop typing"));
        }
    }

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    spans.extend(hints);

    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Red).bg(Color::Black),
        ));
    } else if app.copied_ticks > 0 {
        spans.push(Span::styled(
            "  Copied!",
            Style::default().fg(Color::Green).bg(Color::Black),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    let [intro_area, tools_area] =
        Layout::vertical([Constraint::Length(5), Constraint::Min(0)]).areas(area);

    let status_line = match &app.service_info {
        Some(info) => Line::from(vec![
            Span::styled("API: ", Style::default().fg(Color::Gray)),
            Span::styled(info.status.clone(), Style::default().fg(Color::Green).bold()),
            Span::styled(format!("  {}", info.message), Style::default().fg(Color::Gray)),
        ]),
        None if app.info_task.is_some() => Line::from(Span::styled(
            "API: connecting...",
            Style::default().fg(Color::DarkGray),
        )),
        None => Line::from(Span::styled(
            format!("API: unreachable at {}", app.api_url),
            Style::default().fg(Color::Red),
        )),
    };

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            "Supercharge Your GTM Operations",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from("Pipeline forecasting, knowledge retrieval, and personalized outreach."),
        status_line,
    ])
    .block(Block::default().borders(Borders::ALL).title(" Dashboard "))
    .wrap(Wrap { trim: true });
    frame.render_widget(intro, intro_area);

    let items: Vec<ListItem> = Screen::tools()
        .iter()
        .enumerate()
        .map(|(i, tool)| {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("{}. {}", i + 1, tool.title()),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("   {}", tool.description()),
                    Style::default().fg(Color::Gray),
                )),
            ];
            lines.extend(
                tool.features()
                    .iter()
                    .map(|feature| Line::from(format!("   • {}", feature))),
            );
            lines.push(Line::default());
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Tools "))
        .highlight_style(Style::default().fg(Color::Cyan))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, tools_area, &mut app.dashboard_state);
}

/// Transcript lines: one role label per message and one citation block
/// (`▸ source (category)` plus content) per source.
pub fn chat_lines(chat: &ChatSession, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in &chat.messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.clone()));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AskGTM:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(msg.content.lines().map(parse_markdown_line));

                let citations = msg.citations();
                if !citations.is_empty() {
                    lines.push(Line::default());
                    lines.push(Line::from(Span::styled(
                        "Sources:",
                        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                    )));
                    for source in citations {
                        lines.push(Line::from(Span::styled(
                            format!("▸ {} ({})", source.source, source.category),
                            Style::default().fg(Color::Magenta),
                        )));
                        lines.push(Line::from(Span::styled(
                            format!("  {}", source.content),
                            Style::default().fg(Color::Gray),
                        )));
                    }
                }
            }
        }
        lines.push(Line::default());
    }

    if chat.loading {
        lines.push(Line::from(Span::styled(
            "AskGTM:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_ask_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    app.scroll_area = Some(chat_area);
    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let stats = match &app.chat.stats {
        Some(stats) => format!(
            " {} documents · {} categories ",
            stats.total_documents,
            stats.categories.len()
        ),
        None => String::new(),
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" AskGTM AI - your GTM knowledge assistant ")
        .title_bottom(Line::from(stats).right_aligned());

    if app.chat.messages.is_empty() && !app.chat.loading {
        let mut lines = vec![
            Line::from(Span::styled(
                "Ask me anything about GTM",
                Style::default().fg(Color::White).bold(),
            )),
            Line::from(Span::styled(
                "Try one of these questions:",
                Style::default().fg(Color::Gray),
            )),
            Line::default(),
        ];
        let selected = app.example_state.selected().unwrap_or(0);
        lines.extend(EXAMPLE_QUESTIONS.iter().enumerate().map(|(i, question)| {
            if i == selected {
                Line::from(Span::styled(
                    format!("> {}", question),
                    Style::default().fg(Color::Magenta).bold(),
                ))
            } else {
                Line::from(format!("  {}", question))
            }
        }));

        let welcome = Paragraph::new(lines).block(chat_block).wrap(Wrap { trim: false });
        frame.render_widget(welcome, chat_area);
    } else {
        let chat = Paragraph::new(Text::from(chat_lines(&app.chat, app.animation_frame)))
            .block(chat_block)
            .wrap(Wrap { trim: false })
            .scroll((app.chat_scroll, 0));
        frame.render_widget(chat, chat_area);
    }

    render_text_input(
        frame,
        input_area,
        " Ask about pricing, objections, features, competitors... ",
        &app.chat_input,
        app.chat_cursor,
        app.input_mode == InputMode::Editing,
    );
}

/// Single-line bordered input with horizontal scrolling to keep the cursor visible
fn render_text_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    cursor: usize,
    editing: bool,
) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = value.chars().skip(scroll_offset).take(inner_width).collect();
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Result cards for scored deals
pub fn deal_lines(deals: &[&DealScore]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for deal in deals {
        lines.push(Line::from(vec![
            Span::styled(deal.company_name.clone(), Style::default().bold()),
            Span::raw("  "),
            Span::styled(format_currency(deal.deal_value), Style::default().fg(Color::Gray)),
        ]));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}%", deal.close_probability),
                Style::default().fg(Color::Green).bold(),
            ),
            Span::raw(" close  "),
            Span::styled(
                format!("{} Risk", deal.risk_level),
                Style::default().fg(risk_color(&deal.risk_level)).bold(),
            ),
        ]));
        lines.push(Line::from(deal.reasoning.clone()));
        if !deal.next_actions.is_empty() {
            lines.push(Line::from(Span::styled(
                "Next Actions:",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                deal.next_actions
                    .iter()
                    .map(|action| Line::from(format!("  • {}", action))),
            );
        }
        lines.push(Line::from(Span::styled(
            "─".repeat(40),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn render_deals_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, summary_area, results_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    render_text_input(
        frame,
        input_area,
        " Upload your deals CSV (path) ",
        &app.deal_path_input,
        app.deal_cursor,
        app.input_mode == InputMode::Editing,
    );

    let summary = if app.deals.loading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Line::from(Span::styled(
            format!(" Analyzing{}", dots),
            Style::default().fg(Color::Yellow),
        ))
    } else if app.deals.results.is_empty() {
        Line::from(Span::styled(
            " DealSense AI - pipeline forecasting + AI deal scoring",
            Style::default().fg(Color::Gray),
        ))
    } else {
        Line::from(vec![
            Span::raw(format!(" {} deals", app.deals.results.len())),
            Span::styled(
                format!("  pipeline {}", format_currency(app.deals.total_value())),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                format!("  weighted {}", format_currency(app.deals.weighted_forecast())),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("  {} high risk", app.deals.high_risk().len()),
                Style::default().fg(Color::Red),
            ),
        ])
    };
    frame.render_widget(Paragraph::new(summary), summary_area);

    app.scroll_area = Some(results_area);
    let title = if app.high_risk_only {
        " Results (high risk only) "
    } else {
        " Results "
    };
    let results = Paragraph::new(Text::from(deal_lines(&app.visible_deals())))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true })
        .scroll((app.deal_scroll, 0));
    frame.render_widget(results, results_area);
}

fn channel_line(selected: Channel) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for channel in Channel::all() {
        let style = if channel == selected {
            Style::default().fg(Color::Black).bg(Color::Blue).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", channel.display_name()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_outreach_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [form_area, result_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let focused = app.focused_row();
    let editing = app.input_mode == InputMode::Editing;
    let inner_width = form_area.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_row = None;

    for (row, focus) in OutreachFocus::all().into_iter().enumerate() {
        let marker = if focus == focused { "> " } else { "  " };
        let label_style = if focus == focused {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().bold()
        };

        match focus {
            OutreachFocus::Channel => {
                lines.push(Line::from(Span::styled(format!("{}Channel", marker), label_style)));
                lines.push(channel_line(app.outreach.form.channel));
            }
            OutreachFocus::Field(field) => {
                let required = if field.required() { " *" } else { "" };
                lines.push(Line::from(Span::styled(
                    format!("{}{}{}", marker, field.label(), required),
                    label_style,
                )));

                let value = app.outreach.form.field(field);
                if focus == focused && editing {
                    cursor_row = Some(row);
                }
                let offset = if focus == focused && app.field_cursor >= inner_width {
                    app.field_cursor - inner_width + 1
                } else {
                    0
                };
                lines.push(if value.is_empty() {
                    Line::from(Span::styled(
                        format!("  {}", field.placeholder()),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let visible: String = value.chars().skip(offset).take(inner_width).collect();
                    Line::from(Span::styled(format!("  {}", visible), Style::default().fg(Color::Cyan)))
                });
            }
            OutreachFocus::Generate => {
                let label = if app.outreach.loading {
                    "Generating...".to_string()
                } else {
                    "Generate Outreach".to_string()
                };
                let style = if app.outreach.can_generate() {
                    Style::default().fg(Color::Black).bg(Color::Green).bold()
                } else {
                    Style::default().fg(Color::Gray).bg(Color::DarkGray)
                };
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::styled(marker, label_style),
                    Span::styled(format!(" {} ", label), style),
                ]));
            }
        }
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Prospect Information "),
    );
    frame.render_widget(form, form_area);

    if let Some(row) = cursor_row {
        let offset = app.field_cursor.saturating_sub(inner_width.saturating_sub(1));
        let x = form_area.x + 1 + 2 + (app.field_cursor - offset) as u16;
        let y = form_area.y + 1 + (row as u16) * 2 + 1;
        frame.set_cursor_position((x, y));
    }

    app.scroll_area = Some(result_area);
    let result_text = if app.outreach.loading {
        Text::from(Span::styled(
            "AI agents are crafting your perfect outreach...",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        match &app.outreach.result {
            Some(result) => Text::from(outreach_lines(result)),
            None => Text::from(Span::styled(
                "Fill in the form and press g to create personalized outreach",
                Style::default().fg(Color::DarkGray),
            )),
        }
    };

    let result = Paragraph::new(result_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Generated Outreach "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.outreach_scroll, 0));
    frame.render_widget(result, result_area);
}

pub fn outreach_lines(result: &OutreachResult) -> Vec<Line<'static>> {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        ))
    };
    let mut lines = Vec::new();

    if let Some(subject) = result.subject() {
        lines.push(heading("Subject Line"));
        lines.push(Line::from(Span::styled(subject.to_string(), Style::default().bold())));
        lines.push(Line::default());
    }

    lines.push(heading("Message"));
    lines.extend(result.body.lines().map(|line| Line::from(line.to_string())));
    lines.push(Line::default());

    lines.push(heading("Call to Action"));
    lines.push(Line::from(Span::styled(
        result.call_to_action.clone(),
        Style::default().fg(Color::Green),
    )));
    lines.push(Line::default());

    if !result.personalization_elements.is_empty() {
        lines.push(heading("Personalization Elements"));
        lines.extend(
            result
                .personalization_elements
                .iter()
                .map(|element| Line::from(format!("  ✓ {}", element))),
        );
        lines.push(Line::default());
    }

    if !result.reasoning.is_empty() {
        lines.push(heading("Why This Works"));
        lines.push(Line::from(Span::styled(
            result.reasoning.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    lines
}
