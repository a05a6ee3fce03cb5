use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Screen};
use crate::form::Banner;
use crate::request::Field;

pub fn draw(f: &mut Frame, app: &mut App) {
    match app.screen {
        Screen::Form => render_form_screen(f, app),
        Screen::Summary => render_summary_screen(f, app),
        Screen::MyRequests => render_my_requests_screen(f, app),
    }
}

fn title(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn help(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP))
}

fn screen_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area)
}

fn render_form_screen(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.size());
    f.render_widget(title("Credit Request Form"), chunks[0]);

    let errors = app.form.errors();
    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0;
    let mut section = "";

    for field in Field::ALL {
        if field.section() != section {
            section = field.section();
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(
                Line::from(section)
                    .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            );
        }

        let focused = field == app.focus;
        if focused {
            focus_line = lines.len();
        }

        let value = app.form.value(field);
        let shown = if field.is_choice() {
            if value.is_empty() {
                "‹ select ›".to_string()
            } else if field == Field::Term {
                format!("‹ {} months ›", value)
            } else {
                format!("‹ {} ›", value)
            }
        } else if field == Field::Amount || field == Field::MonthlyIncome {
            format!("${}", value)
        } else {
            value.to_string()
        };

        let marker = if focused { "▶ " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{}: ", marker, field.label()), style),
            Span::styled(shown, Style::default().fg(Color::Yellow)),
        ]));

        if let Some(msg) = errors.get(field) {
            lines.push(
                Line::from(format!("    {} {}", field.label(), msg))
                    .style(Style::default().fg(Color::Red)),
            );
        }

        if field == Field::Purpose {
            if let Some(installment) = app.form.installment() {
                lines.push(Line::from(vec![
                    Span::raw("  Estimated monthly installment: "),
                    Span::styled(
                        format_money(installment),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                ]));
            }
        }
    }

    let body = Block::default()
        .borders(Borders::ALL)
        .title("Fill in your personal, credit and employment data");
    let visible = chunks[1].height.saturating_sub(2) as usize;
    let scroll = (focus_line + 2).saturating_sub(visible) as u16;
    f.render_widget(Paragraph::new(lines).block(body).scroll((scroll, 0)), chunks[1]);

    f.render_widget(status_line(app), chunks[2]);

    f.render_widget(
        help("Tab/↓: next | Shift+Tab/↑: previous | ←/→: choose option | Enter: view summary | Esc: quit"),
        chunks[3],
    );
}

fn status_line(app: &App) -> Paragraph<'static> {
    if let Some(banner) = app.form.banner() {
        let color = match banner {
            Banner::SubmissionFailed => Color::LightRed,
            Banner::Incomplete | Banner::FixErrors => Color::Red,
        };
        Paragraph::new(banner.message())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
    } else if app.form.is_submitted() {
        Paragraph::new("Request submitted successfully!")
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
    } else {
        Paragraph::new("")
    }
}

fn render_summary_screen(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.size());
    f.render_widget(title("Request Summary"), chunks[0]);

    let form = &app.form;
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(value),
        ])
    };
    let money = |field: Field| {
        form.value(field)
            .parse::<f64>()
            .map(format_money)
            .unwrap_or_else(|_| form.value(field).to_string())
    };

    let text = vec![
        row("Name", form.value(Field::FullName).to_string()),
        row("National ID", form.value(Field::NationalId).to_string()),
        row("Email", form.value(Field::Email).to_string()),
        row("Phone", form.value(Field::Phone).to_string()),
        Line::from(""),
        row("Credit type", form.value(Field::CreditType).to_string()),
        row("Amount", money(Field::Amount)),
        row("Term", format!("{} months", form.value(Field::Term))),
        row("Purpose", form.value(Field::Purpose).to_string()),
        Line::from(vec![
            Span::styled("Monthly installment: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                form.installment().map(format_money).unwrap_or_default(),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        row("Employer", form.value(Field::Employer).to_string()),
        row("Job title", form.value(Field::JobTitle).to_string()),
        row("Income", money(Field::MonthlyIncome)),
    ];

    let summary = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Request Details"))
        .alignment(Alignment::Left);
    f.render_widget(summary, chunks[1]);

    let status = if form.is_submitting() {
        Paragraph::new("Submitting...")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
    } else {
        status_line(app)
    };
    f.render_widget(status, chunks[2]);

    let keys = if form.is_submitting() {
        "Waiting for the document store..."
    } else {
        "Enter/y: submit request | Esc/h/←: back to form | q: quit"
    };
    f.render_widget(help(keys), chunks[3]);
}

fn render_my_requests_screen(f: &mut Frame, app: &mut App) {
    let chunks = screen_chunks(f.size());
    f.render_widget(title("My Requests"), chunks[0]);

    let header = Row::new(vec!["Id", "Date", "Type", "Amount", "Term", "Installment"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(1);

    let rows = app.my_requests.iter().map(|stored| {
        let r = &stored.request;
        let style = if app.last_stored_id.as_deref() == Some(stored.id.as_str()) {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(stored.id.clone()),
            Cell::from(r.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::from(r.credit_type.label()),
            Cell::from(format_money(r.amount)),
            Cell::from(format!("{} m", r.term_months)),
            Cell::from(format_money(r.installment)),
        ])
        .style(style)
        .height(1)
    });

    let widths = [
        Constraint::Length(22),
        Constraint::Length(17),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(6),
        Constraint::Length(14),
    ];

    let email = app.context.submitted_email().unwrap_or_default();
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Requests for {}", email)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, chunks[1], &mut app.table_state);

    let status = if let Some(err) = &app.lookup_error {
        Paragraph::new(err.clone()).style(Style::default().fg(Color::Red))
    } else if app.is_loading_requests() {
        Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow))
    } else {
        status_line(app)
    };
    f.render_widget(status.alignment(Alignment::Center), chunks[2]);

    f.render_widget(
        help("j/k or ↑/↓: navigate | r: refresh | n/Esc: new request | q: quit"),
        chunks[3],
    );
}

/// `1234567.5` -> `$1,234,567.50`
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppContext;
    use crate::store::InMemoryRequestStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn rendered(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(91679.99), "$91,679.99");
        assert_eq!(format_money(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_money(999.5), "$999.50");
        assert_eq!(format_money(-1234.0), "-$1,234.00");
    }

    #[test]
    fn test_form_shows_errors_and_installment() {
        let mut app = App::new(Arc::new(InMemoryRequestStore::new()), AppContext::new());
        app.form.set_field(Field::Phone, "123").unwrap();
        app.form.set_field(Field::Amount, "1000000").unwrap();
        app.form.set_field(Field::Term, "12").unwrap();

        let screen = rendered(&mut app);
        assert!(screen.contains("Phone must be 10 digits"));
        assert!(screen.contains("$91,679.99"));
    }

    #[test]
    fn test_summary_lists_values() {
        let mut app = App::new(Arc::new(InMemoryRequestStore::new()), AppContext::new());
        app.form.set_field(Field::FullName, "Ana Torres").unwrap();
        app.form.set_field(Field::Amount, "1000000").unwrap();
        app.screen = Screen::Summary;

        let screen = rendered(&mut app);
        assert!(screen.contains("Request Summary"));
        assert!(screen.contains("Ana Torres"));
        assert!(screen.contains("$1,000,000.00"));
    }
}
