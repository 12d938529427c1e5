use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(summary) = app.summary() else {
        return;
    };
    let percentage = calculate_percentage(summary.score, summary.total);
    let grade_color = get_grade_color(percentage);

    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Quiz Completed!",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Your final score: {} / {}  ({:.0}%)", summary.score, summary.total, percentage),
            Style::default().fg(grade_color).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(summary.message(), Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from("Thank You".fg(Color::DarkGray)),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, chunks[1]);

    let controls = Paragraph::new("r retry  ·  enter menu  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(controls, chunks[3]);
}

fn calculate_percentage(score: usize, total: usize) -> f64 {
    if total > 0 {
        (score as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

fn get_grade_color(percentage: f64) -> Color {
    match percentage as u32 {
        90..=100 => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}
