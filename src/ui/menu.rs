use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let height = app.categories().len() as u16 + 9;
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "CATEGORY QUIZ",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from("Pick a category".fg(Color::DarkGray)),
        Line::from(""),
    ];

    for (index, category) in app.categories().iter().enumerate() {
        let style = if index == app.category_cursor() {
            Style::default().fg(Color::Green).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if index == app.category_cursor() { ">" } else { " " };
        content.push(Line::from(Span::styled(
            format!("{} {}", marker, category.to_uppercase()),
            style,
        )));
    }

    if let Some(status) = app.status() {
        content.push(Line::from(""));
        content.push(Line::from(status.fg(Color::Red)));
    }

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, chunks[1]);

    let controls = Paragraph::new("j/k navigate  ·  enter start  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(controls, chunks[3]);
}
