use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Fill(1),
    ])
    .margin(2)
    .split(area);

    let content = vec![
        Line::from(Span::styled(
            "Could not load questions",
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(app.load_error().unwrap_or("unknown error").fg(Color::Gray)),
        Line::from(""),
        Line::from("q to quit".fg(Color::DarkGray)),
    ];

    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Color::Red),
        );
    frame.render_widget(widget, chunks[1]);
}
