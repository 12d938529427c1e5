use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::app::App;
use crate::presenter::{Feedback, QuestionView};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(question) = app.question() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_header(frame, chunks[0], question, app);
    render_question_text(frame, chunks[1], &question.text);
    render_options(frame, chunks[2], &question.choices, app);
    render_feedback(frame, chunks[3], app.feedback(), app.score());
    render_controls(frame, chunks[4], app.status());
}

fn render_header(frame: &mut Frame, area: Rect, question: &QuestionView, app: &App) {
    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let timer_color = if app.remaining() <= 5 {
        Color::Red
    } else {
        Color::Yellow
    };
    let timer = if app.feedback().is_some() {
        Paragraph::new("")
    } else {
        Paragraph::new(format!("{}s", app.remaining())).fg(timer_color).bold()
    };
    frame.render_widget(timer, halves[0]);

    let progress = format!(
        "{}  {}/{}",
        question.category.to_uppercase(),
        question.number,
        question.total
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, halves[1]);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_options(frame: &mut Frame, area: Rect, options: &[String], app: &App) {
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (index, option) in options.iter().enumerate() {
        let is_cursor = index == app.choice_cursor();
        let is_selected = app.selected() == Some(index);
        let style = if is_selected {
            Style::default().fg(Color::Green).bold()
        } else if is_cursor {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if is_cursor { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", index + 1), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_feedback(frame: &mut Frame, area: Rect, feedback: Option<&Feedback>, score: usize) {
    let mut lines = Vec::with_capacity(2);
    if let Some(feedback) = feedback {
        let color = if feedback.outcome.is_correct() {
            Color::Green
        } else {
            Color::Red
        };
        lines.push(Line::from(Span::styled(
            feedback.message.as_str(),
            Style::default().fg(color).bold(),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!("Score: {}", score),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// A rejected key shows its reason in place of the hints until the next
/// question.
fn render_controls(frame: &mut Frame, area: Rect, status: Option<&str>) {
    let widget = match status {
        Some(status) => Paragraph::new(status).fg(Color::Red),
        None => Paragraph::new("j/k navigate  ·  space select  ·  enter submit  ·  esc menu  ·  q quit")
            .fg(Color::DarkGray),
    };
    frame.render_widget(widget.alignment(Alignment::Center), area);
}
