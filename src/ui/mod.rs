mod load_failed;
mod menu;
mod quiz;
mod result;

use ratatui::{prelude::*, widgets::Block};

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match app.screen {
        Screen::Menu => menu::render(frame, area, app),
        Screen::Question => quiz::render(frame, area, app),
        Screen::Results => result::render(frame, area, app),
        Screen::LoadFailed => load_failed::render(frame, area, app),
    }
}
