use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, UdirConfig, UdirError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &UdirConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, UdirError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            // While the search box is active every key belongs to it.
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(Self::handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Char('/') => Some(Message::EnterSearch),
            KeyCode::Char(c @ '1'..='6') => {
                Some(Message::SortByColumn(c as usize - '1' as usize))
            }
            KeyCode::Left | KeyCode::Char('h') => Some(Message::PrevPage),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::NextPage),
            KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Char('+') | KeyCode::Char(']') => Some(Message::GrowPageSize),
            KeyCode::Char('-') | KeyCode::Char('[') => Some(Message::ShrinkPageSize),
            KeyCode::Char('d') => Some(Message::ToggleDense),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Char('y') => Some(Message::CopyRow),
            KeyCode::Char('r') => Some(Message::Reload),
            KeyCode::Esc => Some(Message::DismissNotice),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
