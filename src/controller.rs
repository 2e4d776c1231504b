use std::time::Duration;
use tracing::trace;

use crate::domain::{CardConfig, CardError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &CardConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, CardError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => (),
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, KeyModifiers::SHIFT) => Some(Message::ExtendSelectionUp),
            (KeyCode::Down, KeyModifiers::SHIFT) => Some(Message::ExtendSelectionDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::MoveBeginning),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::MoveEnd),
            (KeyCode::Char('h') | KeyCode::Left, _) => Some(Message::PreviousRecord),
            (KeyCode::Char('l') | KeyCode::Right, _) => Some(Message::NextRecord),
            (KeyCode::Char('H'), _) => Some(Message::FirstRecord),
            (KeyCode::Char('L'), _) => Some(Message::LastRecord),
            (KeyCode::Char('K'), _) => Some(Message::MoveCardsUp),
            (KeyCode::Char('J'), _) => Some(Message::MoveCardsDown),
            (KeyCode::Tab | KeyCode::Char('e'), _) => Some(Message::ToggleEditMode),
            (KeyCode::Char(' '), _) => Some(Message::CycleVisibility),
            (KeyCode::Char('d'), _) => Some(Message::ToggleDisabled),
            (KeyCode::Char(':'), _) => Some(Message::GotoRecord),
            (KeyCode::Char('c'), _) => Some(Message::CopyValue),
            (KeyCode::Char('C'), _) => Some(Message::CopyRecord),
            (KeyCode::Char('r'), _) => Some(Message::ResetOrder),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
