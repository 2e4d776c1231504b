use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line input for a record number.
#[derive(Default)]
pub struct Prompt {
    digits: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PromptResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl PromptResult {
    /// Zero based record index of a finished, non empty input.
    pub fn record_index(&self) -> Option<usize> {
        if !self.finished || self.canceled {
            return None;
        }
        self.input.parse::<usize>().ok()?.checked_sub(1)
    }
}

impl Prompt {
    pub fn read(&mut self, key: KeyEvent) -> PromptResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.clear();
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => {
                if self.curser_pos > 0 {
                    self.curser_pos -= 1;
                    self.digits.remove(self.curser_pos);
                }
            }
            (KeyCode::Left, _) => self.curser_pos = self.curser_pos.saturating_sub(1),
            (KeyCode::Right, _) => {
                self.curser_pos = std::cmp::min(self.curser_pos + 1, self.digits.len())
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) if c.is_ascii_digit() => {
                self.digits.insert(self.curser_pos, c);
                self.curser_pos += 1;
            }
            (code, _) => trace!("Prompt ignores {code:?}"),
        }
        self.get()
    }

    pub fn get(&self) -> PromptResult {
        PromptResult {
            input: self.digits.clone(),
            finished: self.finished,
            canceled: self.canceled,
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.digits.clear();
        self.curser_pos = 0;
        self.finished = false;
        self.canceled = false;
    }
}
