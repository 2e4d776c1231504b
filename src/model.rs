use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::card::CardState;
use crate::domain::{CardConfig, CardError, ColumnId, HELP_TEXT, Message};
use crate::drag::move_selection;
use crate::events::Change;
use crate::presentation::{Mode, TriState, cycle_visibility, rendered_ids};
use crate::prompt::{Prompt, PromptResult};
use crate::row_cursor::RowCursor;
use crate::sheet::Sheet;
use crate::table::Table;
use crate::ui::{
    CHECK_COLUMN_WIDTH, CMDLINE_HEIGHT, COLUMN_SPACING, TABLE_BORDER, TABLE_HEADER_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    CARDS,
    POPUP,
    PROMPT,
}

/// A rendered card line, ready for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLine {
    pub check: &'static str,
    pub field: String,
    pub value: String,
    pub state: CardState,
}

pub struct UIData {
    pub name: String,
    pub mode: Mode,
    pub lines: Vec<CardLine>, // Lines inside the visible window
    pub nlines: usize,        // Total number of lines in the current mode
    pub selected_row: usize,  // Relative to the window
    pub selection: (usize, usize), // Relative to the window, inclusive
    pub abs_selected_row: usize,
    pub record_idx: usize,
    pub nrecords: usize,
    pub nhidden: usize, // Cards not shown in view mode
    pub field_width: usize,
    pub value_width: usize,
    pub min_width: usize, // Table width the size hint asks for
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub prompt: PromptResult,
    pub active_prompt: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            mode: Mode::View,
            lines: Vec::new(),
            nlines: 0,
            selected_row: 0,
            selection: (0, 0),
            abs_selected_row: 0,
            record_idx: 0,
            nrecords: 0,
            nhidden: 0,
            field_width: 0,
            value_width: 0,
            min_width: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            prompt: PromptResult::default(),
            active_prompt: false,
            status_message: String::new(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_width = ui_width.saturating_sub(TABLE_BORDER);
        // Always keep room for at least one card line
        let table_height = std::cmp::max(
            1,
            ui_height.saturating_sub(CMDLINE_HEIGHT + TABLE_BORDER + TABLE_HEADER_HEIGHT),
        );

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: CardConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    mode: Mode,
    sheet: Option<Sheet>,
    curser_row: usize,
    curser_offset: usize,
    anchor: Option<usize>, // Absolute line where a block selection started
    rendered_revision: u64,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    prompt: Prompt,
    last_input: PromptResult,
    status_message: String,
}

impl Model {
    pub fn init(config: &CardConfig, ui_width: usize, ui_height: usize) -> Result<Self, CardError> {
        let mut model = Self {
            config: config.clone(),
            status: Status::EMPTY,
            modus: Modus::CARDS,
            previous_modus: Modus::CARDS,
            mode: Mode::View,
            sheet: None,
            curser_row: 0,
            curser_offset: 0,
            anchor: None,
            rendered_revision: 0,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            prompt: Prompt::default(),
            last_input: PromptResult::default(),
            status_message: "Started cardview!".to_string(),
        };
        model.update_card_data();
        Ok(model)
    }

    pub fn load_data_file(&mut self, path: PathBuf) -> Result<bool, CardError> {
        self.set_status_message("Loading ...");
        let table = Table::load(path)?;
        self.load_table(table)
    }

    /// Replaces the current sheet. A table without columns is not an error,
    /// the model switches to its empty state and returns false.
    pub fn load_table(&mut self, table: Table) -> Result<bool, CardError> {
        let start_time = Instant::now();
        let name = table.name.clone();
        let mut sheet = match Sheet::from_table(table, &self.config) {
            Ok(sheet) => sheet,
            Err(CardError::InvalidInput(reason)) => {
                info!("Nothing to show for {name}: {reason}");
                self.sheet = None;
                self.status = Status::EMPTY;
                self.set_status_message(format!("{name} has no columns"));
                self.update_card_data();
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        sheet.cards_mut().subscribe(Change::OrderChanged, |_, cards| {
            trace!("Order changed, revision {}", cards.revision());
        });
        sheet.cards_mut().subscribe(Change::VisibilityChanged, |_, cards| {
            debug!(
                "Visibility changed, {}/{} cards shown",
                cards.visible_cards(false).len(),
                cards.len()
            );
        });

        self.sheet = Some(sheet);
        self.status = Status::READY;
        self.curser_row = 0;
        self.curser_offset = 0;
        self.anchor = None;
        self.update_card_data();
        self.set_status_message(format!(
            "Loaded {name} in {}ms ...",
            start_time.elapsed().as_millis()
        ));
        Ok(true)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::PROMPT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        let selected = self.selected_line();
        self.select_line(selected);
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), CardError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::CARDS => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_selection_down(1, false),
                    Message::MoveUp => self.move_selection_up(1, false),
                    Message::MovePageDown => {
                        self.move_selection_down(self.uilayout.table_height, false)
                    }
                    Message::MovePageUp => {
                        self.move_selection_up(self.uilayout.table_height, false)
                    }
                    Message::MoveBeginning => {
                        self.anchor = None;
                        self.select_line(0)
                    }
                    Message::MoveEnd => {
                        self.anchor = None;
                        self.select_line(usize::MAX)
                    }
                    Message::ExtendSelectionDown => self.move_selection_down(1, true),
                    Message::ExtendSelectionUp => self.move_selection_up(1, true),
                    Message::PreviousRecord => self.navigate_record(RowCursor::prev),
                    Message::NextRecord => self.navigate_record(RowCursor::next),
                    Message::FirstRecord => self.navigate_record(RowCursor::first),
                    Message::LastRecord => self.navigate_record(RowCursor::last),
                    Message::ToggleEditMode => self.toggle_edit_mode()?,
                    Message::CycleVisibility => self.cycle_visibility()?,
                    Message::ToggleDisabled => self.toggle_disabled()?,
                    Message::MoveCardsUp => self.move_cards(true)?,
                    Message::MoveCardsDown => self.move_cards(false)?,
                    Message::GotoRecord => self.enter_prompt(),
                    Message::CopyValue => self.copy_value(),
                    Message::CopyRecord => self.copy_record(),
                    Message::ResetOrder => self.reset_order()?,
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Help => self.show_help(),
                    Message::Exit => self.exit(),
                    Message::Enter | Message::RawKey(_) => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::Enter | Message::Help => self.exit(),
                    _ => (),
                },
                Modus::PROMPT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }

        // Engine mutations only bump the revision; pick them up here.
        if self.revision() != self.rendered_revision {
            let selected = self.selected_line();
            self.select_line(selected);
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn revision(&self) -> u64 {
        self.sheet
            .as_ref()
            .map(|s| s.cards().revision())
            .unwrap_or(0)
    }

    fn line_count(&self) -> usize {
        self.sheet
            .as_ref()
            .map(|s| rendered_ids(s.cards(), self.mode).len())
            .unwrap_or(0)
    }

    fn selected_line(&self) -> usize {
        self.curser_offset + self.curser_row
    }

    fn selection_range(&self) -> (usize, usize) {
        let selected = self.selected_line();
        match self.anchor {
            Some(anchor) => (
                std::cmp::min(anchor, selected),
                std::cmp::max(anchor, selected),
            ),
            None => (selected, selected),
        }
    }

    /// Moves the cursor to absolute line `line`, clamped to the existing lines,
    /// and scrolls the window so it stays visible.
    fn select_line(&mut self, line: usize) {
        let nlines = self.line_count();
        let height = self.uilayout.table_height;
        let line = std::cmp::min(line, nlines.saturating_sub(1));

        if line < self.curser_offset {
            self.curser_offset = line;
        } else if line >= self.curser_offset + height {
            self.curser_offset = line + 1 - height;
        }
        // Shrinking lists must not leave the window past the end
        self.curser_offset = std::cmp::min(self.curser_offset, nlines.saturating_sub(height));
        self.curser_row = line - self.curser_offset;

        if let Some(anchor) = self.anchor {
            self.anchor = Some(std::cmp::min(anchor, nlines.saturating_sub(1)));
        }
        self.update_card_data();
    }

    fn move_selection_up(&mut self, size: usize, extend: bool) {
        self.set_anchor(extend);
        let line = self.selected_line().saturating_sub(size);
        self.select_line(line);
    }

    fn move_selection_down(&mut self, size: usize, extend: bool) {
        self.set_anchor(extend);
        let line = self.selected_line().saturating_add(size);
        self.select_line(line);
    }

    fn set_anchor(&mut self, extend: bool) {
        if !extend {
            self.anchor = None;
        } else if self.anchor.is_none() {
            self.anchor = Some(self.selected_line());
        }
    }

    fn navigate_record(&mut self, step: impl FnOnce(&mut RowCursor) -> bool) {
        if let Some(sheet) = self.sheet.as_mut()
            && step(sheet.rows_mut())
        {
            self.update_card_data();
        }
    }

    fn toggle_edit_mode(&mut self) -> Result<(), CardError> {
        let Some(sheet) = self.sheet.as_ref() else {
            return Ok(());
        };
        // Keep the cursor on the same card when it exists in both modes
        let selected_id = rendered_ids(sheet.cards(), self.mode)
            .get(self.selected_line())
            .copied();
        self.mode = self.mode.toggled();
        let line = selected_id
            .and_then(|id| {
                rendered_ids(sheet.cards(), self.mode)
                    .iter()
                    .position(|&r| r == id)
            })
            .unwrap_or(0);

        debug!("Switched to {:?} mode", self.mode);
        self.anchor = None;
        self.select_line(line);
        let message = match self.mode {
            Mode::Edit => "Edit mode: Space cycles visibility, d disables, J/K move cards",
            Mode::View => "View mode",
        };
        self.set_status_message(message);
        Ok(())
    }

    fn cycle_visibility(&mut self) -> Result<(), CardError> {
        let line = self.selected_line();
        let mode = self.mode;
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        if line >= rendered_ids(sheet.cards(), mode).len() {
            return Ok(());
        }
        let message = match cycle_visibility(sheet.cards_mut(), mode, line)? {
            Some(tri_state) => {
                let state = match tri_state {
                    TriState::On => "shown",
                    TriState::Off => "hidden",
                    TriState::Partial => "disabled",
                };
                format!("Card {} {state}", line + 1)
            }
            None => "Switch to edit mode (Tab) to change visibility".to_string(),
        };
        self.set_status_message(message);
        Ok(())
    }

    fn toggle_disabled(&mut self) -> Result<(), CardError> {
        let line = self.selected_line();
        let mode = self.mode;
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        let Some(&id) = rendered_ids(sheet.cards(), mode).get(line) else {
            return Ok(());
        };
        let cards = sheet.cards_mut();
        let message = if cards.card(id)?.is_disabled() {
            cards.enable(id)?;
            format!("Enabled {}", cards.card(id)?.title())
        } else {
            cards.disable(id)?;
            format!("Disabled {}", cards.card(id)?.title())
        };
        self.set_status_message(message);
        Ok(())
    }

    // Moves the selected block one line, the selection follows the block.
    fn move_cards(&mut self, up: bool) -> Result<(), CardError> {
        let nlines = self.line_count();
        if nlines == 0 {
            return Ok(());
        }
        let (first, last) = self.selection_range();
        let dest = if up {
            if first == 0 {
                self.set_status_message("Already at the top");
                return Ok(());
            }
            first - 1
        } else {
            if last + 1 >= nlines {
                self.set_status_message("Already at the bottom");
                return Ok(());
            }
            last + 2
        };

        let mode = self.mode;
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        let ids: Vec<ColumnId> = rendered_ids(sheet.cards(), mode)[first..=last].to_vec();
        match move_selection(sheet.cards_mut(), mode, &ids, Some(dest)) {
            Ok(_) => {
                let shift = |line: usize| if up { line - 1 } else { line + 1 };
                self.anchor = self.anchor.map(shift);
                let line = shift(self.selected_line());
                self.select_line(line);
                Ok(())
            }
            Err(CardError::InvalidMove(reason)) => {
                self.set_status_message(format!("Can not move cards: {reason}"));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // Every enabled card goes back to its source position. Disabled cards
    // stay parked so `enable` can restore them.
    fn reset_order(&mut self) -> Result<(), CardError> {
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        let cards = sheet.cards_mut();
        let moved: Vec<(ColumnId, usize)> = cards
            .cards()
            .iter()
            .filter(|c| !c.is_disabled() && c.order() != c.order_info().default())
            .map(|c| (c.id(), c.order_info().default()))
            .collect();
        for &(id, default) in moved.iter() {
            cards.reorder(id, default)?;
        }
        debug!("Reset the order of {} cards", moved.len());
        self.anchor = None;
        self.set_status_message("Card order reset");
        Ok(())
    }

    fn enter_prompt(&mut self) {
        if self.sheet.is_none() {
            return;
        }
        trace!("Entering record prompt ...");
        self.previous_modus = self.modus;
        self.modus = Modus::PROMPT;
        self.prompt.clear();
        self.last_input = self.prompt.get();
        self.update_card_data();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.prompt.read(key);
        if self.last_input.finished {
            self.handle_prompt_input();
        }
        self.uidata.prompt = self.last_input.clone();
    }

    fn handle_prompt_input(&mut self) {
        trace!("Handle prompt input {:?}", self.last_input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::PROMPT;

        if self.last_input.canceled {
            self.update_card_data();
            return;
        }
        let Some(sheet) = self.sheet.as_mut() else {
            return;
        };
        let nrecords = sheet.rows().row_count();
        let accepted = self
            .last_input
            .record_index()
            .is_some_and(|idx| sheet.rows_mut().set_index(idx));
        if !accepted {
            self.set_status_message(format!(
                "Record '{}' out of range 1..{}",
                self.last_input.input, nrecords
            ));
        }
        self.update_card_data();
    }

    fn copy_value(&mut self) {
        let Some(line) = self.uidata.lines.get(self.uidata.selected_row) else {
            return;
        };
        let value = line.value.clone();
        trace!("Cell content: {}", value);
        self.copy_to_clipboard(value, "value");
    }

    fn copy_record(&mut self) {
        let Some(sheet) = self.sheet.as_ref() else {
            return;
        };
        let text = Self::record_as_text(&sheet.rows().items());
        self.copy_to_clipboard(text, "record");
    }

    /// One tab separated `field value` line per column, in source order.
    fn record_as_text(items: &[(&str, &str)]) -> String {
        items
            .iter()
            .map(|(field, value)| format!("{field}\t{value}"))
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn copy_to_clipboard(&mut self, text: String, what: &str) {
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .map_err(|e| debug!("Clipboard not available: {:?}", e))
                .ok();
        }
        let copied = self
            .clipboard
            .as_mut()
            .map(|clipboard| clipboard.set_text(text));
        match copied {
            Some(Ok(_)) => self.set_status_message(format!("Copied {what} to clipboard.")),
            Some(Err(e)) => self.set_status_message(format!("Error copying to clipboard: {e}")),
            None => self.set_status_message("No clipboard available."),
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.uidata.show_popup = false;
            }
            Modus::CARDS => {
                // Nothing to leave, only collapse a block selection
                if self.anchor.take().is_some() {
                    self.update_card_data();
                }
            }
            Modus::PROMPT => {}
        }
    }

    fn get_visible_name(name: &str, width: usize) -> String {
        if width < 3 {
            return String::new();
        }
        if name.chars().count() > width {
            let mut reduced: String = name.chars().take(width - 3).collect();
            reduced.push_str("...");
            return reduced;
        }
        name.to_string()
    }

    fn update_card_data(&mut self) {
        let layout = self.uilayout.clone();
        let Some(sheet) = self.sheet.as_ref() else {
            self.uidata = UIData {
                layout,
                status_message: self.status_message.clone(),
                ..UIData::empty()
            };
            return;
        };

        let check_width = match self.mode {
            Mode::Edit => CHECK_COLUMN_WIDTH + COLUMN_SPACING,
            Mode::View => 0,
        };
        let available = layout
            .table_width
            .saturating_sub(check_width + COLUMN_SPACING);
        let (field_width, value_width) = sheet
            .size_hint()
            .fit(available, self.config.max_field_width);

        let all_lines = sheet.render(self.mode);
        let rbegin = std::cmp::min(self.curser_offset, all_lines.len());
        let rend = std::cmp::min(rbegin + layout.table_height, all_lines.len());
        let lines: Vec<CardLine> = all_lines[rbegin..rend]
            .iter()
            .map(|row| CardLine {
                check: row.tri_state.symbol(),
                field: Self::get_visible_name(row.field, field_width),
                value: row.value.to_string(),
                state: row.card.state(),
            })
            .collect();

        let (first, last) = self.selection_range();
        trace!(
            "Cards: mode {:?}, Cr {}, Co {}, Rb {}, Re {}, sel {}..={}, fw {}, vw {}",
            self.mode,
            self.curser_row,
            self.curser_offset,
            rbegin,
            rend,
            first,
            last,
            field_width,
            value_width
        );

        let name = match self.mode {
            Mode::View => sheet.name().to_string(),
            Mode::Edit => format!("E[{}]", sheet.name()),
        };
        self.uidata = UIData {
            name,
            mode: self.mode,
            lines,
            nlines: all_lines.len(),
            selected_row: self.curser_row,
            selection: (
                first.saturating_sub(self.curser_offset),
                last.saturating_sub(self.curser_offset),
            ),
            abs_selected_row: self.selected_line(),
            record_idx: sheet.rows().index(),
            nrecords: sheet.rows().row_count(),
            nhidden: sheet
                .cards()
                .cards()
                .iter()
                .filter(|c| !c.is_visible())
                .count(),
            field_width,
            value_width,
            min_width: sheet.size_hint().min_width() + check_width,
            show_popup: self.modus == Modus::POPUP,
            popup_message: self.uidata.popup_message.clone(),
            layout,
            prompt: self.last_input.clone(),
            active_prompt: self.modus == Modus::PROMPT,
            status_message: self.status_message.clone(),
        };
        self.rendered_revision = sheet.cards().revision();
    }
}
