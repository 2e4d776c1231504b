use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::card::CardState;
use crate::domain::CardConfig;
use crate::model::{CardLine, Model, UIData};
use crate::presentation::Mode;

pub const CMDLINE_HEIGHT: usize = 1;
pub const TABLE_BORDER: usize = 2;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const CHECK_COLUMN_WIDTH: usize = 3;
pub const COLUMN_SPACING: usize = 1;

pub struct TableUI {
    max_field_width: usize,
}

impl TableUI {
    pub fn new(cfg: &CardConfig) -> Self {
        Self {
            max_field_width: cfg.max_field_width,
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, status_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(CMDLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        if uidata.nlines == 0 {
            self.draw_empty(uidata, frame, table_area);
        } else {
            self.draw_cards(uidata, frame, table_area);
        }
        self.draw_statusline(uidata, frame, status_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_empty(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let text = if uidata.name.is_empty() {
            "Nothing to show"
        } else {
            "All cards are hidden, press Tab to edit"
        };
        let block = Block::bordered().title(Line::from(format!(" {} ", uidata.name)).bold());
        frame.render_widget(
            Paragraph::new(text).centered().block(block).dark_gray(),
            area,
        );
    }

    fn draw_cards(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let (first, last) = uidata.selection;
        let rows: Vec<Row> = uidata
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let mut style = Self::line_style(line);
                if first <= idx && idx <= last {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                if idx == uidata.selected_row {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let mut cells = Vec::with_capacity(3);
                if uidata.mode == Mode::Edit {
                    cells.push(Cell::from(line.check));
                }
                cells.push(Cell::from(line.field.as_str()).yellow());
                cells.push(Cell::from(line.value.as_str()));
                Row::new(cells).style(style)
            })
            .collect();

        let field_width = std::cmp::min(uidata.field_width, self.max_field_width) as u16;
        let mut widths = Vec::with_capacity(3);
        let mut header = Vec::with_capacity(3);
        if uidata.mode == Mode::Edit {
            widths.push(Constraint::Length(CHECK_COLUMN_WIDTH as u16));
            header.push(Cell::from(""));
        }
        widths.push(Constraint::Length(field_width));
        widths.push(Constraint::Min(uidata.value_width as u16));
        header.push(Cell::from("Field"));
        header.push(Cell::from("Value"));

        let mut title = Line::from(vec![
            Span::from(format!(" {} ", uidata.name)).bold(),
            Span::from(format!(
                "record {}/{} ",
                uidata.record_idx + 1,
                uidata.nrecords
            )),
        ]);
        if uidata.nhidden > 0 {
            title.push_span(Span::from(format!("({} hidden) ", uidata.nhidden)).dark_gray());
        }
        let position = Line::from(format!(
            " {}/{} ",
            uidata.abs_selected_row + 1,
            uidata.nlines
        ));
        let mut block = Block::bordered()
            .title(title)
            .title_bottom(position.right_aligned());
        if uidata.layout.table_width < uidata.min_width {
            let hint = format!(" terminal too narrow, {} columns fit best ", uidata.min_width);
            block = block.title_bottom(Line::from(hint).left_aligned().red());
        }

        let table = Table::new(rows, widths)
            .header(Row::new(header).style(Style::new().bold().underlined()))
            .column_spacing(COLUMN_SPACING as u16)
            .block(block);
        frame.render_widget(table, area);
    }

    fn line_style(line: &CardLine) -> Style {
        match line.state {
            CardState::Visible => Style::new(),
            CardState::Hidden => Style::new().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            CardState::Disabled => Style::new().fg(Color::DarkGray),
        }
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_prompt {
            let prompt = "Go to record: ";
            let line = Line::from(vec![
                Span::from(prompt).bold(),
                Span::from(uidata.prompt.input.as_str()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position((
                area.x + (prompt.len() + uidata.prompt.curser_pos) as u16,
                area.y,
            ));
            return;
        }

        let mode = match uidata.mode {
            Mode::View => "VIEW",
            Mode::Edit => "EDIT",
        };
        let [message_area, mode_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(mode.len() as u16 + 8)])
                .areas(area);
        frame.render_widget(Paragraph::new(uidata.status_message.as_str()), message_area);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::from(mode).bold(),
                Span::from(" ? help"),
            ]))
            .right_aligned(),
            mode_area,
        );
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = Self::popup_area(frame.area(), 60, 80);
        let block = Block::bordered().title(Line::from(" Help ").bold().centered());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(uidata.popup_message.as_str()).block(block),
            area,
        );
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
        let horizontal =
            Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
        let [area] = vertical.areas(area);
        let [area] = horizontal.areas(area);
        area
    }
}
