use tracing::info;

use crate::card_table::CardTable;
use crate::domain::{CardConfig, CardError};
use crate::presentation::{CardRow, Mode, render};
use crate::row_cursor::RowCursor;
use crate::sizing::SizeHint;
use crate::table::Table;

/// Card engine and row cursor of one loaded table. Loading another table
/// builds a new `Sheet`.
#[derive(Debug)]
pub struct Sheet {
    name: String,
    cards: CardTable,
    rows: RowCursor,
    size_hint: SizeHint,
}

impl Sheet {
    pub fn from_table(table: Table, config: &CardConfig) -> Result<Self, CardError> {
        let cards = CardTable::load(table.column_stats())?;
        let size_hint = SizeHint::from_table(&cards);
        let rows = RowCursor::new(table.columns, config.navigation);
        info!(
            "Sheet {}: {} cards, {} records, {:?}",
            table.name,
            cards.len(),
            rows.row_count(),
            size_hint
        );
        Ok(Sheet {
            name: table.name,
            cards,
            rows,
            size_hint,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cards(&self) -> &CardTable {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut CardTable {
        &mut self.cards
    }

    pub fn rows(&self) -> &RowCursor {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut RowCursor {
        &mut self.rows
    }

    pub fn size_hint(&self) -> SizeHint {
        self.size_hint
    }

    pub fn render(&self, mode: Mode) -> Vec<CardRow<'_>> {
        render(&self.cards, &self.rows, mode)
    }
}
