use tracing::{debug, trace};

use crate::card::{Card, CardSize, CardState};
use crate::domain::{CardError, ColumnId};
use crate::events::{Change, Observers};
use crate::sizing::{VALUE_WIDTH_GAP, gap_trimmed_average, longest_title};

/// Title and size statistics of one loaded column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStats {
    pub title: String,
    pub size: CardSize,
}

impl ColumnStats {
    pub fn new(title: impl Into<String>, size: CardSize) -> Self {
        ColumnStats {
            title: title.into(),
            size,
        }
    }
}

/// Source of truth for card order and visibility.
///
/// Every committed mutation bumps `revision` and notifies the observers
/// subscribed to the matching [`Change`].
#[derive(Debug)]
pub struct CardTable {
    cards: Vec<Card>,
    title_width: usize,
    value_width: usize,
    revision: u64,
    observers: Observers,
}

impl CardTable {
    pub fn load(columns: Vec<ColumnStats>) -> Result<Self, CardError> {
        Self::load_with_gap(columns, VALUE_WIDTH_GAP)
    }

    fn load_with_gap(columns: Vec<ColumnStats>, gap: usize) -> Result<Self, CardError> {
        if columns.is_empty() {
            return Err(CardError::InvalidInput("table has no columns".into()));
        }
        let cards: Vec<Card> = columns
            .into_iter()
            .enumerate()
            .map(|(idx, column)| Card::new(idx, column.title, column.size))
            .collect();

        let title_width = longest_title(cards.iter().map(|c| c.title()));
        let maxima: Vec<usize> = cards.iter().map(|c| c.size().max).collect();
        let value_width = gap_trimmed_average(&maxima, gap);

        for card in cards.iter() {
            trace!("Card: {card}");
        }
        debug!(
            "Loaded {} cards, title width {title_width}, value width {value_width}",
            cards.len()
        );

        Ok(CardTable {
            cards,
            title_width,
            value_width,
            revision: 0,
            observers: Observers::default(),
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn card(&self, id: ColumnId) -> Result<&Card, CardError> {
        self.cards.get(id).ok_or(CardError::UnknownColumn(id))
    }

    fn card_mut(&mut self, id: ColumnId) -> Result<&mut Card, CardError> {
        self.cards.get_mut(id).ok_or(CardError::UnknownColumn(id))
    }

    /// Longest title in characters.
    pub fn title_width(&self) -> usize {
        self.title_width
    }

    /// Typical value width in characters, long text columns trimmed.
    pub fn value_width(&self) -> usize {
        self.value_width
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe<F>(&mut self, change: Change, observer: F)
    where
        F: FnMut(Change, &CardTable) + 'static,
    {
        self.observers.subscribe(change, Box::new(observer));
    }

    /// All cards in edit mode, otherwise only the visible ones. Returned in
    /// id order.
    pub fn visible_cards(&self, include_hidden_and_disabled: bool) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| include_hidden_and_disabled || c.is_visible())
            .collect()
    }

    /// Like [`CardTable::visible_cards`] but sorted by current order. On ties
    /// disabled cards go last, then lower ids first.
    pub fn ordered_cards(&self, include_hidden_and_disabled: bool) -> Vec<&Card> {
        let mut cards = self.visible_cards(include_hidden_and_disabled);
        cards.sort_by_key(|c| (c.order(), c.is_disabled(), c.id()));
        cards
    }

    pub fn reorder(&mut self, id: ColumnId, pos: usize) -> Result<(), CardError> {
        self.card_mut(id)?.order_mut().move_to(pos);
        trace!("Reordered card {id} to {pos}");
        self.emit(&[Change::OrderChanged]);
        Ok(())
    }

    /// Assigns each listed id its position in `ids`. Unknown ids reject the
    /// whole call before anything is changed.
    pub fn reorder_many(&mut self, ids: &[ColumnId]) -> Result<(), CardError> {
        if let Some(&unknown) = ids.iter().find(|&&id| id >= self.cards.len()) {
            return Err(CardError::UnknownColumn(unknown));
        }
        if ids.is_empty() {
            return Ok(());
        }
        for (pos, &id) in ids.iter().enumerate() {
            self.cards[id].order_mut().move_to(pos);
        }
        trace!("Reordered cards to {ids:?}");
        self.emit(&[Change::OrderChanged]);
        Ok(())
    }

    /// Moves a card into `target`. Returns false when the card already was in
    /// that state.
    pub fn set_visibility(&mut self, id: ColumnId, target: CardState) -> Result<bool, CardError> {
        let last = self.cards.len() - 1;
        let card = self.card_mut(id)?;
        let before = card.state();
        if before == target {
            return Ok(false);
        }

        let mut changes = Vec::with_capacity(2);
        match (before, target) {
            (_, CardState::Disabled) => {
                card.order_mut().drop_to(last);
                card.set_disabled(true);
                changes.push(Change::OrderChanged);
            }
            (CardState::Disabled, _) => {
                card.set_disabled(false);
                card.set_shown(target == CardState::Visible);
                card.order_mut().restore();
                changes.push(Change::OrderChanged);
            }
            _ => card.set_shown(target == CardState::Visible),
        }
        changes.push(Change::VisibilityChanged);

        debug!("Card {id}: {before} -> {target}, order {}", card.order());
        self.emit(&changes);
        Ok(true)
    }

    /// Moves the card to the last position and disables it.
    pub fn disable(&mut self, id: ColumnId) -> Result<bool, CardError> {
        if self.card(id)?.is_disabled() {
            return Ok(false);
        }
        self.set_visibility(id, CardState::Disabled)
    }

    /// Re-enables a disabled card as visible at its previous position.
    pub fn enable(&mut self, id: ColumnId) -> Result<bool, CardError> {
        if !self.card(id)?.is_disabled() {
            return Ok(false);
        }
        self.set_visibility(id, CardState::Visible)
    }

    pub fn to_json(&self) -> Result<String, CardError> {
        let dump = serde_json::json!({ "cards": self.cards });
        Ok(serde_json::to_string_pretty(&dump)?)
    }

    fn emit(&mut self, changes: &[Change]) {
        self.revision += 1;
        let mut observers = std::mem::take(&mut self.observers);
        for &change in changes {
            observers.notify(change, self);
        }
        self.observers = observers;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn stats(titles: &[&str]) -> Vec<ColumnStats> {
        titles
            .iter()
            .map(|t| ColumnStats::new(*t, CardSize::from_values([*t])))
            .collect()
    }

    fn abcd() -> CardTable {
        CardTable::load(stats(&["A", "B", "C", "D"])).unwrap()
    }

    fn titles(cards: &[&Card]) -> Vec<String> {
        cards.iter().map(|c| c.title().to_string()).collect()
    }

    fn record(table: &mut CardTable) -> Rc<RefCell<Vec<Change>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for change in [Change::OrderChanged, Change::VisibilityChanged] {
            let sink = Rc::clone(&seen);
            table.subscribe(change, move |c, _| sink.borrow_mut().push(c));
        }
        seen
    }

    #[test]
    fn load_assigns_contiguous_ids_and_orders() {
        let table = abcd();
        for (idx, card) in table.cards().iter().enumerate() {
            assert_eq!(card.id(), idx);
            assert_eq!(card.order(), idx);
            assert_eq!(card.order_info().previous(), idx);
            assert_eq!(card.state(), CardState::Visible);
        }
        assert_eq!(table.revision(), 0);
    }

    #[test]
    fn load_rejects_zero_columns() {
        assert!(matches!(
            CardTable::load(Vec::new()),
            Err(CardError::InvalidInput(_))
        ));
    }

    #[test]
    fn widths_from_statistics() {
        let columns = [5, 6, 7, 8, 120]
            .iter()
            .enumerate()
            .map(|(i, &max)| {
                ColumnStats::new(format!("col{i}"), CardSize { min: 0, avg: 0, max })
            })
            .collect();
        let table = CardTable::load(columns).unwrap();
        assert_eq!(table.value_width(), 6);
        assert_eq!(table.title_width(), 4);
    }

    #[test]
    fn disable_and_enable_scenario() {
        let mut table = abcd();
        assert!(table.disable(1).unwrap());
        assert_eq!(titles(&table.ordered_cards(false)), ["A", "C", "D"]);
        assert_eq!(table.card(1).unwrap().order(), 3);

        assert!(table.enable(1).unwrap());
        assert_eq!(titles(&table.ordered_cards(false)), ["A", "B", "C", "D"]);
        assert_eq!(table.card(1).unwrap().order(), 1);
        assert_eq!(table.card(1).unwrap().state(), CardState::Visible);
    }

    #[test]
    fn disable_enable_round_trip_after_history() {
        let mut table = abcd();
        table.reorder(3, 1).unwrap();
        table.reorder(3, 3).unwrap();
        table.set_visibility(3, CardState::Hidden).unwrap();
        let before = table.card(3).unwrap().order();

        table.disable(3).unwrap();
        table.enable(3).unwrap();
        assert_eq!(table.card(3).unwrap().order(), before);
        assert_eq!(table.card(3).unwrap().state(), CardState::Visible);
    }

    #[test]
    fn disable_and_enable_are_idempotent() {
        let mut table = abcd();
        let seen = record(&mut table);
        assert!(!table.enable(2).unwrap());
        assert!(table.disable(2).unwrap());
        assert!(!table.disable(2).unwrap());
        assert_eq!(
            *seen.borrow(),
            [Change::OrderChanged, Change::VisibilityChanged]
        );
        assert_eq!(table.revision(), 1);
    }

    #[test]
    fn show_hide_has_no_order_side_effect() {
        let mut table = abcd();
        let seen = record(&mut table);
        assert!(table.set_visibility(0, CardState::Hidden).unwrap());
        assert!(!table.set_visibility(0, CardState::Hidden).unwrap());
        assert_eq!(table.card(0).unwrap().order(), 0);
        assert_eq!(*seen.borrow(), [Change::VisibilityChanged]);
        assert!(table.set_visibility(0, CardState::Visible).unwrap());
        assert_eq!(titles(&table.visible_cards(false)), ["A", "B", "C", "D"]);
    }

    #[test]
    fn hiding_a_disabled_card_restores_its_order() {
        let mut table = abcd();
        table.disable(0).unwrap();
        table.set_visibility(0, CardState::Hidden).unwrap();
        let card = table.card(0).unwrap();
        assert_eq!(card.state(), CardState::Hidden);
        assert_eq!(card.order(), 0);
    }

    #[test]
    fn reorder_tracks_previous() {
        let mut table = abcd();
        let seen = record(&mut table);
        table.reorder(0, 10).unwrap();
        let order = table.card(0).unwrap().order_info();
        assert_eq!((order.current(), order.previous(), order.default()), (10, 0, 0));
        assert_eq!(titles(&table.ordered_cards(true)), ["B", "C", "D", "A"]);
        assert_eq!(*seen.borrow(), [Change::OrderChanged]);
    }

    #[test]
    fn ordered_cards_break_ties_by_id() {
        let mut table = abcd();
        table.reorder(3, 0).unwrap();
        assert_eq!(titles(&table.ordered_cards(true)), ["A", "D", "B", "C"]);
    }

    #[test]
    fn disabled_cards_sort_behind_ties() {
        let mut table = abcd();
        table.disable(0).unwrap();
        // A shares the last slot with D
        assert_eq!(table.card(0).unwrap().order(), 3);
        assert_eq!(titles(&table.ordered_cards(true)), ["B", "C", "D", "A"]);
    }

    #[test]
    fn reorder_many_emits_once() {
        let mut table = abcd();
        let seen = record(&mut table);
        table.reorder_many(&[3, 2, 1, 0]).unwrap();
        assert_eq!(titles(&table.ordered_cards(true)), ["D", "C", "B", "A"]);
        assert_eq!(*seen.borrow(), [Change::OrderChanged]);
        assert_eq!(table.revision(), 1);
    }

    #[test]
    fn reorder_many_rejects_unknown_ids_untouched() {
        let mut table = abcd();
        let result = table.reorder_many(&[1, 0, 9]);
        assert!(matches!(result, Err(CardError::UnknownColumn(9))));
        assert_eq!(table.card(0).unwrap().order(), 0);
        assert_eq!(table.revision(), 0);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut table = abcd();
        assert!(matches!(table.reorder(4, 0), Err(CardError::UnknownColumn(4))));
        assert!(matches!(table.disable(7), Err(CardError::UnknownColumn(7))));
        assert!(matches!(
            table.set_visibility(5, CardState::Hidden),
            Err(CardError::UnknownColumn(5))
        ));
    }

    #[test]
    fn visible_cards_filters_by_mode() {
        let mut table = abcd();
        table.set_visibility(1, CardState::Hidden).unwrap();
        table.disable(2).unwrap();
        assert_eq!(titles(&table.visible_cards(false)), ["A", "D"]);
        assert_eq!(titles(&table.visible_cards(true)), ["A", "B", "C", "D"]);
    }

    #[test]
    fn observers_see_committed_state() {
        let mut table = abcd();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        table.subscribe(Change::VisibilityChanged, move |_, t| {
            sink.borrow_mut().push((t.revision(), t.card(1).unwrap().state()));
        });
        table.disable(1).unwrap();
        assert_eq!(*seen.borrow(), [(1, CardState::Disabled)]);
    }

    #[test]
    fn json_dump_lists_cards() {
        let mut table = abcd();
        table.disable(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        let cards = json["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[1]["disabled"], true);
        assert_eq!(cards[1]["show"], false);
        assert_eq!(cards[1]["order"]["current"], 3);
        assert_eq!(cards[1]["order"]["previous"], 1);
    }
}
