use tracing::trace;

use crate::card::{Card, CardState};
use crate::card_table::CardTable;
use crate::domain::{CardError, ColumnId};
use crate::row_cursor::RowCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Only visible cards.
    #[default]
    View,
    /// All cards with their visibility controls.
    Edit,
}

impl Mode {
    pub fn includes_all(self) -> bool {
        self == Mode::Edit
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::View => Mode::Edit,
            Mode::Edit => Mode::View,
        }
    }
}

/// Checkbox rendering of a card state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    On,
    Off,
    Partial,
}

impl TriState {
    pub fn from_state(state: CardState) -> Self {
        match state {
            CardState::Visible => TriState::On,
            CardState::Hidden => TriState::Off,
            CardState::Disabled => TriState::Partial,
        }
    }

    pub fn target(self) -> CardState {
        match self {
            TriState::On => CardState::Visible,
            TriState::Off => CardState::Hidden,
            TriState::Partial => CardState::Disabled,
        }
    }

    /// On -> Off -> Partial -> On
    pub fn cycle(self) -> Self {
        match self {
            TriState::On => TriState::Off,
            TriState::Off => TriState::Partial,
            TriState::Partial => TriState::On,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TriState::On => "[x]",
            TriState::Off => "[ ]",
            TriState::Partial => "[-]",
        }
    }
}

/// One line of the card view.
#[derive(Debug, Clone, Copy)]
pub struct CardRow<'a> {
    pub card: &'a Card,
    pub field: &'a str,
    pub value: &'a str,
    pub tri_state: TriState,
}

/// Ids of the cards shown in `mode`, in display order.
pub fn rendered_ids(cards: &CardTable, mode: Mode) -> Vec<ColumnId> {
    cards
        .ordered_cards(mode.includes_all())
        .iter()
        .map(|c| c.id())
        .collect()
}

pub fn render<'a>(cards: &'a CardTable, rows: &'a RowCursor, mode: Mode) -> Vec<CardRow<'a>> {
    cards
        .ordered_cards(mode.includes_all())
        .into_iter()
        .map(|card| CardRow {
            card,
            field: rows.field(card.id()).unwrap_or(card.title()),
            value: rows.value(card.id()).unwrap_or(""),
            tri_state: TriState::from_state(card.state()),
        })
        .collect()
}

/// Advances the tri-state of the card on rendered line `row`. Only allowed in
/// edit mode; returns the new tri-state, or `None` in view mode.
pub fn cycle_visibility(
    cards: &mut CardTable,
    mode: Mode,
    row: usize,
) -> Result<Option<TriState>, CardError> {
    if mode != Mode::Edit {
        return Ok(None);
    }
    let id = *rendered_ids(cards, mode)
        .get(row)
        .ok_or_else(|| CardError::InvalidInput(format!("no card on line {row}")))?;
    let next = TriState::from_state(cards.card(id)?.state()).cycle();
    trace!("Cycling card {id} to {next:?}");
    cards.set_visibility(id, next.target())?;
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardSize;
    use crate::card_table::ColumnStats;
    use crate::domain::NavigationPolicy;
    use crate::table::Table;

    fn fixture() -> (CardTable, RowCursor) {
        let table = Table::from_columns(
            "mem",
            ["A", "B", "C", "D"]
                .iter()
                .map(|t| (t.to_string(), vec![format!("{t}0"), format!("{t}1")]))
                .collect(),
        );
        let stats: Vec<ColumnStats> = table
            .columns
            .iter()
            .map(|c| ColumnStats::new(c.name.clone(), CardSize::default()))
            .collect();
        let cards = CardTable::load(stats).unwrap();
        (cards, RowCursor::new(table.columns, NavigationPolicy::Clamp))
    }

    fn fields(rows: &[CardRow]) -> Vec<String> {
        rows.iter().map(|r| r.field.to_string()).collect()
    }

    #[test]
    fn view_renders_only_visible_cards() {
        let (mut cards, rows) = fixture();
        cards.set_visibility(0, CardState::Hidden).unwrap();
        cards.disable(2).unwrap();
        let lines = render(&cards, &rows, Mode::View);
        assert_eq!(fields(&lines), ["B", "D"]);
        assert!(lines.iter().all(|l| l.card.is_visible()));
    }

    #[test]
    fn edit_renders_all_sorted_by_order() {
        let (mut cards, rows) = fixture();
        cards.disable(0).unwrap();
        cards.reorder(3, 0).unwrap();
        let lines = render(&cards, &rows, Mode::Edit);
        assert_eq!(fields(&lines), ["D", "B", "C", "A"]);
        let orders: Vec<usize> = lines.iter().map(|l| l.card.order()).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
        assert_eq!(lines[3].tri_state, TriState::Partial);
    }

    #[test]
    fn render_follows_the_cursor() {
        let (cards, mut rows) = fixture();
        rows.next();
        let lines = render(&cards, &rows, Mode::View);
        assert_eq!(lines[2].value, "C1");
        assert_eq!(lines[2].tri_state, TriState::On);
    }

    #[test]
    fn tri_state_mapping() {
        assert_eq!(TriState::from_state(CardState::Visible), TriState::On);
        assert_eq!(TriState::from_state(CardState::Hidden), TriState::Off);
        assert_eq!(TriState::from_state(CardState::Disabled), TriState::Partial);
    }

    #[test]
    fn cycle_is_closed() {
        for start in [TriState::On, TriState::Off, TriState::Partial] {
            assert_eq!(start.cycle().cycle().cycle(), start);
            assert_eq!(TriState::from_state(start.target()), start);
        }
    }

    #[test]
    fn cycling_a_card_three_times_returns_to_start() {
        let (mut cards, _) = fixture();
        let steps: Vec<Option<TriState>> = (0..3)
            .map(|_| {
                let row = rendered_ids(&cards, Mode::Edit)
                    .iter()
                    .position(|&id| id == 1)
                    .unwrap();
                cycle_visibility(&mut cards, Mode::Edit, row).unwrap()
            })
            .collect();
        assert_eq!(
            steps,
            [
                Some(TriState::Off),
                Some(TriState::Partial),
                Some(TriState::On)
            ]
        );
        let card = cards.card(1).unwrap();
        assert_eq!(card.state(), CardState::Visible);
        assert_eq!(card.order(), 1);
    }

    #[test]
    fn cycling_in_view_mode_is_refused() {
        let (mut cards, _) = fixture();
        assert_eq!(cycle_visibility(&mut cards, Mode::View, 0).unwrap(), None);
        assert_eq!(cards.revision(), 0);
    }
}
