use std::collections::HashMap;

use tracing::debug;

use crate::card_table::CardTable;
use crate::domain::{CardError, ColumnId};
use crate::presentation::{Mode, rendered_ids};

/// New rendered sequence after moving the block `[first, last]` in front of
/// row `dest`. `None` drops the block behind the last row.
pub fn plan_block_move(
    rendered: &[ColumnId],
    first: usize,
    last: usize,
    dest: Option<usize>,
) -> Result<Vec<ColumnId>, CardError> {
    if first > last || last >= rendered.len() {
        return Err(CardError::InvalidMove(format!(
            "block {first}..={last} outside of {} rows",
            rendered.len()
        )));
    }
    let mut dest = dest.unwrap_or(rendered.len());
    if dest > rendered.len() {
        return Err(CardError::InvalidMove(format!("destination {dest} past the end")));
    }
    if first <= dest && dest <= last + 1 {
        return Err(CardError::InvalidMove(format!(
            "destination {dest} inside block {first}..={last}"
        )));
    }
    if dest > last {
        dest -= last - first + 1;
    }

    let mut remaining: Vec<ColumnId> = rendered[..first].to_vec();
    remaining.extend_from_slice(&rendered[last + 1..]);
    let tail = remaining.split_off(dest);
    remaining.extend_from_slice(&rendered[first..=last]);
    remaining.extend(tail);
    Ok(remaining)
}

/// Replaces the rendered ids inside `full` by `new_rendered`, slot by slot.
/// Ids that are not rendered keep their position.
pub fn merge_into_full(
    full: &[ColumnId],
    rendered: &[ColumnId],
    new_rendered: &[ColumnId],
) -> Vec<ColumnId> {
    let mapping: HashMap<ColumnId, ColumnId> = rendered
        .iter()
        .copied()
        .zip(new_rendered.iter().copied())
        .collect();
    full.iter()
        .map(|id| mapping.get(id).copied().unwrap_or(*id))
        .collect()
}

/// Moves the rendered block `[first, last]` to `dest` and commits the new
/// full ordering through [`CardTable::reorder_many`]. Disabled cards keep
/// their parked order so `enable` still restores them. Rejected moves leave
/// the table untouched.
pub fn move_block(
    cards: &mut CardTable,
    mode: Mode,
    first: usize,
    last: usize,
    dest: Option<usize>,
) -> Result<Vec<ColumnId>, CardError> {
    let rendered = rendered_ids(cards, mode);
    let new_rendered = plan_block_move(&rendered, first, last, dest)?;
    let full = rendered_ids(cards, Mode::Edit);
    let mut new_full = merge_into_full(&full, &rendered, &new_rendered);
    new_full.retain(|&id| cards.card(id).is_ok_and(|c| !c.is_disabled()));
    debug!("Moving rows {first}..={last} to {dest:?}: {rendered:?} -> {new_rendered:?}");
    cards.reorder_many(&new_full)?;
    Ok(new_rendered)
}

/// Moves the run spanned by the dragged `ids`.
pub fn move_selection(
    cards: &mut CardTable,
    mode: Mode,
    ids: &[ColumnId],
    dest: Option<usize>,
) -> Result<Vec<ColumnId>, CardError> {
    let rendered = rendered_ids(cards, mode);
    let rows: Option<Vec<usize>> = ids
        .iter()
        .map(|id| rendered.iter().position(|r| r == id))
        .collect();
    let rows = rows.ok_or_else(|| {
        CardError::InvalidMove(format!("selection {ids:?} is not fully rendered"))
    })?;
    let (Some(&first), Some(&last)) = (rows.iter().min(), rows.iter().max()) else {
        return Err(CardError::InvalidMove("empty selection".into()));
    };
    move_block(cards, mode, first, last, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardSize, CardState};
    use crate::card_table::ColumnStats;
    use crate::events::Change;
    use std::cell::Cell;
    use std::rc::Rc;

    fn table(n: usize) -> CardTable {
        let stats = (0..n)
            .map(|i| ColumnStats::new(format!("c{i}"), CardSize::default()))
            .collect();
        CardTable::load(stats).unwrap()
    }

    #[test]
    fn moves_block_down() {
        let moved = plan_block_move(&[0, 1, 2, 3, 4], 0, 1, Some(4)).unwrap();
        assert_eq!(moved, [2, 3, 0, 1, 4]);
    }

    #[test]
    fn moves_block_up() {
        let moved = plan_block_move(&[0, 1, 2, 3, 4], 3, 4, Some(1)).unwrap();
        assert_eq!(moved, [0, 3, 4, 1, 2]);
    }

    #[test]
    fn moves_block_to_end() {
        let moved = plan_block_move(&[0, 1, 2, 3], 0, 0, None).unwrap();
        assert_eq!(moved, [1, 2, 3, 0]);
    }

    #[test]
    fn rejects_destination_inside_block() {
        for dest in [1, 2, 3, 4] {
            assert!(matches!(
                plan_block_move(&[0, 1, 2, 3, 4], 1, 3, Some(dest)),
                Err(CardError::InvalidMove(_))
            ));
        }
    }

    #[test]
    fn rejects_unresolvable_blocks() {
        assert!(plan_block_move(&[0, 1, 2], 2, 1, Some(0)).is_err());
        assert!(plan_block_move(&[0, 1, 2], 1, 3, Some(0)).is_err());
        assert!(plan_block_move(&[0, 1, 2], 0, 0, Some(4)).is_err());
    }

    #[test]
    fn merge_keeps_hidden_slots() {
        // 1 and 3 are hidden, only 0, 2, 4 are permuted
        let full = [0, 1, 2, 3, 4];
        let merged = merge_into_full(&full, &[0, 2, 4], &[4, 0, 2]);
        assert_eq!(merged, [4, 1, 0, 3, 2]);
    }

    #[test]
    fn move_block_in_view_mode_reorders_engine() {
        let mut cards = table(5);
        cards.set_visibility(1, CardState::Hidden).unwrap();
        let moved = move_block(&mut cards, Mode::View, 2, 3, Some(0)).unwrap();
        assert_eq!(moved, [3, 4, 0, 2]);
        assert_eq!(rendered_ids(&cards, Mode::View), [3, 4, 0, 2]);
        assert_eq!(rendered_ids(&cards, Mode::Edit), [3, 1, 4, 0, 2]);
    }

    #[test]
    fn no_op_drop_emits_nothing() {
        let mut cards = table(4);
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        cards.subscribe(Change::OrderChanged, move |_, _| counter.set(counter.get() + 1));

        let result = move_block(&mut cards, Mode::Edit, 1, 2, Some(2));
        assert!(matches!(result, Err(CardError::InvalidMove(_))));
        assert_eq!(fired.get(), 0);
        assert_eq!(cards.revision(), 0);
        assert_eq!(rendered_ids(&cards, Mode::Edit), [0, 1, 2, 3]);
    }

    #[test]
    fn committed_drop_emits_once() {
        let mut cards = table(4);
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        cards.subscribe(Change::OrderChanged, move |_, _| counter.set(counter.get() + 1));

        move_block(&mut cards, Mode::Edit, 0, 1, None).unwrap();
        assert_eq!(rendered_ids(&cards, Mode::Edit), [2, 3, 0, 1]);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn drag_keeps_the_parked_order_of_disabled_cards() {
        let mut cards = table(5);
        cards.disable(1).unwrap();
        move_block(&mut cards, Mode::View, 3, 3, Some(2)).unwrap();
        assert_eq!(rendered_ids(&cards, Mode::View), [0, 2, 4, 3]);
        let parked = cards.card(1).unwrap().order_info();
        assert_eq!((parked.current(), parked.previous()), (4, 1));

        cards.enable(1).unwrap();
        assert_eq!(rendered_ids(&cards, Mode::View), [0, 1, 2, 4, 3]);
        assert_eq!(cards.card(1).unwrap().order(), 1);
    }

    #[test]
    fn dragging_in_edit_mode_leaves_disabled_cards_parked() {
        let mut cards = table(4);
        cards.disable(0).unwrap();
        // Edit mode renders [1, 2, 3, 0], move 3 to the top
        move_block(&mut cards, Mode::Edit, 2, 2, Some(0)).unwrap();
        assert_eq!(rendered_ids(&cards, Mode::Edit), [3, 1, 2, 0]);
        cards.enable(0).unwrap();
        assert_eq!(cards.card(0).unwrap().order(), 0);
    }

    #[test]
    fn move_selection_resolves_ids() {
        let mut cards = table(4);
        move_selection(&mut cards, Mode::Edit, &[3, 2], Some(0)).unwrap();
        assert_eq!(rendered_ids(&cards, Mode::Edit), [2, 3, 0, 1]);
    }

    #[test]
    fn move_selection_rejects_hidden_ids() {
        let mut cards = table(4);
        cards.set_visibility(2, CardState::Hidden).unwrap();
        let revision = cards.revision();
        assert!(move_selection(&mut cards, Mode::View, &[2], Some(0)).is_err());
        assert!(move_selection(&mut cards, Mode::View, &[], Some(0)).is_err());
        assert_eq!(cards.revision(), revision);
    }
}
