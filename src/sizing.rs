use crate::card_table::CardTable;

/// Length jump that separates free-text columns from the typical ones.
pub const VALUE_WIDTH_GAP: usize = 50;

/// Floored average of `values` up to the first adjacent jump of at least
/// `gap` in ascending order. Without such a jump all values are averaged.
pub fn gap_trimmed_average(values: &[usize], gap: usize) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let cut = sorted
        .windows(2)
        .position(|w| w[1] - w[0] >= gap)
        .map(|i| i + 1)
        .unwrap_or(sorted.len());
    if cut == 0 {
        return 0;
    }
    sorted[..cut].iter().sum::<usize>() / cut
}

pub fn longest_title<'a, I>(titles: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    titles
        .into_iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
}

/// Suggested widths in characters for the field and value columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeHint {
    pub field_width: usize,
    pub value_width: usize,
}

impl SizeHint {
    pub fn from_table(table: &CardTable) -> Self {
        SizeHint {
            field_width: table.title_width(),
            value_width: table.value_width(),
        }
    }

    /// Splits `available` cells between field and value. The field column is
    /// capped at `max_field_width`, the value column takes the rest.
    pub fn fit(&self, available: usize, max_field_width: usize) -> (usize, usize) {
        let field = self.field_width.min(max_field_width).min(available);
        (field, available - field)
    }

    /// Smallest width that shows both suggestions plus 10%.
    pub fn min_width(&self) -> usize {
        (self.field_width + self.value_width) * 11 / 10
    }
}
