use tracing::trace;

use crate::domain::{ColumnId, NavigationPolicy};
use crate::table::Column;

/// Loaded rows plus the index of the record on screen.
#[derive(Debug, Clone)]
pub struct RowCursor {
    columns: Vec<Column>,
    row_count: usize,
    index: usize,
    policy: NavigationPolicy,
}

impl RowCursor {
    pub fn new(columns: Vec<Column>, policy: NavigationPolicy) -> Self {
        let row_count = columns.first().map(|c| c.data.len()).unwrap_or(0);
        RowCursor {
            columns,
            row_count,
            index: 0,
            policy,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Out of range indices are ignored. Returns whether the index was taken.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.row_count {
            self.index = index;
            true
        } else {
            trace!("Ignoring record index {index}, {} records", self.row_count);
            false
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn next(&mut self) -> bool {
        if self.row_count == 0 {
            return false;
        }
        let next = match self.policy {
            NavigationPolicy::Clamp => std::cmp::min(self.index + 1, self.row_count - 1),
            NavigationPolicy::Wrap => (self.index + 1) % self.row_count,
        };
        self.move_to(next)
    }

    pub fn prev(&mut self) -> bool {
        if self.row_count == 0 {
            return false;
        }
        let prev = match self.policy {
            NavigationPolicy::Clamp => self.index.saturating_sub(1),
            NavigationPolicy::Wrap => (self.index + self.row_count - 1) % self.row_count,
        };
        self.move_to(prev)
    }

    pub fn first(&mut self) -> bool {
        self.move_to(0)
    }

    pub fn last(&mut self) -> bool {
        self.move_to(self.row_count.saturating_sub(1))
    }

    fn move_to(&mut self, index: usize) -> bool {
        let changed = index != self.index;
        self.set_index(index) && changed
    }

    pub fn field(&self, id: ColumnId) -> Option<&str> {
        self.columns.get(id).map(|c| c.name.as_str())
    }

    pub fn value(&self, id: ColumnId) -> Option<&str> {
        self.columns
            .get(id)
            .and_then(|c| c.data.get(self.index))
            .map(String::as_str)
    }

    /// (field, value) pairs of the current record in source column order.
    pub fn items(&self) -> Vec<(&str, &str)> {
        if self.row_count == 0 {
            return Vec::new();
        }
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.data[self.index].as_str()))
            .collect()
    }
}
