use std::collections::HashMap;
use std::fmt;

use crate::card_table::CardTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    OrderChanged,
    VisibilityChanged,
}

/// Observers only see the table through a shared reference and can not
/// mutate it while a notification is dispatched.
pub type Observer = Box<dyn FnMut(Change, &CardTable)>;

#[derive(Default)]
pub struct Observers {
    subscribers: HashMap<Change, Vec<Observer>>,
}

impl Observers {
    pub fn subscribe(&mut self, change: Change, observer: Observer) {
        self.subscribers.entry(change).or_default().push(observer);
    }

    pub fn notify(&mut self, change: Change, table: &CardTable) {
        if let Some(observers) = self.subscribers.get_mut(&change) {
            for observer in observers.iter_mut() {
                observer(change, table);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observers({})", self.len())
    }
}
