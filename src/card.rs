use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::ColumnId;

/// Character length statistics over the rendered values of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CardSize {
    pub min: usize,
    pub avg: usize,
    pub max: usize,
}

impl CardSize {
    /// Lengths are counted in chars after trimming trailing whitespace.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        let mut total = 0;
        let mut min = usize::MAX;
        let mut max = 0;
        for value in values {
            let len = value.trim_end().chars().count();
            min = std::cmp::min(min, len);
            max = std::cmp::max(max, len);
            total += len;
            count += 1;
        }
        if count == 0 {
            return CardSize::default();
        }
        CardSize {
            min,
            avg: total / count,
            max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardOrder {
    default: usize,
    current: usize,
    previous: usize,
}

impl CardOrder {
    pub fn new(default: usize) -> Self {
        CardOrder {
            default,
            current: default,
            previous: default,
        }
    }

    pub fn default(&self) -> usize {
        self.default
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn previous(&self) -> usize {
        self.previous
    }

    // Keeps `previous` when the position does not change.
    pub(crate) fn move_to(&mut self, pos: usize) -> bool {
        if pos == self.current {
            return false;
        }
        self.previous = self.current;
        self.current = pos;
        true
    }

    // Always records the current slot, even when already at `last`,
    // so a later `restore` lands where the card came from.
    pub(crate) fn drop_to(&mut self, last: usize) {
        self.previous = self.current;
        self.current = last;
    }

    pub(crate) fn restore(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardState {
    Visible,
    Hidden,
    Disabled,
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardState::Visible => "VISIBLE",
            CardState::Hidden => "HIDDEN",
            CardState::Disabled => "DISABLED",
        };
        f.write_str(name)
    }
}

/// Display metadata of one source column.
#[derive(Debug, Clone)]
pub struct Card {
    id: ColumnId,
    title: String,
    size: CardSize,
    order: CardOrder,
    state: CardState,
}

impl Card {
    pub fn new(id: ColumnId, title: impl Into<String>, size: CardSize) -> Self {
        Card {
            id,
            title: title.into(),
            size,
            order: CardOrder::new(id),
            state: CardState::Visible,
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> CardSize {
        self.size
    }

    /// Current logical position.
    pub fn order(&self) -> usize {
        self.order.current()
    }

    pub fn order_info(&self) -> CardOrder {
        self.order
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == CardState::Visible
    }

    pub fn is_disabled(&self) -> bool {
        self.state == CardState::Disabled
    }

    // Ignored while disabled.
    pub(crate) fn set_shown(&mut self, show: bool) {
        if self.state == CardState::Disabled {
            return;
        }
        self.state = if show {
            CardState::Visible
        } else {
            CardState::Hidden
        };
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.state = CardState::Disabled;
        } else if self.state == CardState::Disabled {
            self.state = CardState::Visible;
        }
    }

    pub(crate) fn order_mut(&mut self) -> &mut CardOrder {
        &mut self.order
    }
}

#[derive(Serialize)]
struct CardRecord<'a> {
    id: ColumnId,
    title: &'a str,
    show: bool,
    disabled: bool,
    order: CardOrder,
    size: CardSize,
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CardRecord {
            id: self.id,
            title: &self.title,
            show: self.is_visible(),
            disabled: self.is_disabled(),
            order: self.order,
            size: self.size,
        }
        .serialize(serializer)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Card #{} '{}' state={} order={} (was {}) size={}/{}/{}>",
            self.id,
            self.title,
            self.state,
            self.order.current(),
            self.order.previous(),
            self.size.min,
            self.size.avg,
            self.size.max
        )
    }
}
