use std::fmt;
use std::io::Error;

use clap::ValueEnum;
use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

/// Stable column identity, the column's position in the source table.
pub type ColumnId = usize;

#[derive(Debug)]
pub enum CardError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    WorkbookError(String),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidInput(String),
    InvalidMove(String),
    UnknownColumn(ColumnId),
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardError::IoError(e) => write!(f, "io error: {e}"),
            CardError::PolarsError(e) => write!(f, "polars error: {e}"),
            CardError::JsonError(e) => write!(f, "json error: {e}"),
            CardError::WorkbookError(e) => write!(f, "workbook error: {e}"),
            CardError::LoadingFailed(e) => write!(f, "loading failed: {e}"),
            CardError::FileNotFound => write!(f, "file not found"),
            CardError::PermissionDenied => write!(f, "permission denied"),
            CardError::UnknownFileType => write!(f, "unknown file type"),
            CardError::InvalidInput(e) => write!(f, "invalid input: {e}"),
            CardError::InvalidMove(e) => write!(f, "invalid move: {e}"),
            CardError::UnknownColumn(id) => write!(f, "unknown column id {id}"),
        }
    }
}

impl std::error::Error for CardError {}

impl From<Error> for CardError {
    fn from(err: Error) -> Self {
        CardError::IoError(err)
    }
}

impl From<PolarsError> for CardError {
    fn from(err: PolarsError) -> Self {
        CardError::PolarsError(err)
    }
}

impl From<serde_json::Error> for CardError {
    fn from(err: serde_json::Error) -> Self {
        CardError::JsonError(err)
    }
}

impl From<calamine::Error> for CardError {
    fn from(err: calamine::Error) -> Self {
        CardError::WorkbookError(err.to_string())
    }
}

/// How the row cursor behaves at the first and last record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NavigationPolicy {
    /// Stop at the first and last record.
    #[default]
    Clamp,
    /// Continue at the other end.
    Wrap,
}

#[derive(Debug, Clone, Setters)]
pub struct CardConfig {
    pub event_poll_time: u64,
    pub max_field_width: usize,
    pub navigation: NavigationPolicy,
}

impl Default for CardConfig {
    fn default() -> Self {
        CardConfig {
            event_poll_time: 100,
            max_field_width: 40,
            navigation: NavigationPolicy::Clamp,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    PreviousRecord,
    NextRecord,
    FirstRecord,
    LastRecord,
    ToggleEditMode,
    CycleVisibility,
    ToggleDisabled,
    ExtendSelectionUp,
    ExtendSelectionDown,
    MoveCardsUp,
    MoveCardsDown,
    GotoRecord,
    CopyValue,
    CopyRecord,
    ResetOrder,
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "
    Records
    h / Left        Previous record
    l / Right       Next record
    H / L           First / last record
    :               Go to record number

    Cards
    j / Down        Select next card
    k / Up          Select previous card
    PageDown/Up     Move selection by a page
    g / Home        First card
    G / End         Last card
    Shift+Down/Up   Extend selection
    J / K           Move selected cards down / up
    c               Copy value to clipboard
    C               Copy record to clipboard

    Edit mode
    Tab / e         Toggle view / edit mode
    Space           Cycle shown -> hidden -> disabled
    d               Disable / enable card
    r               Reset card order

    ?               This help
    Esc             Close popup / clear selection
    q               Quit
";
