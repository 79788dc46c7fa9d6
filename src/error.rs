//! Error types for the pagination engine

use thiserror::Error;

/// Result type alias for pagination operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while paginating a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The layout parameters leave no room for a column
    #[error("Invalid layout: {columns} column(s) with margin {margin}px do not fit in {viewport_width}px")]
    InvalidLayout {
        viewport_width: u32,
        margin: u32,
        columns: u32,
    },

    /// Neither a character nor an image could be found on the current page
    #[error("No text or image found on page {page}")]
    NoContentOnPage { page: usize },

    /// The flow extent kept changing until the poll cap was reached
    #[error("Layout did not settle after {polls} polls (last page {last_page})")]
    LayoutUnsettled { polls: u32, last_page: usize },

    /// A position that does not belong to the current leaf index
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The reader task is gone
    #[error("Reader closed: {0}")]
    ReaderClosed(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
