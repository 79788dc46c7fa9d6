//! Flowpages
//!
//! Column pagination and reading-position tracking for e-reader web views.
//! A document is flowed into CSS-style columns on a horizontally shifted
//! canvas; this crate turns that canvas into pages, moves between them and
//! keeps the reader's place across resizes and font, margin, column and
//! color changes.
//!
//! # Features
//!
//! - **Host-agnostic**: the real reflow lives behind the [`LayoutHost`] trait
//! - **Character-exact positions**: a [`Position`] names a text run and a
//!   character offset (or an image), not a page number
//! - **Asynchronous reflow**: re-layouts poll the flow extent until it
//!   settles, then restore the position; overlapping re-layouts cancel
//! - **HTML input** (feature `html`, default): leaf index built with `scraper`
//!
//! # Example
//!
//! ```
//! use flowpages::{Leaf, LeafIndex, Pages, PagesConfig, SimulatedHost, TextLeaf, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // with the `html` feature, `LeafIndex::parse_html` builds this from markup
//! let index = LeafIndex::from_leaves(vec![Leaf::Text(TextLeaf::new("Call me Ishmael."))]);
//! let host = SimulatedHost::new(&index);
//! let config = PagesConfig {
//!     viewport: Viewport { width: 800, height: 600 },
//!     ..Default::default()
//! };
//!
//! let mut pages = Pages::new(host, index, config)?;
//! pages.run_until_settled();
//! assert_eq!(pages.page_count(), 1);
//!
//! let position = pages.position()?;
//! pages.set_font_size(48)?;
//! pages.run_until_settled();
//! pages.go_to_position(position)?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod layout;
pub mod leaf;
pub mod locator;
pub mod navigator;
pub mod pages;
pub mod platform;
pub mod position;
pub mod reader;
pub mod relayout;

pub use layout::{compute_geometry, Geometry, LayoutInstructions, LayoutParams, SimulatedHost};
pub use leaf::{ImageId, ImageLeaf, Leaf, LeafIndex, TextLeaf, TextLeafId};
pub use locator::locate_position;
pub use navigator::PageNavigator;
pub use pages::Pages;
pub use platform::{BoundingBox, EventBus, Key, LayoutHost, ReaderEvent, SubscriptionId, TapTarget};
pub use position::{resolve_to_page, Position, PositionRecord};
pub use reader::Reader;
pub use relayout::{RelayoutCause, SettleOutcome, SettleReport, SettleStatus};

/// Configuration for a reading session
///
/// The defaults match a phone-sized reader: 60px margins, one column and a
/// 30px font on a white background. Settle polling runs every 500ms and gives
/// up after 10 polls.
///
/// # Examples
///
/// ```
/// let cfg = flowpages::PagesConfig::default();
/// assert_eq!(cfg.layout.columns, 1);
/// assert_eq!(cfg.settle_interval().as_millis(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Viewport dimensions at construction
    pub viewport: Viewport,
    /// Initial margin, columns, font size and background color
    pub layout: LayoutParams,
    /// Interval between flow-extent polls while a re-layout settles
    pub settle_interval_ms: u64,
    /// Polls before a re-layout is declared unsettled
    pub max_settle_polls: u32,
    /// Maximum finger travel (per axis) for a touch to count as a tap
    pub tap_threshold_px: f64,
    /// Animate the viewport shift on page turns
    pub animate_page_turns: bool,
    /// Base URL against which relative link targets are resolved
    pub base_url: Option<String>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            layout: LayoutParams::default(),
            settle_interval_ms: 500,
            max_settle_polls: 10,
            tap_threshold_px: 10.0,
            animate_page_turns: true,
            base_url: None,
        }
    }
}

impl PagesConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
