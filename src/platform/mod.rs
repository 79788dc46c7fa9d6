//! Host boundary: the layout capability the engine consumes and the events
//! and gestures it produces.
//!
//! The real reflow (a browser's CSS multi-column engine, a native text view)
//! lives behind [`LayoutHost`]. The engine only measures boxes, restyles the
//! body and shifts the viewport.

pub mod events;
pub mod gesture;

pub use events::{EventBus, EventHandler, ReaderEvent, SubscriptionId};
pub use gesture::{Key, TapTarget, TouchTracker};

use crate::layout::LayoutInstructions;
use crate::leaf::{ImageId, TextLeafId};
use serde::{Deserialize, Serialize};

/// A measured box in viewport coordinates.
///
/// `left == 0` is the leading edge of the page currently shifted into view;
/// content on earlier pages has negative `left`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        BoundingBox {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

/// The layout capability a reader view provides.
///
/// All measurements are taken against the current viewport shift and are
/// assumed to succeed; host I/O failures are the host's concern.
pub trait LayoutHost {
    /// Bounding box of a whole text run
    fn measure_run(&self, leaf: TextLeafId) -> BoundingBox;

    /// Bounding box of the single character at `offset` in a text run
    fn measure_char(&self, leaf: TextLeafId, offset: usize) -> BoundingBox;

    fn measure_image(&self, image: ImageId) -> BoundingBox;

    /// Restyle the flowed body; reflow may complete asynchronously
    fn apply_layout(&mut self, layout: &LayoutInstructions);

    /// Total flowed width of the content as currently laid out
    fn current_flow_extent(&self) -> f64;

    /// Move the visible window along the flow axis to `offset_px`
    fn shift_viewport(&mut self, offset_px: f64, animated: bool);
}

impl<H: LayoutHost + ?Sized> LayoutHost for Box<H> {
    fn measure_run(&self, leaf: TextLeafId) -> BoundingBox {
        (**self).measure_run(leaf)
    }

    fn measure_char(&self, leaf: TextLeafId, offset: usize) -> BoundingBox {
        (**self).measure_char(leaf, offset)
    }

    fn measure_image(&self, image: ImageId) -> BoundingBox {
        (**self).measure_image(image)
    }

    fn apply_layout(&mut self, layout: &LayoutInstructions) {
        (**self).apply_layout(layout)
    }

    fn current_flow_extent(&self) -> f64 {
        (**self).current_flow_extent()
    }

    fn shift_viewport(&mut self, offset_px: f64, animated: bool) {
        (**self).shift_viewport(offset_px, animated)
    }
}
