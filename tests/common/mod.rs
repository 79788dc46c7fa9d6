//! Shared test host with hand-placed boxes and scripted flow extents

#![allow(dead_code)]

use flowpages::{BoundingBox, ImageId, LayoutHost, LayoutInstructions, Leaf, LeafIndex, TextLeaf, TextLeafId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Boxes are given in canvas coordinates (page `n` starts at
/// `n * page_width`) and reported shifted by the current viewport offset.
/// Extent samples are served from a queue; once it runs dry the last sample
/// repeats.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    pub text_boxes: Vec<Vec<BoundingBox>>,
    pub image_boxes: Vec<BoundingBox>,
    extents: RefCell<VecDeque<f64>>,
    steady_extent: Cell<f64>,
    polls: Cell<u32>,
    pub offset: f64,
    pub shifts: Vec<(f64, bool)>,
    pub layouts: Vec<LayoutInstructions>,
}

impl ScriptedHost {
    pub fn with_extent(extent: f64) -> Self {
        let host = Self::default();
        host.steady_extent.set(extent);
        host
    }

    /// Queue extent samples for the coming polls
    pub fn script_extents(&self, samples: &[f64]) {
        self.extents.borrow_mut().extend(samples.iter().copied());
    }

    pub fn extent_polls(&self) -> u32 {
        self.polls.get()
    }

    /// Add a text leaf of `len` characters, 10px apart, starting at `left`
    pub fn push_text(&mut self, left: f64, top: f64, len: usize) {
        let boxes = (0..len)
            .map(|i| BoundingBox::new(left + i as f64 * 10.0, top, 10.0, 20.0))
            .collect();
        self.text_boxes.push(boxes);
    }

    pub fn push_image(&mut self, left: f64, top: f64) {
        self.image_boxes.push(BoundingBox::new(left, top, 200.0, 100.0));
    }

    fn shifted(&self, b: BoundingBox) -> BoundingBox {
        BoundingBox::new(b.left + self.offset, b.top, b.width, b.height)
    }
}

impl LayoutHost for ScriptedHost {
    fn measure_run(&self, leaf: TextLeafId) -> BoundingBox {
        self.text_boxes
            .get(leaf.0)
            .into_iter()
            .flatten()
            .copied()
            .reduce(|a, b| a.union(&b))
            .map(|b| self.shifted(b))
            .unwrap_or_default()
    }

    fn measure_char(&self, leaf: TextLeafId, offset: usize) -> BoundingBox {
        self.text_boxes
            .get(leaf.0)
            .and_then(|boxes| boxes.get(offset))
            .map(|b| self.shifted(*b))
            .unwrap_or_default()
    }

    fn measure_image(&self, image: ImageId) -> BoundingBox {
        self.image_boxes
            .get(image.0)
            .map(|b| self.shifted(*b))
            .unwrap_or_default()
    }

    fn apply_layout(&mut self, layout: &LayoutInstructions) {
        self.layouts.push(layout.clone());
    }

    fn current_flow_extent(&self) -> f64 {
        self.polls.set(self.polls.get() + 1);
        if let Some(sample) = self.extents.borrow_mut().pop_front() {
            self.steady_extent.set(sample);
        }
        self.steady_extent.get()
    }

    fn shift_viewport(&mut self, offset_px: f64, animated: bool) {
        self.offset = offset_px;
        self.shifts.push((offset_px, animated));
    }
}

/// Leaf index with `texts` runs of `len` characters each
pub fn text_index(texts: usize, len: usize) -> LeafIndex {
    LeafIndex::from_leaves((0..texts).map(|_| Leaf::Text(TextLeaf::new("x".repeat(len)))))
}

/// `count` leaves of 28 five-letter words each: two lines at a 20px font
/// in a 700px column, four lines at 40px
pub fn word_index(count: usize) -> LeafIndex {
    LeafIndex::from_leaves((0..count).map(|_| Leaf::Text(TextLeaf::new("word ".repeat(28)))))
}
