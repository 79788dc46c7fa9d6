/// Deterministic column-flow host for tests, benches and the CLI.
///
/// Text is set in a monospace estimate (char width half the font size, line
/// height 1.2x) and flowed into columns of the instructed geometry; images
/// are blocks six lines tall. The host can hold back its final flow extent
/// for a few polls to behave like a browser that is still reflowing.

use crate::layout::{Geometry, LayoutInstructions};
use crate::leaf::{ImageId, LeafIndex, LeafRef, TextLeafId};
use crate::platform::{BoundingBox, LayoutHost};
use std::cell::Cell;

const IMAGE_LINES: usize = 6;

#[derive(Debug, Clone)]
enum FlowItem {
    Text(Vec<char>),
    Image,
}

/// Where a glyph or an image landed: column, line within the column and
/// character cell within the line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    column: usize,
    line: usize,
    cell: usize,
}

#[derive(Debug, Clone)]
struct FlowLayout {
    geometry: Geometry,
    margin: f64,
    char_width: f64,
    line_height: f64,
    texts: Vec<Vec<Slot>>,
    images: Vec<Slot>,
    columns_used: usize,
}

#[derive(Debug, Clone)]
pub struct SimulatedHost {
    items: Vec<FlowItem>,
    layout: Option<FlowLayout>,
    offset: f64,
    shifts: usize,
    layouts_applied: usize,
    reflow_polls: u32,
    polls_since_layout: Cell<u32>,
}

impl SimulatedHost {
    pub fn new(index: &LeafIndex) -> Self {
        let items = index
            .iter()
            .map(|leaf| match leaf {
                LeafRef::Text(_, text) => FlowItem::Text(text.content.chars().collect()),
                LeafRef::Image(_, _) => FlowItem::Image,
            })
            .collect();
        Self {
            items,
            layout: None,
            offset: 0.0,
            shifts: 0,
            layouts_applied: 0,
            reflow_polls: 0,
            polls_since_layout: Cell::new(0),
        }
    }

    /// Report a partial flow extent for the first `polls` extent queries
    /// after each layout change
    pub fn with_reflow_polls(mut self, polls: u32) -> Self {
        self.reflow_polls = polls;
        self
    }

    /// Current viewport shift in px
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn shift_count(&self) -> usize {
        self.shifts
    }

    pub fn layouts_applied(&self) -> usize {
        self.layouts_applied
    }

    pub fn extent_polls(&self) -> u32 {
        self.polls_since_layout.get()
    }

    /// Columns the content occupies under the current layout
    pub fn columns_used(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.columns_used)
    }

    fn flow(&self, instructions: &LayoutInstructions) -> FlowLayout {
        let geometry = instructions.geometry;
        let char_width = (f64::from(instructions.font_size) * 0.5).max(1.0);
        let line_height = (f64::from(instructions.font_size) * 1.2).max(1.0);
        let cells_per_line = ((f64::from(geometry.column_width) / char_width).floor() as usize).max(1);
        let lines_per_column =
            ((f64::from(geometry.content_height) / line_height).floor() as usize).max(1);

        let mut cursor = Slot {
            column: 0,
            line: 0,
            cell: 0,
        };
        let mut texts = Vec::new();
        let mut images = Vec::new();
        let mut used_any = false;

        let newline = |cursor: &mut Slot| {
            cursor.cell = 0;
            cursor.line += 1;
            if cursor.line >= lines_per_column {
                cursor.line = 0;
                cursor.column += 1;
            }
        };

        for item in &self.items {
            match item {
                FlowItem::Text(chars) => {
                    let mut slots = Vec::with_capacity(chars.len());
                    for (i, ch) in chars.iter().enumerate() {
                        let starts_word = !ch.is_whitespace()
                            && (i == 0 || chars[i - 1].is_whitespace());
                        if starts_word && cursor.cell > 0 {
                            let word_len = chars[i..].iter().take_while(|c| !c.is_whitespace()).count();
                            if cursor.cell + word_len > cells_per_line {
                                newline(&mut cursor);
                            }
                        }
                        if cursor.cell >= cells_per_line {
                            newline(&mut cursor);
                        }
                        slots.push(cursor);
                        cursor.cell += 1;
                    }
                    used_any |= !slots.is_empty();
                    texts.push(slots);
                }
                FlowItem::Image => {
                    if cursor.cell > 0 {
                        newline(&mut cursor);
                    }
                    let lines = IMAGE_LINES.min(lines_per_column);
                    if cursor.line + lines > lines_per_column {
                        cursor.line = 0;
                        cursor.column += 1;
                    }
                    images.push(cursor);
                    used_any = true;
                    for _ in 0..lines {
                        newline(&mut cursor);
                    }
                }
            }
        }

        let columns_used = if !used_any {
            0
        } else if cursor.line == 0 && cursor.cell == 0 {
            cursor.column
        } else {
            cursor.column + 1
        };

        FlowLayout {
            geometry,
            margin: f64::from(instructions.margin),
            char_width,
            line_height,
            texts,
            images,
            columns_used,
        }
    }

    fn slot_box(&self, layout: &FlowLayout, slot: Slot, width: f64, height: f64) -> BoundingBox {
        let stride = f64::from(layout.geometry.column_width + layout.geometry.column_gap);
        let left = layout.margin + self.offset + slot.column as f64 * stride + slot.cell as f64 * layout.char_width;
        let top = layout.margin + slot.line as f64 * layout.line_height;
        BoundingBox::new(left, top, width, height)
    }
}

impl LayoutHost for SimulatedHost {
    fn measure_run(&self, leaf: TextLeafId) -> BoundingBox {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return BoundingBox::default(),
        };
        layout
            .texts
            .get(leaf.0)
            .into_iter()
            .flatten()
            .map(|slot| self.slot_box(layout, *slot, layout.char_width, layout.line_height))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    fn measure_char(&self, leaf: TextLeafId, offset: usize) -> BoundingBox {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return BoundingBox::default(),
        };
        match layout.texts.get(leaf.0).and_then(|slots| slots.get(offset)) {
            Some(slot) => self.slot_box(layout, *slot, layout.char_width, layout.line_height),
            None => BoundingBox::default(),
        }
    }

    fn measure_image(&self, image: ImageId) -> BoundingBox {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return BoundingBox::default(),
        };
        match layout.images.get(image.0) {
            Some(slot) => {
                let lines = IMAGE_LINES.min(
                    ((f64::from(layout.geometry.content_height) / layout.line_height).floor() as usize).max(1),
                );
                let height = lines as f64 * layout.line_height;
                self.slot_box(layout, *slot, f64::from(layout.geometry.column_width), height)
            }
            None => BoundingBox::default(),
        }
    }

    fn apply_layout(&mut self, layout: &LayoutInstructions) {
        self.layout = Some(self.flow(layout));
        self.layouts_applied += 1;
        self.polls_since_layout.set(0);
    }

    fn current_flow_extent(&self) -> f64 {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return 0.0,
        };
        let polls = self.polls_since_layout.get() + 1;
        self.polls_since_layout.set(polls);

        let columns = if polls <= self.reflow_polls {
            // still reflowing: columns appear progressively
            layout.columns_used * polls as usize / (self.reflow_polls as usize + 1)
        } else {
            layout.columns_used
        };
        if columns == 0 {
            return 0.0;
        }
        let g = &layout.geometry;
        columns as f64 * f64::from(g.column_width + g.column_gap) - f64::from(g.column_gap)
    }

    fn shift_viewport(&mut self, offset_px: f64, _animated: bool) {
        self.offset = offset_px;
        self.shifts += 1;
    }
}
