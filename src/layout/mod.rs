//! Layout module: page geometry and the instructions handed to the host

pub mod geometry;
pub mod simulated;

pub use geometry::{compute_geometry, Geometry, LayoutParams};
pub use simulated::SimulatedHost;

use serde::Serialize;

/// Everything the host needs to restyle the flowed body for a new layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutInstructions {
    pub geometry: Geometry,
    pub margin: u32,
    pub columns: u32,
    pub font_size: u32,
    pub background_color: String,
}

impl LayoutInstructions {
    pub fn new(geometry: Geometry, params: &LayoutParams) -> Self {
        Self {
            geometry,
            margin: params.margin,
            columns: params.columns,
            font_size: params.font_size,
            background_color: params.background_color.clone(),
        }
    }

    /// Inline style declarations for a CSS multi-column body.
    ///
    /// Font size and background color carry `!important` so they win over
    /// the book's own stylesheet.
    pub fn to_css(&self) -> String {
        let g = &self.geometry;
        format!(
            "width: {}px; margin: {}px; height: {}px; column-width: {}px; column-gap: {}px; \
             font-size: {}px !important; background-color: {} !important;",
            g.body_width,
            self.margin,
            g.content_height,
            g.column_width,
            g.column_gap,
            self.font_size,
            self.background_color
        )
    }
}
