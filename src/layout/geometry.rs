/// Page geometry derived from the viewport and the layout parameters

use crate::{Error, Result, Viewport};
use serde::{Deserialize, Serialize};

/// User-facing layout knobs. Every change goes through a full re-layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub margin: u32,
    pub columns: u32,
    pub font_size: u32,
    pub background_color: String,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            margin: 60,
            columns: 1,
            font_size: 30,
            background_color: "#fff".to_string(),
        }
    }
}

/// Measurements for one set of parameters. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    pub column_width: u32,
    pub column_gap: u32,
    pub page_width: u32,
    pub content_height: u32,
    /// Width given to the flowed body: columns plus the gaps between them
    pub body_width: u32,
}

/// Compute column and page sizes for a viewport.
///
/// Fails with [`Error::InvalidLayout`] when there is no column or the
/// margins leave no positive width for one.
pub fn compute_geometry(viewport: Viewport, params: &LayoutParams) -> Result<Geometry> {
    let invalid = || Error::InvalidLayout {
        viewport_width: viewport.width,
        margin: params.margin,
        columns: params.columns,
    };
    if params.columns == 0 {
        return Err(invalid());
    }

    let columns = i64::from(params.columns);
    let margin = i64::from(params.margin);
    let available = i64::from(viewport.width) - 2 * margin - (columns - 1) * margin;
    let column_width = available.div_euclid(columns);
    if column_width <= 0 {
        return Err(invalid());
    }
    let column_width = u32::try_from(column_width).map_err(|_| invalid())?;

    Ok(Geometry {
        column_width,
        column_gap: params.margin,
        page_width: params.columns * (column_width + params.margin),
        content_height: viewport.height.saturating_sub(params.margin.saturating_mul(2)),
        body_width: params.columns * column_width + (params.columns - 1) * params.margin,
    })
}

impl Geometry {
    /// Last page index for a flowed content extent (`ceil(extent / page_width) - 1`)
    pub fn last_page_for_extent(&self, extent: f64) -> usize {
        let pages = (extent / f64::from(self.page_width)).ceil();
        if pages.is_finite() && pages >= 1.0 {
            pages as usize - 1
        } else {
            0
        }
    }

    /// Pages between the current viewport edge and a left coordinate
    pub fn page_of_offset(&self, left: f64) -> i64 {
        (left / f64::from(self.page_width)).floor() as i64
    }

    /// Viewport shift that brings page `n` into view
    pub fn offset_of_page(&self, page: usize) -> f64 {
        -(page as f64) * f64::from(self.page_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(margin: u32, columns: u32) -> LayoutParams {
        LayoutParams {
            margin,
            columns,
            ..Default::default()
        }
    }

    #[test]
    fn single_column_800_by_600() {
        let g = compute_geometry(Viewport { width: 800, height: 600 }, &params(50, 1)).unwrap();
        assert_eq!(g.column_width, 700);
        assert_eq!(g.column_gap, 50);
        assert_eq!(g.page_width, 750);
        assert_eq!(g.content_height, 500);
        assert_eq!(g.body_width, 700);
    }

    #[test]
    fn two_columns_800_by_600() {
        let g = compute_geometry(Viewport { width: 800, height: 600 }, &params(50, 2)).unwrap();
        assert_eq!(g.column_width, 325);
        assert_eq!(g.page_width, 750);
        assert_eq!(g.body_width, 700);
    }

    #[test]
    fn page_width_law_holds_or_layout_is_invalid() {
        let viewport = Viewport { width: 640, height: 480 };
        for columns in 0..8u32 {
            for margin in (0..200u32).step_by(7) {
                let p = params(margin, columns);
                match compute_geometry(viewport, &p) {
                    Ok(g) => {
                        assert!(g.column_width > 0);
                        assert_eq!(g.page_width, columns * (g.column_width + margin));
                    }
                    Err(Error::InvalidLayout { columns: c, margin: m, .. }) => {
                        assert_eq!((c, m), (columns, margin));
                    }
                    Err(other) => panic!("unexpected error {other:?}"),
                }
            }
        }
    }

    #[test]
    fn margins_wider_than_viewport_are_rejected() {
        let err = compute_geometry(Viewport { width: 100, height: 100 }, &params(60, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidLayout { viewport_width: 100, .. }));
    }

    #[test]
    fn last_page_from_extent() {
        let g = compute_geometry(Viewport { width: 800, height: 600 }, &params(50, 1)).unwrap();
        assert_eq!(g.last_page_for_extent(0.0), 0);
        assert_eq!(g.last_page_for_extent(750.0), 0);
        assert_eq!(g.last_page_for_extent(751.0), 1);
        assert_eq!(g.last_page_for_extent(3000.0), 3);
    }

    #[test]
    fn offsets_map_to_pages() {
        let g = compute_geometry(Viewport { width: 800, height: 600 }, &params(50, 1)).unwrap();
        assert_eq!(g.page_of_offset(10.0), 0);
        assert_eq!(g.page_of_offset(1600.0), 2);
        assert_eq!(g.page_of_offset(-5.0), -1);
        assert_eq!(g.offset_of_page(3), -2250.0);
    }
}
