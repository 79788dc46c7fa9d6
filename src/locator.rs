//! Position locator: find the first leaf visible on the current page.
//!
//! The view has already been shifted so that `left == 0` is the leading edge
//! of the current page; anything with a negative left belongs to an earlier
//! page. Images and text runs are scanned independently:
//!
//! 1. the first image whose left edge is past 0;
//! 2. the first text run whose whole box starts past 0;
//! 3. inside that run and the one before it (which may straddle the page
//!    edge), the first character with `0 < left < page_width`;
//! 4. when both an image and a character are found, the one higher on the
//!    page wins, comparing the image box with the matched run's box.
//!
//! Scans are linear. Character boxes are measured one at a time because
//! where a proportional, justified run breaks cannot be predicted from its
//! character count.

use crate::layout::Geometry;
use crate::leaf::{ImageId, LeafIndex, TextLeafId};
use crate::platform::LayoutHost;
use crate::position::Position;
use crate::{Error, Result};

/// Locate the reading position at the top of the current page.
///
/// Fails with [`Error::NoContentOnPage`] when neither a character nor an
/// image resolves.
pub fn locate_position<H: LayoutHost + ?Sized>(
    index: &LeafIndex,
    host: &H,
    geometry: &Geometry,
    current_page: usize,
) -> Result<Position> {
    let page_width = f64::from(geometry.page_width);
    let image = first_image_on_or_after_page(index, host);

    let found = match first_run_on_or_after_page(index, host) {
        Some(found) => found,
        None => return image_or_nothing(image, current_page),
    };

    // the run before `found` may end on this page
    let first_candidate = found.0.saturating_sub(1);
    let text = (first_candidate..=found.0)
        .map(TextLeafId)
        .find_map(|id| first_char_on_page(index, host, id, page_width).map(|offset| (id, offset)));

    let (run, char_offset) = match text {
        Some(hit) => hit,
        None => return image_or_nothing(image, current_page),
    };

    if let Some(image_id) = image {
        let image_top = host.measure_image(image_id).top;
        let text_top = host.measure_run(run).top;
        if image_top < text_top {
            return Ok(Position::Image {
                image_index: image_id.0,
            });
        }
    }

    Ok(Position::Text {
        text_leaf_index: run.0,
        char_offset,
    })
}

fn image_or_nothing(image: Option<ImageId>, current_page: usize) -> Result<Position> {
    match image {
        Some(id) => Ok(Position::Image { image_index: id.0 }),
        None => Err(Error::NoContentOnPage { page: current_page }),
    }
}

fn first_image_on_or_after_page<H: LayoutHost + ?Sized>(
    index: &LeafIndex,
    host: &H,
) -> Option<ImageId> {
    index
        .image_ids()
        .find(|&id| host.measure_image(id).left > 0.0)
}

fn first_run_on_or_after_page<H: LayoutHost + ?Sized>(
    index: &LeafIndex,
    host: &H,
) -> Option<TextLeafId> {
    index.text_ids().find(|&id| host.measure_run(id).left > 0.0)
}

fn first_char_on_page<H: LayoutHost + ?Sized>(
    index: &LeafIndex,
    host: &H,
    id: TextLeafId,
    page_width: f64,
) -> Option<usize> {
    let len = index.text(id)?.char_len();
    (0..len).find(|&offset| {
        let left = host.measure_char(id, offset).left;
        0.0 < left && left < page_width
    })
}
