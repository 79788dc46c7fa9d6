//! Reading positions and their resolution back to a page.
//!
//! A [`Position`] names a leaf (and a character inside a text leaf) rather
//! than a page, so it stays meaningful after the geometry changes. Hosts
//! store it as a [`PositionRecord`], the flat JSON-friendly form.

use crate::layout::Geometry;
use crate::leaf::{ImageId, LeafIndex, TextLeafId};
use crate::platform::LayoutHost;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PositionRecord", into = "PositionRecord")]
pub enum Position {
    /// The `image_index`-th image in document order
    Image { image_index: usize },
    /// A character offset inside the `text_leaf_index`-th text leaf
    Text {
        text_leaf_index: usize,
        char_offset: usize,
    },
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Image { image_index } => write!(f, "image {}", image_index),
            Position::Text {
                text_leaf_index,
                char_offset,
            } => write!(f, "text {} @ {}", text_leaf_index, char_offset),
        }
    }
}

/// Flat record handed to the host for storage or transmission.
///
/// Exactly one of `image_index` and `text_leaf_index` is set; `char_offset`
/// accompanies `text_leaf_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_leaf_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_offset: Option<usize>,
}

impl From<Position> for PositionRecord {
    fn from(position: Position) -> Self {
        match position {
            Position::Image { image_index } => PositionRecord {
                image_index: Some(image_index),
                ..Default::default()
            },
            Position::Text {
                text_leaf_index,
                char_offset,
            } => PositionRecord {
                image_index: None,
                text_leaf_index: Some(text_leaf_index),
                char_offset: Some(char_offset),
            },
        }
    }
}

impl TryFrom<PositionRecord> for Position {
    type Error = Error;

    fn try_from(record: PositionRecord) -> Result<Self> {
        match (record.image_index, record.text_leaf_index, record.char_offset) {
            (Some(image_index), None, None) => Ok(Position::Image { image_index }),
            (None, Some(text_leaf_index), Some(char_offset)) => Ok(Position::Text {
                text_leaf_index,
                char_offset,
            }),
            (None, Some(_), None) => Err(Error::InvalidPosition(
                "text position without a character offset".into(),
            )),
            (None, None, _) => Err(Error::InvalidPosition("empty position record".into())),
            (Some(_), _, _) => Err(Error::InvalidPosition(
                "record names both an image and a text leaf".into(),
            )),
        }
    }
}

impl Position {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidPosition(e.to_string()))
    }

    /// Check that the position points into `index`
    pub fn validate(&self, index: &LeafIndex) -> Result<()> {
        match *self {
            Position::Image { image_index } => {
                if index.image(ImageId(image_index)).is_none() {
                    return Err(Error::InvalidPosition(format!(
                        "image {} out of range ({} images)",
                        image_index,
                        index.image_count()
                    )));
                }
            }
            Position::Text {
                text_leaf_index,
                char_offset,
            } => {
                let leaf = index.text(TextLeafId(text_leaf_index)).ok_or_else(|| {
                    Error::InvalidPosition(format!(
                        "text leaf {} out of range ({} text leaves)",
                        text_leaf_index,
                        index.text_count()
                    ))
                })?;
                if char_offset >= leaf.char_len() {
                    return Err(Error::InvalidPosition(format!(
                        "offset {} past the end of text leaf {} ({} chars)",
                        char_offset,
                        text_leaf_index,
                        leaf.char_len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Page on which `position` currently starts.
///
/// Measures the image box or the single character box and offsets the
/// current page by `floor(left / page_width)`. Coordinates are read against
/// the current viewport shift, so call this right after a settle and before
/// any other page move. The result may fall outside `[0, last_page]`;
/// callers clamp.
pub fn resolve_to_page<H: LayoutHost + ?Sized>(
    position: &Position,
    index: &LeafIndex,
    host: &H,
    current_page: usize,
    geometry: &Geometry,
) -> Result<i64> {
    position.validate(index)?;
    let left = match *position {
        Position::Image { image_index } => host.measure_image(ImageId(image_index)).left,
        Position::Text {
            text_leaf_index,
            char_offset,
        } => host.measure_char(TextLeafId(text_leaf_index), char_offset).left,
    };
    Ok(current_page as i64 + geometry.page_of_offset(left))
}
