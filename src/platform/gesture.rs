/// Touch and key input turned into reader events

use super::events::ReaderEvent;
use url::Url;

/// What the host found under the finger when a touch ended
#[derive(Debug, Clone, PartialEq)]
pub enum TapTarget {
    Image { source_ref: String },
    Link { href: String },
    Other,
}

/// Keys the reader reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Pairs touch-start and touch-end into taps.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    start: Option<(f64, f64)>,
    threshold: f64,
    base_url: Option<Url>,
}

impl TouchTracker {
    pub fn new(threshold: f64, base_url: Option<Url>) -> Self {
        Self {
            start: None,
            threshold,
            base_url,
        }
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.start = Some((x, y));
    }

    /// Finish a touch. Image and link targets always report; anything else
    /// reports a generic tap only if the finger stayed within the threshold.
    pub fn touch_end(&mut self, x: f64, y: f64, target: TapTarget) -> Option<ReaderEvent> {
        let start = self.start.take();
        match target {
            TapTarget::Image { source_ref } => Some(ReaderEvent::ImageTapped {
                source_ref: self.resolve_url(&source_ref),
            }),
            TapTarget::Link { href } if !href.is_empty() => Some(ReaderEvent::LinkTapped {
                href: self.resolve_url(&href),
            }),
            TapTarget::Link { .. } | TapTarget::Other => {
                let (sx, sy) = start?;
                if (x - sx).abs() <= self.threshold && (y - sy).abs() <= self.threshold {
                    Some(ReaderEvent::GenericTap { x, y })
                } else {
                    log::debug!("touch moved ({}, {}) -> ({}, {}), not a tap", sx, sy, x, y);
                    None
                }
            }
        }
    }

    /// Absolute form of an image `src` or link `href`; empty stays empty
    fn resolve_url(&self, href: &str) -> String {
        match &self.base_url {
            Some(base) if !href.is_empty() => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            _ => href.to_string(),
        }
    }
}
