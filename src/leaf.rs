//! Leaf index: the document's atomic renderable units in reading order.
//!
//! A leaf is either a text run (one text node with visible content) or an
//! embedded image. Text leaves and images are numbered independently so the
//! locator can scan each kind on its own; the combined sequence keeps the
//! document order for hosts that need to lay the content out.

use std::fmt;

#[cfg(feature = "html")]
use scraper::{ElementRef, Html};

/// Index of a text leaf among all text leaves of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextLeafId(pub usize);

/// Index of an image among all images of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub usize);

impl fmt::Display for TextLeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text#{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

/// A text run owned by a single text node.
///
/// `content` is the untrimmed node text, so character offsets match what the
/// host renders. Only runs with non-whitespace content become leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLeaf {
    pub content: String,
}

impl TextLeaf {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Number of characters (not bytes) in the run
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A single embedded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLeaf {
    /// The image source as written in the document (`src` attribute)
    pub source_ref: String,
}

impl ImageLeaf {
    pub fn new(source_ref: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Text(TextLeaf),
    Image(ImageLeaf),
}

/// A leaf together with its per-kind id, yielded in document order
#[derive(Debug, Clone, Copy)]
pub enum LeafRef<'a> {
    Text(TextLeafId, &'a TextLeaf),
    Image(ImageId, &'a ImageLeaf),
}

/// Ordered, immutable list of the document's leaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafIndex {
    leaves: Vec<Leaf>,
    // positions into `leaves`, one entry per text leaf / image
    texts: Vec<usize>,
    images: Vec<usize>,
}

impl LeafIndex {
    /// Build an index from an already flattened sequence. Whitespace-only
    /// text leaves are dropped.
    pub fn from_leaves(leaves: impl IntoIterator<Item = Leaf>) -> Self {
        let mut index = LeafIndex::default();
        for leaf in leaves {
            index.push(leaf);
        }
        index
    }

    /// Walk the `<body>` of a parsed document (or the whole document when it
    /// has no body) depth-first and collect text runs and images.
    #[cfg(feature = "html")]
    pub fn from_html(document: &Html) -> Self {
        let root = document.root_element();
        let body = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .unwrap_or(root);

        let mut index = LeafIndex::default();
        index.collect_element(body);
        log::debug!(
            "indexed {} text leaves and {} images",
            index.text_count(),
            index.image_count()
        );
        index
    }

    #[cfg(feature = "html")]
    pub fn parse_html(html: &str) -> Self {
        Self::from_html(&Html::parse_document(html))
    }

    #[cfg(feature = "html")]
    fn collect_element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "img" => {
                let src = element.value().attr("src").unwrap_or_default();
                self.push(Leaf::Image(ImageLeaf::new(src)));
                return;
            }
            // not rendered, so never on a page
            "script" | "style" => return,
            _ => {}
        }

        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let content: &str = text;
                self.push(Leaf::Text(TextLeaf::new(content)));
            } else if let Some(child_element) = ElementRef::wrap(child) {
                self.collect_element(child_element);
            }
        }
    }

    fn push(&mut self, leaf: Leaf) {
        match &leaf {
            Leaf::Text(text) if text.is_blank() => return,
            Leaf::Text(_) => self.texts.push(self.leaves.len()),
            Leaf::Image(_) => self.images.push(self.leaves.len()),
        }
        self.leaves.push(leaf);
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn text(&self, id: TextLeafId) -> Option<&TextLeaf> {
        match self.leaves.get(*self.texts.get(id.0)?)? {
            Leaf::Text(text) => Some(text),
            Leaf::Image(_) => None,
        }
    }

    pub fn image(&self, id: ImageId) -> Option<&ImageLeaf> {
        match self.leaves.get(*self.images.get(id.0)?)? {
            Leaf::Image(image) => Some(image),
            Leaf::Text(_) => None,
        }
    }

    pub fn text_ids(&self) -> impl Iterator<Item = TextLeafId> {
        (0..self.texts.len()).map(TextLeafId)
    }

    pub fn image_ids(&self) -> impl Iterator<Item = ImageId> {
        (0..self.images.len()).map(ImageId)
    }

    /// All leaves in document order with their per-kind ids
    pub fn iter(&self) -> impl Iterator<Item = LeafRef<'_>> {
        let mut next_text = 0;
        let mut next_image = 0;
        self.leaves.iter().map(move |leaf| match leaf {
            Leaf::Text(text) => {
                next_text += 1;
                LeafRef::Text(TextLeafId(next_text - 1), text)
            }
            Leaf::Image(image) => {
                next_image += 1;
                LeafRef::Image(ImageId(next_image - 1), image)
            }
        })
    }
}
