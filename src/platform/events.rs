/// Semantic events reported to the host application

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReaderEvent {
    /// The view moved to page `page` (0-based)
    PageChanged { page: usize },
    ImageTapped {
        #[serde(rename = "sourceRef")]
        source_ref: String,
    },
    LinkTapped { href: String },
    /// A tap that hit neither an image nor a link
    GenericTap { x: f64, y: f64 },
}

impl ReaderEvent {
    /// Name used when the event travels as a URI (`scheme://name?query`)
    pub fn uri_name(&self) -> &'static str {
        match self {
            ReaderEvent::PageChanged { .. } => "pageChanged",
            ReaderEvent::ImageTapped { .. } => "imageClick",
            ReaderEvent::LinkTapped { .. } => "linkClick",
            ReaderEvent::GenericTap { .. } => "readerTapEvent",
        }
    }

    /// Encode the event for hosts that intercept a custom URI scheme.
    ///
    /// ```
    /// use flowpages::ReaderEvent;
    /// let ev = ReaderEvent::LinkTapped { href: "https://example.com/a b".into() };
    /// assert_eq!(
    ///     ev.to_uri("simplified"),
    ///     "simplified://linkClick?href=https%3A%2F%2Fexample.com%2Fa+b"
    /// );
    /// ```
    pub fn to_uri(&self, scheme: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match self {
            ReaderEvent::PageChanged { page } => {
                query.append_pair("page", &page.to_string());
            }
            // empty values are left out rather than sent as `key=`
            ReaderEvent::ImageTapped { source_ref } if !source_ref.is_empty() => {
                query.append_pair("src", source_ref);
            }
            ReaderEvent::LinkTapped { href } if !href.is_empty() => {
                query.append_pair("href", href);
            }
            ReaderEvent::ImageTapped { .. } | ReaderEvent::LinkTapped { .. } => {}
            ReaderEvent::GenericTap { x, y } => {
                query.append_pair("x", &x.to_string());
                query.append_pair("y", &y.to_string());
            }
        }
        let query = query.finish();
        if query.is_empty() {
            format!("{}://{}", scheme, self.uri_name())
        } else {
            format!("{}://{}?{}", scheme, self.uri_name(), query)
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&ReaderEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out of reader events to subscribed handlers, in subscription order.
#[derive(Default, Clone)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, EventHandler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&ReaderEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn emit(&self, event: &ReaderEvent) {
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
