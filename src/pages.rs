//! The reading session: one document, one view.
//!
//! [`Pages`] owns the layout parameters, the derived geometry, the
//! navigation state and the in-flight re-layout. It is a synchronous state
//! machine: setters apply the new layout at once and leave a pending settle
//! behind, and the owner calls [`Pages::poll_settle`] on a timer (see
//! [`crate::reader::Reader`]) until the reflow has settled and the reading
//! position has been restored.

use crate::layout::{compute_geometry, Geometry, LayoutInstructions, LayoutParams};
use crate::leaf::LeafIndex;
use crate::locator::locate_position;
use crate::navigator::PageNavigator;
use crate::platform::{EventBus, Key, LayoutHost, ReaderEvent, SubscriptionId, TapTarget, TouchTracker};
use crate::position::{resolve_to_page, Position};
use crate::relayout::{PendingRelayout, RelayoutCause, SettleOutcome, SettleReport, SettleStatus, SettleStep};
use crate::{Error, PagesConfig, Result, Viewport};
use url::Url;

pub struct Pages<H: LayoutHost> {
    host: H,
    index: LeafIndex,
    config: PagesConfig,
    viewport: Viewport,
    params: LayoutParams,
    geometry: Geometry,
    navigator: PageNavigator,
    events: EventBus,
    touch: TouchTracker,
    pending: Option<PendingRelayout>,
    generation: u64,
}

impl<H: LayoutHost> Pages<H> {
    /// Start a session: compute the initial geometry, apply it to the host
    /// and begin settling. The first settle lands on page 0.
    pub fn new(host: H, index: LeafIndex, config: PagesConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| Error::ConfigError(format!("Invalid base_url: {}", e)))?;
        let geometry = compute_geometry(config.viewport, &config.layout)?;

        let mut pages = Self {
            host,
            index,
            viewport: config.viewport,
            params: config.layout.clone(),
            geometry,
            navigator: PageNavigator::new(),
            events: EventBus::new(),
            touch: TouchTracker::new(config.tap_threshold_px, base_url),
            pending: None,
            generation: 0,
            config,
        };
        pages.relayout(RelayoutCause::Construct, pages.viewport, pages.params.clone())?;
        Ok(pages)
    }

    // --- layout setters ---

    pub fn set_font_size(&mut self, size: u32) -> Result<()> {
        let params = LayoutParams {
            font_size: size,
            ..self.params.clone()
        };
        self.relayout(RelayoutCause::FontSize, self.viewport, params)
    }

    pub fn set_margin(&mut self, margin: u32) -> Result<()> {
        let params = LayoutParams {
            margin,
            ..self.params.clone()
        };
        self.relayout(RelayoutCause::Margin, self.viewport, params)
    }

    pub fn set_columns(&mut self, columns: u32) -> Result<()> {
        let params = LayoutParams {
            columns,
            ..self.params.clone()
        };
        self.relayout(RelayoutCause::Columns, self.viewport, params)
    }

    /// Geometry-neutral, but routed through the same re-layout path
    pub fn set_background_color(&mut self, color: impl Into<String>) -> Result<()> {
        let params = LayoutParams {
            background_color: color.into(),
            ..self.params.clone()
        };
        self.relayout(RelayoutCause::BackgroundColor, self.viewport, params)
    }

    pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
        self.relayout(RelayoutCause::Resize, viewport, self.params.clone())
    }

    /// Capture the position, apply the new layout and arm the settle loop.
    ///
    /// An invalid layout is rejected before anything changes. A re-layout
    /// already in flight is cancelled together with its pending restore.
    fn relayout(&mut self, cause: RelayoutCause, viewport: Viewport, params: LayoutParams) -> Result<()> {
        let geometry = match compute_geometry(viewport, &params) {
            Ok(geometry) => geometry,
            Err(err) => {
                log::warn!("rejected {} change: {}", cause, err);
                return Err(err);
            }
        };

        if let Some(cancelled) = self.pending.take() {
            log::debug!(
                "cancelled settle #{} ({}) after {} polls",
                cancelled.generation,
                cancelled.cause,
                cancelled.settle.polls()
            );
        }

        let position = match cause {
            RelayoutCause::Construct => None,
            _ => match self.position() {
                Ok(position) => Some(position),
                Err(err) => {
                    log::warn!("could not capture reading position before {} change: {}", cause, err);
                    None
                }
            },
        };

        self.viewport = viewport;
        self.params = params;
        self.geometry = geometry;
        self.host
            .apply_layout(&LayoutInstructions::new(self.geometry, &self.params));
        self.navigator.realign(&self.geometry, &mut self.host);

        self.generation += 1;
        log::debug!(
            "re-layout #{} for {}: column width {}px, page width {}px",
            self.generation,
            cause,
            self.geometry.column_width,
            self.geometry.page_width
        );
        self.pending = Some(PendingRelayout::new(
            self.generation,
            cause,
            position,
            self.config.max_settle_polls,
        ));
        Ok(())
    }

    // --- settle loop ---

    /// Sample the flow extent once. Updates the last page (clamping the
    /// current page) and, once the extent is stable or the poll cap is hit,
    /// restores the captured position.
    pub fn poll_settle(&mut self) -> SettleStatus {
        if self.pending.is_none() {
            return SettleStatus::Idle;
        }

        let extent = self.host.current_flow_extent();
        let last_page = self.geometry.last_page_for_extent(extent);
        if let Some(clamped) = self.navigator.set_last_page(last_page) {
            self.navigator
                .go_to_page(clamped, &self.geometry, &mut self.host, &self.events, false);
        }

        let (generation, step, polls) = match self.pending.as_mut() {
            Some(pending) => {
                let step = pending.settle.observe(last_page);
                (pending.generation, step, pending.settle.polls())
            }
            None => return SettleStatus::Idle,
        };

        match step {
            SettleStep::Continue => SettleStatus::Polling {
                generation,
                polls,
                last_page,
            },
            SettleStep::Stable => self.finish_relayout(SettleOutcome::Settled),
            SettleStep::Exhausted => {
                log::warn!(
                    "{}; proceeding with the last observed extent",
                    Error::LayoutUnsettled { polls, last_page }
                );
                self.finish_relayout(SettleOutcome::Unsettled)
            }
        }
    }

    fn finish_relayout(&mut self, outcome: SettleOutcome) -> SettleStatus {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return SettleStatus::Idle,
        };
        log::info!(
            "setup {} pages with {} columns",
            self.navigator.page_count(),
            self.params.columns
        );

        let restored_page = self.restore(pending.position);
        SettleStatus::Done(SettleReport {
            generation: pending.generation,
            cause: pending.cause,
            outcome,
            polls: pending.settle.polls(),
            last_page: self.navigator.last_page(),
            restored_page,
            position: pending.position,
        })
    }

    /// Move to the page holding `position`, or page 0 when there is none or
    /// it cannot be resolved.
    fn restore(&mut self, position: Option<Position>) -> usize {
        let target = match position {
            None => 0,
            Some(position) => match self.resolve(&position) {
                Ok(page) => page,
                Err(err) => {
                    log::warn!("could not restore {}: {}; going to page 0", position, err);
                    0
                }
            },
        };
        self.navigator
            .go_to_page(target, &self.geometry, &mut self.host, &self.events, false);
        target
    }

    fn resolve(&self, position: &Position) -> Result<usize> {
        let page = resolve_to_page(
            position,
            &self.index,
            &self.host,
            self.navigator.current_page(),
            &self.geometry,
        )?;
        Ok(page.clamp(0, self.navigator.last_page() as i64) as usize)
    }

    /// Poll until the pending re-layout finishes, without waiting between
    /// polls. Meant for hosts whose reflow is synchronous.
    pub fn run_until_settled(&mut self) -> Option<SettleReport> {
        loop {
            match self.poll_settle() {
                SettleStatus::Idle => return None,
                SettleStatus::Polling { .. } => continue,
                SettleStatus::Done(report) => return Some(report),
            }
        }
    }

    /// Drop the in-flight re-layout without restoring. Returns false when
    /// nothing was settling.
    pub fn cancel_settle(&mut self) -> bool {
        match self.pending.take() {
            Some(cancelled) => {
                log::debug!("settle #{} cancelled", cancelled.generation);
                true
            }
            None => false,
        }
    }

    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the most recent re-layout
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // --- navigation ---

    pub fn go_to_prev_page(&mut self) {
        let target = self.navigator.prev_target(self.params.columns);
        self.turn_to(target);
    }

    pub fn go_to_next_page(&mut self) {
        let target = self.navigator.next_target(self.params.columns);
        self.turn_to(target);
    }

    /// Jump to `page`, clamped to the last page. Not animated.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        let target = page.min(self.navigator.last_page());
        self.navigator
            .go_to_page(target, &self.geometry, &mut self.host, &self.events, false);
        target
    }

    fn turn_to(&mut self, page: usize) {
        let animated = self.config.animate_page_turns;
        self.navigator
            .go_to_page(page, &self.geometry, &mut self.host, &self.events, animated);
    }

    /// 1-based number of the page in view, for "page X of N" displays
    pub fn current_page(&self) -> usize {
        self.navigator.current_page() + 1
    }

    /// 0-based index of the page in view, as taken by [`Pages::go_to_page`]
    /// and carried by `PageChanged`
    pub fn page_index(&self) -> usize {
        self.navigator.current_page()
    }

    pub fn last_page(&self) -> usize {
        self.navigator.last_page()
    }

    pub fn page_count(&self) -> usize {
        self.navigator.page_count()
    }

    /// The reading position at the top of the current page
    pub fn position(&self) -> Result<Position> {
        locate_position(
            &self.index,
            &self.host,
            &self.geometry,
            self.navigator.current_page(),
        )
    }

    /// Jump to the page holding `position`. While a re-layout is settling the
    /// position also replaces the one that will be restored.
    pub fn go_to_position(&mut self, position: Position) -> Result<()> {
        let page = self.resolve(&position)?;
        if let Some(pending) = self.pending.as_mut() {
            pending.position = Some(position);
        }
        self.navigator
            .go_to_page(page, &self.geometry, &mut self.host, &self.events, false);
        Ok(())
    }

    // --- input ---

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.touch.touch_start(x, y);
    }

    /// Finish a touch and emit the resulting event, if any
    pub fn touch_end(&mut self, x: f64, y: f64, target: TapTarget) -> Option<ReaderEvent> {
        let event = self.touch.touch_end(x, y, target)?;
        self.events.emit(&event);
        Some(event)
    }

    /// Arrow keys turn pages. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowLeft => self.go_to_prev_page(),
            Key::ArrowRight => self.go_to_next_page(),
            Key::Other => return false,
        }
        true
    }

    // --- events ---

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&ReaderEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // --- accessors ---

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &PagesConfig {
        &self.config
    }

    pub fn index(&self) -> &LeafIndex {
        &self.index
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: LayoutHost> std::fmt::Debug for Pages<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("viewport", &self.viewport)
            .field("params", &self.params)
            .field("geometry", &self.geometry)
            .field("navigator", &self.navigator)
            .field("pending", &self.pending)
            .finish()
    }
}
