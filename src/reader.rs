use crate::pages::Pages;
use crate::platform::{EventHandler, Key, LayoutHost, ReaderEvent, SubscriptionId, TapTarget};
use crate::position::Position;
use crate::relayout::{SettleReport, SettleStatus};
use crate::{Error, LeafIndex, PagesConfig, Result, Viewport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

enum Command {
    SetFontSize(u32, oneshot::Sender<Result<()>>),
    SetMargin(u32, oneshot::Sender<Result<()>>),
    SetColumns(u32, oneshot::Sender<Result<()>>),
    SetBackgroundColor(String, oneshot::Sender<Result<()>>),
    Resize(Viewport, oneshot::Sender<Result<()>>),

    PrevPage(oneshot::Sender<usize>),
    NextPage(oneshot::Sender<usize>),
    CurrentPage(oneshot::Sender<usize>),
    PageCount(oneshot::Sender<usize>),
    GetPosition(oneshot::Sender<Result<Position>>),
    GoToPosition(Position, oneshot::Sender<Result<()>>),

    // Input
    TouchStart(f64, f64),
    TouchEnd(f64, f64, TapTarget, oneshot::Sender<Option<ReaderEvent>>),
    Key(Key, oneshot::Sender<bool>),

    Subscribe(EventHandler, oneshot::Sender<SubscriptionId>),
    Unsubscribe(SubscriptionId, oneshot::Sender<bool>),

    CancelSettle(oneshot::Sender<bool>),
    WhenSettled(oneshot::Sender<Option<SettleReport>>),
    Close(oneshot::Sender<()>),
}

/// An async handle to a reading session running on its own task.
///
/// The task owns the [`Pages`] session and handles commands strictly in
/// arrival order. While a re-layout is settling it also polls the host's
/// flow extent on an interval; a new re-layout restarts that interval, so a
/// settle that was in flight never restores a stale position.
#[derive(Clone)]
pub struct Reader {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Reader {
    /// Build a session and spawn its task on the current tokio runtime.
    pub fn open<H>(host: H, index: LeafIndex, config: PagesConfig) -> Result<Self>
    where
        H: LayoutHost + Send + 'static,
    {
        let pages = Pages::new(host, index, config)?;
        Ok(Self::spawn(pages))
    }

    /// Spawn a task that owns an existing session.
    pub fn spawn<H>(pages: Pages<H>) -> Self
    where
        H: LayoutHost + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let period = pages.config().settle_interval().max(Duration::from_millis(1));
        let task = ReaderTask {
            armed_generation: pages.generation(),
            ticker: settle_ticker(period),
            pages,
            period,
            waiters: Vec::new(),
            last_report: None,
        };
        tokio::spawn(task.run(cmd_rx));
        Self { cmd_tx }
    }

    async fn request<T>(
        &self,
        what: &str,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::ReaderClosed(format!("{} not sent", what)))?;
        rx.await
            .map_err(|e| Error::ReaderClosed(format!("{} canceled: {}", what, e)))
    }

    pub async fn set_font_size(&self, size: u32) -> Result<()> {
        self.request("SetFontSize", |tx| Command::SetFontSize(size, tx))
            .await?
    }

    pub async fn set_margin(&self, margin: u32) -> Result<()> {
        self.request("SetMargin", |tx| Command::SetMargin(margin, tx))
            .await?
    }

    pub async fn set_columns(&self, columns: u32) -> Result<()> {
        self.request("SetColumns", |tx| Command::SetColumns(columns, tx))
            .await?
    }

    pub async fn set_background_color(&self, color: &str) -> Result<()> {
        let color = color.to_string();
        self.request("SetBackgroundColor", |tx| {
            Command::SetBackgroundColor(color, tx)
        })
        .await?
    }

    pub async fn resize(&self, viewport: Viewport) -> Result<()> {
        self.request("Resize", |tx| Command::Resize(viewport, tx))
            .await?
    }

    /// Turn back one spread; returns the 1-based page now in view
    pub async fn go_to_prev_page(&self) -> Result<usize> {
        self.request("PrevPage", Command::PrevPage).await
    }

    /// Turn forward one spread; returns the 1-based page now in view
    pub async fn go_to_next_page(&self) -> Result<usize> {
        self.request("NextPage", Command::NextPage).await
    }

    /// 1-based number of the page in view
    pub async fn current_page(&self) -> Result<usize> {
        self.request("CurrentPage", Command::CurrentPage).await
    }

    pub async fn page_count(&self) -> Result<usize> {
        self.request("PageCount", Command::PageCount).await
    }

    pub async fn position(&self) -> Result<Position> {
        self.request("GetPosition", Command::GetPosition).await?
    }

    pub async fn go_to_position(&self, position: Position) -> Result<()> {
        self.request("GoToPosition", |tx| Command::GoToPosition(position, tx))
            .await?
    }

    pub fn touch_start(&self, x: f64, y: f64) -> Result<()> {
        self.cmd_tx
            .send(Command::TouchStart(x, y))
            .map_err(|_| Error::ReaderClosed("TouchStart not sent".into()))
    }

    pub async fn touch_end(&self, x: f64, y: f64, target: TapTarget) -> Result<Option<ReaderEvent>> {
        self.request("TouchEnd", |tx| Command::TouchEnd(x, y, target, tx))
            .await
    }

    pub async fn handle_key(&self, key: Key) -> Result<bool> {
        self.request("Key", |tx| Command::Key(key, tx)).await
    }

    pub async fn subscribe<F>(&self, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&ReaderEvent) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        self.request("Subscribe", |tx| Command::Subscribe(handler, tx))
            .await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.request("Unsubscribe", |tx| Command::Unsubscribe(id, tx))
            .await
    }

    /// Cancel the in-flight settle and its restore
    pub async fn cancel_settle(&self) -> Result<bool> {
        self.request("CancelSettle", Command::CancelSettle).await
    }

    /// Wait until no re-layout is settling. Yields the report of the
    /// re-layout that finished last, or `None` if it was cancelled or none
    /// has finished yet.
    pub async fn when_settled(&self) -> Result<Option<SettleReport>> {
        self.request("WhenSettled", Command::WhenSettled).await
    }

    /// Stop the session task
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}

fn settle_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

struct ReaderTask<H: LayoutHost> {
    pages: Pages<H>,
    period: Duration,
    ticker: Interval,
    armed_generation: u64,
    waiters: Vec<oneshot::Sender<Option<SettleReport>>>,
    last_report: Option<SettleReport>,
}

impl<H: LayoutHost + Send + 'static> ReaderTask<H> {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let cmd = match cmd {
                        Some(cmd) => cmd,
                        None => break,
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                    self.rearm_if_relayout_started();
                }
                _ = self.ticker.tick(), if self.pages.is_settling() => {
                    self.poll();
                }
            }
        }
        self.answer_waiters(None);
        log::debug!("reader task stopped");
    }

    /// Returns false when the task should stop
    fn handle(&mut self, cmd: Command) -> bool {
        let pages = &mut self.pages;
        match cmd {
            Command::SetFontSize(size, resp) => {
                let _ = resp.send(pages.set_font_size(size));
            }
            Command::SetMargin(margin, resp) => {
                let _ = resp.send(pages.set_margin(margin));
            }
            Command::SetColumns(columns, resp) => {
                let _ = resp.send(pages.set_columns(columns));
            }
            Command::SetBackgroundColor(color, resp) => {
                let _ = resp.send(pages.set_background_color(color));
            }
            Command::Resize(viewport, resp) => {
                let _ = resp.send(pages.resize(viewport));
            }

            Command::PrevPage(resp) => {
                pages.go_to_prev_page();
                let _ = resp.send(pages.current_page());
            }
            Command::NextPage(resp) => {
                pages.go_to_next_page();
                let _ = resp.send(pages.current_page());
            }
            Command::CurrentPage(resp) => {
                let _ = resp.send(pages.current_page());
            }
            Command::PageCount(resp) => {
                let _ = resp.send(pages.page_count());
            }
            Command::GetPosition(resp) => {
                let _ = resp.send(pages.position());
            }
            Command::GoToPosition(position, resp) => {
                let _ = resp.send(pages.go_to_position(position));
            }

            Command::TouchStart(x, y) => pages.touch_start(x, y),
            Command::TouchEnd(x, y, target, resp) => {
                let _ = resp.send(pages.touch_end(x, y, target));
            }
            Command::Key(key, resp) => {
                let _ = resp.send(pages.handle_key(key));
            }

            Command::Subscribe(handler, resp) => {
                let id = pages.subscribe(move |ev| handler(ev));
                let _ = resp.send(id);
            }
            Command::Unsubscribe(id, resp) => {
                let _ = resp.send(pages.unsubscribe(id));
            }

            Command::CancelSettle(resp) => {
                let cancelled = pages.cancel_settle();
                if cancelled {
                    self.last_report = None;
                    self.answer_waiters(None);
                }
                let _ = resp.send(cancelled);
            }
            Command::WhenSettled(resp) => {
                if pages.is_settling() {
                    self.waiters.push(resp);
                } else {
                    let _ = resp.send(self.last_report.clone());
                }
            }
            Command::Close(resp) => {
                let _ = resp.send(());
                return false;
            }
        }
        true
    }

    /// A command that started a re-layout replaced the pending settle;
    /// restart the interval so its first poll is one period away.
    fn rearm_if_relayout_started(&mut self) {
        let generation = self.pages.generation();
        if generation != self.armed_generation {
            self.armed_generation = generation;
            self.ticker = settle_ticker(self.period);
        }
    }

    fn poll(&mut self) {
        match self.pages.poll_settle() {
            SettleStatus::Done(report) => {
                if let Some(warning) = report.warning() {
                    log::warn!("re-layout #{}: {}", report.generation, warning);
                }
                self.answer_waiters(Some(report.clone()));
                self.last_report = Some(report);
            }
            SettleStatus::Polling {
                generation,
                polls,
                last_page,
            } => {
                log::debug!(
                    "settle #{} poll {}: last page {}",
                    generation,
                    polls,
                    last_page
                );
            }
            SettleStatus::Idle => {}
        }
    }

    fn answer_waiters(&mut self, report: Option<SettleReport>) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(report.clone());
        }
    }
}
