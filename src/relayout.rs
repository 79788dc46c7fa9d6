//! Re-layout bookkeeping: the pending restore and the settle loop.
//!
//! The host reflows asynchronously and never says when it is done, so after
//! a layout change the flowed extent is sampled at a fixed interval until two
//! consecutive samples agree on the last page. A poll cap keeps a host that
//! never stabilizes from being polled forever.

use crate::position::Position;
use crate::Error;
use serde::Serialize;
use std::fmt;

/// What started a re-layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayoutCause {
    Construct,
    Resize,
    FontSize,
    Margin,
    Columns,
    BackgroundColor,
}

impl fmt::Display for RelayoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayoutCause::Construct => "construct",
            RelayoutCause::Resize => "resize",
            RelayoutCause::FontSize => "font size",
            RelayoutCause::Margin => "margin",
            RelayoutCause::Columns => "columns",
            RelayoutCause::BackgroundColor => "background color",
        };
        f.write_str(name)
    }
}

/// Result of feeding one sample to the settle loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStep {
    Continue,
    /// Two consecutive samples agreed
    Stable,
    /// The poll cap was reached without agreement
    Exhausted,
}

/// Stabilization predicate over successive last-page samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleLoop {
    polls: u32,
    max_polls: u32,
    previous: Option<usize>,
}

impl SettleLoop {
    pub fn new(max_polls: u32) -> Self {
        Self {
            polls: 0,
            max_polls: max_polls.max(1),
            previous: None,
        }
    }

    pub fn observe(&mut self, last_page: usize) -> SettleStep {
        self.polls += 1;
        if self.previous == Some(last_page) {
            return SettleStep::Stable;
        }
        self.previous = Some(last_page);
        if self.polls >= self.max_polls {
            SettleStep::Exhausted
        } else {
            SettleStep::Continue
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

/// A re-layout whose reflow has not settled yet
#[derive(Debug, Clone)]
pub struct PendingRelayout {
    pub generation: u64,
    pub cause: RelayoutCause,
    /// Reading position captured before the change; `None` restores page 0
    pub position: Option<Position>,
    pub settle: SettleLoop,
}

impl PendingRelayout {
    pub fn new(generation: u64, cause: RelayoutCause, position: Option<Position>, max_polls: u32) -> Self {
        Self {
            generation,
            cause,
            position,
            settle: SettleLoop::new(max_polls),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SettleOutcome {
    Settled,
    /// Gave up after the poll cap and kept the last observed extent
    Unsettled,
}

/// How a finished re-layout went
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleReport {
    pub generation: u64,
    pub cause: RelayoutCause,
    pub outcome: SettleOutcome,
    pub polls: u32,
    pub last_page: usize,
    pub restored_page: usize,
    pub position: Option<Position>,
}

impl SettleReport {
    /// The `LayoutUnsettled` warning when the poll cap was hit
    pub fn warning(&self) -> Option<Error> {
        match self.outcome {
            SettleOutcome::Settled => None,
            SettleOutcome::Unsettled => Some(Error::LayoutUnsettled {
                polls: self.polls,
                last_page: self.last_page,
            }),
        }
    }
}

/// State of the settle loop after a poll
#[derive(Debug, Clone, PartialEq)]
pub enum SettleStatus {
    /// No re-layout in flight
    Idle,
    Polling {
        generation: u64,
        polls: u32,
        last_page: usize,
    },
    Done(SettleReport),
}
