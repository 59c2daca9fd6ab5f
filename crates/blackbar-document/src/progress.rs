// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting for long-running operations.

use blackbar_core::Progress;

/// Receives progress snapshots. Any `FnMut(Progress) + Send` closure works.
pub trait ProgressSink: Send {
    fn report(&mut self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: FnMut(Progress) + Send,
{
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// A sink that drops everything.
pub fn no_progress() -> impl ProgressSink {
    |_: Progress| {}
}

/// Wraps a sink so percentages never go backwards within one operation.
pub struct MonotonicProgress<'a> {
    sink: &'a mut dyn ProgressSink,
    high_water: u8,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            sink,
            high_water: 0,
        }
    }

    pub fn emit(&mut self, mut progress: Progress) {
        progress.percent = progress.percent.min(100).max(self.high_water);
        self.high_water = progress.percent;
        self.sink.report(progress);
    }

    pub fn percent(&self) -> u8 {
        self.high_water
    }
}
