// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-pass update reports and aggregated statistics.

use crate::node::NodeId;
use std::time::Duration;

/// What happened during one `update()` pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Nodes that ran, in execution order
    pub executed: Vec<NodeId>,
    /// Nodes skipped because they were clean
    pub skipped: Vec<NodeId>,
    /// Links whose target value changed
    pub links_activated: usize,
    /// Time spent computing the execution order (zero when cached)
    pub topology_sort_time: Duration,
    /// Wall time of the whole pass
    pub total_time: Duration,
}

impl UpdateReport {
    /// Reset for a new pass
    pub fn clear(&mut self) {
        self.executed.clear();
        self.skipped.clear();
        self.links_activated = 0;
        self.topology_sort_time = Duration::ZERO;
        self.total_time = Duration::ZERO;
    }
}

/// Aggregates update passes and logs a summary every `rate` passes
#[derive(Debug, Clone, Default)]
pub struct UpdateStatistics {
    rate: usize,
    passes: usize,
    total_time: Duration,
    max_time: Duration,
    executed: usize,
    nodes: usize,
    links_activated: usize,
}

/// One logged summary of [`UpdateStatistics`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsSummary {
    /// Passes aggregated
    pub passes: usize,
    /// Mean pass time
    pub average_time: Duration,
    /// Longest pass
    pub max_time: Duration,
    /// Share of nodes that executed, 0..=1
    pub executed_ratio: f32,
    /// Mean number of activated links per pass
    pub average_links_activated: f32,
}

impl UpdateStatistics {
    /// Create statistics logging every `rate` passes; 0 disables them
    pub fn new(rate: usize) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    /// Change the logging rate and start a fresh window
    pub fn set_rate(&mut self, rate: usize) {
        *self = Self::new(rate);
    }

    /// Logging rate
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Record one pass; returns the summary when a window completes
    pub fn record(
        &mut self,
        time: Duration,
        executed: usize,
        nodes: usize,
        links_activated: usize,
    ) -> Option<StatisticsSummary> {
        if self.rate == 0 {
            return None;
        }
        self.passes += 1;
        self.total_time += time;
        self.max_time = self.max_time.max(time);
        self.executed += executed;
        self.nodes += nodes;
        self.links_activated += links_activated;

        if self.passes < self.rate {
            return None;
        }

        let passes = self.passes;
        let summary = StatisticsSummary {
            passes,
            average_time: self.total_time / passes as u32,
            max_time: self.max_time,
            executed_ratio: if self.nodes == 0 {
                0.0
            } else {
                self.executed as f32 / self.nodes as f32
            },
            average_links_activated: self.links_activated as f32 / passes as f32,
        };
        tracing::info!(
            passes = summary.passes,
            average_us = summary.average_time.as_micros() as u64,
            max_us = summary.max_time.as_micros() as u64,
            executed_ratio = summary.executed_ratio,
            links_activated = summary.average_links_activated,
            "Logic update statistics"
        );
        *self = Self::new(self.rate);
        Some(summary)
    }
}
