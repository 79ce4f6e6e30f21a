// SPDX-License-Identifier: MIT OR Apache-2.0
//! Update passes over the dependency graph.
//!
//! A pass walks the cached topological order, runs every dirty node and
//! pushes its output values across outgoing links. A target node becomes
//! dirty only when one of its inputs actually changed, so unchanged values
//! stop the cascade.

use crate::dependency::DependencyGraph;
use crate::error::EngineError;
use crate::host::HostScene;
use crate::node::{Node, NodeId};
use crate::nodes::{LogicNode, UpdateContext};
use crate::property::{LinkEnd, PropertyValue};
use crate::report::{UpdateReport, UpdateStatistics};
use indexmap::IndexMap;
use std::time::{Duration, Instant};

/// Runs update passes and keeps their bookkeeping
#[derive(Debug, Clone)]
pub struct Scheduler {
    dirty_tracking: bool,
    report_enabled: bool,
    report: UpdateReport,
    statistics: UpdateStatistics,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            dirty_tracking: true,
            report_enabled: false,
            report: UpdateReport::default(),
            statistics: UpdateStatistics::new(0),
        }
    }
}

impl Scheduler {
    /// Create a scheduler
    pub fn new(dirty_tracking: bool, report_enabled: bool, statistics_logging_rate: usize) -> Self {
        Self {
            dirty_tracking,
            report_enabled,
            report: UpdateReport::default(),
            statistics: UpdateStatistics::new(statistics_logging_rate),
        }
    }

    /// Whether clean nodes are skipped
    pub fn dirty_tracking(&self) -> bool {
        self.dirty_tracking
    }

    /// Enable or disable skipping of clean nodes
    pub fn set_dirty_tracking(&mut self, enabled: bool) {
        self.dirty_tracking = enabled;
    }

    /// Whether reports are collected
    pub fn report_enabled(&self) -> bool {
        self.report_enabled
    }

    /// Enable or disable report collection
    pub fn set_report_enabled(&mut self, enabled: bool) {
        self.report_enabled = enabled;
        if !enabled {
            self.report.clear();
        }
    }

    /// Report of the last pass, if collection is enabled
    pub fn report(&self) -> Option<&UpdateReport> {
        self.report_enabled.then_some(&self.report)
    }

    /// Change how often statistics are logged
    pub fn set_statistics_logging_rate(&mut self, rate: usize) {
        self.statistics.set_rate(rate);
    }

    /// Statistics logging rate
    pub fn statistics_logging_rate(&self) -> usize {
        self.statistics.rate()
    }

    /// Run one pass over all nodes
    pub fn run(
        &mut self,
        nodes: &mut IndexMap<NodeId, Node>,
        graph: &mut DependencyGraph,
        host: &mut dyn HostScene,
    ) -> Result<(), EngineError> {
        let start = Instant::now();
        self.report.clear();

        let sort_start = Instant::now();
        let cached = graph.is_order_cached();
        let order = match graph.topological_order() {
            Ok(order) => order.to_vec(),
            Err(err) => {
                tracing::error!("Failed to sort logic nodes: {err}");
                return Err(EngineError::InternalConsistency(err.to_string()));
            }
        };
        let sort_time = if cached { Duration::ZERO } else { sort_start.elapsed() };

        for node in nodes.values_mut() {
            if node.kind().is_always_dirty() {
                node.mark_dirty();
            }
        }

        let mut ctx = UpdateContext::new(host);
        let mut executed = Vec::new();
        let mut skipped = Vec::new();
        let mut links_activated = 0;

        for id in &order {
            let node = nodes.get_mut(id).ok_or_else(|| {
                EngineError::InternalConsistency(format!("node {id} is ordered but does not exist"))
            })?;

            if self.dirty_tracking && !node.is_dirty() {
                skipped.push(*id);
                continue;
            }

            if let Err(source) = node.update(&mut ctx) {
                tracing::error!(node = %id, name = node.name(), "Node update failed: {source}");
                return Err(EngineError::NodeExecution {
                    node: *id,
                    name: node.name().to_owned(),
                    source,
                });
            }
            // cleared before propagation so a weak self-link can dirty it again
            node.clear_dirty();
            executed.push(*id);
            links_activated += propagate(nodes, *id);
        }

        let total_time = start.elapsed();
        tracing::trace!(
            executed = executed.len(),
            skipped = skipped.len(),
            links_activated,
            "Logic update finished"
        );
        self.statistics
            .record(total_time, executed.len(), order.len(), links_activated);

        if self.report_enabled {
            self.report = UpdateReport {
                executed,
                skipped,
                links_activated,
                topology_sort_time: sort_time,
                total_time,
            };
        }
        Ok(())
    }
}

/// Copy every linked output of `source` to its targets; returns how many
/// target values changed
fn propagate(nodes: &mut IndexMap<NodeId, Node>, source: NodeId) -> usize {
    let Some(node) = nodes.get(&source) else {
        return 0;
    };
    let pending: Vec<(PropertyValue, Vec<LinkEnd>)> = node
        .properties()
        .iter()
        .filter(|(_, p)| p.is_output() && !p.outgoing_links().is_empty())
        .filter_map(|(_, p)| Some((p.value()?.clone(), p.outgoing_links().to_vec())))
        .collect();

    let mut activated = 0;
    for (value, targets) in pending {
        for target in targets {
            let Some(target_node) = nodes.get_mut(&target.property.node) else {
                continue;
            };
            let tree = target_node.properties_mut();
            if tree.value(target.property.slot) == Some(&value) {
                continue;
            }
            tree.store(target.property.slot, value.clone());
            target_node.mark_dirty();
            activated += 1;
        }
    }
    activated
}
