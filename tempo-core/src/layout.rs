//! Day layout: lane assignment for visually overlapping events.
//!
//! Sweeps a day's instances by start time and hands each the lowest free
//! column, so overlapping events render side by side. Every event in a
//! transitive overlap cluster shares the cluster's column count, giving
//! equal-width lanes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::EventInstance;

/// Horizontal lane assignment for one instance within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneAssignment {
    /// Zero-based column within the overlap cluster.
    pub column: usize,
    /// Width divisor shared by every event in the cluster.
    pub total_columns: usize,
}

/// Assign a column to each instance of one day.
///
/// Deterministic: sweep order is start time, longer duration first on
/// ties, then id. Overlap is half-open, so an event starting exactly when
/// another ends opens a new cluster.
pub fn layout_day(instances: &[EventInstance]) -> BTreeMap<String, LaneAssignment> {
    let mut order: Vec<&EventInstance> = instances.iter().collect();
    order.sort_by(|a, b| {
        a.starts_at
            .cmp(&b.starts_at)
            .then_with(|| b.duration().cmp(&a.duration()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut result: BTreeMap<String, LaneAssignment> = BTreeMap::new();

    // Events whose interval is still open at the sweep position.
    let mut open: Vec<(DateTime<Utc>, usize)> = Vec::new();
    let mut cluster: Vec<String> = Vec::new();
    let mut cluster_columns = 0usize;

    for event in order {
        open.retain(|(ends_at, _)| *ends_at > event.starts_at);

        if open.is_empty() && !cluster.is_empty() {
            close_cluster(&mut result, &cluster, cluster_columns);
            cluster.clear();
            cluster_columns = 0;
        }

        let used: BTreeSet<usize> = open.iter().map(|(_, column)| *column).collect();
        let column = (0..).find(|c| !used.contains(c)).unwrap_or(0);

        open.push((event.ends_at, column));
        cluster.push(event.id.clone());
        cluster_columns = cluster_columns.max(column + 1);
        result.insert(
            event.id.clone(),
            LaneAssignment {
                column,
                total_columns: 1,
            },
        );
    }

    if !cluster.is_empty() {
        close_cluster(&mut result, &cluster, cluster_columns);
    }
    result
}

fn close_cluster(
    result: &mut BTreeMap<String, LaneAssignment>,
    members: &[String],
    columns: usize,
) {
    for id in members {
        if let Some(lane) = result.get_mut(id) {
            lane.total_columns = columns;
        }
    }
}
