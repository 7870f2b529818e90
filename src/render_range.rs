//! Render-range scheduler (spec §3.6, §4.4, component F).
//!
//! A node's `ranges[]` (shared-schema slot, sorted ascending by `start_time`
//! at the end of `init` — spec §3.3) is scanned by bisection-then-linear at
//! each `update`/`check_activity` to find the range with maximal
//! `start_time ≤ t`. This module implements that selection plus the
//! `Once`-range bookkeeping (clear-on-exit, mark-on-entry).

use crate::node::{Node, NodeHandle, NodeKind};

/// How a selected range affects the subtree this frame (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// No ranges configured: the subtree is always active (spec's implicit
    /// default when `ranges[]` is empty).
    Unbounded,
    Continuous,
    /// `Δ` is the gap to the *next* range's `start_time`, if any (spec
    /// §4.5's `PREFETCH_TIME`/`MAX_IDLE_TIME` look-ahead consumes this).
    NoRender { next_start_delta: Option<f64> },
    Once { render_time: f64, already_updated: bool },
}

pub(crate) fn start_time(h: &NodeHandle) -> f64 {
    match &h.borrow().kind {
        NodeKind::RangeContinuous(r) => r.start_time,
        NodeKind::RangeNoRender(r) => r.start_time,
        NodeKind::RangeOnce(r) => r.start_time,
        other => unreachable!("ranges[] slot holds a {:?}", other.kind_id()),
    }
}

/// Bisection-then-linear search for the rightmost index `i` with
/// `ranges[i].start_time ≤ t`. `ranges` is sorted ascending, so a binary
/// search finds the insertion point directly; if `t` is before every range's
/// start (an edge case spec.md leaves open — see DESIGN.md), the first range
/// is used, matching "no ranges means continuous" as the closest-available
/// policy.
fn bisect(ranges: &[NodeHandle], t: f64) -> usize {
    let mut lo = 0usize;
    let mut hi = ranges.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if start_time(&ranges[mid]) <= t {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo.saturating_sub(1)
}

/// Re-selects `node.current_range` for `t` (spec §4.4/§4.5's
/// `check_activity`/`update` re-scan), clearing the `updated` flag of any
/// `Once` range being left behind so a future re-entry draws it again.
pub fn select(node: &mut Node, t: f64) -> Selection {
    if node.ranges.is_empty() {
        return Selection::Unbounded;
    }
    let idx = bisect(&node.ranges, t);
    if idx != node.current_range {
        if let NodeKind::RangeOnce(r) = &mut node.ranges[node.current_range].borrow_mut().kind {
            r.updated = false;
        }
        node.current_range = idx;
    }
    describe(&node.ranges, idx, t)
}

fn describe(ranges: &[NodeHandle], idx: usize, t: f64) -> Selection {
    match &ranges[idx].borrow().kind {
        NodeKind::RangeContinuous(_) => Selection::Continuous,
        NodeKind::RangeNoRender(_) => {
            let next_start_delta = ranges.get(idx + 1).map(|n| start_time(n) - t);
            Selection::NoRender { next_start_delta }
        }
        NodeKind::RangeOnce(r) => Selection::Once { render_time: r.render_time, already_updated: r.updated },
        other => unreachable!("ranges[] slot holds a {:?}", other.kind_id()),
    }
}

/// Marks the currently-selected `Once` range as updated (spec §4.5: "If
/// `Once` and not yet updated ... marks `updated`"). No-op for any other
/// selected range kind.
pub fn mark_once_updated(node: &Node) {
    if node.ranges.is_empty() {
        return;
    }
    if let NodeKind::RangeOnce(r) = &mut node.ranges[node.current_range].borrow_mut().kind {
        r.updated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::factory;

    fn node_with_ranges(ranges: Vec<NodeHandle>) -> Node {
        let mut n = Node::new(NodeKind::Group(crate::node::kinds::structural::Group::default()));
        {
            let mut nb = n.borrow_mut();
            nb.ranges = ranges;
        }
        std::rc::Rc::try_unwrap(n).unwrap().into_inner()
    }

    #[test]
    fn continuous_then_once_then_continuous() {
        let once = factory::range_once(1.0, 0.5);
        let mut n = node_with_ranges(vec![
            factory::range_continuous(0.0),
            once.clone(),
            factory::range_continuous(2.0),
        ]);

        assert_eq!(select(&mut n, 0.5), Selection::Continuous);
        assert_eq!(select(&mut n, 1.2), Selection::Once { render_time: 0.5, already_updated: false });
        mark_once_updated(&n);
        assert_eq!(select(&mut n, 1.5), Selection::Once { render_time: 0.5, already_updated: true });
        // Crossing into the next range clears `updated` for a future re-entry.
        assert_eq!(select(&mut n, 2.5), Selection::Continuous);
        if let NodeKind::RangeOnce(r) = &once.borrow().kind {
            assert!(!r.updated);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn no_render_reports_gap_to_next_start() {
        let mut n = node_with_ranges(vec![factory::range_no_render(0.0), factory::range_continuous(5.0)]);
        match select(&mut n, 3.9) {
            Selection::NoRender { next_start_delta } => assert!((next_start_delta.unwrap() - 1.1).abs() < 1e-9),
            other => unreachable!("{other:?}"),
        }
    }

    #[test]
    fn no_ranges_is_unbounded() {
        let mut n = node_with_ranges(vec![]);
        assert_eq!(select(&mut n, 42.0), Selection::Unbounded);
    }
}
