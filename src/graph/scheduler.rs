use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::foundation::core::NodeId;

/// Deterministic dependency-count scheduler over a node arena.
///
/// Determinism rule: when multiple nodes are ready, the smallest `NodeId` is returned first.
/// Only slots flagged in `active` take part; edges touching inactive slots are ignored.
pub(crate) struct DagScheduler {
    indeg: Vec<u32>,
    dependents: Vec<Vec<NodeId>>,
    ready: BinaryHeap<Reverse<u32>>,
    remaining: usize,
}

impl DagScheduler {
    pub(crate) fn new(active: &[bool], edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let n = active.len();
        let mut indeg = vec![0u32; n];
        let mut dependents = vec![Vec::<NodeId>::new(); n];

        for (from, to) in edges {
            let (fi, ti) = (from.index(), to.index());
            if !active[fi] || !active[ti] {
                continue;
            }
            dependents[fi].push(to);
            indeg[ti] = indeg[ti].saturating_add(1);
        }

        let mut ready = BinaryHeap::<Reverse<u32>>::new();
        let mut remaining = 0;
        for (i, &deg) in indeg.iter().enumerate() {
            if !active[i] {
                continue;
            }
            remaining += 1;
            if deg == 0 {
                ready.push(Reverse(i as u32));
            }
        }

        Self {
            indeg,
            dependents,
            ready,
            remaining,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    pub(crate) fn pop_ready(&mut self) -> Option<NodeId> {
        let Reverse(id) = self.ready.pop()?;
        Some(NodeId(id))
    }

    pub(crate) fn dependents(&self, id: NodeId) -> &[NodeId] {
        &self.dependents[id.index()]
    }

    pub(crate) fn mark_done(&mut self, done: NodeId) {
        self.remaining = self.remaining.saturating_sub(1);
        for &dep in &self.dependents[done.index()] {
            let d = &mut self.indeg[dep.index()];
            *d = d.saturating_sub(1);
            if *d == 0 {
                self.ready.push(Reverse(dep.0));
            }
        }
    }
}
