// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    priority: f64,
    seq: u64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower priorities (and earlier insertions) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue of node ids. Entries with equal priorities
/// are popped in insertion order.
///
/// A node may be pushed multiple times; callers are expected to skip
/// stale entries of already settled nodes.
#[derive(Debug, Default)]
pub(super) struct Frontier {
    heap: BinaryHeap<QueueItem>,
    next_seq: u64,
}

impl Frontier {
    pub(super) fn push(&mut self, at: i64, priority: f64) {
        self.heap.push(QueueItem {
            at,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    pub(super) fn pop(&mut self) -> Option<i64> {
        self.heap.pop().map(|item| item.at)
    }
}
