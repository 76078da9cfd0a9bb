use serde::{Deserialize, Serialize};

use crate::{core::shape::Aabb, utils::allocator::BodyHandle};

/// A body as seen by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proxy {
    /// Position of the body in the stepper's working set.
    pub index: usize,
    pub handle: BodyHandle,
    pub aabb: Aabb,
}

/// Unordered pair of working-set indices, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    pub a: usize,
    pub b: usize,
}

impl CandidatePair {
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

/// Produces every pair of proxies whose AABBs overlap.
///
/// Implementations may return extra pairs but must never miss an overlapping
/// one. Output pairs are unique, never pair a proxy with itself and are sorted.
pub trait BroadPhase: Send + Sync {
    fn name(&self) -> &'static str;

    fn candidate_pairs(&mut self, proxies: &[Proxy]) -> Vec<CandidatePair>;
}

/// Tests every pair. Used when no sweep axis is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn candidate_pairs(&mut self, proxies: &[Proxy]) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        for (i, first) in proxies.iter().enumerate() {
            for second in &proxies[i + 1..] {
                if first.aabb.overlaps(&second.aabb) {
                    pairs.push(CandidatePair::new(first.index, second.index));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepAxis {
    #[default]
    X,
    Y,
}

impl SweepAxis {
    fn min(self, aabb: &Aabb) -> f32 {
        match self {
            SweepAxis::X => aabb.min.x,
            SweepAxis::Y => aabb.min.y,
        }
    }

    fn max(self, aabb: &Aabb) -> f32 {
        match self {
            SweepAxis::X => aabb.max.x,
            SweepAxis::Y => aabb.max.y,
        }
    }
}

/// Sort-and-sweep along one axis.
///
/// The sorted order is kept between calls; bodies rarely move far in one
/// step, so insertion sort on the previous order is close to linear.
#[derive(Debug, Default, Clone)]
pub struct SweepAndPrune {
    axis: SweepAxis,
    order: Vec<usize>,
}

impl SweepAndPrune {
    pub fn new(axis: SweepAxis) -> Self {
        Self {
            axis,
            order: Vec::new(),
        }
    }

    pub fn axis(&self) -> SweepAxis {
        self.axis
    }

    fn sort(&mut self, proxies: &[Proxy]) {
        if self.order.len() != proxies.len() {
            self.order = (0..proxies.len()).collect();
        }

        let axis = self.axis;
        let comes_after = |a: usize, b: usize| {
            let key_a = axis.min(&proxies[a].aabb);
            let key_b = axis.min(&proxies[b].aabb);
            key_a.total_cmp(&key_b).then(a.cmp(&b)).is_gt()
        };

        for i in 1..self.order.len() {
            let mut j = i;
            while j > 0 && comes_after(self.order[j - 1], self.order[j]) {
                self.order.swap(j - 1, j);
                j -= 1;
            }
        }
    }
}

impl BroadPhase for SweepAndPrune {
    fn name(&self) -> &'static str {
        "sweep-and-prune"
    }

    fn candidate_pairs(&mut self, proxies: &[Proxy]) -> Vec<CandidatePair> {
        self.sort(proxies);

        let axis = self.axis;
        let mut pairs = Vec::new();
        let mut active: Vec<usize> = Vec::new();

        for &current in &self.order {
            let proxy = &proxies[current];
            let start = axis.min(&proxy.aabb);

            // Bounds are inclusive: an interval ending exactly at `start` stays.
            active.retain(|&other| axis.max(&proxies[other].aabb) >= start);

            for &other in &active {
                if proxy.aabb.overlaps(&proxies[other].aabb) {
                    pairs.push(CandidatePair::new(proxy.index, proxies[other].index));
                }
            }
            active.push(current);
        }

        pairs.sort_unstable();
        pairs
    }
}
