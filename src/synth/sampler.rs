use std::cell::RefCell;

use fnv::FnvHashSet;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    errors::{SynthError, SynthResult},
    registry::check_weight,
    term::NodeKind,
};

/// Weighted random draw over node kinds.
///
/// Weights are kept in the stable order of `NodeKind::ALL`. Supported kinds
/// start at 1.0, unsupported ones at 0.0.
pub struct Sampler {
    weights: Vec<f64>,
    total: f64,
    rng: RefCell<StdRng>,
}

impl Sampler {
    pub fn new(rng: StdRng) -> Sampler {
        let weights = NodeKind::ALL
            .iter()
            .map(|k| if k.is_supported() { 1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<f64>();
        Sampler {
            weights,
            total,
            rng: RefCell::new(rng),
        }
    }

    pub fn seeded(seed: u64) -> Sampler {
        Sampler::new(StdRng::seed_from_u64(seed))
    }

    // `NodeKind::ALL` lists the kinds in declaration order
    fn position(kind: NodeKind) -> usize {
        kind as usize
    }

    pub fn get_weight(&self, kind: NodeKind) -> f64 {
        self.weights[Sampler::position(kind)]
    }

    pub fn set_weight(&mut self, kind: NodeKind, weight: f64) -> SynthResult {
        check_weight(weight, &kind)?;

        let idx = Sampler::position(kind);
        self.total += weight - self.weights[idx];
        self.weights[idx] = weight;
        Ok(())
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn weights(&self) -> impl Iterator<Item = (NodeKind, f64)> + '_ {
        NodeKind::ALL.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn sample(&self) -> SynthResult<NodeKind> {
        if self.total <= 0.0 {
            return Err(SynthError::fatal("cannot sample a node kind: every weight is zero"));
        }

        let draw = self.rng.borrow_mut().gen::<f64>();
        Ok(self.walk(self.total, draw, |_| false))
    }

    /// Like `sample`, but never yields a kind in `excluded`. Returns `None`
    /// once every kind with a positive weight is excluded.
    pub fn sample_excluding(&self, excluded: &FnvHashSet<NodeKind>) -> Option<NodeKind> {
        let total = self
            .weights()
            .filter(|(k, _)| !excluded.contains(k))
            .map(|(_, w)| w)
            .sum::<f64>();
        if total <= 0.0 {
            return None;
        }

        let draw = self.rng.borrow_mut().gen::<f64>();
        Some(self.walk(total, draw, |k| excluded.contains(&k)))
    }

    fn walk<F: Fn(NodeKind) -> bool>(&self, total: f64, draw: f64, skip: F) -> NodeKind {
        let mut running = 0.0;
        let mut last = NodeKind::Constant;
        for (kind, weight) in self.weights() {
            if weight <= 0.0 || skip(kind) {
                continue;
            }

            running += weight;
            last = kind;
            if running / total > draw {
                return kind;
            }
        }

        // rounding left the accumulated fraction just under the draw
        last
    }
}
