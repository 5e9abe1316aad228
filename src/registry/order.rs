use std::rc::Rc;

use rand::{Rng, RngCore};

use super::Operation;

/// A registered operation with its current weight.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub op: Rc<Operation>,
    pub weight: f64,
}

/// Decides the order in which candidate operations are tried.
pub trait CandidateOrder {
    fn order(&self, candidates: Vec<Candidate>, rng: &mut dyn RngCore) -> Vec<Rc<Operation>>;
}

/// Weighted draw without replacement: each position is filled by picking one
/// of the remaining candidates with probability proportional to its weight.
/// Candidates with zero weight are never picked.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedShuffle;

impl CandidateOrder for WeightedShuffle {
    fn order(&self, candidates: Vec<Candidate>, rng: &mut dyn RngCore) -> Vec<Rc<Operation>> {
        let mut remaining = candidates
            .into_iter()
            .filter(|c| c.weight > 0.0)
            .collect::<Vec<_>>();
        let mut ordered = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let total = remaining.iter().map(|c| c.weight).sum::<f64>();
            let draw = rng.gen::<f64>();

            let mut running = 0.0;
            let mut picked = remaining.len() - 1;
            for (i, c) in remaining.iter().enumerate() {
                running += c.weight;
                if running / total > draw {
                    picked = i;
                    break;
                }
            }

            ordered.push(remaining.remove(picked).op);
        }

        ordered
    }
}

/// Registration order, ignoring weights other than zero. Deterministic.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrationOrder;

impl CandidateOrder for RegistrationOrder {
    fn order(&self, candidates: Vec<Candidate>, _: &mut dyn RngCore) -> Vec<Rc<Operation>> {
        candidates
            .into_iter()
            .filter(|c| c.weight > 0.0)
            .map(|c| c.op)
            .collect()
    }
}
