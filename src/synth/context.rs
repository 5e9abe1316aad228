use crate::{errors::SynthError, ty::Ty};

/// Mutable state of one branch of a synthesis request. Cloned at every
/// branch point so siblings never observe each other's changes.
#[derive(Clone, Debug, PartialEq)]
pub struct CreationContext {
    pub current_depth: usize,
    pub requested_return_type: Option<Ty>,
    /// Types of the children already built at the current composite.
    pub evaluated_sibling_types: Vec<Ty>,
    /// Recoverable failures met so far. Only read by callers and tests.
    pub diagnostic_trail: Vec<SynthError>,
}

impl Default for CreationContext {
    fn default() -> Self {
        CreationContext::new()
    }
}

impl CreationContext {
    pub fn new() -> CreationContext {
        CreationContext {
            current_depth: 1,
            requested_return_type: None,
            evaluated_sibling_types: vec![],
            diagnostic_trail: vec![],
        }
    }

    /// A clone for an independent child branch requesting `ty`. The branch
    /// starts with an empty trail; merge it back with `absorb_diagnostics`.
    pub fn branch(&self, ty: Option<Ty>) -> CreationContext {
        CreationContext {
            current_depth: self.current_depth,
            requested_return_type: ty,
            evaluated_sibling_types: self.evaluated_sibling_types.clone(),
            diagnostic_trail: vec![],
        }
    }

    pub fn record(&mut self, err: SynthError) {
        log::trace!("[synth] recorded: {}", err);
        self.diagnostic_trail.push(err);
    }

    pub fn absorb_diagnostics(&mut self, other: CreationContext) {
        self.diagnostic_trail.extend(other.diagnostic_trail);
    }
}
