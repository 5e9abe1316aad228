use std::fmt;

use crate::ty::Ty;

/// Constraints a term must satisfy: a depth budget and, optionally, the type
/// it must produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreationConditions {
    pub max_depth: usize,
    pub requested_ty: Option<Ty>,
}

impl Default for CreationConditions {
    fn default() -> Self {
        CreationConditions::none()
    }
}

impl fmt::Display for CreationConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max_depth == usize::MAX {
            write!(f, "depth=unbounded")?;
        } else {
            write!(f, "depth={}", self.max_depth)?;
        }

        match &self.requested_ty {
            Some(ty) => write!(f, " ty={}", ty),
            None => Ok(()),
        }
    }
}

impl CreationConditions {
    /// No constraint at all.
    pub fn none() -> CreationConditions {
        CreationConditions {
            max_depth: usize::MAX,
            requested_ty: None,
        }
    }

    pub fn new(max_depth: usize, requested_ty: Option<Ty>) -> CreationConditions {
        CreationConditions {
            max_depth,
            requested_ty,
        }
    }

    pub fn with_ty(max_depth: usize, ty: Ty) -> CreationConditions {
        CreationConditions::new(max_depth, Some(ty))
    }

    /// Combines two sets of conditions: the smaller depth budget wins, and
    /// `a`'s type is kept whenever it has one.
    pub fn strictest_union(a: &CreationConditions, b: &CreationConditions) -> CreationConditions {
        CreationConditions {
            max_depth: a.max_depth.min(b.max_depth),
            requested_ty: a.requested_ty.clone().or_else(|| b.requested_ty.clone()),
        }
    }
}
