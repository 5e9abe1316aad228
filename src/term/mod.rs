use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{errors::SynthResult, ty::Ty, utils::join};

mod kind;
mod value;

pub use kind::{NodeKind, Slot};
pub use value::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TermBody {
    Leaf(Value),
    Node(Vec<Term>),
}

/// A synthesized node together with its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub kind: NodeKind,
    pub ty: Ty,
    pub body: TermBody,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            TermBody::Leaf(value) => write!(f, "{}", value),
            TermBody::Node(children) => write!(f, "({} {})", self.kind, join(children, " ")),
        }
    }
}

impl Term {
    pub fn leaf(value: Value) -> Term {
        Term {
            kind: NodeKind::Constant,
            ty: value.ty(),
            body: TermBody::Leaf(value),
        }
    }

    pub fn placeholder() -> Term {
        Term::leaf(Value::Nil)
    }

    pub fn node(kind: NodeKind, ty: Ty, children: Vec<Term>) -> Term {
        Term {
            kind,
            ty,
            body: TermBody::Node(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, TermBody::Leaf(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(&self.body, TermBody::Leaf(v) if v.is_nil())
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.body {
            TermBody::Leaf(value) => Some(value),
            TermBody::Node(_) => None,
        }
    }

    pub fn children(&self) -> &[Term] {
        match &self.body {
            TermBody::Leaf(_) => &[],
            TermBody::Node(children) => children,
        }
    }

    /// Number of levels in the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Term::depth).max().unwrap_or(0)
    }

    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Term::size).sum::<usize>()
    }

    /// Structural hash of the term, stable for equal trees.
    pub fn fingerprint(&self) -> SynthResult<u64> {
        let bytes = bincode::serialize(self)?;
        Ok(xxhash_rust::xxh3::xxh3_64(&bytes))
    }
}
