use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::SynthError,
    ty::{Ty, TyCaps},
};

macro_rules! node_kinds {
    ($($kind:ident => $name:literal),+ $(,)?) => {
        /// Operation category of a term node.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum NodeKind {
            $($kind),+
        }

        impl NodeKind {
            /// Every kind, in the stable enumeration order used for sampling.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => $name),+
                }
            }
        }

        impl FromStr for NodeKind {
            type Err = SynthError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(NodeKind::$kind),)+
                    _ => Err(SynthError::config(format!("unknown node kind `{}`", s))),
                }
            }
        }
    };
}

node_kinds! {
    Constant => "constant",
    Add => "add",
    AddChecked => "add_checked",
    Subtract => "subtract",
    SubtractChecked => "subtract_checked",
    Multiply => "multiply",
    MultiplyChecked => "multiply_checked",
    Divide => "divide",
    Modulo => "modulo",
    Power => "power",
    Negate => "negate",
    NegateChecked => "negate_checked",
    UnaryPlus => "unary_plus",
    Increment => "increment",
    Decrement => "decrement",
    And => "and",
    Or => "or",
    ExclusiveOr => "xor",
    LeftShift => "shl",
    RightShift => "shr",
    OnesComplement => "ones_complement",
    Not => "not",
    AndAlso => "and_also",
    OrElse => "or_else",
    IsTrue => "is_true",
    IsFalse => "is_false",
    Equal => "eq",
    NotEqual => "ne",
    LessThan => "lt",
    LessThanOrEqual => "le",
    GreaterThan => "gt",
    GreaterThanOrEqual => "ge",
    Coalesce => "coalesce",
    Conditional => "conditional",
    Block => "block",
    Loop => "loop",
    Assign => "assign",
    // the kinds below need structural metadata (call targets, members,
    // variables, labels) that does not exist while synthesizing
    Call => "call",
    Invoke => "invoke",
    MemberAccess => "member_access",
    New => "new",
    NewArray => "new_array",
    Lambda => "lambda",
    Parameter => "parameter",
    Convert => "convert",
    ConvertChecked => "convert_checked",
    TypeAs => "type_as",
    TypeIs => "type_is",
    Index => "index",
    Default => "default",
    Throw => "throw",
    Try => "try",
    Goto => "goto",
    Label => "label",
    AddAssign => "add_assign",
    SubtractAssign => "subtract_assign",
    MultiplyAssign => "multiply_assign",
    DivideAssign => "divide_assign",
    PreIncrementAssign => "pre_increment_assign",
    PostIncrementAssign => "post_increment_assign",
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the requested type of one child is chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// The anchor's type when it is assignable to the node's requested type,
    /// else the requested type.
    Same,
    /// The anchor's type, if any.
    Free,
    Fixed(Ty),
}

impl Slot {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Slot::Fixed(_))
    }

    /// `anchor` is the type of the first already-built child whose slot is
    /// not fixed. `None` leaves the child's type open.
    pub fn requested_ty<F>(
        &self,
        node_ty: Option<&Ty>,
        anchor: Option<&Ty>,
        is_assignable: F,
    ) -> Option<Ty>
    where
        F: Fn(&Ty, &Ty) -> bool,
    {
        match self {
            Slot::Same => match (node_ty, anchor) {
                (Some(node_ty), Some(anchor)) if is_assignable(anchor, node_ty) => {
                    Some(anchor.clone())
                }
                (Some(node_ty), _) => Some(node_ty.clone()),
                (None, anchor) => anchor.cloned(),
            },
            Slot::Free => anchor.cloned(),
            Slot::Fixed(ty) => Some(ty.clone()),
        }
    }

    /// Finds the anchor among the types of the children built so far.
    pub fn anchor<'a>(slots: &[Slot], siblings: &'a [Ty]) -> Option<&'a Ty> {
        slots
            .iter()
            .zip(siblings.iter())
            .find(|(slot, _)| !slot.is_fixed())
            .map(|(_, ty)| ty)
    }
}

impl NodeKind {
    pub fn is_supported(self) -> bool {
        self <= NodeKind::Assign
    }

    pub fn is_leaf(self) -> bool {
        self == NodeKind::Constant
    }

    pub fn unsupported() -> impl Iterator<Item = NodeKind> {
        NodeKind::ALL.iter().copied().filter(|k| !k.is_supported())
    }

    /// Child slots of a composite kind. Empty for the leaf kind and for
    /// unsupported kinds.
    pub fn shape(self) -> Vec<Slot> {
        use NodeKind::*;

        match self {
            Add | AddChecked | Subtract | SubtractChecked | Multiply | MultiplyChecked
            | Divide | Modulo | Power | And | Or | ExclusiveOr | AndAlso | OrElse | Coalesce
            | Assign => vec![Slot::Same, Slot::Same],
            LeftShift | RightShift => vec![Slot::Same, Slot::Fixed(Ty::int())],
            Negate | NegateChecked | UnaryPlus | Increment | Decrement | OnesComplement
            | Not | IsTrue | IsFalse => vec![Slot::Same],
            Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan
            | GreaterThanOrEqual => vec![Slot::Free, Slot::Free],
            Conditional => vec![Slot::Fixed(Ty::bool()), Slot::Same, Slot::Same],
            Block => vec![Slot::Free, Slot::Same],
            Loop => vec![Slot::Fixed(Ty::bool()), Slot::Free],
            _ => vec![],
        }
    }

    pub fn arity(self) -> usize {
        self.shape().len()
    }

    /// Capabilities, any of which an operand must offer when its type is left
    /// open. Empty when any type will do.
    pub fn operand_caps(self) -> TyCaps {
        use NodeKind::*;

        match self {
            Add | AddChecked | Subtract | SubtractChecked | Multiply | MultiplyChecked
            | Divide | Modulo | Power | Negate | NegateChecked | UnaryPlus | Increment
            | Decrement => TyCaps::NUMERIC,
            And | Or | ExclusiveOr | Not => TyCaps::INTEGRAL | TyCaps::BOOLEAN,
            LeftShift | RightShift | OnesComplement => TyCaps::INTEGRAL,
            AndAlso | OrElse | IsTrue | IsFalse => TyCaps::BOOLEAN,
            Equal | NotEqual => TyCaps::EQUATABLE,
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => TyCaps::ORDERED,
            _ => TyCaps::empty(),
        }
    }
}
