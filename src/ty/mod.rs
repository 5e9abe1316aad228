use std::fmt::Display;

use bitflags::bitflags;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

mod hierarchy;

pub use hierarchy::TypeHierarchy;

/// A nominal type. Two types are the same iff their names are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ty(String);

bitflags! {
    /// Operator capabilities of a type, used by the node typing rules.
    pub struct TyCaps: u8 {
        const NUMERIC   = 0b00001;
        const INTEGRAL  = 0b00010;
        const ORDERED   = 0b00100;
        const EQUATABLE = 0b01000;
        const BOOLEAN   = 0b10000;
    }
}

lazy_static! {
    static ref BUILTIN_CAPS: FnvHashMap<&'static str, TyCaps> = {
        let mut m = FnvHashMap::default();
        let int = TyCaps::NUMERIC | TyCaps::INTEGRAL | TyCaps::ORDERED | TyCaps::EQUATABLE;
        m.insert("int", int);
        m.insert("long", int);
        m.insert("float", TyCaps::NUMERIC | TyCaps::ORDERED | TyCaps::EQUATABLE);
        m.insert("bool", TyCaps::BOOLEAN | TyCaps::EQUATABLE);
        m.insert("string", TyCaps::ORDERED | TyCaps::EQUATABLE);
        m.insert("unit", TyCaps::EQUATABLE);
        m.insert("nil", TyCaps::empty());
        m.insert("object", TyCaps::empty());
        m
    };
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ty {
    fn from(s: &str) -> Ty {
        Ty::con(s)
    }
}

impl Ty {
    #[inline(always)]
    pub fn con<S: Into<String>>(s: S) -> Ty {
        Ty(s.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    #[inline(always)]
    pub fn int() -> Ty {
        Ty::con("int")
    }

    #[inline(always)]
    pub fn long() -> Ty {
        Ty::con("long")
    }

    #[inline(always)]
    pub fn float() -> Ty {
        Ty::con("float")
    }

    #[inline(always)]
    pub fn bool() -> Ty {
        Ty::con("bool")
    }

    #[inline(always)]
    pub fn string() -> Ty {
        Ty::con("string")
    }

    #[inline(always)]
    pub fn unit() -> Ty {
        Ty::con("unit")
    }

    /// Type of the placeholder leaf.
    #[inline(always)]
    pub fn nil() -> Ty {
        Ty::con("nil")
    }

    #[inline(always)]
    pub fn object() -> Ty {
        Ty::con("object")
    }

    #[inline(always)]
    pub fn numeric() -> Ty {
        Ty::con("numeric")
    }

    #[inline(always)]
    pub fn integral() -> Ty {
        Ty::con("integral")
    }

    #[inline(always)]
    pub fn comparable() -> Ty {
        Ty::con("comparable")
    }

    #[inline(always)]
    pub fn equatable() -> Ty {
        Ty::con("equatable")
    }

    pub fn is_nil(&self) -> bool {
        self.0 == "nil"
    }

    /// Capabilities of a primitive type. Any other type can only be compared
    /// for equality.
    pub fn caps(&self) -> TyCaps {
        BUILTIN_CAPS
            .get(self.0.as_str())
            .copied()
            .unwrap_or(TyCaps::EQUATABLE)
    }

    pub fn is_numeric(&self) -> bool {
        self.caps().contains(TyCaps::NUMERIC)
    }

    pub fn is_integral(&self) -> bool {
        self.caps().contains(TyCaps::INTEGRAL)
    }

    pub fn is_ordered(&self) -> bool {
        self.caps().contains(TyCaps::ORDERED)
    }

    pub fn is_equatable(&self) -> bool {
        self.caps().contains(TyCaps::EQUATABLE)
    }

    pub fn is_boolean(&self) -> bool {
        self.caps().contains(TyCaps::BOOLEAN)
    }
}
