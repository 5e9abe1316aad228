use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{SynthError, SynthResult},
    ty::Ty,
    utils::join,
};

/// A value produced by an operation and held by a leaf term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Unit,
    /// The placeholder "no value".
    Nil,
    /// A value of a user-declared host type.
    Object { ty: Ty, fields: Vec<Value> },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}L", l),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Unit => write!(f, "()"),
            Value::Nil => write!(f, "nil"),
            Value::Object { ty, fields } => write!(f, "{}{{{}}}", ty, join(fields, ", ")),
        }
    }
}

macro_rules! expect_value {
    ($name:ident, $variant:ident, $t:ty, $ty:expr) => {
        pub fn $name(&self) -> SynthResult<$t> {
            match self {
                Value::$variant(v) => Ok(v.clone()),
                other => Err(SynthError::fault(format!(
                    "expected a value of type `{}` but found `{}`",
                    $ty,
                    other.ty()
                ))),
            }
        }
    };
}

impl Value {
    pub fn object<T: Into<Ty>>(ty: T, fields: Vec<Value>) -> Value {
        Value::Object {
            ty: ty.into(),
            fields,
        }
    }

    pub fn ty(&self) -> Ty {
        match self {
            Value::Int(_) => Ty::int(),
            Value::Long(_) => Ty::long(),
            Value::Float(_) => Ty::float(),
            Value::Bool(_) => Ty::bool(),
            Value::Str(_) => Ty::string(),
            Value::Unit => Ty::unit(),
            Value::Nil => Ty::nil(),
            Value::Object { ty, .. } => ty.clone(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    expect_value!(as_int, Int, i32, Ty::int());
    expect_value!(as_long, Long, i64, Ty::long());
    expect_value!(as_float, Float, f64, Ty::float());
    expect_value!(as_bool, Bool, bool, Ty::bool());
    expect_value!(as_str, Str, String, Ty::string());
}
