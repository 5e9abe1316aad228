use crate::{
    errors::{SynthError, SynthResult},
    term::{NodeKind, Term, TermBody, Value},
};

use super::{Backend, Signature};

pub const DEFAULT_LOOP_CAP: usize = 10_000;

/// A term ready to be evaluated.
#[derive(Clone, Debug)]
pub struct Program {
    term: Term,
    signature: Signature,
    loop_cap: usize,
}

/// Backend that evaluates terms directly.
#[derive(Clone, Copy, Debug)]
pub struct Interpreter {
    pub loop_cap: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter {
            loop_cap: DEFAULT_LOOP_CAP,
        }
    }
}

impl Backend for Interpreter {
    type Artifact = Program;

    fn emit(&mut self, term: &Term, signature: &Signature) -> SynthResult<Program> {
        signature.check(term)?;
        Ok(Program {
            term: term.clone(),
            signature: signature.clone(),
            loop_cap: self.loop_cap,
        })
    }
}

fn overflow(kind: NodeKind) -> SynthError {
    SynthError::eval(format!("arithmetic overflow in `{}`", kind))
}

fn mismatch(kind: NodeKind, operands: &[&Value]) -> SynthError {
    let operands = operands
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    SynthError::eval(format!("`{}` cannot be applied to {}", kind, operands))
}

macro_rules! integral_arith {
    ($variant:ident, $kind:expr, $a:expr, $b:expr) => {{
        let (kind, a, b) = ($kind, $a, $b);
        let result = match kind {
            NodeKind::Add => Some(a.wrapping_add(b)),
            NodeKind::AddChecked => a.checked_add(b),
            NodeKind::Subtract => Some(a.wrapping_sub(b)),
            NodeKind::SubtractChecked => a.checked_sub(b),
            NodeKind::Multiply => Some(a.wrapping_mul(b)),
            NodeKind::MultiplyChecked => a.checked_mul(b),
            NodeKind::Divide | NodeKind::Modulo if b == 0 => {
                return Err(SynthError::eval("division by zero"))
            }
            NodeKind::Divide => Some(a.wrapping_div(b)),
            NodeKind::Modulo => Some(a.wrapping_rem(b)),
            NodeKind::And => Some(a & b),
            NodeKind::Or => Some(a | b),
            NodeKind::ExclusiveOr => Some(a ^ b),
            _ => return Err(mismatch(kind, &[&Value::$variant(a), &Value::$variant(b)])),
        };

        result.map(Value::$variant).ok_or_else(|| overflow(kind))
    }};
}

macro_rules! integral_unary {
    ($variant:ident, $kind:expr, $a:expr) => {{
        let (kind, a) = ($kind, $a);
        let result = match kind {
            NodeKind::Negate => Some(a.wrapping_neg()),
            NodeKind::NegateChecked => a.checked_neg(),
            NodeKind::UnaryPlus => Some(a),
            NodeKind::Increment => Some(a.wrapping_add(1)),
            NodeKind::Decrement => Some(a.wrapping_sub(1)),
            NodeKind::OnesComplement | NodeKind::Not => Some(!a),
            _ => return Err(mismatch(kind, &[&Value::$variant(a)])),
        };

        result.map(Value::$variant).ok_or_else(|| overflow(kind))
    }};
}

fn binary(kind: NodeKind, lhs: Value, rhs: Value) -> SynthResult<Value> {
    use NodeKind::*;

    match (kind, lhs, rhs) {
        (Equal, a, b) => Ok(Value::Bool(a == b)),
        (NotEqual, a, b) => Ok(Value::Bool(a != b)),
        (LessThan, a, b) | (LessThanOrEqual, a, b) | (GreaterThan, a, b)
        | (GreaterThanOrEqual, a, b) => compare(kind, &a, &b),
        (LeftShift, Value::Int(a), Value::Int(n)) => Ok(Value::Int(a.wrapping_shl(n as u32))),
        (LeftShift, Value::Long(a), Value::Int(n)) => Ok(Value::Long(a.wrapping_shl(n as u32))),
        (RightShift, Value::Int(a), Value::Int(n)) => Ok(Value::Int(a.wrapping_shr(n as u32))),
        (RightShift, Value::Long(a), Value::Int(n)) => {
            Ok(Value::Long(a.wrapping_shr(n as u32)))
        }
        (And, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a & b)),
        (Or, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a | b)),
        (ExclusiveOr, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a ^ b)),
        (Power, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a.powf(b))),
        (_, Value::Int(a), Value::Int(b)) => integral_arith!(Int, kind, a, b),
        (_, Value::Long(a), Value::Long(b)) => integral_arith!(Long, kind, a, b),
        (_, Value::Float(a), Value::Float(b)) => {
            let x = match kind {
                Add | AddChecked => a + b,
                Subtract | SubtractChecked => a - b,
                Multiply | MultiplyChecked => a * b,
                Divide => a / b,
                Modulo => a % b,
                _ => return Err(mismatch(kind, &[&Value::Float(a), &Value::Float(b)])),
            };
            Ok(Value::Float(x))
        }
        (_, a, b) => Err(mismatch(kind, &[&a, &b])),
    }
}

fn compare(kind: NodeKind, lhs: &Value, rhs: &Value) -> SynthResult<Value> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Long(a), Value::Long(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        _ => return Err(mismatch(kind, &[lhs, rhs])),
    };

    // comparisons involving NaN are false
    let ordering = unless!(ordering, else return Ok(Value::Bool(false)));
    let result = match kind {
        NodeKind::LessThan => ordering.is_lt(),
        NodeKind::LessThanOrEqual => ordering.is_le(),
        NodeKind::GreaterThan => ordering.is_gt(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Bool(result))
}

fn unary(kind: NodeKind, operand: Value) -> SynthResult<Value> {
    use NodeKind::*;

    match (kind, operand) {
        (Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (IsTrue, Value::Bool(b)) => Ok(Value::Bool(b)),
        (IsFalse, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (_, Value::Int(a)) => integral_unary!(Int, kind, a),
        (_, Value::Long(a)) => integral_unary!(Long, kind, a),
        (Negate, Value::Float(x)) | (NegateChecked, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryPlus, Value::Float(x)) => Ok(Value::Float(x)),
        (Increment, Value::Float(x)) => Ok(Value::Float(x + 1.0)),
        (Decrement, Value::Float(x)) => Ok(Value::Float(x - 1.0)),
        (_, v) => Err(mismatch(kind, &[&v])),
    }
}

impl Program {
    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn run(&self) -> SynthResult<Value> {
        self.eval(&self.term)
    }

    fn eval_bool(&self, term: &Term) -> SynthResult<bool> {
        self.eval(term)?
            .as_bool()
            .map_err(|err| SynthError::eval(err.msg))
    }

    fn eval(&self, term: &Term) -> SynthResult<Value> {
        use NodeKind::*;

        let children = match &term.body {
            TermBody::Leaf(value) => return Ok(value.clone()),
            TermBody::Node(children) => children,
        };

        match (term.kind, children.as_slice()) {
            (AndAlso, [lhs, rhs]) => Ok(Value::Bool(self.eval_bool(lhs)? && self.eval_bool(rhs)?)),
            (OrElse, [lhs, rhs]) => Ok(Value::Bool(self.eval_bool(lhs)? || self.eval_bool(rhs)?)),
            (Coalesce, [lhs, rhs]) => match self.eval(lhs)? {
                Value::Nil => self.eval(rhs),
                value => Ok(value),
            },
            (Conditional, [cond, then, otherwise]) => {
                if self.eval_bool(cond)? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            (Block, [first, last]) => {
                self.eval(first)?;
                self.eval(last)
            }
            (Loop, [cond, body]) => {
                let mut iterations = 0;
                while self.eval_bool(cond)? {
                    if iterations == self.loop_cap {
                        return Err(SynthError::eval(format!(
                            "loop did not finish within {} iterations",
                            self.loop_cap
                        )));
                    }
                    self.eval(body)?;
                    iterations += 1;
                }
                Ok(Value::Unit)
            }
            (Assign, _) => Err(SynthError::eval("nothing can be assigned to")),
            (kind, [operand]) => unary(kind, self.eval(operand)?),
            (kind, [lhs, rhs]) => binary(kind, self.eval(lhs)?, self.eval(rhs)?),
            (kind, _) => Err(SynthError::eval(format!(
                "`{}` cannot be evaluated with {} operand(s)",
                kind,
                children.len()
            ))),
        }
    }
}
