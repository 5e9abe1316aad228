use crate::{
    errors::{SynthError, SynthResult},
    term::NodeKind,
    ty::Ty,
};

fn fail<S: Into<String>>(kind: NodeKind, msg: S) -> SynthError {
    SynthError::synthesis(kind, msg)
}

/// The common type of all operands, if they agree and satisfy `pred`.
fn agree<'a>(
    kind: NodeKind,
    operands: &[&'a Ty],
    pred: fn(&Ty) -> bool,
    what: &str,
) -> SynthResult<&'a Ty> {
    let first = match operands.first() {
        Some(ty) => *ty,
        None => return Err(fail(kind, "missing operands")),
    };

    if let Some(other) = operands.iter().find(|ty| **ty != first) {
        return Err(fail(
            kind,
            format!("operand types `{}` and `{}` do not agree", first, other),
        ));
    }

    if !pred(first) {
        return Err(fail(kind, format!("`{}` is not {}", first, what)));
    }

    Ok(first)
}

fn any(_: &Ty) -> bool {
    true
}

fn bitwise(ty: &Ty) -> bool {
    ty.is_integral() || ty.is_boolean()
}

fn is_bool(ty: &Ty) -> bool {
    ty == &Ty::bool()
}

fn is_float(ty: &Ty) -> bool {
    ty == &Ty::float()
}

/// Type of a composite node of `kind` over operands of the given types.
pub fn result_ty(kind: NodeKind, operands: &[&Ty]) -> SynthResult<Ty> {
    use NodeKind::*;

    if operands.len() != kind.arity() {
        return Err(fail(
            kind,
            format!("expected {} operand(s), found {}", kind.arity(), operands.len()),
        ));
    }

    let ty = match kind {
        Add | AddChecked | Subtract | SubtractChecked | Multiply | MultiplyChecked | Divide
        | Modulo | Negate | NegateChecked | UnaryPlus | Increment | Decrement => {
            agree(kind, operands, Ty::is_numeric, "numeric")?.clone()
        }
        Power => agree(kind, operands, is_float, "a float")?.clone(),
        And | Or | ExclusiveOr | Not => {
            agree(kind, operands, bitwise, "integral or boolean")?.clone()
        }
        OnesComplement => agree(kind, operands, Ty::is_integral, "integral")?.clone(),
        LeftShift | RightShift => {
            let (lhs, rhs) = (operands[0], operands[1]);
            if !lhs.is_integral() {
                return Err(fail(kind, format!("cannot shift a `{}`", lhs)));
            }
            if rhs != &Ty::int() {
                return Err(fail(kind, format!("shift amount must be int, found `{}`", rhs)));
            }
            lhs.clone()
        }
        AndAlso | OrElse | IsTrue | IsFalse => agree(kind, operands, is_bool, "bool")?.clone(),
        Equal | NotEqual => {
            agree(kind, operands, Ty::is_equatable, "equatable")?;
            Ty::bool()
        }
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            agree(kind, operands, Ty::is_ordered, "ordered")?;
            Ty::bool()
        }
        Coalesce => agree(kind, operands, any, "a value")?.clone(),
        Conditional => {
            if !is_bool(operands[0]) {
                return Err(fail(kind, format!("condition is `{}`", operands[0])));
            }
            agree(kind, &operands[1..], any, "a value")?.clone()
        }
        Block => operands[1].clone(),
        Loop => {
            if !is_bool(operands[0]) {
                return Err(fail(kind, format!("loop condition is `{}`", operands[0])));
            }
            Ty::unit()
        }
        Assign => return Err(fail(kind, "the left operand is not an assignable location")),
        _ => return Err(fail(kind, format!("node kind `{}` has no typing rule", kind))),
    };

    if ty.is_nil() {
        return Err(fail(kind, "operands are placeholders"));
    }
    Ok(ty)
}
