use std::collections::BTreeMap;

use crate::{
    errors::{SynthError, SynthResult},
    term::{NodeKind, Term, TermBody, Value},
    ty::Ty,
    utils::{indent_lines, join, map_join},
};

use super::{interp::DEFAULT_LOOP_CAP, Backend, Signature};

/// Backend that renders a term as the body of a Rust function, to be built
/// by an external compiler.
#[derive(Debug, Default)]
pub struct RustSource {
    /// Field types of every host object type met while rendering.
    structs: BTreeMap<Ty, Vec<String>>,
}

fn rust_ty(ty: &Ty) -> String {
    match ty.name() {
        "int" => str!("i32"),
        "long" => str!("i64"),
        "float" => str!("f64"),
        "bool" => str!("bool"),
        "string" => str!("String"),
        "unit" | "nil" => str!("()"),
        other => other.to_string(),
    }
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        str!("f64::NAN")
    } else if x.is_infinite() && x > 0.0 {
        str!("f64::INFINITY")
    } else if x.is_infinite() {
        str!("f64::NEG_INFINITY")
    } else {
        format!("{:?}f64", x)
    }
}

// a leading minus binds looser than a method call
fn signed(negative: bool, lit: String) -> String {
    if negative {
        format!("({})", lit)
    } else {
        lit
    }
}

impl RustSource {
    pub fn new() -> RustSource {
        RustSource::default()
    }

    fn literal(&mut self, value: &Value) -> String {
        match value {
            Value::Int(i) => signed(*i < 0, format!("{}i32", i)),
            Value::Long(l) => signed(*l < 0, format!("{}i64", l)),
            Value::Float(x) => signed(x.is_sign_negative(), float_literal(*x)),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => format!("String::from({:?})", s),
            Value::Unit | Value::Nil => str!("()"),
            Value::Object { ty, fields } => {
                let field_tys = fields.iter().map(|f| rust_ty(&f.ty())).collect();
                self.structs.entry(ty.clone()).or_insert(field_tys);
                let fields = fields.iter().map(|f| self.literal(f)).collect::<Vec<_>>();
                format!("{}({})", ty, fields.join(", "))
            }
        }
    }

    fn expr(&mut self, term: &Term) -> SynthResult<String> {
        use NodeKind::*;

        let children = match &term.body {
            TermBody::Leaf(value) => return Ok(self.literal(value)),
            TermBody::Node(children) => children,
        };

        let args = children
            .iter()
            .map(|c| self.expr(c))
            .collect::<SynthResult<Vec<_>>>()?;
        let operand_ty = children.first().map(|c| &c.ty).unwrap_or(&term.ty);
        let float = operand_ty == &Ty::float();

        let method = |name: &str| format!("{}.{}({})", args[0], name, join(&args[1..], ", "));
        let checked = |name: &str| {
            format!(
                "{}.{}({}).expect(\"arithmetic overflow\")",
                args[0],
                name,
                join(&args[1..], ", ")
            )
        };
        let infix = |op: &str| format!("({} {} {})", args[0], op, args[1]);

        let src = match term.kind {
            Add if float => infix("+"),
            Subtract | SubtractChecked if float => infix("-"),
            AddChecked if float => infix("+"),
            Multiply | MultiplyChecked if float => infix("*"),
            Divide if float => infix("/"),
            Modulo if float => infix("%"),
            Add => method("wrapping_add"),
            AddChecked => checked("checked_add"),
            Subtract => method("wrapping_sub"),
            SubtractChecked => checked("checked_sub"),
            Multiply => method("wrapping_mul"),
            MultiplyChecked => checked("checked_mul"),
            Divide => method("wrapping_div"),
            Modulo => method("wrapping_rem"),
            Power => method("powf"),
            Negate | NegateChecked if float => format!("(-{})", args[0]),
            Negate => method("wrapping_neg"),
            NegateChecked => checked("checked_neg"),
            UnaryPlus | IsTrue => format!("({})", args[0]),
            Increment if float => format!("({} + 1.0)", args[0]),
            Decrement if float => format!("({} - 1.0)", args[0]),
            Increment => format!("{}.wrapping_add(1)", args[0]),
            Decrement => format!("{}.wrapping_sub(1)", args[0]),
            And => infix("&"),
            Or => infix("|"),
            ExclusiveOr => infix("^"),
            LeftShift => format!("{}.wrapping_shl({} as u32)", args[0], args[1]),
            RightShift => format!("{}.wrapping_shr({} as u32)", args[0], args[1]),
            OnesComplement | Not | IsFalse => format!("(!{})", args[0]),
            AndAlso => infix("&&"),
            OrElse => infix("||"),
            Equal => infix("=="),
            NotEqual => infix("!="),
            LessThan => infix("<"),
            LessThanOrEqual => infix("<="),
            GreaterThan => infix(">"),
            GreaterThanOrEqual => infix(">="),
            // operands are never placeholders, so the left one always wins
            Coalesce => format!("{{ let _ = || {}; {} }}", args[1], args[0]),
            Conditional => format!("if {} {{ {} }} else {{ {} }}", args[0], args[1], args[2]),
            Block => format!("{{ let _ = {}; {} }}", args[0], args[1]),
            Loop => format!(
                "{{ let mut n = 0; while {} {{ let _ = {}; n += 1; if n > {} {{ panic!(\"loop limit\") }} }} }}",
                args[0], args[1], DEFAULT_LOOP_CAP
            ),
            kind => {
                return Err(SynthError::emit(format!(
                    "`{}` has no Rust rendering",
                    kind
                )))
            }
        };
        Ok(src)
    }
}

impl Backend for RustSource {
    type Artifact = String;

    fn emit(&mut self, term: &Term, signature: &Signature) -> SynthResult<String> {
        signature.check(term)?;
        self.structs.clear();

        let body = self.expr(term)?;
        let mut src = map_join(&self.structs, "\n", |(ty, fields)| {
            format!(
                "#[derive(Clone, Debug, PartialEq)]\npub struct {}({});\n",
                ty,
                map_join(fields, ", ", |f| format!("pub {}", f))
            )
        });
        if !src.is_empty() {
            src.push('\n');
        }

        src.push_str(&format!(
            "pub fn generated() -> {} {{\n{}\n}}\n",
            rust_ty(&signature.ret),
            indent_lines(body, 4)
        ));
        Ok(src)
    }
}

#[cfg(test)]
mod source_tests {
    use super::RustSource;
    use crate::{
        emit::{Backend, Signature},
        errors::SynthErrorKind,
        term::{NodeKind, Term, Value},
        ty::Ty,
    };

    fn emit(term: &Term) -> Result<String, SynthErrorKind> {
        let sig = Signature::returning(term.ty.clone());
        RustSource::new().emit(term, &sig).map_err(|err| err.kind)
    }

    #[test]
    fn test_render_arithmetic() {
        let add = Term::node(
            NodeKind::AddChecked,
            Ty::int(),
            vec![Term::leaf(Value::Int(1)), Term::leaf(Value::Int(2))],
        );
        assert_eq!(
            emit(&add),
            Ok(str!(
                "pub fn generated() -> i32 {\n    1i32.checked_add(2i32).expect(\"arithmetic overflow\")\n}\n"
            ))
        );

        let div = Term::node(
            NodeKind::Divide,
            Ty::float(),
            vec![Term::leaf(Value::Float(1.0)), Term::leaf(Value::Float(0.5))],
        );
        assert!(emit(&div).unwrap().contains("(1.0f64 / 0.5f64)"));

        let neg = Term::node(NodeKind::Negate, Ty::long(), vec![Term::leaf(Value::Long(-3))]);
        assert!(emit(&neg).unwrap().contains("(-3i64).wrapping_neg()"));
    }

    #[test]
    fn test_render_objects() {
        let p = Value::object("Point", vec![Value::Int(1), Value::Int(2)]);
        let eq = Term::node(
            NodeKind::Equal,
            Ty::bool(),
            vec![Term::leaf(p.clone()), Term::leaf(p)],
        );
        let src = emit(&eq).unwrap();
        assert!(src.starts_with("#[derive(Clone, Debug, PartialEq)]\npub struct Point(pub i32, pub i32);\n"));
        assert!(src.contains("(Point(1i32, 2i32) == Point(1i32, 2i32))"));
    }

    #[test]
    fn test_render_conditional() {
        let cond = Term::node(
            NodeKind::Conditional,
            Ty::string(),
            vec![
                Term::leaf(Value::Bool(true)),
                Term::leaf(Value::Str(str!("a"))),
                Term::leaf(Value::Str(str!("b"))),
            ],
        );
        assert!(emit(&cond)
            .unwrap()
            .contains("if true { String::from(\"a\") } else { String::from(\"b\") }"));
    }

    #[test]
    fn test_assign_cannot_be_rendered() {
        let assign = Term::node(
            NodeKind::Assign,
            Ty::int(),
            vec![Term::leaf(Value::Int(1)), Term::leaf(Value::Int(2))],
        );
        assert_eq!(emit(&assign), Err(SynthErrorKind::Emit));
    }
}
