use crate::{
    errors::SynthError,
    registry::{Introspect, Module, Operation},
    term::Value,
    ty::Ty,
};

const MAX_REPEAT: i32 = 8;

pub struct IntHost;

impl Introspect for IntHost {
    fn ty(&self) -> Ty {
        Ty::int()
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::integral(), Ty::comparable(), Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        let int = Ty::int;
        vec![
            Operation::constant("int::zero", Value::Int(0)),
            Operation::constant("int::one", Value::Int(1)),
            Operation::constant("int::seven", Value::Int(7)),
            Operation::constant("int::max", Value::Int(i32::MAX)),
            Operation::new("int::add", vec![int(), int()], int(), |args| {
                Ok(Value::Int(args[0].as_int()?.wrapping_add(args[1].as_int()?)))
            }),
            Operation::new("int::mul", vec![int(), int()], int(), |args| {
                Ok(Value::Int(args[0].as_int()?.wrapping_mul(args[1].as_int()?)))
            }),
            Operation::new("int::len", vec![Ty::string()], int(), |args| {
                Ok(Value::Int(args[0].as_str()?.chars().count() as i32))
            }),
            Operation::instance("int::abs", vec![], int(), |args| {
                Ok(Value::Int(args[0].as_int()?.wrapping_abs()))
            }),
        ]
    }
}

pub struct LongHost;

impl Introspect for LongHost {
    fn ty(&self) -> Ty {
        Ty::long()
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::integral(), Ty::comparable(), Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        vec![
            Operation::constant("long::zero", Value::Long(0)),
            Operation::constant("long::million", Value::Long(1_000_000)),
            Operation::new("long::widen", vec![Ty::int()], Ty::long(), |args| {
                Ok(Value::Long(i64::from(args[0].as_int()?)))
            }),
            Operation::instance("long::to_string", vec![], Ty::string(), |args| {
                Ok(Value::Str(args[0].as_long()?.to_string()))
            }),
        ]
    }
}

pub struct FloatHost;

impl Introspect for FloatHost {
    fn ty(&self) -> Ty {
        Ty::float()
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::numeric(), Ty::comparable(), Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        let float = Ty::float;
        vec![
            Operation::constant("float::zero", Value::Float(0.0)),
            Operation::constant("float::half", Value::Float(0.5)),
            Operation::constant("float::pi", Value::Float(std::f64::consts::PI)),
            Operation::new("float::from_int", vec![Ty::int()], float(), |args| {
                Ok(Value::Float(f64::from(args[0].as_int()?)))
            }),
            Operation::new("float::sqrt", vec![float()], float(), |args| {
                let x = args[0].as_float()?;
                if x < 0.0 {
                    return Err(SynthError::fault(format!("square root of {}", x)));
                }
                Ok(Value::Float(x.sqrt()))
            }),
            Operation::instance("float::floor", vec![], float(), |args| {
                Ok(Value::Float(args[0].as_float()?.floor()))
            }),
        ]
    }
}

pub struct BoolHost;

impl Introspect for BoolHost {
    fn ty(&self) -> Ty {
        Ty::bool()
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        vec![
            Operation::constant("bool::true", Value::Bool(true)),
            Operation::constant("bool::false", Value::Bool(false)),
            Operation::new("bool::is_even", vec![Ty::int()], Ty::bool(), |args| {
                Ok(Value::Bool(args[0].as_int()? % 2 == 0))
            }),
            Operation::instance("bool::not", vec![], Ty::bool(), |args| {
                Ok(Value::Bool(!args[0].as_bool()?))
            }),
        ]
    }
}

pub struct StrHost;

impl Introspect for StrHost {
    fn ty(&self) -> Ty {
        Ty::string()
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::comparable(), Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        let string = Ty::string;
        vec![
            Operation::constant("string::empty", Value::Str(String::new())),
            Operation::constant("string::hello", Value::Str(str!("hello"))),
            Operation::new("string::concat", vec![string(), string()], string(), |args| {
                Ok(Value::Str(args[0].as_str()? + &args[1].as_str()?))
            }),
            Operation::new("string::repeat", vec![string(), Ty::int()], string(), |args| {
                let count = args[1].as_int()?;
                if count < 0 || count > MAX_REPEAT {
                    return Err(SynthError::fault(format!("cannot repeat {} times", count)));
                }
                Ok(Value::Str(args[0].as_str()?.repeat(count as usize)))
            }),
            Operation::instance("string::len", vec![], Ty::int(), |args| {
                Ok(Value::Int(args[0].as_str()?.len() as i32))
            }),
        ]
    }
}

pub struct UnitHost;

impl Introspect for UnitHost {
    fn ty(&self) -> Ty {
        Ty::unit()
    }

    fn describe_operations(&self) -> Vec<Operation> {
        vec![
            Operation::constant("unit::unit", Value::Unit),
            Operation::instance("unit::to_string", vec![], Ty::string(), |_| {
                Ok(Value::Str(str!("()")))
            }),
        ]
    }
}

/// A user-declared host type: a point on the integer grid.
pub struct PointHost;

impl Introspect for PointHost {
    fn ty(&self) -> Ty {
        Ty::con("Point")
    }

    fn supertypes(&self) -> Vec<Ty> {
        vec![Ty::equatable()]
    }

    fn describe_operations(&self) -> Vec<Operation> {
        vec![
            Operation::constant(
                "Point::origin",
                Value::object("Point", vec![Value::Int(0), Value::Int(0)]),
            ),
            Operation::new("Point::new", vec![Ty::int(), Ty::int()], self.ty(), |args| {
                Ok(Value::object("Point", args.to_vec()))
            }),
            Operation::instance("Point::x", vec![], Ty::int(), |args| match &args[0] {
                Value::Object { fields, .. } if !fields.is_empty() => {
                    fields[0].as_int().map(Value::Int)
                }
                other => Err(SynthError::fault(format!("`{}` is not a point", other))),
            }),
        ]
    }
}

/// Every built-in host type.
pub fn module() -> Module {
    Module::new("std")
        .with_type(IntHost)
        .with_type(LongHost)
        .with_type(FloatHost)
        .with_type(BoolHost)
        .with_type(StrHost)
        .with_type(UnitHost)
        .with_type(PointHost)
}
