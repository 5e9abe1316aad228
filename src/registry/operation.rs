use std::{fmt, rc::Rc};

use crate::{
    errors::{SynthError, SynthResult},
    term::Value,
    ty::Ty,
    utils::join,
};

pub type Invoke = Rc<dyn Fn(&[Value]) -> SynthResult<Value>>;

/// Whether an operation needs a bound instance to be called.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    Static,
    Instance,
}

/// A value-producing function: parameter types, a return type and the
/// callable itself.
#[derive(Clone)]
pub struct Operation {
    name: String,
    params: Vec<Ty>,
    ret: Ty,
    receiver: Receiver,
    invoke: Invoke,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("receiver", &self.receiver)
            .finish()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) -> {}", self.name, join(&self.params, ", "), self.ret)
    }
}

impl Operation {
    pub fn new<S, F>(name: S, params: Vec<Ty>, ret: Ty, f: F) -> Operation
    where
        S: Into<String>,
        F: Fn(&[Value]) -> SynthResult<Value> + 'static,
    {
        Operation {
            name: name.into(),
            params,
            ret,
            receiver: Receiver::Static,
            invoke: Rc::new(f),
        }
    }

    /// An operation that needs `self`. The registry never accepts these.
    pub fn instance<S, F>(name: S, params: Vec<Ty>, ret: Ty, f: F) -> Operation
    where
        S: Into<String>,
        F: Fn(&[Value]) -> SynthResult<Value> + 'static,
    {
        Operation {
            receiver: Receiver::Instance,
            ..Operation::new(name, params, ret, f)
        }
    }

    /// A parameterless operation that always yields `value`.
    pub fn constant<S: Into<String>>(name: S, value: Value) -> Operation {
        let ret = value.ty();
        Operation::new(name, vec![], ret, move |_| Ok(value.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Ty] {
        &self.params
    }

    pub fn ret(&self) -> &Ty {
        &self.ret
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    /// Identity used to detect repeated registrations.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Calls the operation. Instance operations take their receiver as the
    /// first argument.
    pub fn invoke(&self, args: &[Value]) -> SynthResult<Value> {
        let expected = match self.receiver {
            Receiver::Static => self.params.len(),
            Receiver::Instance => self.params.len() + 1,
        };
        if args.len() != expected {
            return Err(SynthError::fatal(format!(
                "`{}` expects {} argument(s) but was given {}",
                self,
                expected,
                args.len()
            )));
        }

        (self.invoke)(args)
    }
}

/// The capability of enumerating a host type's operations. Stands in for
/// runtime reflection: each host type describes itself.
pub trait Introspect {
    fn ty(&self) -> Ty;

    /// Direct supertypes and interfaces of the host type.
    fn supertypes(&self) -> Vec<Ty> {
        vec![]
    }

    fn describe_operations(&self) -> Vec<Operation>;
}

/// A named group of host types, registered together.
pub struct Module {
    pub name: String,
    pub types: Vec<Box<dyn Introspect>>,
}

impl Module {
    pub fn new<S: Into<String>>(name: S) -> Module {
        Module {
            name: name.into(),
            types: vec![],
        }
    }

    pub fn with_type<T: Introspect + 'static>(mut self, host: T) -> Module {
        self.types.push(Box::new(host));
        self
    }
}

/// Which members to take from a host and with which weight.
pub struct Criteria<T: ?Sized> {
    pub matches: Box<dyn Fn(&T) -> bool>,
    pub weight: f64,
}

impl<T: ?Sized> Default for Criteria<T> {
    fn default() -> Self {
        Criteria {
            matches: Box::new(|_: &T| true),
            weight: 1.0,
        }
    }
}

impl<T: ?Sized> Criteria<T> {
    pub fn new<F: Fn(&T) -> bool + 'static>(matches: F) -> Criteria<T> {
        Criteria {
            matches: Box::new(matches),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Criteria<T> {
        self.weight = weight;
        self
    }
}
