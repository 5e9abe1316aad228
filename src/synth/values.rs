use std::rc::Rc;

use crate::{
    errors::{SynthError, SynthResult},
    registry::{Operation, Registry},
    term::Value,
    ty::{Ty, TyCaps},
};

use super::{CreationConditions, CreationContext};

/// Produces the value of a leaf term.
pub trait ValueSource {
    /// Whether a value of the context's requested type can be attempted.
    fn can_create(&self, conditions: &CreationConditions, ctx: &CreationContext) -> bool;

    fn create_value(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Value>;

    fn is_assignable(&self, actual: &Ty, requested: &Ty) -> bool {
        actual == requested
    }

    /// A type to request for an operand whose type is left open, offering
    /// one of `caps`.
    fn pick_type(&self, _caps: TyCaps) -> Option<Ty> {
        None
    }
}

/// Resolves values by invoking the operations of a `Registry`, recursing
/// into their parameters.
pub struct ValueSynthesizer {
    registry: Rc<Registry>,
}

impl ValueSynthesizer {
    pub fn new(registry: Rc<Registry>) -> ValueSynthesizer {
        ValueSynthesizer { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn is_callable(&self, op: &Operation, conditions: &CreationConditions, ctx: &CreationContext) -> bool {
        op.params().is_empty()
            || (conditions.max_depth > ctx.current_depth
                && op.params().iter().all(|p| self.registry.has_type(p)))
    }

    fn call(
        &self,
        op: &Operation,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Value> {
        let mut args = Vec::with_capacity(op.params().len());
        for param in op.params() {
            let mut branch = ctx.branch(Some(param.clone()));
            branch.current_depth += 1;
            let arg = self.create_value(conditions, &mut branch);
            ctx.absorb_diagnostics(branch);
            args.push(arg?);
        }

        op.invoke(&args)
    }
}

impl ValueSource for ValueSynthesizer {
    fn can_create(&self, _: &CreationConditions, ctx: &CreationContext) -> bool {
        match &ctx.requested_return_type {
            Some(ty) => self.registry.has_type(ty),
            None => false,
        }
    }

    fn create_value(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Value> {
        let ty = match &ctx.requested_return_type {
            Some(ty) if self.registry.has_type(ty) => ty.clone(),
            other => return Err(SynthError::object_creation(other.as_ref())),
        };

        for op in self.registry.query_operations(&ty) {
            if !self.is_callable(&op, conditions, ctx) {
                continue;
            }

            match self.call(&op, conditions, ctx) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() => {
                    log::debug!("[values] `{}` failed: {}", op, err);
                    ctx.record(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(SynthError::object_creation(Some(&ty)))
    }

    fn is_assignable(&self, actual: &Ty, requested: &Ty) -> bool {
        self.registry.is_assignable(actual, requested)
    }

    fn pick_type(&self, caps: TyCaps) -> Option<Ty> {
        self.registry.pick_type(caps)
    }
}

#[cfg(test)]
mod values_tests {
    use std::{cell::Cell, rc::Rc};

    use super::{ValueSource, ValueSynthesizer};
    use crate::{
        errors::{SynthError, SynthErrorKind},
        registry::{Operation, RegistrationOrder, Registry},
        synth::{CreationConditions, CreationContext},
        term::Value,
        ty::{Ty, TyCaps},
    };

    fn request(ty: Ty) -> CreationContext {
        let mut ctx = CreationContext::new();
        ctx.requested_return_type = Some(ty);
        ctx
    }

    fn adder() -> Operation {
        Operation::new("h", vec![Ty::int(), Ty::int()], Ty::int(), |args| {
            Ok(Value::Int(args[0].as_int()? + args[1].as_int()?))
        })
    }

    #[test]
    fn test_values_with_parameters() {
        let mut registry = Registry::seeded(0).with_order(RegistrationOrder);
        registry.register_operation(adder()).unwrap();
        registry
            .register_operation(Operation::constant("f", Value::Int(1)))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let create = |depth| {
            let conditions = CreationConditions::new(depth, None);
            values.create_value(&conditions, &mut request(Ty::int()))
        };
        assert_eq!(create(1), Ok(Value::Int(1)));
        assert_eq!(create(2), Ok(Value::Int(2)));
        assert_eq!(create(3), Ok(Value::Int(4)));
    }

    #[test]
    fn test_parameters_resolve_with_the_only_constant() {
        let mut registry = Registry::seeded(5);
        registry.register_operation(adder()).unwrap();
        registry
            .register_operation(Operation::constant("f", Value::Int(1)))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let conditions = CreationConditions::new(2, None);
        for _ in 0..20 {
            let value = values.create_value(&conditions, &mut request(Ty::int()));
            assert!(value == Ok(Value::Int(1)) || value == Ok(Value::Int(2)));
        }
    }

    #[test]
    fn test_recovers_from_faulting_operation() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let mut registry = Registry::seeded(0).with_order(RegistrationOrder);
        registry
            .register_operation(Operation::new("k", vec![], Ty::long(), move |_| {
                counter.set(counter.get() + 1);
                Err(SynthError::fault("k always fails"))
            }))
            .unwrap();
        registry
            .register_operation(Operation::constant("m", Value::Long(10)))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let mut ctx = request(Ty::long());
        let value = values.create_value(&CreationConditions::none(), &mut ctx);
        assert_eq!(value, Ok(Value::Long(10)));
        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.diagnostic_trail.len(), 1);
        assert_eq!(ctx.diagnostic_trail[0].kind, SynthErrorKind::Operation);
    }

    #[test]
    fn test_fatal_errors_propagate() {
        let mut registry = Registry::seeded(0).with_order(RegistrationOrder);
        registry
            .register_operation(Operation::new("bad", vec![], Ty::int(), |_| {
                Err(SynthError::fatal("broken"))
            }))
            .unwrap();
        registry
            .register_operation(Operation::constant("f", Value::Int(1)))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let err = values
            .create_value(&CreationConditions::none(), &mut request(Ty::int()))
            .unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::Fatal);
    }

    #[test]
    fn test_no_registered_types() {
        let values = ValueSynthesizer::new(Rc::new(Registry::seeded(0)));
        let mut ctx = request(Ty::int());
        assert!(!values.can_create(&CreationConditions::none(), &ctx));

        let err = values
            .create_value(&CreationConditions::none(), &mut ctx)
            .unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::ObjectCreation(Some(Ty::int())));

        let err = values
            .create_value(&CreationConditions::none(), &mut CreationContext::new())
            .unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::ObjectCreation(None));
    }

    #[test]
    fn test_insufficient_types() {
        let mut registry = Registry::seeded(0);
        registry
            .register_operation(Operation::new("wrap", vec![Ty::string()], Ty::int(), |_| {
                Ok(Value::Int(0))
            }))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let err = values
            .create_value(&CreationConditions::new(5, None), &mut request(Ty::int()))
            .unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::ObjectCreation(Some(Ty::int())));
    }

    #[test]
    fn test_nested_diagnostics_are_merged() {
        let mut registry = Registry::seeded(0).with_order(RegistrationOrder);
        registry
            .register_operation(Operation::new("neg", vec![Ty::long()], Ty::int(), |args| {
                Ok(Value::Int(-(args[0].as_long()? as i32)))
            }))
            .unwrap();
        registry
            .register_operation(Operation::new("k", vec![], Ty::long(), |_| {
                Err(SynthError::fault("no long today"))
            }))
            .unwrap();
        registry
            .register_operation(Operation::constant("seven", Value::Long(7)))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));

        let mut ctx = request(Ty::int());
        let value = values.create_value(&CreationConditions::new(3, None), &mut ctx);
        assert_eq!(value, Ok(Value::Int(-7)));
        assert_eq!(ctx.diagnostic_trail.len(), 1);
        assert_eq!(ctx.diagnostic_trail[0].msg, "no long today");
    }

    #[test]
    fn test_assignability_follows_hierarchy() {
        let values = ValueSynthesizer::new(Rc::new(Registry::seeded(0)));
        assert!(values.is_assignable(&Ty::int(), &Ty::numeric()));
        assert!(!values.is_assignable(&Ty::numeric(), &Ty::int()));
    }

    #[test]
    fn test_open_operand_types_come_from_registry() {
        let mut registry = Registry::seeded(0);
        registry
            .register_operation(Operation::constant("hello", Value::Str(str!("hello"))))
            .unwrap();
        let values = ValueSynthesizer::new(Rc::new(registry));
        assert_eq!(values.pick_type(TyCaps::ORDERED), Some(Ty::string()));
        assert_eq!(values.pick_type(TyCaps::NUMERIC), None);
    }
}
