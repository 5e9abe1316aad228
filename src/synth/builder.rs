use fnv::FnvHashSet;

use crate::{
    errors::{SynthError, SynthErrorKind, SynthResult},
    term::{NodeKind, Term},
};

use super::{ChildBuilder, CreationConditions, CreationContext, Sampler, TermSynthesizer};

/// Grows terms by repeatedly sampling node kinds, retrying with a different
/// kind whenever one fails. Also builds the children of every composite.
pub struct TermBuilder {
    conditions: CreationConditions,
    sampler: Sampler,
    synthesizer: TermSynthesizer,
}

impl TermBuilder {
    pub fn new(
        conditions: CreationConditions,
        sampler: Sampler,
        synthesizer: TermSynthesizer,
    ) -> TermBuilder {
        TermBuilder {
            conditions,
            sampler,
            synthesizer,
        }
    }

    pub fn conditions(&self) -> &CreationConditions {
        &self.conditions
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }

    pub fn synthesizer(&self) -> &TermSynthesizer {
        &self.synthesizer
    }

    /// Builds a term. With an explicit `kind`, only that kind is attempted.
    pub fn build(
        &self,
        kind: Option<NodeKind>,
        conditions: Option<&CreationConditions>,
    ) -> SynthResult<Term> {
        self.build_in(kind, conditions, &mut CreationContext::new())
    }

    /// Like `build`, on a context owned by the caller. Failed attempts end up
    /// in its diagnostic trail.
    pub fn build_in(
        &self,
        kind: Option<NodeKind>,
        conditions: Option<&CreationConditions>,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term> {
        let effective = self.effective(conditions);
        if ctx.requested_return_type.is_none() {
            ctx.requested_return_type = effective.requested_ty.clone();
        }

        match kind {
            Some(kind) => self.attempt(kind, &effective, ctx),
            None => self.sample_until_built(&effective, ctx),
        }
    }

    fn effective(&self, conditions: Option<&CreationConditions>) -> CreationConditions {
        match conditions {
            Some(conditions) => CreationConditions::strictest_union(&self.conditions, conditions),
            None => self.conditions.clone(),
        }
    }

    /// Runs one attempt on a copy of `ctx` so a failure leaves it untouched
    /// apart from the diagnostics.
    fn attempt(
        &self,
        kind: NodeKind,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term> {
        let mut attempt = ctx.branch(ctx.requested_return_type.clone());
        let result = self.synthesizer.create(kind, conditions, &mut attempt, self);
        ctx.absorb_diagnostics(attempt);
        result
    }

    fn sample_until_built(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term> {
        let mut failed = FnvHashSet::default();
        let mut last_err = None;

        loop {
            let kind = match self.sampler.sample_excluding(&failed) {
                Some(kind) => kind,
                None => return Err(exhausted(ctx, last_err)),
            };

            match self.attempt(kind, conditions, ctx) {
                Ok(term) => return Ok(term),
                Err(err) if err.is_recoverable() => {
                    log::debug!("[builder] {} failed, resampling: {}", kind, err);
                    ctx.record(err.clone());

                    // every kind becomes a leaf here, so resampling cannot help
                    if ctx.current_depth >= conditions.max_depth {
                        return Err(err);
                    }

                    failed.insert(kind);
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn exhausted(ctx: &CreationContext, last_err: Option<SynthError>) -> SynthError {
    let last_err = match last_err {
        Some(err) => err,
        None => return SynthError::fatal("cannot sample a node kind: every weight is zero"),
    };

    let kind = match last_err.kind {
        SynthErrorKind::Synthesis(kind) => kind,
        _ => NodeKind::Constant,
    };
    let target = match &ctx.requested_return_type {
        Some(ty) => format!("a term of type `{}`", ty),
        None => str!("an untyped term"),
    };

    SynthError {
        msg: format!("node kinds exhausted: no kind could produce {}", target),
        kind: SynthErrorKind::Synthesis(kind),
        cause: Some(Box::new(last_err)),
    }
}

/// Children take their type from their slot alone. An open slot stays open
/// rather than inheriting the root's type.
impl ChildBuilder for TermBuilder {
    fn build_child(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term> {
        let effective = self.effective(Some(conditions));
        self.sample_until_built(&effective, ctx)
    }
}

#[cfg(test)]
mod builder_tests {
    use std::rc::Rc;

    use fnv::FnvHashSet;

    use super::TermBuilder;
    use crate::{
        errors::{SynthError, SynthErrorKind, SynthResult},
        registry::Registry,
        stdlib,
        synth::{
            CreationConditions, CreationContext, LeafPolicy, Sampler, TermSynthesizer,
            ValueSource, ValueSynthesizer,
        },
        term::{NodeKind, Term, Value},
        ty::Ty,
    };

    const ORDERINGS: [NodeKind; 4] = [
        NodeKind::LessThan,
        NodeKind::LessThanOrEqual,
        NodeKind::GreaterThan,
        NodeKind::GreaterThanOrEqual,
    ];

    /// Answers int, float and string requests. Operands after the first get
    /// the value 2, the first one gets 1.
    struct Mock;

    impl ValueSource for Mock {
        fn can_create(&self, _: &CreationConditions, ctx: &CreationContext) -> bool {
            match &ctx.requested_return_type {
                Some(ty) => [Ty::int(), Ty::float(), Ty::string()].contains(ty),
                None => false,
            }
        }

        fn create_value(
            &self,
            _: &CreationConditions,
            ctx: &mut CreationContext,
        ) -> SynthResult<Value> {
            let n = if ctx.evaluated_sibling_types.is_empty() { 1 } else { 2 };
            match &ctx.requested_return_type {
                Some(ty) if ty == &Ty::int() => Ok(Value::Int(n)),
                Some(ty) if ty == &Ty::float() => Ok(Value::Float(n as f64)),
                Some(ty) if ty == &Ty::string() => Ok(Value::Str(n.to_string())),
                other => Err(SynthError::object_creation(other.as_ref())),
            }
        }
    }

    fn builder(conditions: CreationConditions) -> TermBuilder {
        TermBuilder::new(conditions, Sampler::seeded(99), TermSynthesizer::new(Mock))
    }

    fn std_builder(seed: u64, conditions: CreationConditions) -> TermBuilder {
        let mut registry = Registry::seeded(seed);
        registry.register_module(&stdlib::module()).unwrap();
        TermBuilder::new(
            conditions,
            Sampler::seeded(seed),
            TermSynthesizer::new(ValueSynthesizer::new(Rc::new(registry))),
        )
    }

    fn collect_kinds(term: &Term, kinds: &mut FnvHashSet<NodeKind>) {
        kinds.insert(term.kind);
        for child in term.children() {
            collect_kinds(child, kinds);
        }
    }

    #[test]
    fn test_depth_one_yields_constant() {
        let builder = builder(CreationConditions::with_ty(1, Ty::int()));
        for _ in 0..50 {
            let term = builder.build(None, None).unwrap();
            assert_eq!(term.kind, NodeKind::Constant);
            assert_eq!(term.value(), Some(&Value::Int(1)));
        }

        let term = builder.build(Some(NodeKind::Conditional), None).unwrap();
        assert!(term.is_leaf());
    }

    #[test]
    fn test_build_add() {
        let builder = builder(CreationConditions::with_ty(2, Ty::int()));
        let term = builder.build(Some(NodeKind::Add), None).unwrap();
        assert_eq!(term.to_string(), "(add 1 2)");
        assert_eq!(term.ty, Ty::int());
    }

    #[test]
    fn test_build_subtract_float() {
        let builder = builder(CreationConditions::new(2, None));
        let conditions = CreationConditions::with_ty(10, Ty::float());
        let term = builder
            .build(Some(NodeKind::Subtract), Some(&conditions))
            .unwrap();
        assert_eq!(term.to_string(), "(subtract 1.0 2.0)");
        assert_eq!(term.ty, Ty::float());
    }

    #[test]
    fn test_builder_type_wins() {
        let builder = builder(CreationConditions::with_ty(1, Ty::float()));
        let conditions = CreationConditions::with_ty(5, Ty::string());
        let term = builder.build(None, Some(&conditions)).unwrap();
        assert_eq!(term.ty, Ty::float());
        assert_eq!(term.value(), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_terms_respect_depth_and_type() {
        let builder = builder(CreationConditions::with_ty(4, Ty::int()));
        for _ in 0..100 {
            let term = builder.build(None, None).unwrap();
            assert!(term.depth() <= 4, "{} is too deep", term);
            assert!(term.ty == Ty::int() || term.is_placeholder(), "{} is mistyped", term);
        }
    }

    #[test]
    fn test_failed_kinds_are_recorded() {
        let mut builder = builder(CreationConditions::with_ty(3, Ty::int()));
        for kind in NodeKind::ALL {
            builder.sampler_mut().set_weight(*kind, 0.0).unwrap();
        }
        builder.sampler_mut().set_weight(NodeKind::Assign, 1.0).unwrap();
        builder.sampler_mut().set_weight(NodeKind::Constant, 1.0).unwrap();

        let mut ctx = CreationContext::new();
        for _ in 0..20 {
            let term = builder.build_in(None, None, &mut ctx).unwrap();
            assert_eq!(term.value(), Some(&Value::Int(1)));
        }
        assert!(ctx
            .diagnostic_trail
            .iter()
            .all(|err| err.kind == SynthErrorKind::Synthesis(NodeKind::Assign)));
    }

    #[test]
    fn test_exhaustion_fails() {
        let mut builder = TermBuilder::new(
            CreationConditions::with_ty(3, Ty::bool()),
            Sampler::seeded(5),
            TermSynthesizer::new(Mock).with_leaf_policy(LeafPolicy::Resample),
        );
        for kind in NodeKind::ALL {
            builder.sampler_mut().set_weight(*kind, 0.0).unwrap();
        }
        builder.sampler_mut().set_weight(NodeKind::Constant, 1.0).unwrap();
        builder.sampler_mut().set_weight(NodeKind::Not, 1.0).unwrap();

        let mut ctx = CreationContext::new();
        let err = builder.build_in(None, None, &mut ctx).unwrap_err();
        assert!(err.msg.contains("exhausted"), "{}", err);
        assert!(err.is_recoverable());
        assert!(ctx.diagnostic_trail.len() >= 2);
    }

    #[test]
    fn test_explicit_unsupported_kind_fails() {
        let builder = builder(CreationConditions::with_ty(3, Ty::int()));
        let err = builder.build(Some(NodeKind::Goto), None).unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::Synthesis(NodeKind::Goto));
    }

    #[test]
    fn test_zero_weights_are_fatal() {
        let mut builder = builder(CreationConditions::with_ty(3, Ty::int()));
        for kind in NodeKind::ALL {
            builder.sampler_mut().set_weight(*kind, 0.0).unwrap();
        }
        let err = builder.build(None, None).unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::Fatal);
    }

    #[test]
    fn test_comparisons_over_std_types() {
        let equalities = [NodeKind::Equal, NodeKind::NotEqual];
        for kind in ORDERINGS.iter().chain(equalities.iter()) {
            let mut operand_tys = FnvHashSet::default();
            for seed in 0..40 {
                let builder = std_builder(seed, CreationConditions::with_ty(2, Ty::bool()));
                let term = builder.build(Some(*kind), None).unwrap();
                assert_eq!(term.kind, *kind);
                assert_eq!(term.ty, Ty::bool());

                let children = term.children();
                assert_eq!(children[0].ty, children[1].ty, "{}", term);
                assert!(!children[0].is_placeholder(), "{}", term);
                if ORDERINGS.contains(kind) {
                    assert!(children[0].ty.is_ordered(), "{}", term);
                }
                operand_tys.insert(children[0].ty.clone());
            }
            assert!(
                operand_tys.iter().any(|ty| ty != &Ty::bool()),
                "{} only compared {:?}",
                kind,
                operand_tys
            );
        }
    }

    #[test]
    fn test_sampled_bool_terms_include_orderings() {
        let builder = std_builder(7, CreationConditions::with_ty(3, Ty::bool()));
        let mut kinds = FnvHashSet::default();
        for _ in 0..300 {
            let term = builder.build(None, None).unwrap();
            assert_eq!(term.ty, Ty::bool(), "{}", term);
            collect_kinds(&term, &mut kinds);
        }
        assert!(ORDERINGS.iter().any(|kind| kinds.contains(kind)));
    }

    #[test]
    fn test_interface_request_keeps_operands_agreeing() {
        for seed in 0..50 {
            let builder = std_builder(seed, CreationConditions::with_ty(2, Ty::numeric()));
            let term = builder.build(Some(NodeKind::Add), None).unwrap();
            let children = term.children();
            assert_eq!(children[0].ty, children[1].ty, "{}", term);
            assert!(term.ty.is_numeric(), "{}", term);
        }
    }

    #[test]
    fn test_loop_bodies_are_not_forced_to_bool() {
        let mut body_tys = FnvHashSet::default();
        for seed in 0..40 {
            let builder = std_builder(seed, CreationConditions::with_ty(2, Ty::unit()));
            let term = builder.build(Some(NodeKind::Loop), None).unwrap();
            assert_eq!(term.ty, Ty::unit());
            body_tys.insert(term.children()[1].ty.clone());
        }
        assert!(body_tys.len() > 1, "{:?}", body_tys);
    }
}
