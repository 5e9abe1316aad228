use crate::{
    errors::{SynthError, SynthErrorKind, SynthResult},
    term::{NodeKind, Slot, Term},
};

use super::{rules, CreationConditions, CreationContext, ValueSource};

/// Builds the children of a composite node.
pub trait ChildBuilder {
    fn build_child(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term>;
}

/// What a leaf becomes when no value of its type can be created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LeafPolicy {
    /// The placeholder `nil` leaf.
    Placeholder,
    /// A synthesis failure, so that another kind gets sampled.
    Resample,
}

impl Default for LeafPolicy {
    fn default() -> Self {
        LeafPolicy::Placeholder
    }
}

/// Builds a single node of a given kind.
pub struct TermSynthesizer {
    values: Box<dyn ValueSource>,
    leaf_policy: LeafPolicy,
}

impl TermSynthesizer {
    pub fn new<V: ValueSource + 'static>(values: V) -> TermSynthesizer {
        TermSynthesizer {
            values: Box::new(values),
            leaf_policy: LeafPolicy::default(),
        }
    }

    pub fn with_leaf_policy(mut self, leaf_policy: LeafPolicy) -> TermSynthesizer {
        self.leaf_policy = leaf_policy;
        self
    }

    pub fn leaf_policy(&self) -> LeafPolicy {
        self.leaf_policy
    }

    pub fn values(&self) -> &dyn ValueSource {
        self.values.as_ref()
    }

    /// Builds a node of `kind`, or a leaf once the depth budget is spent.
    /// Recoverable failures come back as a synthesis error for the kind that
    /// was attempted.
    pub fn create(
        &self,
        kind: NodeKind,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
        builder: &dyn ChildBuilder,
    ) -> SynthResult<Term> {
        let kind = if ctx.current_depth >= conditions.max_depth {
            NodeKind::Constant
        } else {
            kind
        };
        ctx.current_depth += 1;

        log::trace!(
            "[synth] {} at depth {} ({})",
            kind,
            ctx.current_depth - 1,
            conditions
        );

        if !kind.is_supported() {
            return Err(SynthError::synthesis(
                kind,
                format!("node kind `{}` is not supported", kind),
            ));
        }

        let result = if kind.is_leaf() {
            self.create_leaf(conditions, ctx)
        } else {
            self.create_composite(kind, conditions, ctx, builder)
        };

        result.map_err(|err| {
            let raised_here = err.kind == SynthErrorKind::Synthesis(kind) && err.cause.is_none();
            if raised_here || !err.is_recoverable() {
                err
            } else {
                SynthError::synthesis_caused_by(kind, err)
            }
        })
    }

    fn create_leaf(
        &self,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
    ) -> SynthResult<Term> {
        if self.values.can_create(conditions, ctx) {
            let value = self.values.create_value(conditions, ctx)?;
            return Ok(Term::leaf(value));
        }

        match self.leaf_policy {
            LeafPolicy::Placeholder => Ok(Term::placeholder()),
            LeafPolicy::Resample => {
                let msg = match &ctx.requested_return_type {
                    Some(ty) => format!("no value of type `{}` can be created", ty),
                    None => str!("no type was requested for the leaf"),
                };
                Err(SynthError::synthesis(NodeKind::Constant, msg))
            }
        }
    }

    fn create_composite(
        &self,
        kind: NodeKind,
        conditions: &CreationConditions,
        ctx: &mut CreationContext,
        builder: &dyn ChildBuilder,
    ) -> SynthResult<Term> {
        let shape = kind.shape();
        ctx.evaluated_sibling_types.clear();

        let mut children = Vec::with_capacity(shape.len());
        for slot in shape.iter() {
            let anchor = Slot::anchor(&shape, &ctx.evaluated_sibling_types);
            let ty = slot
                .requested_ty(ctx.requested_return_type.as_ref(), anchor, |actual, requested| {
                    self.values.is_assignable(actual, requested)
                })
                .or_else(|| self.values.pick_type(kind.operand_caps()));

            let mut branch = ctx.branch(ty);
            let child = builder.build_child(conditions, &mut branch);
            ctx.absorb_diagnostics(branch);

            let child = child?;
            ctx.evaluated_sibling_types.push(child.ty.clone());
            children.push(child);
        }

        let ty = rules::result_ty(kind, &children.iter().map(|c| &c.ty).collect::<Vec<_>>())?;
        if let Some(requested) = &ctx.requested_return_type {
            if !self.values.is_assignable(&ty, requested) {
                return Err(SynthError::synthesis(
                    kind,
                    format!("`{}` is not assignable to `{}`", ty, requested),
                ));
            }
        }

        Ok(Term::node(kind, ty, children))
    }
}
