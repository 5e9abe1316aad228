use std::fmt;

use crate::{
    errors::{SynthError, SynthResult},
    synth::{CreationConditions, TermBuilder},
    term::Term,
    ty::Ty,
};

mod interp;
mod source;

pub use interp::{Interpreter, Program};
pub use source::RustSource;

/// What a generated program looks like from the outside. Generated programs
/// take no parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub ret: Ty,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "() -> {}", self.ret)
    }
}

impl Signature {
    pub fn returning(ret: Ty) -> Signature {
        Signature { ret }
    }

    pub fn check(&self, term: &Term) -> SynthResult {
        if term.ty != self.ret {
            return Err(SynthError::emit(format!(
                "term of type `{}` does not match signature `{}`",
                term.ty, self
            )));
        }
        Ok(())
    }
}

/// Turns a finished term into something that can be run.
pub trait Backend {
    type Artifact;

    fn emit(&mut self, term: &Term, signature: &Signature) -> SynthResult<Self::Artifact>;
}

pub const DEFAULT_PROGRAM_DEPTH: usize = 3;

/// Synthesizes whole programs for a signature and hands them to a backend.
pub struct ProgramGenerator<'a> {
    builder: &'a TermBuilder,
    depth: usize,
}

impl<'a> ProgramGenerator<'a> {
    pub fn new(builder: &'a TermBuilder) -> ProgramGenerator<'a> {
        ProgramGenerator {
            builder,
            depth: DEFAULT_PROGRAM_DEPTH,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> ProgramGenerator<'a> {
        self.depth = depth;
        self
    }

    pub fn create_program<B: Backend>(
        &self,
        signature: &Signature,
        backend: &mut B,
    ) -> SynthResult<B::Artifact> {
        let conditions = CreationConditions::with_ty(self.depth, signature.ret.clone());
        let term = self.builder.build(None, Some(&conditions))?;
        log::debug!("[emit] generated {} for {}", term, signature);
        backend.emit(&term, signature)
    }
}

#[cfg(test)]
mod emit_tests {
    use std::rc::Rc;

    use super::{Interpreter, ProgramGenerator, RustSource, Signature};
    use crate::{
        errors::SynthErrorKind,
        registry::Registry,
        stdlib,
        synth::{CreationConditions, Sampler, TermBuilder, TermSynthesizer, ValueSynthesizer},
        term::{Term, Value},
        ty::Ty,
    };

    fn builder(seed: u64) -> TermBuilder {
        let mut registry = Registry::seeded(seed);
        registry.register_module(&stdlib::module()).unwrap();
        TermBuilder::new(
            CreationConditions::none(),
            Sampler::seeded(seed),
            TermSynthesizer::new(ValueSynthesizer::new(Rc::new(registry))),
        )
    }

    #[test]
    fn test_signature_check() {
        let sig = Signature::returning(Ty::int());
        assert!(sig.check(&Term::leaf(Value::Int(1))).is_ok());

        let err = sig.check(&Term::placeholder()).unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::Emit);
    }

    #[test]
    fn test_generate_and_run() {
        let builder = builder(3);
        let generator = ProgramGenerator::new(&builder);
        let sig = Signature::returning(Ty::long());

        for _ in 0..20 {
            let program = generator
                .create_program(&sig, &mut Interpreter::default())
                .unwrap();
            assert!(program.term().depth() <= 3);
            match program.run() {
                Ok(value) => assert_eq!(value.ty(), Ty::long()),
                Err(err) => assert_eq!(err.kind, SynthErrorKind::Eval),
            }
        }
    }

    #[test]
    fn test_generate_source() {
        let builder = builder(8);
        let generator = ProgramGenerator::new(&builder).with_depth(2);
        let sig = Signature::returning(Ty::float());

        let src = generator.create_program(&sig, &mut RustSource::new()).unwrap();
        assert!(src.contains("pub fn generated() -> f64 {"), "{}", src);
    }
}
