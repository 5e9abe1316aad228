use std::{path::PathBuf, process, rc::Rc, str::FromStr, time::Instant};

use fnv::FnvHashSet;
use structopt::StructOpt;

use crate::{
    emit::{Backend, Interpreter, RustSource, Signature},
    errors::{SynthError, SynthResult},
    profile::WeightProfile,
    registry::Registry,
    stdlib,
    synth::{
        CreationConditions, CreationContext, LeafPolicy, Sampler, TermBuilder, TermSynthesizer,
        ValueSynthesizer,
    },
    term::{NodeKind, Term},
    ty::Ty,
};

/// How many builds may be spent per requested term when `--unique` rejects
/// duplicates.
const ATTEMPTS_PER_TERM: usize = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmitFormat {
    Sexp,
    Rust,
    Eval,
}

impl FromStr for EmitFormat {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sexp" => Ok(EmitFormat::Sexp),
            "rust" => Ok(EmitFormat::Rust),
            "eval" => Ok(EmitFormat::Eval),
            _ => Err(SynthError::config(format!("unknown output format `{}`", s))),
        }
    }
}

/// A `kind=weight` pair given on the command line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KindWeight(pub NodeKind, pub f64);

impl FromStr for KindWeight {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '=');
        let kind = parts.next().unwrap_or_default().trim().parse::<NodeKind>()?;
        let weight = match parts.next().map(|w| w.trim().parse::<f64>()) {
            Some(Ok(weight)) => weight,
            _ => {
                return Err(SynthError::config(format!(
                    "expected `kind=weight`, found `{}`",
                    s
                )))
            }
        };
        Ok(KindWeight(kind, weight))
    }
}

#[derive(Debug, StructOpt)]
pub struct GenOptions {
    #[structopt(long, short, help = "Maximum depth of a term", default_value = "4")]
    pub depth: usize,

    #[structopt(long, help = "Type of the generated terms", default_value = "int")]
    pub ty: String,

    #[structopt(long, short = "n", help = "Number of terms to generate", default_value = "1")]
    pub count: usize,

    #[structopt(long, help = "Kind of the root node; sampled when omitted")]
    pub kind: Option<NodeKind>,

    #[structopt(
        long = "weight",
        short = "w",
        help = "Sets the weight of a node kind, as `kind=weight`",
        number_of_values = 1
    )]
    pub weights: Vec<KindWeight>,

    #[structopt(
        long,
        help = "Output format",
        default_value = "sexp",
        possible_values = &["sexp", "rust", "eval"]
    )]
    pub emit: EmitFormat,

    #[structopt(long, help = "Skips terms that were already generated")]
    pub unique: bool,

    #[structopt(long, help = "Loads node kind and operation weights from a file")]
    pub profile: Option<PathBuf>,

    #[structopt(long, help = "Saves the weights in effect to a file")]
    pub save_profile: Option<PathBuf>,

    #[structopt(
        long,
        help = "Resamples a node instead of inserting a placeholder when a leaf value cannot be created"
    )]
    pub resample_leaves: bool,
}

/// The registry of built-in host types, and a sampler with the default
/// weights, both adjusted by an optional profile.
pub(super) fn configure(
    seed: u64,
    profile: Option<&PathBuf>,
) -> SynthResult<(Registry, Sampler)> {
    let mut registry = Registry::seeded(seed);
    registry.register_module(&stdlib::module())?;
    let mut sampler = Sampler::seeded(seed.wrapping_add(1));

    if let Some(path) = profile {
        log::info!("loading weight profile {}", path.display());
        WeightProfile::load(path)?.apply(&mut sampler, &mut registry)?;
    }
    Ok((registry, sampler))
}

pub(super) fn action(options: GenOptions, seed: u64) {
    let start_time = Instant::now();
    match generate(&options, seed) {
        Err(err) => {
            err.emit_to_stderr();
            log::error!("generation failed");
            process::exit(1);
        }
        Ok(count) => {
            let elapsed = start_time.elapsed();
            log::info!("generated {} term(s) in {:?}", count, elapsed);
        }
    }
}

fn generate(options: &GenOptions, seed: u64) -> SynthResult<usize> {
    let (registry, mut sampler) = configure(seed, options.profile.as_ref())?;
    for KindWeight(kind, weight) in options.weights.iter() {
        sampler.set_weight(*kind, *weight)?;
    }

    if let Some(path) = &options.save_profile {
        WeightProfile::capture(&sampler, &registry).save(path)?;
        log::info!("saved weight profile to {}", path.display());
    }

    let ty = Ty::con(options.ty.as_str());
    if !registry.has_type(&ty) {
        log::warn!("no registered operation produces `{}`", ty);
    }

    let leaf_policy = if options.resample_leaves {
        LeafPolicy::Resample
    } else {
        LeafPolicy::Placeholder
    };
    let synthesizer = TermSynthesizer::new(ValueSynthesizer::new(Rc::new(registry)))
        .with_leaf_policy(leaf_policy);
    let builder = TermBuilder::new(
        CreationConditions::with_ty(options.depth, ty.clone()),
        sampler,
        synthesizer,
    );
    let signature = Signature::returning(ty);

    let mut seen = FnvHashSet::default();
    let mut produced = 0;
    for _ in 0..options.count.saturating_mul(ATTEMPTS_PER_TERM) {
        if produced == options.count {
            break;
        }

        let mut ctx = CreationContext::new();
        let term = builder.build_in(options.kind, None, &mut ctx)?;
        if options.unique && !seen.insert(term.fingerprint()?) {
            continue;
        }

        log::debug!(
            "built a term of depth {} after {} recoverable failure(s)",
            term.depth(),
            ctx.diagnostic_trail.len()
        );
        print_term(&term, &signature, options.emit)?;
        produced += 1;
    }

    if produced < options.count {
        log::warn!(
            "only {} distinct term(s) could be generated out of {}",
            produced,
            options.count
        );
    }
    Ok(produced)
}

fn print_term(term: &Term, signature: &Signature, format: EmitFormat) -> SynthResult {
    match format {
        EmitFormat::Sexp => println!("{}", term),
        EmitFormat::Rust => println!("{}", RustSource::new().emit(term, signature)?),
        EmitFormat::Eval => {
            let program = Interpreter::default().emit(term, signature)?;
            match program.run() {
                Ok(value) => println!("{} => {}", term, value),
                Err(err) => println!("{} => {}", term, err),
            }
        }
    }
    Ok(())
}
