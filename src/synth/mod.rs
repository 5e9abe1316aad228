mod builder;
mod conditions;
mod context;
mod creator;
mod rules;
mod sampler;
mod values;

pub use builder::TermBuilder;
pub use conditions::CreationConditions;
pub use context::CreationContext;
pub use creator::{ChildBuilder, LeafPolicy, TermSynthesizer};
pub use rules::result_ty;
pub use sampler::Sampler;
pub use values::{ValueSource, ValueSynthesizer};
