//! Template synthesis.
//!
//! A [`Stack`](crate::construct::Stack) renders into a [`Template`]: a
//! CloudFormation-shaped document of resources and outputs keyed by logical
//! id. Synthesis is deterministic; declaring the same graph twice produces
//! byte-identical JSON.

mod synth;
mod types;
mod validate;

pub use synth::synthesize;
pub use types::{CfnOutput, CfnResource, PATH_METADATA_KEY, Template};
pub use validate::referenced_ids;

pub(crate) use synth::SynthContext;
