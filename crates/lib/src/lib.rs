//! apistack-lib: declare an HTTP API backed by a function and an optional bucket.
//!
//! This crate provides the pieces used by the `apistack` CLI:
//! - `construct`: the `App`/`Stack` scope tree and logical id allocation
//! - `resources`: functions, buckets, HTTP APIs and their IAM wiring
//! - `token`: deferred values only known after provisioning
//! - `template`: synthesis of a stack into a CloudFormation template
//! - `assembly`: writing, reading and diffing synthesized output
//! - `config`: `apistack.toml` and environment overrides
//! - `declaration`: the API stack itself

pub mod assembly;
pub mod config;
pub mod construct;
pub mod consts;
pub mod declaration;
pub mod error;
pub mod resources;
pub mod template;
pub mod token;
pub mod util;
