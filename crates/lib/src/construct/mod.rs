//! The construct tree: an [`App`] holding [`Stack`]s that own resources.
//!
//! Every resource is registered under a construct id unique within its
//! scope. Paths of ids (`api_lambda/ServiceRole/Resource`) determine the
//! logical ids that appear in the synthesized template.

mod app;
mod logical_id;
mod stack;

pub use app::App;
pub use logical_id::{allocate_logical_id, sanitize};
pub use stack::{BucketHandle, Environment, FunctionHandle, HttpApiHandle, Stack, StackProps};
