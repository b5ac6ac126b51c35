//! Resource types that can be declared on a [`Stack`](crate::construct::Stack).
//!
//! Each type keeps the typed, mutable view used while the graph is declared
//! and knows how to render itself into template resources.

mod bucket;
mod function;
mod http_api;
mod iam;
mod output;

pub use bucket::{Bucket, BucketProps, READ_WRITE_ACTIONS, RemovalPolicy};
pub use function::{Function, FunctionProps};
pub use http_api::{AddRoutesOptions, HttpApi, HttpLambdaIntegration, HttpMethod, HttpRoute, RouteKey};
pub use iam::{PolicyDocument, PolicyStatement, Principal, Role, managed_policy_arn};
pub use output::Output;

pub(crate) use bucket::synthesize_auto_delete_provider;
