//! A stack: the unit of deployment and the scope resources are declared in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeclareError, Result};
use crate::resources::{AddRoutesOptions, Bucket, BucketProps, Function, FunctionProps, HttpApi, Output, RemovalPolicy, RouteKey};
use crate::template::{Template, synthesize};
use crate::token::Value;

/// Target account and region. Neither is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
  pub account: Option<String>,
  pub region: Option<String>,
}

impl Environment {
  /// `aws://<account>/<region>`, with placeholders for unknown parts.
  pub fn to_uri(&self) -> String {
    format!(
      "aws://{}/{}",
      self.account.as_deref().unwrap_or("unknown-account"),
      self.region.as_deref().unwrap_or("unknown-region")
    )
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackProps {
  pub env: Option<Environment>,
  pub description: Option<String>,
}

// Handles index into the stack that created them; using one with a different
// stack panics.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionHandle(usize);

impl FunctionHandle {
  #[cfg(test)]
  pub(crate) fn new(index: usize) -> Self {
    Self(index)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpApiHandle(usize);

#[derive(Debug, Clone)]
pub struct Stack {
  name: String,
  props: StackProps,
  children: BTreeSet<String>,
  functions: Vec<Function>,
  buckets: Vec<Bucket>,
  apis: Vec<HttpApi>,
  outputs: Vec<Output>,
}

impl Stack {
  pub fn new(name: &str, props: StackProps) -> Self {
    Self {
      name: name.to_string(),
      props,
      children: BTreeSet::new(),
      functions: Vec::new(),
      buckets: Vec::new(),
      apis: Vec::new(),
      outputs: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn props(&self) -> &StackProps {
    &self.props
  }

  pub fn environment(&self) -> Environment {
    self.props.env.clone().unwrap_or_default()
  }

  fn register_child(&mut self, id: &str) -> Result<()> {
    if id.is_empty() {
      return Err(DeclareError::EmptyConstructId);
    }
    if !self.children.insert(id.to_string()) {
      return Err(DeclareError::DuplicateConstructId {
        scope: self.name.clone(),
        id: id.to_string(),
      });
    }
    Ok(())
  }

  pub fn add_function(&mut self, id: &str, props: FunctionProps) -> Result<FunctionHandle> {
    self.register_child(id)?;
    debug!(stack = %self.name, id = %id, runtime = %props.runtime, "declared function");
    self.functions.push(Function::new(id, props));
    Ok(FunctionHandle(self.functions.len() - 1))
  }

  pub fn add_bucket(&mut self, id: &str, props: BucketProps) -> Result<BucketHandle> {
    if props.auto_delete_objects && props.removal_policy != RemovalPolicy::Destroy {
      return Err(DeclareError::AutoDeleteRequiresDestroy(id.to_string()));
    }
    self.register_child(id)?;
    debug!(stack = %self.name, id = %id, removal_policy = ?props.removal_policy, "declared bucket");
    self.buckets.push(Bucket::new(id, props));
    Ok(BucketHandle(self.buckets.len() - 1))
  }

  pub fn add_http_api(&mut self, id: &str) -> Result<HttpApiHandle> {
    self.register_child(id)?;
    debug!(stack = %self.name, id = %id, "declared http api");
    self.apis.push(HttpApi::new(id));
    Ok(HttpApiHandle(self.apis.len() - 1))
  }

  /// Bind `options.path` for each method in `options.methods` to the integration.
  pub fn add_routes(&mut self, api: HttpApiHandle, options: AddRoutesOptions) -> Result<Vec<RouteKey>> {
    // Resolve the target now so a foreign handle fails here, not at synthesis.
    let _ = self.function(options.integration.function());
    self.apis[api.0].add_routes(options)
  }

  /// Allow `grantee` to read and write objects in `bucket`.
  pub fn grant_read_write(&mut self, bucket: BucketHandle, grantee: FunctionHandle) {
    let statement = self.buckets[bucket.0].read_write_statement();
    let function = &mut self.functions[grantee.0];
    debug!(bucket = %self.buckets[bucket.0].id(), function = %function.id(), "granted read/write");
    function.role_mut().add_to_policy(statement);
  }

  pub fn add_environment(&mut self, function: FunctionHandle, key: &str, value: impl Into<Value>) {
    self.functions[function.0].add_environment(key, value.into());
  }

  pub fn add_output(&mut self, id: &str, value: Value) -> Result<()> {
    self.register_child(id)?;
    self.outputs.push(Output::new(id, value));
    Ok(())
  }

  pub fn add_output_with_description(&mut self, id: &str, value: Value, description: &str) -> Result<()> {
    self.register_child(id)?;
    self.outputs.push(Output::new(id, value).with_description(description));
    Ok(())
  }

  pub fn function(&self, handle: FunctionHandle) -> &Function {
    &self.functions[handle.0]
  }

  pub fn bucket(&self, handle: BucketHandle) -> &Bucket {
    &self.buckets[handle.0]
  }

  pub fn http_api(&self, handle: HttpApiHandle) -> &HttpApi {
    &self.apis[handle.0]
  }

  pub fn functions(&self) -> &[Function] {
    &self.functions
  }

  pub fn buckets(&self) -> &[Bucket] {
    &self.buckets
  }

  pub fn http_apis(&self) -> &[HttpApi] {
    &self.apis
  }

  pub fn outputs(&self) -> &[Output] {
    &self.outputs
  }

  pub fn output(&self, id: &str) -> Option<&Output> {
    self.outputs.iter().find(|o| o.id() == id)
  }

  pub fn synth(&self) -> Result<Template> {
    synthesize(self)
  }
}
