//! Rendering a stack into a template.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, info};

use crate::construct::{Stack, allocate_logical_id};
use crate::error::{DeclareError, Result};
use crate::resources::{Output, synthesize_auto_delete_provider};

use super::types::{CfnOutput, CfnResource, PATH_METADATA_KEY, Template};
use super::validate::referenced_ids;

/// Accumulates resources while a stack renders itself.
pub(crate) struct SynthContext {
  stack_name: String,
  template: Template,
  // Output logical id to the construct path that claimed it.
  output_paths: BTreeMap<String, String>,
}

impl SynthContext {
  pub(crate) fn new(stack_name: &str, description: Option<String>) -> Self {
    Self {
      stack_name: stack_name.to_string(),
      template: Template {
        description,
        ..Template::default()
      },
      output_paths: BTreeMap::new(),
    }
  }

  pub(crate) fn has_resource(&self, logical_id: &str) -> bool {
    self.template.resources.contains_key(logical_id)
  }

  /// Add a resource at a construct path and return its logical id.
  pub(crate) fn add(&mut self, path: &[&str], resource: CfnResource) -> Result<String> {
    let logical_id = allocate_logical_id(path);
    let full_path = format!("{}/{}", self.stack_name, path.join("/"));

    if let Some(existing) = self.template.resources.get(&logical_id) {
      return Err(DeclareError::LogicalIdCollision {
        logical_id,
        first: existing.path().unwrap_or_default().to_string(),
        second: full_path,
      });
    }

    debug!(logical_id = %logical_id, path = %full_path, kind = %resource.type_name, "synthesized resource");

    let resource = resource.with_metadata(PATH_METADATA_KEY, json!(full_path));
    self.template.resources.insert(logical_id.clone(), resource);
    Ok(logical_id)
  }

  pub(crate) fn add_output(&mut self, output: &Output) -> Result<()> {
    let logical_id = output.logical_id();
    let full_path = format!("{}/{}", self.stack_name, output.id());
    if let Some(existing) = self.output_paths.get(&logical_id) {
      return Err(DeclareError::LogicalIdCollision {
        first: existing.clone(),
        second: full_path,
        logical_id,
      });
    }

    self.output_paths.insert(logical_id.clone(), full_path);
    self.template.outputs.insert(
      logical_id,
      CfnOutput {
        value: serde_json::to_value(output.value())?,
        description: output.description().map(str::to_string),
      },
    );
    Ok(())
  }

  fn finish(self) -> Template {
    self.template
  }
}

/// Synthesize a stack into a template.
///
/// Fails when two constructs map to the same logical id or when any value
/// references a resource that the stack does not declare.
pub fn synthesize(stack: &Stack) -> Result<Template> {
  info!(stack = %stack.name(), "synthesizing stack");

  let mut ctx = SynthContext::new(stack.name(), stack.props().description.clone());

  for function in stack.functions() {
    function.synthesize(&mut ctx)?;
  }

  for bucket in stack.buckets() {
    bucket.synthesize(&mut ctx)?;
  }
  if stack.buckets().iter().any(|b| b.props().auto_delete_objects) {
    synthesize_auto_delete_provider(&mut ctx)?;
  }

  for api in stack.http_apis() {
    api.synthesize(&mut ctx, stack)?;
  }

  for output in stack.outputs() {
    ctx.add_output(output)?;
  }

  let template = ctx.finish();
  validate_references(stack.name(), &template)?;

  info!(
    stack = %stack.name(),
    resources = template.resources.len(),
    outputs = template.outputs.len(),
    "stack synthesized"
  );
  Ok(template)
}

fn validate_references(stack_name: &str, template: &Template) -> Result<()> {
  let check = |source_path: &str, json: &serde_json::Value, extra: &[String]| -> Result<()> {
    let mut ids = referenced_ids(json)?;
    ids.extend(extra.iter().cloned());
    match ids.into_iter().find(|id| !template.resources.contains_key(id)) {
      Some(logical_id) => Err(DeclareError::UnresolvedReference {
        stack: stack_name.to_string(),
        source_path: source_path.to_string(),
        logical_id,
      }),
      None => Ok(()),
    }
  };

  for (logical_id, resource) in &template.resources {
    check(resource.path().unwrap_or(logical_id), &resource.properties, &resource.depends_on)?;
  }
  for (logical_id, output) in &template.outputs {
    check(&format!("{stack_name}/{logical_id}"), &output.value, &[])?;
  }
  Ok(())
}
