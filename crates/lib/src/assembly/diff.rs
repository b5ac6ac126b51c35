//! Diff computation between templates.
//!
//! Compares a freshly synthesized template against the one written by a
//! previous run and reports what a deployment would change.

use serde::Serialize;

use crate::template::Template;

/// A resource that would be created, updated, or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
  pub logical_id: String,
  pub type_name: String,
}

/// An output whose value or description would change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputChange {
  pub logical_id: String,
  pub before: serde_json::Value,
  pub after: serde_json::Value,
}

/// Diff between a desired template and the current one.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TemplateDiff {
  /// Resources in desired, not in current.
  pub resources_to_add: Vec<ResourceChange>,

  /// Resources in both whose definition differs.
  pub resources_to_update: Vec<ResourceChange>,

  /// Resources in current, not in desired.
  pub resources_to_remove: Vec<ResourceChange>,

  pub resources_unchanged: Vec<String>,

  pub outputs_added: Vec<String>,
  pub outputs_removed: Vec<String>,
  pub outputs_changed: Vec<OutputChange>,
}

impl TemplateDiff {
  /// Returns true if there are no changes to make.
  pub fn is_empty(&self) -> bool {
    self.resources_to_add.is_empty()
      && self.resources_to_update.is_empty()
      && self.resources_to_remove.is_empty()
      && self.outputs_added.is_empty()
      && self.outputs_removed.is_empty()
      && self.outputs_changed.is_empty()
  }

  /// Number of resource and output changes.
  pub fn change_count(&self) -> usize {
    self.resources_to_add.len()
      + self.resources_to_update.len()
      + self.resources_to_remove.len()
      + self.outputs_added.len()
      + self.outputs_removed.len()
      + self.outputs_changed.len()
  }
}

/// Compute the diff between the desired template and the current one.
///
/// `current` is `None` when the stack has never been synthesized, in which
/// case everything in `desired` is an addition.
///
/// A resource whose type changed under the same logical id is reported as an
/// update; the provisioning engine decides whether that means replacement.
pub fn compute_diff(desired: &Template, current: Option<&Template>) -> TemplateDiff {
  let mut diff = TemplateDiff::default();
  let empty = Template::default();
  let current = current.unwrap_or(&empty);

  for (id, resource) in &desired.resources {
    let change = ResourceChange {
      logical_id: id.clone(),
      type_name: resource.type_name.clone(),
    };
    match current.resources.get(id) {
      None => diff.resources_to_add.push(change),
      Some(existing) if existing != resource => diff.resources_to_update.push(change),
      Some(_) => diff.resources_unchanged.push(id.clone()),
    }
  }

  for (id, resource) in &current.resources {
    if !desired.resources.contains_key(id) {
      diff.resources_to_remove.push(ResourceChange {
        logical_id: id.clone(),
        type_name: resource.type_name.clone(),
      });
    }
  }

  diff_outputs(desired, current, &mut diff);
  diff
}

fn diff_outputs(desired: &Template, current: &Template, diff: &mut TemplateDiff) {
  let before = &current.outputs;

  for (id, output) in &desired.outputs {
    match before.get(id) {
      None => diff.outputs_added.push(id.clone()),
      Some(existing) if existing != output => diff.outputs_changed.push(OutputChange {
        logical_id: id.clone(),
        before: existing.value.clone(),
        after: output.value.clone(),
      }),
      Some(_) => {}
    }
  }

  diff.outputs_removed = before
    .keys()
    .filter(|id| !desired.outputs.contains_key(*id))
    .cloned()
    .collect();
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::template::{CfnOutput, CfnResource};
  use serde_json::json;

  fn template(resources: &[(&str, &str, serde_json::Value)], outputs: &[(&str, &str)]) -> Template {
    let mut template = Template::default();
    for (id, kind, props) in resources {
      template
        .resources
        .insert(id.to_string(), CfnResource::new(kind, props.clone()));
    }
    for (id, value) in outputs {
      template.outputs.insert(
        id.to_string(),
        CfnOutput {
          value: json!(value),
          description: None,
        },
      );
    }
    template
  }

  #[test]
  fn diff_empty_templates() {
    let diff = compute_diff(&Template::default(), None);
    assert!(diff.is_empty());
    assert_eq!(diff.change_count(), 0);
  }

  #[test]
  fn diff_first_synth_adds_everything() {
    let desired = template(
      &[
        ("Api", "AWS::ApiGatewayV2::Api", json!({})),
        ("Fn", "AWS::Lambda::Function", json!({})),
      ],
      &[("apiurl", "https://x")],
    );
    let diff = compute_diff(&desired, None);

    assert_eq!(diff.resources_to_add.len(), 2);
    assert_eq!(diff.resources_to_add[0].type_name, "AWS::ApiGatewayV2::Api");
    assert_eq!(diff.outputs_added, vec!["apiurl"]);
    assert!(diff.resources_to_remove.is_empty());
    assert_eq!(diff.change_count(), 3);
  }

  #[test]
  fn diff_no_changes() {
    let t = template(&[("Api", "AWS::ApiGatewayV2::Api", json!({}))], &[("apiurl", "https://x")]);
    let diff = compute_diff(&t, Some(&t));
    assert!(diff.is_empty());
    assert_eq!(diff.resources_unchanged, vec!["Api"]);
  }

  #[test]
  fn diff_detects_updates_and_removals() {
    let current = template(
      &[
        ("Fn", "AWS::Lambda::Function", json!({ "Timeout": 10 })),
        ("Bucket", "AWS::S3::Bucket", json!({})),
      ],
      &[("itemsBucketName", "b"), ("apiurl", "https://old")],
    );
    let desired = template(
      &[("Fn", "AWS::Lambda::Function", json!({ "Timeout": 30 }))],
      &[("apiurl", "https://new")],
    );

    let diff = compute_diff(&desired, Some(&current));

    assert_eq!(diff.resources_to_update.len(), 1);
    assert_eq!(diff.resources_to_update[0].logical_id, "Fn");
    assert_eq!(diff.resources_to_remove.len(), 1);
    assert_eq!(diff.resources_to_remove[0].type_name, "AWS::S3::Bucket");
    assert_eq!(diff.outputs_removed, vec!["itemsBucketName"]);
    assert_eq!(diff.outputs_changed.len(), 1);
    assert_eq!(diff.outputs_changed[0].before, json!("https://old"));
    assert_eq!(diff.outputs_changed[0].after, json!("https://new"));
  }
}
