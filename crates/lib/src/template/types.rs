//! Template document types.
//!
//! All maps are [`BTreeMap`]s so serialization order, and therefore the
//! template hash, only depends on content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::RemovalPolicy;
use crate::util::hash::Hashable;

/// Metadata key recording the construct path a resource was synthesized from.
pub const PATH_METADATA_KEY: &str = "apistack:path";

/// A synthesized stack template.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub resources: BTreeMap<String, CfnResource>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub outputs: BTreeMap<String, CfnOutput>,
}

impl Hashable for Template {}

impl Template {
  /// Logical ids of every resource of the given type.
  pub fn resources_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = (&'a String, &'a CfnResource)> {
    self.resources.iter().filter(move |(_, r)| r.type_name == type_name)
  }

  /// Logical id of the resource synthesized from a construct path.
  pub fn logical_id_for_path(&self, path: &str) -> Option<&str> {
    self
      .resources
      .iter()
      .find(|(_, r)| r.path() == Some(path))
      .map(|(id, _)| id.as_str())
  }
}

/// A single template resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResource {
  #[serde(rename = "Type")]
  pub type_name: String,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub properties: serde_json::Value,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub update_replace_policy: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deletion_policy: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Hashable for CfnResource {}

impl CfnResource {
  pub fn new(type_name: &str, properties: serde_json::Value) -> Self {
    Self {
      type_name: type_name.to_string(),
      properties,
      depends_on: Vec::new(),
      update_replace_policy: None,
      deletion_policy: None,
      metadata: BTreeMap::new(),
    }
  }

  pub fn with_depends_on(mut self, logical_id: impl Into<String>) -> Self {
    self.depends_on.push(logical_id.into());
    self.depends_on.sort();
    self.depends_on.dedup();
    self
  }

  pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
    self.update_replace_policy = Some(policy.as_cfn().to_string());
    self.deletion_policy = Some(policy.as_cfn().to_string());
    self
  }

  pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
    self.metadata.insert(key.to_string(), value);
    self
  }

  /// Construct path recorded at synthesis.
  pub fn path(&self) -> Option<&str> {
    self.metadata.get(PATH_METADATA_KEY).and_then(|v| v.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnOutput {
  pub value: serde_json::Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Hashable for CfnOutput {}
