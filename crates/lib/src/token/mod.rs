//! Deferred values that are only known once the stack is provisioned.
//!
//! A bucket's generated name, a function's ARN and an API's endpoint do not
//! exist while the graph is declared. They are carried as [`Value`]s, which
//! render to CloudFormation intrinsic functions at synthesis time and can be
//! resolved against a [`Resolver`] describing provisioned state.

mod sub;

use std::collections::{BTreeSet, HashMap};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

pub use sub::{SubSegment, SubVar, parse as parse_sub};

/// Errors raised while parsing or resolving values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
  #[error("unclosed variable at position {0}")]
  Unclosed(usize),

  #[error("malformed variable: {0}")]
  Malformed(String),

  #[error("unresolved reference: {0}")]
  UnresolvedRef(String),

  #[error("unresolved attribute: {logical_id}.{attribute}")]
  UnresolvedAttribute { logical_id: String, attribute: String },

  #[error("unresolved pseudo parameter: {0}")]
  UnresolvedPseudo(String),
}

/// A value that may depend on provisioned resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Literal(String),

  /// Physical id of a resource, or a pseudo parameter such as `AWS::Region`.
  Ref(String),

  GetAtt { logical_id: String, attribute: String },

  /// A string template with `${...}` variables.
  Sub(String),

  Join { delimiter: String, parts: Vec<Value> },
}

impl Value {
  pub fn literal(s: impl Into<String>) -> Self {
    Value::Literal(s.into())
  }

  pub fn reference(logical_id: impl Into<String>) -> Self {
    Value::Ref(logical_id.into())
  }

  pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
    Value::GetAtt {
      logical_id: logical_id.into(),
      attribute: attribute.into(),
    }
  }

  pub fn sub(template: impl Into<String>) -> Self {
    Value::Sub(template.into())
  }

  pub fn join(delimiter: impl Into<String>, parts: Vec<Value>) -> Self {
    Value::Join {
      delimiter: delimiter.into(),
      parts,
    }
  }

  /// Logical ids this value depends on. Pseudo parameters are not included.
  pub fn references(&self) -> Result<BTreeSet<String>, TokenError> {
    let mut refs = BTreeSet::new();
    self.collect_references(&mut refs)?;
    Ok(refs)
  }

  fn collect_references(&self, refs: &mut BTreeSet<String>) -> Result<(), TokenError> {
    match self {
      Value::Literal(_) => {}
      Value::Ref(id) => {
        if !is_pseudo(id) {
          refs.insert(id.clone());
        }
      }
      Value::GetAtt { logical_id, .. } => {
        refs.insert(logical_id.clone());
      }
      Value::Sub(template) => {
        for segment in parse_sub(template)? {
          if let SubSegment::Var(var) = segment {
            if let Some(id) = var.logical_id() {
              refs.insert(id.to_string());
            }
          }
        }
      }
      Value::Join { parts, .. } => {
        for part in parts {
          part.collect_references(refs)?;
        }
      }
    }
    Ok(())
  }

  /// Resolve to a concrete string using provisioned state.
  pub fn resolve(&self, resolver: &impl Resolver) -> Result<String, TokenError> {
    match self {
      Value::Literal(s) => Ok(s.clone()),
      Value::Ref(id) if is_pseudo(id) => resolver.resolve_pseudo(id).map(str::to_string),
      Value::Ref(id) => resolver.resolve_ref(id).map(str::to_string),
      Value::GetAtt { logical_id, attribute } => resolver.resolve_att(logical_id, attribute).map(str::to_string),
      Value::Sub(template) => {
        let mut result = String::new();
        for segment in parse_sub(template)? {
          match segment {
            SubSegment::Literal(s) => result.push_str(&s),
            SubSegment::Var(SubVar::Pseudo(name)) => result.push_str(resolver.resolve_pseudo(&name)?),
            SubSegment::Var(SubVar::Ref(id)) => result.push_str(resolver.resolve_ref(&id)?),
            SubSegment::Var(SubVar::GetAtt { logical_id, attribute }) => {
              result.push_str(resolver.resolve_att(&logical_id, &attribute)?)
            }
          }
        }
        Ok(result)
      }
      Value::Join { delimiter, parts } => {
        let resolved = parts
          .iter()
          .map(|p| p.resolve(resolver))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(resolved.join(delimiter))
      }
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Literal(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Literal(s)
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Literal(s) => serializer.serialize_str(s),
      Value::Ref(id) => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Ref", id)?;
        map.end()
      }
      Value::GetAtt { logical_id, attribute } => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
        map.end()
      }
      Value::Sub(template) => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Fn::Sub", template)?;
        map.end()
      }
      Value::Join { delimiter, parts } => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Fn::Join", &(delimiter, parts))?;
        map.end()
      }
    }
  }
}

fn is_pseudo(id: &str) -> bool {
  id.starts_with("AWS::")
}

/// Source of provisioned values.
pub trait Resolver {
  fn resolve_ref(&self, logical_id: &str) -> Result<&str, TokenError>;

  fn resolve_att(&self, logical_id: &str, attribute: &str) -> Result<&str, TokenError>;

  fn resolve_pseudo(&self, name: &str) -> Result<&str, TokenError>;
}

/// Provisioned state of a stack: physical ids, attributes and pseudo parameters.
#[derive(Debug, Clone)]
pub struct ResolvedState {
  physical_ids: HashMap<String, String>,
  attributes: HashMap<(String, String), String>,
  pseudo: HashMap<String, String>,
}

impl Default for ResolvedState {
  fn default() -> Self {
    let pseudo = HashMap::from([
      ("AWS::Partition".to_string(), "aws".to_string()),
      ("AWS::URLSuffix".to_string(), "amazonaws.com".to_string()),
    ]);
    Self {
      physical_ids: HashMap::new(),
      attributes: HashMap::new(),
      pseudo,
    }
  }
}

impl ResolvedState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_region(mut self, region: &str) -> Self {
    self.pseudo.insert("AWS::Region".to_string(), region.to_string());
    self
  }

  pub fn with_account(mut self, account: &str) -> Self {
    self.pseudo.insert("AWS::AccountId".to_string(), account.to_string());
    self
  }

  pub fn with_physical_id(mut self, logical_id: &str, physical_id: &str) -> Self {
    self
      .physical_ids
      .insert(logical_id.to_string(), physical_id.to_string());
    self
  }

  pub fn with_attribute(mut self, logical_id: &str, attribute: &str, value: &str) -> Self {
    self
      .attributes
      .insert((logical_id.to_string(), attribute.to_string()), value.to_string());
    self
  }
}

impl Resolver for ResolvedState {
  fn resolve_ref(&self, logical_id: &str) -> Result<&str, TokenError> {
    self
      .physical_ids
      .get(logical_id)
      .map(String::as_str)
      .ok_or_else(|| TokenError::UnresolvedRef(logical_id.to_string()))
  }

  fn resolve_att(&self, logical_id: &str, attribute: &str) -> Result<&str, TokenError> {
    self
      .attributes
      .get(&(logical_id.to_string(), attribute.to_string()))
      .map(String::as_str)
      .ok_or_else(|| TokenError::UnresolvedAttribute {
        logical_id: logical_id.to_string(),
        attribute: attribute.to_string(),
      })
  }

  fn resolve_pseudo(&self, name: &str) -> Result<&str, TokenError> {
    self
      .pseudo
      .get(name)
      .map(String::as_str)
      .ok_or_else(|| TokenError::UnresolvedPseudo(name.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn values_render_as_intrinsics() {
    assert_eq!(serde_json::to_value(Value::literal("x")).unwrap(), json!("x"));
    assert_eq!(serde_json::to_value(Value::reference("Bucket")).unwrap(), json!({ "Ref": "Bucket" }));
    assert_eq!(
      serde_json::to_value(Value::get_att("Fn", "Arn")).unwrap(),
      json!({ "Fn::GetAtt": ["Fn", "Arn"] })
    );
    assert_eq!(
      serde_json::to_value(Value::join("", vec![Value::literal("integrations/"), Value::reference("Integ")])).unwrap(),
      json!({ "Fn::Join": ["", ["integrations/", { "Ref": "Integ" }]] })
    );
  }

  #[test]
  fn references_skip_pseudo_parameters() {
    let value = Value::join(
      "",
      vec![
        Value::reference("AWS::Region"),
        Value::get_att("Bucket", "Arn"),
        Value::sub("${Api}.${AWS::URLSuffix}/${Stage.Name}"),
      ],
    );
    let refs: Vec<String> = value.references().unwrap().into_iter().collect();
    assert_eq!(refs, vec!["Api", "Bucket", "Stage"]);
  }

  #[test]
  fn resolve_endpoint_sub() {
    let state = ResolvedState::new()
      .with_region("eu-west-1")
      .with_physical_id("Api", "abc123");
    let value = Value::sub("https://${Api}.execute-api.${AWS::Region}.${AWS::URLSuffix}");
    assert_eq!(
      value.resolve(&state).unwrap(),
      "https://abc123.execute-api.eu-west-1.amazonaws.com"
    );
  }

  #[test]
  fn resolve_missing_reference_fails() {
    let state = ResolvedState::new();
    assert_eq!(
      Value::reference("Bucket").resolve(&state),
      Err(TokenError::UnresolvedRef("Bucket".to_string()))
    );
    assert_eq!(
      Value::sub("${AWS::Region}").resolve(&state),
      Err(TokenError::UnresolvedPseudo("AWS::Region".to_string()))
    );
  }

  #[test]
  fn resolve_attribute_and_join() {
    let state = ResolvedState::new().with_attribute("Bucket", "Arn", "arn:aws:s3:::items");
    let value = Value::join("", vec![Value::get_att("Bucket", "Arn"), Value::literal("/*")]);
    assert_eq!(value.resolve(&state).unwrap(), "arn:aws:s3:::items/*");
  }
}
