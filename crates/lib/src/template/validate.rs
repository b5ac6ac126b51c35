//! Reference checks over rendered template JSON.

use std::collections::BTreeSet;

use crate::token::{SubSegment, TokenError, parse_sub};

/// Collect every logical id referenced through `Ref`, `Fn::GetAtt` or
/// `Fn::Sub` anywhere inside `json`. Pseudo parameters are skipped.
pub fn referenced_ids(json: &serde_json::Value) -> Result<BTreeSet<String>, TokenError> {
  let mut ids = BTreeSet::new();
  collect(json, &mut ids)?;
  Ok(ids)
}

fn collect(json: &serde_json::Value, ids: &mut BTreeSet<String>) -> Result<(), TokenError> {
  match json {
    serde_json::Value::Object(map) if map.len() == 1 => {
      if let Some(target) = map.get("Ref").and_then(|v| v.as_str()) {
        if !target.starts_with("AWS::") {
          ids.insert(target.to_string());
        }
        return Ok(());
      }
      if let Some(target) = map
        .get("Fn::GetAtt")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .and_then(|v| v.as_str())
      {
        ids.insert(target.to_string());
        return Ok(());
      }
      if let Some(template) = map.get("Fn::Sub").and_then(|v| v.as_str()) {
        for segment in parse_sub(template)? {
          if let SubSegment::Var(var) = segment {
            if let Some(id) = var.logical_id() {
              ids.insert(id.to_string());
            }
          }
        }
        return Ok(());
      }
      for value in map.values() {
        collect(value, ids)?;
      }
    }
    serde_json::Value::Object(map) => {
      for value in map.values() {
        collect(value, ids)?;
      }
    }
    serde_json::Value::Array(items) => {
      for value in items {
        collect(value, ids)?;
      }
    }
    _ => {}
  }
  Ok(())
}
