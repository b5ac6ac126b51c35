//! The compute unit: a function built outside this repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::consts::{FUNCTION_HANDLER, FUNCTION_MANIFEST_PATH, FUNCTION_RUNTIME, FUNCTION_TIMEOUT_SECS};
use crate::construct::allocate_logical_id;
use crate::error::{DeclareError, Result};
use crate::template::{CfnResource, SynthContext};
use crate::token::Value;
use crate::util::hash::{ContentHash, DirHashError, hash_bytes, hash_directory};

use super::iam::{PolicyDocument, Role};

/// Bucket that receives uploaded function packages.
pub(crate) const ASSET_BUCKET: &str = "apistack-assets-${AWS::AccountId}-${AWS::Region}";

/// Metadata key recording the local path a package was built from.
const ASSET_PATH_METADATA_KEY: &str = "apistack:asset:path";

/// Directory names ignored when hashing a function's source.
const ASSET_EXCLUDES: &[&str] = &["target", ".git"];

const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";
const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionProps {
  /// Directory containing the function's `Cargo.toml`.
  pub manifest_path: PathBuf,
  pub runtime: String,
  pub handler: String,
  pub timeout: Duration,
  pub memory_size: Option<u32>,
}

impl Default for FunctionProps {
  fn default() -> Self {
    Self {
      manifest_path: PathBuf::from(FUNCTION_MANIFEST_PATH),
      runtime: FUNCTION_RUNTIME.to_string(),
      handler: FUNCTION_HANDLER.to_string(),
      timeout: Duration::from_secs(u64::from(FUNCTION_TIMEOUT_SECS)),
      memory_size: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Function {
  id: String,
  props: FunctionProps,
  environment: BTreeMap<String, Value>,
  role: Role,
}

impl Function {
  pub(crate) fn new(id: &str, props: FunctionProps) -> Self {
    Self {
      id: id.to_string(),
      props,
      environment: BTreeMap::new(),
      role: Role::for_service(LAMBDA_SERVICE).with_managed_policy(BASIC_EXECUTION_POLICY),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn props(&self) -> &FunctionProps {
    &self.props
  }

  pub fn environment(&self) -> &BTreeMap<String, Value> {
    &self.environment
  }

  pub fn role(&self) -> &Role {
    &self.role
  }

  pub fn logical_id(&self) -> String {
    allocate_logical_id(&[self.id.as_str(), "Resource"])
  }

  pub fn role_logical_id(&self) -> String {
    allocate_logical_id(&[self.id.as_str(), "ServiceRole", "Resource"])
  }

  pub fn function_name(&self) -> Value {
    Value::reference(self.logical_id())
  }

  pub fn function_arn(&self) -> Value {
    Value::get_att(self.logical_id(), "Arn")
  }

  pub fn role_arn(&self) -> Value {
    Value::get_att(self.role_logical_id(), "Arn")
  }

  pub(crate) fn role_mut(&mut self) -> &mut Role {
    &mut self.role
  }

  /// Set an environment variable, replacing any previous value for `key`.
  pub(crate) fn add_environment(&mut self, key: &str, value: Value) {
    if let Some(previous) = self.environment.insert(key.to_string(), value) {
      debug!(function = %self.id, key = %key, previous = ?previous, "replaced environment variable");
    }
  }

  /// Content hash of the function's source directory.
  ///
  /// The package is built elsewhere; when its source is not reachable from
  /// here the hash falls back to the configured path.
  pub fn asset_hash(&self) -> std::result::Result<ContentHash, DirHashError> {
    let path = &self.props.manifest_path;
    if path.is_dir() {
      hash_directory(path, ASSET_EXCLUDES)
    } else {
      warn!(function = %self.id, path = %path.display(), "function source not found, hashing path instead");
      Ok(hash_bytes(path_key(path).as_bytes()))
    }
  }

  pub(crate) fn synthesize(&self, ctx: &mut SynthContext) -> Result<()> {
    let role_id = ctx.add(
      &[self.id.as_str(), "ServiceRole", "Resource"],
      CfnResource::new("AWS::IAM::Role", self.role.role_properties()),
    )?;

    let mut function = CfnResource::new("AWS::Lambda::Function", self.function_properties()?).with_depends_on(&role_id);

    if !self.role.default_policy.is_empty() {
      let policy_path = [self.id.as_str(), "ServiceRole", "DefaultPolicy", "Resource"];
      let policy = CfnResource::new(
        "AWS::IAM::Policy",
        json!({
          "PolicyDocument": PolicyDocument::new(self.role.default_policy.clone()),
          "PolicyName": allocate_logical_id(&policy_path),
          "Roles": [Value::reference(&role_id)],
        }),
      );
      let policy_id = ctx.add(&policy_path, policy)?;
      function = function.with_depends_on(policy_id);
    }

    let function = function.with_metadata(ASSET_PATH_METADATA_KEY, json!(path_key(&self.props.manifest_path)));
    ctx.add(&[self.id.as_str(), "Resource"], function)?;
    Ok(())
  }

  fn function_properties(&self) -> Result<serde_json::Value> {
    let hash = self.asset_hash().map_err(|source| DeclareError::Asset {
      path: path_key(&self.props.manifest_path),
      source,
    })?;

    let mut props = serde_json::Map::new();
    props.insert(
      "Code".to_string(),
      json!({
        "S3Bucket": Value::sub(ASSET_BUCKET),
        "S3Key": format!("{}.zip", hash.0),
      }),
    );
    props.insert("Handler".to_string(), json!(self.props.handler));
    props.insert("Role".to_string(), json!(self.role_arn()));
    props.insert("Runtime".to_string(), json!(self.props.runtime));
    props.insert("Timeout".to_string(), json!(self.props.timeout.as_secs()));
    if let Some(memory) = self.props.memory_size {
      props.insert("MemorySize".to_string(), json!(memory));
    }
    if !self.environment.is_empty() {
      props.insert("Environment".to_string(), json!({ "Variables": self.environment }));
    }
    Ok(serde_json::Value::Object(props))
  }
}

/// Path rendered with forward slashes so templates match across platforms.
fn path_key(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn missing_source() -> FunctionProps {
    FunctionProps {
      manifest_path: PathBuf::from("does/not/exist"),
      ..FunctionProps::default()
    }
  }

  #[test]
  fn defaults_match_build_contract() {
    let props = FunctionProps::default();
    assert_eq!(props.manifest_path, PathBuf::from("../lambda/api"));
    assert_eq!(props.runtime, "provided.al2023");
    assert_eq!(props.handler, "bootstrap");
    assert_eq!(props.timeout, Duration::from_secs(10));
  }

  #[test]
  fn asset_hash_falls_back_to_path() {
    let function = Function::new("api_lambda", missing_source());
    assert_eq!(function.asset_hash().unwrap(), hash_bytes(b"does/not/exist"));
  }

  #[test]
  #[traced_test]
  fn missing_source_is_logged() {
    Function::new("api_lambda", missing_source()).asset_hash().unwrap();
    assert!(logs_contain("function source not found"));
  }

  #[test]
  fn asset_hash_follows_source_content() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Cargo.toml"), "[package]\nname = \"api\"").unwrap();

    let function = Function::new(
      "api_lambda",
      FunctionProps {
        manifest_path: temp.path().to_path_buf(),
        ..FunctionProps::default()
      },
    );
    let before = function.asset_hash().unwrap();

    fs::create_dir(temp.path().join("target")).unwrap();
    fs::write(temp.path().join("target/bootstrap"), "elf").unwrap();
    assert_eq!(function.asset_hash().unwrap(), before);

    fs::write(temp.path().join("Cargo.toml"), "[package]\nname = \"api2\"").unwrap();
    assert_ne!(function.asset_hash().unwrap(), before);
  }

  #[test]
  fn environment_replaces_existing_key() {
    let mut function = Function::new("api_lambda", missing_source());
    function.add_environment("BUCKET_NAME", Value::literal("a"));
    function.add_environment("BUCKET_NAME", Value::literal("b"));
    assert_eq!(function.environment().len(), 1);
    assert_eq!(function.environment()["BUCKET_NAME"], Value::literal("b"));
  }

  #[test]
  fn properties_render_runtime_and_environment() {
    let mut function = Function::new("api_lambda", missing_source());
    function.add_environment("BUCKET_NAME", Value::reference("itemsbucket1234ABCD"));

    let props = function.function_properties().unwrap();
    assert_eq!(props["Runtime"], json!("provided.al2023"));
    assert_eq!(props["Handler"], json!("bootstrap"));
    assert_eq!(props["Timeout"], json!(10));
    assert_eq!(
      props["Environment"]["Variables"]["BUCKET_NAME"],
      json!({ "Ref": "itemsbucket1234ABCD" })
    );
    assert_eq!(props["Role"]["Fn::GetAtt"][1], json!("Arn"));
    assert!(props.get("MemorySize").is_none());
  }
}
