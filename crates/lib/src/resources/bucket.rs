//! The object store.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::construct::allocate_logical_id;
use crate::error::Result;
use crate::template::{CfnResource, SynthContext};
use crate::token::Value;
use crate::util::hash::hash_bytes;

use super::function::ASSET_BUCKET;
use super::iam::{PolicyDocument, PolicyStatement, Principal, Role};

/// Actions granted by [`Stack::grant_read_write`](crate::construct::Stack::grant_read_write).
pub const READ_WRITE_ACTIONS: &[&str] = &[
  "s3:Abort*",
  "s3:DeleteObject*",
  "s3:GetBucket*",
  "s3:GetObject*",
  "s3:List*",
  "s3:PutObject",
  "s3:PutObjectLegalHold",
  "s3:PutObjectRetention",
  "s3:PutObjectTagging",
  "s3:PutObjectVersionTagging",
];

/// Actions the auto-delete provider needs to empty a bucket.
const AUTO_DELETE_ACTIONS: &[&str] = &["s3:DeleteObject*", "s3:GetBucket*", "s3:List*", "s3:PutBucketPolicy"];

const AUTO_DELETE_TAG: &str = "aws-cdk:auto-delete-objects";
const AUTO_DELETE_RESOURCE_TYPE: &str = "Custom::S3AutoDeleteObjects";
const AUTO_DELETE_PROVIDER: &str = "Custom::S3AutoDeleteObjectsCustomResourceProvider";
const AUTO_DELETE_PROVIDER_RUNTIME: &str = "nodejs20.x";
const AUTO_DELETE_PROVIDER_ASSET: &str = "s3-auto-delete-objects-handler";

/// What happens to a resource when its stack is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
  #[default]
  Retain,
  Destroy,
}

impl RemovalPolicy {
  pub fn as_cfn(self) -> &'static str {
    match self {
      RemovalPolicy::Retain => "Retain",
      RemovalPolicy::Destroy => "Delete",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketProps {
  pub removal_policy: RemovalPolicy,
  /// Empty the bucket before deleting it. Requires [`RemovalPolicy::Destroy`].
  pub auto_delete_objects: bool,
}

impl BucketProps {
  /// Destroyed with its stack, objects purged first.
  pub fn disposable() -> Self {
    Self {
      removal_policy: RemovalPolicy::Destroy,
      auto_delete_objects: true,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Bucket {
  id: String,
  props: BucketProps,
}

impl Bucket {
  pub(crate) fn new(id: &str, props: BucketProps) -> Self {
    Self {
      id: id.to_string(),
      props,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn props(&self) -> &BucketProps {
    &self.props
  }

  pub fn logical_id(&self) -> String {
    allocate_logical_id(&[self.id.as_str(), "Resource"])
  }

  /// The generated bucket name.
  pub fn bucket_name(&self) -> Value {
    Value::reference(self.logical_id())
  }

  pub fn bucket_arn(&self) -> Value {
    Value::get_att(self.logical_id(), "Arn")
  }

  /// ARN matching objects under `pattern`, e.g. `*`.
  pub fn arn_for_objects(&self, pattern: &str) -> Value {
    Value::join("", vec![self.bucket_arn(), Value::literal(format!("/{pattern}"))])
  }

  pub(crate) fn read_write_statement(&self) -> PolicyStatement {
    PolicyStatement::allow(READ_WRITE_ACTIONS, vec![self.bucket_arn(), self.arn_for_objects("*")])
  }

  pub(crate) fn synthesize(&self, ctx: &mut SynthContext) -> Result<()> {
    let properties = if self.props.auto_delete_objects {
      json!({ "Tags": [{ "Key": AUTO_DELETE_TAG, "Value": "true" }] })
    } else {
      serde_json::Value::Null
    };

    let bucket_id = ctx.add(
      &[self.id.as_str(), "Resource"],
      CfnResource::new("AWS::S3::Bucket", properties).with_removal_policy(self.props.removal_policy),
    )?;

    if !self.props.auto_delete_objects {
      return Ok(());
    }

    let provider_role_arn = Value::get_att(provider_role_logical_id(), "Arn");
    let policy = CfnResource::new(
      "AWS::S3::BucketPolicy",
      json!({
        "Bucket": Value::reference(&bucket_id),
        "PolicyDocument": PolicyDocument::new(vec![
          PolicyStatement::allow(AUTO_DELETE_ACTIONS, vec![self.bucket_arn(), self.arn_for_objects("*")])
            .with_principal(Principal::Aws(provider_role_arn)),
        ]),
      }),
    );
    let policy_id = ctx.add(&[self.id.as_str(), "Policy", "Resource"], policy)?;

    let purge = CfnResource::new(
      AUTO_DELETE_RESOURCE_TYPE,
      json!({
        "ServiceToken": Value::get_att(provider_handler_logical_id(), "Arn"),
        "BucketName": Value::reference(&bucket_id),
      }),
    )
    .with_depends_on(policy_id)
    .with_removal_policy(RemovalPolicy::Destroy);
    ctx.add(&[self.id.as_str(), "AutoDeleteObjectsCustomResource", "Default"], purge)?;

    Ok(())
  }
}

fn provider_role_logical_id() -> String {
  allocate_logical_id(&[AUTO_DELETE_PROVIDER, "Role"])
}

fn provider_handler_logical_id() -> String {
  allocate_logical_id(&[AUTO_DELETE_PROVIDER, "Handler"])
}

/// Render the provider function shared by every auto-deleting bucket in a stack.
pub(crate) fn synthesize_auto_delete_provider(ctx: &mut SynthContext) -> Result<()> {
  if ctx.has_resource(&provider_handler_logical_id()) {
    return Ok(());
  }

  let role = Role::for_service("lambda.amazonaws.com").with_managed_policy("service-role/AWSLambdaBasicExecutionRole");
  let role_id = ctx.add(
    &[AUTO_DELETE_PROVIDER, "Role"],
    CfnResource::new("AWS::IAM::Role", role.role_properties()),
  )?;

  let asset = hash_bytes(AUTO_DELETE_PROVIDER_ASSET.as_bytes());
  let handler = CfnResource::new(
    "AWS::Lambda::Function",
    json!({
      "Code": {
        "S3Bucket": Value::sub(ASSET_BUCKET),
        "S3Key": format!("{}.zip", asset.0),
      },
      "Description": "Deletes all objects in a bucket before the bucket is removed",
      "Handler": "index.handler",
      "MemorySize": 128,
      "Role": Value::get_att(&role_id, "Arn"),
      "Runtime": AUTO_DELETE_PROVIDER_RUNTIME,
      "Timeout": 900,
    }),
  )
  .with_depends_on(&role_id);
  ctx.add(&[AUTO_DELETE_PROVIDER, "Handler"], handler)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_policy_retains() {
    let props = BucketProps::default();
    assert_eq!(props.removal_policy, RemovalPolicy::Retain);
    assert!(!props.auto_delete_objects);
  }

  #[test]
  fn disposable_destroys_and_purges() {
    let props = BucketProps::disposable();
    assert_eq!(props.removal_policy, RemovalPolicy::Destroy);
    assert!(props.auto_delete_objects);
    assert_eq!(props.removal_policy.as_cfn(), "Delete");
  }

  #[test]
  fn read_write_covers_bucket_and_objects() {
    let bucket = Bucket::new("items_bucket", BucketProps::disposable());
    let statement = bucket.read_write_statement();
    assert_eq!(statement.resources.len(), 2);
    assert_eq!(statement.resources[0], bucket.bucket_arn());
    assert_eq!(
      statement.resources[1].references().unwrap().into_iter().collect::<Vec<_>>(),
      vec![bucket.logical_id()]
    );
    assert!(statement.actions.iter().any(|a| a == "s3:PutObject"));
    assert!(statement.actions.iter().any(|a| a == "s3:GetObject*"));
  }

  #[test]
  fn bucket_name_references_bucket() {
    let bucket = Bucket::new("items_bucket", BucketProps::disposable());
    assert_eq!(bucket.bucket_name(), Value::reference(bucket.logical_id()));
    assert!(bucket.logical_id().starts_with("itemsbucket"));
  }
}
