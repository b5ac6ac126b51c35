//! IAM roles and policy statements.

use serde::Serialize;
use serde_json::json;

use crate::token::Value;

pub const POLICY_VERSION: &str = "2012-10-17";

/// Who a statement applies to when attached to a resource policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
  /// A service principal such as `lambda.amazonaws.com`.
  Service(String),
  /// An IAM principal ARN.
  Aws(Value),
}

/// An `Allow` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
  pub actions: Vec<String>,
  pub resources: Vec<Value>,
  pub principal: Option<Principal>,
}

impl PolicyStatement {
  pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
    Self {
      actions: actions.iter().map(|a| a.to_string()).collect(),
      resources,
      principal: None,
    }
  }

  pub fn with_principal(mut self, principal: Principal) -> Self {
    self.principal = Some(principal);
    self
  }
}

impl Serialize for PolicyStatement {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut statement = serde_json::Map::new();
    statement.insert("Action".to_string(), single_or_list(&self.actions));
    statement.insert("Effect".to_string(), json!("Allow"));
    match &self.principal {
      Some(Principal::Service(service)) => {
        statement.insert("Principal".to_string(), json!({ "Service": service }));
      }
      Some(Principal::Aws(arn)) => {
        statement.insert("Principal".to_string(), json!({ "AWS": arn }));
      }
      None => {}
    }
    if !self.resources.is_empty() {
      statement.insert("Resource".to_string(), single_or_list(&self.resources));
    }
    statement.serialize(serializer)
  }
}

/// A single element renders as a scalar, several as a list.
fn single_or_list<T: Serialize>(items: &[T]) -> serde_json::Value {
  match items {
    [only] => json!(only),
    _ => json!(items),
  }
}

/// A versioned list of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
  #[serde(rename = "Statement")]
  pub statements: Vec<PolicyStatement>,
  #[serde(rename = "Version")]
  pub version: &'static str,
}

impl PolicyDocument {
  pub fn new(statements: Vec<PolicyStatement>) -> Self {
    Self {
      statements,
      version: POLICY_VERSION,
    }
  }
}

/// ARN of an AWS managed policy in the current partition.
pub fn managed_policy_arn(name: &str) -> Value {
  Value::join(
    "",
    vec![
      Value::literal("arn:"),
      Value::reference("AWS::Partition"),
      Value::literal(format!(":iam::aws:policy/{name}")),
    ],
  )
}

/// An execution role assumed by a service, with an inline default policy
/// that grants accumulate into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
  pub assumed_by: String,
  pub managed_policies: Vec<String>,
  pub default_policy: Vec<PolicyStatement>,
}

impl Role {
  pub fn for_service(service: &str) -> Self {
    Self {
      assumed_by: service.to_string(),
      managed_policies: Vec::new(),
      default_policy: Vec::new(),
    }
  }

  pub fn with_managed_policy(mut self, name: &str) -> Self {
    self.managed_policies.push(name.to_string());
    self
  }

  pub fn add_to_policy(&mut self, statement: PolicyStatement) {
    if !self.default_policy.contains(&statement) {
      self.default_policy.push(statement);
    }
  }

  pub fn assume_role_document(&self) -> PolicyDocument {
    PolicyDocument::new(vec![
      PolicyStatement::allow(&["sts:AssumeRole"], vec![]).with_principal(Principal::Service(self.assumed_by.clone())),
    ])
  }

  /// Properties of the `AWS::IAM::Role` resource.
  pub(crate) fn role_properties(&self) -> serde_json::Value {
    let mut props = serde_json::Map::new();
    props.insert("AssumeRolePolicyDocument".to_string(), json!(self.assume_role_document()));
    if !self.managed_policies.is_empty() {
      let arns: Vec<Value> = self.managed_policies.iter().map(|p| managed_policy_arn(p)).collect();
      props.insert("ManagedPolicyArns".to_string(), json!(arns));
    }
    serde_json::Value::Object(props)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_action_renders_as_scalar() {
    let statement = PolicyStatement::allow(&["sts:AssumeRole"], vec![])
      .with_principal(Principal::Service("lambda.amazonaws.com".to_string()));
    assert_eq!(
      serde_json::to_value(&statement).unwrap(),
      json!({
        "Action": "sts:AssumeRole",
        "Effect": "Allow",
        "Principal": { "Service": "lambda.amazonaws.com" }
      })
    );
  }

  #[test]
  fn several_resources_render_as_list() {
    let statement = PolicyStatement::allow(
      &["s3:GetObject*", "s3:List*"],
      vec![Value::get_att("Bucket", "Arn"), Value::literal("*")],
    );
    let rendered = serde_json::to_value(&statement).unwrap();
    assert_eq!(rendered["Action"], json!(["s3:GetObject*", "s3:List*"]));
    assert_eq!(rendered["Resource"], json!([{ "Fn::GetAtt": ["Bucket", "Arn"] }, "*"]));
  }

  #[test]
  fn duplicate_statements_are_merged() {
    let mut role = Role::for_service("lambda.amazonaws.com");
    let statement = PolicyStatement::allow(&["s3:List*"], vec![Value::literal("*")]);
    role.add_to_policy(statement.clone());
    role.add_to_policy(statement);
    assert_eq!(role.default_policy.len(), 1);
  }

  #[test]
  fn role_properties_include_managed_policies() {
    let role = Role::for_service("lambda.amazonaws.com").with_managed_policy("service-role/AWSLambdaBasicExecutionRole");
    let props = role.role_properties();
    assert_eq!(
      props["ManagedPolicyArns"][0]["Fn::Join"][1][2],
      json!(":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole")
    );
    assert_eq!(props["AssumeRolePolicyDocument"]["Version"], json!(POLICY_VERSION));
  }
}
