//! The routing front: an HTTP API whose routes proxy to functions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::construct::{FunctionHandle, Stack, allocate_logical_id};
use crate::error::{DeclareError, Result};
use crate::template::{CfnResource, SynthContext};
use crate::token::Value;

const DEFAULT_STAGE: &str = "$default";
const PAYLOAD_FORMAT_VERSION: &str = "2.0";
const APIGATEWAY_SERVICE: &str = "apigateway.amazonaws.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
  Any,
  Get,
  Post,
  Put,
  Patch,
  Delete,
  Head,
  Options,
}

impl HttpMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      HttpMethod::Any => "ANY",
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Patch => "PATCH",
      HttpMethod::Delete => "DELETE",
      HttpMethod::Head => "HEAD",
      HttpMethod::Options => "OPTIONS",
    }
  }
}

impl fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A `(method, path)` pair. Unique within an API.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
  pub method: HttpMethod,
  pub path: String,
}

impl RouteKey {
  pub fn new(method: HttpMethod, path: &str) -> Self {
    Self {
      method,
      path: path.to_string(),
    }
  }

  /// Construct id of the route, e.g. `GET--health`.
  ///
  /// `/` becomes `--` and a literal `-` becomes `-_`, so distinct paths
  /// never share an id (`/a/b` and `/a--b` stay apart).
  pub fn construct_id(&self) -> String {
    let mut id = self.method.to_string();
    for c in self.path.chars() {
      match c {
        '/' => id.push_str("--"),
        '-' => id.push_str("-_"),
        c => id.push(c),
      }
    }
    id
  }
}

impl fmt::Display for RouteKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.method, self.path)
  }
}

/// Proxies requests to a function.
///
/// An integration is only placed in the tree once a route uses it; several
/// integrations may wrap the same function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpLambdaIntegration {
  id: String,
  function: FunctionHandle,
}

impl HttpLambdaIntegration {
  pub fn new(id: &str, function: FunctionHandle) -> Self {
    Self {
      id: id.to_string(),
      function,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn function(&self) -> FunctionHandle {
    self.function
  }
}

#[derive(Debug, Clone)]
pub struct AddRoutesOptions {
  pub path: String,
  pub methods: Vec<HttpMethod>,
  pub integration: HttpLambdaIntegration,
}

/// A declared route and the integration it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRoute {
  pub key: RouteKey,
  pub integration: String,
}

#[derive(Debug, Clone)]
pub struct HttpApi {
  id: String,
  routes: BTreeMap<RouteKey, HttpRoute>,
  integrations: BTreeMap<String, FunctionHandle>,
}

impl HttpApi {
  pub(crate) fn new(id: &str) -> Self {
    Self {
      id: id.to_string(),
      routes: BTreeMap::new(),
      integrations: BTreeMap::new(),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn logical_id(&self) -> String {
    allocate_logical_id(&[self.id.as_str(), "Resource"])
  }

  pub fn api_id(&self) -> Value {
    Value::reference(self.logical_id())
  }

  /// Base URL of the default stage.
  pub fn api_endpoint(&self) -> Value {
    Value::sub(format!(
      "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}",
      self.logical_id()
    ))
  }

  pub fn routes(&self) -> impl Iterator<Item = &HttpRoute> {
    self.routes.values()
  }

  pub fn route_keys(&self) -> impl Iterator<Item = &RouteKey> {
    self.routes.keys()
  }

  /// Function a route ultimately invokes.
  pub fn route_target(&self, key: &RouteKey) -> Option<FunctionHandle> {
    self
      .routes
      .get(key)
      .and_then(|route| self.integrations.get(&route.integration))
      .copied()
  }

  pub fn integration_target(&self, integration_id: &str) -> Option<FunctionHandle> {
    self.integrations.get(integration_id).copied()
  }

  /// Bind one route per method at `options.path`.
  ///
  /// Either every route is added or none is: a duplicate key or a
  /// conflicting integration id leaves the API unchanged.
  pub(crate) fn add_routes(&mut self, options: AddRoutesOptions) -> Result<Vec<RouteKey>> {
    if !options.path.starts_with('/') {
      return Err(DeclareError::InvalidRoutePath(options.path));
    }
    if options.methods.is_empty() {
      return Err(DeclareError::NoMethods(self.id.clone()));
    }

    let integration = &options.integration;
    if let Some(existing) = self.integrations.get(integration.id()) {
      if *existing != integration.function() {
        return Err(DeclareError::DuplicateConstructId {
          scope: self.id.clone(),
          id: integration.id().to_string(),
        });
      }
    }

    let mut keys: Vec<RouteKey> = Vec::new();
    for method in &options.methods {
      let key = RouteKey::new(*method, &options.path);
      if self.routes.contains_key(&key) || keys.contains(&key) {
        return Err(DeclareError::DuplicateRoute {
          api: self.id.clone(),
          method: key.method.to_string(),
          path: key.path,
        });
      }
      keys.push(key);
    }

    self
      .integrations
      .insert(integration.id().to_string(), integration.function());
    for key in &keys {
      debug!(api = %self.id, route = %key, integration = %integration.id(), "declared route");
      self.routes.insert(
        key.clone(),
        HttpRoute {
          key: key.clone(),
          integration: integration.id().to_string(),
        },
      );
    }

    Ok(keys)
  }

  pub(crate) fn synthesize(&self, ctx: &mut SynthContext, stack: &Stack) -> Result<()> {
    let api_id = ctx.add(
      &[self.id.as_str(), "Resource"],
      CfnResource::new("AWS::ApiGatewayV2::Api", json!({ "Name": self.id, "ProtocolType": "HTTP" })),
    )?;

    ctx.add(
      &[self.id.as_str(), "DefaultStage", "Resource"],
      CfnResource::new(
        "AWS::ApiGatewayV2::Stage",
        json!({
          "ApiId": Value::reference(&api_id),
          "AutoDeploy": true,
          "StageName": DEFAULT_STAGE,
        }),
      ),
    )?;

    let mut integration_ids: BTreeMap<&str, String> = BTreeMap::new();
    for (integration_id, handle) in &self.integrations {
      let function = stack.function(*handle);
      let logical_id = ctx.add(
        &[self.id.as_str(), integration_id.as_str(), "Resource"],
        CfnResource::new(
          "AWS::ApiGatewayV2::Integration",
          json!({
            "ApiId": Value::reference(&api_id),
            "IntegrationType": "AWS_PROXY",
            "IntegrationUri": function.function_arn(),
            "PayloadFormatVersion": PAYLOAD_FORMAT_VERSION,
          }),
        ),
      )?;
      integration_ids.insert(integration_id.as_str(), logical_id);
    }

    for route in self.routes.values() {
      let route_id = route.key.construct_id();
      let integration_logical_id = &integration_ids[route.integration.as_str()];

      ctx.add(
        &[self.id.as_str(), route_id.as_str(), "Resource"],
        CfnResource::new(
          "AWS::ApiGatewayV2::Route",
          json!({
            "ApiId": Value::reference(&api_id),
            "AuthorizationType": "NONE",
            "RouteKey": route.key.to_string(),
            "Target": Value::join("", vec![Value::literal("integrations/"), Value::reference(integration_logical_id)]),
          }),
        ),
      )?;

      let handle = self.integrations[&route.integration];
      let permission_id = format!("{}-Permission", route.integration);
      ctx.add(
        &[self.id.as_str(), route_id.as_str(), permission_id.as_str()],
        CfnResource::new(
          "AWS::Lambda::Permission",
          json!({
            "Action": "lambda:InvokeFunction",
            "FunctionName": stack.function(handle).function_arn(),
            "Principal": APIGATEWAY_SERVICE,
            "SourceArn": self.execute_api_arn(&api_id, &route.key.path),
          }),
        ),
      )?;
    }

    Ok(())
  }

  /// ARN allowed to invoke the route's function from any stage and method.
  fn execute_api_arn(&self, api_logical_id: &str, path: &str) -> Value {
    Value::join(
      "",
      vec![
        Value::literal("arn:"),
        Value::reference("AWS::Partition"),
        Value::literal(":execute-api:"),
        Value::reference("AWS::Region"),
        Value::literal(":"),
        Value::reference("AWS::AccountId"),
        Value::literal(":"),
        Value::reference(api_logical_id),
        Value::literal(format!("/*/*{path}")),
      ],
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(path: &str, methods: &[HttpMethod], integration: &str, function: usize) -> AddRoutesOptions {
    AddRoutesOptions {
      path: path.to_string(),
      methods: methods.to_vec(),
      integration: HttpLambdaIntegration::new(integration, FunctionHandle::new(function)),
    }
  }

  #[test]
  fn route_key_formats() {
    let key = RouteKey::new(HttpMethod::Get, "/health");
    assert_eq!(key.to_string(), "GET /health");
    assert_eq!(key.construct_id(), "GET--health");
  }

  #[test]
  fn route_ids_keep_dashes_apart_from_slashes() {
    let nested = RouteKey::new(HttpMethod::Get, "/a/b");
    let dashed = RouteKey::new(HttpMethod::Get, "/a--b");
    assert_eq!(nested.construct_id(), "GET--a--b");
    assert_eq!(dashed.construct_id(), "GET--a-_-_b");
  }

  #[test]
  fn dash_and_slash_routes_synthesize_side_by_side() {
    use crate::construct::StackProps;
    use crate::resources::FunctionProps;

    let mut stack = Stack::new("TestStack", StackProps::default());
    let function = stack.add_function("api_lambda", FunctionProps::default()).unwrap();
    let api = stack.add_http_api("http_api").unwrap();
    for path in ["/a/b", "/a--b"] {
      stack
        .add_routes(
          api,
          AddRoutesOptions {
            path: path.to_string(),
            methods: vec![HttpMethod::Get],
            integration: HttpLambdaIntegration::new("shared", function),
          },
        )
        .unwrap();
    }

    let template = stack.synth().unwrap();
    assert_eq!(template.resources_of_type("AWS::ApiGatewayV2::Route").count(), 2);
    assert_eq!(template.resources_of_type("AWS::Lambda::Permission").count(), 2);
  }

  #[test]
  fn add_routes_binds_every_method() {
    let mut api = HttpApi::new("http_api");
    let keys = api
      .add_routes(options("/items", &[HttpMethod::Get, HttpMethod::Post], "items_integration", 0))
      .unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(api.route_keys().count(), 2);
    assert_eq!(
      api.route_target(&RouteKey::new(HttpMethod::Post, "/items")),
      Some(FunctionHandle::new(0))
    );
  }

  #[test]
  fn duplicate_route_is_rejected_atomically() {
    let mut api = HttpApi::new("http_api");
    api
      .add_routes(options("/health", &[HttpMethod::Get], "health_integration", 0))
      .unwrap();

    let err = api
      .add_routes(options("/health", &[HttpMethod::Post, HttpMethod::Get], "other", 0))
      .unwrap_err();
    assert!(matches!(err, DeclareError::DuplicateRoute { ref method, .. } if method == "GET"));

    assert_eq!(api.route_keys().count(), 1);
    assert!(api.integration_target("other").is_none());
  }

  #[test]
  fn same_method_twice_in_one_call_is_rejected() {
    let mut api = HttpApi::new("http_api");
    let err = api
      .add_routes(options("/health", &[HttpMethod::Get, HttpMethod::Get], "health_integration", 0))
      .unwrap_err();
    assert!(matches!(err, DeclareError::DuplicateRoute { .. }));
  }

  #[test]
  fn path_must_be_absolute() {
    let mut api = HttpApi::new("http_api");
    let err = api
      .add_routes(options("health", &[HttpMethod::Get], "health_integration", 0))
      .unwrap_err();
    assert!(matches!(err, DeclareError::InvalidRoutePath(_)));
  }

  #[test]
  fn empty_methods_are_rejected() {
    let mut api = HttpApi::new("http_api");
    let err = api.add_routes(options("/health", &[], "health_integration", 0)).unwrap_err();
    assert!(matches!(err, DeclareError::NoMethods(_)));
  }

  #[test]
  fn integration_id_cannot_switch_functions() {
    let mut api = HttpApi::new("http_api");
    api.add_routes(options("/a", &[HttpMethod::Get], "shared", 0)).unwrap();
    let err = api.add_routes(options("/b", &[HttpMethod::Get], "shared", 1)).unwrap_err();
    assert!(matches!(err, DeclareError::DuplicateConstructId { .. }));

    // Reusing the same integration for the same function is fine.
    api.add_routes(options("/c", &[HttpMethod::Get], "shared", 0)).unwrap();
  }

  #[test]
  fn endpoint_references_api() {
    let api = HttpApi::new("http_api");
    let refs: Vec<String> = api.api_endpoint().references().unwrap().into_iter().collect();
    assert_eq!(refs, vec![api.logical_id()]);
  }
}
