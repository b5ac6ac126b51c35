//! The API stack: one function behind an HTTP API, optionally backed by a bucket.
//!
//! # Resource graph
//!
//! ```text
//! http_api ── GET /health ──► health_integration ─┐
//!          └─ GET /items ───► items_integration ──┴──► api_lambda ──rw──► items_bucket
//!                                                          (BUCKET_NAME)
//! ```
//!
//! The `/items` route, the bucket, its grant, and the `BUCKET_NAME` variable
//! only exist when [`ApiStackOptions::with_store`] is set.

use tracing::info;

use crate::consts::{API_URL_OUTPUT, BUCKET_NAME_ENV, BUCKET_NAME_OUTPUT};
use crate::construct::{App, BucketHandle, Environment, FunctionHandle, HttpApiHandle, Stack, StackProps};
use crate::error::Result;
use crate::resources::{AddRoutesOptions, BucketProps, FunctionProps, HttpLambdaIntegration, HttpMethod};

pub const FUNCTION_ID: &str = "api_lambda";
pub const BUCKET_ID: &str = "items_bucket";
pub const HTTP_API_ID: &str = "http_api";
pub const HEALTH_INTEGRATION_ID: &str = "health_integration";
pub const ITEMS_INTEGRATION_ID: &str = "items_integration";
pub const HEALTH_PATH: &str = "/health";
pub const ITEMS_PATH: &str = "/items";

const STACK_DESCRIPTION: &str = "HTTP API backed by a single Rust function";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStackOptions {
  /// Declare the items bucket and the `/items` route.
  pub with_store: bool,
  /// Target account and region, passed through unvalidated.
  pub env: Option<Environment>,
}

impl Default for ApiStackOptions {
  fn default() -> Self {
    Self {
      with_store: true,
      env: None,
    }
  }
}

/// Handles to the parts of a declared API stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStack {
  stack_name: String,
  function: FunctionHandle,
  bucket: Option<BucketHandle>,
  api: HttpApiHandle,
}

impl ApiStack {
  /// Declare the stack `id` under `app`.
  pub fn construct(app: &mut App, id: &str, options: &ApiStackOptions) -> Result<Self> {
    let props = StackProps {
      env: options.env.clone(),
      description: Some(STACK_DESCRIPTION.to_string()),
    };
    let stack = app.add_stack(id, props)?;

    let function = stack.add_function(FUNCTION_ID, FunctionProps::default())?;

    // The bucket must exist before its name can be injected.
    let bucket = if options.with_store {
      let bucket = stack.add_bucket(BUCKET_ID, BucketProps::disposable())?;
      stack.grant_read_write(bucket, function);
      let bucket_name = stack.bucket(bucket).bucket_name();
      stack.add_environment(function, BUCKET_NAME_ENV, bucket_name);
      Some(bucket)
    } else {
      None
    };

    let api = stack.add_http_api(HTTP_API_ID)?;
    add_get_route(stack, api, HEALTH_PATH, HEALTH_INTEGRATION_ID, function)?;
    if bucket.is_some() {
      add_get_route(stack, api, ITEMS_PATH, ITEMS_INTEGRATION_ID, function)?;
    }

    let endpoint = stack.http_api(api).api_endpoint();
    stack.add_output_with_description(API_URL_OUTPUT, endpoint, "Base URL of the HTTP API")?;
    if let Some(bucket) = bucket {
      let bucket_name = stack.bucket(bucket).bucket_name();
      stack.add_output_with_description(BUCKET_NAME_OUTPUT, bucket_name, "Name of the items bucket")?;
    }

    info!(
      stack = %id,
      with_store = options.with_store,
      routes = stack.http_api(api).route_keys().count(),
      "declared api stack"
    );

    Ok(Self {
      stack_name: id.to_string(),
      function,
      bucket,
      api,
    })
  }

  pub fn stack_name(&self) -> &str {
    &self.stack_name
  }

  pub fn function(&self) -> FunctionHandle {
    self.function
  }

  pub fn bucket(&self) -> Option<BucketHandle> {
    self.bucket
  }

  pub fn api(&self) -> HttpApiHandle {
    self.api
  }

  /// The stack this declaration lives in.
  pub fn stack<'a>(&self, app: &'a App) -> Option<&'a Stack> {
    app.stack(&self.stack_name)
  }
}

fn add_get_route(
  stack: &mut Stack,
  api: HttpApiHandle,
  path: &str,
  integration_id: &str,
  function: FunctionHandle,
) -> Result<()> {
  stack.add_routes(
    api,
    AddRoutesOptions {
      path: path.to_string(),
      methods: vec![HttpMethod::Get],
      integration: HttpLambdaIntegration::new(integration_id, function),
    },
  )?;
  Ok(())
}
