//! `apistack list`: routes, function environment and outputs of the declared stack.

use anyhow::{Context, Result};
use serde::Serialize;

use apistack_lib::construct::Stack;
use apistack_lib::declaration::ApiStack;

use crate::StackArgs;
use crate::output::{print_entries, print_json, print_route};

use super::{declare, resolve_config};

#[derive(Debug, Serialize)]
struct RouteEntry {
  method: String,
  path: String,
  integration: String,
  function: String,
}

#[derive(Debug, Serialize)]
struct ListOutput {
  stack: String,
  routes: Vec<RouteEntry>,
  environment: serde_json::Value,
  outputs: serde_json::Value,
}

pub fn cmd_list(args: &StackArgs, json: bool) -> Result<()> {
  let config = resolve_config(args)?;
  let (app, declared) = declare(&config)?;
  let stack = declared
    .stack(&app)
    .with_context(|| format!("Stack '{}' not declared", declared.stack_name()))?;

  let listing = collect(stack, &declared)?;

  if json {
    return print_json(&listing);
  }

  println!("Routes:");
  for route in &listing.routes {
    print_route(&route.method, &route.path, &route.function, &route.integration);
  }

  println!();
  println!("Environment ({}):", stack.function(declared.function()).id());
  print_entries(&listing.environment);

  println!();
  println!("Outputs:");
  print_entries(&listing.outputs);

  Ok(())
}

fn collect(stack: &Stack, declared: &ApiStack) -> Result<ListOutput> {
  let api = stack.http_api(declared.api());
  let routes = api
    .routes()
    .map(|route| {
      let function = api
        .route_target(&route.key)
        .map(|handle| stack.function(handle).id().to_string())
        .unwrap_or_default();
      RouteEntry {
        method: route.key.method.to_string(),
        path: route.key.path.clone(),
        integration: route.integration.clone(),
        function,
      }
    })
    .collect();

  let environment = serde_json::to_value(stack.function(declared.function()).environment())
    .context("Failed to render function environment")?;

  let mut outputs = serde_json::Map::new();
  for output in stack.outputs() {
    let value = serde_json::to_value(output.value()).context("Failed to render output")?;
    outputs.insert(output.id().to_string(), value);
  }

  Ok(ListOutput {
    stack: stack.name().to_string(),
    routes,
    environment,
    outputs: serde_json::Value::Object(outputs),
  })
}
