mod diff;
mod info;
mod list;
mod synth;

pub use diff::cmd_diff;
pub use info::cmd_info;
pub use list::cmd_list;
pub use synth::cmd_synth;

use anyhow::{Context, Result};
use tracing::debug;

use apistack_lib::config::Config;
use apistack_lib::construct::App;
use apistack_lib::declaration::{ApiStack, ApiStackOptions};

use crate::StackArgs;

/// Load the config file and environment, then apply command-line flags.
pub(crate) fn resolve_config(args: &StackArgs) -> Result<Config> {
  let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
  if args.no_store {
    config.with_store = false;
  }
  if let Some(out) = &args.out {
    config.out_dir = out.clone();
  }
  if let Some(stack) = &args.stack {
    config.stack_name = stack.clone();
  }
  debug!(
    stack = %config.stack_name,
    with_store = config.with_store,
    out_dir = %config.out_dir.display(),
    "resolved config"
  );
  Ok(config)
}

/// Declare the API stack described by `config` in a fresh app.
pub(crate) fn declare(config: &Config) -> Result<(App, ApiStack)> {
  let mut app = App::new();
  let options = ApiStackOptions {
    with_store: config.with_store,
    env: Some(config.env.clone()),
  };
  let declared = ApiStack::construct(&mut app, &config.stack_name, &options)
    .with_context(|| format!("Failed to declare stack '{}'", config.stack_name))?;
  Ok((app, declared))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::path::PathBuf;

  const NO_OVERRIDES: [(&str, Option<&str>); 5] = [
    ("APISTACK_STACK_NAME", None),
    ("APISTACK_WITH_STORE", None),
    ("APISTACK_OUT_DIR", None),
    ("CDK_DEFAULT_ACCOUNT", None),
    ("CDK_DEFAULT_REGION", None),
  ];

  #[test]
  #[serial]
  fn flags_override_config() {
    temp_env::with_vars(NO_OVERRIDES, || {
      let args = StackArgs {
        no_store: true,
        out: Some(PathBuf::from("cdk.out")),
        stack: Some("Edge".to_string()),
        config: None,
      };
      let config = resolve_config(&args).unwrap();
      assert!(!config.with_store);
      assert_eq!(config.out_dir, PathBuf::from("cdk.out"));
      assert_eq!(config.stack_name, "Edge");
    });
  }

  #[test]
  #[serial]
  fn flags_leave_env_settings_alone() {
    temp_env::with_vars([("APISTACK_STACK_NAME", Some("FromEnv")), ("APISTACK_WITH_STORE", Some("false"))], || {
      let config = resolve_config(&StackArgs::default()).unwrap();
      assert_eq!(config.stack_name, "FromEnv");
      assert!(!config.with_store);
    });
  }

  #[test]
  fn declare_uses_stack_name() {
    let config = Config {
      stack_name: "Edge".to_string(),
      ..Config::default()
    };
    let (app, declared) = declare(&config).unwrap();
    assert_eq!(declared.stack_name(), "Edge");
    assert!(app.stack("Edge").is_some());
  }
}
