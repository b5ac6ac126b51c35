use anyhow::Result;

use apistack_lib::consts::{APP_NAME, FUNCTION_MANIFEST_PATH, FUNCTION_RUNTIME, FUNCTION_TIMEOUT_SECS};

use crate::StackArgs;
use crate::output::print_stat;

use super::resolve_config;

pub fn cmd_info(args: &StackArgs) -> Result<()> {
  let config = resolve_config(args)?;

  println!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
  println!();
  println!("Settings:");
  print_stat("Stack", &config.stack_name);
  print_stat("With store", &config.with_store.to_string());
  print_stat("Out dir", &config.out_dir.display().to_string());
  print_stat("Account", config.env.account.as_deref().unwrap_or("(unset)"));
  print_stat("Region", config.env.region.as_deref().unwrap_or("(unset)"));
  println!();
  println!("Function:");
  print_stat("Source", FUNCTION_MANIFEST_PATH);
  print_stat("Runtime", FUNCTION_RUNTIME);
  print_stat("Timeout", &format!("{}s", FUNCTION_TIMEOUT_SECS));
  Ok(())
}
