//! Implementation of the `apistack synth` command.
//!
//! Declares the stack, synthesizes it and writes the cloud assembly to the
//! output directory.

use anyhow::{Context, Result};

use apistack_lib::assembly::{AssemblyStore, template_file_name};

use crate::StackArgs;
use crate::output::{print_json, print_stat, print_success, truncate_hash};

use super::{declare, resolve_config};

pub fn cmd_synth(args: &StackArgs, json: bool) -> Result<()> {
  let config = resolve_config(args)?;
  let (app, declared) = declare(&config)?;

  let assembly = app.synth().context("Failed to synthesize")?;

  let store = AssemblyStore::new(&config.out_dir);
  store
    .write(&assembly)
    .with_context(|| format!("Failed to write assembly to {}", config.out_dir.display()))?;

  let stack = declared.stack_name();
  let template = assembly
    .template(stack)
    .with_context(|| format!("Stack '{}' missing from assembly", stack))?;

  if json {
    return print_json(template);
  }

  let out_dir = dunce::canonicalize(&config.out_dir).unwrap_or_else(|_| config.out_dir.clone());
  let hash = &assembly.manifest.artifacts[stack].template_hash;

  print_success(&format!("Synthesized {}", stack));
  print_stat("Resources", &template.resources.len().to_string());
  print_stat("Outputs", &template.outputs.len().to_string());
  print_stat("Template", &out_dir.join(template_file_name(stack)).display().to_string());
  print_stat("Hash", truncate_hash(&hash.0));

  Ok(())
}
