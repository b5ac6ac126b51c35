//! Diff command implementation.
//!
//! Compares a fresh synthesis against the template on disk and displays
//! added/updated/removed resources and outputs. Nothing is written.

use anyhow::{Context, Result};

use apistack_lib::assembly::{AssemblyStore, TemplateDiff, compute_diff};

use crate::StackArgs;
use crate::output::{Change, print_change, print_info, print_json, symbols};

use super::{declare, resolve_config};

pub fn cmd_diff(args: &StackArgs, json: bool) -> Result<()> {
  let config = resolve_config(args)?;
  let (app, declared) = declare(&config)?;
  let stack_name = declared.stack_name();

  let desired = declared
    .stack(&app)
    .with_context(|| format!("Stack '{}' not declared", stack_name))?
    .synth()
    .context("Failed to synthesize")?;

  let store = AssemblyStore::new(&config.out_dir);
  let current = store
    .load_template(stack_name)
    .with_context(|| format!("Failed to load previous template from {}", config.out_dir.display()))?;

  let diff = compute_diff(&desired, current.as_ref());

  if json {
    let diff_output = serde_json::json!({
      "stack": stack_name,
      "previous": current.is_some(),
      "diff": diff,
    });
    return print_json(&diff_output);
  }

  if current.is_none() {
    print_info(&format!(
      "No previous assembly in {}, every resource is new",
      config.out_dir.display()
    ));
  }
  print_human_diff(stack_name, &diff);
  Ok(())
}

fn print_human_diff(stack_name: &str, diff: &TemplateDiff) {
  println!("Stack {}", stack_name);
  println!();

  if diff.is_empty() {
    println!("No changes.");
    return;
  }

  let resources = diff.resources_to_add.len() + diff.resources_to_update.len() + diff.resources_to_remove.len();
  if resources > 0 {
    println!("Resources:");
    for change in &diff.resources_to_add {
      print_change(Change::Add, &change.logical_id, Some(&change.type_name));
    }
    for change in &diff.resources_to_update {
      print_change(Change::Modify, &change.logical_id, Some(&change.type_name));
    }
    for change in &diff.resources_to_remove {
      print_change(Change::Remove, &change.logical_id, Some(&change.type_name));
    }
    println!();
  }

  let outputs = diff.outputs_added.len() + diff.outputs_changed.len() + diff.outputs_removed.len();
  if outputs > 0 {
    println!("Outputs:");
    for id in &diff.outputs_added {
      print_change(Change::Add, id, None);
    }
    for change in &diff.outputs_changed {
      let subject = format!("{} {} {} {}", change.logical_id, change.before, symbols::ARROW, change.after);
      print_change(Change::Modify, &subject, None);
    }
    for id in &diff.outputs_removed {
      print_change(Change::Remove, id, None);
    }
    println!();
  }

  println!(
    "{} change(s), {} resource(s) unchanged",
    diff.change_count(),
    diff.resources_unchanged.len()
  );
}
