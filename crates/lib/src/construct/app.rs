use std::collections::BTreeMap;

use tracing::info;

use crate::assembly::CloudAssembly;
use crate::error::{DeclareError, Result};

use super::stack::{Stack, StackProps};

const MAX_STACK_NAME_LEN: usize = 128;

/// CloudFormation stack names: a letter, then letters, digits or `-`.
/// The name also becomes the template file name in the assembly.
fn is_valid_stack_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if first.is_ascii_alphabetic() => {}
    _ => return false,
  }
  name.len() <= MAX_STACK_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Root scope. Owns every stack declared in one run.
#[derive(Debug, Default)]
pub struct App {
  stacks: BTreeMap<String, Stack>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new, empty stack and return it for declaration.
  pub fn add_stack(&mut self, name: &str, props: StackProps) -> Result<&mut Stack> {
    if name.is_empty() {
      return Err(DeclareError::EmptyConstructId);
    }
    if !is_valid_stack_name(name) {
      return Err(DeclareError::InvalidStackName(name.to_string()));
    }
    if self.stacks.contains_key(name) {
      return Err(DeclareError::DuplicateStack(name.to_string()));
    }
    Ok(
      self
        .stacks
        .entry(name.to_string())
        .or_insert_with(|| Stack::new(name, props)),
    )
  }

  pub fn stack(&self, name: &str) -> Option<&Stack> {
    self.stacks.get(name)
  }

  pub fn stack_mut(&mut self, name: &str) -> Option<&mut Stack> {
    self.stacks.get_mut(name)
  }

  pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
    self.stacks.values()
  }

  /// Synthesize every stack into a cloud assembly.
  pub fn synth(&self) -> Result<CloudAssembly> {
    let mut assembly = CloudAssembly::default();
    for stack in self.stacks.values() {
      let template = stack.synth()?;
      assembly.add_stack(stack.name(), &stack.environment(), template)?;
    }
    info!(stacks = assembly.templates.len(), "app synthesized");
    Ok(assembly)
  }
}
