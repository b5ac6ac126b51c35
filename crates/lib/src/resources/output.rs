use crate::construct::allocate_logical_id;
use crate::token::Value;

/// A named value surfaced once the stack is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
  id: String,
  value: Value,
  description: Option<String>,
}

impl Output {
  pub(crate) fn new(id: &str, value: Value) -> Self {
    Self {
      id: id.to_string(),
      value,
      description: None,
    }
  }

  pub(crate) fn with_description(mut self, description: &str) -> Self {
    self.description = Some(description.to_string());
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  /// Outputs sit at the top of the stack, so their logical id is the sanitized id.
  pub fn logical_id(&self) -> String {
    allocate_logical_id(&[self.id.as_str()])
  }
}
