//! Errors raised while declaring or synthesizing a stack.
//!
//! Failures that only the provisioning engine can observe (name collisions in
//! the account, permission errors, broken build artifacts) are not modeled.

use thiserror::Error;

use crate::token::TokenError;
use crate::util::hash::DirHashError;

#[derive(Debug, Error)]
pub enum DeclareError {
  #[error("construct id '{id}' already exists in scope '{scope}'")]
  DuplicateConstructId { scope: String, id: String },

  #[error("construct id must not be empty")]
  EmptyConstructId,

  #[error("route '{method} {path}' is already declared on '{api}'")]
  DuplicateRoute { api: String, method: String, path: String },

  #[error("invalid route path '{0}': must start with '/'")]
  InvalidRoutePath(String),

  #[error("add_routes on '{0}' requires at least one method")]
  NoMethods(String),

  #[error("logical id '{logical_id}' is allocated by both '{first}' and '{second}'")]
  LogicalIdCollision {
    logical_id: String,
    first: String,
    second: String,
  },

  #[error("'{source_path}' references '{logical_id}', which is not declared in stack '{stack}'")]
  UnresolvedReference {
    stack: String,
    source_path: String,
    logical_id: String,
  },

  #[error("invalid stack name '{0}': must start with a letter and contain only letters, digits and '-' (at most 128 characters)")]
  InvalidStackName(String),

  #[error("stack '{0}' already exists in the app")]
  DuplicateStack(String),

  #[error("bucket '{0}' sets auto_delete_objects without a destroy removal policy")]
  AutoDeleteRequiresDestroy(String),

  #[error("failed to hash asset for '{path}': {source}")]
  Asset {
    path: String,
    #[source]
    source: DirHashError,
  },

  #[error(transparent)]
  Token(#[from] TokenError),

  #[error("failed to serialize template: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeclareError>;
