//! Cloud assembly: the synthesized output handed to a provisioning engine.
//!
//! # Layout
//!
//! ```text
//! {out_dir}/
//! ├── manifest.json                # AssemblyManifest: one artifact per stack
//! └── <stack>.template.json        # Template for each stack
//! ```
//!
//! The manifest records each template's content hash so a later run can tell
//! whether anything changed without re-reading every template.

mod diff;
mod storage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::construct::Environment;
use crate::error::DeclareError;
use crate::template::Template;
use crate::util::hash::{Hashable, ObjectHash};

pub use diff::{OutputChange, ResourceChange, TemplateDiff, compute_diff};
pub use storage::AssemblyStore;

/// Current version of the manifest format.
pub const ASSEMBLY_VERSION: u32 = 1;

pub const MANIFEST_FILENAME: &str = "manifest.json";

const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

/// Errors reading or writing an assembly directory.
#[derive(Debug, Error)]
pub enum AssemblyError {
  #[error("failed to create assembly directory: {0}")]
  CreateDir(#[source] std::io::Error),

  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("unsupported assembly version: {0} (expected {ASSEMBLY_VERSION})")]
  UnsupportedVersion(u32),

  #[error("stack '{0}' is not in the assembly")]
  StackNotFound(String),
}

/// One deployable stack in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackArtifact {
  #[serde(rename = "type")]
  pub artifact_type: String,
  pub environment: String,
  pub template_file: String,
  pub template_hash: ObjectHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyManifest {
  pub version: u32,
  pub artifacts: BTreeMap<String, StackArtifact>,
}

impl Default for AssemblyManifest {
  fn default() -> Self {
    Self {
      version: ASSEMBLY_VERSION,
      artifacts: BTreeMap::new(),
    }
  }
}

/// Result of synthesizing an app, before it is written anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudAssembly {
  pub manifest: AssemblyManifest,
  pub templates: BTreeMap<String, Template>,
}

impl CloudAssembly {
  pub(crate) fn add_stack(
    &mut self,
    name: &str,
    environment: &Environment,
    template: Template,
  ) -> Result<(), DeclareError> {
    let template_hash = template.compute_hash()?;
    self.manifest.artifacts.insert(
      name.to_string(),
      StackArtifact {
        artifact_type: STACK_ARTIFACT_TYPE.to_string(),
        environment: environment.to_uri(),
        template_file: template_file_name(name),
        template_hash,
      },
    );
    self.templates.insert(name.to_string(), template);
    Ok(())
  }

  pub fn template(&self, stack: &str) -> Option<&Template> {
    self.templates.get(stack)
  }
}

pub fn template_file_name(stack: &str) -> String {
  format!("{stack}.template.json")
}
