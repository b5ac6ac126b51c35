//! Reading and writing assemblies on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::template::Template;

use super::{ASSEMBLY_VERSION, AssemblyError, AssemblyManifest, CloudAssembly, MANIFEST_FILENAME, template_file_name};

/// An assembly directory.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never sees a half-written template.
#[derive(Debug, Clone)]
pub struct AssemblyStore {
  base_path: PathBuf,
}

impl AssemblyStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  fn manifest_path(&self) -> PathBuf {
    self.base_path.join(MANIFEST_FILENAME)
  }

  fn template_path(&self, stack: &str) -> PathBuf {
    self.base_path.join(template_file_name(stack))
  }

  pub fn exists(&self) -> bool {
    self.manifest_path().exists()
  }

  /// Write every template, then the manifest that lists them.
  pub fn write(&self, assembly: &CloudAssembly) -> Result<(), AssemblyError> {
    fs::create_dir_all(&self.base_path).map_err(AssemblyError::CreateDir)?;

    for (stack, template) in &assembly.templates {
      let path = self.template_path(stack);
      write_json_atomic(&path, template)?;
      debug!(stack = %stack, path = %path.display(), "wrote template");
    }
    write_json_atomic(&self.manifest_path(), &assembly.manifest)?;

    info!(path = %self.base_path.display(), stacks = assembly.templates.len(), "assembly written");
    Ok(())
  }

  /// Load the manifest.
  ///
  /// Returns `Ok(None)` if nothing has been written yet.
  pub fn load_manifest(&self) -> Result<Option<AssemblyManifest>, AssemblyError> {
    let Some(manifest) = read_json::<AssemblyManifest>(&self.manifest_path())? else {
      return Ok(None);
    };

    if manifest.version != ASSEMBLY_VERSION {
      return Err(AssemblyError::UnsupportedVersion(manifest.version));
    }
    Ok(Some(manifest))
  }

  /// Load a stack's template. Returns `Ok(None)` if it was never written.
  pub fn load_template(&self, stack: &str) -> Result<Option<Template>, AssemblyError> {
    read_json(&self.template_path(stack))
  }

  /// Load the manifest and every template it lists.
  pub fn load(&self) -> Result<Option<CloudAssembly>, AssemblyError> {
    let Some(manifest) = self.load_manifest()? else {
      return Ok(None);
    };

    let mut assembly = CloudAssembly {
      manifest,
      ..CloudAssembly::default()
    };
    for stack in assembly.manifest.artifacts.keys() {
      let template = self
        .load_template(stack)?
        .ok_or_else(|| AssemblyError::StackNotFound(stack.clone()))?;
      assembly.templates.insert(stack.clone(), template);
    }
    Ok(Some(assembly))
  }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AssemblyError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(AssemblyError::Read {
        path: path.display().to_string(),
        source,
      });
    }
  };

  serde_json::from_str(&content).map(Some).map_err(|source| AssemblyError::Parse {
    path: path.display().to_string(),
    source,
  })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AssemblyError> {
  let write_err = |source: io::Error| AssemblyError::Write {
    path: path.display().to_string(),
    source,
  };

  let mut content = serde_json::to_string_pretty(value)?;
  content.push('\n');

  let temp_path = path.with_extension("json.tmp");
  fs::write(&temp_path, &content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;
  Ok(())
}
