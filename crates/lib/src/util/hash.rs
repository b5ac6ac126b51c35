//! Hashing utilities for templates, assets and logical ids.
//!
//! This module provides:
//! - `ObjectHash`: a truncated 20-character hash identifying a synthesized object
//! - `ContentHash`: a full 64-character hash of file or directory content
//! - `hash_directory()`: deterministic hash of a build output directory
//! - `hash_bytes()`: hash of arbitrary bytes
//! - `path_suffix()`: the uppercase suffix that keeps nested logical ids unique

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::{LOGICAL_ID_HASH_LEN, OBJ_HASH_PREFIX_LEN};

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying a synthesized object.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized value,
/// lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(ObjectHash(full.0[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

impl Hashable for serde_json::Value {}

/// A full 64-character SHA-256 hash of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error during directory hashing.
#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Compute a deterministic hash of a directory's contents.
///
/// File contents, relative paths and symlinks contribute; metadata does not.
/// A symlink records its target and, when the target is a file, that file's
/// content. Entries whose file name appears in `exclude` are skipped together
/// with everything beneath them, so `&["target"]` ignores a cargo build
/// directory.
pub fn hash_directory(path: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let mut entries: Vec<String> = Vec::new();

  let walker = WalkDir::new(path).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !exclude.contains(&name))
      .unwrap_or(true)
  });

  for entry in walker {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    if file_type.is_file() {
      let content_hash = hash_file(entry_path)?;
      entries.push(format!("F:{}:{}", rel_path, content_hash.0));
    } else if file_type.is_dir() {
      entries.push(format!("D:{}", rel_path));
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      let target_hash = hash_bytes(target.to_string_lossy().as_bytes());
      // Dangling links and links to directories hash by target only.
      let content_hash = if entry_path.is_file() {
        hash_file(entry_path)?.0
      } else {
        String::new()
      };
      entries.push(format!("L:{}:{}:{}", rel_path, target_hash.0, content_hash));
    }
  }

  entries.sort();

  let mut hasher = Sha256::new();
  for entry in entries {
    hasher.update(entry.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |e: std::io::Error| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}

/// Uppercase hash suffix for a construct path.
///
/// Path components are joined with `/` before hashing so `["a", "bc"]` and
/// `["ab", "c"]` never collide.
pub fn path_suffix(components: &[&str]) -> String {
  let joined = components.join("/");
  hash_bytes(joined.as_bytes()).0[..LOGICAL_ID_HASH_LEN].to_uppercase()
}
