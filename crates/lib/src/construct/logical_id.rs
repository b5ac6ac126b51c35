use crate::util::hash::path_suffix;

/// Path components left out of the readable part of a logical id.
const HIDDEN_COMPONENTS: &[&str] = &["Resource", "Default"];

/// Path component left out of both the readable part and the hash.
const HIDDEN_FROM_HASH: &str = "Default";

/// Strip everything that is not ASCII alphanumeric.
pub fn sanitize(id: &str) -> String {
  id.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Allocate a template logical id for a construct path within a stack.
///
/// Top-level constructs (a single path component) keep their sanitized id,
/// so an output declared as `api_url` becomes `apiurl`. Nested constructs get
/// the readable concatenation of their path followed by an 8-character hash
/// of the full path: `["api_lambda", "Resource"]` becomes `apilambda` plus
/// suffix.
pub fn allocate_logical_id(path: &[&str]) -> String {
  if path.len() == 1 {
    return sanitize(path[0]);
  }

  let mut readable: Vec<&str> = Vec::new();
  for &component in path {
    if HIDDEN_COMPONENTS.contains(&component) {
      continue;
    }
    // Repeated components ("items_bucket/items_bucket") read once.
    if readable.last() == Some(&component) {
      continue;
    }
    readable.push(component);
  }

  let hashed: Vec<&str> = path.iter().copied().filter(|c| *c != HIDDEN_FROM_HASH).collect();

  let human: String = readable.iter().map(|c| sanitize(c)).collect::<String>();
  format!("{}{}", human, path_suffix(&hashed))
}
