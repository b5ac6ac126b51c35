//! Parsing of `Fn::Sub` template strings.
//!
//! # Variable Formats
//!
//! - `${LogicalId}` - physical id of a resource in the same template
//! - `${LogicalId.Attribute}` - attribute of a resource
//! - `${AWS::Region}` - pseudo parameter
//!
//! # Escaping
//!
//! `${!Text}` produces the literal `${Text}`. A `$` not followed by `{`
//! passes through unchanged.

use super::TokenError;

/// A variable referenced from a `Sub` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubVar {
  /// `${AWS::Name}`
  Pseudo(String),

  /// `${LogicalId}`
  Ref(String),

  /// `${LogicalId.Attribute}`
  GetAtt { logical_id: String, attribute: String },
}

impl SubVar {
  /// Logical id this variable depends on, if it names a resource.
  pub fn logical_id(&self) -> Option<&str> {
    match self {
      SubVar::Pseudo(_) => None,
      SubVar::Ref(id) => Some(id),
      SubVar::GetAtt { logical_id, .. } => Some(logical_id),
    }
  }
}

/// A segment of a parsed `Sub` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubSegment {
  Literal(String),
  Var(SubVar),
}

/// Parse a `Sub` template into segments.
pub fn parse(input: &str) -> Result<Vec<SubSegment>, TokenError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' || !matches!(chars.peek(), Some((_, '{'))) {
      literal.push(ch);
      continue;
    }

    chars.next(); // consume the {

    let mut content = String::new();
    let mut found_close = false;
    for (_, c) in chars.by_ref() {
      if c == '}' {
        found_close = true;
        break;
      }
      content.push(c);
    }

    if !found_close {
      return Err(TokenError::Unclosed(pos));
    }

    if let Some(escaped) = content.strip_prefix('!') {
      literal.push_str("${");
      literal.push_str(escaped);
      literal.push('}');
      continue;
    }

    if !literal.is_empty() {
      segments.push(SubSegment::Literal(std::mem::take(&mut literal)));
    }
    segments.push(SubSegment::Var(parse_var(&content)?));
  }

  if !literal.is_empty() {
    segments.push(SubSegment::Literal(literal));
  }

  Ok(segments)
}

fn parse_var(content: &str) -> Result<SubVar, TokenError> {
  if content.is_empty() {
    return Err(TokenError::Malformed("empty variable".to_string()));
  }

  if content.starts_with("AWS::") {
    return Ok(SubVar::Pseudo(content.to_string()));
  }

  match content.split_once('.') {
    Some((logical_id, attribute)) if !logical_id.is_empty() && !attribute.is_empty() => Ok(SubVar::GetAtt {
      logical_id: logical_id.to_string(),
      attribute: attribute.to_string(),
    }),
    Some(_) => Err(TokenError::Malformed(format!("invalid attribute reference '{content}'"))),
    None => Ok(SubVar::Ref(content.to_string())),
  }
}
