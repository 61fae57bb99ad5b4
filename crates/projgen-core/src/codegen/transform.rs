//! # Transformation Registry
//!
//! User-supplied decode hooks for specific native types.
//!
//! A transformation replaces the generated projection of a native type with a
//! hand-written decoder class, e.g. `std::basic_string<...>` -> `StdString`.
//! Entries are keyed by a native name pattern in which `${name}` placeholders
//! match exactly one template argument:
//!
//! ```rust
//! use projgen_core::codegen::TransformationRegistry;
//!
//! let mut registry = TransformationRegistry::new();
//! registry.register("std::vector<${T},${A}>", "StdVector<${T}>", false)?;
//!
//! let hit = registry.lookup("std::vector<int, std::allocator<int> >").unwrap();
//! assert_eq!(hit.target, "StdVector<int>");
//! # Ok::<(), projgen_core::error::ConfigError>(())
//! ```
//!
//! Exact names win over patterns; among patterns the earliest registration
//! wins.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ConfigError;
use crate::symbols::names;

/// A resolved transformation for one native type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Transformation
{
    /// Generated type text of the decoder class, placeholders substituted
    pub target: String,
    /// The decoder also accepts the raw buffer triple
    pub physical_constructor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment
{
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone)]
struct Rule
{
    segments: Vec<Segment>,
    target: String,
    physical_constructor: bool,
}

/// Lookup from native type names to registered transformations.
#[derive(Debug, Clone, Default)]
pub struct TransformationRegistry
{
    exact: HashMap<String, Transformation>,
    patterns: Vec<Rule>,
    seen: Vec<String>,
}

impl TransformationRegistry
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register a transformation for every native type matching `native`.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::InvalidPattern`] for an unterminated or empty placeholder
    /// - [`ConfigError::DuplicateTransformation`] if the same pattern is
    ///   already registered (whitespace differences do not count)
    pub fn register(&mut self, native: &str, target: &str, physical_constructor: bool) -> Result<(), ConfigError>
    {
        let segments = parse_pattern(native)?;
        let key = normalize(native);
        if self.seen.contains(&key) {
            return Err(ConfigError::DuplicateTransformation(native.to_string()));
        }
        self.seen.push(key.clone());

        if segments.iter().all(|segment| matches!(segment, Segment::Literal(_))) {
            self.exact.insert(
                key,
                Transformation {
                    target: target.to_string(),
                    physical_constructor,
                },
            );
        } else {
            self.patterns.push(Rule {
                segments,
                target: target.to_string(),
                physical_constructor,
            });
        }
        Ok(())
    }

    /// Find the transformation for a native type name.
    pub fn lookup(&self, native_name: &str) -> Option<Transformation>
    {
        let name = normalize(native_name);
        if let Some(hit) = self.exact.get(&name) {
            return Some(hit.clone());
        }

        self.patterns.iter().find_map(|rule| {
            let mut captures = Vec::new();
            if !match_segments(&rule.segments, &name, &mut captures) {
                return None;
            }
            let mut target = rule.target.clone();
            for (placeholder, value) in &captures {
                target = target.replace(&format!("${{{placeholder}}}"), &names::class_name(value, ""));
            }
            Some(Transformation {
                target,
                physical_constructor: rule.physical_constructor,
            })
        })
    }

    pub fn len(&self) -> usize
    {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, ConfigError>
{
    let invalid = |reason: &str| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let normalized = normalize(pattern);
    let mut segments = Vec::new();
    let mut rest = normalized.as_str();
    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| invalid("unterminated `${` placeholder"))?;
        let name = after[..end].trim();
        if name.is_empty() {
            return Err(invalid("placeholder has no name"));
        }
        if matches!(segments.last(), Some(Segment::Placeholder(_))) {
            return Err(invalid("adjacent placeholders are ambiguous"));
        }
        segments.push(Segment::Placeholder(name.to_string()));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    if segments.is_empty() {
        return Err(invalid("pattern is empty"));
    }
    Ok(segments)
}

fn match_segments(segments: &[Segment], text: &str, captures: &mut Vec<(String, String)>) -> bool
{
    let Some((first, rest)) = segments.split_first() else {
        return text.is_empty();
    };

    match first {
        Segment::Literal(literal) => text
            .strip_prefix(literal.as_str())
            .is_some_and(|remaining| match_segments(rest, remaining, captures)),
        Segment::Placeholder(name) => {
            for end in argument_ends(text) {
                let value = &text[..end];
                let consistent = captures
                    .iter()
                    .all(|(existing, captured)| existing != name || captured == value);
                if !consistent {
                    continue;
                }
                captures.push((name.clone(), value.to_string()));
                if match_segments(rest, &text[end..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

/// Candidate end positions for a single balanced template argument at the
/// start of `text`.
fn argument_ends(text: &str) -> Vec<usize>
{
    let mut ends = Vec::new();
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            ',' if depth == 0 => break,
            _ => {}
        }
        if depth == 0 {
            ends.push(i + c.len_utf8());
        }
    }
    ends
}

/// Drop whitespace that does not separate two identifier characters, so
/// `a<b, c<d> >` and `a<b,c<d>>` compare equal while `unsigned int` survives.
fn normalize(name: &str) -> String
{
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let previous = out.chars().last();
            let next = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
            let separates_words = previous.is_some_and(is_word) && next.is_some_and(is_word);
            if separates_words && previous != Some(' ') {
                out.push(' ');
            }
            continue;
        }
        out.push(c);
    }
    out
}
