//! Target path parsing.
//!
//! A path is a dot-separated sequence of segments; each segment is a key
//! optionally followed by a bracketed subscript: a non-negative index
//! (`items[0]`) or the wildcard (`items[*]`). Empty segments between dots
//! are skipped.

use reckon_core::EngineError;

/// One parsed segment of a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub key: String,
    pub sub: Subscript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscript {
    None,
    Index(usize),
    Wildcard,
}

impl PathStep {
    pub fn is_wildcard(&self) -> bool {
        self.sub == Subscript::Wildcard
    }
}

/// Parses a target like `items[*].negotiations[*].percent` into steps.
/// An empty target parses to zero steps.
pub fn parse_path(target: &str) -> Result<Vec<PathStep>, EngineError> {
    let mut steps = Vec::new();
    for seg in target.split('.') {
        let seg = seg.trim();
        if seg.is_empty() {
            continue;
        }

        let Some(open) = seg.find('[') else {
            steps.push(PathStep {
                key: seg.to_string(),
                sub: Subscript::None,
            });
            continue;
        };

        if !seg.ends_with(']') {
            return Err(invalid(seg, "missing closing ]"));
        }
        let key = seg[..open].trim();
        if key.is_empty() {
            return Err(invalid(seg, "empty key"));
        }
        let raw = seg[open + 1..seg.len() - 1].trim();
        let sub = if raw == "*" {
            Subscript::Wildcard
        } else {
            let index: i64 = raw
                .parse()
                .map_err(|_| invalid(seg, "index must be a number or *"))?;
            if index < 0 {
                return Err(invalid(seg, "negative index"));
            }
            Subscript::Index(index as usize)
        };
        steps.push(PathStep {
            key: key.to_string(),
            sub,
        });
    }
    Ok(steps)
}

pub fn has_wildcard(steps: &[PathStep]) -> bool {
    steps.iter().any(PathStep::is_wildcard)
}

fn invalid(segment: &str, reason: &str) -> EngineError {
    EngineError::InvalidPath {
        segment: segment.to_string(),
        reason: reason.to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
