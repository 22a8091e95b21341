//! Path template matching.
//!
//! # Responsibilities
//! - Compile a route template with `{name}` placeholders
//! - Match a concrete request path against a compiled template
//! - Return captured placeholder values or an explicit no-match
//!
//! # Design Decisions
//! - A placeholder captures exactly one non-empty path segment (never crosses `/`)
//! - Literal segments match exactly (case-sensitive)
//! - Empty template matches only the root (`""` or `"/"`)
//! - No prefix matching, no query strings, no regex
//! - Pure: compiled templates hold no mutable state

use std::fmt;

/// Error produced when a template cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{` or `}` appears without its partner, or inside a larger segment.
    #[error("malformed placeholder in segment '{segment}' of template '{template}'")]
    MalformedPlaceholder { template: String, segment: String },

    /// `{}` with no name.
    #[error("empty placeholder name in template '{0}'")]
    EmptyName(String),

    /// The same placeholder name appears twice.
    #[error("duplicate placeholder '{name}' in template '{template}'")]
    DuplicateName { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template such as `/users/{id}`.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let trimmed = template.trim_start_matches('/');

        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                segments.push(Self::compile_segment(template, part)?);
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for segment in &segments {
            if let Segment::Capture(name) = segment {
                if seen.contains(&name.as_str()) {
                    return Err(TemplateError::DuplicateName {
                        template: template.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(name);
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    fn compile_segment(template: &str, part: &str) -> Result<Segment, TemplateError> {
        let opens = part.matches('{').count();
        let closes = part.matches('}').count();

        if opens == 0 && closes == 0 {
            return Ok(Segment::Literal(part.to_string()));
        }

        match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some(name) if opens == 1 && closes == 1 => {
                if name.is_empty() {
                    Err(TemplateError::EmptyName(template.to_string()))
                } else {
                    Ok(Segment::Capture(name.to_string()))
                }
            }
            _ => Err(TemplateError::MalformedPlaceholder {
                template: template.to_string(),
                segment: part.to_string(),
            }),
        }
    }

    /// The template text as written at registration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if both templates accept exactly the same paths. Leading
    /// slashes and placeholder names do not matter.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Capture(_), Segment::Capture(_)) => true,
                    _ => false,
                })
    }

    /// True if this template declares a placeholder with the given name.
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Capture(n) if n == name))
    }

    /// Match a concrete path, returning the captured values on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        if self.segments.is_empty() {
            return (path.is_empty() || path == "/").then(PathParams::default);
        }

        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = PathParams::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(expected) => {
                    if part != expected {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name.clone(), part.to_string());
                }
            }
        }

        // Leftover segments mean the path is longer than the template.
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

/// Values captured by a successful template match, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    /// Look up the raw captured string for a placeholder.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
