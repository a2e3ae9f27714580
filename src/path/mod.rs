//! # Path Matcher
//!
//! Compiles a route path pattern (`/users/:id`, `/static/*path`) into a sequence
//! of [`Segment`]s and matches it against an incoming request path, extracting
//! bound parameters along the way.
//!
//! Patterns are compiled once, at route registration, and matched many times on
//! the request hot path — matching allocates nothing but the returned parameter
//! list, which is a [`ParamVec`] backed by inline storage for the common case of
//! a handful of parameters.

use crate::error::HttpError;
use smallvec::SmallVec;
use std::sync::Arc;

/// A single path parameter binding: `name -> value`.
pub type Param = (Arc<str>, String);

/// Path parameters extracted by a match. Inline storage avoids a heap
/// allocation for the overwhelming majority of routes, which bind a small,
/// fixed number of parameters.
pub type ParamVec = SmallVec<[Param; 8]>;

/// One segment of a compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal path component that must match exactly.
    Static(Arc<str>),
    /// A single required path component, bound to `name`.
    Parameter(Arc<str>),
    /// Consumes all remaining components (zero or more), bound to `name`.
    /// Always the final segment of a pattern.
    Wildcard(Arc<str>),
}

impl Segment {
    /// Contribution of this segment to a route's specificity score.
    fn weight(&self) -> u32 {
        match self {
            Segment::Static(_) => 3,
            Segment::Parameter(_) => 2,
            Segment::Wildcard(_) => 1,
        }
    }
}

/// A compiled path pattern: an ordered list of segments plus the derived
/// specificity score used to order routes that could both match a path.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub raw: String,
    pub segments: Vec<Segment>,
    pub score: u32,
}

impl Pattern {
    /// Parse and normalize a raw path pattern.
    ///
    /// Normalization: duplicate slashes collapse, a trailing slash is dropped
    /// except for the root pattern itself. A wildcard segment is only valid as
    /// the final segment; a mid-pattern wildcard is a malformed registration,
    /// reported as an [`HttpError`] rather than a panic so a caller building
    /// routes from untrusted or generated input can recover.
    pub fn parse(raw: &str) -> Result<Pattern, HttpError> {
        let normalized = normalize(raw);
        let mut segments = Vec::new();
        let parts: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        for (i, part) in parts.iter().enumerate() {
            let is_last = i == parts.len() - 1;
            if let Some(name) = part.strip_prefix(':') {
                segments.push(Segment::Parameter(Arc::from(name)));
            } else if *part == "*" {
                segments.push(Segment::Wildcard(Arc::from("*")));
            } else if let Some(name) = part.strip_prefix('*') {
                segments.push(Segment::Wildcard(Arc::from(name)));
            } else {
                segments.push(Segment::Static(Arc::from(*part)));
            }
            if !is_last {
                if let Some(Segment::Wildcard(_)) = segments.last() {
                    return Err(HttpError::internal(format!(
                        "wildcard segment must be the last segment of a path pattern: {raw}"
                    )));
                }
            }
        }

        let score = segments.iter().map(Segment::weight).sum::<u32>() * 10 + segments.len() as u32;

        Ok(Pattern {
            raw: normalized,
            segments,
            score,
        })
    }

    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Static(_)))
    }
}

/// Collapse duplicate slashes and drop a trailing slash, except for the root.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Result of matching a pattern against a path.
#[derive(Debug, Clone)]
pub struct Matched {
    pub params: ParamVec,
}

/// Match `pattern` against `path`, returning bound parameters on success.
///
/// Segments compare positionally; a wildcard consumes every
/// remaining path component (possibly zero) joined by `/`. Without a
/// wildcard, segment counts must match exactly.
pub fn match_path(pattern: &Pattern, path: &str) -> Option<Matched> {
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = ParamVec::new();

    for (i, seg) in pattern.segments.iter().enumerate() {
        match seg {
            Segment::Wildcard(name) => {
                let rest = path_parts.get(i..).unwrap_or(&[]).join("/");
                params.push((Arc::clone(name), rest));
                return Some(Matched { params });
            }
            Segment::Static(lit) => {
                let got = path_parts.get(i)?;
                if got != &lit.as_ref() {
                    return None;
                }
            }
            Segment::Parameter(name) => {
                let got = path_parts.get(i)?;
                params.push((Arc::clone(name), (*got).to_string()));
            }
        }
    }

    if path_parts.len() != pattern.segments.len() {
        return None;
    }

    Some(Matched { params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_static_route() {
        let p = Pattern::parse("/users").unwrap();
        assert!(match_path(&p, "/users").is_some());
        assert!(match_path(&p, "/users/1").is_none());
    }

    #[test]
    fn binds_a_single_parameter() {
        let p = Pattern::parse("/users/:id").unwrap();
        let m = match_path(&p, "/users/42").unwrap();
        assert_eq!(m.params[0].1, "42");
        assert_eq!(&*m.params[0].0, "id");
    }

    #[test]
    fn rejects_missing_parameter_segment() {
        let p = Pattern::parse("/users/:id").unwrap();
        assert!(match_path(&p, "/users").is_none());
    }

    #[test]
    fn trailing_wildcard_captures_remainder() {
        let p = Pattern::parse("/static/*path").unwrap();
        let m = match_path(&p, "/static/a/b/c.js").unwrap();
        assert_eq!(m.params[0].1, "a/b/c.js");
    }

    #[test]
    fn wildcard_matches_empty_remainder() {
        let p = Pattern::parse("/static/*path").unwrap();
        let m = match_path(&p, "/static").unwrap();
        assert_eq!(m.params[0].1, "");
    }

    #[test]
    fn unnamed_wildcard_binds_star() {
        let p = Pattern::parse("/files/*").unwrap();
        let m = match_path(&p, "/files/a/b").unwrap();
        assert_eq!(&*m.params[0].0, "*");
    }

    #[test]
    fn normalize_collapses_duplicate_slashes_and_trailing_slash() {
        assert_eq!(normalize("//users//1/"), "/users/1");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn specificity_prefers_static_over_parameter() {
        let static_score = Pattern::parse("/users/admin").unwrap().score;
        let param_score = Pattern::parse("/users/:id").unwrap().score;
        assert!(static_score > param_score);
    }

    #[test]
    fn specificity_prefers_parameter_over_wildcard() {
        let param_score = Pattern::parse("/users/:id").unwrap().score;
        let wildcard_score = Pattern::parse("/users/*rest").unwrap().score;
        assert!(param_score > wildcard_score);
    }

    #[test]
    fn mid_pattern_wildcard_is_a_recoverable_error() {
        let err = Pattern::parse("/files/*rest/info").unwrap_err();
        assert_eq!(err.status, 500);
    }
}
