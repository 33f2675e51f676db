//! HTTP methods, path patterns, and route declarations.

use std::fmt;
use std::str::FromStr;

use nom::{
    character::complete::{alpha1, multispace1},
    combinator::rest,
    sequence::separated_pair,
    IResult,
};
use smallvec::SmallVec;
use sprig_core::{RawAttributes, RouteError};

/// HTTP methods a route can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Client attribute that issues this method (`hx-get`, `hx-post`, ...).
    pub fn attribute(&self) -> &'static str {
        match self {
            Method::Get => "hx-get",
            Method::Post => "hx-post",
            Method::Put => "hx-put",
            Method::Patch => "hx-patch",
            Method::Delete => "hx-delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouteError::UnsupportedMethod {
                method: s.to_string(),
            })
    }
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `:name`, matching exactly one non-empty path segment.
    Param(String),
}

/// A compiled path pattern such as `/api/items/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: SmallVec<[Segment; 4]>,
}

impl PathPattern {
    /// Parse and validate a pattern.
    ///
    /// Patterns start with `/`. `/` alone has no segments. Empty segments
    /// (`//`, trailing `/`) and repeated parameter names are rejected.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments: SmallVec<[Segment; 4]> = SmallVec::new();
        if !body.is_empty() {
            for piece in body.split('/') {
                if piece.is_empty() {
                    return Err(invalid("empty path segment"));
                }
                if piece.contains(['?', '#']) {
                    return Err(invalid("query or fragment in pattern"));
                }
                let segment = match piece.strip_prefix(':') {
                    Some(name) => {
                        if !is_param_name(name) {
                            return Err(invalid("parameter names must be identifiers"));
                        }
                        if segments.iter().any(|s| matches!(s, Segment::Param(p) if p == name)) {
                            return Err(RouteError::DuplicateParam {
                                pattern: pattern.to_string(),
                                param: name.to_string(),
                            });
                        }
                        Segment::Param(name.to_string())
                    }
                    None => Segment::Literal(piece.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn param_count(&self) -> usize {
        self.params().count()
    }

    /// Match a request path (without query string), binding parameters.
    ///
    /// Bound values are percent-decoded; a value that does not decode as
    /// UTF-8 is bound as written.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| part.to_string());
                    params.0.push((name.clone(), value));
                }
            }
        }
        Some(params)
    }

    /// Build a concrete path, substituting parameters in order from `args`.
    ///
    /// Arguments are percent-encoded. The caller checks arity.
    pub(crate) fn resolve(&self, args: &[String]) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut args = args.iter();
        let mut path = String::with_capacity(self.source.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Param(_) => {
                    if let Some(arg) = args.next() {
                        path.push_str(&urlencoding::encode(arg));
                    }
                }
            }
        }
        path
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_path(path: &str) -> SmallVec<[&str; 8]> {
    let body = path.strip_prefix('/').unwrap_or(path);
    if body.is_empty() {
        SmallVec::new()
    } else {
        body.split('/').collect()
    }
}

/// Parameters bound by a successful match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(SmallVec<[(String, String); 4]>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn declaration(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(alpha1, multispace1, rest)(input)
}

/// Split a `"METHOD /path"` declaration.
pub fn parse_declaration(decl: &str) -> Result<(Method, &str), RouteError> {
    let (_, (method, path)) =
        declaration(decl.trim()).map_err(|_| RouteError::InvalidDeclaration {
            declaration: decl.to_string(),
            reason: "expected \"METHOD /path\"".to_string(),
        })?;
    let path = path.trim();
    if path.is_empty() || path.contains(char::is_whitespace) {
        return Err(RouteError::InvalidDeclaration {
            declaration: decl.to_string(),
            reason: "expected a single path after the method".to_string(),
        });
    }
    Ok((method.parse()?, path))
}

/// Parse `a=1&b=two+words` into decoded pairs. The first value for a name wins.
///
/// Used for request query strings; hosts can use it for form bodies too.
pub fn parse_query(query: &str) -> RawAttributes {
    let mut pairs = RawAttributes::new();
    for part in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = part.split_once('=').unwrap_or((part, ""));
        let decode = |text: &str| {
            let text = text.replace('+', " ");
            match urlencoding::decode(&text) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => text,
            }
        };
        pairs.entry(decode(name)).or_insert_with(|| decode(value));
    }
    pairs
}
