//! Style table compilation.
//!
//! Each entry is either a bare declaration block (`{ color: red; }`, braces
//! optional) or a full rule with its own selector (`.btn:hover { ... }`,
//! `@media ... { ... }`). Bare blocks are wrapped in a class selector built from
//! the key; full rules pass through and contribute the first class they name.

use std::ops::Index;

use indexmap::IndexMap;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::recognize,
    sequence::{pair, preceded},
    IResult,
};
use sprig_core::{naming::class_name, StyleError};
use tracing::debug;

/// Ordered `logical key -> CSS text` table as authored on a component.
pub type StyleTable = IndexMap<String, String>;

/// Logical style key -> generated class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    classes: IndexMap<String, String>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class name for a logical key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.classes.get(key).map(String::as_str)
    }

    /// Class name for a logical key, or an error naming the key. Render
    /// functions use this with `?`.
    pub fn class(&self, key: &str) -> Result<&str, StyleError> {
        self.get(key).ok_or_else(|| StyleError::UnknownKey {
            key: key.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.classes.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Panics if `key` has no class, like map indexing.
impl Index<&str> for ClassMap {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        match self.get(key) {
            Some(class) => class,
            None => panic!("no style key '{}' in class map", key),
        }
    }
}

/// Output of [`compile_styles`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledStyles {
    /// Stylesheet text, one rule per entry in input order.
    pub css: String,
    pub classes: ClassMap,
}

/// Compile a style table into CSS and a class map.
///
/// The result depends only on the input, so repeated compilation yields
/// identical output.
pub fn compile_styles(styles: &StyleTable) -> Result<CompiledStyles, StyleError> {
    let mut rules = Vec::with_capacity(styles.len());
    let mut classes = IndexMap::with_capacity(styles.len());
    // Generated class -> key that generated it, for bare blocks only.
    let mut generated: IndexMap<String, &str> = IndexMap::new();

    for (key, text) in styles {
        if !is_balanced(text) {
            return Err(StyleError::UnbalancedBlock { key: key.clone() });
        }
        let text = text.trim();

        let (class, rule) = match bare_body(text) {
            Some(body) => {
                let class = class_name(key);
                if let Some(first) = generated.insert(class.clone(), key.as_str()) {
                    return Err(StyleError::ClassCollision {
                        class,
                        first: first.to_string(),
                        second: key.clone(),
                    });
                }
                let rule = if body.is_empty() {
                    format!(".{} {{}}", class)
                } else {
                    format!(".{} {{ {} }}", class, body)
                };
                (class, rule)
            }
            None => {
                let class = match leading_class(text) {
                    Some(class) => class.to_string(),
                    None => {
                        debug!(key = %key, "no class selector in rule, using key-derived class");
                        class_name(key)
                    }
                };
                (class, text.to_string())
            }
        };

        classes.insert(key.clone(), class);
        rules.push(rule);
    }

    Ok(CompiledStyles {
        css: rules.join("\n"),
        classes: ClassMap { classes },
    })
}

/// Declarations of a bare block, or `None` for a full rule.
fn bare_body(text: &str) -> Option<&str> {
    if !text.contains('{') {
        return Some(text);
    }
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    // `{ a } .x { b }` opens again after closing: not a single block.
    if is_balanced(inner) {
        Some(inner.trim())
    } else {
        None
    }
}

/// First `.class` token in a rule's selector.
///
/// At-rules carry their selectors inside the block, so the whole rule is
/// searched.
pub fn leading_class(rule: &str) -> Option<&str> {
    let scope = if rule.starts_with('@') {
        rule
    } else {
        rule.split('{').next().unwrap_or(rule)
    };
    scope
        .match_indices('.')
        .find_map(|(at, _)| class_token(&scope[at..]).ok().map(|(_, class)| class))
}

fn class_token(input: &str) -> IResult<&str, &str> {
    preceded(
        char('.'),
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '-'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        )),
    )(input)
}

/// Braces balance outside of strings and comments.
fn is_balanced(text: &str) -> bool {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && quote.is_none()
}
