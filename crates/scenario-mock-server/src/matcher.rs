//! HTTP request matching.
//!
//! Mock urls are path templates (`/users/:id`, `/files/:path*`,
//! `/items/:id(\d+)`, `/(.*)`) or raw regular expressions. Templates compile
//! to case-insensitive regexes which tolerate one trailing `/`. Each capture
//! becomes a named parameter; unnamed groups are numbered from `0`.
//!
//! Routes are tried in registration order and the first match wins.

use crate::mock::{HttpMethod, HttpRoute, MockUrl};
use regex::Regex;
use std::collections::HashMap;

const DEFAULT_SEGMENT: &str = "[^/#?]+?";

/// Compiled matcher for a single mock url
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    /// Parameter name for capture group `p{index}`
    keys: Vec<String>,
    /// Raw regex urls use positional captures rather than `p{index}` groups
    positional: bool,
}

enum Modifier {
    None,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

impl PathMatcher {
    pub fn compile(url: &MockUrl) -> Result<Self, regex::Error> {
        match url {
            MockUrl::Template(template) => Self::compile_template(template),
            MockUrl::Pattern(regex) => Ok(Self::from_regex(regex.clone())),
        }
    }

    fn from_regex(regex: Regex) -> Self {
        let mut unnamed = 0usize;
        let keys = regex
            .capture_names()
            .skip(1)
            .map(|name| match name {
                Some(name) => name.to_string(),
                None => {
                    let key = unnamed.to_string();
                    unnamed += 1;
                    key
                }
            })
            .collect();
        Self {
            regex,
            keys,
            positional: true,
        }
    }

    fn compile_template(template: &str) -> Result<Self, regex::Error> {
        let chars: Vec<char> = template.chars().collect();
        let mut pattern = String::from("(?i)^");
        let mut literal = String::new();
        let mut keys = Vec::new();
        let mut unnamed = 0usize;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\\' if i + 1 < chars.len() => {
                    literal.push(chars[i + 1]);
                    i += 2;
                }
                ':' if chars.get(i + 1).is_some_and(|n| is_name_char(*n)) => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_name_char(chars[end]) {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    i = end;
                    let custom = if chars.get(i) == Some(&'(') {
                        let (group, next) = read_group(&chars, i);
                        i = next;
                        Some(group)
                    } else {
                        None
                    };
                    let modifier = read_modifier(&chars, &mut i);
                    push_param(
                        &mut pattern,
                        &mut literal,
                        &mut keys,
                        name,
                        custom,
                        modifier,
                    );
                }
                '(' => {
                    let (group, next) = read_group(&chars, i);
                    i = next;
                    let modifier = read_modifier(&chars, &mut i);
                    let name = unnamed.to_string();
                    unnamed += 1;
                    push_param(
                        &mut pattern,
                        &mut literal,
                        &mut keys,
                        name,
                        Some(group),
                        modifier,
                    );
                }
                _ => {
                    literal.push(c);
                    i += 1;
                }
            }
        }

        if literal.ends_with('/') && literal.len() > 1 {
            literal.pop();
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push_str("[/#?]?$");

        Ok(Self {
            regex: Regex::new(&pattern)?,
            keys,
            positional: false,
        })
    }

    /// Match `path`, returning percent-decoded parameters on success.
    /// Optional parameters that did not participate are omitted.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut params = HashMap::new();
        for (index, key) in self.keys.iter().enumerate() {
            let capture = if self.positional {
                captures.get(index + 1)
            } else {
                captures.name(&format!("p{index}"))
            };
            if let Some(value) = capture {
                params.insert(key.clone(), decode_param(value.as_str()));
            }
        }
        Some(params)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read a balanced `( ... )` group starting at `start`; returns the inner
/// pattern and the index after the closing parenthesis.
fn read_group(chars: &[char], start: usize) -> (String, usize) {
    let mut depth = 0usize;
    let mut i = start;
    let mut inner = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            if depth > 0 {
                inner.push(c);
                inner.push(chars[i + 1]);
            }
            i += 2;
            continue;
        }
        if c == '(' {
            depth += 1;
            if depth > 1 {
                inner.push(c);
            }
        } else if c == ')' {
            depth -= 1;
            if depth == 0 {
                return (inner, i + 1);
            }
            inner.push(c);
        } else {
            inner.push(c);
        }
        i += 1;
    }
    // Unbalanced: hand the remainder to the regex compiler, which reports it
    (format!("({inner}"), i)
}

fn read_modifier(chars: &[char], i: &mut usize) -> Modifier {
    let modifier = match chars.get(*i) {
        Some('?') => Modifier::Optional,
        Some('+') => Modifier::OneOrMore,
        Some('*') => Modifier::ZeroOrMore,
        _ => return Modifier::None,
    };
    *i += 1;
    modifier
}

fn push_param(
    pattern: &mut String,
    literal: &mut String,
    keys: &mut Vec<String>,
    name: String,
    custom: Option<String>,
    modifier: Modifier,
) {
    // A preceding `/` or `.` belongs to the parameter so optional segments
    // can disappear entirely
    let prefix = match literal.chars().last() {
        Some(c @ ('/' | '.')) => {
            literal.pop();
            regex::escape(&c.to_string())
        }
        _ => String::new(),
    };
    pattern.push_str(&regex::escape(literal));
    literal.clear();

    let group = format!("p{}", keys.len());
    let segment = custom.unwrap_or_else(|| DEFAULT_SEGMENT.to_string());
    let fragment = match modifier {
        Modifier::None => format!("{prefix}(?P<{group}>{segment})"),
        Modifier::Optional => format!("(?:{prefix}(?P<{group}>{segment}))?"),
        Modifier::OneOrMore => format!(
            "(?:{prefix}(?P<{group}>(?:{segment})(?:{prefix}(?:{segment}))*))"
        ),
        Modifier::ZeroOrMore => format!(
            "(?:{prefix}(?P<{group}>(?:{segment})(?:{prefix}(?:{segment}))*))?"
        ),
    };
    pattern.push_str(&fragment);
    keys.push(name);
}

fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Find the first route whose method equals `method` and whose url matches
/// `path`, in registration order.
pub fn find_http_route<'a>(
    method: &str,
    path: &str,
    routes: &'a [HttpRoute],
) -> Option<(&'a HttpRoute, HashMap<String, String>)> {
    let method: HttpMethod = method.parse().ok()?;
    routes
        .iter()
        .filter(|route| route.mock.method == method)
        .find_map(|route| route.matcher.matches(path).map(|params| (route, params)))
}
