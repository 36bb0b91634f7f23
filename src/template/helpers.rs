//! Value lookup and output helpers

use serde_json::Value;

use crate::schema::FormValues;

/// A parsed lookup path
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Path {
    /// `@index` of the innermost loop
    Index,
    /// `this` or `this.a.b`, relative to the innermost loop item
    This(Vec<String>),
    /// `a.b`, searched in enclosing loop items first, then in the root values
    Key(Vec<String>),
}

impl Path {
    pub(crate) fn parse(path: &str) -> Self {
        if path == "@index" {
            return Path::Index;
        }
        let mut segments = path.split('.').map(str::to_string);
        match segments.next() {
            Some(first) if first == "this" => Path::This(segments.collect()),
            Some(first) => {
                let mut keys = vec![first];
                keys.extend(segments);
                Path::Key(keys)
            }
            None => Path::Key(Vec::new()),
        }
    }
}

/// One level of `{{#each}}` iteration
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub item: &'a Value,
    pub index: usize,
}

fn walk<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolve a value path; `@index` is not a value and resolves to `None`
pub(crate) fn resolve<'a>(
    path: &Path,
    root: &'a FormValues,
    frames: &[Frame<'a>],
) -> Option<&'a Value> {
    match path {
        Path::Index => None,
        Path::This(rest) => frames.last().and_then(|frame| walk(frame.item, rest)),
        Path::Key(segments) => {
            let (first, rest) = segments.split_first()?;
            for frame in frames.iter().rev() {
                if let Some(value) = frame.item.as_object().and_then(|map| map.get(first)) {
                    return walk(value, rest);
                }
            }
            root.get(first).and_then(|value| walk(value, rest))
        }
    }
}

/// Text form of a value: scalars as written, lists comma-joined, objects
/// and null as nothing
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) => String::new(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
    }
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}
