//! Splits template source into text and tag tokens

use super::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Text(String),
    /// `{{path}}` (escaped) or `{{{path}}}` / `{{&path}}` (raw)
    Variable {
        path: String,
        escape: bool,
        line: usize,
    },
    /// `{{#each path}}`
    EachStart { path: String, line: usize },
    /// `{{/each}}`
    EachEnd { line: usize },
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

/// Tokenize `src` in one forward pass.
///
/// `\{{` is a literal `{{`. Comments (`{{! ... }}`) produce no token.
/// Adjacent text, including escaped braces, is merged into one token.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = src;
    let mut line = 1;

    while let Some(open) = rest.find("{{") {
        let before = &rest[..open];
        line += count_newlines(before);

        if let Some(literal) = before.strip_suffix('\\') {
            text.push_str(literal);
            text.push_str("{{");
            rest = &rest[open + 2..];
            continue;
        }
        text.push_str(before);

        let after = &rest[open + 2..];
        let (raw, inner, close) = match after.strip_prefix('{') {
            Some(inner) => (true, inner, "}}}"),
            None => (false, after, "}}"),
        };
        let end = inner
            .find(close)
            .ok_or(TemplateError::UnclosedTag { line })?;
        let expr = &inner[..end];

        if let Some(token) = classify(expr, raw, line)? {
            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            tokens.push(token);
        }
        line += count_newlines(expr);
        rest = &inner[end + close.len()..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

/// First word of `s` and the trimmed remainder
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

fn classify(expr: &str, raw: bool, line: usize) -> Result<Option<Token>, TemplateError> {
    let expr = expr.trim();

    if !raw {
        if expr.starts_with('!') {
            return Ok(None);
        }
        if let Some(block) = expr.strip_prefix('#') {
            let (name, args) = split_word(block);
            if name != "each" {
                return Err(TemplateError::UnsupportedHelper {
                    name: format!("#{}", name),
                    line,
                });
            }
            if args.is_empty() {
                return Err(TemplateError::MissingEachTarget { line });
            }
            let path = check_path(args, line)?;
            return Ok(Some(Token::EachStart { path, line }));
        }
        if let Some(block) = expr.strip_prefix('/') {
            let (name, _) = split_word(block);
            if name != "each" {
                return Err(TemplateError::UnsupportedHelper {
                    name: format!("/{}", name),
                    line,
                });
            }
            return Ok(Some(Token::EachEnd { line }));
        }
    }

    let (escape, path) = match expr.strip_prefix('&') {
        Some(path) if !raw => (false, path.trim()),
        _ => (!raw, expr),
    };
    let path = check_path(path, line)?;
    Ok(Some(Token::Variable { path, escape, line }))
}

/// A lookup path is a single word; anything else is a helper call
fn check_path(path: &str, line: usize) -> Result<String, TemplateError> {
    if path.is_empty() {
        return Err(TemplateError::EmptyExpression { line });
    }
    let (name, args) = split_word(path);
    if !args.is_empty() || name == "else" || name.starts_with(['>', '^', '#', '/']) {
        return Err(TemplateError::UnsupportedHelper {
            name: name.to_string(),
            line,
        });
    }
    Ok(name.to_string())
}
