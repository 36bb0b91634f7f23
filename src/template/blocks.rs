//! Builds the node tree from tokens, matching each loops

use super::error::TemplateError;
use super::helpers::Path;
use super::tokenize::Token;

/// Deepest allowed `{{#each}}` nesting
pub const MAX_EACH_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Variable { path: Path, escape: bool },
    Each { path: Path, body: Vec<Node> },
}

/// An each loop still waiting for its `{{/each}}`
struct OpenEach {
    path: String,
    line: usize,
    /// Nodes of the enclosing level
    outer: Vec<Node>,
}

pub(crate) fn build(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut open: Vec<OpenEach> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => current.push(Node::Text(text)),
            Token::Variable { path, escape, .. } => current.push(Node::Variable {
                path: Path::parse(&path),
                escape,
            }),
            Token::EachStart { path, line } => {
                if open.len() >= MAX_EACH_DEPTH {
                    return Err(TemplateError::NestingTooDeep {
                        max: MAX_EACH_DEPTH,
                        line,
                    });
                }
                open.push(OpenEach {
                    path,
                    line,
                    outer: std::mem::take(&mut current),
                });
            }
            Token::EachEnd { line } => {
                let each = open
                    .pop()
                    .ok_or(TemplateError::UnexpectedEachEnd { line })?;
                let body = std::mem::replace(&mut current, each.outer);
                current.push(Node::Each {
                    path: Path::parse(&each.path),
                    body,
                });
            }
        }
    }

    match open.pop() {
        Some(each) => Err(TemplateError::UnclosedEach {
            path: each.path,
            line: each.line,
        }),
        None => Ok(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::tokenize::tokenize;

    fn build_src(src: &str) -> Result<Vec<Node>, TemplateError> {
        build(tokenize(src)?)
    }

    #[test]
    fn test_nested_each() {
        let nodes = build_src("{{#each a}}x{{#each this.b}}{{this}}{{/each}}{{/each}}!").unwrap();
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            Node::Each { body, .. } => {
                assert_eq!(body.len(), 2);
                assert!(matches!(body[1], Node::Each { .. }));
            }
            other => panic!("expected each, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_loops() {
        assert_eq!(
            build_src("{{#each a}}\n{{#each b}}{{/each}}"),
            Err(TemplateError::UnclosedEach {
                path: "a".to_string(),
                line: 1
            })
        );
        assert_eq!(
            build_src("ok\n{{/each}}"),
            Err(TemplateError::UnexpectedEachEnd { line: 2 })
        );
    }

    #[test]
    fn test_nesting_limit() {
        let src = format!(
            "{}{}",
            "{{#each a}}".repeat(MAX_EACH_DEPTH + 1),
            "{{/each}}".repeat(MAX_EACH_DEPTH + 1)
        );
        assert!(matches!(
            build_src(&src),
            Err(TemplateError::NestingTooDeep { .. })
        ));
        let src = format!(
            "{}{}",
            "{{#each a}}".repeat(MAX_EACH_DEPTH),
            "{{/each}}".repeat(MAX_EACH_DEPTH)
        );
        assert!(build_src(&src).is_ok());
    }
}
