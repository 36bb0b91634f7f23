//! Template error types

use thiserror::Error;

/// Syntax errors found while compiling a template. Lines are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed tag at line {line}: missing closing braces")]
    UnclosedTag { line: usize },

    #[error("Empty expression at line {line}")]
    EmptyExpression { line: usize },

    #[error("Unsupported helper '{name}' at line {line}: only each loops are supported")]
    UnsupportedHelper { name: String, line: usize },

    #[error("Each loop at line {line} has no array to iterate")]
    MissingEachTarget { line: usize },

    #[error("Each loop over '{path}' opened at line {line} is never closed")]
    UnclosedEach { path: String, line: usize },

    #[error("Closing each at line {line} has no matching opening each")]
    UnexpectedEachEnd { line: usize },

    #[error("Each loops nested deeper than {max} at line {line}")]
    NestingTooDeep { max: usize, line: usize },
}

impl TemplateError {
    pub fn line(&self) -> usize {
        match self {
            TemplateError::UnclosedTag { line }
            | TemplateError::EmptyExpression { line }
            | TemplateError::UnsupportedHelper { line, .. }
            | TemplateError::MissingEachTarget { line }
            | TemplateError::UnclosedEach { line, .. }
            | TemplateError::UnexpectedEachEnd { line }
            | TemplateError::NestingTooDeep { line, .. } => *line,
        }
    }
}
