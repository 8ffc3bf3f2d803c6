//! Error type returned by every fallible descriptor operation.
//!
//! Each variant names the stage that failed so callers can tell a missing
//! repository apart from a broken template without parsing messages. The
//! `detail` strings are meant for humans and are not stable.

use std::fmt;

/// Failures surfaced by [`crate::describe`] and the components behind it.
#[derive(Debug)]
#[non_exhaustive]
pub enum DescribeError {
    /// The path does not reference a valid git repository.
    RepositoryOpen {
        path: String,
        source: git2::Error,
    },
    /// The repository has no commits yet (unborn branch) or HEAD is unreadable.
    NoHead(git2::Error),
    /// Listing the tag references failed.
    MarkerLookup(git2::Error),
    /// Reading a commit failed part way through the history walk.
    HistoryIteration { detail: String },
    /// Scanning the working tree status failed.
    StatusQuery(git2::Error),
    /// The template text is malformed.
    TemplateSyntax { detail: String },
    /// The template could not be evaluated against the descriptor data.
    TemplateRender { detail: String },
}

impl DescribeError {
    /// Creates a history iteration error from any displayable cause.
    pub fn history(detail: impl fmt::Display) -> Self {
        Self::HistoryIteration {
            detail: detail.to_string(),
        }
    }

    pub fn syntax(detail: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            detail: detail.into(),
        }
    }

    pub fn render(detail: impl Into<String>) -> Self {
        Self::TemplateRender {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DescribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepositoryOpen { path, source } => {
                write!(f, "could not open repository at {path}: {source}")
            }
            Self::NoHead(err) => write!(f, "repository has no HEAD commit: {err}"),
            Self::MarkerLookup(err) => write!(f, "could not list tags: {err}"),
            Self::HistoryIteration { detail } => write!(f, "history iteration failed: {detail}"),
            Self::StatusQuery(err) => write!(f, "working tree status failed: {err}"),
            Self::TemplateSyntax { detail } => write!(f, "template syntax error: {detail}"),
            Self::TemplateRender { detail } => write!(f, "template render error: {detail}"),
        }
    }
}

impl std::error::Error for DescribeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RepositoryOpen { source, .. } => Some(source),
            Self::NoHead(err) | Self::MarkerLookup(err) | Self::StatusQuery(err) => Some(err),
            _ => None,
        }
    }
}
