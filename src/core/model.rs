use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Number of hex characters kept in [`CommitInfo::short_hash`].
pub const SHORT_HASH_LENGTH: usize = 8;

/// Author of the HEAD commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Revision information of a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full hex object id.
    pub hash: String,
    /// The first [`SHORT_HASH_LENGTH`] characters of `hash`.
    pub short_hash: String,
    /// Author time, keeping the author's UTC offset.
    pub timestamp: DateTime<FixedOffset>,
    pub author: Author,
}

impl CommitInfo {
    pub fn new(hash: String, timestamp: DateTime<FixedOffset>, author: Author) -> Self {
        let short_hash = hash.chars().take(SHORT_HASH_LENGTH).collect();
        Self {
            hash,
            short_hash,
            timestamp,
            author,
        }
    }
}

/// The nearest tag found while walking back from HEAD.
///
/// An empty `name` means no tag was reachable; `distance` is then the number
/// of commits in HEAD's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerInfo {
    pub name: String,
    pub distance: usize,
}

impl MarkerInfo {
    pub fn is_found(&self) -> bool {
        !self.name.is_empty()
    }
}

/// The two kinds of tags git knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// A tag object with its own name, tagger and message.
    Annotated,
    /// A bare reference under `refs/tags/` pointing at a commit.
    Lightweight,
}

/// A tag as listed by the repository reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRef {
    pub kind: MarkerKind,
    /// Hex id of the commit the tag resolves to.
    pub target: String,
    pub name: String,
}

impl MarkerRef {
    pub fn annotated(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Annotated,
            target: target.into(),
            name: name.into(),
        }
    }

    pub fn lightweight(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Lightweight,
            target: target.into(),
            name: name.into(),
        }
    }
}

/// State of a path on one side (index or working tree) of a status entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Unmodified,
    Untracked,
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    UpdatedButUnmerged,
}

/// One line of `git status`: a path with its staged and worktree states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub staged: StatusCode,
    pub worktree: StatusCode,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, staged: StatusCode, worktree: StatusCode) -> Self {
        Self {
            path: path.into(),
            staged,
            worktree,
        }
    }
}
