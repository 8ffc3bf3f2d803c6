use chrono::{FixedOffset, TimeZone};
use git2::{Commit, ObjectType, Oid, Repository, Sort, Status, StatusOptions};
use std::path::Path;
use tracing::{debug, trace};

use crate::core::error::DescribeError;
use crate::core::model::{Author, CommitInfo, MarkerRef, StatusCode, StatusEntry};

/// Lazily produced commits, newest first. Dropping it releases the walk.
pub type History<'a> = Box<dyn Iterator<Item = Result<CommitInfo, DescribeError>> + 'a>;

/// Trait defining the read-only repository access the describe engine needs.
/// This abstraction keeps the engine testable without a repository on disk.
pub trait RepositoryReader {
    /// Returns the hex id of the commit HEAD points at.
    fn head(&self) -> Result<String, DescribeError>;

    /// Walks the history reachable from `from`, ordered by commit time descending.
    fn history(&self, from: &str) -> Result<History<'_>, DescribeError>;

    /// Lists annotated tags as (peeled commit, tag object name).
    fn annotated_markers(&self) -> Result<Vec<MarkerRef>, DescribeError>;

    /// Lists lightweight tags as (target commit, short reference name).
    fn lightweight_markers(&self) -> Result<Vec<MarkerRef>, DescribeError>;

    /// Scans the working tree. Ignored and untracked paths are not reported.
    fn status(&self) -> Result<Vec<StatusEntry>, DescribeError>;
}

/// Concrete implementation of RepositoryReader using the git2 crate.
pub struct Git2Reader {
    repo: Repository,
}

impl Git2Reader {
    /// Opens the repository at exactly `path`; parent directories are not searched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DescribeError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| DescribeError::RepositoryOpen {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "opened repository");
        Ok(Self { repo })
    }

    /// Yields every reference under `refs/tags/` together with its direct target.
    fn tag_references(&self) -> Result<Vec<(String, Oid)>, DescribeError> {
        let mut tags = Vec::new();
        let references = self
            .repo
            .references_glob("refs/tags/*")
            .map_err(DescribeError::MarkerLookup)?;
        for reference in references {
            let reference = reference.map_err(DescribeError::MarkerLookup)?;
            // Symbolic references under refs/tags have no direct target.
            if let Some(target) = reference.target() {
                let name = String::from_utf8_lossy(reference.shorthand_bytes()).into_owned();
                tags.push((name, target));
            }
        }
        Ok(tags)
    }
}

impl RepositoryReader for Git2Reader {
    fn head(&self) -> Result<String, DescribeError> {
        let head = self.repo.head().map_err(DescribeError::NoHead)?;
        let commit = head.peel_to_commit().map_err(DescribeError::NoHead)?;
        Ok(commit.id().to_string())
    }

    fn history(&self, from: &str) -> Result<History<'_>, DescribeError> {
        let start = Oid::from_str(from).map_err(DescribeError::history)?;
        let mut revwalk = self.repo.revwalk().map_err(DescribeError::history)?;
        revwalk
            .set_sorting(Sort::TIME)
            .map_err(DescribeError::history)?;
        revwalk.push(start).map_err(DescribeError::history)?;

        let repo = &self.repo;
        Ok(Box::new(revwalk.map(move |oid| {
            let oid = oid.map_err(DescribeError::history)?;
            let commit = repo.find_commit(oid).map_err(DescribeError::history)?;
            commit_info(&commit)
        })))
    }

    fn annotated_markers(&self) -> Result<Vec<MarkerRef>, DescribeError> {
        let mut markers = Vec::new();
        for (reference, oid) in self.tag_references()? {
            let Ok(tag) = self.repo.find_tag(oid) else {
                continue;
            };
            match tag.target().and_then(|object| object.peel_to_commit()) {
                Ok(commit) => {
                    let name = String::from_utf8_lossy(tag.name_bytes()).into_owned();
                    markers.push(MarkerRef::annotated(commit.id().to_string(), name));
                }
                Err(err) => {
                    debug!(tag = %reference, %err, "annotated tag does not point at a commit");
                }
            }
        }
        Ok(markers)
    }

    fn lightweight_markers(&self) -> Result<Vec<MarkerRef>, DescribeError> {
        let mut markers = Vec::new();
        for (name, oid) in self.tag_references()? {
            let object = self
                .repo
                .find_object(oid, None)
                .map_err(DescribeError::MarkerLookup)?;
            if object.kind() == Some(ObjectType::Tag) {
                continue;
            }
            markers.push(MarkerRef::lightweight(oid.to_string(), name));
        }
        Ok(markers)
    }

    fn status(&self) -> Result<Vec<StatusEntry>, DescribeError> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(false)
            .include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .map_err(DescribeError::StatusQuery)?;

        let entries: Vec<StatusEntry> = statuses
            .iter()
            .map(|entry| {
                let path = String::from_utf8_lossy(entry.path_bytes()).into_owned();
                let (staged, worktree) = split_status(entry.status());
                trace!(%path, ?staged, ?worktree, "status entry");
                StatusEntry::new(path, staged, worktree)
            })
            .collect();
        Ok(entries)
    }
}

fn commit_info(commit: &Commit<'_>) -> Result<CommitInfo, DescribeError> {
    let author = commit.author();
    let when = author.when();
    let timestamp = FixedOffset::east_opt(when.offset_minutes() * 60)
        .and_then(|offset| offset.timestamp_opt(when.seconds(), 0).single())
        .ok_or_else(|| {
            DescribeError::history(format!("commit {} has an invalid author time", commit.id()))
        })?;

    Ok(CommitInfo::new(
        commit.id().to_string(),
        timestamp,
        Author {
            name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
        },
    ))
}

/// Splits libgit2's combined status bits into (staged, worktree) states.
pub(crate) fn split_status(status: Status) -> (StatusCode, StatusCode) {
    if status.is_conflicted() {
        return (StatusCode::UpdatedButUnmerged, StatusCode::UpdatedButUnmerged);
    }

    let staged = if status.is_index_new() {
        StatusCode::Added
    } else if status.is_index_modified() || status.is_index_typechange() {
        StatusCode::Modified
    } else if status.is_index_deleted() {
        StatusCode::Deleted
    } else if status.is_index_renamed() {
        StatusCode::Renamed
    } else {
        StatusCode::Unmodified
    };

    let worktree = if status.is_wt_new() {
        StatusCode::Untracked
    } else if status.is_wt_modified() || status.is_wt_typechange() {
        StatusCode::Modified
    } else if status.is_wt_deleted() {
        StatusCode::Deleted
    } else if status.is_wt_renamed() {
        StatusCode::Renamed
    } else {
        StatusCode::Unmodified
    };

    // A path git has never seen is untracked on both sides.
    if staged == StatusCode::Unmodified && worktree == StatusCode::Untracked {
        return (StatusCode::Untracked, StatusCode::Untracked);
    }
    (staged, worktree)
}
