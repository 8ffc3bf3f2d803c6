use crate::core::model::{StatusCode, StatusEntry};

/// Returns true when any tracked path has staged or unstaged changes.
///
/// Entries whose staged state is `Untracked` never count, whatever their
/// worktree state says.
pub fn is_dirty<'a, I>(entries: I) -> bool
where
    I: IntoIterator<Item = &'a StatusEntry>,
{
    entries.into_iter().any(|entry| {
        entry.staged != StatusCode::Untracked
            && (entry.staged != StatusCode::Unmodified
                || entry.worktree != StatusCode::Unmodified)
    })
}
