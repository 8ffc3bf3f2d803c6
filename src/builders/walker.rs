use tracing::{debug, trace};

use crate::builders::index::MarkerIndex;
use crate::core::error::DescribeError;
use crate::core::model::{CommitInfo, MarkerInfo};

/// Result of walking back from HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    /// The first commit the history produced, i.e. HEAD.
    pub head: CommitInfo,
    pub marker: MarkerInfo,
}

/// Walks `history` until a commit carrying a tag is found.
///
/// The iterator's order is taken as given. Every commit without a tag adds
/// one to the distance; the tagged commit itself does not. Nothing past the
/// tagged commit is pulled from the iterator.
pub fn walk<I>(history: I, index: &MarkerIndex) -> Result<WalkOutcome, DescribeError>
where
    I: IntoIterator<Item = Result<CommitInfo, DescribeError>>,
{
    let mut head: Option<CommitInfo> = None;
    let mut marker = MarkerInfo::default();

    for commit in history {
        let commit = commit?;
        trace!(commit = %commit.hash, distance = marker.distance, "visiting commit");

        if let Some(name) = index.get(&commit.hash) {
            debug!(tag = name, distance = marker.distance, "found nearest tag");
            marker.name = name.to_string();
            head.get_or_insert(commit);
            break;
        }

        marker.distance += 1;
        head.get_or_insert(commit);
    }

    let head = head.ok_or_else(|| DescribeError::history("history from HEAD is empty"))?;
    if !marker.is_found() {
        debug!(distance = marker.distance, "no tag reachable from HEAD");
    }
    Ok(WalkOutcome { head, marker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::index::build_index;
    use crate::core::model::{Author, MarkerRef};
    use chrono::DateTime;

    fn commit(hash: &str) -> CommitInfo {
        CommitInfo::new(
            hash.to_string(),
            DateTime::parse_from_rfc2822("Wed, 12 Sep 2018 08:00:11 +0200").unwrap(),
            Author {
                name: "Rene Zbinden".to_string(),
                email: "rene@example.com".to_string(),
            },
        )
    }

    fn history(hashes: &[&str]) -> Vec<Result<CommitInfo, DescribeError>> {
        hashes.iter().map(|hash| Ok(commit(hash))).collect()
    }

    #[test]
    fn test_no_tags_counts_whole_history() {
        let outcome = walk(history(&["c3", "c2", "c1"]), &MarkerIndex::new()).unwrap();
        assert_eq!(outcome.marker.name, "");
        assert_eq!(outcome.marker.distance, 3);
        assert_eq!(outcome.head.hash, "c3");
    }

    #[test]
    fn test_single_untagged_commit_has_distance_one() {
        let outcome = walk(history(&["c1"]), &MarkerIndex::new()).unwrap();
        assert_eq!(outcome.marker, MarkerInfo { name: String::new(), distance: 1 });
    }

    #[test]
    fn test_tag_on_head_has_distance_zero() {
        let markers = vec![MarkerRef::annotated("c3", "v2.0.0")];
        let outcome = walk(history(&["c3", "c2", "c1"]), &build_index(&markers)).unwrap();
        assert_eq!(outcome.marker.name, "v2.0.0");
        assert_eq!(outcome.marker.distance, 0);
        assert_eq!(outcome.head.hash, "c3");
    }

    #[test]
    fn test_nearest_tag_wins() {
        let markers = vec![
            MarkerRef::annotated("c1", "v1.0.0"),
            MarkerRef::lightweight("c2", "v1.1.0"),
        ];
        let outcome = walk(history(&["c4", "c3", "c2", "c1"]), &build_index(&markers)).unwrap();
        assert_eq!(outcome.marker.name, "v1.1.0");
        assert_eq!(outcome.marker.distance, 2);
        assert_eq!(outcome.head.hash, "c4");
    }

    #[test]
    fn test_stops_consuming_at_tag() {
        let markers = vec![MarkerRef::lightweight("c2", "v1.0.0")];
        let mut pulled = 0;
        let commits = ["c3", "c2", "c1"].into_iter().map(|hash| {
            pulled += 1;
            Ok(commit(hash))
        });
        let outcome = walk(commits, &build_index(&markers)).unwrap();
        assert_eq!(outcome.marker.distance, 1);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_iteration_error_propagates() {
        let commits = vec![Ok(commit("c2")), Err(DescribeError::history("object missing"))];
        let err = walk(commits, &MarkerIndex::new()).unwrap_err();
        assert!(matches!(err, DescribeError::HistoryIteration { .. }));
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let err = walk(Vec::new(), &MarkerIndex::new()).unwrap_err();
        assert!(matches!(err, DescribeError::HistoryIteration { .. }));
    }
}
