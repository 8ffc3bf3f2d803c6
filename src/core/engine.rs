use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::builders::dirty::is_dirty;
use crate::builders::index::build_index;
use crate::builders::template::{Template, TemplateData};
use crate::builders::walker::walk;
use crate::core::config::DescribeOptions;
use crate::core::error::DescribeError;
use crate::core::git::{Git2Reader, RepositoryReader};
use crate::core::model::{CommitInfo, MarkerInfo};

/// Version information for HEAD of a repository.
///
/// The string returned by `Display` is rendered once, when the descriptor is
/// built. Changing the public fields afterwards does not re-render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    #[serde(rename = "version")]
    rendered: String,
    pub dirty: bool,
    pub commit: CommitInfo,
    #[serde(rename = "tag")]
    pub marker: MarkerInfo,
}

impl Descriptor {
    /// Assembles a descriptor and renders `template` against it.
    pub fn new(
        commit: CommitInfo,
        marker: MarkerInfo,
        dirty: bool,
        template: &Template,
    ) -> Result<Self, DescribeError> {
        let rendered = template.render(&TemplateData {
            commit: &commit,
            marker: &marker,
            dirty,
        })?;
        Ok(Self {
            rendered,
            dirty,
            commit,
            marker,
        })
    }

    /// The string rendered at construction time.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Computes descriptors from any [`RepositoryReader`].
pub struct Describer<R: RepositoryReader> {
    reader: R,
    template: Template,
    dirty_check: bool,
}

impl<R: RepositoryReader> Describer<R> {
    /// Parses the template up front so a malformed one fails before any
    /// repository access.
    pub fn new(reader: R, options: &DescribeOptions) -> Result<Self, DescribeError> {
        let template = Template::parse(options.template.source())?;
        Ok(Self::with_template(reader, template, options.dirty_check))
    }

    pub fn with_template(reader: R, template: Template, dirty_check: bool) -> Self {
        Self {
            reader,
            template,
            dirty_check,
        }
    }

    pub fn describe(&self) -> Result<Descriptor, DescribeError> {
        let head = self.reader.head()?;
        debug!(%head, "resolved HEAD");

        let mut markers = self.reader.annotated_markers()?;
        markers.extend(self.reader.lightweight_markers()?);
        let index = build_index(&markers);
        debug!(tags = index.len(), "built tag index");

        let outcome = walk(self.reader.history(&head)?, &index)?;

        let dirty = if self.dirty_check {
            let entries = self.reader.status()?;
            is_dirty(&entries)
        } else {
            false
        };

        let descriptor = Descriptor::new(outcome.head, outcome.marker, dirty, &self.template)?;
        info!(version = %descriptor, "described HEAD");
        Ok(descriptor)
    }
}

/// Describes HEAD of the git repository at `path`.
///
/// The template is parsed before the repository is opened.
pub fn describe<P: AsRef<Path>>(
    path: P,
    options: &DescribeOptions,
) -> Result<Descriptor, DescribeError> {
    let template = Template::parse(options.template.source())?;
    let reader = Git2Reader::open(path)?;
    Describer::with_template(reader, template, options.dirty_check).describe()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::git::History;
    use crate::core::model::{Author, MarkerRef, StatusCode, StatusEntry};
    use chrono::DateTime;
    use std::cell::Cell;

    /// In-memory repository with a linear history, newest first.
    struct FakeReader {
        commits: Vec<&'static str>,
        annotated: Vec<MarkerRef>,
        lightweight: Vec<MarkerRef>,
        status: Vec<StatusEntry>,
        status_calls: Cell<usize>,
        // Failure switches for the error paths.
        fail_markers: bool,
        fail_status: bool,
        fail_history_at: Option<usize>,
    }

    impl FakeReader {
        fn new(commits: Vec<&'static str>) -> Self {
            Self {
                commits,
                annotated: Vec::new(),
                lightweight: Vec::new(),
                status: Vec::new(),
                status_calls: Cell::new(0),
                fail_markers: false,
                fail_status: false,
                fail_history_at: None,
            }
        }
    }

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

    impl RepositoryReader for FakeReader {
        fn head(&self) -> Result<String, DescribeError> {
            Ok(self.commits[0].to_string())
        }

        fn history(&self, _from: &str) -> Result<History<'_>, DescribeError> {
            let fail_at = self.fail_history_at;
            Ok(Box::new(self.commits.iter().enumerate().map(
                move |(position, hash)| match fail_at {
                    Some(at) if at == position => Err(DescribeError::history("object not found")),
                    _ => Ok(commit(hash)),
                },
            )))
        }

        fn annotated_markers(&self) -> Result<Vec<MarkerRef>, DescribeError> {
            if self.fail_markers {
                return Err(DescribeError::MarkerLookup(git2::Error::from_str(
                    "failed to read refs/tags",
                )));
            }
            Ok(self.annotated.clone())
        }

        fn lightweight_markers(&self) -> Result<Vec<MarkerRef>, DescribeError> {
            Ok(self.lightweight.clone())
        }

        fn status(&self) -> Result<Vec<StatusEntry>, DescribeError> {
            self.status_calls.set(self.status_calls.get() + 1);
            if self.fail_status {
                return Err(DescribeError::StatusQuery(git2::Error::from_str(
                    "failed to read index",
                )));
            }
            Ok(self.status.clone())
        }
    }

    const HEAD: &str = "6ea1790235210db239ddb8b6d0191db571f5bd64";
    const PARENT: &str = "8183ffffe4851ee839927180a54eba94f5bc8396";

    #[test]
    fn test_untagged_clean() {
        let reader = FakeReader::new(vec![HEAD, PARENT]);
        let describer = Describer::new(reader, &DescribeOptions::new()).unwrap();
        let descriptor = describer.describe().unwrap();
        assert_eq!(descriptor.to_string(), "6ea17902");
        assert_eq!(descriptor.marker, MarkerInfo { name: String::new(), distance: 2 });
        assert!(!descriptor.dirty);
    }

    #[test]
    fn test_dirty_check_is_opt_in() {
        let mut reader = FakeReader::new(vec![HEAD, PARENT]);
        reader.status = vec![StatusEntry::new(
            "file2",
            StatusCode::Unmodified,
            StatusCode::Modified,
        )];

        let describer = Describer::new(reader, &DescribeOptions::new()).unwrap();
        assert_eq!(describer.describe().unwrap().to_string(), "6ea17902");
        assert_eq!(describer.reader.status_calls.get(), 0);

        let describer = Describer::with_template(
            describer.reader,
            Template::parse(DescribeOptions::new().template.source()).unwrap(),
            true,
        );
        assert_eq!(describer.describe().unwrap().to_string(), "6ea17902-dirty");
        assert_eq!(describer.reader.status_calls.get(), 1);
    }

    #[test]
    fn test_lightweight_tag_shadows_annotated_on_same_commit() {
        let mut reader = FakeReader::new(vec![HEAD, PARENT]);
        reader.annotated = vec![MarkerRef::annotated(PARENT, "v1.0.0")];
        reader.lightweight = vec![MarkerRef::lightweight(PARENT, "stable")];
        let descriptor = Describer::new(reader, &DescribeOptions::new().with_package_template())
            .unwrap()
            .describe()
            .unwrap();
        assert_eq!(descriptor.to_string(), "stable-1");
    }

    #[test]
    fn test_rendered_string_is_not_recomputed() {
        let mut reader = FakeReader::new(vec![HEAD]);
        reader.annotated = vec![MarkerRef::annotated(HEAD, "v1.0.0")];
        let mut descriptor = Describer::new(reader, &DescribeOptions::new().with_semver_template())
            .unwrap()
            .describe()
            .unwrap();
        assert_eq!(descriptor.rendered(), "v1.0.0.0");

        descriptor.dirty = true;
        descriptor.marker.name = "v2.0.0".to_string();
        assert_eq!(descriptor.to_string(), "v1.0.0.0");
    }

    #[test]
    fn test_status_failure_is_reported() {
        let mut reader = FakeReader::new(vec![HEAD, PARENT]);
        reader.fail_status = true;

        let options = DescribeOptions::new().with_dirty_check();
        let describer = Describer::new(reader, &options).unwrap();
        assert!(matches!(describer.describe(), Err(DescribeError::StatusQuery(_))));
        assert_eq!(describer.reader.status_calls.get(), 1);

        // Without the dirty check the status is never read.
        let describer = Describer::new(describer.reader, &DescribeOptions::new()).unwrap();
        assert_eq!(describer.describe().unwrap().to_string(), "6ea17902");
    }

    #[test]
    fn test_tag_listing_failure_is_reported() {
        let mut reader = FakeReader::new(vec![HEAD, PARENT]);
        reader.annotated = vec![MarkerRef::annotated(PARENT, "v1.0.0")];
        reader.fail_markers = true;

        let describer = Describer::new(reader, &DescribeOptions::new()).unwrap();
        let err = describer.describe().unwrap_err();
        assert!(matches!(err, DescribeError::MarkerLookup(_)), "got {err}");
        assert!(err.to_string().contains("failed to read refs/tags"));
    }

    #[test]
    fn test_history_failure_is_reported() {
        let mut reader = FakeReader::new(vec![HEAD, PARENT]);
        reader.fail_history_at = Some(1);

        let describer = Describer::new(reader, &DescribeOptions::new()).unwrap();
        assert!(matches!(
            describer.describe(),
            Err(DescribeError::HistoryIteration { .. })
        ));
    }

    #[test]
    fn test_malformed_template_fails_before_repository_access() {
        let options = DescribeOptions::new().with_template("{{if .Dirty}}unbalanced");
        let result = Describer::new(FakeReader::new(vec![HEAD]), &options);
        assert!(matches!(result, Err(DescribeError::TemplateSyntax { .. })));

        let result = describe("/path/that/does/not/exist", &options);
        assert!(matches!(result, Err(DescribeError::TemplateSyntax { .. })));
    }

    #[test]
    fn test_undefined_field_fails_at_render_time() {
        let options = DescribeOptions::new().with_template("{{.Tag.Version}}");
        let describer = Describer::new(FakeReader::new(vec![HEAD]), &options).unwrap();
        assert!(matches!(
            describer.describe(),
            Err(DescribeError::TemplateRender { .. })
        ));
    }

    #[test]
    fn test_descriptor_serializes_rendered_version() {
        let template = Template::parse("{{.Tag.Name}}").unwrap();
        let descriptor = Descriptor::new(
            commit(HEAD),
            MarkerInfo { name: "v1".to_string(), distance: 0 },
            false,
            &template,
        )
        .unwrap();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["version"], "v1");
        assert_eq!(json["tag"]["name"], "v1");
        assert_eq!(json["commit"]["short_hash"], "6ea17902");
    }
}
