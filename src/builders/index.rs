use std::collections::HashMap;

use crate::core::model::{MarkerKind, MarkerRef};

/// Lookup table from commit id to the tag name shown for that commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerIndex {
    names: HashMap<String, String>,
}

impl MarkerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag name attached to `commit`, if any.
    pub fn get(&self, commit: &str) -> Option<&str> {
        self.names.get(commit).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn insert(&mut self, marker: &MarkerRef) {
        self.names.insert(marker.target.clone(), marker.name.clone());
    }
}

/// Builds the commit → tag name table.
///
/// All annotated tags are inserted before any lightweight tag, each group in
/// the order given. The last write for a commit wins, so a lightweight tag
/// replaces an annotated tag on the same commit.
pub fn build_index<'a, I>(markers: I) -> MarkerIndex
where
    I: IntoIterator<Item = &'a MarkerRef>,
{
    let (annotated, lightweight): (Vec<&MarkerRef>, Vec<&MarkerRef>) = markers
        .into_iter()
        .partition(|marker| marker.kind == MarkerKind::Annotated);

    let mut index = MarkerIndex::new();
    for marker in annotated.into_iter().chain(lightweight) {
        index.insert(marker);
    }
    index
}
