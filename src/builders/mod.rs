// This file is the module declaration file for the `builders` module.
// Each sub-module computes one piece of the descriptor from data the
// repository reader already produced; none of them touch the repository.

// `dirty` module:
// Classifies working tree status entries as clean or dirty. Untracked
// files never make a tree dirty.
pub mod dirty;

// `index` module:
// Merges annotated and lightweight tags into one commit id → tag name
// table. Annotated tags go in first, so a lightweight tag on the same
// commit replaces them.
pub mod index;

// `reporter` module:
// Formats a finished descriptor for the command line, either as the plain
// version string, as JSON/YAML/TOML, or as a colored summary.
pub mod reporter;

// `template` module:
// The small template language used to render descriptors, including the
// `default`, `package` and `semver` presets.
pub mod template;

// `walker` module:
// Walks the history from HEAD until the first tagged commit and counts
// the commits in between.
pub mod walker;
