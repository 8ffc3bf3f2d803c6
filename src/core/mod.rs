// This file is the module declaration file for the `core` module.
// It declares the submodules that make up the describe pipeline and
// exposes them to the rest of the crate.

// `config` module:
// Holds `DescribeOptions`, the explicit per-call configuration, plus the
// `ConfigManager` that reads and writes `.git/describe.toml` and the
// `LogConfig` handed to the binary's log setup.
pub mod config;

// `engine` module:
// Ties the pipeline together. `Describer` resolves HEAD, builds the tag
// index, walks the history, optionally checks the working tree and renders
// the final `Descriptor`.
pub mod engine;

// `error` module:
// The `DescribeError` enum, one variant per failing stage.
pub mod error;

// `git` module:
// The `RepositoryReader` trait and its `git2`-backed implementation.
pub mod git;

// `model` module:
// Plain data shared by every stage: commits, tags, status entries.
pub mod model;
