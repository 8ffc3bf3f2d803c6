//! Describes the HEAD of a git repository as a version string, the way
//! `git describe --always --long --tags --dirty` does, with the output shape
//! controlled by a template.
//!
//! ```no_run
//! use git_descriptor::{DescribeOptions, describe};
//!
//! let descriptor = describe(".", &DescribeOptions::new().with_dirty_check())?;
//! println!("{descriptor}"); // e.g. v1.0.0-3-8183ffff-dirty
//! # Ok::<(), git_descriptor::DescribeError>(())
//! ```
pub mod builders;
pub mod core;
pub mod utils;


pub use crate::builders::template::{Template, TemplateChoice};
pub use crate::core::config::DescribeOptions;
pub use crate::core::engine::{Describer, Descriptor, describe};
pub use crate::core::error::DescribeError;
pub use crate::core::model::{Author, CommitInfo, MarkerInfo};
