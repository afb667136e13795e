//! Source-level information the project index does not keep: original
//! argument expressions, comments and positions.

mod comments;
mod provider;
mod view;

pub use comments::{disabled_checks, parse_disable_comment, DisabledChecks};
pub use provider::{ClassLocation, ClassSource, FsSourceProvider, MemorySourceProvider, SourceProvider};
pub use view::{ArgView, ClassView, FieldSource, SourceUnavailable};
