//! Literate pages: source files whose `# ` comment lines are prose and whose
//! remaining lines are runnable code, rendered to HTML with each code run's
//! output spliced in after it. A small `{{ ... }}` template layer reuses the
//! same execution machinery to fill pages from their metadata.

pub mod document;
pub mod error;
pub mod exec;
pub mod html;
pub mod render;
pub mod segment;
pub mod template;

pub use document::{Document, Metadata, assemble};
pub use error::{LiterateError, Result};
pub use exec::Executor;
pub use segment::{Combination, LineKind, Segment, SegmentKind, segment};
pub use template::{TemplateEngine, TemplateOptions, dedent};
