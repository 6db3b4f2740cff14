//! HTML fragments for individual segments.

use interpreter::Scope;
use tracing::{debug, error};

use crate::error::{LiterateError, Result};
use crate::exec::{Executor, capture};
use crate::html::escape;
use crate::segment::{Segment, SegmentKind};

/// First line of every captured-output block.
pub const STDOUT_MARKER: &str = "# stdout";

/// Prose is inserted as is; it is authored HTML, not plain text.
pub fn render_prose(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    format!("<p>\n{}\n</p>", text)
}

/// Trailing whitespace is dropped; the indentation of the first line is kept.
pub fn render_code(code: &str) -> String {
    let code = code.trim_end();
    if code.is_empty() {
        return String::new();
    }
    format!("<pre>{}</pre>", escape(code))
}

pub fn render_stdout(captured: &str) -> String {
    let captured = captured.trim();
    if captured.is_empty() {
        return String::new();
    }
    format!("<pre>{}\n{}\n</pre>", STDOUT_MARKER, escape(captured))
}

impl Segment {
    /// Render this segment on its own. Code is shown, not run; see
    /// [`Segment::execute`] for its output.
    pub fn render(&self) -> String {
        match self.kind {
            SegmentKind::Prose => render_prose(&self.content()),
            SegmentKind::Code | SegmentKind::NonExecutableCode => render_code(&self.content()),
            SegmentKind::Stdout => render_stdout(&self.content()),
            SegmentKind::Blank | SegmentKind::NoExecFlag => String::new(),
        }
    }

    /// Run a code segment against `scope` and return its captured output as
    /// a [`SegmentKind::Stdout`] segment. Other kinds are never executed and
    /// yield `None`.
    pub fn execute(&self, executor: &dyn Executor, scope: &mut Scope) -> Result<Option<Segment>> {
        if self.kind != SegmentKind::Code {
            return Ok(None);
        }

        let code = self.content();
        debug!(line = self.start_line, "executing code segment");
        match capture(executor, &code, scope) {
            Ok(captured) => Ok(Some(Segment::stdout(captured.trim(), self.start_line))),
            Err(source) => {
                error!(line = self.start_line, code = %code, "code segment failed");
                Err(LiterateError::Execution {
                    line: self.start_line,
                    code,
                    source,
                })
            }
        }
    }
}
