//! Splitting a literate source into maximal runs of same-kind lines.

use std::fmt;

use crate::error::{LiterateError, Result};

/// Lines starting with this are prose.
pub const PROSE_MARKER: &str = "# ";
/// Lines starting with this turn the code run below them into a listing that
/// is shown but never executed.
pub const NO_EXEC_MARKER: &str = "#$";

/// How a single source line is classified, before any merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Prose,
    NoExecFlag,
    Blank,
    Code,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if line.starts_with(PROSE_MARKER) {
            LineKind::Prose
        } else if line.starts_with(NO_EXEC_MARKER) {
            LineKind::NoExecFlag
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Code
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Prose,
    Code,
    /// Captured output of a code run. Never produced by the segmenter.
    Stdout,
    NoExecFlag,
    NonExecutableCode,
    Blank,
}

impl From<LineKind> for SegmentKind {
    fn from(kind: LineKind) -> Self {
        match kind {
            LineKind::Prose => SegmentKind::Prose,
            LineKind::NoExecFlag => SegmentKind::NoExecFlag,
            LineKind::Blank => SegmentKind::Blank,
            LineKind::Code => SegmentKind::Code,
        }
    }
}

impl SegmentKind {
    /// The kind of `self` followed directly by `next`, or `None` when the two
    /// cannot share a segment.
    ///
    /// Blank lines extend a code run they follow but never start one, so a
    /// code segment always begins with a code line. They never join prose.
    pub fn combine(self, next: SegmentKind) -> Option<SegmentKind> {
        use SegmentKind::*;
        match (self, next) {
            (Prose, Prose) => Some(Prose),
            (Code, Code) | (Code, Blank) => Some(Code),
            (Blank, Blank) => Some(Blank),
            (NoExecFlag, Code) => Some(NonExecutableCode),
            (NonExecutableCode, Code) | (NonExecutableCode, Blank) => Some(NonExecutableCode),
            _ => None,
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Prose => "prose",
            SegmentKind::Code => "code",
            SegmentKind::Stdout => "stdout",
            SegmentKind::NoExecFlag => "no-exec flag",
            SegmentKind::NonExecutableCode => "non-executable code",
            SegmentKind::Blank => "blank lines",
        };
        f.write_str(name)
    }
}

/// A run of consecutive source lines sharing one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Raw lines, line terminators removed.
    pub lines: Vec<String>,
    /// 1-based line number of the first line in the source.
    pub start_line: usize,
}

/// Outcome of trying to extend one segment with the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combination {
    Merged(Segment),
    Boundary { finished: Segment, next: Segment },
}

impl Segment {
    pub fn new(kind: SegmentKind, lines: Vec<String>, start_line: usize) -> Self {
        Segment {
            kind,
            lines,
            start_line,
        }
    }

    /// A one-line segment classified from `line`.
    pub fn from_line(line: &str, line_number: usize) -> Self {
        Segment::new(
            LineKind::classify(line).into(),
            vec![line.to_string()],
            line_number,
        )
    }

    /// Captured output attributed to the code segment starting at `start_line`.
    pub fn stdout(captured: &str, start_line: usize) -> Self {
        Segment::new(
            SegmentKind::Stdout,
            captured.lines().map(str::to_string).collect(),
            start_line,
        )
    }

    /// Extend `self` with `next` when their kinds combine.
    pub fn combine(self, next: Segment) -> Combination {
        match self.kind.combine(next.kind) {
            Some(kind) => {
                let mut merged = self;
                merged.kind = kind;
                merged.lines.extend(next.lines);
                Combination::Merged(merged)
            }
            None => Combination::Boundary {
                finished: self,
                next,
            },
        }
    }

    /// The raw lines joined back together.
    pub fn source(&self) -> String {
        self.lines.join("\n")
    }

    /// The text this segment contributes: prose loses its comment markers, a
    /// non-executable listing loses its flag line, and a lone flag is empty.
    pub fn content(&self) -> String {
        match self.kind {
            SegmentKind::Prose => self
                .lines
                .iter()
                .map(|line| line.strip_prefix(PROSE_MARKER).unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\n"),
            SegmentKind::NonExecutableCode => self
                .lines
                .iter()
                .skip(1)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            SegmentKind::NoExecFlag => String::new(),
            SegmentKind::Code | SegmentKind::Stdout | SegmentKind::Blank => self.source(),
        }
    }

    pub fn end_line(&self) -> usize {
        self.start_line + self.lines.len().saturating_sub(1)
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Fold `lines` into maximal segments, in source order.
///
/// Every line ends up in exactly one segment and no two neighbouring
/// segments could be combined further.
pub fn segment<I, S>(lines: I) -> Result<Vec<Segment>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    for (index, line) in lines.into_iter().enumerate() {
        let next = Segment::from_line(strip_terminator(line.as_ref()), index + 1);
        current = Some(match current.take() {
            None => next,
            Some(run) => match run.combine(next) {
                Combination::Merged(merged) => merged,
                Combination::Boundary { finished, next } => {
                    segments.push(finished);
                    next
                }
            },
        });
    }

    match current {
        Some(last) => segments.push(last),
        None => return Err(LiterateError::EmptyInput),
    }
    Ok(segments)
}
