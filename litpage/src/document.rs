use interpreter::Scope;
use serde::de::Error as _;
use tracing::debug;

use crate::error::{LiterateError, Result};
use crate::exec::Executor;
use crate::segment::{Segment, SegmentKind, segment};

/// Page metadata: the JSON object at the top of every literate file.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A parsed literate file. Nothing has been executed yet.
#[derive(Debug, Clone)]
pub struct Document {
    pub metadata: Metadata,
    /// Everything after the metadata block, in source order.
    pub segments: Vec<Segment>,
}

impl Document {
    pub fn from_source(source: &str) -> Result<Self> {
        Self::parse(source.lines())
    }

    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = segment(lines)?.into_iter();
        let first = segments.next().ok_or(LiterateError::EmptyInput)?;
        let (metadata, rest) = split_metadata(first)?;

        Ok(Document {
            metadata,
            segments: rest.into_iter().chain(segments).collect(),
        })
    }

    /// Render every segment, running code segments against `scope` in order.
    /// Non-empty fragments are joined with newlines.
    pub fn render(&self, executor: &dyn Executor, scope: &mut Scope) -> Result<String> {
        let mut fragments = Vec::new();
        for segment in &self.segments {
            debug!(
                kind = %segment.kind,
                lines = segment.lines.len(),
                line = segment.start_line,
                "rendering segment"
            );
            let output = segment.execute(executor, scope)?;
            fragments.push(segment.render());
            if let Some(output) = output {
                fragments.push(output.render());
            }
        }
        fragments.retain(|fragment| !fragment.is_empty());
        Ok(fragments.join("\n"))
    }
}

/// Parse a literate source and render its body with a fresh scope.
pub fn assemble(source: &str, executor: &dyn Executor) -> Result<(String, Metadata)> {
    let document = Document::from_source(source)?;
    let mut scope = Scope::new();
    let body = document.render(executor, &mut scope)?;
    Ok((body, document.metadata))
}

/// Pull the JSON object off the front of the leading prose run. Prose lines
/// following the object in the same run stay in the document as prose.
fn split_metadata(first: Segment) -> Result<(Metadata, Option<Segment>)> {
    if first.kind != SegmentKind::Prose {
        return Err(LiterateError::MissingMetadata {
            found: first.kind,
            line: first.start_line,
        });
    }

    let text = first.content();
    let invalid = |source: serde_json::Error| LiterateError::InvalidMetadata {
        line: first.start_line,
        source,
    };

    let mut stream = serde_json::Deserializer::from_str(&text).into_iter::<Metadata>();
    let metadata = match stream.next() {
        Some(parsed) => parsed,
        // Nothing but whitespace; let the parser report it.
        None => serde_json::from_str(&text),
    }
    .map_err(invalid)?;

    let end = stream.byte_offset();
    let last_line = text[..end].matches('\n').count();
    let trailing = text[end..].split('\n').next().unwrap_or_default();
    if !trailing.trim().is_empty() {
        return Err(invalid(serde_json::Error::custom(format!(
            "unexpected `{}` after the metadata object",
            trailing.trim()
        ))));
    }

    let remaining = &first.lines[last_line + 1..];
    let rest = (!remaining.is_empty()).then(|| {
        Segment::new(
            SegmentKind::Prose,
            remaining.to_vec(),
            first.start_line + last_line + 1,
        )
    });
    Ok((metadata, rest))
}
