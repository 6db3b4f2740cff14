//! `{{ ... }}` substitution over page bodies.
//!
//! Every expression runs in its own scope seeded with the page data, so
//! expressions cannot see each other's bindings. Whatever an expression
//! prints replaces it, unescaped.

use std::cell::Cell;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;

use interpreter::{Interpreter, NativeFunction, RuntimeError, RuntimeValue, Scope};
use regex::Regex;
use tracing::{debug, error, info};

use crate::document::{Metadata, assemble};
use crate::error::{LiterateError, Result};
use crate::exec::{Executor, capture};

/// Shortest `{{ ... }}` span, newlines included. A block brace directly
/// before the delimiter (`}}}`) closes the span early.
static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.+?\}\}").expect("expression pattern is valid"));

/// Name the template engine is bound to inside expressions.
pub const RENDER_TEMPLATE: &str = "render_template";

#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// Files with this extension are assembled as literate sources before
    /// substitution.
    pub literate_extension: String,
    /// How deeply `render_template` may call itself.
    pub max_depth: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions {
            literate_extension: "lit".to_string(),
            max_depth: 32,
        }
    }
}

/// Renders template files. Cloning is cheap and clones share the nesting
/// counter, which is how nested `render_template` calls are bounded.
#[derive(Clone)]
pub struct TemplateEngine {
    options: Rc<TemplateOptions>,
    executor: Rc<dyn Executor>,
    depth: Rc<Cell<usize>>,
}

struct DepthGuard(Rc<Cell<usize>>);

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl TemplateEngine {
    pub fn new(options: TemplateOptions) -> Self {
        Self::with_executor(options, Interpreter::new())
    }

    pub fn with_executor(options: TemplateOptions, executor: impl Executor + 'static) -> Self {
        TemplateEngine {
            options: Rc::new(options),
            executor: Rc::new(executor),
            depth: Rc::new(Cell::new(0)),
        }
    }

    pub fn is_literate(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.options.literate_extension.as_str())
    }

    /// Render the file at `path`. Metadata of a literate file is merged over
    /// `data` before substitution.
    pub fn render_template(&self, path: impl AsRef<Path>, data: Option<Metadata>) -> Result<String> {
        let path = path.as_ref();
        let _guard = self.enter(path)?;
        let mut data = data.unwrap_or_default();

        let source = read(path)?;
        let body = if self.is_literate(path) {
            let (body, metadata) = assemble(&source, self.executor.as_ref())?;
            data.extend(metadata);
            body
        } else {
            source
        };

        info!(path = %path.display(), "rendering template");
        self.substitute(&path.display().to_string(), &body, &data)
    }

    /// Substitute the expressions of an in-memory template.
    pub fn render_str(&self, body: &str, data: &Metadata) -> Result<String> {
        self.substitute("<string>", body, data)
    }

    fn enter(&self, path: &Path) -> Result<DepthGuard> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            return Err(LiterateError::NestingTooDeep {
                limit: self.options.max_depth,
                path: path.to_path_buf(),
            });
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard(Rc::clone(&self.depth)))
    }

    /// Replace each match with its own output. Results are never rescanned,
    /// so output containing `{{` is left as is.
    fn substitute(&self, origin: &str, body: &str, data: &Metadata) -> Result<String> {
        let mut rendered = String::with_capacity(body.len());
        let mut last = 0;
        for (index, span) in find_expressions(body).into_iter().enumerate() {
            rendered.push_str(&body[last..span.start]);
            let code = dedent(&body[span.start + 2..span.end - 2]);
            rendered.push_str(&self.evaluate(origin, index, code, data)?);
            last = span.end;
        }
        rendered.push_str(&body[last..]);
        Ok(rendered)
    }

    fn evaluate(&self, origin: &str, index: usize, code: String, data: &Metadata) -> Result<String> {
        debug!(origin, expression = index, "evaluating template expression");
        let mut scope = self.expression_scope(data);
        match capture(self.executor.as_ref(), &code, &mut scope) {
            Ok(mut captured) => {
                if captured.ends_with('\n') {
                    captured.pop();
                }
                Ok(captured)
            }
            Err(source) => {
                error!(origin, expression = index, code = %code, "template expression failed");
                Err(LiterateError::Expression {
                    origin: origin.to_string(),
                    index,
                    code,
                    source,
                })
            }
        }
    }

    /// Every data key as a variable, `data` as the whole mapping unless a key
    /// already claims the name, and the engine itself.
    fn expression_scope(&self, data: &Metadata) -> Scope {
        let mut scope = Scope::from_json(data);
        if !scope.contains("data") {
            scope.set("data", RuntimeValue::from(serde_json::Value::Object(data.clone())));
        }
        scope.define_native(self.binding());
        scope
    }

    fn binding(&self) -> NativeFunction {
        let engine = self.clone();
        NativeFunction::new(RENDER_TEMPLATE, move |args, _| {
            let (path, data) = match args {
                [RuntimeValue::String(path)] => (path, None),
                [RuntimeValue::String(path), RuntimeValue::Map(_)] => {
                    let data = match args[1].to_json() {
                        serde_json::Value::Object(map) => map,
                        _ => Metadata::new(),
                    };
                    (path, Some(data))
                }
                [RuntimeValue::String(_), other] => {
                    return Err(RuntimeError::TypeError {
                        expected: "Map".to_string(),
                        got: other.type_name().to_string(),
                    });
                }
                [other, ..] if !matches!(other, RuntimeValue::String(_)) => {
                    return Err(RuntimeError::TypeError {
                        expected: "String".to_string(),
                        got: other.type_name().to_string(),
                    });
                }
                _ => {
                    return Err(RuntimeError::ArityMismatch {
                        name: RENDER_TEMPLATE.to_string(),
                        expected: "1 to 2".to_string(),
                        got: args.len(),
                    });
                }
            };
            engine
                .render_template(PathBuf::from(path), data)
                .map(RuntimeValue::String)
                .map_err(|e| {
                    RuntimeError::Custom(format!(
                        "{}({:?}): {}",
                        RENDER_TEMPLATE,
                        path,
                        e.chain_message()
                    ))
                })
        })
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("options", &self.options)
            .field("depth", &self.depth.get())
            .finish()
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| LiterateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Byte ranges of every `{{ ... }}` in `body`, delimiters included.
pub fn find_expressions(body: &str) -> Vec<Range<usize>> {
    EXPRESSION.find_iter(body).map(|m| m.range()).collect()
}

/// Remove the whitespace prefix shared by every non-blank line. Lines that
/// are only whitespace come back empty.
pub fn dedent(text: &str) -> String {
    let margin = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .find(|((_, a), b)| a != b)
                .map_or(common.len().min(indent.len()), |((i, _), _)| i);
            &common[..shared]
        })
        .unwrap_or("");

    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
