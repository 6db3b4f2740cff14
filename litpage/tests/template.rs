use std::fs;
use std::io::Write;
use std::path::Path;

use interpreter::{ExecutionError, Scope};
use litpage::template::find_expressions;
use litpage::{Executor, LiterateError, Metadata, TemplateEngine, TemplateOptions, dedent};
use tempfile::TempDir;

fn data(json: &str) -> Metadata {
    serde_json::from_str(json).unwrap()
}

fn engine() -> TemplateEngine {
    TemplateEngine::new(TemplateOptions::default())
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn print_substitutes_inline() {
    let rendered = engine()
        .render_str("before {{ print(data['x']) }} after", &data(r#"{"x": 5}"#))
        .unwrap();
    assert_eq!(rendered, "before 5 after");
}

#[test]
fn data_keys_are_variables() {
    let rendered = engine()
        .render_str(
            "<title>{{ print(title) }}</title>{{ print(len(tags)) }}",
            &data(r#"{"title": "Home", "tags": ["a", "b"]}"#),
        )
        .unwrap();
    assert_eq!(rendered, "<title>Home</title>2");
}

#[test]
fn substitution_is_positional() {
    let body = r#"{{ print("{" + "{b}" + "}") }} and {{ print(1 + 1) }}"#;
    assert_eq!(find_expressions(body).len(), 2);
    let rendered = engine().render_str(body, &Metadata::new()).unwrap();
    assert_eq!(rendered, "{{b}} and 2");
}

#[test]
fn identical_expressions_are_each_replaced() {
    let rendered = engine()
        .render_str("{{ print(n) }}-{{ print(n) }}", &data(r#"{"n": 7}"#))
        .unwrap();
    assert_eq!(rendered, "7-7");
}

#[test]
fn expressions_without_output_vanish() {
    let rendered = engine().render_str("a{{ x = 1 }}b", &Metadata::new()).unwrap();
    assert_eq!(rendered, "ab");
}

#[test]
fn only_one_trailing_newline_is_dropped() {
    let rendered = engine()
        .render_str("[{{ print(1)\nprint(2) }}]", &Metadata::new())
        .unwrap();
    assert_eq!(rendered, "[1\n2]");

    let rendered = engine()
        .render_str("[{{ print(\"x\\n\") }}]", &Metadata::new())
        .unwrap();
    assert_eq!(rendered, "[x\n]");
}

#[test]
fn indented_multiline_expressions_run_as_top_level_code() {
    let body = "<ul>\n    {{\n        for post in posts {\n            print(f\"<li>{post}</li>\")\n        }\n    }}\n</ul>";
    let rendered = engine()
        .render_str(body, &data(r#"{"posts": ["a", "b"]}"#))
        .unwrap();
    assert_eq!(rendered, "<ul>\n    <li>a</li>\n<li>b</li>\n</ul>");
}

#[test]
fn expressions_do_not_share_bindings() {
    let err = engine()
        .render_str("{{ y = 1 }}{{ print(y) }}", &Metadata::new())
        .unwrap_err();
    match err {
        LiterateError::Expression {
            origin,
            index,
            code,
            source: ExecutionError::Runtime(_),
        } => {
            assert_eq!(origin, "<string>");
            assert_eq!(index, 1);
            assert_eq!(code, "print(y) ");
        }
        other => panic!("expected an expression error, got {:?}", other),
    }
}

#[test]
fn expressions_end_at_the_first_closing_pair() {
    let ps = data(r#"{"ps": ["a", "b"]}"#);

    let spaced = engine()
        .render_str("{{ for p in ps { print(p) } }}", &ps)
        .unwrap();
    assert_eq!(spaced, "a\nb");

    // `}}}` closes the expression at the block's own brace.
    let body = "{{ for p in ps { print(p) }}}";
    assert_eq!(find_expressions(body), vec![0..body.len() - 1]);
    let err = engine().render_str(body, &ps).unwrap_err();
    assert!(matches!(
        err,
        LiterateError::Expression { index: 0, source: ExecutionError::Parse(_), .. }
    ));
}

#[test]
fn text_without_expressions_is_unchanged() {
    let body = "plain { text } with {single} braces and {{}} empty pairs";
    assert_eq!(engine().render_str(body, &Metadata::new()).unwrap(), body);
}

#[test]
fn literate_bodies_are_assembled_and_their_metadata_merged() {
    let dir = TempDir::new().unwrap();
    let post = write(
        &dir,
        "post.lit",
        "# {\"TITLE\": \"Post\"}\n# Title is {{ print(TITLE) }}, by {{ print(author) }}.\nx = 2\nprint(x * 21)\n",
    );

    let rendered = engine()
        .render_template(&post, Some(data(r#"{"TITLE": "outer", "author": "me"}"#)))
        .unwrap();
    assert_eq!(
        rendered,
        "<p>\nTitle is Post, by me.\n</p>\n<pre>x = 2\nprint(x * 21)</pre>\n<pre># stdout\n42\n</pre>"
    );
}

#[test]
fn plain_files_are_not_assembled() {
    let dir = TempDir::new().unwrap();
    let page = write(&dir, "page.html", "# {not metadata}\n{{ print(1) }}\n");
    let rendered = engine().render_template(&page, None).unwrap();
    assert_eq!(rendered, "# {not metadata}\n1\n");
}

#[test]
fn templates_include_other_templates() {
    let dir = TempDir::new().unwrap();
    let post = write(
        &dir,
        "post.lit",
        "# {\"TITLE\": \"Nested\"}\n# Body of {{ print(TITLE) }}.\n",
    );
    let layout = write(
        &dir,
        "layout.html",
        "<title>{{ print(TITLE) }}</title>\n{{ print(render_template(BODYPATH)) }}\n{{ print(render_template(FOOTER, {\"year\": 2024})) }}",
    );
    write(&dir, "footer.html", "(c) {{ print(year) }}");
    let footer = dir.path().join("footer.html");

    let mut page_data = Metadata::new();
    page_data.insert("TITLE".into(), "Nested".into());
    page_data.insert("BODYPATH".into(), post.into());
    page_data.insert("FOOTER".into(), footer.to_str().unwrap().into());

    let rendered = engine().render_template(&layout, Some(page_data)).unwrap();
    assert_eq!(
        rendered,
        "<title>Nested</title>\n<p>\nBody of Nested.\n</p>\n(c) 2024"
    );
}

#[test]
fn self_inclusion_is_bounded() {
    let dir = TempDir::new().unwrap();
    let page = write(&dir, "loop.html", "{{ print(render_template(SELF, data)) }}");
    let engine = TemplateEngine::new(TemplateOptions {
        max_depth: 4,
        ..TemplateOptions::default()
    });

    let mut page_data = Metadata::new();
    page_data.insert("SELF".into(), page.clone().into());
    let err = engine.render_template(&page, Some(page_data)).unwrap_err();
    assert!(matches!(err, LiterateError::Expression { index: 0, .. }));
    assert!(!err.to_string().contains("nesting deeper"));
    assert!(err.chain_message().contains("nesting deeper than 4 levels"));

    // The counter unwinds, so the engine is usable again.
    let ok = write(&dir, "ok.html", "fine");
    assert_eq!(engine.render_template(&ok, None).unwrap(), "fine");
}

#[test]
fn missing_files_are_io_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.html");
    let err = engine().render_template(&missing, None).unwrap_err();
    assert!(matches!(err, LiterateError::Io { ref path, .. } if path == &missing));
}

#[test]
fn literate_extension_is_configurable() {
    let dir = TempDir::new().unwrap();
    let post = write(&dir, "post.page", "# {\"n\": 3}\n# n is {{ print(n) }}\n");
    let engine = TemplateEngine::new(TemplateOptions {
        literate_extension: "page".to_string(),
        ..TemplateOptions::default()
    });
    assert!(engine.is_literate(Path::new(&post)));
    assert!(!engine.is_literate(Path::new("post.lit")));
    assert_eq!(engine.render_template(&post, None).unwrap(), "<p>\nn is 3\n</p>");
}

/// Echoes each expression back instead of running it.
struct Echo;

impl Executor for Echo {
    fn execute(
        &self,
        code: &str,
        _scope: &mut Scope,
        output: &mut dyn Write,
    ) -> Result<(), ExecutionError> {
        write!(output, "[{}]", code.trim()).unwrap();
        Ok(())
    }
}

#[test]
fn executors_are_pluggable() {
    let engine = TemplateEngine::with_executor(TemplateOptions::default(), Echo);
    let rendered = engine
        .render_str("a {{ anything at all }} b", &Metadata::new())
        .unwrap();
    assert_eq!(rendered, "a [anything at all] b");
}

#[test]
fn dedent_removes_the_common_margin() {
    assert_eq!(dedent("    a\n      b\n    c"), "a\n  b\nc");
    assert_eq!(dedent("\n    a\n   \n    b\n"), "\na\n\nb\n");
    assert_eq!(dedent("\ta\n\t\tb"), "a\n\tb");
    assert_eq!(dedent("a\n    b"), "a\n    b");
    assert_eq!(dedent(" print(x) "), "print(x) ");
    assert_eq!(dedent(""), "");
}
