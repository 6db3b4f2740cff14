use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn litpage(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_litpage"))
        .arg("--no-color")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to spawn litpage")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const POST: &str = "# {\"TITLE\": \"First\", \"OUTPUT\": \"out/first.html\"}\n\n# Counting.\n\nfor i in range(3) {\n  print(i)\n}\n";

#[test]
fn html_prints_the_rendered_body() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("post.lit"), POST).unwrap();

    let output = litpage(&["html", "post.lit"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "<p>\nCounting.\n</p>\n<pre>for i in range(3) {\n  print(i)\n}</pre>\n<pre># stdout\n0\n1\n2\n</pre>\n"
    );
}

#[test]
fn meta_prints_metadata_without_running_code() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("post.lit"),
        "# {\"TITLE\": \"T\", \"n\": 2}\nprint(missing)\n",
    )
    .unwrap();

    let output = litpage(&["meta", "post.lit"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let metadata: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(metadata, serde_json::json!({"TITLE": "T", "n": 2}));
}

#[test]
fn render_takes_data_from_flags() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("page.html"),
        "{{ print(name) }} has {{ print(count + 1) }}",
    )
    .unwrap();
    fs::write(dir.path().join("data.json"), r#"{"name": "base", "count": 1}"#).unwrap();

    let output = litpage(
        &[
            "render",
            "page.html",
            "--data",
            "data.json",
            "--set",
            "name=Ada",
            "--set",
            "count=41",
            "-o",
            "out/page.html",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        fs::read_to_string(dir.path().join("out/page.html")).unwrap(),
        "Ada has 42"
    );
}

#[test]
fn build_renders_every_configured_page() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("posts")).unwrap();
    fs::write(dir.path().join("posts/first.lit"), POST).unwrap();
    fs::write(
        dir.path().join("layout.html"),
        "<h1>{{ print(site) }}: {{ print(TITLE) }}</h1>\n{{ print(render_template(BODYPATH)) }}",
    )
    .unwrap();
    fs::write(
        dir.path().join("litpage.toml"),
        "template = \"layout.html\"\npages = [\"posts/first.lit\"]\n\n[data]\nsite = \"Blog\"\n",
    )
    .unwrap();

    let output = litpage(&["build"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let page = fs::read_to_string(dir.path().join("out/first.html")).unwrap();
    assert!(page.starts_with("<h1>Blog: First</h1>\n<p>\nCounting.\n</p>"));
    assert!(page.ends_with("<pre># stdout\n0\n1\n2\n</pre>"));
}

#[test]
fn build_requires_an_output_key() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.lit"), "# {\"TITLE\": \"x\"}\n").unwrap();
    fs::write(dir.path().join("layout.html"), "").unwrap();
    fs::write(
        dir.path().join("site.toml"),
        "template = \"layout.html\"\npages = [\"page.lit\"]\n",
    )
    .unwrap();

    let output = litpage(&["build", "site.toml"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("has no string \"OUTPUT\" metadata key"));
}

#[test]
fn failing_code_exits_with_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("bad.lit"),
        "# {}\nprint(1)\n# Then:\nx = 1\nprint(x + nope)\n",
    )
    .unwrap();

    let output = litpage(&["html", "bad.lit"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("code starting at line 4 failed"), "{}", err);
    assert!(err.contains("undefined variable: nope"), "{}", err);
    assert!(err.contains("code segment at line 4"), "{}", err);
    assert!(stdout(&output).is_empty());
}

#[test]
fn invalid_metadata_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.lit"), "# not json\nprint(1)\n").unwrap();

    let output = litpage(&["html", "bad.lit"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid metadata block at line 1"));
}
