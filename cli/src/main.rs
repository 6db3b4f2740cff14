mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{Level, info};

use interpreter::{ExecutionError, Interpreter};
use litpage::{Document, LiterateError, Metadata, TemplateEngine, TemplateOptions};

use crate::config::{DEFAULT_CONFIG, SiteConfig};

#[derive(Parser)]
#[command(name = "litpage", version, about = "Render literate source files to HTML")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the body of a literate file to HTML
    Html(HtmlArgs),

    /// Render a template, substituting its {{ ... }} expressions
    Render(RenderArgs),

    /// Print the metadata block of a literate file as JSON (runs no code)
    Meta(MetaArgs),

    /// Render every page listed in a site config
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct HtmlArgs {
    /// Literate source file
    file: PathBuf,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template file
    file: PathBuf,

    /// JSON file holding an object to start the template data from
    #[arg(long)]
    data: Option<PathBuf>,

    /// Set a data key. VALUE is parsed as JSON, falling back to a string. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Extension of files treated as literate sources
    #[arg(long, default_value = "lit")]
    literate_extension: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct MetaArgs {
    /// Literate source file
    file: PathBuf,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Site config file
    #[arg(default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let result = match cli.command {
        Command::Html(args) => do_html(args),
        Command::Render(args) => do_render(args),
        Command::Meta(args) => do_meta(args),
        Command::Build(args) => do_build(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error, color_choice);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn do_html(args: HtmlArgs) -> anyhow::Result<()> {
    let source = read(&args.file)?;
    let (body, _) = litpage::assemble(&source, &Interpreter::new())
        .with_context(|| format!("cannot render {}", args.file.display()))?;
    write_output(args.output.as_deref(), &body)
}

fn do_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut data = match &args.data {
        Some(path) => serde_json::from_str::<Metadata>(&read(path)?)
            .with_context(|| format!("{} is not a JSON object", path.display()))?,
        None => Metadata::new(),
    };
    for assignment in &args.set {
        let (key, value) = parse_set(assignment)?;
        data.insert(key, value);
    }

    let engine = TemplateEngine::new(TemplateOptions {
        literate_extension: args.literate_extension,
        ..TemplateOptions::default()
    });
    let rendered = engine
        .render_template(&args.file, Some(data))
        .with_context(|| format!("cannot render {}", args.file.display()))?;
    write_output(args.output.as_deref(), &rendered)
}

fn do_meta(args: MetaArgs) -> anyhow::Result<()> {
    let document = Document::from_source(&read(&args.file)?)
        .with_context(|| format!("cannot parse {}", args.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&document.metadata)?);
    Ok(())
}

fn do_build(args: BuildArgs) -> anyhow::Result<()> {
    let config = SiteConfig::load(&args.config)?;
    let shared = config.shared_data()?;
    let engine = TemplateEngine::new(TemplateOptions {
        literate_extension: config.literate_extension.clone(),
        ..TemplateOptions::default()
    });

    for page in &config.pages {
        let document = Document::from_source(&read(page)?)
            .with_context(|| format!("cannot parse {}", page.display()))?;
        let output = document
            .metadata
            .get(&config.output_key)
            .and_then(serde_json::Value::as_str)
            .map(|relative| config.output_path(relative))
            .with_context(|| {
                format!(
                    "{} has no string \"{}\" metadata key",
                    page.display(),
                    config.output_key
                )
            })?;

        let mut data = shared.clone();
        data.extend(document.metadata);
        data.insert(
            config.body_key.clone(),
            page.to_string_lossy().into_owned().into(),
        );

        let rendered = engine
            .render_template(&config.template, Some(data))
            .with_context(|| format!("cannot render {}", page.display()))?;
        write_output(Some(&output), &rendered)?;
        info!(page = %page.display(), output = %output.display(), "wrote page");
    }

    eprintln!("built {} page(s)", config.pages.len());
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let Some(path) = output else {
        println!("{}", text);
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

/// Split `KEY=VALUE`. Values that parse as JSON keep their type; anything
/// else is a string.
fn parse_set(assignment: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got {:?}", assignment))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Print the error chain, then point at the embedded code that failed when
/// there is one.
fn report(error: &anyhow::Error, color_choice: ColorChoice) {
    eprintln!("error: {:#}", error);

    let Some(failure) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<LiterateError>())
    else {
        return;
    };
    let Some((code, execution_error)) = failure.failing_code() else {
        return;
    };

    let name = match failure {
        LiterateError::Execution { line, .. } => format!("code segment at line {}", line),
        LiterateError::Expression { origin, index, .. } => {
            format!("{} expression #{}", origin, index)
        }
        _ => "embedded code".to_string(),
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(name, code.to_string());
    let diagnostic = match execution_error {
        ExecutionError::Parse(e) => e.to_diagnostic(file_id),
        ExecutionError::Runtime(e) => {
            let labels = e
                .span
                .clone()
                .map(|span| vec![Label::primary(file_id, span)])
                .unwrap_or_default();
            Diagnostic::error()
                .with_message(e.to_string())
                .with_labels(labels)
        }
    };

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
}
