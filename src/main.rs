//! Site Planner CLI
//!
//! Usage:
//!   site-planner [OPTIONS] [FILE]
//!
//! Options:
//!   --format <FORMAT>        Document format: json or toml (default: from extension)
//!   -c, --config <FILE>      Layout tunables (TOML format)
//!   -s, --stylesheet <FILE>  Stylesheet file for color palette (TOML format)
//!   --change <FILE>          Change event (JSON) applied before planning
//!   --svg                    Print the layout as SVG instead of JSON
//!   --data-uri               Print the SVG as a base64 data URI
//!   --emit-document          Print the (changed) document and stop
//!   -d, --debug              Debug logging on stderr
//!   -h, --help               Print help
//!
//! Exit status: 0 on success, 2 when no valid layout was found, 1 on
//! malformed input or I/O errors.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use site_planner::{
    change, parse, plan_with_config, render_layout, to_data_uri, ChangeEvent, Document,
    DocumentFormat, LayoutConfig, Outcome, PlanConfig, PlanError, Stylesheet,
};

#[derive(Parser)]
#[command(name = "site-planner")]
#[command(about = "Place rooms and features on a rectangular plot")]
struct Cli {
    /// Constraint document (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Document format (defaults to the file extension, else JSON)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Layout tunables file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stylesheet file for color palette (TOML format)
    #[arg(short, long)]
    stylesheet: Option<PathBuf>,

    /// Change event file (JSON) applied to the document before planning
    #[arg(long)]
    change: Option<PathBuf>,

    /// Print the layout as SVG instead of the JSON outcome
    #[arg(long)]
    svg: bool,

    /// Print the SVG as a base64 data URI
    #[arg(long)]
    data_uri: bool,

    /// Print the document (after --change) as JSON and stop
    #[arg(long)]
    emit_document: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Toml,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => DocumentFormat::Json,
            FormatArg::Toml => DocumentFormat::Toml,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    // Load layout tunables
    let layout = match &cli.config {
        Some(path) => match LayoutConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => fail(&format!("Error loading config '{}': {}", path.display(), e)),
        },
        None => LayoutConfig::default(),
    };

    // Load stylesheet
    let stylesheet = match &cli.stylesheet {
        Some(path) => match Stylesheet::from_file(path) {
            Ok(s) => s,
            Err(e) => fail(&format!(
                "Error loading stylesheet '{}': {}",
                path.display(),
                e
            )),
        },
        None => Stylesheet::default(),
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => fail(&format!("Error reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => fail(&format!("Error reading from stdin: {}", e)),
            }
        }
    };

    let format = cli
        .format
        .map(DocumentFormat::from)
        .or_else(|| cli.input.as_deref().map(DocumentFormat::from_path))
        .unwrap_or_default();

    let mut doc = match parse(&source, format) {
        Ok(doc) => doc,
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            process::exit(1);
        }
    };

    if let Some(path) = &cli.change {
        doc = apply_change(&doc, path);
    }

    if cli.emit_document {
        print_json(&doc);
        return;
    }

    let config = PlanConfig::new()
        .with_layout(layout)
        .with_stylesheet(stylesheet);

    let outcome = match plan_with_config(&doc, &config) {
        Ok(outcome) => outcome,
        Err(PlanError::Malformed(e)) => {
            eprint!("{}", e.format(&source, &filename));
            process::exit(1);
        }
        Err(e) => fail(&format!("Error: {}", e)),
    };

    match &outcome {
        Outcome::Success(layout) if cli.svg || cli.data_uri => {
            let svg = render_layout(layout, &config);
            if cli.data_uri {
                println!("{}", to_data_uri(&svg));
            } else {
                println!("{}", svg);
            }
        }
        Outcome::Success(_) => print_json(&outcome),
        Outcome::Failure(_) => {
            print_json(&outcome);
            process::exit(2);
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("site_planner=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_change(doc: &Document, path: &Path) -> Document {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => fail(&format!(
            "Error reading change event '{}': {}",
            path.display(),
            e
        )),
    };
    let event: ChangeEvent = match serde_json::from_str(&text) {
        Ok(event) => event,
        Err(e) => fail(&format!(
            "Error parsing change event '{}': {}",
            path.display(),
            e
        )),
    };
    match change::apply(doc, &event) {
        Ok(doc) => doc,
        Err(e) => fail(&format!("Error applying change: {}", e)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error serializing output: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
