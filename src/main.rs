//! filtergen: generate filter builder sources from the FFmpeg filter documentation.
//!
//! Reads the documentation page (by default straight from ffmpeg.org), extracts
//! every filter with its parameters and allowed values, and renders one builder
//! per filter plus an index module:
//!
//! - **generate** (default): `filtergen -o src/filters [scale crop ...]`
//! - **inspect**: `filtergen -i ffmpeg-filters.html --list` or `--json`

mod extract;
mod model;
mod pipeline;
mod render;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "filtergen",
    about = "Generate filter builder sources from the FFmpeg filter documentation"
)]
struct Cli {
    /// Filters to generate. If omitted, every documented filter is generated.
    filters: Vec<String>,

    /// Documentation source: URL, HTML file, or - for stdin
    #[arg(short = 'i', long, default_value = source::DEFAULT_URL)]
    input: String,

    /// Output directory, created if missing
    #[arg(short = 'o', long, default_value = "generated")]
    output: PathBuf,

    /// Extension of generated files
    #[arg(short = 'e', long, default_value = "rs")]
    extension: String,

    /// Tag name of the headings that title a filter
    #[arg(long, default_value = "h3")]
    heading: String,

    /// Fail on malformed markup instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Template file replacing the built-in builder template
    #[arg(long)]
    builder_template: Option<PathBuf>,

    /// Template file replacing the built-in index template
    #[arg(long)]
    index_template: Option<PathBuf>,

    /// Print selected filters with their parameter counts; write nothing
    #[arg(long, conflicts_with = "json")]
    list: bool,

    /// Print selected filters as JSON; write nothing
    #[arg(long)]
    json: bool,

    /// Trace extraction and generation on stderr
    #[arg(short = 'd', long)]
    debug: bool,
}

impl Cli {
    fn generate_config(&self) -> pipeline::GenerateConfig {
        pipeline::GenerateConfig {
            extract: extract::ExtractOptions {
                heading: self.heading.to_ascii_lowercase(),
                strict: self.strict,
            },
            allow: self.filters.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let markup = source::Source::parse(&cli.input)
        .read()
        .context("failed to load filter documentation")?;

    if cli.list || cli.json {
        return inspect_mode(&cli, &markup);
    }

    generate_mode(&cli, &markup)
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "filtergen=trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// generate mode: render every selected filter and the index into the output directory.
fn generate_mode(cli: &Cli, markup: &str) -> Result<()> {
    let renderer = render::Renderer::new(&render::TemplatePaths {
        builder: cli.builder_template.clone(),
        index: cli.index_template.clone(),
    })
    .context("failed to load templates")?;
    let sink = pipeline::DirSink::new(&cli.output, &cli.extension);

    let summary = pipeline::run(markup, &cli.generate_config(), &renderer, &sink)?;
    info!(modules = %summary.filters.join(" "), "builders written");

    println!(
        "generated {} filters and {}.{} in {}",
        summary.filters.len(),
        summary.index,
        cli.extension,
        sink.dir().display()
    );
    Ok(())
}

/// inspect mode: print what would be generated.
fn inspect_mode(cli: &Cli, markup: &str) -> Result<()> {
    let config = cli.generate_config();
    let records = pipeline::select(extract::extract(markup, &config.extract)?, &config.allow);

    if cli.json {
        let json = serde_json::to_string_pretty(&records).context("failed to serialize filters")?;
        println!("{}", json);
        return Ok(());
    }

    for record in &records {
        println!("{}\t{}", record.name, record.parameters.len());
    }
    Ok(())
}
