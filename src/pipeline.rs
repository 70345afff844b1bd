//! Generation pipeline: extract, select, render every filter in parallel,
//! then render the index once all builders are written.

use crate::extract::{extract, ExtractError, ExtractOptions};
use crate::model::FilterRecord;
use crate::render::{view, RenderError, RenderedFile, Renderer};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Filters whose option syntax needs hand-written escaping (expressions,
/// embedded commands, free text), so they are never generated.
pub const DENY_LIST: &[&str] = &[
    "aeval", "aevalsrc", "aselect", "asendcmd", "azmq", "drawtext", "geq", "select", "sendcmd",
    "zmq",
];

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {name}: {source}")]
    Write { name: String, source: io::Error },
}

/// Pipeline configuration for [`run`].
#[derive(Debug, Clone, Default)]
pub struct GenerateConfig {
    pub extract: ExtractOptions,
    /// Filter names to generate; empty means all
    pub allow: Vec<String>,
}

/// What a successful run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Builder outputs, in selection order
    pub filters: Vec<String>,
    pub index: String,
}

// -- Sinks --------------------------------------------------------------------

/// Destination for rendered outputs. Called concurrently.
pub trait Sink: Sync {
    fn write(&self, name: &str, content: &str) -> io::Result<()>;
}

/// Writes `<dir>/<name>.<extension>`, creating `dir` on first use.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    extension: String,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        debug!(dir = %self.dir.display(), "creating output directory");
        // create_dir_all succeeds if another writer created it first
        fs::create_dir_all(&self.dir)
    }
}

impl Sink for DirSink {
    fn write(&self, name: &str, content: &str) -> io::Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(format!("{}.{}", name, self.extension));
        debug!(path = %path.display(), "writing");
        fs::write(path, content)
    }
}

// -- Selection ----------------------------------------------------------------

/// Drop deny-listed filters, keep only allow-listed ones when `allow` is
/// non-empty, and keep the first of filters that would share an output name
/// or a builder type name. Order-preserving and idempotent.
pub fn select(records: Vec<FilterRecord>, allow: &[String]) -> Vec<FilterRecord> {
    let mut modules = HashSet::new();
    let mut types = HashSet::new();
    records
        .into_iter()
        .filter(|r| !DENY_LIST.contains(&r.name.as_str()))
        .filter(|r| allow.is_empty() || allow.iter().any(|a| *a == r.name))
        .filter(|r| {
            let module = view::ident(&r.name);
            let type_name = view::type_name(&r.name);
            let unique = !modules.contains(&module) && !types.contains(&type_name);
            if unique {
                modules.insert(module);
                types.insert(type_name);
            } else {
                warn!(filter = %r.name, "duplicate filter skipped");
            }
            unique
        })
        .collect()
}

// -- Pipeline -----------------------------------------------------------------

/// Extract filters from `markup`, select, and generate them into `sink`.
pub fn run<S: Sink + ?Sized>(
    markup: &str,
    config: &GenerateConfig,
    renderer: &Renderer,
    sink: &S,
) -> Result<Summary, PipelineError> {
    let records = extract(markup, &config.extract)?;
    let extracted = records.len();
    let records = select(records, &config.allow);
    info!(extracted, selected = records.len(), "filters selected");
    generate(&records, renderer, sink)
}

/// Render and write every builder in parallel, then the index.
/// The first failure is returned; outputs already written stay on disk.
pub fn generate<S: Sink + ?Sized>(
    records: &[FilterRecord],
    renderer: &Renderer,
    sink: &S,
) -> Result<Summary, PipelineError> {
    records.par_iter().try_for_each(|record| {
        let file = renderer.render_filter(record)?;
        write(sink, &file)
    })?;

    let index = renderer.render_index(records)?;
    write(sink, &index)?;

    Ok(Summary {
        filters: records.iter().map(|r| view::ident(&r.name)).collect(),
        index: index.name,
    })
}

fn write<S: Sink + ?Sized>(sink: &S, file: &RenderedFile) -> Result<(), PipelineError> {
    sink.write(&file.name, &file.content)
        .map_err(|source| PipelineError::Write {
            name: file.name.clone(),
            source,
        })
}
