//! End-to-end batch runs: input file -> per-record processing -> output file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use qagraph_nlp::{CorefResolver, DependencyParser, Tagger, tokenize};
use qagraph_shared::{CacheScope, QaGraphError, Result, SplitRecord, SquadDataset};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::graph::GraphBuilder;
use crate::reshape::{self, Annotator};

/// Input/output and slicing for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Path to the input JSON file.
    pub input: PathBuf,
    /// Path to the output JSON file.
    pub output: PathBuf,
    /// First record to process (inclusive).
    pub start: Option<usize>,
    /// Record to stop before (exclusive).
    pub end: Option<usize>,
    /// Lifetime of the single-entry caches.
    pub cache_scope: CacheScope,
}

/// Summary of a completed batch run.
#[derive(Debug)]
pub struct BatchResult {
    /// Records written to the output file.
    pub records: usize,
    /// Service responses served from cache.
    pub cache_hits: usize,
    /// Service responses that had to be fetched.
    pub cache_misses: usize,
    /// Where the output went.
    pub output: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the slice to process is known.
    fn start(&self, total: usize);
    /// Called after each record.
    fn record_done(&self, id: &str, current: usize, total: usize);
    /// Called when the batch completes.
    fn done(&self, result: &BatchResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn start(&self, _total: usize) {}
    fn record_done(&self, _id: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BatchResult) {}
}

// ---------------------------------------------------------------------------
// Graph batch
// ---------------------------------------------------------------------------

/// Attach a fused graph to every split record in the input slice.
///
/// Stops at the first record whose graph does not cover its tokens one-to-one;
/// nothing is written in that case.
#[instrument(skip_all, fields(input = %config.input.display()))]
pub async fn run_graph_batch<C, P>(
    config: &BatchConfig,
    builder: &mut GraphBuilder<C, P>,
    progress: &dyn ProgressReporter,
) -> Result<BatchResult>
where
    C: CorefResolver,
    P: DependencyParser,
{
    let started = Instant::now();

    progress.phase("Reading split records");
    let records: Vec<SplitRecord> = read_json(&config.input)?;
    let range = slice_bounds(records.len(), config.start, config.end);
    let total = range.len();
    info!(available = records.len(), selected = total, "building graphs");

    progress.start(total);
    let mut out = Vec::with_capacity(total);
    for (i, mut record) in records.into_iter().skip(range.start).take(total).enumerate() {
        if config.cache_scope == CacheScope::Document {
            builder.clear_cache();
        }
        attach_graph(builder, &mut record).await?;
        progress.record_done(&record.id, i + 1, total);
        out.push(record);
    }

    progress.phase("Writing output");
    write_json(&config.output, &out)?;

    let result = BatchResult {
        records: out.len(),
        cache_hits: builder.cache().hits(),
        cache_misses: builder.cache().misses(),
        output: config.output.clone(),
        elapsed: started.elapsed(),
    };
    progress.done(&result);
    info!(
        records = result.records,
        cache_hits = result.cache_hits,
        cache_misses = result.cache_misses,
        elapsed_ms = result.elapsed.as_millis(),
        "graph batch complete"
    );
    Ok(result)
}

/// Build and attach the graph for one record, enforcing the token-count invariant.
pub async fn attach_graph<C, P>(
    builder: &mut GraphBuilder<C, P>,
    record: &mut SplitRecord,
) -> Result<()>
where
    C: CorefResolver,
    P: DependencyParser,
{
    let tokens = tokenize::whitespace_tokens(&record.annotation1.toks);
    let graph = builder.build(&tokens.join(" ")).await?;

    if graph.g_features.len() != tokens.len() {
        tracing::error!(
            id = %record.id,
            input = ?tokens,
            graph = ?graph.g_features,
            "graph tokens do not match input tokens"
        );
        return Err(QaGraphError::GraphMismatch {
            id: record.id.clone(),
            expected: tokens.len(),
            actual: graph.g_features.len(),
        });
    }

    record.annotation1.graph = Some(graph);
    Ok(())
}

// ---------------------------------------------------------------------------
// Reshape batch
// ---------------------------------------------------------------------------

/// Flatten a nested dataset and tag every record in the slice into the split format.
#[instrument(skip_all, fields(input = %config.input.display()))]
pub async fn run_reshape_batch<T>(
    config: &BatchConfig,
    annotator: &mut Annotator<T>,
    progress: &dyn ProgressReporter,
) -> Result<BatchResult>
where
    T: Tagger,
{
    let started = Instant::now();

    progress.phase("Flattening dataset");
    let dataset: SquadDataset = read_json(&config.input)?;
    let flat = reshape::flatten(&dataset);
    let range = slice_bounds(flat.len(), config.start, config.end);
    let total = range.len();
    info!(available = flat.len(), selected = total, "annotating records");

    progress.start(total);
    let mut out = Vec::with_capacity(total);
    for (i, record) in flat[range].iter().enumerate() {
        if config.cache_scope == CacheScope::Document {
            annotator.clear_cache();
        }
        out.push(annotator.annotate(record).await?);
        progress.record_done(&record.id, i + 1, total);
    }

    progress.phase("Writing output");
    write_json(&config.output, &out)?;

    let result = BatchResult {
        records: out.len(),
        cache_hits: annotator.cache().hits(),
        cache_misses: annotator.cache().misses(),
        output: config.output.clone(),
        elapsed: started.elapsed(),
    };
    progress.done(&result);
    info!(
        records = result.records,
        cache_hits = result.cache_hits,
        cache_misses = result.cache_misses,
        elapsed_ms = result.elapsed.as_millis(),
        "reshape batch complete"
    );
    Ok(result)
}

/// Flatten a nested dataset file into flat records. Returns the record count.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn run_flatten(input: &Path, output: &Path) -> Result<usize> {
    let dataset: SquadDataset = read_json(input)?;
    let flat = reshape::flatten(&dataset);
    write_json(output, &flat)?;
    info!(records = flat.len(), "flatten complete");
    Ok(flat.len())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Half-open record range for `--start`/`--end`, clamped to `len`.
pub fn slice_bounds(len: usize, start: Option<usize>, end: Option<usize>) -> Range<usize> {
    let end = end.map_or(len, |e| e.min(len));
    let start = start.unwrap_or(0).min(end);
    start..end
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| QaGraphError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| QaGraphError::parse(format!("{}: {e}", path.display())))
}

/// Serialize `value` as JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| QaGraphError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| QaGraphError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .map_err(|e| QaGraphError::parse(format!("{}: {e}", path.display())))?;
    writer.flush().map_err(|e| QaGraphError::io(path, e))
}
