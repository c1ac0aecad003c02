//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use qagraph_core::graph::GraphBuilder;
use qagraph_core::pipeline::{self, BatchConfig, BatchResult, ProgressReporter};
use qagraph_core::reshape::Annotator;
use qagraph_nlp::NlpClients;
use qagraph_shared::{
    AppConfig, CacheScope, ServiceEndpoints, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// qagraph: reshape QA datasets and annotate them with linguistic graphs.
#[derive(Parser)]
#[command(
    name = "qagraph",
    version,
    about = "Reshape QA datasets and annotate them with dependency/coreference graphs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.qagraph/qagraph.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Cache lifetime override.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum CacheScopeArg {
    Batch,
    Document,
}

impl From<CacheScopeArg> for CacheScope {
    fn from(arg: CacheScopeArg) -> Self {
        match arg {
            CacheScopeArg::Batch => CacheScope::Batch,
            CacheScopeArg::Document => CacheScope::Document,
        }
    }
}

/// Input/output and slicing flags shared by the batch commands.
#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Path to the input JSON file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to the output JSON file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// First record to process (inclusive).
    #[arg(long)]
    pub start: Option<usize>,

    /// Record to stop before (exclusive).
    #[arg(long)]
    pub end: Option<usize>,

    /// Override the configured cache scope.
    #[arg(long)]
    pub cache_scope: Option<CacheScopeArg>,
}

impl BatchArgs {
    fn into_batch_config(self, config: &AppConfig) -> BatchConfig {
        BatchConfig {
            input: self.input,
            output: self.output,
            start: self.start,
            end: self.end,
            cache_scope: self
                .cache_scope
                .map_or(config.cache.scope, CacheScope::from),
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Attach fused dependency/coreference graphs to split-format records.
    Graph(BatchArgs),

    /// Flatten a nested QA dataset and tag it into the split format.
    Reshape(BatchArgs),

    /// Flatten a nested QA dataset into flat records only.
    Flatten {
        /// Path to the nested dataset.
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output JSON file.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "qagraph=info",
        1 => "qagraph=debug",
        _ => "qagraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs share stderr with the progress bar; stdout carries only the summary.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Graph(args) => cmd_graph(config_path.as_deref(), args).await,
        Command::Reshape(args) => cmd_reshape(config_path.as_deref(), args).await,
        Command::Flatten { input, output } => cmd_flatten(&input, &output),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn service_clients(config: &AppConfig) -> Result<NlpClients> {
    let endpoints = ServiceEndpoints::try_from(&config.services)?;
    info!(
        coref = %endpoints.coref,
        parser = %endpoints.parser,
        tagger = %endpoints.tagger,
        "using NLP services"
    );
    Ok(NlpClients::new(&endpoints)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_graph(config_path: Option<&Path>, args: BatchArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let clients = service_clients(&config)?;
    let batch = args.into_batch_config(&config);

    info!(
        input = %batch.input.display(),
        output = %batch.output.display(),
        start = ?batch.start,
        end = ?batch.end,
        cache_scope = ?batch.cache_scope,
        "building graphs"
    );

    let mut builder = GraphBuilder::new(clients.coref, clients.parser);
    let reporter = CliProgress::new()?;
    let result = pipeline::run_graph_batch(&batch, &mut builder, &reporter)
        .await
        .wrap_err("graph annotation aborted")?;

    print_summary("Graphs attached", &result);
    Ok(())
}

async fn cmd_reshape(config_path: Option<&Path>, args: BatchArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let clients = service_clients(&config)?;
    let batch = args.into_batch_config(&config);

    info!(
        input = %batch.input.display(),
        output = %batch.output.display(),
        cache_scope = ?batch.cache_scope,
        "reshaping dataset"
    );

    let mut annotator = Annotator::new(clients.tagger);
    let reporter = CliProgress::new()?;
    let result = pipeline::run_reshape_batch(&batch, &mut annotator, &reporter).await?;

    print_summary("Dataset reshaped", &result);
    Ok(())
}

fn cmd_flatten(input: &Path, output: &Path) -> Result<()> {
    let count = pipeline::run_flatten(input, output)?;
    println!("Flattened {count} records into {}", output.display());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(title: &str, result: &BatchResult) {
    println!();
    println!("  {title}!");
    println!("  Records:      {}", result.records);
    println!("  Cache hits:   {}", result.cache_hits);
    println!("  Cache misses: {}", result.cache_misses);
    println!("  Output:       {}", result.output.display());
    println!("  Time:         {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { bar })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn start(&self, total: usize) {
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}",
        ) {
            self.bar.set_style(style);
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn record_done(&self, id: &str, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
        self.bar.set_message(id.to_string());
    }

    fn done(&self, _result: &BatchResult) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn graph_flags_parse() {
        let cli = Cli::try_parse_from([
            "qagraph", "graph", "-i", "in.json", "-o", "out.json", "--start", "5", "--end", "9",
        ])
        .unwrap();
        match cli.command {
            Command::Graph(args) => {
                assert_eq!(args.input, PathBuf::from("in.json"));
                assert_eq!(args.start, Some(5));
                assert_eq!(args.end, Some(9));
                assert!(args.cache_scope.is_none());
            }
            _ => panic!("expected graph command"),
        }
    }

    #[test]
    fn cache_scope_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "qagraph",
            "reshape",
            "--input",
            "raw.json",
            "--output",
            "split.json",
            "--cache-scope",
            "document",
        ])
        .unwrap();
        let Command::Reshape(args) = cli.command else {
            panic!("expected reshape command");
        };
        let batch = args.into_batch_config(&AppConfig::default());
        assert_eq!(batch.cache_scope, CacheScope::Document);
        assert_eq!(batch.start, None);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["qagraph", "graph", "-o", "out.json"]).is_err());
    }
}
