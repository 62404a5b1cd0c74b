//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use copydesk_catalog::{Catalog, CatalogHandle, CatalogSource, parse_spec_text};
use copydesk_core::pipeline::{GenerateRequest, GenerateResult, ProgressReporter};
use copydesk_core::{OutputFormat, write_outputs};
use copydesk_enrich::Enricher;
use copydesk_shared::{
    AppConfig, ComposeOptions, CopydeskError, EnrichmentOptions, ProductRecord, init_config,
    load_config,
};
use copydesk_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// copydesk: product descriptions from a catalog export.
#[derive(Parser)]
#[command(
    name = "copydesk",
    version,
    about = "Generate product descriptions, spec tables and SEO copy from a catalog export.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Catalog CSV, or a directory to take the newest CSV from.
    #[arg(long, global = true, env = "COPYDESK_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output file set for `generate`.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Html,
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => Self::Html,
            FormatArg::Markdown => Self::Markdown,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate description, spec table, meta description and title for a product.
    Generate {
        /// Product code, e.g. 03/185.
        code: String,

        /// Output root; files go to <out>/<code>/.
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Files to write.
        #[arg(short, long, value_enum, default_value = "html")]
        format: FormatArg,

        /// Manufacturer page to scrape (defaults to the catalog's website column).
        #[arg(long)]
        manufacturer_url: Option<String>,

        /// Add a web search snippet.
        #[arg(long)]
        search: bool,

        /// Skip all network enrichment.
        #[arg(long)]
        no_enrich: bool,

        /// Same-category products to analyze (overrides config).
        #[arg(long)]
        similar: Option<usize>,
    },

    /// Show the catalog record for a product code.
    Lookup {
        /// Product code.
        code: String,
    },

    /// Inspect the loaded catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Browse previously generated content.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Manage cached manufacturer pages.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// Source file, size, columns and load report.
    Info {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Product count per category.
    Categories,
    /// List products.
    List {
        /// Only this category (case-insensitive).
        #[arg(long)]
        category: Option<String>,

        /// Maximum rows to print.
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// History subcommands.
#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// Recent generations, newest first.
    List {
        /// Only this product code.
        #[arg(long)]
        code: Option<String>,

        /// Maximum rows to print.
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Print a stored generation.
    Show {
        /// Generation ID.
        id: String,
    },
    /// Mark a generation as published.
    MarkUsed {
        /// Generation ID.
        id: String,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Remove every cached enrichment entry.
    Clear,
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
        0 => "copydesk=info",
        1 => "copydesk=debug",
        _ => "copydesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
    let catalog = cli.catalog.as_deref();
    match cli.command {
        Command::Generate {
            code,
            out,
            format,
            manufacturer_url,
            search,
            no_enrich,
            similar,
        } => {
            let args = GenerateArgs {
                code,
                out,
                format: format.into(),
                manufacturer_url,
                search,
                no_enrich,
                similar,
            };
            cmd_generate(catalog, args).await
        }
        Command::Lookup { code } => cmd_lookup(catalog, &code),
        Command::Catalog { action } => match action {
            CatalogAction::Info { json } => cmd_catalog_info(catalog, json),
            CatalogAction::Categories => cmd_catalog_categories(catalog),
            CatalogAction::List { category, limit } => {
                cmd_catalog_list(catalog, category.as_deref(), limit)
            }
        },
        Command::History { action } => match action {
            HistoryAction::List { code, limit } => cmd_history_list(code.as_deref(), limit).await,
            HistoryAction::Show { id } => cmd_history_show(&id).await,
            HistoryAction::MarkUsed { id } => cmd_history_mark_used(&id).await,
        },
        Command::Cache { action } => match action {
            CacheAction::Clear => cmd_cache_clear().await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load the catalog. A missing source is fatal.
fn open_catalog(config: &AppConfig, override_path: Option<&Path>) -> Result<CatalogHandle> {
    let source = CatalogSource::from_config(&config.catalog, override_path);
    info!(source = %source, "loading catalog");
    let handle = CatalogHandle::open(source)?;
    Ok(handle)
}

/// Open the history database read-write. Failure only disables history.
async fn open_storage(config: &AppConfig) -> Option<Storage> {
    let path = match config.storage.resolved_db_path() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "cannot resolve database path, history disabled");
            return None;
        }
    };
    match Storage::open(&path).await {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open database, history disabled");
            None
        }
    }
}

/// Open the history database for reading. `None` when it does not exist yet.
async fn open_storage_readonly(config: &AppConfig) -> Result<Option<Storage>> {
    let path = config.storage.resolved_db_path()?;
    match Storage::open_readonly(&path).await {
        Ok(storage) => Ok(Some(storage)),
        Err(CopydeskError::FileNotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// generate / lookup
// ---------------------------------------------------------------------------

struct GenerateArgs {
    code: String,
    out: PathBuf,
    format: OutputFormat,
    manufacturer_url: Option<String>,
    search: bool,
    no_enrich: bool,
    similar: Option<usize>,
}

async fn cmd_generate(catalog_path: Option<&Path>, args: GenerateArgs) -> Result<()> {
    let config = load_config()?;
    let handle = open_catalog(&config, catalog_path)?;
    let catalog = handle.snapshot();

    let mut options = ComposeOptions::from(&config);
    if let Some(similar) = args.similar {
        options.similar_limit = similar;
    }

    let enricher = if args.no_enrich || !config.enrichment.enabled {
        if args.search || args.manufacturer_url.is_some() {
            warn!("enrichment disabled, ignoring --search and --manufacturer-url");
        }
        None
    } else {
        Some(Enricher::new(EnrichmentOptions::from(&config))?)
    };
    let storage = open_storage(&config).await;

    let request = GenerateRequest {
        code: args.code.clone(),
        manufacturer_url: args.manufacturer_url,
        search: args.search,
        cache_enrichment: config.storage.cache_enrichment,
    };

    info!(code = %request.code, format = %args.format, "generating product content");

    let reporter = CliProgress::new();
    let outcome = copydesk_core::generate(
        &catalog,
        &request,
        enricher.as_ref(),
        storage.as_ref(),
        &options,
        &reporter,
    )
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_recoverable() => {
            reporter.clear();
            println!("{e}");
            return Ok(());
        }
        Err(e) => {
            reporter.clear();
            return Err(e.into());
        }
    };

    let files = write_outputs(&args.out, &result.content, &result.specs, args.format)?;
    print_generate_summary(&result, &files);
    Ok(())
}

fn print_generate_summary(result: &GenerateResult, files: &[PathBuf]) {
    let content = &result.content;
    println!();
    println!("  Content generated!");
    println!("  Title:      {}", content.title);
    println!("  Code:       {}", content.code);
    println!("  Category:   {}", content.category);
    println!(
        "  Style:      {:.0}% confidence from {} similar products",
        content.style_confidence * 100.0,
        content.samples_used
    );
    if !content.enrichment_sources.is_empty() {
        println!("  Enriched:   {}", content.enrichment_sources.join(", "));
    }
    if !result.enrichment.unavailable.is_empty() {
        println!("  Skipped:    {} (unavailable)", result.enrichment.unavailable.join(", "));
    }
    println!("  Meta:       {}", content.meta_description);
    if let Some(id) = &result.generation_id {
        println!("  History ID: {id}");
    }
    if let Some(dir) = files.first().and_then(|f| f.parent()) {
        println!("  Output:     {}", dir.display());
    }
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn cmd_lookup(catalog_path: Option<&Path>, code: &str) -> Result<()> {
    let config = load_config()?;
    let handle = open_catalog(&config, catalog_path)?;
    let catalog = handle.snapshot();

    let record = match catalog.lookup(code) {
        Ok(record) => record,
        Err(e) if e.is_recoverable() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("  Code:        {}", record.code);
    println!("  Title:       {}", record.title);
    println!("  Category:    {}", record.category);
    println!("  Brand:       {}", record.brand);
    if !record.model.is_empty() {
        println!("  Model:       {}", record.model);
    }
    println!("  Power type:  {}", record.power_type);
    if let Some(output) = &record.power_output {
        println!("  Power:       {output}");
    }
    if let Some(website) = &record.manufacturer_website {
        println!("  Website:     {website}");
    }
    println!("  Spec rows:   {}", parse_spec_text(&record.spec_text).len());
    println!(
        "  Similar:     {}",
        catalog.style_samples(record, usize::MAX).len()
    );
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

fn cmd_catalog_info(catalog_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config()?;
    let handle = open_catalog(&config, catalog_path)?;
    let info = handle.snapshot().info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    if let Some(source) = &info.source {
        println!("  Source:     {}", source.path.display());
        println!("  Size:       {:.1} KB", source.size_bytes as f64 / 1024.0);
        if let Some(modified) = source.modified {
            println!("  Modified:   {}", modified.format("%Y-%m-%d %H:%M"));
        }
    }
    println!("  Products:   {}", info.total_products);
    println!("  Categories: {}", info.categories.len());
    println!("  Columns:    {}", info.columns.join(", "));

    let report = &info.report;
    println!(
        "  Rows:       {} read, {} skipped",
        report.rows_read, report.rows_skipped
    );
    if !report.duplicate_codes.is_empty() {
        println!(
            "  Duplicates: {} (later rows kept)",
            report.duplicate_codes.join(", ")
        );
    }
    if !report.missing_fields.is_empty() {
        println!("  Missing:    {}", report.missing_fields.join(", "));
    }
    if !report.ignored_headers.is_empty() {
        println!("  Ignored:    {}", report.ignored_headers.join(", "));
    }
    println!();
    Ok(())
}

fn cmd_catalog_categories(catalog_path: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let handle = open_catalog(&config, catalog_path)?;

    for (category, count) in handle.snapshot().categories() {
        println!("{count:>6}  {category}");
    }
    Ok(())
}

fn cmd_catalog_list(
    catalog_path: Option<&Path>,
    category: Option<&str>,
    limit: usize,
) -> Result<()> {
    let config = load_config()?;
    let handle = open_catalog(&config, catalog_path)?;
    let catalog: &Catalog = &handle.snapshot();

    let records: Box<dyn Iterator<Item = &ProductRecord> + '_> = match category {
        Some(category) => Box::new(catalog.by_category(category)),
        None => Box::new(catalog.iter()),
    };

    let mut shown = 0;
    for record in records.take(limit) {
        println!("{:<10}  {:<24}  {}", record.code, record.category, record.title);
        shown += 1;
    }
    if shown == 0 {
        println!("No products found.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

async fn cmd_history_list(code: Option<&str>, limit: u32) -> Result<()> {
    let config = load_config()?;
    let Some(storage) = open_storage_readonly(&config).await? else {
        println!("No generation history yet.");
        return Ok(());
    };

    let rows = storage.list_generations(code, limit).await?;
    if rows.is_empty() {
        println!("No generations found.");
        return Ok(());
    }
    for row in rows {
        println!(
            "{}  {}  {:<10}  {:>4.0}%  {}  {}",
            row.id,
            row.created_at.format("%Y-%m-%d %H:%M"),
            row.code,
            row.confidence * 100.0,
            if row.used { "used" } else { "    " },
            row.title
        );
    }
    Ok(())
}

async fn cmd_history_show(id: &str) -> Result<()> {
    let config = load_config()?;
    let Some(storage) = open_storage_readonly(&config).await? else {
        println!("No generation history yet.");
        return Ok(());
    };

    let Some(record) = storage.get_generation(id).await? else {
        println!("Not found: generation '{id}'");
        return Ok(());
    };

    let content = &record.content;
    println!("Title:    {}", content.title);
    println!("Code:     {}", content.code);
    println!("Created:  {}", record.summary.created_at.to_rfc3339());
    match record.used_at {
        Some(at) => println!("Used:     {}", at.to_rfc3339()),
        None => println!("Used:     no"),
    }
    println!("Meta:     {}", content.meta_description);
    println!();
    println!("{}", content.description_html);
    println!();
    println!("{}", content.spec_table_html);
    Ok(())
}

async fn cmd_history_mark_used(id: &str) -> Result<()> {
    let config = load_config()?;
    let path = config.storage.resolved_db_path()?;
    let storage = Storage::open(&path).await?;

    if storage.mark_generation_used(id).await? {
        println!("Marked {id} as used.");
        Ok(())
    } else {
        Err(eyre!("no generation with ID '{id}'"))
    }
}

// ---------------------------------------------------------------------------
// cache
// ---------------------------------------------------------------------------

async fn cmd_cache_clear() -> Result<()> {
    let config = load_config()?;
    let path = config.storage.resolved_db_path()?;
    if !path.is_file() {
        println!("No enrichment cache yet.");
        return Ok(());
    }

    let storage = Storage::open(&path).await?;
    let removed = storage.clear_enrichment_cache().await?;
    info!(removed, "enrichment cache cleared");
    println!("Removed {removed} cached enrichment entries.");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GenerateResult) {
        self.clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
