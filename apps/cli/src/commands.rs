//! CLI command definitions, routing, and tracing setup.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docindex_core::links::{parse_base_url, resolve_location};
use docindex_core::{
    SearchEngine, SearchFilter, build_outline, check_index, check_round_trip,
    diff_indexes, index_stats,
};
use docindex_parser::{IndexFormat, read_index, render_index};
use docindex_shared::{
    AppConfig, Category, Location, SearchSettings, expand_home, init_config, load_config,
    load_config_from,
};
use docindex_storage::{ImportOutcome, Storage};
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docindex: inspect, check and search generated documentation search indexes.
#[derive(Parser)]
#[command(
    name = "docindex",
    version,
    about = "Inspect, check and search generated documentation search indexes.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.docindex/docindex.toml.
    #[arg(long, global = true, env = "DOCINDEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Entry category filter.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum CategoryArg {
    Page,
    Section,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Page => Category::Page,
            CategoryArg::Section => Category::Section,
        }
    }
}

/// Output layout for written indexes.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Js,
    Json,
}

impl From<FormatArg> for IndexFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Js => IndexFormat::DocumenterJs,
            FormatArg::Json => IndexFormat::Json,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check an index for duplicate locations, unknown categories and title mismatches.
    Check {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Treat warnings as failures.
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search an index and print ranked hits.
    Search {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Query terms.
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of hits (0 for all).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only entries of this category.
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,

        /// Only entries of this page title.
        #[arg(long)]
        page: Option<String>,

        /// Documentation base URL; prints absolute links.
        #[arg(long)]
        base_url: Option<String>,

        /// Disable typo-tolerant matching.
        #[arg(long)]
        exact: bool,

        /// Print hits as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite an index in canonical layout.
    Fmt {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output layout (defaults to the configured output_format; with
        /// --check, to the input's own layout).
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Exit non-zero if the file is not already canonical.
        #[arg(long)]
        check: bool,
    },

    /// Print the page/section outline.
    Outline {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Print the outline as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print entry counts and the content fingerprint.
    Stats {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Print stats as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare two generations of an index.
    Diff {
        /// Previous index file.
        old: PathBuf,
        /// New index file.
        new: PathBuf,
    },

    /// Work with the local index database.
    Db {
        /// Database file (defaults to the configured database).
        #[arg(long, global = true)]
        db: Option<PathBuf>,

        #[command(subcommand)]
        action: DbAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Database subcommands.
#[derive(Subcommand)]
pub(crate) enum DbAction {
    /// Import (or replace) an index.
    Import {
        /// Index file (search_index.js or JSON).
        file: PathBuf,

        /// Name to store it under (defaults to the file stem).
        #[arg(short, long)]
        name: Option<String>,

        /// Import even if the integrity check reports errors.
        #[arg(long)]
        force: bool,
    },
    /// List imported indexes.
    List,
    /// Full-text search an imported index.
    Search {
        /// Index name.
        name: String,

        /// Query terms.
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of hits.
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Write an imported index back out.
    Export {
        /// Index name.
        name: String,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output layout (defaults to the configured output_format).
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Remove an imported index.
    Remove {
        /// Index name.
        name: String,
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

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docindex=warn",
        1 => "docindex=debug",
        _ => "docindex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Check { file, strict, json } => cmd_check(&file, strict, json).await,
        Command::Search {
            file,
            query,
            limit,
            category,
            page,
            base_url,
            exact,
            json,
        } => {
            let mut settings = SearchSettings::from(&config);
            if let Some(limit) = limit {
                settings.limit = limit;
            }
            if exact {
                settings.fuzzy = false;
            }
            let filter = SearchFilter {
                category: category.map(Category::from),
                page,
            };
            let base = base_url.or_else(|| config.defaults.base_url.clone());
            cmd_search(&file, &query.join(" "), &settings, &filter, base.as_deref(), json).await
        }
        Command::Fmt {
            file,
            out,
            format,
            check,
        } => {
            let format = match format {
                Some(f) => IndexFormat::from(f),
                None if check => IndexFormat::from_path(&file),
                None => config.defaults.output_format.parse::<IndexFormat>()?,
            };
            cmd_fmt(&file, out.as_deref(), format, check).await
        }
        Command::Outline { file, json } => cmd_outline(&file, json).await,
        Command::Stats { file, json } => cmd_stats(&file, json).await,
        Command::Diff { old, new } => cmd_diff(&old, &new).await,
        Command::Db { db, action } => {
            let db_path = match db {
                Some(path) => path,
                None => expand_home(&config.defaults.database)?,
            };
            match action {
                DbAction::Import { file, name, force } => {
                    cmd_db_import(&db_path, &file, name.as_deref(), force).await
                }
                DbAction::List => cmd_db_list(&db_path).await,
                DbAction::Search { name, query, limit } => {
                    let limit = match limit {
                        Some(limit) => limit,
                        None => u32::try_from(config.search.limit).unwrap_or(u32::MAX),
                    };
                    cmd_db_search(&db_path, &name, &query.join(" "), limit).await
                }
                DbAction::Export { name, out, format } => {
                    let format = match format {
                        Some(f) => IndexFormat::from(f),
                        None => config.defaults.output_format.parse::<IndexFormat>()?,
                    };
                    cmd_db_export(&db_path, &name, out.as_deref(), format).await
                }
                DbAction::Remove { name } => cmd_db_remove(&db_path, &name).await,
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Index file commands
// ---------------------------------------------------------------------------

async fn cmd_check(file: &Path, strict: bool, json: bool) -> Result<()> {
    let index = read_index(file)?;
    let report = check_index(&index);
    let round_trip = check_round_trip(&index);

    info!(
        file = %file.display(),
        entries = report.entries,
        issues = report.issues.len(),
        "checked search index"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for issue in &report.issues {
            println!("{issue}");
        }
        let errors = report.errors().count();
        let warnings = report.warnings().count();
        println!(
            "{}: {} entries, {errors} error(s), {warnings} warning(s)",
            file.display(),
            report.entries
        );
    }

    round_trip?;

    let failed = if strict {
        !report.is_clean()
    } else {
        !report.is_ok()
    };
    if failed {
        return Err(eyre!("{} failed integrity checks", file.display()));
    }
    Ok(())
}

async fn cmd_search(
    file: &Path,
    query: &str,
    settings: &SearchSettings,
    filter: &SearchFilter,
    base_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let index = read_index(file)?;
    let base: Option<Url> = base_url.map(parse_base_url).transpose()?;

    let engine = SearchEngine::new(&index);
    let hits = engine.search(query, settings, filter);

    info!(query, hits = hits.len(), "search finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        let target = display_location(base.as_ref(), &hit.location)?;
        println!(
            "{:>2}. {} [{}] {} ({:.2})",
            rank + 1,
            hit.title,
            hit.page,
            target,
            hit.score
        );
        if !hit.snippet.is_empty() {
            println!("    {}", hit.snippet);
        }
    }
    Ok(())
}

fn display_location(base: Option<&Url>, location: &Location) -> Result<String> {
    Ok(match base {
        Some(base) => resolve_location(base, location)?.to_string(),
        None => location.to_string(),
    })
}

async fn cmd_fmt(file: &Path, out: Option<&Path>, format: IndexFormat, check: bool) -> Result<()> {
    let original = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read {}: {e}", file.display()))?;
    let index = docindex_parser::parse_index(&original)
        .map_err(|e| eyre!("{}: {e}", file.display()))?;

    if check {
        if render_index(&index, format)? != original {
            return Err(eyre!("{} is not in canonical layout", file.display()));
        }
        println!("{} is canonical", file.display());
        return Ok(());
    }

    match out {
        Some(path) => {
            docindex_parser::write_index(path, &index, format)?;
            info!(path = %path.display(), entries = index.len(), "wrote search index");
        }
        None => {
            std::io::stdout().write_all(render_index(&index, format)?.as_bytes())?;
        }
    }
    Ok(())
}

async fn cmd_outline(file: &Path, json: bool) -> Result<()> {
    let index = read_index(file)?;
    let outline = build_outline(&index);
    if json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
    } else {
        print!("{}", outline.render_text());
    }
    Ok(())
}

async fn cmd_stats(file: &Path, json: bool) -> Result<()> {
    let index = read_index(file)?;
    let stats = index_stats(&index)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  Entries:     {}", stats.entries);
    println!("  Pages:       {}", stats.pages);
    println!("  Sections:    {}", stats.sections);
    if stats.other > 0 {
        println!("  Other:       {}", stats.other);
    }
    println!("  Page paths:  {}", stats.page_paths);
    println!("  Empty text:  {}", stats.empty_text);
    println!("  Text chars:  {}", stats.total_text_chars);
    println!("  Fingerprint: {}", stats.fingerprint);
    println!();
    Ok(())
}

async fn cmd_diff(old: &Path, new: &Path) -> Result<()> {
    let before = read_index(old)?;
    let after = read_index(new)?;
    let diff = diff_indexes(&before, &after);

    for location in &diff.added {
        println!("+ {location}");
    }
    for location in &diff.removed {
        println!("- {location}");
    }
    for location in &diff.changed {
        println!("~ {location}");
    }
    println!(
        "{} added, {} removed, {} changed, {} unchanged",
        diff.added.len(),
        diff.removed.len(),
        diff.changed.len(),
        diff.unchanged.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Database commands
// ---------------------------------------------------------------------------

async fn cmd_db_import(db_path: &Path, file: &Path, name: Option<&str>, force: bool) -> Result<()> {
    let index = read_index(file)?;
    if let Err(e) = check_index(&index).into_result() {
        if !force {
            return Err(eyre!("{e}\nrefusing to import; pass --force to import anyway"));
        }
        warn!(file = %file.display(), "importing index with integrity errors");
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => default_index_name(file)?,
    };

    let storage = Storage::open(db_path).await?;
    let source = file.display().to_string();
    match storage.import_index(&name, &source, &index).await? {
        ImportOutcome::Created { entries, .. } => {
            println!("Imported '{name}' ({entries} entries)");
        }
        ImportOutcome::Replaced { entries, .. } => {
            println!("Replaced '{name}' ({entries} entries)");
        }
        ImportOutcome::Unchanged { .. } => {
            println!("'{name}' is up to date");
        }
    }
    Ok(())
}

fn default_index_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.split('.').next().unwrap_or(n).to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| eyre!("cannot derive a name from {}; pass --name", file.display()))
}

async fn cmd_db_list(db_path: &Path) -> Result<()> {
    let storage = Storage::open_readonly(db_path).await?;
    let indexes = storage.list_indexes().await?;
    if indexes.is_empty() {
        println!("No indexes imported.");
        return Ok(());
    }
    for stored in indexes {
        println!(
            "{}  {} entries  {}  {}",
            stored.name,
            stored.entry_count,
            stored.imported_at.format("%Y-%m-%d %H:%M"),
            stored.source_path
        );
    }
    Ok(())
}

async fn cmd_db_search(db_path: &Path, name: &str, query: &str, limit: u32) -> Result<()> {
    let storage = Storage::open_readonly(db_path).await?;
    if storage.get_index(name).await?.is_none() {
        return Err(eyre!("no index named '{name}'"));
    }
    let hits = storage.search(name, query, limit).await?;
    if hits.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>2}. {} [{}] {}", rank + 1, hit.title, hit.page, hit.location);
    }
    Ok(())
}

async fn cmd_db_export(
    db_path: &Path,
    name: &str,
    out: Option<&Path>,
    format: IndexFormat,
) -> Result<()> {
    let storage = Storage::open_readonly(db_path).await?;
    let index = storage.load_entries(name).await?;
    match out {
        Some(path) => {
            docindex_parser::write_index(path, &index, format)?;
            println!("Exported '{name}' to {}", path.display());
        }
        None => {
            std::io::stdout().write_all(render_index(&index, format)?.as_bytes())?;
        }
    }
    Ok(())
}

async fn cmd_db_remove(db_path: &Path, name: &str) -> Result<()> {
    let storage = Storage::open(db_path).await?;
    if storage.delete_index(name).await? {
        println!("Removed '{name}'");
        Ok(())
    } else {
        Err(eyre!("no index named '{name}'"))
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
