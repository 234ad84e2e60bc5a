use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pythia::{Blacklist, CrawlConfig, Crawler, Inspector};
use pythia_db::Store;
use pythia_logging::LogConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pythia", about = "Incremental file indexer", version)]
struct Cli {
    /// Verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ~/.pythia/pythia.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl and index the configured roots
    Crawl {
        /// Roots to crawl instead of the configured ones
        roots: Vec<PathBuf>,
    },
    /// List indexed folders
    Folders,
    /// List indexed files under a folder
    Files {
        /// The folder's path as indexed
        folder: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = pythia_logging::init_logging(LogConfig {
        app_name: "pythia",
        verbose: cli.verbose,
    })?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl { roots } => {
            let store = Store::open(&config.database_path)
                .await
                .with_context(|| format!("Failed to open store at {}", config.database_path))?;
            cmd_crawl(config, store, roots).await
        }
        Command::Folders => cmd_folders(open_existing(&config).await?).await,
        Command::Files { folder } => cmd_files(open_existing(&config).await?, folder).await,
    }
}

async fn open_existing(config: &CrawlConfig) -> Result<Store> {
    Store::open_existing(&config.database_path)
        .await
        .with_context(|| format!("No index at {}; run `pythia crawl` first", config.database_path))
}

fn load_config(path: Option<&std::path::Path>) -> Result<CrawlConfig> {
    match path {
        Some(path) => CrawlConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => {
            let default = CrawlConfig::default_path();
            if default.exists() {
                CrawlConfig::load(&default)
                    .with_context(|| format!("Failed to load config: {}", default.display()))
            } else {
                Ok(CrawlConfig::default())
            }
        }
    }
}

async fn cmd_crawl(config: CrawlConfig, store: Store, roots: Vec<PathBuf>) -> Result<()> {
    let roots = if roots.is_empty() { config.roots.clone() } else { roots };
    if roots.is_empty() {
        anyhow::bail!("No roots to crawl; pass paths or set `roots` in the config file");
    }
    let roots: Vec<PathBuf> = roots.iter().map(|r| CrawlConfig::expand_root(r)).collect();

    let blacklist =
        Arc::new(Blacklist::new(&config.blacklist).context("Invalid blacklist pattern")?);
    let inspector = Arc::new(Inspector::new());

    let crawler = Crawler::new(roots, store, blacklist, inspector);
    crawler.traverse()?;
    let reports = crawler.join().await;

    let mut failed = 0;
    for report in &reports {
        match &report.error {
            None => println!(
                "{}: {} new, {} updated, {} unchanged, {} skipped, {} pruned, {} errors ({} ms)",
                report.root.display(),
                report.stats.files_new,
                report.stats.files_updated,
                report.stats.files_unchanged,
                report.stats.files_skipped,
                report.stats.dirs_pruned,
                report.stats.errors,
                report.stats.duration_ms,
            ),
            Some(e) => {
                failed += 1;
                println!("{}: FAILED: {}", report.root.display(), e);
            }
        }
    }

    if failed == reports.len() && !reports.is_empty() {
        anyhow::bail!("All roots failed");
    }
    Ok(())
}

async fn cmd_folders(store: Store) -> Result<()> {
    let folders = store.folder_get_all().await?;
    if folders.is_empty() {
        println!("No folders indexed yet");
        return Ok(());
    }
    for folder in folders {
        println!(
            "{}\tlast scanned {}",
            folder.path,
            folder.time_scanned.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

async fn cmd_files(store: Store, folder: PathBuf) -> Result<()> {
    let folder_path = folder.to_string_lossy();
    let folder = store
        .folder_get_by_path(&folder_path)
        .await?
        .with_context(|| format!("No indexed folder at {folder_path}"))?;

    let files = store.file_get_by_folder(folder.id).await?;
    for file in files {
        println!(
            "{}\t{}\t{}",
            file.path,
            file.content_type.as_str(),
            file.mime_type
        );
    }
    Ok(())
}
