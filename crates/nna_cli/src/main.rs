//! `nna` command line entry point.
//!
//! # Responsibility
//! - Parse arguments and dispatch to `nna_core` services.
//! - Print one result per line; errors go to stderr with exit code 1.
//!
//! Flags override the matching `NNA_*` environment variables.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::debug;
use nna_core::{
    init_logging, AssetNamingService, InMemorySequenceAllocator, RegistryCache, RegistryConfig,
    SequenceAllocator, SqliteSequenceAllocator, TaxonomyEntry,
};

/// NNA asset registry: convert addresses and issue sequential numbers.
#[derive(Parser, Debug)]
#[command(name = "nna", version, about, long_about = None)]
struct Cli {
    /// Taxonomy snapshot JSON file (defaults to the bundled snapshot).
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    /// SQLite counter database (defaults to in-memory counters).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an HFN (`S.POP.HPM.001`) to its MFA.
    ToMfa { hfn: String },
    /// Convert an MFA (`2.001.007.001`) to its HFN.
    ToHfn { mfa: String },
    /// List layers.
    Layers,
    /// List categories of one layer.
    Categories { layer: String },
    /// List subcategories of one category.
    Subcategories { layer: String, category: String },
    /// Show the address the next registration would receive.
    Peek(PathArgs),
    /// Issue the next address for a path.
    Register(PathArgs),
    /// List active sequence counters.
    Counters,
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Layer code, numeric code or name.
    layer: String,
    /// Category code, numeric code or name.
    category: String,
    /// Subcategory code, numeric code or name.
    subcategory: String,
    /// Optional file-type suffix, e.g. `mp4`.
    #[arg(long)]
    suffix: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }
    debug!(
        "event=cli_start module=cli status=ok command={:?}",
        cli.command
    );

    let cache = Arc::new(RegistryCache::from_source(config.taxonomy_source().as_ref())?);
    let allocator: Arc<dyn SequenceAllocator> = match config.db_target() {
        Some(target) => Arc::new(SqliteSequenceAllocator::open_target(&target)?),
        None => Arc::new(InMemorySequenceAllocator::new()),
    };
    let service = AssetNamingService::new(cache, allocator);

    match cli.command {
        Commands::ToMfa { hfn } => println!("{}", service.to_mfa(&hfn)?),
        Commands::ToHfn { mfa } => println!("{}", service.to_hfn(&mfa)?),
        Commands::Layers => {
            for layer in service.cache().tree().layers() {
                println!("{}\t{}\t{}", layer.alpha_code, layer.numeric_code, layer.name);
            }
        }
        Commands::Categories { layer } => {
            print_entries(&service.cache().list_categories(&layer)?);
        }
        Commands::Subcategories { layer, category } => {
            print_entries(&service.cache().list_subcategories(&layer, &category)?);
        }
        Commands::Peek(args) => {
            let address = service.preview(
                &args.layer,
                &args.category,
                &args.subcategory,
                args.suffix.as_deref(),
            )?;
            println!("{}\t{}", address.to_hfn(), address.to_mfa());
        }
        Commands::Register(args) => {
            let asset = service.register(
                &args.layer,
                &args.category,
                &args.subcategory,
                args.suffix.as_deref(),
            )?;
            println!("{}\t{}", asset.hfn, asset.mfa);
        }
        Commands::Counters => {
            for counter in service.allocator().counters()? {
                println!("{}\t{}", counter.path, counter.next);
            }
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<RegistryConfig, Box<dyn Error>> {
    let mut config = RegistryConfig::from_env()?;
    if let Some(path) = &cli.taxonomy {
        config.taxonomy_path = Some(path.clone());
    }
    if let Some(path) = &cli.db {
        config.db_path = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = nna_core::logging::normalize_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn print_entries(entries: &[TaxonomyEntry]) {
    for entry in entries {
        let marker = if entry.source_has_explicit_code {
            ""
        } else {
            "\t(synthesized)"
        };
        println!(
            "{}\t{:03}\t{}{}",
            entry.alpha_code, entry.numeric_code, entry.name, marker
        );
    }
}
