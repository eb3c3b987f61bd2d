use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use shopper_catalog::app::ProcessItemsUseCase;
use shopper_catalog::config::Config;
use shopper_catalog::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use shopper_catalog::infra::{JsonLinesSink, JsonLinesSource, LogNotifier};
use shopper_catalog::observability::metrics;
use shopper_catalog::{engine_from_config, logging, FieldRegistry, Item, Outcome, ProductMatcher};

#[derive(Parser)]
#[command(name = "shopper_catalog")]
#[command(about = "Brand/model matching and attribute normalization for scraped listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to $SHOPPER_CATALOG_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a JSON-lines file of scraped items
    Process {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Items between knowledge base checkpoints (overrides config)
        #[arg(long)]
        save_every: Option<usize>,
    },
    /// Normalize a single attribute value
    Normalize {
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    /// Resolve brand and model of a single listing
    MatchItem {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        marca: Option<String>,
        #[arg(long)]
        modelo: Option<String>,
        /// Persist whatever the matcher learned
        #[arg(long)]
        save: bool,
    },
    /// Show knowledge base statistics
    Stats {
        /// Also list every brand with its model count
        #[arg(long)]
        brands: bool,
    },
    /// List the registered field rules
    Fields,
}

fn resolve_config(cli_path: Option<PathBuf>) -> Result<Config> {
    let explicit = cli_path.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    match explicit {
        Some(path) => Config::load(&path).with_context(|| format!("Loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(Path::new(DEFAULT_CONFIG_PATH)).context("Loading config.toml")
        }
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = resolve_config(cli.config)?;

    // Initialize logging
    logging::init_logging(&config.logging);

    if config.metrics.enabled {
        if let Err(e) = metrics::init() {
            warn!("Metrics disabled: {}", e);
        }
    }

    match cli.command {
        Commands::Process { input, output, save_every } => {
            let engine = Arc::new(engine_from_config(&config)?);
            let matcher = ProductMatcher::from_config(&config).await?;
            let source = JsonLinesSource::open(&input).await?;
            let sink = JsonLinesSink::create(&output).await?;

            let mut use_case = ProcessItemsUseCase::new(
                matcher,
                engine,
                Box::new(source),
                Box::new(sink),
                Box::new(LogNotifier),
            )
            .with_save_every(save_every.unwrap_or(config.matcher.save_every));

            let summary = use_case.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if let (Some(path), Some(rendered)) = (&config.metrics.output, metrics::render()) {
                std::fs::write(path, rendered)
                    .with_context(|| format!("Writing metrics to {}", path.display()))?;
                info!("Metrics written to {}", path.display());
            }
        }
        Commands::Normalize { field, value } => {
            let engine = engine_from_config(&config)?;
            match engine.resolve(&field, Some(&value)) {
                Outcome::Value(v) => println!("{}", serde_json::to_string(&v)?),
                other => println!("unnormalized ({:?})", other),
            }
        }
        Commands::MatchItem { title, marca, modelo, save } => {
            let mut matcher = ProductMatcher::from_config(&config).await?;
            let mut item = Item {
                title,
                marca,
                modelo,
                ..Item::default()
            };

            let report = matcher.match_with_report(&mut item);
            item.slug = shopper_catalog::pipeline::processing::slug::item_slug(&item);
            println!("{}", serde_json::to_string_pretty(&item)?);
            println!("{}", serde_json::to_string_pretty(&report)?);

            if save {
                matcher.save().await?;
            }
        }
        Commands::Stats { brands } => {
            let matcher = ProductMatcher::from_config(&config).await?;
            let kb = matcher.knowledge_base();
            println!("brands: {}", kb.brand_count());
            println!("models: {}", kb.model_count());
            if brands {
                for entry in kb.entries() {
                    println!("  {} ({} models)", entry.brand, entry.models.len());
                }
            }
        }
        Commands::Fields => {
            let engine = engine_from_config(&config)?;
            println!("field registry v{}", FieldRegistry::VERSION);
            for (field, rule) in engine.registry().fields() {
                println!("  {:<24} {}", field, rule.strategy_name());
            }
        }
    }

    Ok(())
}
