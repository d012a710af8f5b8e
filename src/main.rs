use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use menuseed::common;
use menuseed::images::{HttpImageSource, ImageSource};
use menuseed::store::{AppwriteClient, InMemoryBackend};
use menuseed::{Dataset, DatasetLoader, SeedConfig};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the backend and seed it with the dataset
    Seed {
        #[clap(short, long, default_value = "menuseed.yaml")]
        config: String,
        /// Dataset JSON file; the bundled demo dataset when omitted
        #[clap(short, long)]
        dataset: Option<String>,
        /// Run against an in-memory backend instead of Appwrite; implies --skip-images
        #[clap(long)]
        dry_run: bool,
        /// Keep source image urls instead of re-hosting them
        #[clap(long)]
        skip_images: bool,
    },
    /// Delete every seeded document and file
    Clear {
        #[clap(short, long, default_value = "menuseed.yaml")]
        config: String,
        #[clap(long)]
        dry_run: bool,
    },
    /// Validate a dataset without touching the backend
    Check {
        #[clap(short, long)]
        dataset: Option<String>,
    },
    /// Write a default config file
    Init {
        #[clap(short, long, default_value = "menuseed.yaml")]
        config: String,
        #[clap(short, long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Seed {
            config,
            dataset,
            dry_run,
            skip_images,
        } => {
            let mut config = SeedConfig::load(&config)?;
            if skip_images {
                config.images.enabled = false;
            }
            let dataset = load_dataset(dataset.as_deref())?;
            let loader = build_loader(&config, dataset, dry_run)?;

            match loader.run().await {
                Ok(report) => report.log_summary(),
                Err(err) => {
                    error!("Seeding failed [{}]: {}", err.error_code(), err);
                    if let Some(phase) = err.phase() {
                        error!(
                            "Backend is partially seeded (stopped in the {} phase); run seed again to start from a clean state",
                            phase
                        );
                    }
                    return Err(err.into());
                }
            }
        }
        Commands::Clear { config, dry_run } => {
            let config = SeedConfig::load(&config)?;
            let loader = build_loader(&config, Dataset::default(), dry_run)?;
            let report = loader.clear_all().await?;
            info!(
                "Cleared {} documents and {} files",
                report.documents_deleted(),
                report.files
            );
        }
        Commands::Check { dataset } => {
            let dataset = load_dataset(dataset.as_deref())?;
            info!(
                "Dataset: {} categories, {} customizations, {} menu items, {} links",
                dataset.categories.len(),
                dataset.customizations.len(),
                dataset.menu.len(),
                dataset.link_count()
            );
            let issues = dataset.validate();
            for issue in &issues {
                warn!("{}", issue);
            }
            if !issues.is_empty() {
                anyhow::bail!("dataset has {} issue(s)", issues.len());
            }
            info!("Dataset is valid");
        }
        Commands::Init { config, force } => {
            if std::path::Path::new(&config).exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", config);
            }
            info!("Writing default config: {}", config);
            let yaml = SeedConfig::default().to_yaml()?;
            common::write_string_to_file(&config, &yaml)?;
        }
    }

    Ok(())
}

fn load_dataset(path: Option<&str>) -> Result<Dataset> {
    let dataset = match path {
        Some(path) => {
            info!("Loading dataset: {}", path);
            Dataset::load(path)?
        }
        None => Dataset::bundled()?,
    };
    Ok(dataset)
}

fn build_loader(config: &SeedConfig, dataset: Dataset, dry_run: bool) -> Result<DatasetLoader> {
    let image_source: Arc<dyn ImageSource> = Arc::new(HttpImageSource::new(&config.images)?);

    if dry_run {
        let config = config.clone().offline();
        config.validate()?;
        info!("Dry run: using in-memory backend, images are not fetched");
        let backend = Arc::new(InMemoryBackend::new());
        return Ok(DatasetLoader::new(
            &config,
            dataset,
            backend.clone(),
            backend,
            image_source,
        ));
    }

    config.validate_remote()?;
    info!(
        "Using Appwrite at {} (project {}, database {})",
        config.backend.endpoint, config.backend.project_id, config.backend.database_id
    );
    let client = Arc::new(AppwriteClient::new(&config.backend)?);
    Ok(DatasetLoader::new(
        config,
        dataset,
        client.clone(),
        client,
        image_source,
    ))
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "hyper=off,reqwest=warn,{}",
            log_level
        )))
        .without_time()
        .init();
}
