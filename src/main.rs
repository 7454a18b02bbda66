use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thetabot::{
    announcer::{Announcer, DiscordWebhook},
    classifier::ZeroShotClassifier,
    config::{load_repos, Config},
    database::Database,
    ingestor::{
        create_trigger_channel, IngestorService, JobPipeline, SchedulerService,
        ScrapeStateManager,
    },
    models::ProcessingTrigger,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "thetabot")]
#[command(version)]
#[command(about = "Scrapes job-listing READMEs and announces new openings to a chat channel")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Control surface listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Control surface listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file and DATABASE_URL)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Run a single scrape cycle and exit
    #[arg(long)]
    once: bool,

    /// Log announcements instead of posting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("thetabot={},tower_http=trace", cli.log_level)
    } else {
        format!("thetabot={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Theta Bot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    config.validate(!cli.dry_run)?;

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let repos = load_repos(&config.sources.repos_file)?;
    if repos.is_empty() {
        warn!(
            "No origins listed in {}, cycles will find nothing",
            config.sources.repos_file.display()
        );
    }

    let client = IngestorService::build_client(&config.sources)
        .context("building HTTP client")?;
    let ingestor = IngestorService::from_entries(client.clone(), &repos);
    let classifier = ZeroShotClassifier::from_config(&config.classifier);

    let announcer = if cli.dry_run {
        info!("Dry run: announcements will be logged, not posted");
        Announcer::dry_run(&config.announcer).with_footer(config.chat.footer.clone())
    } else {
        let webhook_url = config
            .chat
            .webhook_url
            .clone()
            .context("DISCORD_WEBHOOK_URL is not set")?;
        Announcer::new(
            Arc::new(DiscordWebhook::new(client, webhook_url, &config.chat)),
            &config.announcer,
        )
        .with_footer(config.chat.footer.clone())
    };

    let state_manager = ScrapeStateManager::new();
    state_manager
        .restore_last_checked(database.last_checked().await?)
        .await;

    let pipeline = Arc::new(JobPipeline::new(
        ingestor,
        classifier,
        database.clone(),
        announcer,
        state_manager.clone(),
    ));

    if cli.once {
        let summary = pipeline.run_cycle(ProcessingTrigger::Manual).await?;
        info!(
            "Single cycle complete: {} found, {} stored, {} announced",
            summary.found, summary.stored, summary.announced
        );
        return Ok(());
    }

    if !config.web.enabled {
        info!("Control surface disabled, running on schedule only");
        return SchedulerService::new(
            pipeline,
            config.scheduler_interval(),
            config.scheduler.run_on_startup,
            None,
        )
        .start()
        .await;
    }

    let (trigger_tx, trigger_rx) = create_trigger_channel();
    let scheduler = SchedulerService::new(
        pipeline,
        config.scheduler_interval(),
        config.scheduler.run_on_startup,
        Some(trigger_rx),
    );

    tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            tracing::error!("Scheduler service failed: {}", e);
        }
    });

    let web_server = WebServer::new(
        &config.web,
        AppState {
            database,
            state_manager,
            trigger_tx,
        },
    )?;

    info!(
        "Starting control surface on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
