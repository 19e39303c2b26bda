use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use global_news::config::Config;
use global_news::fetcher::Fetcher;
use global_news::output::write_digest;
use global_news::pipeline::Pipeline;
use global_news::translator::Translator;

/// Fetch the configured news feeds and write them to one JSON file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Config file (TOML, or a JSON sources file)
    #[arg(short, long, env = "GLOBAL_NEWS_CONFIG", default_value = "news.toml")]
    config: PathBuf,

    /// Override the output path from the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip translation even when an API key is available
    #[arg(long)]
    no_translate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "global_news=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;
    info!("Loaded {} sources from {}", config.sources.len(), cli.config.display());

    let fetcher = Fetcher::new(&config)?;
    let translator = if cli.no_translate {
        None
    } else {
        Translator::from_config(&config.translator)
    };

    let pipeline = Pipeline::new(fetcher, translator, config.max_articles);
    let digest = pipeline.run(&config.sources).await;

    let output = cli.output.unwrap_or_else(|| PathBuf::from(&config.output));
    write_digest(&output, &digest).await?;

    Ok(())
}
