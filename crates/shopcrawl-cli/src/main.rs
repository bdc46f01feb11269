use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shopcrawl_scraper::{
    normalize_catalog, Crawler, ExtractionPipeline, OpenAiExtractor, PageClient,
};

#[derive(Debug, Parser)]
#[command(name = "shopcrawl")]
#[command(about = "Scrape a storefront's product catalog via its sitemap")]
struct Cli {
    /// Base URL of the storefront to crawl
    site_url: String,

    /// Number of parallel workers (overrides SHOPCRAWL_MAX_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Path of the catalog JSON file to write
    #[arg(long, default_value = "products.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = shopcrawl_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let workers = cli.workers.unwrap_or(config.max_workers);

    let client = PageClient::new(config.request_timeout_secs, &config.user_agent)?;
    let extractor = Arc::new(OpenAiExtractor::new(&config)?);
    let pipeline = ExtractionPipeline::new(extractor, config.fallback_vendor.clone());
    let crawler = Crawler::new(client, pipeline, workers, config.completion_delay_ms);

    let records = crawler.run(&cli.site_url).await;
    let catalog = normalize_catalog(&records);

    let json = serde_json::to_string_pretty(&catalog)?;
    std::fs::write(&cli.output, json)?;

    println!("Scraping completed! Found {} products.", catalog.products.len());
    println!("Output saved to {}", cli.output.display());

    Ok(())
}
