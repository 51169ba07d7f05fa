use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rss_preview::{Article, Config, FeedReader};

/// Default config file location (~/.config/rss-preview/config.toml)
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("rss-preview")
            .join("config.toml"),
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "rss-preview",
    about = "Read an RSS feed and pick a preview image for every article"
)]
struct Args {
    /// Feed URL (overrides rss_url from the config file)
    url: Option<String>,

    /// Config file (defaults to ~/.config/rss-preview/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of articles to return
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Minimum preview image width in pixels
    #[arg(long, value_name = "PX")]
    min_width: Option<u32>,

    /// Minimum preview image height in pixels
    #[arg(long, value_name = "PX")]
    min_height: Option<u32>,

    /// Skip the in-memory result cache
    #[arg(long)]
    no_cache: bool,

    /// Print articles as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match self.config.clone().or_else(default_config_path) {
            Some(path) => Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(url) = &self.url {
            config.rss_url = url.clone();
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        if let Some(width) = self.min_width {
            config.min_image_width = width;
        }
        if let Some(height) = self.min_height {
            config.min_image_height = height;
        }
        if self.no_cache {
            config.use_cache = false;
        }

        Ok(config)
    }
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    if let Some(published) = article.published {
        println!("  published: {}", published.to_rfc2822());
    }
    if let Some(url) = &article.url {
        println!("  link:      {}", url);
    }
    match &article.preview_image {
        Some(image) => println!("  preview:   {}", image),
        None => println!("  preview:   (none)"),
    }
    let summary: String = article.content.chars().take(160).collect();
    if !summary.is_empty() {
        println!("  {}", summary.replace('\n', " "));
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    tracing::debug!(?config, "Resolved configuration");

    let reader = FeedReader::setup(config);
    let articles = reader.read_feed().await.context("Failed to read feed")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&articles).context("Failed to serialize articles")?;
        println!("{}", json);
    } else if articles.is_empty() {
        eprintln!("Feed has no items");
    } else {
        for article in &articles {
            print_article(article);
        }
    }

    Ok(())
}
