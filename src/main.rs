//! xkcdfetch - Look up xkcd comics from the command line
//!
//! Resolves a comic number or search text to an xkcd API URL, fetches the
//! comic's metadata, and keeps every fetched comic in a local JSON cache.

use std::process;

use clap::Parser;
use log::info;

use xkcdfetch::cache::CacheFile;
use xkcdfetch::cli::{Cli, StartupConfig};
use xkcdfetch::data::{http_client, Comic, ComicStore, Resolver};

/// Prints a human-readable summary of a comic
fn print_summary(comic: &Comic) {
    println!("#{}: {}", comic.num, comic.title);
    if let Some(date) = comic.published() {
        println!("Published: {}", date.format("%Y-%m-%d"));
    }
    println!("Image: {}", comic.img);
    println!("Link: {}", comic.page_url());
    if !comic.alt.is_empty() {
        println!();
        println!("{}", comic.alt);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let client = http_client()?;
    let resolver = Resolver::new(client.clone());
    let store = ComicStore::open(client, CacheFile::with_path(config.cache_file.clone())).await?;
    info!(
        "Loaded {} cached comics from {}",
        store.len().await,
        store.cache_path().display()
    );

    let url = resolver.resolve(&config.query).await?;
    info!("Resolved {:?} to {}", config.query, url);

    let comic = store.get_comic(&url).await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&comic)?);
    } else {
        print_summary(&comic);
    }

    Ok(())
}
