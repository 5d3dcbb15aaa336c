//! Query resolution for xkcd
//!
//! Turns a comic number into its `info.0.json` URL directly, or finds the
//! comic for a free-text query by scraping DuckDuckGo's HTML results page for
//! the first xkcd link.

use super::Query;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;

/// DuckDuckGo's script-free results page
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Scheme and host of the xkcd JSON API
const API_BASE: &str = "https://www.xkcd.com";

/// Site restriction prepended to every search
const SITE_FILTER: &str = "site:xkcd.com";

lazy_static! {
    static ref COMIC_LINK: Regex = Regex::new(r"xkcd\.com/(\d+)/?").unwrap();
}

/// Errors that can occur when resolving a query to a comic URL
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The search results contained no xkcd comic link
    #[error("No xkcd comic found for '{query}'")]
    NoMatch { query: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Resolves queries to xkcd API URLs
#[derive(Debug, Clone)]
pub struct Resolver {
    /// HTTP client for search requests
    http_client: Client,
    /// Search endpoint (allows override for testing)
    search_url: String,
    /// API scheme and host (allows override for testing)
    api_base: String,
}

impl Resolver {
    /// Creates a Resolver against DuckDuckGo and www.xkcd.com
    pub fn new(http_client: Client) -> Self {
        Self::with_endpoints(http_client, SEARCH_URL.to_string(), API_BASE.to_string())
    }

    /// Creates a Resolver with custom endpoints (for testing)
    pub fn with_endpoints(http_client: Client, search_url: String, api_base: String) -> Self {
        Self {
            http_client,
            search_url,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves any query to an API URL
    ///
    /// Numbers and the latest comic never touch the network. Text queries
    /// perform one search request; an empty text query fails without one.
    pub async fn resolve(&self, query: &Query) -> Result<String, ResolveError> {
        match query {
            Query::Latest => Ok(self.resolve_by_id(None)),
            Query::Id(id) => Ok(self.resolve_by_id(Some(*id))),
            Query::Text(text) => self.resolve_by_text(text).await,
        }
    }

    /// Builds the API URL for a comic number, or the latest comic for `None`
    ///
    /// The number is not validated; out-of-range numbers give a URL that
    /// 404s when fetched.
    pub fn resolve_by_id(&self, id: Option<i64>) -> String {
        match id {
            None => format!("{}/info.0.json", self.api_base),
            Some(id) => format!("{}/{}/info.0.json", self.api_base, id),
        }
    }

    /// Finds the comic for a free-text query via a site-restricted web search
    ///
    /// # Returns
    /// * `Ok(String)` - API URL of the first comic linked from the results
    /// * `Err(ResolveError::NoMatch)` - If no result links to a comic
    /// * `Err(ResolveError::HttpError)` - If the search request fails
    pub async fn resolve_by_text(&self, query: &str) -> Result<String, ResolveError> {
        if query.trim().is_empty() {
            return Err(ResolveError::NoMatch {
                query: query.to_string(),
            });
        }

        let url = self.search_request_url(query);
        debug!("Searching: {}", url);

        let body = self.http_client.get(&url).send().await?.text().await?;

        match first_comic_number(&body) {
            Some(num) => Ok(self.resolve_by_id(Some(num))),
            None => Err(ResolveError::NoMatch {
                query: query.to_string(),
            }),
        }
    }

    /// Builds the search URL for a query
    fn search_request_url(&self, query: &str) -> String {
        format!(
            "{}?q={}+{}",
            self.search_url,
            SITE_FILTER,
            encode_query(query)
        )
    }
}

/// Percent-encodes each word of the query and joins the words with `+`
fn encode_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// Finds the first comic number linked in a page
fn first_comic_number(body: &str) -> Option<i64> {
    COMIC_LINK
        .captures_iter(body)
        .find_map(|caps| caps[1].parse().ok())
}
