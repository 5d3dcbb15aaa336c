//! Core data models for xkcdfetch
//!
//! This module contains the comic record as served by the xkcd JSON API,
//! the query type accepted by the resolver, and the HTTP clients that turn
//! one into the other.

pub mod resolver;
pub mod store;

pub use resolver::{ResolveError, Resolver};
pub use store::{ComicError, ComicStore};

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Desktop browser identification sent with every request.
///
/// The DuckDuckGo HTML endpoint rejects clients that do not look like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.5112.126 Safari/537.36";

/// Builds the HTTP client shared by the resolver and the comic store
///
/// The client sends the browser `User-Agent` and never goes through a proxy.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).no_proxy().build()
}

/// A single comic's metadata, as returned by `info.0.json`
///
/// Field names and types follow the upstream API exactly, including the date
/// components being strings. Fields the API adds later are kept in `extra`
/// and written back to the cache unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comic {
    /// Comic number
    pub num: u32,
    /// Display title
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Title without markup
    #[serde(default, deserialize_with = "null_as_empty")]
    pub safe_title: String,
    /// Image URL
    #[serde(default, deserialize_with = "null_as_empty")]
    pub img: String,
    /// Hover text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alt: String,
    /// Publication year, e.g. "2009"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub year: String,
    /// Publication month without zero padding, e.g. "8"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub month: String,
    /// Publication day without zero padding, e.g. "7"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub day: String,
    /// Link the comic image points to, usually empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    /// Site news shown alongside the comic, usually empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub news: String,
    /// Text transcript, empty for most recent comics
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcript: String,
    /// Any fields not listed above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads a string field that upstream may send as `null`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Comic {
    /// Returns the publication date, if all three components parse
    pub fn published(&self) -> Option<NaiveDate> {
        let year = self.year.trim().parse().ok()?;
        let month = self.month.trim().parse().ok()?;
        let day = self.day.trim().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Canonical page URL for this comic
    pub fn page_url(&self) -> String {
        format!("https://xkcd.com/{}/", self.num)
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// The most recent comic
    Latest,
    /// A comic by number; not range checked
    Id(i64),
    /// Free text to search for
    Text(String),
}

impl Query {
    /// Interprets a raw query argument.
    ///
    /// `None` is the latest comic, digits (with an optional leading `#`) are
    /// a comic number, and anything else is searched for as text.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Query::Latest;
        };

        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = digits.parse() {
                return Query::Id(id);
            }
        }

        Query::Text(trimmed.to_string())
    }
}
