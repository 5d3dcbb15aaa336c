//! Comic store backed by the JSON cache file
//!
//! Fetches comics from the xkcd API and memoizes them by request URL. Every
//! new comic is added to the in-memory map and the whole map is written back
//! to the cache file before the comic is returned.

use super::Comic;
use crate::cache::CacheFile;
use log::debug;
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use tokio::sync::Mutex;

/// Request URL to comic
pub type ComicMap = BTreeMap<String, Comic>;

/// Errors that can occur when fetching a comic
#[derive(Debug, Error)]
pub enum ComicError {
    /// The API answered with something other than 200 OK
    #[error("Could not find comic at {url} (HTTP {status})")]
    NotFound { url: String, status: StatusCode },

    /// The response body is not a comic
    #[error("Invalid comic: {0}")]
    InvalidData(#[from] serde_json::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Writing the cache file failed
    #[error("Failed to write cache file: {0}")]
    IoError(#[from] io::Error),
}

/// Fetches comics and keeps every one it has seen
///
/// Entries are never refreshed or removed. The map is guarded by a mutex so
/// that concurrent fetches cannot drop each other's entries from the file:
/// inserting and persisting happen under one lock.
#[derive(Debug)]
pub struct ComicStore {
    /// HTTP client for API requests
    http_client: Client,
    /// Where the map is persisted
    cache_file: CacheFile,
    /// In-memory cache
    comics: Mutex<ComicMap>,
}

impl ComicStore {
    /// Creates an empty store; call [`ComicStore::load_cache`] to read the file
    pub fn new(http_client: Client, cache_file: CacheFile) -> Self {
        Self {
            http_client,
            cache_file,
            comics: Mutex::new(ComicMap::new()),
        }
    }

    /// Creates a store and loads its cache file
    pub async fn open(http_client: Client, cache_file: CacheFile) -> io::Result<Self> {
        let store = Self::new(http_client, cache_file);
        store.load_cache().await?;
        Ok(store)
    }

    /// Returns the cache file path
    pub fn cache_path(&self) -> &Path {
        self.cache_file.path()
    }

    /// Number of cached comics
    pub async fn len(&self) -> usize {
        self.comics.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.comics.lock().await.is_empty()
    }

    /// Whether `url` has been fetched before
    pub async fn contains(&self, url: &str) -> bool {
        self.comics.lock().await.contains_key(url)
    }

    /// Returns the comic at `url`, from the cache if it was fetched before
    ///
    /// # Returns
    /// * `Ok(Comic)` - The cached or freshly fetched comic
    /// * `Err(ComicError::NotFound)` - If the API does not answer 200 OK
    /// * `Err(ComicError::InvalidData)` - If the body is not a comic
    /// * `Err(ComicError::HttpError)` - If the request fails
    /// * `Err(ComicError::IoError)` - If the cache file cannot be written
    ///
    /// # Behavior
    /// - A cached comic is returned without any network access
    /// - Failed fetches leave the cache and the file untouched
    /// - A comic whose cache write fails is not kept in memory either
    /// - If another fetch stored the same URL first, that comic is returned
    pub async fn get_comic(&self, url: &str) -> Result<Comic, ComicError> {
        if let Some(comic) = self.comics.lock().await.get(url) {
            debug!("Cache hit: {}", url);
            return Ok(comic.clone());
        }

        debug!("Cache miss, fetching: {}", url);
        let comic = self.fetch_from_api(url).await?;

        let mut comics = self.comics.lock().await;
        if let Some(existing) = comics.get(url) {
            return Ok(existing.clone());
        }

        comics.insert(url.to_string(), comic.clone());
        if let Err(e) = self.cache_file.save(&*comics).await {
            // Keep memory in step with the file
            comics.remove(url);
            return Err(e.into());
        }

        Ok(comic)
    }

    /// Replaces the in-memory cache with the contents of the cache file
    ///
    /// A missing file is created empty and the cache is reset to empty. A
    /// file that does not parse also yields an empty cache.
    pub async fn load_cache(&self) -> io::Result<()> {
        let loaded: ComicMap = self.cache_file.load().await?;
        debug!(
            "Loaded {} cached comics from {}",
            loaded.len(),
            self.cache_file.path().display()
        );
        *self.comics.lock().await = loaded;
        Ok(())
    }

    /// Writes the whole in-memory cache to the cache file
    pub async fn save_cache(&self) -> io::Result<()> {
        let comics = self.comics.lock().await;
        self.cache_file.save(&*comics).await
    }

    /// Fetches and parses a comic from the API
    async fn fetch_from_api(&self, url: &str) -> Result<Comic, ComicError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ComicError::NotFound {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http_client;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Helper to create a store over a cache file in a temp directory
    fn create_test_store() -> (ComicStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache_file = CacheFile::with_path(temp_dir.path().join("Cache.json"));
        let store = ComicStore::new(http_client().unwrap(), cache_file);
        (store, temp_dir)
    }

    fn woodpecker() -> serde_json::Value {
        json!({
            "month": "8",
            "num": 614,
            "link": "",
            "year": "2009",
            "news": "",
            "safe_title": "Woodpecker",
            "transcript": "",
            "alt": "If you don't have an extension cord I can get that too.",
            "img": "https://imgs.xkcd.com/comics/woodpecker.png",
            "title": "Woodpecker",
            "day": "24"
        })
    }

    async fn mount_comic(mock_server: &MockServer, comic_path: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(comic_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(mock_server)
            .await;
    }

    fn read_cache_file(store: &ComicStore) -> ComicMap {
        let content = fs::read_to_string(store.cache_path()).expect("Should read cache file");
        serde_json::from_str(&content).expect("Cache file should be valid JSON")
    }

    #[tokio::test]
    async fn test_get_comic_fetches_and_persists() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();
        mount_comic(&mock_server, "/614/info.0.json", woodpecker()).await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        let comic = store.get_comic(&url).await.unwrap();

        assert_eq!(comic.num, 614);
        assert_eq!(comic.title, "Woodpecker");

        let persisted = read_cache_file(&store);
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted.get(&url), Some(&comic));
    }

    #[tokio::test]
    async fn test_get_comic_twice_makes_one_request() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();

        Mock::given(method("GET"))
            .and(path("/614/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(woodpecker()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        let first = store.get_comic(&url).await.unwrap();
        let second = store.get_comic(&url).await.unwrap();

        assert_eq!(first, second);
        assert!(store.contains(&url).await);
    }

    #[tokio::test]
    async fn test_get_comic_404_is_not_found() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();
        store.load_cache().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/404/info.0.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/404/info.0.json", mock_server.uri());
        let result = store.get_comic(&url).await;

        match result {
            Err(ComicError::NotFound { url: missing, status }) => {
                assert_eq!(missing, url);
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert!(store.is_empty().await);
        let content = fs::read_to_string(store.cache_path()).unwrap();
        assert!(content.is_empty(), "Cache file should be untouched");
    }

    #[tokio::test]
    async fn test_get_comic_other_success_status_is_not_found() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let url = format!("{}/1/info.0.json", mock_server.uri());
        let result = store.get_comic(&url).await;

        assert!(matches!(result, Err(ComicError::NotFound { .. })));
        assert!(!store.cache_path().exists());
    }

    #[tokio::test]
    async fn test_get_comic_invalid_body_is_invalid_data() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();

        Mock::given(method("GET"))
            .and(path("/1/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/1/info.0.json", mock_server.uri());
        let result = store.get_comic(&url).await;

        assert!(matches!(result, Err(ComicError::InvalidData(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_comic_null_body_is_invalid_data() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/2/info.0.json", mock_server.uri());
        let result = store.get_comic(&url).await;

        assert!(matches!(result, Err(ComicError::InvalidData(_))));
        assert!(!store.contains(&url).await);
    }

    #[tokio::test]
    async fn test_cached_comic_survives_reload() {
        let mock_server = MockServer::start().await;
        let (store, temp_dir) = create_test_store();
        mount_comic(&mock_server, "/614/info.0.json", woodpecker()).await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        let comic = store.get_comic(&url).await.unwrap();

        let reopened = ComicStore::open(
            http_client().unwrap(),
            CacheFile::with_path(temp_dir.path().join("Cache.json")),
        )
        .await
        .unwrap();

        assert_eq!(reopened.len().await, 1);
        // Served from the reloaded cache, so no mock is needed
        drop(mock_server);
        assert_eq!(reopened.get_comic(&url).await.unwrap(), comic);
    }

    #[tokio::test]
    async fn test_unknown_fields_survive_cache_file() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();
        let mut body = woodpecker();
        body["extra_parts"] = json!({"headerextra": "<b>hi</b>"});
        mount_comic(&mock_server, "/614/info.0.json", body).await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        store.get_comic(&url).await.unwrap();

        let content = fs::read_to_string(store.cache_path()).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(raw[&url]["extra_parts"]["headerextra"], "<b>hi</b>");
    }

    #[tokio::test]
    async fn test_get_comic_failed_write_is_not_cached() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache_file =
            CacheFile::with_path(temp_dir.path().join("no").join("such").join("Cache.json"));
        let store = ComicStore::new(http_client().unwrap(), cache_file);

        Mock::given(method("GET"))
            .and(path("/1/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"num": 1})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let url = format!("{}/1/info.0.json", mock_server.uri());

        let first = store.get_comic(&url).await;
        assert!(matches!(first, Err(ComicError::IoError(_))));
        assert!(!store.contains(&url).await);

        // Not served from memory: the second call fetches and fails to write again
        let second = store.get_comic(&url).await;
        assert!(matches!(second, Err(ComicError::IoError(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_cache_missing_file_creates_it() {
        let (store, _temp_dir) = create_test_store();
        assert!(!store.cache_path().exists());

        store.load_cache().await.unwrap();

        assert!(store.cache_path().exists());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_cache_invalid_json_is_empty() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.cache_path(), "{\"http://x\": [1, 2").unwrap();

        store.load_cache().await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_cache_missing_file_resets_memory() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();
        mount_comic(&mock_server, "/614/info.0.json", woodpecker()).await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        store.get_comic(&url).await.unwrap();
        fs::remove_file(store.cache_path()).unwrap();

        store.load_cache().await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_cache_writes_memory() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();
        mount_comic(&mock_server, "/614/info.0.json", woodpecker()).await;

        let url = format!("{}/614/info.0.json", mock_server.uri());
        store.get_comic(&url).await.unwrap();
        fs::write(store.cache_path(), "").unwrap();

        store.save_cache().await.unwrap();

        assert!(read_cache_file(&store).contains_key(&url));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_all_persisted() {
        let mock_server = MockServer::start().await;
        let (store, _temp_dir) = create_test_store();

        let mut first = woodpecker();
        first["num"] = json!(1);
        let mut second = woodpecker();
        second["num"] = json!(2);
        mount_comic(&mock_server, "/1/info.0.json", first).await;
        mount_comic(&mock_server, "/2/info.0.json", second).await;

        let url_1 = format!("{}/1/info.0.json", mock_server.uri());
        let url_2 = format!("{}/2/info.0.json", mock_server.uri());

        let (a, b) = tokio::join!(store.get_comic(&url_1), store.get_comic(&url_2));
        assert_eq!(a.unwrap().num, 1);
        assert_eq!(b.unwrap().num, 2);

        let persisted = read_cache_file(&store);
        assert_eq!(persisted.len(), 2);
        assert!(persisted.contains_key(&url_1));
        assert!(persisted.contains_key(&url_2));
    }
}
