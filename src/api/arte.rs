//! ARTE API client
//!
//! Two API generations sit behind the same bearer-token scheme:
//! - v3 "app" API (EMAC): catalog pages, collections and search results
//! - v2 "player" API: stream configuration of a video
//!
//! API base: https://api.arte.tv/api

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::item::Item;
use super::streams::PlayerConfig;
use crate::models::{NavigableItem, Route, StreamVariants};

/// Languages served by the ARTE API
pub const LANGUAGES: &[&str] = &["de", "en", "es", "fr", "it", "pl"];

/// Fallback when the requested language is not served
pub const DEFAULT_LANGUAGE: &str = "en";

const DEFAULT_BASE_URL: &str = "https://api.arte.tv/api";
const USER_AGENT: &str = "arte/214402054";

const APP_BEARER: &str = concat!(
    "MWZmZjk5NjE1ODgxM2E0MTI2NzY4MzQ5MTZkOWVkYTA1M2U4YjM3NDM2MjEwMDllODRhM",
    "jIzZjQwNjBiNGYxYw"
);
const PLAYER_BEARER: &str = concat!(
    "ZWU0ZWU0NDlmNTNkODcwNWZhNTYzOTc5MjExZTc4NjE4NzExYjE1OTM3YjFhOTQxMTJhN",
    "WJlNzYxNmM3MTdjYQ"
);

/// Label of the "load more" row, localized by the host
pub const NEXT_PAGE_LABEL: &str = "$LOCALIZE[30201]";
pub const NEXT_PAGE_ICON: &str = "next-page.png";

/// ARTE API error types
#[derive(Error, Debug)]
pub enum ArteError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("API error ({status}): {error}")]
    Api { status: u16, error: Value },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown image type: {0}")]
    UnknownImageType(String),
}

/// Backend API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    App,
    Player,
}

impl Api {
    fn bearer(self) -> &'static str {
        match self {
            Api::App => APP_BEARER,
            Api::Player => PLAYER_BEARER,
        }
    }

    fn base_url(self, api_base: &str, language: &str) -> String {
        match self {
            Api::App => format!("{}/emac/v3/{}/app", api_base, language),
            Api::Player => format!("{}/player/v2/config/{}", api_base, language),
        }
    }
}

/// ARTE API client
///
/// Owns the HTTP session for its whole lifetime; connections are closed
/// when the client is dropped.
pub struct ArteClient {
    language: String,
    app_url: String,
    player_url: String,
    client: reqwest::Client,
}

impl ArteClient {
    /// Create a client for one of [`LANGUAGES`]
    pub fn new(language: &str) -> Result<Self, ArteError> {
        Self::with_base_url(language, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom API base URL (for testing)
    pub fn with_base_url(language: &str, api_base: &str) -> Result<Self, ArteError> {
        if !LANGUAGES.contains(&language) {
            return Err(ArteError::UnsupportedLanguage(language.to_string()));
        }

        let api_base = api_base.trim_end_matches('/');
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            language: language.to_string(),
            app_url: Api::App.base_url(api_base, language),
            player_url: Api::Player.base_url(api_base, language),
            client,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Base URL of the catalog API, language included
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    fn endpoint(&self, api: Api, path: &str) -> String {
        match api {
            Api::App => format!("{}/{}", self.app_url, path.trim_matches('/')),
            Api::Player => format!("{}/{}", self.player_url, path),
        }
    }

    /// Make an authenticated GET request and decode its JSON body
    async fn query<T: DeserializeOwned>(&self, api: Api, path: &str) -> Result<T, ArteError> {
        let url = self.endpoint(api, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(api.bearer())
            .send()
            .await?;

        let status = response.status();
        let http_error = response.error_for_status_ref().err();
        if let Some(http_error) = http_error {
            // Prefer the structured error ARTE sends along, if any
            let body = response.text().await.unwrap_or_default();
            let remote = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").cloned())
                .filter(|e| !e.is_null());

            return Err(match remote {
                Some(error) => ArteError::Api {
                    status: status.as_u16(),
                    error,
                },
                None => ArteError::Http(http_error),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ArteError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// List the items of a catalog page
    ///
    /// `level` selects one nested group of the page (a zone) instead of the
    /// page itself; an out-of-range level is ignored. Layout zones, external
    /// entries and items without a route are left out. A trailing "load
    /// more" row is added when the listed payload has a next page.
    pub async fn get_collection(
        &self,
        path: &str,
        level: Option<usize>,
    ) -> Result<Vec<NavigableItem>, ArteError> {
        let page: Item = self.query(Api::App, path).await?;

        let (current, candidates) = match level.and_then(|l| page.collection().get(l)) {
            Some(zone) => (zone, zone.children()),
            None => (&page, page.collection()),
        };

        let mut items = Vec::with_capacity(candidates.len() + 1);
        for (index, raw) in candidates.iter().enumerate() {
            if raw.is_layout() || raw.is_external() {
                debug!("Skipping item {} of {}", index, path);
                continue;
            }

            let Some(route) = raw.route(path, index) else {
                continue;
            };

            items.push(raw.parse(route)?);
        }

        if let Some(next_page) = current.next_page.as_deref().filter(|p| !p.is_empty()) {
            items.push(self.next_page_item(next_page));
        }

        Ok(items)
    }

    fn next_page_item(&self, next_page: &str) -> NavigableItem {
        let path = next_page.replace(&self.app_url, "");
        let mut item = NavigableItem::new(
            NEXT_PAGE_LABEL,
            Route::collection(path.trim_start_matches('/')),
        );
        item.info.plot = Some(String::new());
        item.art
            .insert("icon".to_string(), NEXT_PAGE_ICON.to_string());
        item.properties
            .insert("SpecialSort".to_string(), "bottom".to_string());
        item
    }

    /// Get the stream variants of a video, default variant first
    pub async fn get_video_streams(&self, video_id: &str) -> Result<StreamVariants, ArteError> {
        let config: PlayerConfig = self.query(Api::Player, video_id).await?;
        Ok(config.into_variants())
    }
}

impl Drop for ArteClient {
    fn drop(&mut self) {
        debug!("Closing ARTE session ({})", self.language);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsupported_language() {
        match ArteClient::new("nl") {
            Err(ArteError::UnsupportedLanguage(lang)) => assert_eq!(lang, "nl"),
            _ => panic!("Expected UnsupportedLanguage"),
        }
        assert!(ArteClient::new("").is_err());
    }

    #[test]
    fn test_accepts_all_languages() {
        for language in LANGUAGES {
            let client = ArteClient::new(language).unwrap();
            assert_eq!(client.language(), *language);
        }
        assert!(LANGUAGES.contains(&DEFAULT_LANGUAGE));
    }

    #[test]
    fn test_endpoints() {
        let client = ArteClient::new("fr").unwrap();
        assert_eq!(client.app_url(), "https://api.arte.tv/api/emac/v3/fr/app");
        assert_eq!(
            client.endpoint(Api::App, "/CATEGORIES/"),
            "https://api.arte.tv/api/emac/v3/fr/app/CATEGORIES"
        );
        assert_eq!(
            client.endpoint(Api::Player, "123456-000-A"),
            "https://api.arte.tv/api/player/v2/config/fr/123456-000-A"
        );
    }

    #[test]
    fn test_next_page_item_strips_api_base() {
        let client = ArteClient::new("de").unwrap();
        let item = client
            .next_page_item("https://api.arte.tv/api/emac/v3/de/app/CATEGORIES?page=2");

        assert_eq!(item.route, Route::collection("CATEGORIES?page=2"));
        assert_eq!(item.label, NEXT_PAGE_LABEL);
        assert_eq!(
            item.properties.get("SpecialSort").map(String::as_str),
            Some("bottom")
        );
        assert_eq!(item.art.get("icon").map(String::as_str), Some(NEXT_PAGE_ICON));
    }
}
