//! Navigation controller
//!
//! Interprets one host request (base callback URL plus query parameters),
//! drives the [`ArteClient`] and feeds the host either a listing or a
//! resolved stream. The host listing is closed exactly once per request.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use thiserror::Error;

use crate::api::{ArteClient, ArteError};
use crate::host::{ContextAction, Directory, DirectoryEntry, Host, ResolvedStream};
use crate::models::{parse_params, Art, NavigableItem, Params, Properties, Route};

/// Languages in which ARTE broadcasts a live stream
pub const LIVE_LANGUAGES: &[&str] = &["de", "fr"];

/// Video id of the live stream in the player API
pub const LIVE_VIDEO_ID: &str = "LIVE";

const SEARCH_PATH: &str = "data/SEARCH_LISTING/";
const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

// Localized string ids
const LIVE_LABEL: u32 = 30001;
const SEARCH_LABEL: u32 = 30007;
const VERSION_ACTION_LABEL: u32 = 30203;

/// Root menu collections: label id, path, level, icon
const ROOT_COLLECTIONS: &[(u32, &str, Option<usize>, &str)] = &[
    (30002, "CATEGORIES", None, "categories.png"),
    (30003, "MAGAZINES", Some(0), "tv-shows.png"),
    (30004, "MOST_VIEWED", Some(0), "trending.png"),
    (30005, "MOST_RECENT", Some(0), "most-recent.png"),
    (30006, "LAST_CHANCE", Some(0), "last-chance.png"),
];

/// Watch request failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No stream available for video {0}")]
    NoStream(String),

    #[error("No stream \"{version}\" available for video {video_id}")]
    UnknownVersion { video_id: String, version: String },
}

/// Context of a single add-on invocation
pub struct Addon {
    base_url: String,
    params: Params,
    api: ArteClient,
}

impl Addon {
    /// Build the context for `params` (query string, leading `?` optional)
    pub fn new(base_url: impl Into<String>, params: &str, language: &str) -> Result<Self, ArteError> {
        Ok(Self::with_client(base_url, params, ArteClient::new(language)?))
    }

    /// Build the context around an existing client (for testing)
    pub fn with_client(base_url: impl Into<String>, params: &str, api: ArteClient) -> Self {
        Self {
            base_url: base_url.into(),
            params: parse_params(params),
            api,
        }
    }

    pub fn language(&self) -> &str {
        self.api.language()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Requested route, `None` for the root menu
    pub fn route(&self) -> Option<Route> {
        Route::from_params(&self.params)
    }

    /// Serve the request
    ///
    /// The host directory is ended on every path, flagged successful only
    /// when the request itself succeeded.
    pub async fn run<H: Host>(&self, host: &mut H) -> Result<()> {
        debug!("Addon params = {:?}", self.params);

        let mut directory = Directory::open(host);
        let result = match self.route() {
            Some(Route::Collection { path, level }) => {
                self.mode_collection(directory.host(), &path, level).await
            }
            Some(Route::Watch { id, version }) => {
                self.mode_watch(directory.host(), &id, version.as_deref())
                    .await
            }
            Some(Route::Search) => self.mode_search(directory.host()).await,
            None => {
                self.mode_default(directory.host()).await;
                Ok(())
            }
        };

        if result.is_ok() {
            directory.succeed();
        }
        result
    }

    async fn mode_collection<H: Host>(
        &self,
        host: &mut H,
        path: &str,
        level: Option<usize>,
    ) -> Result<()> {
        host.set_content("movies");

        let items = self
            .api
            .get_collection(path, level)
            .await
            .with_context(|| format!("Failed to list collection {}", path))?;

        for item in items {
            self.add_item(host, item).await;
        }
        Ok(())
    }

    async fn mode_watch<H: Host>(
        &self,
        host: &mut H,
        video_id: &str,
        version: Option<&str>,
    ) -> Result<()> {
        let variants = self
            .api
            .get_video_streams(video_id)
            .await
            .with_context(|| format!("Failed to get streams of video {}", video_id))?;

        // First stream is the default one
        let selected = match version {
            Some(version) => variants
                .get(version)
                .ok_or_else(|| NavigationError::UnknownVersion {
                    video_id: video_id.to_string(),
                    version: version.to_string(),
                }),
            None => variants
                .first()
                .ok_or_else(|| NavigationError::NoStream(video_id.to_string())),
        };

        let variant = match selected {
            Ok(variant) => variant,
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        };

        debug!("Stream URL for video {}: {}", video_id, variant.url);
        let stream = resolved_stream(host, &variant.url);
        host.set_resolved_url(true, stream);
        Ok(())
    }

    async fn mode_search<H: Host>(&self, host: &mut H) -> Result<()> {
        let heading = host.localized_string(SEARCH_LABEL);
        let Some(query) = host.input(&heading).filter(|q| !q.trim().is_empty()) else {
            debug!("Search cancelled");
            return Ok(());
        };

        let path = format!("{}?query={}", SEARCH_PATH, urlencoding::encode(&query));
        self.mode_collection(host, &path, None).await
    }

    async fn mode_default<H: Host>(&self, host: &mut H) {
        if LIVE_LANGUAGES.contains(&self.language()) {
            let mut live = NavigableItem::new(localize_token(LIVE_LABEL), Route::watch(LIVE_VIDEO_ID));
            // Don't mark the live stream as watched once played
            live.info.playcount = Some(0);
            live.art
                .insert("icon".to_string(), "live-tv.png".to_string());
            live.properties
                .insert("isPlayable".to_string(), "true".to_string());
            self.add_item(host, live).await;
        }

        for (label, path, level, icon) in ROOT_COLLECTIONS {
            let route = match level {
                Some(level) => Route::collection_level(*path, *level),
                None => Route::collection(*path),
            };
            self.add_item(host, menu_item(*label, route, icon)).await;
        }

        self.add_item(host, menu_item(SEARCH_LABEL, Route::Search, "search.png"))
            .await;
    }

    /// Hand one listing row to the host
    async fn add_item<H: Host>(&self, host: &mut H, item: NavigableItem) {
        debug!("Add ListItem {}", item);

        let NavigableItem {
            label,
            route,
            mut info,
            art,
            properties,
        } = item;

        let label = localize(host, &label);
        if info.plot.as_deref().map_or(true, str::is_empty) {
            info.plot = Some(label.clone());
        }

        let mut art: Art = art
            .into_iter()
            .map(|(kind, value)| {
                let value = if value.contains("://") {
                    value
                } else {
                    host.media_path(&value)
                };
                (kind, value)
            })
            .collect();
        if !art.contains_key("fanart") {
            if let Some(fanart) = host.addon_fanart() {
                art.insert("fanart".to_string(), fanart);
            }
        }

        let context_menu = match &route {
            Route::Watch { id, .. } => self.version_actions(host, id).await,
            _ => Vec::new(),
        };

        host.add_directory_item(DirectoryEntry {
            url: route.to_url(&self.base_url),
            label,
            is_folder: route.is_folder(),
            info,
            art,
            properties,
            context_menu,
        });
    }

    /// One "play this version" action per variant, when there is a choice
    async fn version_actions<H: Host>(&self, host: &H, video_id: &str) -> Vec<ContextAction> {
        let variants = match self.api.get_video_streams(video_id).await {
            Ok(variants) => variants,
            Err(e) => {
                warn!("Cannot list versions of video {}: {}", video_id, e);
                return Vec::new();
            }
        };

        if variants.len() <= 1 {
            return Vec::new();
        }

        let template = host.localized_string(VERSION_ACTION_LABEL);
        variants
            .iter()
            .map(|variant| ContextAction {
                label: template.replacen("{}", &variant.label, 1),
                action: format!(
                    "PlayMedia({})",
                    Route::watch_version(video_id, &variant.code).to_url(&self.base_url)
                ),
            })
            .collect()
    }
}

fn menu_item(label: u32, route: Route, icon: &str) -> NavigableItem {
    let mut item = NavigableItem::new(localize_token(label), route);
    item.art.insert("icon".to_string(), icon.to_string());
    item.properties
        .insert("isPlayable".to_string(), "false".to_string());
    item
}

fn localize_token(id: u32) -> String {
    format!("$LOCALIZE[{}]", id)
}

/// `$LOCALIZE[n]` token pattern, compiled once per process
fn localize_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\$LOCALIZE\[(\d+)\]").ok())
        .as_ref()
}

/// Replace `$LOCALIZE[n]` tokens with host strings
fn localize<H: Host>(host: &H, label: &str) -> String {
    let Some(token) = localize_pattern() else {
        return label.to_string();
    };

    token
        .replace_all(label, |caps: &Captures| {
            caps[1]
                .parse()
                .map(|id| host.localized_string(id))
                .unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Stream handed to the player, with adaptive streaming hints when the
/// host has an inputstream add-on
fn resolved_stream<H: Host>(host: &mut H, url: &str) -> ResolvedStream {
    let mut properties = Properties::new();
    let mut mime_type = None;

    if let Some(addon) = host.inputstream_addon() {
        mime_type = Some(HLS_MIME_TYPE.to_string());
        properties.insert(
            "inputstream.adaptive.manifest_type".to_string(),
            "hls".to_string(),
        );

        let key = if host.api_version() >= 19 {
            "inputstream"
        } else {
            "inputstreamaddon"
        };
        properties.insert(key.to_string(), addon);
    }

    ResolvedStream {
        url: url.to_string(),
        mime_type,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubHost {
        version: u32,
        addon: Option<String>,
    }

    impl Host for StubHost {
        fn localized_string(&self, id: u32) -> String {
            match id {
                30201 => "Next page".to_string(),
                30203 => "Play in {}".to_string(),
                _ => format!("#{}", id),
            }
        }
        fn api_version(&self) -> u32 {
            self.version
        }
        fn inputstream_addon(&mut self) -> Option<String> {
            self.addon.clone()
        }
        fn media_path(&self, file: &str) -> String {
            format!("/media/{}", file)
        }
        fn input(&mut self, _heading: &str) -> Option<String> {
            None
        }
        fn set_content(&mut self, _content: &str) {}
        fn add_directory_item(&mut self, _entry: DirectoryEntry) {}
        fn set_resolved_url(&mut self, _succeeded: bool, _stream: ResolvedStream) {}
        fn end_of_directory(&mut self, _succeeded: bool) {}
    }

    fn host(version: u32, addon: Option<&str>) -> StubHost {
        StubHost {
            version,
            addon: addon.map(str::to_string),
        }
    }

    #[test]
    fn test_localize_tokens() {
        let host = host(19, None);
        assert_eq!(localize(&host, "$LOCALIZE[30201]"), "Next page");
        assert_eq!(localize(&host, "A $LOCALIZE[1] B"), "A #1 B");
        assert_eq!(localize(&host, "Plain title"), "Plain title");
    }

    #[test]
    fn test_localize_pattern_is_shared() {
        let first = localize_pattern().unwrap();
        let second = localize_pattern().unwrap();
        assert!(std::ptr::eq(first, second));

        let host = host(19, None);
        for _ in 0..3 {
            assert_eq!(localize(&host, "$LOCALIZE[30203]"), "Play in {}");
        }
    }

    #[test]
    fn test_resolved_stream_property_name_by_host_version() {
        let stream = resolved_stream(&mut host(19, Some("inputstream.adaptive")), "https://s");
        assert_eq!(stream.mime_type.as_deref(), Some(HLS_MIME_TYPE));
        assert_eq!(
            stream.properties.get("inputstream").map(String::as_str),
            Some("inputstream.adaptive")
        );
        assert_eq!(
            stream
                .properties
                .get("inputstream.adaptive.manifest_type")
                .map(String::as_str),
            Some("hls")
        );

        let stream = resolved_stream(&mut host(18, Some("inputstream.adaptive")), "https://s");
        assert!(stream.properties.contains_key("inputstreamaddon"));
        assert!(!stream.properties.contains_key("inputstream"));
    }

    #[test]
    fn test_resolved_stream_without_helper() {
        let stream = resolved_stream(&mut host(19, None), "https://s");
        assert_eq!(stream.url, "https://s");
        assert!(stream.mime_type.is_none());
        assert!(stream.properties.is_empty());
    }

    #[test]
    fn test_route_from_addon_params() {
        let client = ArteClient::new("en").unwrap();
        let addon = Addon::with_client("plugin://x/", "?mode=collection&path=CATEGORIES&level=2", client);
        assert_eq!(addon.route(), Some(Route::collection_level("CATEGORIES", 2)));

        let client = ArteClient::new("en").unwrap();
        let addon = Addon::with_client("plugin://x/", "", client);
        assert_eq!(addon.route(), None);
    }
}
