//! Data structures shared across the add-on
//!
//! Contains the plain data exchanged between the catalog client, the
//! navigation controller and the host, organized by concern:
//! - **Routing**: `Route` and the query-string helpers around it
//! - **Listing**: `NavigableItem` with its info labels, art and properties
//! - **Streams**: `StreamVariant` and the ordered `StreamVariants`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Query-string parameters of an incoming request
pub type Params = BTreeMap<String, String>;

/// Artwork map, host image type -> URL or bundled media file name
pub type Art = BTreeMap<String, String>;

/// Free-form list item properties (`isPlayable`, `SpecialSort`, ...)
pub type Properties = BTreeMap<String, String>;

// =============================================================================
// Routing
// =============================================================================

/// Navigation intent encoded in a callback URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Route {
    /// Browse a collection, optionally descending into one nested group
    Collection {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<usize>,
    },
    /// Play a video, optionally in a given version
    Watch {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
    /// Prompt for a search query
    Search,
}

impl Route {
    pub fn collection(path: impl Into<String>) -> Self {
        Route::Collection {
            path: path.into(),
            level: None,
        }
    }

    pub fn collection_level(path: impl Into<String>, level: usize) -> Self {
        Route::Collection {
            path: path.into(),
            level: Some(level),
        }
    }

    pub fn watch(id: impl Into<String>) -> Self {
        Route::Watch {
            id: id.into(),
            version: None,
        }
    }

    pub fn watch_version(id: impl Into<String>, version: impl Into<String>) -> Self {
        Route::Watch {
            id: id.into(),
            version: Some(version.into()),
        }
    }

    /// Value of the `mode` parameter
    pub fn mode(&self) -> &'static str {
        match self {
            Route::Collection { .. } => "collection",
            Route::Watch { .. } => "watch",
            Route::Search => "search",
        }
    }

    /// Only collections are listed as folders by the host
    pub fn is_folder(&self) -> bool {
        matches!(self, Route::Collection { .. })
    }

    /// Ordered key/value pairs, `mode` first
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("mode", self.mode().to_string())];
        match self {
            Route::Collection { path, level } => {
                params.push(("path", path.clone()));
                if let Some(level) = level {
                    params.push(("level", level.to_string()));
                }
            }
            Route::Watch { id, version } => {
                params.push(("id", id.clone()));
                if let Some(version) = version {
                    params.push(("version", version.clone()));
                }
            }
            Route::Search => {}
        }
        params
    }

    /// Encode as a query string (without the leading `?`)
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish()
    }

    /// Build the callback URL invoking this route
    pub fn to_url(&self, base_url: &str) -> String {
        let base = base_url
            .split_once('?')
            .map_or(base_url, |(base, _)| base);
        format!("{}?{}", base, self.to_query())
    }

    /// Interpret request parameters, `None` meaning the root menu
    ///
    /// `collection` needs a non-empty `path` and `watch` a non-empty `id`;
    /// a `level` that is not a non-negative integer is ignored.
    pub fn from_params(params: &Params) -> Option<Route> {
        let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        match params.get("mode").map(String::as_str) {
            Some("collection") => Some(Route::Collection {
                path: non_empty("path")?,
                level: params.get("level").and_then(|l| l.parse().ok()),
            }),
            Some("watch") => Some(Route::Watch {
                id: non_empty("id")?,
                version: non_empty("version"),
            }),
            Some("search") => Some(Route::Search),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query())
    }
}

/// Parse a request query string, with or without its leading `?`
pub fn parse_params(query: &str) -> Params {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

// =============================================================================
// Listing
// =============================================================================

/// Video info labels handed to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoLabels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plotoutline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpaa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dateadded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mediatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playcount: Option<u32>,
}

/// One row of a listing: a sub-collection or a playable video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigableItem {
    pub label: String,
    pub route: Route,
    pub info: InfoLabels,
    pub art: Art,
    pub properties: Properties,
}

impl NavigableItem {
    pub fn new(label: impl Into<String>, route: Route) -> Self {
        Self {
            label: label.into(),
            route,
            info: InfoLabels::default(),
            art: Art::new(),
            properties: Properties::new(),
        }
    }

    pub fn is_playable(&self) -> bool {
        self.properties.get("isPlayable").map(String::as_str) == Some("true")
    }
}

impl fmt::Display for NavigableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.route)
    }
}

// =============================================================================
// Streams
// =============================================================================

/// One selectable version of a video stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVariant {
    /// Short version code, e.g. "VF" or "VOSTF"
    pub code: String,
    pub label: String,
    pub url: String,
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.code)
    }
}

/// Stream variants of a video keyed by code, in server order
///
/// The first variant is the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamVariants(Vec<StreamVariant>);

impl StreamVariants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant unless its code is already present
    pub fn insert(&mut self, variant: StreamVariant) -> bool {
        if self.get(&variant.code).is_some() {
            return false;
        }
        self.0.push(variant);
        true
    }

    pub fn get(&self, code: &str) -> Option<&StreamVariant> {
        self.0.iter().find(|v| v.code == code)
    }

    pub fn first(&self) -> Option<&StreamVariant> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamVariant> {
        self.0.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.code.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a StreamVariants {
    type Item = &'a StreamVariant;
    type IntoIter = std::slice::Iter<'a, StreamVariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
