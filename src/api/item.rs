//! Raw catalog items and their conversion into listing rows
//!
//! The app API returns a loosely-typed tree of items (zones holding item
//! groups holding programs). Every field is optional; this module decides
//! where an item leads (`Item::route`) and what it looks like
//! (`Item::parse`).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::arte::ArteError;
use crate::models::{Art, InfoLabels, NavigableItem, Route};

/// `code.name` values of zones that only describe page layout
const LAYOUT_CODE_NAMES: &[&str] = &[
    "banner_1",
    "collection_associated",
    "collection_content",
    "collection_partner",
    "collection_upcoming",
];

/// Titles of entries pointing to external ARTE services
const EXTERNAL_TITLES: &[&str] = &["ARTE Boutique", "ARTE Radio"];

/// Remote image type -> host art type
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("banner", "banner"),
    ("landscape", "fanart"),
    ("portrait", "poster"),
    ("square", "thumb"),
];

const DATE_ADDED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Catalog item (or whole page payload) as returned by the app API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub teaser_text: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub full_description: Option<String>,
    #[serde(deserialize_with = "lenient_images")]
    pub images: Option<BTreeMap<String, Option<Image>>>,
    pub kind: Option<Kind>,
    pub program_id: Option<String>,
    pub link: Option<Link>,
    pub code: Option<Code>,
    pub data: Option<Vec<Item>>,
    pub zones: Option<Vec<Item>>,
    pub next_page: Option<String>,
    pub age_rating: Option<Value>,
    pub duration: Option<Value>,
    pub availability: Option<Availability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kind {
    pub is_collection: Option<bool>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Link {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Code {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Availability {
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub resolutions: Option<Vec<Resolution>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resolution {
    pub url: Option<String>,
    pub w: Option<Value>,
}

impl Resolution {
    /// Width in pixels, 0 when missing or not a number
    pub fn width(&self) -> f64 {
        self.w.as_ref().and_then(Value::as_f64).unwrap_or(0.0)
    }
}

/// Image map of an item; anything but an object means no images, and an
/// image that does not decode is kept as empty
fn lenient_images<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, Option<Image>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_object().map(|images| {
        images
            .iter()
            .map(|(kind, image)| {
                let image = serde_json::from_value(image.clone()).ok().flatten();
                (kind.clone(), image)
            })
            .collect()
    }))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Item {
    pub fn program_id(&self) -> Option<&str> {
        non_empty(&self.program_id)
    }

    pub fn link_page(&self) -> Option<&str> {
        self.link.as_ref().and_then(|l| non_empty(&l.page))
    }

    pub fn code_name(&self) -> Option<&str> {
        self.code.as_ref().and_then(|c| c.name.as_deref())
    }

    pub fn is_collection(&self) -> bool {
        self.kind
            .as_ref()
            .and_then(|k| k.is_collection)
            .unwrap_or(false)
    }

    /// Nested items, empty when absent
    pub fn children(&self) -> &[Item] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Items listed by a page: its zones, or its data when it has no zones
    pub fn collection(&self) -> &[Item] {
        match self.zones.as_deref() {
            Some(zones) if !zones.is_empty() => zones,
            _ => self.children(),
        }
    }

    /// Zones describing the page structure rather than content
    pub fn is_layout(&self) -> bool {
        self.code_name()
            .is_some_and(|name| LAYOUT_CODE_NAMES.contains(&name))
    }

    /// Entries that cannot be played from here
    pub fn is_external(&self) -> bool {
        let kind = self.kind.as_ref().and_then(|k| k.code.as_deref());
        kind == Some("EXTERNAL")
            || self
                .title
                .as_deref()
                .is_some_and(|title| EXTERNAL_TITLES.contains(&title))
    }

    /// Where selecting this item leads, given the listing it appears in
    ///
    /// Rules are tried in order; the first one that applies wins:
    /// 1. a collection with a program id opens that program
    /// 2. a link to another page opens that page
    /// 3. nested data reopens the same page one level down, at `index`
    /// 4. a program id plays the video
    pub fn route(&self, path: &str, index: usize) -> Option<Route> {
        let program_id = self.program_id();

        if let (true, Some(program_id)) = (self.is_collection(), program_id) {
            return Some(Route::collection(program_id));
        }

        if let Some(page) = self.link_page().filter(|page| *page != path) {
            return Some(Route::collection(page));
        }

        if !self.children().is_empty() {
            return Some(Route::collection_level(path, index));
        }

        if let Some(program_id) = program_id {
            return Some(Route::watch(program_id));
        }

        warn!(
            "Item {:?} in path {} is unmanaged",
            self.title.as_deref().unwrap_or_default(),
            path
        );
        None
    }

    /// Best resolution of each image, keyed by host art type
    pub fn art(&self) -> Result<Art, ArteError> {
        let mut art = Art::new();

        for (image_type, image) in self.images.iter().flatten() {
            let art_type = IMAGE_TYPES
                .iter()
                .find(|(remote, _)| *remote == image_type.as_str())
                .map(|(_, host)| *host)
                .ok_or_else(|| ArteError::UnknownImageType(image_type.clone()))?;

            let best = image
                .as_ref()
                .and_then(|i| i.resolutions.as_ref())
                .and_then(|r| r.iter().max_by(|a, b| a.width().total_cmp(&b.width())));

            if let Some(url) = best.and_then(|r| r.url.clone()) {
                art.entry(art_type.to_string()).or_insert(url);
            }
        }

        if let Some(fanart) = art.get("fanart").cloned() {
            art.entry("icon".to_string()).or_insert(fanart);
        }

        Ok(art)
    }

    /// Build the listing row for this item once its route is known
    ///
    /// Collections only carry a plot; videos get the full set of info
    /// labels and are flagged playable.
    pub fn parse(&self, route: Route) -> Result<NavigableItem, ArteError> {
        let art = self.art()?;

        let label = non_empty(&self.title).unwrap_or_default();
        if label.is_empty() {
            warn!("No title in item routed to {}", route);
        }

        let short_description = non_empty(&self.short_description);
        let plot = non_empty(&self.full_description)
            .or_else(|| non_empty(&self.description))
            .or(short_description);

        let mut item = NavigableItem::new(label, route);
        item.art = art;
        item.info.plot = plot.map(str::to_string);

        if item.route.is_folder() {
            item.properties
                .insert("isPlayable".to_string(), "false".to_string());
            return Ok(item);
        }

        item.info = InfoLabels {
            plot: plot.map(str::to_string),
            plotoutline: short_description
                .filter(|short| Some(*short) != plot)
                .map(str::to_string),
            tagline: non_empty(&self.subtitle)
                .or_else(|| non_empty(&self.teaser_text))
                .map(str::to_string),
            mpaa: self.age_rating.as_ref().and_then(value_text),
            duration: self.duration.as_ref().and_then(value_seconds),
            dateadded: self
                .availability
                .as_ref()
                .and_then(|a| non_empty(&a.start))
                .and_then(format_date_added),
            mediatype: Some("movie".to_string()),
            playcount: None,
        };
        item.properties
            .insert("isPlayable".to_string(), "true".to_string());

        Ok(item)
    }
}

/// Text of a truthy scalar (`0` and `""` count as absent)
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn value_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Offset-aware ISO-8601 layouts tried after RFC 3339
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parse an ISO-8601 timestamp (extended or basic, date-only allowed) as
/// wall-clock time in its own offset
fn parse_iso8601(start: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return Some(dt.naive_local());
    }

    // UTC designator: wall-clock time is already the one to keep
    let start = start.strip_suffix('Z').unwrap_or(start);

    ZONED_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(start, f).ok())
        .map(|dt| dt.naive_local())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(start, f).ok())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(start, f).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Reformat an ISO-8601 timestamp as a plain date-time, keeping its offset
fn format_date_added(start: &str) -> Option<String> {
    match parse_iso8601(start) {
        Some(dt) => Some(dt.format(DATE_ADDED_FORMAT).to_string()),
        None => {
            warn!("Invalid availability date {:?}", start);
            None
        }
    }
}
