//! Player API payload and stream version extraction

use serde::Deserialize;

use crate::models::{StreamVariant, StreamVariants};

/// Player configuration response (`data.attributes.streams`)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    data: Option<PlayerData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlayerData {
    attributes: Option<PlayerAttributes>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlayerAttributes {
    streams: Option<Vec<RawStream>>,
}

/// One stream group: a URL and the versions it carries
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStream {
    url: Option<String>,
    versions: Option<Vec<RawVersion>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawVersion {
    short_label: Option<String>,
    label: Option<String>,
}

impl PlayerConfig {
    /// Convert to stream variants, in server order
    ///
    /// Only the first version of each group names it. Groups without a URL,
    /// without versions, or whose first version lacks a code or a label are
    /// skipped.
    pub fn into_variants(self) -> StreamVariants {
        let streams = self
            .data
            .and_then(|d| d.attributes)
            .and_then(|a| a.streams)
            .unwrap_or_default();

        let mut variants = StreamVariants::new();
        for stream in streams {
            let Some(url) = stream.url.filter(|u| !u.is_empty()) else {
                continue;
            };
            let Some(version) = stream.versions.and_then(|v| v.into_iter().next()) else {
                continue;
            };

            let code = version.short_label.filter(|s| !s.is_empty());
            let label = version.label.filter(|s| !s.is_empty());
            if let (Some(code), Some(label)) = (code, label) {
                variants.insert(StreamVariant { code, label, url });
            }
        }

        variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variants(value: serde_json::Value) -> StreamVariants {
        serde_json::from_value::<PlayerConfig>(value)
            .unwrap()
            .into_variants()
    }

    #[test]
    fn test_empty_payloads() {
        assert!(variants(json!({})).is_empty());
        assert!(variants(json!({"data": null})).is_empty());
        assert!(variants(json!({"data": {"attributes": {"streams": []}}})).is_empty());
    }

    #[test]
    fn test_skips_incomplete_groups() {
        let result = variants(json!({"data": {"attributes": {"streams": [
            {"url": null, "versions": [{"shortLabel": "VF", "label": "Français"}]},
            {"url": "https://a.m3u8", "versions": []},
            {"url": "https://b.m3u8", "versions": [{"shortLabel": "VA"}]},
            {"url": "https://c.m3u8", "versions": [{"label": "Deutsch"}]},
            {"url": "https://d.m3u8", "versions": [{"shortLabel": "VOSTF", "label": "OmU"}]}
        ]}}}));

        assert_eq!(result.codes(), vec!["VOSTF"]);
        assert_eq!(result.first().map(|v| v.url.as_str()), Some("https://d.m3u8"));
    }

    #[test]
    fn test_first_version_only_and_first_code_wins() {
        let result = variants(json!({"data": {"attributes": {"streams": [
            {"url": "https://1.m3u8", "versions": [
                {"shortLabel": "VF", "label": "Français"},
                {"shortLabel": "VA", "label": "Allemand"}
            ]},
            {"url": "https://2.m3u8", "versions": [{"shortLabel": "VO", "label": "Original"}]},
            {"url": "https://3.m3u8", "versions": [{"shortLabel": "VF", "label": "Doublon"}]}
        ]}}}));

        assert_eq!(result.codes(), vec!["VF", "VO"]);
        let vf = result.get("VF").unwrap();
        assert_eq!(vf.label, "Français");
        assert_eq!(vf.url, "https://1.m3u8");
    }
}
