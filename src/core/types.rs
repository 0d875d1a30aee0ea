use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Locale tag used as the fallback entry of a [`LocalizedField`].
pub const WILDCARD_LOCALE: &str = "*";

/// One locale-tagged value of a [`LocalizedField`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedValue {
    pub lang: String,
    pub value: String,
}

impl LocalizedValue {
    pub fn new(lang: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            value: value.into(),
        }
    }
}

/// Ordered locale-tagged values, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocalizedField(pub Vec<LocalizedValue>);

impl LocalizedField {
    /// Field holding a single untagged value, stored under the wildcard tag
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![LocalizedValue::new(WILDCARD_LOCALE, value)])
    }

    /// Value for `lang`.
    ///
    /// An exact tag wins as soon as it is seen. Otherwise the last wildcard
    /// entry is used, and an empty string when there is none.
    pub fn value(&self, lang: &str) -> &str {
        let mut fallback = "";
        for entry in &self.0 {
            if entry.lang == lang {
                return &entry.value;
            }
            if entry.lang == WILDCARD_LOCALE {
                fallback = &entry.value;
            }
        }
        fallback
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalizedValue> {
        self.0.iter()
    }
}

impl From<Vec<LocalizedValue>> for LocalizedField {
    fn from(values: Vec<LocalizedValue>) -> Self {
        Self(values)
    }
}

/// Named metadata fields of an asset.
///
/// Keys the upstream sends that have no named field here end up in `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetMetadata {
    pub content_source: LocalizedField,
    pub genre: LocalizedField,
    pub louise_press_title: LocalizedField,
    pub louise_product_key: LocalizedField,
    pub louise_program_type: LocalizedField,
    pub episode: LocalizedField,
    pub season: LocalizedField,
    pub season_synopsis: LocalizedField,
    pub series_description_short: LocalizedField,
    pub genre_description: LocalizedField,
    #[serde(flatten)]
    pub other: BTreeMap<String, LocalizedField>,
}

impl AssetMetadata {
    /// Field stored under the upstream key `key`
    pub fn get(&self, key: &str) -> Option<&LocalizedField> {
        match key {
            "content-source" => Some(&self.content_source),
            "genre" => Some(&self.genre),
            "louise-press-title" => Some(&self.louise_press_title),
            "louise-product-key" => Some(&self.louise_product_key),
            "louise-program-type" => Some(&self.louise_program_type),
            "episode" => Some(&self.episode),
            "season" => Some(&self.season),
            "season-synopsis" => Some(&self.season_synopsis),
            "series-description-short" => Some(&self.series_description_short),
            "genre-description" => Some(&self.genre_description),
            _ => self.other.get(key),
        }
    }

    /// Store `field` under the upstream key `key`, replacing any previous value
    pub fn insert(&mut self, key: &str, field: LocalizedField) {
        let slot = match key {
            "content-source" => &mut self.content_source,
            "genre" => &mut self.genre,
            "louise-press-title" => &mut self.louise_press_title,
            "louise-product-key" => &mut self.louise_product_key,
            "louise-program-type" => &mut self.louise_program_type,
            "episode" => &mut self.episode,
            "season" => &mut self.season,
            "season-synopsis" => &mut self.season_synopsis,
            "series-description-short" => &mut self.series_description_short,
            "genre-description" => &mut self.genre_description,
            _ => {
                self.other.insert(key.to_string(), field);
                return;
            }
        };
        *slot = field;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageVersion {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageVersions(pub Vec<ImageVersion>);

impl ImageVersions {
    /// URL of the first image of type `kind`, empty when there is none
    pub fn type_url(&self, kind: &str) -> &str {
        self.0
            .iter()
            .find(|image| image.kind == kind)
            .map_or("", |image| image.url.as_str())
    }
}

/// Node of a category hierarchy. Each node owns its parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub parent: Option<Box<Category>>,
}

impl Category {
    /// This node followed by its ancestors, nearest first
    pub fn lineage(&self) -> impl Iterator<Item = &Category> {
        std::iter::successors(Some(self), |category| category.parent.as_deref())
    }

    /// True if this node or any ancestor has id `id`
    pub fn contains(&self, id: &str) -> bool {
        self.lineage().any(|category| category.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Asset {
    pub id: String,
    pub channel_id: String,
    pub category_id: String,
    pub asset_type_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub image_versions: ImageVersions,

    pub archive: bool,
    pub aspect_16x9: bool,
    pub auto_distribute: bool,
    pub auto_encode: bool,
    pub auto_publish: bool,
    pub copy_live_stream: bool,
    pub deleted: bool,
    pub drm_protected: bool,
    pub items_published: bool,
    pub labeled_as_free: bool,
    pub live: bool,

    /// Whole seconds, truncated from the upstream value
    pub duration: i64,
    pub accurate_duration: f64,
    pub views: i64,

    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub expire_date: Option<DateTime<Utc>>,
    pub live_broadcast_time: Option<DateTime<Utc>>,

    pub metadata: AssetMetadata,
    pub category: Option<Category>,
}

impl Asset {
    /// Whether the asset's category or one of its ancestors has id `category_id`
    pub fn in_category(&self, category_id: &str) -> bool {
        self.category
            .as_ref()
            .is_some_and(|category| category.contains(category_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_name: String,
    pub product_payment_id: String,
    pub access_end_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Videofile {
    pub bitrate: i64,
    pub media_format: String,
    pub scheme: String,
    pub server: String,
    pub base: String,
    pub url: String,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideofilesResponse {
    pub asset_id: String,
    pub title: String,
    pub videofiles: Vec<Videofile>,
}

/// Conversion functions shared by the normalizer
pub mod conversion {
    use super::*;
    use crate::core::errors::VimondError;

    /// Epoch milliseconds to UTC, `None` when out of range
    #[inline]
    pub fn epoch_ms_to_time(ms: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(ms)
    }

    #[inline]
    pub fn time_to_epoch_ms(time: DateTime<Utc>) -> i64 {
        time.timestamp_millis()
    }

    /// Seconds as whole seconds, truncated toward zero
    #[inline]
    pub fn truncate_duration(seconds: f64) -> i64 {
        seconds.trunc() as i64
    }

    /// Parse an asset identifier: non-empty, ASCII digits only, fits in `u64`
    pub fn parse_asset_id(id: &str) -> Result<u64, VimondError> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VimondError::InvalidInput(format!(
                "asset id must be a non-negative integer: {:?}",
                id
            )));
        }

        id.parse::<u64>()
            .map_err(|e| VimondError::InvalidInput(format!("asset id {:?}: {}", id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::conversion::*;
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn chain() -> Category {
        Category {
            id: "2".to_string(),
            title: "child".to_string(),
            parent: Some(Box::new(Category {
                id: "1".to_string(),
                title: "parent".to_string(),
                parent: Some(Box::new(Category {
                    id: "0".to_string(),
                    title: "root".to_string(),
                    parent: None,
                })),
            })),
        }
    }

    #[test_case("*", "Foo"; "wildcard exact")]
    #[test_case("da_DK", "Foo"; "falls back to wildcard")]
    #[test_case("sv_SE", "Bar"; "exact wins over earlier wildcard")]
    fn test_localized_value(lang: &str, want: &str) {
        let field = LocalizedField(vec![
            LocalizedValue::new("*", "Foo"),
            LocalizedValue::new("sv_SE", "Bar"),
        ]);
        assert_eq!(field.value(lang), want);
    }

    #[test]
    fn test_localized_value_last_wildcard_wins() {
        let field = LocalizedField(vec![
            LocalizedValue::new("*", "first"),
            LocalizedValue::new("nb_NO", "norsk"),
            LocalizedValue::new("*", "second"),
        ]);
        assert_eq!(field.value("fi_FI"), "second");
        assert_eq!(field.value("nb_NO"), "norsk");
    }

    #[test]
    fn test_localized_value_empty_without_match() {
        let field = LocalizedField(vec![LocalizedValue::new("sv_SE", "Bar")]);
        assert_eq!(field.value("da_DK"), "");
        assert_eq!(LocalizedField::default().value("*"), "");
    }

    #[test_case("0", true)]
    #[test_case("1", true)]
    #[test_case("2", true)]
    #[test_case("3", false)]
    fn test_category_contains(id: &str, want: bool) {
        assert_eq!(chain().contains(id), want);
    }

    #[test]
    fn test_category_lineage_order() {
        let category = chain();
        let ids: Vec<&str> = category.lineage().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "0"]);
    }

    #[test]
    fn test_asset_in_category() {
        let asset = Asset {
            category: Some(chain()),
            ..Asset::default()
        };
        assert!(asset.in_category("1"));
        assert!(!asset.in_category("7"));
        assert!(!Asset::default().in_category("0"));
    }

    #[test]
    fn test_image_versions_first_match() {
        let images = ImageVersions(vec![
            ImageVersion {
                kind: "poster".to_string(),
                url: "http://img/first".to_string(),
            },
            ImageVersion {
                kind: "poster".to_string(),
                url: "http://img/second".to_string(),
            },
        ]);
        assert_eq!(images.type_url("poster"), "http://img/first");
        assert_eq!(images.type_url("thumb"), "");
    }

    #[test]
    fn test_metadata_insert_routes_known_keys() {
        let mut metadata = AssetMetadata::default();
        metadata.insert("louise-press-title", LocalizedField::single("Title"));
        metadata.insert("x-custom", LocalizedField::single("custom"));

        assert_eq!(metadata.louise_press_title.value("sv_SE"), "Title");
        assert_eq!(
            metadata.get("x-custom").map(|f| f.value("*")),
            Some("custom")
        );
        assert!(metadata.get("genre").is_some_and(LocalizedField::is_empty));
    }

    #[test]
    fn test_epoch_ms_round_trip() {
        let want = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(234);

        let time = epoch_ms_to_time(946_782_245_234).unwrap();
        assert_eq!(time, want);
        assert_eq!(time_to_epoch_ms(time), 946_782_245_234);
    }

    #[test]
    fn test_epoch_zero_is_epoch() {
        assert_eq!(epoch_ms_to_time(0), Some(DateTime::<Utc>::UNIX_EPOCH));
    }

    #[test_case(2.99, 2)]
    #[test_case(-1.9, -1)]
    #[test_case(0.0, 0)]
    #[test_case(3600.0, 3600)]
    fn test_truncate_duration(seconds: f64, want: i64) {
        assert_eq!(truncate_duration(seconds), want);
    }

    #[test_case("0", Some(0))]
    #[test_case("10012345", Some(10_012_345))]
    #[test_case("18446744073709551615", Some(u64::MAX); "u64 max")]
    #[test_case("18446744073709551616", None; "overflow")]
    #[test_case("invalid", None)]
    #[test_case("", None; "empty")]
    #[test_case("-1", None; "negative")]
    #[test_case("+1", None; "plus sign")]
    #[test_case(" 1", None; "leading space")]
    fn test_parse_asset_id(id: &str, want: Option<u64>) {
        assert_eq!(parse_asset_id(id).ok(), want);
    }
}
