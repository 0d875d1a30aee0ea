//! Wire shapes as the upstream sends them.
//!
//! These are deliberately permissive: fields that have changed type or
//! nesting between API versions decode into unions here, and
//! `converters` projects them into the stable `core::types` entities.

use serde::{de, Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Integer field that some deployments send as a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Integer(i64),
    Text(String),
}

/// Epoch milliseconds, or a textual timestamp
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Millis(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawLocalizedValue {
    #[serde(default)]
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMetadataValue {
    Localized(Vec<RawLocalizedValue>),
    Single(RawLocalizedValue),
    Text(String),
    Number(Number),
    Bool(bool),
    Other(Value),
}

/// Metadata block, either wrapped in `entries` or flat
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMetadata {
    Wrapped {
        entries: BTreeMap<String, RawMetadataValue>,
    },
    Flat(BTreeMap<String, RawMetadataValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawImage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawImageVersions {
    List(Vec<RawImage>),
    Wrapped {
        #[serde(default)]
        images: Vec<RawImage>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawCategory {
    #[serde(default)]
    pub id: Option<NumberOrString>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parent: Option<Box<RawCategory>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAsset {
    pub id: Option<NumberOrString>,
    pub channel_id: Option<NumberOrString>,
    pub category_id: Option<NumberOrString>,
    pub asset_type_id: Option<NumberOrString>,

    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_versions: Option<RawImageVersions>,

    pub archive: Option<bool>,
    #[serde(rename = "aspect16x9")]
    pub aspect_16x9: Option<bool>,
    pub auto_distribute: Option<bool>,
    pub auto_encode: Option<bool>,
    pub auto_publish: Option<bool>,
    pub copy_live_stream: Option<bool>,
    pub deleted: Option<bool>,
    pub drm_protected: Option<bool>,
    pub items_published: Option<bool>,
    pub labeled_as_free: Option<bool>,
    pub live: Option<bool>,

    pub duration: Option<f64>,
    pub accurate_duration: Option<f64>,
    pub views: Option<i64>,

    pub create_time: Option<RawTimestamp>,
    pub update_time: Option<RawTimestamp>,
    pub expire_date: Option<RawTimestamp>,
    pub live_broadcast_time: Option<RawTimestamp>,

    pub metadata: Option<RawMetadata>,
    pub category: Option<RawCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawOrder {
    pub id: Option<NumberOrString>,
    pub user_id: Option<NumberOrString>,
    pub product_name: Option<String>,
    #[serde(rename = "productPaymentID", alias = "productPaymentId")]
    pub product_payment_id: Option<NumberOrString>,
    pub access_end_date: Option<RawTimestamp>,
    pub end_date: Option<RawTimestamp>,
    pub start_date: Option<RawTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawPlatform {
    pub id: Option<NumberOrString>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawVideofile {
    pub bitrate: Option<NumberOrString>,
    pub media_format: Option<String>,
    pub scheme: Option<String>,
    pub server: Option<String>,
    pub base: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "filesize", alias = "fileSize")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawVideofiles {
    pub asset_id: Option<NumberOrString>,
    pub title: Option<String>,
    pub videofiles: Option<Vec<RawVideofile>>,
}

/// Body sent to create an order
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderBody<'a> {
    pub product_payment_id: &'a str,
}

// XML representation, served when no JSON media type is requested.

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawXmlLocalized {
    #[serde(rename = "@lang", default)]
    pub lang: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct RawXmlMetadata {
    #[serde(rename = "content-source", default)]
    pub content_source: Vec<RawXmlLocalized>,
    #[serde(default)]
    pub genre: Vec<RawXmlLocalized>,
    #[serde(rename = "louise-press-title", default)]
    pub louise_press_title: Vec<RawXmlLocalized>,
    #[serde(rename = "louise-product-key", default)]
    pub louise_product_key: Vec<RawXmlLocalized>,
    #[serde(rename = "louise-program-type", default)]
    pub louise_program_type: Vec<RawXmlLocalized>,
    #[serde(default)]
    pub episode: Vec<RawXmlLocalized>,
    #[serde(default)]
    pub season: Vec<RawXmlLocalized>,
    #[serde(rename = "season-synopsis", default)]
    pub season_synopsis: Vec<RawXmlLocalized>,
    #[serde(rename = "series-description-short", default)]
    pub series_description_short: Vec<RawXmlLocalized>,
    #[serde(rename = "genre-description", default)]
    pub genre_description: Vec<RawXmlLocalized>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawXmlImage {
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct RawXmlImageVersions {
    #[serde(rename = "image", default)]
    pub images: Vec<RawXmlImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawXmlCategory {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parent: Option<Box<RawXmlCategory>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawXmlAsset {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@channelId", default)]
    pub channel_id: Option<String>,
    #[serde(rename = "@categoryId", default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub asset_type_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_versions: Option<RawXmlImageVersions>,

    #[serde(default, deserialize_with = "xml_bool")]
    pub archive: Option<bool>,
    #[serde(rename = "aspect16x9", default, deserialize_with = "xml_bool")]
    pub aspect_16x9: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub auto_distribute: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub auto_encode: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub auto_publish: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub copy_live_stream: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub deleted: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub drm_protected: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub items_published: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub labeled_as_free: Option<bool>,
    #[serde(default, deserialize_with = "xml_bool")]
    pub live: Option<bool>,

    #[serde(default, deserialize_with = "xml_scalar")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "xml_scalar")]
    pub accurate_duration: Option<f64>,
    #[serde(default, deserialize_with = "xml_scalar")]
    pub views: Option<i64>,

    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub expire_date: Option<String>,
    #[serde(default)]
    pub live_broadcast_time: Option<String>,

    #[serde(default)]
    pub metadata: Option<RawXmlMetadata>,
    #[serde(default)]
    pub category: Option<RawXmlCategory>,
}

/// Numeric element text. Empty or blank text reads as absent.
fn xml_scalar<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Boolean element text in any of the spellings the upstream emits.
/// Empty or blank text reads as absent.
fn xml_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("1" | "t" | "T" | "true" | "TRUE" | "True") => Ok(Some(true)),
        Some("0" | "f" | "F" | "false" | "FALSE" | "False") => Ok(Some(false)),
        Some(other) => Err(de::Error::custom(format!("invalid boolean `{}`", other))),
    }
}

fn xml_localized(values: Vec<RawXmlLocalized>) -> RawMetadataValue {
    RawMetadataValue::Localized(
        values
            .into_iter()
            .map(|v| RawLocalizedValue {
                lang: v.lang,
                value: v.value,
            })
            .collect(),
    )
}

impl From<RawXmlMetadata> for RawMetadata {
    fn from(xml: RawXmlMetadata) -> Self {
        let fields = [
            ("content-source", xml.content_source),
            ("genre", xml.genre),
            ("louise-press-title", xml.louise_press_title),
            ("louise-product-key", xml.louise_product_key),
            ("louise-program-type", xml.louise_program_type),
            ("episode", xml.episode),
            ("season", xml.season),
            ("season-synopsis", xml.season_synopsis),
            ("series-description-short", xml.series_description_short),
            ("genre-description", xml.genre_description),
        ];

        Self::Flat(
            fields
                .into_iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(key, values)| (key.to_string(), xml_localized(values)))
                .collect(),
        )
    }
}

impl From<RawXmlCategory> for RawCategory {
    fn from(xml: RawXmlCategory) -> Self {
        Self {
            id: xml.id.map(NumberOrString::Text),
            title: xml.title,
            parent: xml.parent.map(|parent| Box::new(Self::from(*parent))),
        }
    }
}

impl From<RawXmlAsset> for RawAsset {
    fn from(xml: RawXmlAsset) -> Self {
        let images = |v: RawXmlImageVersions| {
            RawImageVersions::List(
                v.images
                    .into_iter()
                    .map(|image| RawImage {
                        kind: image.kind,
                        url: image.url,
                    })
                    .collect(),
            )
        };

        Self {
            id: xml.id.map(NumberOrString::Text),
            channel_id: xml.channel_id.map(NumberOrString::Text),
            category_id: xml.category_id.map(NumberOrString::Text),
            asset_type_id: xml.asset_type_id.map(NumberOrString::Text),
            title: xml.title,
            description: xml.description,
            image_url: xml.image_url,
            image_versions: xml.image_versions.map(images),
            archive: xml.archive,
            aspect_16x9: xml.aspect_16x9,
            auto_distribute: xml.auto_distribute,
            auto_encode: xml.auto_encode,
            auto_publish: xml.auto_publish,
            copy_live_stream: xml.copy_live_stream,
            deleted: xml.deleted,
            drm_protected: xml.drm_protected,
            items_published: xml.items_published,
            labeled_as_free: xml.labeled_as_free,
            live: xml.live,
            duration: xml.duration,
            accurate_duration: xml.accurate_duration,
            views: xml.views,
            create_time: xml.create_time.map(RawTimestamp::Text),
            update_time: xml.update_time.map(RawTimestamp::Text),
            expire_date: xml.expire_date.map(RawTimestamp::Text),
            live_broadcast_time: xml.live_broadcast_time.map(RawTimestamp::Text),
            metadata: xml.metadata.map(RawMetadata::from),
            category: xml.category.map(RawCategory::from),
        }
    }
}
