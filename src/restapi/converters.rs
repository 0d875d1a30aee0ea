use crate::core::errors::DecodeError;
use crate::core::types::conversion::{epoch_ms_to_time, truncate_duration};
use crate::core::types::{
    Asset, AssetMetadata, Category, ImageVersion, ImageVersions, LocalizedField, LocalizedValue,
    Order, Platform, Videofile, VideofilesResponse,
};
use crate::restapi::types::{
    NumberOrString, RawAsset, RawCategory, RawImageVersions, RawLocalizedValue, RawMetadata,
    RawMetadataValue, RawOrder, RawPlatform, RawTimestamp, RawVideofile, RawVideofiles,
};
use chrono::{DateTime, Utc};

/// Integer value of a number-or-string field; `None` when absent or blank
pub(crate) fn convert_integer(
    field: &'static str,
    raw: Option<NumberOrString>,
) -> Result<Option<i64>, DecodeError> {
    match raw {
        None => Ok(None),
        Some(NumberOrString::Integer(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| DecodeError::InvalidNumber { field, value: text })
        }
    }
}

/// Identity rendered in canonical base-10 form, empty when absent
pub(crate) fn convert_id(
    field: &'static str,
    raw: Option<NumberOrString>,
) -> Result<String, DecodeError> {
    Ok(convert_integer(field, raw)?
        .map(|n| n.to_string())
        .unwrap_or_default())
}

pub(crate) fn convert_timestamp(
    field: &'static str,
    raw: Option<RawTimestamp>,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let invalid = |value: String| DecodeError::InvalidTimestamp { field, value };

    match raw {
        None => Ok(None),
        Some(RawTimestamp::Millis(ms)) => epoch_ms_to_time(ms)
            .map(Some)
            .ok_or_else(|| invalid(ms.to_string())),
        Some(RawTimestamp::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if let Ok(ms) = trimmed.parse::<i64>() {
                return epoch_ms_to_time(ms).map(Some).ok_or_else(|| invalid(text));
            }
            DateTime::parse_from_rfc3339(trimmed)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|_| invalid(text))
        }
    }
}

/// Like [`convert_timestamp`], with absent mapping to the epoch
pub(crate) fn convert_required_timestamp(
    field: &'static str,
    raw: Option<RawTimestamp>,
) -> Result<DateTime<Utc>, DecodeError> {
    Ok(convert_timestamp(field, raw)?.unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

fn convert_localized_value(raw: RawLocalizedValue) -> LocalizedValue {
    LocalizedValue {
        lang: raw.lang,
        value: raw.value,
    }
}

/// `None` for values of a shape no metadata field uses
pub(crate) fn convert_metadata_value(raw: RawMetadataValue) -> Option<LocalizedField> {
    match raw {
        RawMetadataValue::Localized(values) => Some(LocalizedField(
            values.into_iter().map(convert_localized_value).collect(),
        )),
        RawMetadataValue::Single(value) => {
            Some(LocalizedField(vec![convert_localized_value(value)]))
        }
        RawMetadataValue::Text(text) => Some(LocalizedField::single(text)),
        RawMetadataValue::Number(number) => Some(LocalizedField::single(number.to_string())),
        RawMetadataValue::Bool(flag) => Some(LocalizedField::single(flag.to_string())),
        RawMetadataValue::Other(_) => None,
    }
}

pub(crate) fn convert_metadata(raw: Option<RawMetadata>) -> AssetMetadata {
    let entries = match raw {
        None => return AssetMetadata::default(),
        Some(RawMetadata::Wrapped { entries } | RawMetadata::Flat(entries)) => entries,
    };

    let mut metadata = AssetMetadata::default();
    for (key, value) in entries {
        if let Some(field) = convert_metadata_value(value) {
            metadata.insert(&key, field);
        }
    }
    metadata
}

pub(crate) fn convert_image_versions(raw: Option<RawImageVersions>) -> ImageVersions {
    let images = match raw {
        None => return ImageVersions::default(),
        Some(RawImageVersions::List(images) | RawImageVersions::Wrapped { images }) => images,
    };

    ImageVersions(
        images
            .into_iter()
            .map(|image| ImageVersion {
                kind: image.kind,
                url: image.url,
            })
            .collect(),
    )
}

/// Rebuild the parent chain without recursing over it
pub(crate) fn convert_category(raw: RawCategory) -> Result<Category, DecodeError> {
    let RawCategory { id, title, parent } = raw;

    let mut ancestors = Vec::new();
    let mut next = parent;
    while let Some(node) = next {
        let RawCategory { id, title, parent } = *node;
        ancestors.push((convert_id("category.id", id)?, title.unwrap_or_default()));
        next = parent;
    }

    let parent = ancestors
        .into_iter()
        .rev()
        .fold(None::<Box<Category>>, |parent, (id, title)| {
            Some(Box::new(Category { id, title, parent }))
        });

    Ok(Category {
        id: convert_id("category.id", id)?,
        title: title.unwrap_or_default(),
        parent,
    })
}

pub(crate) fn convert_asset(raw: RawAsset) -> Result<Asset, DecodeError> {
    Ok(Asset {
        id: convert_id("id", raw.id)?,
        channel_id: convert_id("channelId", raw.channel_id)?,
        category_id: convert_id("categoryId", raw.category_id)?,
        asset_type_id: convert_id("assetTypeId", raw.asset_type_id)?,
        title: raw.title.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        image_url: raw.image_url.unwrap_or_default(),
        image_versions: convert_image_versions(raw.image_versions),
        archive: raw.archive.unwrap_or_default(),
        aspect_16x9: raw.aspect_16x9.unwrap_or_default(),
        auto_distribute: raw.auto_distribute.unwrap_or_default(),
        auto_encode: raw.auto_encode.unwrap_or_default(),
        auto_publish: raw.auto_publish.unwrap_or_default(),
        copy_live_stream: raw.copy_live_stream.unwrap_or_default(),
        deleted: raw.deleted.unwrap_or_default(),
        drm_protected: raw.drm_protected.unwrap_or_default(),
        items_published: raw.items_published.unwrap_or_default(),
        labeled_as_free: raw.labeled_as_free.unwrap_or_default(),
        live: raw.live.unwrap_or_default(),
        duration: raw.duration.map(truncate_duration).unwrap_or_default(),
        accurate_duration: raw.accurate_duration.unwrap_or_default(),
        views: raw.views.unwrap_or_default(),
        create_time: convert_timestamp("createTime", raw.create_time)?,
        update_time: convert_timestamp("updateTime", raw.update_time)?,
        expire_date: convert_timestamp("expireDate", raw.expire_date)?,
        live_broadcast_time: convert_timestamp("liveBroadcastTime", raw.live_broadcast_time)?,
        metadata: convert_metadata(raw.metadata),
        category: raw.category.map(convert_category).transpose()?,
    })
}

pub(crate) fn convert_order(raw: RawOrder) -> Result<Order, DecodeError> {
    Ok(Order {
        id: convert_id("id", raw.id)?,
        user_id: convert_id("userId", raw.user_id)?,
        product_name: raw.product_name.unwrap_or_default(),
        product_payment_id: convert_id("productPaymentID", raw.product_payment_id)?,
        access_end_date: convert_required_timestamp("accessEndDate", raw.access_end_date)?,
        end_date: convert_required_timestamp("endDate", raw.end_date)?,
        start_date: convert_required_timestamp("startDate", raw.start_date)?,
    })
}

pub(crate) fn convert_platform(raw: RawPlatform) -> Result<Platform, DecodeError> {
    Ok(Platform {
        id: convert_integer("id", raw.id)?.unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
    })
}

pub(crate) fn convert_videofile(raw: RawVideofile) -> Result<Videofile, DecodeError> {
    Ok(Videofile {
        bitrate: convert_integer("bitrate", raw.bitrate)?.unwrap_or_default(),
        media_format: raw.media_format.unwrap_or_default(),
        scheme: raw.scheme.unwrap_or_default(),
        server: raw.server.unwrap_or_default(),
        base: raw.base.unwrap_or_default(),
        url: raw.url.unwrap_or_default(),
        file_size: raw.file_size,
    })
}

pub(crate) fn convert_videofiles(raw: RawVideofiles) -> Result<VideofilesResponse, DecodeError> {
    Ok(VideofilesResponse {
        asset_id: convert_id("assetId", raw.asset_id)?,
        title: raw.title.unwrap_or_default(),
        videofiles: raw
            .videofiles
            .unwrap_or_default()
            .into_iter()
            .map(convert_videofile)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn text(s: &str) -> Option<NumberOrString> {
        Some(NumberOrString::Text(s.to_string()))
    }

    #[test_case(Some(NumberOrString::Integer(10006)), "10006"; "number")]
    #[test_case(text("10006"), "10006"; "string")]
    #[test_case(text("007"), "7"; "leading zeros dropped")]
    #[test_case(Some(NumberOrString::Integer(-12)), "-12"; "negative number")]
    #[test_case(text("-12"), "-12"; "negative string")]
    #[test_case(text(""), ""; "blank")]
    #[test_case(None, ""; "absent")]
    fn test_convert_id(raw: Option<NumberOrString>, want: &str) {
        assert_eq!(convert_id("id", raw).unwrap(), want);
    }

    #[test]
    fn test_convert_id_rejects_non_numeric_text() {
        let err = convert_id("id", text("abc")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidNumber { field: "id", ref value } if value == "abc"
        ));
    }

    #[test]
    fn test_convert_timestamp_shapes() {
        let want = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(234);

        for raw in [
            RawTimestamp::Millis(946_782_245_234),
            RawTimestamp::Text("946782245234".to_string()),
            RawTimestamp::Text("2000-01-02T03:04:05.234Z".to_string()),
            RawTimestamp::Text("2000-01-02T05:04:05.234+02:00".to_string()),
        ] {
            assert_eq!(convert_timestamp("t", Some(raw)).unwrap(), Some(want));
        }

        assert_eq!(convert_timestamp("t", None).unwrap(), None);
        assert!(convert_timestamp("t", Some(RawTimestamp::Text("yesterday".to_string()))).is_err());
    }

    #[test]
    fn test_required_timestamp_defaults_to_epoch() {
        assert_eq!(
            convert_required_timestamp("t", None).unwrap(),
            DateTime::<Utc>::UNIX_EPOCH
        );
        assert_eq!(
            convert_required_timestamp("t", Some(RawTimestamp::Millis(0))).unwrap(),
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    #[test]
    fn test_convert_metadata_absent_is_zero_value() {
        assert_eq!(convert_metadata(None), AssetMetadata::default());
    }

    #[test]
    fn test_convert_metadata_scalars_become_wildcard() {
        let raw: RawMetadata = serde_json::from_str(
            r#"{"episode": 3, "genre": "Drama", "custom-key": [{"lang":"sv_SE","value":"x"}], "broken": {"a": 1}}"#,
        )
        .unwrap();
        let metadata = convert_metadata(Some(raw));

        assert_eq!(metadata.episode, LocalizedField::single("3"));
        assert_eq!(metadata.genre.value("sv_SE"), "Drama");
        assert_eq!(
            metadata.get("custom-key").map(|f| f.value("sv_SE")),
            Some("x")
        );
        assert!(metadata.get("broken").is_none());
    }

    #[test]
    fn test_convert_category_keeps_chain_order() {
        let raw: RawCategory = serde_json::from_str(
            r#"{"id": 2, "title": "c", "parent": {"id": "1", "title": "b", "parent": {"id": 0, "title": "a"}}}"#,
        )
        .unwrap();
        let category = convert_category(raw).unwrap();

        let chain: Vec<(&str, &str)> = category
            .lineage()
            .map(|c| (c.id.as_str(), c.title.as_str()))
            .collect();
        assert_eq!(chain, vec![("2", "c"), ("1", "b"), ("0", "a")]);
    }

    #[test]
    fn test_convert_asset_truncates_duration() {
        let raw = RawAsset {
            duration: Some(10004.5),
            accurate_duration: Some(10004.5),
            ..RawAsset::default()
        };
        let asset = convert_asset(raw).unwrap();

        assert_eq!(asset.duration, 10004);
        assert_eq!(asset.accurate_duration, 10004.5);
        assert_eq!(asset.id, "");
        assert!(asset.category.is_none());
    }
}
