use crate::core::errors::VimondError;
use crate::core::types::{Asset, Order, Platform, VideofilesResponse};
use crate::restapi::converters::{
    convert_asset, convert_order, convert_platform, convert_videofiles,
};
use crate::restapi::types::{
    RawAsset, RawOrder, RawPlatform, RawVideofiles, RawXmlAsset,
};
use tracing::trace;

/// Decode a JSON asset body
///
/// Category chains nested deeper than the JSON recursion limit (about 125
/// ancestors) are rejected as a decode failure.
pub fn decode_asset(body: &[u8]) -> Result<Asset, VimondError> {
    trace!(bytes = body.len(), "decoding asset");
    let raw: RawAsset = serde_json::from_slice(body)?;
    Ok(convert_asset(raw)?)
}

/// Decode the XML asset representation served without a JSON `Accept` header
pub fn decode_asset_xml(body: &[u8]) -> Result<Asset, VimondError> {
    trace!(bytes = body.len(), "decoding xml asset");
    let raw: RawXmlAsset = quick_xml::de::from_reader(body)?;
    Ok(convert_asset(RawAsset::from(raw))?)
}

pub fn decode_order(body: &[u8]) -> Result<Order, VimondError> {
    trace!(bytes = body.len(), "decoding order");
    let raw: RawOrder = serde_json::from_slice(body)?;
    Ok(convert_order(raw)?)
}

pub fn decode_orders(body: &[u8]) -> Result<Vec<Order>, VimondError> {
    trace!(bytes = body.len(), "decoding orders");
    let raw: Vec<RawOrder> = serde_json::from_slice(body)?;
    Ok(raw
        .into_iter()
        .map(convert_order)
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn decode_platforms(body: &[u8]) -> Result<Vec<Platform>, VimondError> {
    trace!(bytes = body.len(), "decoding platforms");
    let raw: Vec<RawPlatform> = serde_json::from_slice(body)?;
    Ok(raw
        .into_iter()
        .map(convert_platform)
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn decode_videofiles(body: &[u8]) -> Result<VideofilesResponse, VimondError> {
    trace!(bytes = body.len(), "decoding videofiles");
    let raw: RawVideofiles = serde_json::from_slice(body)?;
    Ok(convert_videofiles(raw)?)
}
