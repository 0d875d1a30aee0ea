use crate::core::{
    errors::VimondError,
    kernel::{CallContext, MediaType},
    types::{Asset, Order, Platform, VideofilesResponse},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AssetSource {
    /// Fetch an asset with its metadata and category expanded.
    ///
    /// `asset_id` is validated before any request is made.
    async fn asset(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError>;

    /// Fetch an asset in the upstream's default XML representation
    async fn asset_xml(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError>;

    /// Undecoded asset body in the requested media type
    async fn asset_raw(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
        media_type: MediaType,
    ) -> Result<Bytes, VimondError>;

    async fn videofiles(
        &self,
        ctx: &CallContext,
        asset_id: &str,
    ) -> Result<VideofilesResponse, VimondError>;
}

#[async_trait]
pub trait OrderSource {
    async fn order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
    ) -> Result<Order, VimondError>;

    /// Orders of `user_id` that are currently active
    async fn current_orders(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
    ) -> Result<Vec<Order>, VimondError>;

    async fn create_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
        product_payment_id: &str,
    ) -> Result<Order, VimondError>;

    /// Set `accessEndDate` and `endDate` of an order to `end_date`.
    ///
    /// # Data loss
    ///
    /// This is a non-atomic read-modify-write. Every top-level field of the
    /// stored order that is `null` or a nested object is dropped before the
    /// order is written back, because the upstream rejects them.
    async fn set_order_end_dates(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
        end_date: DateTime<Utc>,
    ) -> Result<Order, VimondError>;
}

#[async_trait]
pub trait PlatformSource {
    async fn platforms(&self, ctx: &CallContext) -> Result<Vec<Platform>, VimondError>;
}

// Composite trait for callers that need the whole API surface
pub trait VimondApi: AssetSource + OrderSource + PlatformSource {}
