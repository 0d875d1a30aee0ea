use crate::core::errors::VimondError;
use crate::core::kernel::{CallContext, MediaType, RestClient};
use crate::core::traits::{AssetSource, OrderSource, PlatformSource, VimondApi};
use crate::core::types::{Asset, Order, Platform, VideofilesResponse};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub mod assets;
pub mod orders;
pub mod platforms;

pub use assets::Assets;
pub use orders::{strip_unsupported_fields, Orders};
pub use platforms::Platforms;

/// Vimond connector that composes all sub-trait implementations
pub struct VimondConnector<R: RestClient> {
    pub assets: Assets<R>,
    pub orders: Orders<R>,
    pub platforms: Platforms<R>,
}

impl<R: RestClient + Clone> VimondConnector<R> {
    /// Create a connector sharing one transport across all components
    pub fn new(rest: R) -> Self {
        Self {
            assets: Assets::new(&rest),
            orders: Orders::new(&rest),
            platforms: Platforms::new(&rest),
        }
    }
}

// Implement traits for the connector by delegating to sub-components

#[async_trait]
impl<R: RestClient> AssetSource for VimondConnector<R> {
    async fn asset(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError> {
        self.assets.asset(ctx, platform, asset_id).await
    }

    async fn asset_xml(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError> {
        self.assets.asset_xml(ctx, platform, asset_id).await
    }

    async fn asset_raw(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
        media_type: MediaType,
    ) -> Result<Bytes, VimondError> {
        self.assets
            .asset_raw(ctx, platform, asset_id, media_type)
            .await
    }

    async fn videofiles(
        &self,
        ctx: &CallContext,
        asset_id: &str,
    ) -> Result<VideofilesResponse, VimondError> {
        self.assets.videofiles(ctx, asset_id).await
    }
}

#[async_trait]
impl<R: RestClient> OrderSource for VimondConnector<R> {
    async fn order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
    ) -> Result<Order, VimondError> {
        self.orders.order(ctx, platform, order_id).await
    }

    async fn current_orders(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
    ) -> Result<Vec<Order>, VimondError> {
        self.orders.current_orders(ctx, platform, user_id).await
    }

    async fn create_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
        product_payment_id: &str,
    ) -> Result<Order, VimondError> {
        self.orders
            .create_order(ctx, platform, user_id, product_payment_id)
            .await
    }

    async fn set_order_end_dates(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
        end_date: DateTime<Utc>,
    ) -> Result<Order, VimondError> {
        self.orders
            .set_order_end_dates(ctx, platform, order_id, end_date)
            .await
    }
}

#[async_trait]
impl<R: RestClient> PlatformSource for VimondConnector<R> {
    async fn platforms(&self, ctx: &CallContext) -> Result<Vec<Platform>, VimondError> {
        self.platforms.platforms(ctx).await
    }
}

impl<R: RestClient> VimondApi for VimondConnector<R> {}
