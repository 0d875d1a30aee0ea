use crate::core::errors::VimondError;
use crate::core::kernel::{check_status, CallContext, MediaType, RequestDescriptor, RestClient};
use bytes::Bytes;
use tracing::{debug, instrument, trace};

pub const PLATFORMS_PATH: &str = "/api/admin/platforms";

/// Expansion requested on every asset fetch
pub const ASSET_EXPAND: &str = "metadata,category";

pub fn asset_path(platform: &str, asset_id: &str) -> String {
    format!("/api/{}/asset/{}", platform, asset_id)
}

pub fn order_path(platform: &str, order_id: &str) -> String {
    format!("/api/{}/order/{}", platform, order_id)
}

pub fn current_orders_path(platform: &str, user_id: &str) -> String {
    format!("/api/{}/user/{}/orders/current", platform, user_id)
}

pub fn create_order_path(platform: &str, user_id: &str) -> String {
    format!("/api/{}/order/{}/create", platform, user_id)
}

pub fn videofiles_path(asset_id: &str) -> String {
    format!("/api/admin/asset/{}/videofiles", asset_id)
}

/// Thin typed wrapper around `RestClient` for the Vimond API
///
/// Every call returns the body of a `200` response; any other status is
/// classified and its body released unread.
#[derive(Clone)]
pub struct VimondRestClient<R: RestClient> {
    client: R,
}

impl<R: RestClient> VimondRestClient<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    /// Get the underlying transport
    pub fn inner(&self) -> &R {
        &self.client
    }

    /// Send `request` and return the body of a successful response
    #[instrument(skip(self, ctx, request), fields(method = %request.method, path = %request.path))]
    pub async fn fetch(
        &self,
        ctx: &CallContext,
        request: RequestDescriptor,
    ) -> Result<Bytes, VimondError> {
        let response = self.client.execute(ctx, request).await?;
        let status = response.status();

        if let Err(err) = check_status(status) {
            let discarded = ctx
                .run(async { Ok(response.release().await) })
                .await
                .unwrap_or_default();
            debug!(%status, discarded, "request not successful");
            return Err(err);
        }

        let body = ctx.run(response.bytes()).await?;
        trace!(%status, bytes = body.len(), "response body read");
        Ok(body)
    }

    /// GET an arbitrary path and return the raw body
    pub async fn get_raw(
        &self,
        ctx: &CallContext,
        path: &str,
        query: &[(&str, &str)],
        media_type: MediaType,
    ) -> Result<Bytes, VimondError> {
        let request = query
            .iter()
            .fold(RequestDescriptor::get(path), |request, (key, value)| {
                request.with_query(*key, *value)
            })
            .with_media_type(media_type);
        self.fetch(ctx, request).await
    }

    pub async fn get_asset(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
        media_type: MediaType,
    ) -> Result<Bytes, VimondError> {
        self.get_raw(
            ctx,
            &asset_path(platform, asset_id),
            &[("expand", ASSET_EXPAND)],
            media_type,
        )
        .await
    }

    pub async fn get_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
    ) -> Result<Bytes, VimondError> {
        self.get_raw(ctx, &order_path(platform, order_id), &[], MediaType::Unspecified)
            .await
    }

    pub async fn get_current_orders(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
    ) -> Result<Bytes, VimondError> {
        self.get_raw(
            ctx,
            &current_orders_path(platform, user_id),
            &[],
            MediaType::Unspecified,
        )
        .await
    }

    pub async fn create_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
        body: Bytes,
    ) -> Result<Bytes, VimondError> {
        let request = RequestDescriptor::post(create_order_path(platform, user_id)).with_body(body);
        self.fetch(ctx, request).await
    }

    pub async fn put_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
        body: Bytes,
    ) -> Result<Bytes, VimondError> {
        let request = RequestDescriptor::put(order_path(platform, order_id)).with_body(body);
        self.fetch(ctx, request).await
    }

    pub async fn get_platforms(&self, ctx: &CallContext) -> Result<Bytes, VimondError> {
        self.get_raw(ctx, PLATFORMS_PATH, &[], MediaType::Unspecified).await
    }

    pub async fn get_videofiles(
        &self,
        ctx: &CallContext,
        asset_id: &str,
    ) -> Result<Bytes, VimondError> {
        self.get_raw(ctx, &videofiles_path(asset_id), &[], MediaType::Unspecified)
            .await
    }
}
