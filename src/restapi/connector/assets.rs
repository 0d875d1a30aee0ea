use crate::core::{
    errors::VimondError,
    kernel::{CallContext, MediaType, RestClient},
    traits::AssetSource,
    types::{conversion::parse_asset_id, Asset, VideofilesResponse},
};
use crate::restapi::codec::{decode_asset, decode_asset_xml, decode_videofiles};
use crate::restapi::rest::VimondRestClient;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

/// Asset lookups for a Vimond platform
pub struct Assets<R: RestClient> {
    rest: VimondRestClient<R>,
}

impl<R: RestClient> Assets<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: VimondRestClient::new(rest.clone()),
        }
    }
}

#[async_trait]
impl<R: RestClient> AssetSource for Assets<R> {
    #[instrument(skip(self, ctx), fields(platform = %platform, asset_id = %asset_id))]
    async fn asset(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError> {
        parse_asset_id(asset_id)?;

        let body = self
            .rest
            .get_asset(ctx, platform, asset_id, MediaType::JSON_V3)
            .await?;
        decode_asset(&body)
    }

    #[instrument(skip(self, ctx), fields(platform = %platform, asset_id = %asset_id))]
    async fn asset_xml(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
    ) -> Result<Asset, VimondError> {
        parse_asset_id(asset_id)?;

        let body = self
            .rest
            .get_asset(ctx, platform, asset_id, MediaType::Unspecified)
            .await?;
        decode_asset_xml(&body)
    }

    #[instrument(skip(self, ctx), fields(platform = %platform, asset_id = %asset_id))]
    async fn asset_raw(
        &self,
        ctx: &CallContext,
        platform: &str,
        asset_id: &str,
        media_type: MediaType,
    ) -> Result<Bytes, VimondError> {
        self.rest
            .get_asset(ctx, platform, asset_id, media_type)
            .await
    }

    #[instrument(skip(self, ctx), fields(asset_id = %asset_id))]
    async fn videofiles(
        &self,
        ctx: &CallContext,
        asset_id: &str,
    ) -> Result<VideofilesResponse, VimondError> {
        let body = self.rest.get_videofiles(ctx, asset_id).await?;
        decode_videofiles(&body)
    }
}
