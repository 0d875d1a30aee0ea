use crate::core::{
    errors::VimondError,
    kernel::{CallContext, RestClient},
    traits::PlatformSource,
    types::Platform,
};
use crate::restapi::codec::decode_platforms;
use crate::restapi::rest::VimondRestClient;
use async_trait::async_trait;
use tracing::instrument;

pub struct Platforms<R: RestClient> {
    rest: VimondRestClient<R>,
}

impl<R: RestClient> Platforms<R> {
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
impl<R: RestClient> PlatformSource for Platforms<R> {
    #[instrument(skip(self, ctx))]
    async fn platforms(&self, ctx: &CallContext) -> Result<Vec<Platform>, VimondError> {
        let body = self.rest.get_platforms(ctx).await?;
        decode_platforms(&body)
    }
}
