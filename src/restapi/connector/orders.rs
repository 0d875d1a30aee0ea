use crate::core::{
    errors::VimondError,
    kernel::{CallContext, RestClient},
    traits::OrderSource,
    types::Order,
};
use crate::restapi::codec::{decode_order, decode_orders};
use crate::restapi::rest::VimondRestClient;
use crate::restapi::types::CreateOrderBody;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

/// Order lookups and updates for a Vimond platform
pub struct Orders<R: RestClient> {
    rest: VimondRestClient<R>,
}

impl<R: RestClient> Orders<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: VimondRestClient::new(rest.clone()),
        }
    }

    /// Overwrite `values` on a stored order and write it back.
    ///
    /// Null and nested-object fields of the stored order are removed first;
    /// the upstream rejects updates that carry them.
    async fn update_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
        values: Map<String, Value>,
    ) -> Result<Order, VimondError> {
        let body = self.rest.get_order(ctx, platform, order_id).await?;
        let mut fields: Map<String, Value> = serde_json::from_slice(&body)?;

        let dropped = strip_unsupported_fields(&mut fields);
        if !dropped.is_empty() {
            warn!(
                order_id,
                ?dropped,
                "dropping null and nested fields from order update"
            );
        }

        fields.extend(values);

        let body = serde_json::to_vec(&fields).map_err(VimondError::Encode)?;
        let body = self
            .rest
            .put_order(ctx, platform, order_id, body.into())
            .await?;
        decode_order(&body)
    }
}

/// Remove top-level fields that are `null` or objects, returning their keys
pub fn strip_unsupported_fields(fields: &mut Map<String, Value>) -> Vec<String> {
    let dropped: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.is_null() || value.is_object())
        .map(|(key, _)| key.clone())
        .collect();

    for key in &dropped {
        fields.remove(key);
    }
    dropped
}

#[async_trait]
impl<R: RestClient> OrderSource for Orders<R> {
    #[instrument(skip(self, ctx), fields(platform = %platform, order_id = %order_id))]
    async fn order(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
    ) -> Result<Order, VimondError> {
        let body = self.rest.get_order(ctx, platform, order_id).await?;
        decode_order(&body)
    }

    #[instrument(skip(self, ctx), fields(platform = %platform, user_id = %user_id))]
    async fn current_orders(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
    ) -> Result<Vec<Order>, VimondError> {
        let body = self.rest.get_current_orders(ctx, platform, user_id).await?;
        decode_orders(&body)
    }

    #[instrument(skip(self, ctx), fields(platform = %platform, user_id = %user_id))]
    async fn create_order(
        &self,
        ctx: &CallContext,
        platform: &str,
        user_id: &str,
        product_payment_id: &str,
    ) -> Result<Order, VimondError> {
        let body = serde_json::to_vec(&CreateOrderBody { product_payment_id })
            .map_err(VimondError::Encode)?;

        let body = self
            .rest
            .create_order(ctx, platform, user_id, body.into())
            .await?;
        decode_order(&body)
    }

    #[instrument(skip(self, ctx), fields(platform = %platform, order_id = %order_id, end_date = %end_date))]
    async fn set_order_end_dates(
        &self,
        ctx: &CallContext,
        platform: &str,
        order_id: &str,
        end_date: DateTime<Utc>,
    ) -> Result<Order, VimondError> {
        let millis = Value::from(end_date.timestamp() * 1000);

        let mut values = Map::new();
        values.insert("accessEndDate".to_string(), millis.clone());
        values.insert("endDate".to_string(), millis);

        self.update_order(ctx, platform, order_id, values).await
    }
}
