pub mod codec;
pub mod connector;
pub(crate) mod converters;
pub mod rest;
pub(crate) mod types;

use crate::core::config::VimondConfig;
use crate::core::errors::VimondError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder};

// Re-export main types for easier importing
pub use codec::{
    decode_asset, decode_asset_xml, decode_order, decode_orders, decode_platforms,
    decode_videofiles,
};
pub use connector::VimondConnector;
pub use rest::VimondRestClient;

/// Create a Vimond connector over reqwest.
///
/// Requests are signed when `config` carries both an API key and a secret,
/// and sent unsigned otherwise.
pub fn build_connector(config: &VimondConfig) -> Result<VimondConnector<ReqwestRest>, VimondError> {
    let rest = RestClientBuilder::from_config(config).build()?;
    Ok(VimondConnector::new(rest))
}
