/// Vimond kernel - transport layer shared by every API area
///
/// The kernel knows how to build, sign, send and classify a request. It knows
/// nothing about assets, orders or platforms; those live in `restapi`.
///
/// # Components
///
/// - `RestClient`: HTTP client interface, `ReqwestRest` is the production impl
/// - `Signer`: pluggable authentication, `SumoSigner` for HMAC-SHA1 `SUMO` auth
/// - `classify`: status code to error taxonomy, applied before any body is read
///
/// # Usage
/// ```rust,no_run
/// use vimond::core::config::VimondConfig;
/// use vimond::core::kernel::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = VimondConfig::new("api_key".to_string(), "secret".to_string());
/// let rest = RestClientBuilder::from_config(&config).build()?;
///
/// let ctx = CallContext::with_timeout(Duration::from_secs(5));
/// let request = RequestDescriptor::get("/api/admin/platforms").with_media_type(MediaType::JSON_V3);
/// let response = rest.execute(&ctx, request).await?;
/// check_status(response.status())?;
/// let body = ctx.run(response.bytes()).await?;
/// # let _ = body;
/// # Ok(())
/// # }
/// ```
pub mod classify;
pub mod rest;
pub mod signer;

pub use classify::{check_status, classify, ResponseClass};
pub use rest::{
    CallContext, MediaType, RawResponse, RequestDescriptor, ReqwestRest, RestClient,
    RestClientBuilder, RestClientConfig, DISCARD_BUDGET,
};
pub use signer::{AuthorizationHeaders, SignatureResult, Signer, SumoSigner};
