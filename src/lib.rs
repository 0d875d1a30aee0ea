pub mod core;
pub mod restapi;

pub use crate::core::{
    config::VimondConfig,
    errors::{ErrorKind, VimondError},
    kernel::{CallContext, MediaType},
    traits::{AssetSource, OrderSource, PlatformSource, VimondApi},
    types::*,
};
pub use restapi::{build_connector, VimondConnector};
