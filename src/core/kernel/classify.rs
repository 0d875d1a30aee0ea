use crate::core::errors::VimondError;
use reqwest::StatusCode;

/// Outcome of inspecting a response status line, before any body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Ok,
    NotFound,
    Unknown,
}

/// Only `200` proceeds to decoding; every other status except `404` is opaque.
pub fn classify(status: StatusCode) -> ResponseClass {
    match status {
        StatusCode::OK => ResponseClass::Ok,
        StatusCode::NOT_FOUND => ResponseClass::NotFound,
        _ => ResponseClass::Unknown,
    }
}

/// Map a status to `Ok(())` or the matching error.
pub fn check_status(status: StatusCode) -> Result<(), VimondError> {
    match classify(status) {
        ResponseClass::Ok => Ok(()),
        ResponseClass::NotFound => Err(VimondError::NotFound),
        ResponseClass::Unknown => Err(VimondError::Unknown {
            status: status.as_u16(),
        }),
    }
}
