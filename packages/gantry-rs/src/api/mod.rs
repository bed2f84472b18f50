//! HTTP clients for the bridge gateway and the deploy relay.
//!
//! All gateway endpoints live under a common `/api/v0` root. Error
//! responses carry a JSON body of the form `{"error": "..."}`; when the
//! body does not parse, the HTTP status text is used instead.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;

pub mod networks;
pub mod relay;
pub mod transfers;

/// Path prefix of every gateway endpoint.
pub const API_ROOT: &str = "/api/v0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Shared client construction: every API client uses the same timeout.
pub(crate) fn http_client() -> Result<Client, ApiError> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Normalized gateway root URL with the API prefix appended, without a
/// trailing slash.
pub(crate) fn gateway_root(base: &Url) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), API_ROOT)
}

/// Maps a non-success response to an [`ApiError`], preferring the message
/// from the JSON error body.
pub(crate) async fn extract_error(response: Response) -> ApiError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected gateway response")
            .to_string(),
    };
    ApiError::from_status(status.as_u16(), message)
}

/// Decodes a success body, or converts the failure into an [`ApiError`].
pub(crate) async fn decode_or_error<T: DeserializeOwned>(
    response: Response,
) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(extract_error(response).await);
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Checks the status of a response whose body is not needed.
pub(crate) async fn check_status(response: Response) -> Result<(), ApiError> {
    if !response.status().is_success() {
        return Err(extract_error(response).await);
    }
    Ok(())
}
