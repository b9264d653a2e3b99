// Shared HTTP response handling.
// Converts non-success statuses from either remote service into BotError::Http.

use reqwest::{Response, StatusCode};

use crate::error::{BotError, Result};

/// User agent sent to every remote service.
pub const USER_AGENT: &str = concat!("californias/", env!("CARGO_PKG_VERSION"));

/// Check response status and convert errors.
pub async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(response),
        status => {
            let url = response.url().to_string();
            Err(BotError::Http {
                status: status.as_u16(),
                url,
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
