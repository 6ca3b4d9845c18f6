//! Request execution against a pooled transport.

use crate::pool::IoResource;
use reqwest::StatusCode;
use repute_core::{ReputeError, Result};
use tracing::{debug, warn};
use url::Url;

/// GET `url` into the resource's buffer.
///
/// Anything but a final 200 is a failure; there are no retries. On success
/// the buffer holds the raw body.
pub(crate) async fn execute(io: &mut IoResource, url: &Url) -> Result<()> {
    debug!(url = %url, transport = io.id, "GET request");

    let mut response = io.http.get(url.clone()).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "REPUTE request failed");
        ReputeError::Http(e.to_string())
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!(url = %url, status = status.as_u16(), "unexpected status from REPUTE server");
        return Err(ReputeError::Status {
            code: status.as_u16(),
            url: url.to_string(),
        });
    }

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ReputeError::Http(e.to_string()))?
    {
        io.buf.write(&chunk)?;
    }

    debug!(url = %url, bytes = io.buf.len(), "response received");
    Ok(())
}
