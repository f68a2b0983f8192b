//! HTTP retry helper for transient errors.
//!
//! Places clients should use [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so that connection
//! failures, HTTP 429 and HTTP 5xx responses are retried with exponential
//! backoff.
//!
//! Timeouts are **not** retried. They surface as [`PlacesError::Timeout`],
//! which [`PlacesError::is_soft`] reports as a soft failure.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params), 2).await?;
//! ```

use std::time::Duration;

use crate::PlacesError;

/// Base delay for the first retry; doubled on every further attempt.
const BASE_DELAY_MS: u64 = 250;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Errors
///
/// Returns [`PlacesError`] if the request fails after all retries, times
/// out, the server returns a non-retryable status code, or the body is not
/// valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F, max_retries: u32) -> Result<serde_json::Value, PlacesError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, max_retries).await?;
    let url = response.url().clone();
    let status = response.status();

    let text = response.text().await.map_err(classify_error)?;

    serde_json::from_str(&text).map_err(|e| {
        let preview = if text.len() > BODY_PREVIEW_LEN {
            // Byte slicing could split a UTF-8 sequence.
            format!("{}...", text.chars().take(BODY_PREVIEW_LEN).collect::<String>())
        } else {
            text.clone()
        };
        log::warn!(
            "JSON parse failed\n  \
             url: {}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            redact_key(&url),
            text.len(),
        );
        PlacesError::Json(e)
    })
}

/// Retry loop behind [`send_json`].
///
/// Returns the successful [`reqwest::Response`] (status 2xx or 3xx).
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, PlacesError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<PlacesError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_millis(BASE_DELAY_MS << (attempt - 1));
            log::debug!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if e.is_timeout() {
                    return Err(PlacesError::Timeout);
                }
                if is_transient(&e) && attempt < max_retries {
                    log::debug!("  transient error: {e}");
                    last_error = Some(PlacesError::Http(e));
                    continue;
                }
                return Err(classify_error(e));
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    if attempt < max_retries {
                        log::debug!("  HTTP 429 (rate limited)");
                        last_error = Some(PlacesError::RateLimited);
                        continue;
                    }
                    return Err(PlacesError::RateLimited);
                }

                if status.is_server_error() {
                    if attempt < max_retries {
                        log::debug!("  HTTP {status} (server error)");
                        last_error = Some(PlacesError::Unavailable {
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    return Err(PlacesError::Unavailable {
                        message: format!("HTTP {status} after {max_retries} retries"),
                    });
                }

                // 4xx other than 429 is permanent.
                if status.is_client_error() {
                    return Err(PlacesError::RequestDenied {
                        message: format!("HTTP {status}"),
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| PlacesError::Unavailable {
        message: "request failed after all retries".to_string(),
    }))
}

/// Maps a `reqwest` error to the most specific [`PlacesError`].
fn classify_error(e: reqwest::Error) -> PlacesError {
    if e.is_timeout() {
        PlacesError::Timeout
    } else if e.is_connect() {
        PlacesError::Unavailable {
            message: e.to_string(),
        }
    } else {
        PlacesError::Http(e)
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_request() || e.is_body()
}

/// Renders a URL for logs with the `key` query parameter masked.
pub(crate) fn redact_key(url: &reqwest::Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    if pairs.is_empty() {
        return redacted.to_string();
    }

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
