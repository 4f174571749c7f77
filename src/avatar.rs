//! Avatar fetching with a bounded linear-backoff retry.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Retry schedule: `max_attempts` total tries, with the delay before retry
/// N scaling linearly as N × `base_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

pub struct AvatarFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl AvatarFetcher {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, policy }
    }

    /// Fetch an avatar, retrying on both transport errors and non-success
    /// statuses. After exhausting the attempts the last-seen failure (or a
    /// generic one) is reported; the caller renders a placeholder.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        let mut last_failure: Option<String> = None;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.base_delay * (attempt - 1)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .bytes()
                        .await
                        .map(|b| b.to_vec())
                        .map_err(|e| Error::ImageFetch(e.to_string()));
                }
                Ok(response) => {
                    debug!(url, status = %response.status(), attempt, "image fetch returned non-success");
                    last_failure = Some(format!("HTTP {}", response.status()));
                }
                Err(e) => {
                    debug!(url, error = %e, attempt, "image fetch failed");
                    last_failure = Some(e.to_string());
                }
            }
        }

        let reason = last_failure.unwrap_or_else(|| {
            format!("request failed after {} attempts", self.policy.max_attempts)
        });
        warn!(url, %reason, "image fetch exhausted retries");
        Err(Error::ImageFetch(reason))
    }
}

impl Default for AvatarFetcher {
    fn default() -> Self {
        Self::new()
    }
}
