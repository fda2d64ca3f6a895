use std::{env, time::Duration};

use ddbkit_core::RetryPolicy;

/// Connection and retry configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Custom endpoint, e.g. DynamoDB Local (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Attempts when waiting for tables or resubmitting batches (default: 10)
    pub retry_attempts: u32,
    /// Delay between attempts in milliseconds (default: 2,000)
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_ENDPOINT_URL` - Custom endpoint URL (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `DDBKIT_RETRY_ATTEMPTS` - Retry attempts (default: 10)
    /// - `DDBKIT_RETRY_DELAY_MS` - Delay between attempts (default: 2,000)
    pub fn from_env() -> Self {
        Self {
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            retry_attempts: env::var("DDBKIT_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            retry_delay_ms: env::var("DDBKIT_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2_000),
        }
    }

    /// Point the client at a custom endpoint.
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Get the retry settings as a policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
