use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// URL of the notification endpoint that renders subjects and calls the
    /// email provider
    pub notify_endpoint_url: String,

    /// Sender address forwarded to the endpoint (optional; the endpoint has
    /// its own default)
    pub email_from: Option<String>,

    /// Maximum email sends per second tolerated by the provider (default: 1)
    pub notify_requests_per_second: u32,

    /// Default retry ceiling for a failed send (default: 3)
    pub notify_max_retries: u32,

    /// Cooldown in milliseconds before a failed send is retried (default: 5000)
    pub notify_retry_delay_ms: u64,

    /// Per-request HTTP timeout in seconds (default: 30)
    pub notify_http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            notify_endpoint_url: std::env::var("NOTIFY_ENDPOINT_URL").map_err(|_| {
                anyhow::anyhow!("NOTIFY_ENDPOINT_URL environment variable is required")
            })?,
            email_from: std::env::var("EMAIL_FROM").ok(),
            notify_requests_per_second: std::env::var("NOTIFY_REQUESTS_PER_SECOND")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_REQUESTS_PER_SECOND must be a valid u32"))?,
            notify_max_retries: std::env::var("NOTIFY_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_MAX_RETRIES must be a valid u32"))?,
            notify_retry_delay_ms: std::env::var("NOTIFY_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_RETRY_DELAY_MS must be a valid u64"))?,
            notify_http_timeout_secs: std::env::var("NOTIFY_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_HTTP_TIMEOUT_SECS must be a valid u64"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test so they
    // cannot race each other under the parallel test runner.
    #[test]
    fn test_from_env_defaults_and_overrides() {
        unsafe {
            std::env::set_var("NOTIFY_ENDPOINT_URL", "http://localhost:3000/api/send");
            std::env::remove_var("NOTIFY_REQUESTS_PER_SECOND");
            std::env::remove_var("NOTIFY_MAX_RETRIES");
            std::env::remove_var("NOTIFY_RETRY_DELAY_MS");
            std::env::remove_var("NOTIFY_HTTP_TIMEOUT_SECS");
            std::env::remove_var("EMAIL_FROM");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.notify_endpoint_url, "http://localhost:3000/api/send");
        assert_eq!(config.notify_requests_per_second, 1);
        assert_eq!(config.notify_max_retries, 3);
        assert_eq!(config.notify_retry_delay_ms, 5000);
        assert_eq!(config.notify_http_timeout_secs, 30);
        assert!(config.email_from.is_none());

        unsafe {
            std::env::set_var("NOTIFY_REQUESTS_PER_SECOND", "2");
            std::env::set_var("NOTIFY_MAX_RETRIES", "0");
            std::env::set_var("NOTIFY_RETRY_DELAY_MS", "250");
        }
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.notify_requests_per_second, 2);
        assert_eq!(config.notify_max_retries, 0);
        assert_eq!(config.notify_retry_delay_ms, 250);

        unsafe {
            std::env::set_var("NOTIFY_MAX_RETRIES", "not-a-number");
        }
        assert!(AppConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("NOTIFY_MAX_RETRIES");
            std::env::remove_var("NOTIFY_REQUESTS_PER_SECOND");
            std::env::remove_var("NOTIFY_RETRY_DELAY_MS");
        }
    }
}
