use std::time::Duration;

/// Default `Authorization` scheme: the tracker's API-key scheme.
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpTracker`](crate::HttpTracker).
///
/// Built once at process start and handed to the client; nothing in this
/// crate reads the environment.
#[derive(Clone)]
pub struct TrackerConfig {
    /// Base URL of the tracker, without the `/api/v2` prefix.
    pub base_url: String,
    pub token: String,
    pub auth_scheme: String,
    pub request_timeout: Duration,
}

impl TrackerConfig {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_auth_scheme(mut self, scheme: &str) -> Self {
        self.auth_scheme = scheme.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Value of the `Authorization` header sent with every call.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.auth_scheme, self.token)
    }

    /// Absolute URL of an API path such as `engagements/`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("auth_scheme", &self.auth_scheme)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
