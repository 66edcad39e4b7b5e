use super::error::{HttpBackendError, HttpResult};

/// Runtime configuration describing how to reach the scoring backend.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Scheme, host and port of the backend, without a trailing slash.
    pub base_url: String,
    /// Bearer token, if the backend requires one.
    pub token: Option<String>,
}

impl HttpBackendConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Attach the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> HttpResult<Self> {
        let base_url = std::env::var("TAGGING_BACKEND_URL").map_err(|_| {
            HttpBackendError::MissingEnvVar {
                var: "TAGGING_BACKEND_URL",
            }
        })?;

        let mut config = Self::new(base_url);
        if let Some(token) = std::env::var("TAGGING_BACKEND_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
        {
            config = config.with_token(token);
        }

        Ok(config)
    }
}
