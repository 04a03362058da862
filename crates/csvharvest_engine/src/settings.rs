use std::time::Duration;

use crate::EngineError;

/// Catalog API used when no base URL is configured.
pub const DEFAULT_API_BASE: &str = "https://www.data.gouv.fr/api/1/";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Upper bound on bytes read while looking for a resource's first line.
    pub max_line_bytes: usize,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_line_bytes: 64 * 1024,
            user_agent: concat!("csvharvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpSettings {
    /// Build the shared client; one per run, cloned into every job.
    pub fn build_client(&self) -> Result<reqwest::Client, EngineError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.redirect_limit))
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))
    }
}
