/// Run-time knobs that do not come from the stash document.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Idle connections kept per host by the shared HTTP client.
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    /// Resolve and log every request without sending it.
    pub dry_run: bool,
    /// Concurrent workers sleep their request's DelaySeconds after finishing it.
    pub concurrent_delay: bool,
    pub max_response_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 50,
            user_agent: concat!("payloadstash/", env!("CARGO_PKG_VERSION")).to_string(),
            dry_run: false,
            concurrent_delay: false,
            max_response_bytes: 32 * 1024 * 1024,
        }
    }
}
