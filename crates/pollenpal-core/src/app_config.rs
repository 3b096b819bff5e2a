use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base address offered when a new entry omits one.
    pub default_api_url: String,
    /// Seconds between the end of one refresh cycle and the start of the next.
    pub scan_interval_secs: u64,
    /// Upper bound for every request made to the pollen API.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Optional YAML file of entries to configure at startup.
    pub entries_path: Option<PathBuf>,
    /// Bearer tokens accepted by the HTTP API. Empty disables auth, which is
    /// only allowed in development.
    pub api_keys: Vec<String>,
}
