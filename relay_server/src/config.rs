use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub struct Config {
    pub allowed_origins: Vec<String>,
    pub port: u16,
    pub max_connections: usize,
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma-separated list; blank entries are dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// `*` in the allow-list accepts every origin.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

impl Default for Config {
    fn default() -> Self {
        let allowed_origins = match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "https://localhost:5173".to_string(),
                "https://127.0.0.1:5173".to_string(),
            ],
        };
        Self {
            allowed_origins,
            port: env_or("PORT", 8080),
            max_connections: env_or("MAX_CONNECTIONS", 1000),
            heartbeat_interval: Duration::from_secs(env_or("HEARTBEAT_INTERVAL_SECS", 5)),
            client_timeout: Duration::from_secs(env_or("CLIENT_TIMEOUT_SECS", 60)),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::default);
